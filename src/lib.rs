use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod access_gate;
pub mod answers;
pub mod clock;
pub mod commands;
pub mod config;
pub mod enrichment;
pub mod server;

use answers::AnswerLedger;
use clock::{Clock, SystemClock};
use enrichment::{EnrichmentCache, StudyMaterialSource};

/// Shared state behind every HTTP command
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<AnswerLedger>>,
    pub enrichment: EnrichmentCache,
}

impl AppState {
    pub fn new(source: Arc<dyn StudyMaterialSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn StudyMaterialSource>, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(Mutex::new(AnswerLedger::with_clock(clock)));
        let enrichment = EnrichmentCache::new(Arc::clone(&ledger), source);
        Self { ledger, enrichment }
    }

    pub fn ledger(&self) -> MutexGuard<'_, AnswerLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
