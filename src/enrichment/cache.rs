//! At-most-once study material lookups
//!
//! Revealing study material for an answer either serves the copy cached on
//! the answer or runs one lookup against the study material source. Reveals
//! that arrive while a lookup for the same answer is running join it instead
//! of starting another one: the first caller registers a broadcast channel in
//! the in-flight table and every later caller subscribes to it.
//!
//! Lookups run as detached tasks, so a caller going away never cancels one.
//! The write-back re-reads the answer from the ledger by id, so answers added
//! or toggled while the lookup was suspended are left as they are.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use super::client::StudyMaterialSource;
use super::errors::{EnrichmentError, EnrichmentResult};
use crate::answers::{AnswerId, AnswerLedger, LedgerError, LookupStatus};

/// Study material handed back by a reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revealed {
    pub id: AnswerId,
    pub study_material: String,
    /// Disclosure flag after the reveal
    pub visible: bool,
    /// True when served from the cache without a lookup
    pub cached: bool,
}

type LookupOutcome = EnrichmentResult<Revealed>;

/// A lookup that callers can join
struct InFlightLookup {
    sender: broadcast::Sender<LookupOutcome>,
    started_at: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owned by a running lookup. Settling records the outcome, unregisters the
/// lookup and broadcasts to every joined caller. A lookup that unwinds before
/// settling is settled as failed on drop, so the answer stays retryable.
struct PendingLookup {
    cache: EnrichmentCache,
    id: AnswerId,
    sender: broadcast::Sender<LookupOutcome>,
    settled: bool,
}

impl PendingLookup {
    fn settle(&mut self, outcome: LookupOutcome) {
        self.settled = true;
        let id = self.id;

        match &outcome {
            Ok(_) => {
                log::info!("Study material cached for answer {}", id);
                self.cache.set_status(id, LookupStatus::Done);
            }
            Err(e) => {
                if e.is_retryable() {
                    log::warn!("Error fetching study material for answer {}: {}", id, e);
                } else {
                    log::error!("Study material lookup for answer {} failed: {}", id, e);
                }
                self.cache.set_status(
                    id,
                    LookupStatus::Failed {
                        message: e.to_string(),
                    },
                );
            }
        }

        // Unregister before broadcasting: callers that subscribed are still
        // owed this message, later callers see the ledger instead.
        lock(&self.cache.in_flight).remove(&id);
        let _ = self.sender.send(outcome);
    }
}

impl Drop for PendingLookup {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(Err(EnrichmentError::Transport(format!(
                "study material lookup for answer {} aborted",
                self.id
            ))));
        }
    }
}

/// Memoizes study material lookups per answer
#[derive(Clone)]
pub struct EnrichmentCache {
    ledger: Arc<Mutex<AnswerLedger>>,
    source: Arc<dyn StudyMaterialSource>,
    /// Lock order: `in_flight` before `ledger`
    in_flight: Arc<Mutex<HashMap<AnswerId, InFlightLookup>>>,
    statuses: Arc<Mutex<HashMap<AnswerId, LookupStatus>>>,
}

impl EnrichmentCache {
    pub fn new(ledger: Arc<Mutex<AnswerLedger>>, source: Arc<dyn StudyMaterialSource>) -> Self {
        Self {
            ledger,
            source,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            statuses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reveal study material for a missed answer.
    ///
    /// Cached material is returned without a lookup and flips the answer's
    /// visibility. Otherwise one lookup runs; on success the material is
    /// stored on the answer and visibility flips, on failure the answer is
    /// left untouched so a later reveal can retry.
    pub async fn reveal(&self, id: AnswerId) -> LookupOutcome {
        let mut receiver = {
            let mut in_flight = lock(&self.in_flight);

            if let Some(lookup) = in_flight.get(&id) {
                log::debug!(
                    "Joining study material lookup for answer {} (running for {:?})",
                    id,
                    lookup.started_at.elapsed()
                );
                lookup.sender.subscribe()
            } else {
                let text = {
                    let mut ledger = lock(&self.ledger);
                    let answer = ledger.get(id).map_err(|_| EnrichmentError::NotFound(id))?;
                    if !answer.is_enrichable() {
                        return Err(EnrichmentError::NotEligible(id));
                    }

                    if let Some(material) = answer.study_material.clone() {
                        let visible = ledger
                            .toggle_visibility(id)
                            .map_err(|_| EnrichmentError::NotFound(id))?;
                        return Ok(Revealed {
                            id,
                            study_material: material,
                            visible,
                            cached: true,
                        });
                    }

                    answer.text.clone()
                };

                let (sender, receiver) = broadcast::channel(1);
                in_flight.insert(
                    id,
                    InFlightLookup {
                        sender: sender.clone(),
                        started_at: Instant::now(),
                    },
                );
                self.set_status(id, LookupStatus::InFlight);

                log::info!("Fetching study material for answer {}", id);
                let cache = self.clone();
                tokio::spawn(async move {
                    cache.run_lookup(id, text, sender).await;
                });

                receiver
            }
        };

        receiver.recv().await.unwrap_or_else(|e| {
            Err(EnrichmentError::Transport(format!(
                "study material lookup for answer {} ended without a result: {}",
                id, e
            )))
        })
    }

    /// Perform the lookup, store the result, then release everyone waiting
    async fn run_lookup(
        &self,
        id: AnswerId,
        text: String,
        sender: broadcast::Sender<LookupOutcome>,
    ) {
        let mut pending = PendingLookup {
            cache: self.clone(),
            id,
            sender,
            settled: false,
        };

        let outcome = match self.source.fetch(&text).await {
            Ok(material) => self.store(id, material),
            Err(e) => Err(e),
        };
        pending.settle(outcome);
    }

    fn store(&self, id: AnswerId, material: String) -> LookupOutcome {
        let mut ledger = lock(&self.ledger);

        let study_material = match ledger.set_study_material(id, material) {
            Ok(answer) => answer.study_material.clone().unwrap_or_default(),
            Err(LedgerError::AlreadyEnriched(_)) => ledger
                .get(id)
                .ok()
                .and_then(|a| a.study_material.clone())
                .unwrap_or_default(),
            Err(LedgerError::NotEligible(_)) => return Err(EnrichmentError::NotEligible(id)),
            Err(_) => return Err(EnrichmentError::NotFound(id)),
        };

        let visible = ledger
            .toggle_visibility(id)
            .map_err(|_| EnrichmentError::NotFound(id))?;

        Ok(Revealed {
            id,
            study_material,
            visible,
            cached: false,
        })
    }

    fn set_status(&self, id: AnswerId, status: LookupStatus) {
        lock(&self.statuses).insert(id, status);
    }

    /// Enrichment status of one answer
    pub fn status(&self, id: AnswerId) -> EnrichmentResult<LookupStatus> {
        let has_material = {
            let ledger = lock(&self.ledger);
            let answer = ledger.get(id).map_err(|_| EnrichmentError::NotFound(id))?;
            answer.has_study_material()
        };

        if has_material {
            return Ok(LookupStatus::Done);
        }

        Ok(lock(&self.statuses).get(&id).cloned().unwrap_or_default())
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }
}
