//! In-memory ledger of tracked answers
//!
//! The ledger is append-only: answers are never reordered or removed, and the
//! only mutations after creation are visibility toggles and the single write
//! of study material.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use super::filter;
use super::models::{Answer, AnswerId};
use crate::clock::{Clock, SystemClock};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Missed answer text is empty")]
    EmptyAnswer,

    #[error("Answer not found: {0}")]
    NotFound(AnswerId),

    #[error("Answer {0} is a correct answer and has no study material")]
    NotEligible(AnswerId),

    #[error("Study material already set for answer {0}")]
    AlreadyEnriched(AnswerId),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ordered collection of answers
pub struct AnswerLedger {
    answers: Vec<Answer>,
    clock: Arc<dyn Clock>,
    last_id: Option<AnswerId>,
}

impl Default for AnswerLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            answers: Vec::new(),
            clock,
            last_id: None,
        }
    }

    /// Mint an id from the current time, bumped past the previous id so two
    /// answers created in the same millisecond never collide.
    fn next_id(&mut self) -> AnswerId {
        let millis = self.clock.now().timestamp_millis().max(0) as u64;
        let id = match self.last_id {
            Some(AnswerId(last)) if millis <= last => AnswerId(last + 1),
            _ => AnswerId(millis),
        };
        self.last_id = Some(id);
        id
    }

    fn position(&self, id: AnswerId) -> Result<usize> {
        // Ids increase with insertion order, so the vector is sorted by id
        self.answers
            .binary_search_by_key(&id, |a| a.id)
            .map_err(|_| LedgerError::NotFound(id))
    }

    // ==================== Creation ====================

    /// Record a correct answer
    pub fn add_correct(&mut self) -> &Answer {
        let id = self.next_id();
        let answer = Answer::correct(id, self.clock.today());
        log::debug!("Recorded correct answer {}", id);
        self.push(answer)
    }

    /// Record a missed answer.
    ///
    /// Blank text creates nothing and returns [`LedgerError::EmptyAnswer`];
    /// callers on UI paths are free to ignore it.
    pub fn add_missed(&mut self, text: &str) -> Result<&Answer> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LedgerError::EmptyAnswer);
        }

        let id = self.next_id();
        let answer = Answer::missed(id, text.to_string(), self.clock.today());
        log::debug!("Recorded missed answer {}", id);
        Ok(self.push(answer))
    }

    fn push(&mut self, answer: Answer) -> &Answer {
        self.answers.push(answer);
        &self.answers[self.answers.len() - 1]
    }

    // ==================== Queries ====================

    /// All answers in insertion order
    pub fn list(&self) -> &[Answer] {
        &self.answers
    }

    pub fn get(&self, id: AnswerId) -> Result<&Answer> {
        let pos = self.position(id)?;
        Ok(&self.answers[pos])
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers logged on `date`; everything when `date` is `None`
    pub fn filter_by_date(&self, date: Option<NaiveDate>) -> Vec<&Answer> {
        filter::filter_by_date(&self.answers, date)
    }

    // ==================== Mutation ====================

    /// Flip the disclosure flag and return its new value
    pub fn toggle_visibility(&mut self, id: AnswerId) -> Result<bool> {
        let pos = self.position(id)?;
        let answer = &mut self.answers[pos];
        answer.visible = !answer.visible;
        Ok(answer.visible)
    }

    /// Store fetched study material on a missed answer. First writer wins.
    pub fn set_study_material(&mut self, id: AnswerId, material: String) -> Result<&Answer> {
        let pos = self.position(id)?;
        let answer = &mut self.answers[pos];

        if !answer.is_enrichable() {
            return Err(LedgerError::NotEligible(id));
        }
        if answer.study_material.is_some() {
            return Err(LedgerError::AlreadyEnriched(id));
        }

        answer.study_material = Some(material);
        Ok(answer)
    }
}
