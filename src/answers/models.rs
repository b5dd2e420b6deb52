//! Data models for tracked answers

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label stored as the text of every correct answer
pub const CORRECT_ANSWER_LABEL: &str = "Correct Answer";

/// Identifier of an answer.
///
/// Minted from the creation time in milliseconds and strictly increasing
/// within a ledger, so ordering by id matches insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(pub u64);

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked quiz answer, either correct or missed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: AnswerId,
    pub correct: bool,
    pub text: String,
    /// UTC calendar day the answer was logged on
    pub created_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_material: Option<String>,
    #[serde(default)]
    pub visible: bool,
}

impl Answer {
    pub fn correct(id: AnswerId, created_on: NaiveDate) -> Self {
        Self {
            id,
            correct: true,
            text: CORRECT_ANSWER_LABEL.to_string(),
            created_on,
            study_material: None,
            visible: false,
        }
    }

    /// `text` must already be trimmed and non-empty
    pub fn missed(id: AnswerId, text: String, created_on: NaiveDate) -> Self {
        Self {
            id,
            correct: false,
            text,
            created_on,
            study_material: None,
            visible: false,
        }
    }

    /// Only missed answers can be enriched with study material
    pub fn is_enrichable(&self) -> bool {
        !self.correct
    }

    pub fn has_study_material(&self) -> bool {
        self.study_material.is_some()
    }
}

/// Enrichment status of a single answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LookupStatus {
    /// No lookup has been attempted yet
    Idle,
    /// A lookup is running
    InFlight,
    /// The last lookup failed; a new reveal may retry
    Failed { message: String },
    /// Study material is cached on the answer
    Done,
}

impl Default for LookupStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// Static blurb shown next to a missed answer
pub fn additional_info(text: &str) -> String {
    format!("This is additional info about {}.", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_correct_answer_is_not_enrichable() {
        let answer = Answer::correct(AnswerId(1), day());
        assert!(answer.correct);
        assert_eq!(answer.text, CORRECT_ANSWER_LABEL);
        assert!(!answer.is_enrichable());
    }

    #[test]
    fn test_answer_serializes_date_only() {
        let answer = Answer::missed(AnswerId(7), "Who is Ada Lovelace?".to_string(), day());
        let json = serde_json::to_value(&answer).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["createdOn"], "2024-05-01");
        assert_eq!(json["visible"], false);
        assert!(json.get("studyMaterial").is_none());
    }

    #[test]
    fn test_lookup_status_serialization() {
        let failed = LookupStatus::Failed {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(LookupStatus::InFlight).unwrap();
        assert_eq!(json["state"], "inFlight");
    }

    #[test]
    fn test_additional_info() {
        assert_eq!(
            additional_info("Who is Abraham Lincoln?"),
            "This is additional info about Who is Abraham Lincoln?."
        );
    }
}
