//! AI study material for missed answers
//!
//! This module provides:
//! - The study material source seam and its chat completions client
//! - A per-answer cache that runs each lookup at most once
//! - Per-answer lookup status tracking

pub mod cache;
pub mod client;
pub mod errors;

pub use cache::{EnrichmentCache, Revealed};
pub use client::{OpenAiStudyClient, StudyMaterialSource};
pub use errors::{EnrichmentError, EnrichmentResult};
