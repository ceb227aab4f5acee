//! Remedy suggestion engine: ranks remedies for a set of clinical symptoms against a
//! graded repertory.
//!
//! Pipeline per call: classify symptoms, match them against repertory rubrics, score each
//! remedy (type weights, signature patterns, acute bonus, polychrest penalty), then rank
//! and normalize to a percentage of the best score.
pub mod case_pattern;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod pattern;
pub mod ranker;
pub mod repertory;
pub mod scorer;

pub use engine::{FailurePolicy, RemedyEngine};
pub use error::EngineError;
pub use model::{CaseType, PatientProfile, Suggestion, Symptom, SymptomType};
pub use repertory::{DataFiles, RepertoryStore, SharedRepertory};
