/// Remedy suggestion entry point.
///
/// `RemedyEngine` is a pure function of `(symptoms, profile, limit)` over an immutable
/// `RepertoryStore`. It holds no per-call state, so one engine can serve any number of
/// concurrent callers behind an `Arc`.
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error};

use crate::case_pattern;
use crate::error::EngineError;
use crate::matcher;
use crate::model::{PatientProfile, Suggestion, Symptom};
use crate::ranker;
use crate::repertory::RepertoryStore;
use crate::scorer::{self, CaseContext};

/// What to do when matching or scoring fails for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and return no suggestions so case creation is never blocked.
    #[default]
    FailOpen,
    /// Surface `EngineError::Computation` to the caller.
    FailClosed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" => Ok(FailurePolicy::FailOpen),
            "closed" | "fail-closed" => Ok(FailurePolicy::FailClosed),
            other => Err(format!(
                "unknown failure policy '{other}', expected 'open' or 'closed'"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemedyEngine {
    store: Arc<RepertoryStore>,
    policy: FailurePolicy,
}

impl RemedyEngine {
    pub fn new(store: Arc<RepertoryStore>) -> Self {
        Self {
            store,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &RepertoryStore {
        &self.store
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Rank remedies for a case, best first, at most `limit` of them.
    ///
    /// Empty input yields an empty list. Under `FailOpen` this never returns `Err`.
    pub fn suggest_remedies(
        &self,
        symptoms: &[Symptom],
        profile: &PatientProfile,
        limit: usize,
    ) -> Result<Vec<Suggestion>, EngineError> {
        if symptoms.is_empty() {
            return Ok(Vec::new());
        }
        let outcome = guarded(|| self.compute(symptoms, profile, limit));
        self.settle(outcome, symptoms.len())
    }

    fn compute(
        &self,
        symptoms: &[Symptom],
        profile: &PatientProfile,
        limit: usize,
    ) -> Result<Vec<Suggestion>, EngineError> {
        let tally = matcher::tally(&self.store, symptoms);
        if tally.is_empty() {
            debug!(symptoms = symptoms.len(), "no rubric matched any symptom");
            return Ok(Vec::new());
        }

        let case_text = case_pattern::combined_text(symptoms);
        let ctx = CaseContext {
            profile,
            case_pattern: case_pattern::detect(symptoms),
            case_text: &case_text,
        };
        let scored = scorer::score_all(&self.store, &tally, &ctx)?;

        debug!(
            remedies = scored.len(),
            acute_signals = ctx.case_pattern.acute_signal_count,
            "remedies scored"
        );
        Ok(ranker::rank(scored, limit))
    }

    fn settle(
        &self,
        outcome: Result<Vec<Suggestion>, EngineError>,
        symptom_count: usize,
    ) -> Result<Vec<Suggestion>, EngineError> {
        match (outcome, self.policy) {
            (Ok(suggestions), _) => Ok(suggestions),
            (Err(e), FailurePolicy::FailOpen) => {
                error!(error = %e, symptoms = symptom_count, "remedy suggestion failed, returning none");
                Ok(Vec::new())
            }
            (Err(e), FailurePolicy::FailClosed) => Err(e),
        }
    }
}

/// Run `f`, turning a panic into `EngineError::Computation`.
fn guarded<T>(f: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(EngineError::Computation(message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymptomType;

    const REPERTORY: &str = r#"{"categories": [
        {"title": "Head", "rubrics": [
            {"title": "Pain; throbbing", "remedies": [
                {"abbreviation": "Bell", "grade": 3},
                {"abbreviation": "Glon", "grade": 3},
                {"abbreviation": "Sulph", "grade": 1}
            ]},
            {"title": "Pain; bursting", "remedies": [
                {"abbreviation": "Bry", "grade": 2},
                {"abbreviation": "Bell", "grade": 2}
            ]}
        ]},
        {"title": "Mind", "rubrics": [
            {"title": "Fear; death, of", "remedies": [
                {"abbreviation": "Acon", "grade": 3},
                {"abbreviation": "Ars", "grade": 2}
            ]},
            {"title": "Restlessness", "remedies": [
                {"abbreviation": "Acon", "grade": 2},
                {"abbreviation": "Ars", "grade": 3},
                {"abbreviation": "Rhus-t", "grade": 3}
            ]}
        ]},
        {"title": "Fever", "rubrics": [
            {"title": "Heat; sudden onset", "remedies": [
                {"abbreviation": "Bell", "grade": 3},
                {"abbreviation": "Acon", "grade": 3}
            ]}
        ]}
    ]}"#;

    const REMEDY_MAP: &str = r#"{
        "Bell": "Belladonna",
        "Glon": "Glonoinum",
        "Sulph": "Sulphur",
        "Bry": "Bryonia",
        "Acon": "Aconitum Napellus",
        "Ars": "Arsenicum Album"
    }"#;

    const PATTERNS: &str = r#"{
        "Belladonna": {
            "keywords": ["throbbing", "heat", "sudden", "red"],
            "minMatch": 3,
            "description": "sudden hot throbbing",
            "acuteRemedy": true
        }
    }"#;

    fn engine(patterns: Option<&str>) -> RemedyEngine {
        let store = RepertoryStore::from_json(REPERTORY, REMEDY_MAP, patterns).unwrap();
        RemedyEngine::new(Arc::new(store))
    }

    fn case() -> Vec<Symptom> {
        vec![
            Symptom::new("HEAD PAIN THROBBING", SymptomType::Keynote),
            Symptom::new("MIND RESTLESSNESS", SymptomType::Mental),
            Symptom::new("FEVER HEAT SUDDEN ONSET", SymptomType::Physical),
            Symptom::new("Head pain violent", SymptomType::Physical),
        ]
    }

    #[test]
    fn empty_symptoms_return_empty() {
        let e = engine(Some(PATTERNS));
        for profile in [PatientProfile::acute(), PatientProfile::chronic()] {
            for limit in [0, 1, 10] {
                assert!(e.suggest_remedies(&[], &profile, limit).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn unmatched_symptoms_return_empty() {
        let symptoms = [Symptom::new("STOMACH THIRSTLESS", SymptomType::Physical)];
        let result = engine(None)
            .suggest_remedies(&symptoms, &PatientProfile::chronic(), 10)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn single_rubric_fixture() {
        let store = RepertoryStore::from_json(
            r#"{"categories": [{"title": "Head", "rubrics": [
                {"title": "Head Pain Throbbing", "remedies": [{"abbreviation": "Bell", "grade": 3}]}
            ]}]}"#,
            r#"{"Bell": "Belladonna"}"#,
            None,
        )
        .unwrap();
        let engine = RemedyEngine::new(Arc::new(store));
        let symptoms = [Symptom::new("HEAD PAIN THROBBING", SymptomType::Keynote)];

        let result = engine
            .suggest_remedies(&symptoms, &PatientProfile::acute(), 10)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].full_name, "Belladonna");
        assert_eq!(result[0].short_name, "Bell");
        assert_eq!(result[0].percent_match, 100.0);
        // quality 4/3: three rubric hits plus the category hit over three terms
        // base 13, intensity 3*2.5*(4/3)*5 = 50, keynote 1.4, polychrest 0.88
        assert_eq!(result[0].score, 77.62);
        assert_eq!(result[0].characteristic_match_count, 1);
        assert_eq!(result[0].coverage, 1);
        assert_eq!(result[0].intensity, 50.0);
    }

    #[test]
    fn ranked_output_invariants() {
        let e = engine(Some(PATTERNS));
        let result = e
            .suggest_remedies(&case(), &PatientProfile::acute(), 10)
            .unwrap();

        assert!(!result.is_empty());
        assert_eq!(result[0].percent_match, 100.0);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(result.iter().all(|s| (0.0..=100.0).contains(&s.percent_match)));

        let bell = &result[0];
        assert_eq!(bell.full_name, "Belladonna");
        assert!(bell.pattern_locked);
        assert!(bell.boosts.iter().any(|b| b == "acute"));
        assert!(bell.clinical_justification.contains("sudden hot throbbing"));
    }

    #[test]
    fn limit_is_respected() {
        let e = engine(None);
        for limit in [0, 1, 2, 3] {
            let result = e
                .suggest_remedies(&case(), &PatientProfile::chronic(), limit)
                .unwrap();
            assert!(result.len() <= limit);
        }
    }

    #[test]
    fn pattern_entry_strictly_increases_score() {
        let profile = PatientProfile::chronic();
        let score_of = |e: &RemedyEngine| {
            e.suggest_remedies(&case(), &profile, 50)
                .unwrap()
                .into_iter()
                .find(|s| s.full_name == "Belladonna")
                .map(|s| s.score)
                .unwrap()
        };
        assert!(score_of(&engine(Some(PATTERNS))) > score_of(&engine(None)));
    }

    #[test]
    fn deterministic() {
        let e = engine(Some(PATTERNS));
        let profile = PatientProfile::acute();
        let a = e.suggest_remedies(&case(), &profile, 10).unwrap();
        let b = e.suggest_remedies(&case(), &profile, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn failure_policy_parsing() {
        assert_eq!("open".parse::<FailurePolicy>(), Ok(FailurePolicy::FailOpen));
        assert_eq!(" Fail-Closed ".parse::<FailurePolicy>(), Ok(FailurePolicy::FailClosed));
        assert!("maybe".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn panics_become_computation_errors() {
        let outcome: Result<(), EngineError> = guarded(|| panic!("rubric index out of range"));
        match outcome {
            Err(EngineError::Computation(msg)) => assert!(msg.contains("rubric index")),
            other => panic!("expected computation error, got {other:?}"),
        }
    }

    #[test]
    fn fail_open_swallows_and_fail_closed_surfaces() {
        let failure = || -> Result<Vec<Suggestion>, EngineError> {
            Err(EngineError::Computation("boom".to_string()))
        };

        let open = engine(None);
        assert_eq!(open.policy(), FailurePolicy::FailOpen);
        assert!(open.settle(failure(), 3).unwrap().is_empty());

        let closed = engine(None).with_policy(FailurePolicy::FailClosed);
        assert!(matches!(
            closed.settle(failure(), 3),
            Err(EngineError::Computation(_))
        ));
    }
}
