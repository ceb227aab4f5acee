/// Case-level acute pattern detection over the whole symptom set.
use crate::model::Symptom;

const ONSET_SIGNALS: &[&str] = &["sudden", "onset"];
const INTENSITY_SIGNALS: &[&str] = &["violent", "intense", "severe"];
const RAPID_SIGNALS: &[&str] = &["rapid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CasePattern {
    /// Number of distinct acute signals present, 0..=3.
    pub acute_signal_count: u32,
    pub is_acute_case: bool,
}

pub fn detect(symptoms: &[Symptom]) -> CasePattern {
    let text = combined_text(symptoms);

    let acute_signal_count = [ONSET_SIGNALS, INTENSITY_SIGNALS, RAPID_SIGNALS]
        .iter()
        .filter(|signal| signal.iter().any(|token| text.contains(*token)))
        .count() as u32;

    CasePattern {
        acute_signal_count,
        is_acute_case: acute_signal_count >= 2,
    }
}

/// All clinical texts, lowercased and space-joined.
pub(crate) fn combined_text(symptoms: &[Symptom]) -> String {
    symptoms
        .iter()
        .map(|s| s.clinical.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
