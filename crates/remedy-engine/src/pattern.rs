/// Remedy signature detection and the polychrest penalty.
use crate::model::RemedyPattern;

pub const DEFAULT_MIN_MATCH: usize = 3;

const POLYCHRESTS: &[&str] = &[
    "Belladonna",
    "Sulphur",
    "Calcarea Carbonica",
    "Lycopodium",
    "Phosphorus",
    "Natrum Muriaticum",
    "Arsenicum Album",
    "Pulsatilla",
    "Nux Vomica",
    "Bryonia",
];

const POLYCHREST_PENALTY: f64 = 0.88;

#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub match_count: usize,
    pub matched: bool,
    /// Share of the pattern's keywords present, 0..=100.
    pub match_strength: f64,
    pub description: String,
    pub acute_remedy: bool,
}

/// Check a remedy's signature against the lowercased, concatenated case text.
pub fn detect(pattern: &RemedyPattern, case_text: &str) -> PatternMatch {
    let match_count = pattern
        .keywords
        .iter()
        .filter(|kw| case_text.contains(&kw.to_lowercase()))
        .count();

    let (matched, match_strength) = if pattern.keywords.is_empty() {
        (false, 0.0)
    } else {
        let min_match = pattern.min_match.unwrap_or(DEFAULT_MIN_MATCH);
        (
            match_count >= min_match,
            match_count as f64 / pattern.keywords.len() as f64 * 100.0,
        )
    };

    PatternMatch {
        match_count,
        matched,
        match_strength,
        description: pattern.description.clone(),
        acute_remedy: pattern.acute_remedy,
    }
}

pub fn is_polychrest(full_name: &str) -> bool {
    POLYCHRESTS.iter().any(|p| p.eq_ignore_ascii_case(full_name))
}

/// Broad remedies need at least two characteristic matches to escape the penalty.
pub fn polychrest_penalty(full_name: &str, characteristic_match_count: u32) -> f64 {
    if is_polychrest(full_name) && characteristic_match_count < 2 {
        POLYCHREST_PENALTY
    } else {
        1.0
    }
}
