/// Composite remedy scoring.
///
/// score = round2((base + intensity) * type_multiplier * polychrest_penalty
///                + pattern_bonus + acute_bonus)
///
/// where
/// - base = rubric_matches * 10 + total_grade
/// - intensity = sum(effective_grades) * 5
/// - type_multiplier = 1.4 if a keynote matched, times 1.25 if a mental symptom matched
/// - pattern_bonus = 200 + match_strength when the remedy's signature matched
/// - acute_bonus = 20 + 10 * acute_signals for acute remedies in an acute case
use crate::case_pattern::CasePattern;
use crate::error::EngineError;
use crate::matcher::{RemedyStats, RemedyTally};
use crate::model::{CaseType, PatientProfile, SymptomType};
use crate::pattern::{self, PatternMatch};
use crate::repertory::RepertoryStore;

const RUBRIC_MATCH_WEIGHT: f64 = 10.0;
const INTENSITY_WEIGHT: f64 = 5.0;
const KEYNOTE_MULTIPLIER: f64 = 1.4;
const MENTAL_MULTIPLIER: f64 = 1.25;
const PATTERN_BONUS_BASE: f64 = 200.0;
const ACUTE_BONUS_BASE: f64 = 20.0;
const ACUTE_BONUS_PER_SIGNAL: f64 = 10.0;

/// Case-wide inputs shared by every remedy in one call.
#[derive(Debug, Clone)]
pub struct CaseContext<'a> {
    pub profile: &'a PatientProfile,
    pub case_pattern: CasePattern,
    /// Lowercased, space-joined clinical texts.
    pub case_text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRemedy {
    pub short_name: String,
    pub full_name: String,
    pub score: f64,
    pub rubric_matches: u32,
    pub decisive_symptom_count: u32,
    pub characteristic_match_count: u32,
    pub coverage: u32,
    pub intensity: f64,
    pub pattern: Option<PatternMatch>,
    pub acute_bonus: f64,
    pub boosts: Vec<&'static str>,
}

impl ScoredRemedy {
    /// The signature match, only when it actually locked in.
    pub fn locked_pattern(&self) -> Option<&PatternMatch> {
        self.pattern.as_ref().filter(|p| p.matched)
    }
}

pub fn type_multiplier(stats: &RemedyStats) -> f64 {
    let mut multiplier = 1.0;
    if stats.matched_symptom_types.contains(&SymptomType::Keynote) {
        multiplier *= KEYNOTE_MULTIPLIER;
    }
    if stats.matched_symptom_types.contains(&SymptomType::Mental) {
        multiplier *= MENTAL_MULTIPLIER;
    }
    multiplier
}

pub fn score_remedy(
    store: &RepertoryStore,
    short_name: &str,
    stats: &RemedyStats,
    ctx: &CaseContext<'_>,
) -> Result<ScoredRemedy, EngineError> {
    let base_score =
        f64::from(stats.rubric_matches) * RUBRIC_MATCH_WEIGHT + f64::from(stats.total_grade);
    let weighted_intensity = stats.effective_grades.iter().sum::<f64>() * INTENSITY_WEIGHT;
    let type_multiplier = type_multiplier(stats);
    let penalty = pattern::polychrest_penalty(&stats.full_name, stats.characteristic_match_count);

    let pattern = store
        .pattern(&stats.full_name)
        .map(|p| pattern::detect(p, ctx.case_text));

    let pattern_bonus = match &pattern {
        Some(p) if p.matched => PATTERN_BONUS_BASE + p.match_strength,
        _ => 0.0,
    };

    let acute_remedy = pattern.as_ref().is_some_and(|p| p.acute_remedy);
    let acute_bonus = if ctx.profile.case_type == CaseType::Acute
        && ctx.case_pattern.is_acute_case
        && acute_remedy
    {
        ACUTE_BONUS_BASE + f64::from(ctx.case_pattern.acute_signal_count) * ACUTE_BONUS_PER_SIGNAL
    } else {
        0.0
    };

    let raw = (base_score + weighted_intensity) * type_multiplier * penalty
        + pattern_bonus
        + acute_bonus;
    if !raw.is_finite() {
        return Err(EngineError::Computation(format!(
            "non-finite score for {}: {raw}",
            stats.full_name
        )));
    }

    let mut boosts = Vec::new();
    if stats.matched_symptom_types.contains(&SymptomType::Keynote) {
        boosts.push("keynote");
    }
    if stats.matched_symptom_types.contains(&SymptomType::Mental) {
        boosts.push("mental");
    }
    if pattern_bonus > 0.0 {
        boosts.push("pattern");
    }
    if acute_bonus > 0.0 {
        boosts.push("acute");
    }
    if penalty < 1.0 {
        boosts.push("polychrest-penalty");
    }

    Ok(ScoredRemedy {
        short_name: short_name.to_string(),
        full_name: stats.full_name.clone(),
        score: round_to(raw, 2),
        rubric_matches: stats.rubric_matches,
        decisive_symptom_count: stats.decisive_symptom_count,
        characteristic_match_count: stats.characteristic_match_count,
        coverage: stats.coverage(),
        intensity: round_to(weighted_intensity, 2),
        pattern,
        acute_bonus,
        boosts,
    })
}

/// Score every tallied remedy, preserving tally order.
pub fn score_all(
    store: &RepertoryStore,
    tally: &RemedyTally,
    ctx: &CaseContext<'_>,
) -> Result<Vec<ScoredRemedy>, EngineError> {
    tally
        .iter()
        .map(|(short_name, stats)| score_remedy(store, short_name, stats, ctx))
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(patterns: Option<&str>) -> RepertoryStore {
        RepertoryStore::from_json(
            r#"{"categories": []}"#,
            r#"{"Bell": "Belladonna", "Acon": "Aconitum Napellus"}"#,
            patterns,
        )
        .unwrap()
    }

    fn stats(full_name: &str, characteristic: u32, types: &[SymptomType]) -> RemedyStats {
        RemedyStats {
            full_name: full_name.to_string(),
            rubric_matches: 2,
            total_grade: 5,
            decisive_symptom_count: characteristic,
            characteristic_match_count: characteristic,
            matched_symptoms: [0, 1].into_iter().collect(),
            matched_symptom_types: types.iter().copied().collect(),
            effective_grades: vec![7.5, 2.0],
        }
    }

    fn ctx<'a>(profile: &'a PatientProfile, text: &'a str, signals: u32) -> CaseContext<'a> {
        CaseContext {
            profile,
            case_pattern: CasePattern {
                acute_signal_count: signals,
                is_acute_case: signals >= 2,
            },
            case_text: text,
        }
    }

    #[test]
    fn base_formula() {
        let profile = PatientProfile::chronic();
        let s = stats("Aconitum Napellus", 0, &[]);
        let scored = score_remedy(&store(None), "Acon", &s, &ctx(&profile, "", 0)).unwrap();
        // (2*10 + 5) + (9.5 * 5) = 72.5
        assert_eq!(scored.score, 72.5);
        assert_eq!(scored.intensity, 47.5);
        assert_eq!(scored.coverage, 2);
        assert!(scored.boosts.is_empty());
        assert!(scored.pattern.is_none());
    }

    #[test]
    fn type_multipliers_compound() {
        let profile = PatientProfile::chronic();
        let s = stats("Aconitum Napellus", 0, &[SymptomType::Keynote, SymptomType::Mental]);
        let scored = score_remedy(&store(None), "Acon", &s, &ctx(&profile, "", 0)).unwrap();
        assert!((scored.score - 72.5 * 1.75).abs() < 0.01);
        assert_eq!(scored.boosts, vec!["keynote", "mental"]);
    }

    #[test]
    fn polychrest_penalty_ratio() {
        let profile = PatientProfile::chronic();
        let c = ctx(&profile, "", 0);
        let penalized = score_remedy(&store(None), "Bell", &stats("Belladonna", 1, &[]), &c).unwrap();
        let free = score_remedy(&store(None), "Bell", &stats("Belladonna", 2, &[]), &c).unwrap();
        assert!((penalized.score - free.score * 0.88).abs() < 0.01);
        assert!(penalized.boosts.contains(&"polychrest-penalty"));
        assert!(!free.boosts.contains(&"polychrest-penalty"));
    }

    #[test]
    fn pattern_bonus_raises_score() {
        let patterns = r#"{"Aconitum Napellus": {
            "keywords": ["fear", "death", "sudden", "cold"],
            "minMatch": 3,
            "description": "Sudden fear of death",
            "acuteRemedy": false
        }}"#;
        let profile = PatientProfile::chronic();
        let c = ctx(&profile, "mind fear death sudden", 1);
        let s = stats("Aconitum Napellus", 0, &[]);

        let without = score_remedy(&store(None), "Acon", &s, &c).unwrap();
        let with = score_remedy(&store(Some(patterns)), "Acon", &s, &c).unwrap();

        // 3 of 4 keywords -> 200 + 75
        assert_eq!(with.score, without.score + 275.0);
        assert!(with.locked_pattern().is_some());
        assert_eq!(with.boosts, vec!["pattern"]);
        assert_eq!(with.acute_bonus, 0.0);
    }

    #[test]
    fn acute_bonus_requires_acute_profile_case_and_remedy() {
        let patterns = r#"{"Aconitum Napellus": {"keywords": ["zzz"], "acuteRemedy": true}}"#;
        let store = store(Some(patterns));
        let s = stats("Aconitum Napellus", 0, &[]);

        let acute = PatientProfile::acute();
        let scored = score_remedy(&store, "Acon", &s, &ctx(&acute, "sudden violent", 2)).unwrap();
        assert_eq!(scored.acute_bonus, 40.0);
        assert_eq!(scored.score, 72.5 + 40.0);
        assert!(scored.locked_pattern().is_none());

        let chronic = PatientProfile::chronic();
        let scored = score_remedy(&store, "Acon", &s, &ctx(&chronic, "sudden violent", 2)).unwrap();
        assert_eq!(scored.acute_bonus, 0.0);

        let scored = score_remedy(&store, "Acon", &s, &ctx(&acute, "sudden", 1)).unwrap();
        assert_eq!(scored.acute_bonus, 0.0);
    }

    #[test]
    fn non_finite_score_is_computation_error() {
        let profile = PatientProfile::chronic();
        let mut s = stats("Aconitum Napellus", 0, &[]);
        s.effective_grades.push(f64::INFINITY);
        let err = score_remedy(&store(None), "Acon", &s, &ctx(&profile, "", 0)).unwrap_err();
        assert!(matches!(err, EngineError::Computation(_)));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(12.345_678, 2), 12.35);
        assert_eq!(round_to(99.94, 1), 99.9);
    }
}
