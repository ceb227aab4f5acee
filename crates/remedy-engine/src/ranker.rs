/// Ranking, normalization and clinical justification.
///
/// Sorting is stable: remedies with equal scores stay in the order the matcher first met
/// them, which follows repertory file order. That order carries no clinical meaning.
use crate::model::Suggestion;
use crate::scorer::{round_to, ScoredRemedy};

pub const DEFAULT_LIMIT: usize = 10;

const FALLBACK_JUSTIFICATION: &str = "Matched relevant rubrics.";

pub fn rank(mut scored: Vec<ScoredRemedy>, limit: usize) -> Vec<Suggestion> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let max_score = match scored.first() {
        Some(top) if top.score != 0.0 => top.score,
        _ => 1.0,
    };

    scored
        .into_iter()
        .take(limit)
        .map(|remedy| {
            let percent_match = round_to(remedy.score / max_score * 100.0, 1);
            to_suggestion(remedy, percent_match)
        })
        .collect()
}

fn to_suggestion(remedy: ScoredRemedy, percent_match: f64) -> Suggestion {
    let clinical_justification = justify(&remedy);
    let pattern_description = remedy.locked_pattern().map(|p| p.description.clone());
    Suggestion {
        full_name: remedy.full_name,
        short_name: remedy.short_name,
        score: remedy.score,
        percent_match,
        clinical_justification,
        rubric_matches: remedy.rubric_matches,
        decisive_symptom_count: remedy.decisive_symptom_count,
        characteristic_match_count: remedy.characteristic_match_count,
        coverage: remedy.coverage,
        intensity: remedy.intensity,
        pattern_locked: pattern_description.is_some(),
        pattern_description,
        boosts: remedy.boosts.iter().map(|b| b.to_string()).collect(),
    }
}

/// Build the rationale from applicable clauses, strongest evidence first.
pub fn justify(remedy: &ScoredRemedy) -> String {
    let mut clauses = Vec::new();

    if let Some(p) = remedy.locked_pattern() {
        let description = if p.description.is_empty() {
            "known remedy"
        } else {
            p.description.as_str()
        };
        clauses.push(format!(
            "Matches the {description} pattern ({:.0}% of signature keywords present).",
            p.match_strength
        ));
    }
    if remedy.decisive_symptom_count > 0 {
        let plural = if remedy.decisive_symptom_count == 1 { "" } else { "s" };
        clauses.push(format!(
            "Covers {} decisive symptom{plural}.",
            remedy.decisive_symptom_count
        ));
    }
    if remedy.acute_bonus > 0.0 {
        clauses.push("Fits the acute presentation pattern of this case.".to_string());
    }
    if remedy.characteristic_match_count >= 2 {
        clauses.push(format!(
            "Keynote characteristics present ({} characteristic matches).",
            remedy.characteristic_match_count
        ));
    }

    if clauses.is_empty() {
        FALLBACK_JUSTIFICATION.to_string()
    } else {
        clauses.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternMatch;

    fn remedy(name: &str, score: f64) -> ScoredRemedy {
        ScoredRemedy {
            short_name: name.to_string(),
            full_name: name.to_string(),
            score,
            rubric_matches: 1,
            decisive_symptom_count: 0,
            characteristic_match_count: 0,
            coverage: 1,
            intensity: 0.0,
            pattern: None,
            acute_bonus: 0.0,
            boosts: Vec::new(),
        }
    }

    #[test]
    fn sorts_normalizes_and_truncates() {
        let ranked = rank(
            vec![remedy("A", 50.0), remedy("B", 200.0), remedy("C", 100.0), remedy("D", 1.0)],
            3,
        );
        let names: Vec<&str> = ranked.iter().map(|s| s.short_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
        assert_eq!(ranked[0].percent_match, 100.0);
        assert_eq!(ranked[1].percent_match, 50.0);
        assert_eq!(ranked[2].percent_match, 25.0);
    }

    #[test]
    fn ties_keep_first_encountered_order() {
        let ranked = rank(
            vec![remedy("X", 10.0), remedy("Y", 30.0), remedy("Z", 10.0)],
            DEFAULT_LIMIT,
        );
        let names: Vec<&str> = ranked.iter().map(|s| s.short_name.as_str()).collect();
        assert_eq!(names, vec!["Y", "X", "Z"]);
        assert_eq!(ranked[1].percent_match, 33.3);
    }

    #[test]
    fn zero_top_score_does_not_divide_by_zero() {
        let ranked = rank(vec![remedy("A", 0.0)], DEFAULT_LIMIT);
        assert_eq!(ranked[0].percent_match, 0.0);
        assert!(rank(Vec::new(), DEFAULT_LIMIT).is_empty());
        assert!(rank(vec![remedy("A", 5.0)], 0).is_empty());
    }

    #[test]
    fn justification_fallback() {
        assert_eq!(justify(&remedy("A", 1.0)), "Matched relevant rubrics.");
    }

    #[test]
    fn justification_clause_order() {
        let mut r = remedy("Belladonna", 400.0);
        r.decisive_symptom_count = 3;
        r.characteristic_match_count = 3;
        r.acute_bonus = 50.0;
        r.pattern = Some(PatternMatch {
            match_count: 4,
            matched: true,
            match_strength: 80.0,
            description: "hot, red, throbbing".to_string(),
            acute_remedy: true,
        });

        let text = justify(&r);
        assert_eq!(
            text,
            "Matches the hot, red, throbbing pattern (80% of signature keywords present). \
             Covers 3 decisive symptoms. \
             Fits the acute presentation pattern of this case. \
             Keynote characteristics present (3 characteristic matches)."
        );

        let suggestion = &rank(vec![r], 1)[0];
        assert!(suggestion.pattern_locked);
        assert_eq!(suggestion.pattern_description.as_deref(), Some("hot, red, throbbing"));
    }

    #[test]
    fn unmatched_pattern_is_not_cited() {
        let mut r = remedy("Aconitum Napellus", 10.0);
        r.decisive_symptom_count = 1;
        r.pattern = Some(PatternMatch {
            match_count: 1,
            matched: false,
            match_strength: 25.0,
            description: "fear".to_string(),
            acute_remedy: false,
        });
        assert_eq!(justify(&r), "Covers 1 decisive symptom.");
        assert!(!rank(vec![r], 1)[0].pattern_locked);
    }
}
