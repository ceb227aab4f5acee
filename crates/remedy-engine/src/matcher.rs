/// Rubric matcher: walks the repertory once per symptom and tallies graded hits per remedy.
///
/// Matching is substring overlap between tokens in either direction ("ear" matches
/// "fear" and "fear" matches "ear"). It is a loose heuristic, not a stemmer, and the
/// over-matching on short tokens is pinned by tests below.
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::classifier::{self, Classification};
use crate::model::{Grade, Symptom, SymptomType};
use crate::repertory::RepertoryStore;

static RUBRIC_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;,\-\s+]+").expect("valid regex"));

const MIN_TOKEN_CHARS: usize = 2;

/// Per-remedy statistics for a single engine call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemedyStats {
    pub full_name: String,
    pub rubric_matches: u32,
    pub total_grade: u32,
    pub decisive_symptom_count: u32,
    pub characteristic_match_count: u32,
    /// Indices of the symptoms that hit this remedy.
    pub matched_symptoms: HashSet<usize>,
    /// Never contains `Physical`.
    pub matched_symptom_types: HashSet<SymptomType>,
    pub effective_grades: Vec<f64>,
}

impl RemedyStats {
    fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            ..Self::default()
        }
    }

    fn record(
        &mut self,
        grade: Grade,
        effective_grade: f64,
        symptom_index: usize,
        symptom: &Symptom,
        class: Classification,
    ) {
        self.rubric_matches += 1;
        self.matched_symptoms.insert(symptom_index);
        self.total_grade += u32::from(grade.value());
        self.effective_grades.push(effective_grade);
        if symptom.kind != SymptomType::Physical {
            self.matched_symptom_types.insert(symptom.kind);
        }
        if class.is_decisive {
            self.decisive_symptom_count += 1;
        }
        if class.is_characteristic() {
            self.characteristic_match_count += 1;
        }
    }

    pub fn coverage(&self) -> u32 {
        self.matched_symptoms.len() as u32
    }
}

/// Remedy stats keyed by abbreviation, in first-encountered order.
#[derive(Debug, Default)]
pub struct RemedyTally {
    entries: Vec<(String, RemedyStats)>,
    index: HashMap<String, usize>,
}

impl RemedyTally {
    fn entry(&mut self, abbreviation: &str, full_name: &str) -> &mut RemedyStats {
        let idx = match self.index.get(abbreviation) {
            Some(&idx) => idx,
            None => {
                self.entries
                    .push((abbreviation.to_string(), RemedyStats::new(full_name)));
                self.index
                    .insert(abbreviation.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn get(&self, abbreviation: &str) -> Option<&RemedyStats> {
        self.index.get(abbreviation).map(|&idx| &self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemedyStats)> {
        self.entries.iter().map(|(abbr, stats)| (abbr.as_str(), stats))
    }
}

/// Outcome of comparing one symptom against one rubric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubricMatch {
    pub category_match: bool,
    pub matched_rubric_count: usize,
    pub match_quality: f64,
}

/// Strip `;`, `,` and `-`, lowercase, split on whitespace, keep tokens of 2+ chars.
pub fn search_terms(text: &str) -> Vec<String> {
    text.replace([';', ',', '-'], " ")
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Lowercase and split a rubric title on `; , - + whitespace`, keep tokens of 2+ chars.
pub fn rubric_words(title: &str) -> Vec<String> {
    RUBRIC_SEPARATORS
        .split(&title.to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

pub fn category_matches(search_terms: &[String], category_words: &[String]) -> bool {
    search_terms
        .iter()
        .any(|term| category_words.iter().any(|word| overlaps(term, word)))
}

/// Returns the match when `(category hit AND 1+ rubric hit) OR 2+ rubric hits`.
pub fn match_rubric(
    search_terms: &[String],
    category_match: bool,
    rubric_words: &[String],
) -> Option<RubricMatch> {
    let matched_rubric_count = search_terms
        .iter()
        .filter(|term| rubric_words.iter().any(|word| overlaps(term, word)))
        .count();

    let fires = (category_match && matched_rubric_count >= 1) || matched_rubric_count >= 2;
    if !fires {
        return None;
    }

    let hits = matched_rubric_count + usize::from(category_match);
    let match_quality = hits as f64 / search_terms.len().max(1) as f64;
    Some(RubricMatch {
        category_match,
        matched_rubric_count,
        match_quality,
    })
}

pub fn grade_multiplier(grade: Grade, level: u8) -> f64 {
    match (grade.value(), level) {
        (3, 4) => 2.5,
        (3, 3) => 1.8,
        (2, 4) => 1.5,
        _ => 1.0,
    }
}

/// Match every symptom against every rubric and accumulate remedy statistics.
pub fn tally(store: &RepertoryStore, symptoms: &[Symptom]) -> RemedyTally {
    let mut tally = RemedyTally::default();

    for (index, symptom) in symptoms.iter().enumerate() {
        let terms = search_terms(&symptom.clinical);
        if terms.is_empty() {
            debug!(symptom = %symptom.clinical, "symptom has no usable search terms");
            continue;
        }
        let class = classifier::classify(symptom);
        let mut hits = 0usize;

        for (category, words) in store.categories().iter().zip(store.title_words()) {
            let category_match = category_matches(&terms, &words.category);

            for (rubric, title) in category.rubrics.iter().zip(&words.rubrics) {
                let Some(m) = match_rubric(&terms, category_match, title) else {
                    continue;
                };
                hits += 1;

                for remedy in &rubric.remedies {
                    let full_name = store.full_name(&remedy.abbreviation);
                    let effective_grade = f64::from(remedy.grade.value())
                        * grade_multiplier(remedy.grade, class.level)
                        * m.match_quality;
                    tally
                        .entry(&remedy.abbreviation, full_name)
                        .record(remedy.grade, effective_grade, index, symptom, class);
                }
            }
        }

        debug!(
            symptom = %symptom.clinical,
            terms = ?terms,
            level = class.level,
            rubric_hits = hits,
            "symptom matched"
        );
    }

    tally
}
