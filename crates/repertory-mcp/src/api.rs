/// Tool parameter and response types published over MCP.
///
/// The engine's own types stay schema-free; these mirror them with `JsonSchema` so every
/// tool carries an input and output schema.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use remedy_engine::classifier::Classification;
use remedy_engine::model::{Category, RemedyPattern};
use remedy_engine::{CaseType, PatientProfile, Suggestion, Symptom, SymptomType};

pub const MAX_LIMIT: usize = 50;

/// A symptom object, or a bare clinical phrase treated as physical.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SymptomInput {
    Text(String),
    Full(SymptomFields),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SymptomFields {
    /// Rubric-like phrase, e.g. "HEAD PAIN THROBBING"
    pub clinical: String,
    /// Patient-facing wording
    #[serde(default)]
    pub friendly: Option<String>,
    /// "mental", "keynote" or "physical" (default)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<SymptomInput> for Symptom {
    fn from(input: SymptomInput) -> Self {
        match input {
            SymptomInput::Text(clinical) => Symptom::new(clinical, SymptomType::Physical),
            SymptomInput::Full(fields) => Symptom {
                clinical: fields.clinical,
                friendly: fields.friendly.unwrap_or_default(),
                kind: symptom_type(fields.kind.as_deref()),
            },
        }
    }
}

pub fn symptom_type(label: Option<&str>) -> SymptomType {
    match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
        Some("mental") => SymptomType::Mental,
        Some("keynote") => SymptomType::Keynote,
        _ => SymptomType::Physical,
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SuggestRemediesParams {
    pub symptoms: Vec<SymptomInput>,
    /// "acute" or "chronic" (default)
    #[serde(default)]
    pub case_type: Option<String>,
    #[serde(default)]
    pub miasm: Option<String>,
    #[serde(default)]
    pub constitution: Option<String>,
    /// Maximum number of suggestions (default 10, max 50)
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SuggestRemediesParams {
    pub fn profile(&self) -> PatientProfile {
        let case_type = match self.case_type.as_deref().map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("acute") => CaseType::Acute,
            _ => CaseType::Chronic,
        };
        PatientProfile {
            case_type,
            miasm: self.miasm.clone(),
            constitution: self.constitution.clone(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassifySymptomParams {
    pub clinical: String,
    /// "mental", "keynote" or "physical" (default)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LookupRemedyParams {
    /// Remedy abbreviation, e.g. "Bell" (case-insensitive)
    pub abbreviation: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCategoryParams {
    /// Category title, e.g. "Head" (case-insensitive)
    pub category: String,
}

/// Same shape the case store persists.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionOutput {
    pub full_name: String,
    pub short_name: String,
    pub score: f64,
    /// Score relative to the best candidate, 0-100
    pub percent_match: f64,
    pub clinical_justification: String,
    pub rubric_matches: u32,
    pub decisive_symptom_count: u32,
    pub characteristic_match_count: u32,
    /// Distinct symptoms that matched this remedy
    pub coverage: u32,
    pub intensity: f64,
    pub pattern_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_description: Option<String>,
    pub boosts: Vec<String>,
}

impl From<Suggestion> for SuggestionOutput {
    fn from(s: Suggestion) -> Self {
        Self {
            full_name: s.full_name,
            short_name: s.short_name,
            score: s.score,
            percent_match: s.percent_match,
            clinical_justification: s.clinical_justification,
            rubric_matches: s.rubric_matches,
            decisive_symptom_count: s.decisive_symptom_count,
            characteristic_match_count: s.characteristic_match_count,
            coverage: s.coverage,
            intensity: s.intensity,
            pattern_locked: s.pattern_locked,
            pattern_description: s.pattern_description,
            boosts: s.boosts,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SuggestRemediesResponse {
    pub suggestions: Vec<SuggestionOutput>,
    /// True when served from the Redis cache
    pub cached: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ClassifySymptomResponse {
    /// 4 decisive, 3 mental, 2 physical general, 1 common local
    pub level: u8,
    pub category: String,
    pub is_decisive: bool,
}

impl From<Classification> for ClassifySymptomResponse {
    fn from(c: Classification) -> Self {
        Self {
            level: c.level,
            category: c.category.as_str().to_string(),
            is_decisive: c.is_decisive,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PatternInfo {
    pub keywords: Vec<String>,
    pub min_match: usize,
    pub description: String,
    pub acute_remedy: bool,
}

impl From<&RemedyPattern> for PatternInfo {
    fn from(p: &RemedyPattern) -> Self {
        Self {
            keywords: p.keywords.clone(),
            min_match: p.min_match.unwrap_or(remedy_engine::pattern::DEFAULT_MIN_MATCH),
            description: p.description.clone(),
            acute_remedy: p.acute_remedy,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LookupRemedyResponse {
    pub abbreviation: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternInfo>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RubricSummary {
    pub title: String,
    pub remedy_count: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CategoryResponse {
    pub title: String,
    pub rubric_count: usize,
    pub rubrics: Vec<RubricSummary>,
}

impl From<&Category> for CategoryResponse {
    fn from(c: &Category) -> Self {
        Self {
            title: c.title.clone(),
            rubric_count: c.rubrics.len(),
            rubrics: c
                .rubrics
                .iter()
                .map(|r| RubricSummary {
                    title: r.title.clone(),
                    remedy_count: r.remedies.len(),
                })
                .collect(),
        }
    }
}
