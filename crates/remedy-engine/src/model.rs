use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The full repertory: categories in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repertory {
    pub categories: Vec<Category>,
}

/// A top-level grouping of rubrics (e.g. "Head", "Fever", "Mind").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    #[serde(default)]
    pub rubrics: Vec<Rubric>,
}

/// A leaf symptom descriptor listing graded remedy candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    pub title: String,
    #[serde(default)]
    pub remedies: Vec<RemedyGrade>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyGrade {
    /// Remedy abbreviation, e.g. "Bell", "Nux-v"
    pub abbreviation: String,
    #[serde(default)]
    pub grade: Grade,
}

/// Strength of a remedy's association with a rubric. Always 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub const ONE: Grade = Grade(1);
    pub const TWO: Grade = Grade(2);
    pub const THREE: Grade = Grade(3);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade::ONE
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Grade(value)),
            other => Err(format!("grade must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

/// Abbreviation -> full remedy name.
pub type RemedyMap = HashMap<String, String>;

/// Full remedy name -> signature pattern.
pub type RemedyPatterns = HashMap<String, RemedyPattern>;

/// A known "signature" of a remedy: a keyword set that, when enough of it shows up in
/// the case, locks the remedy in with a large bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyPattern {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub min_match: Option<usize>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub acute_remedy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomType {
    Mental,
    Keynote,
    #[default]
    #[serde(other)]
    Physical,
}

impl SymptomType {
    pub fn as_str(self) -> &'static str {
        match self {
            SymptomType::Mental => "mental",
            SymptomType::Keynote => "keynote",
            SymptomType::Physical => "physical",
        }
    }
}

impl fmt::Display for SymptomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symptom as produced by the case summarizer.
///
/// Older summarizer output is a bare string; it reads as a physical symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SymptomRepr")]
pub struct Symptom {
    /// Rubric-like phrase, e.g. "HEAD PAIN THROBBING"
    pub clinical: String,
    /// Patient-facing wording
    pub friendly: String,
    #[serde(rename = "type")]
    pub kind: SymptomType,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SymptomRepr {
    Text(String),
    Full {
        #[serde(alias = "text")]
        clinical: String,
        #[serde(default)]
        friendly: String,
        #[serde(rename = "type", default)]
        kind: SymptomType,
    },
}

impl From<SymptomRepr> for Symptom {
    fn from(repr: SymptomRepr) -> Self {
        match repr {
            SymptomRepr::Text(clinical) => Symptom::new(clinical, SymptomType::Physical),
            SymptomRepr::Full {
                clinical,
                friendly,
                kind,
            } => Symptom {
                clinical,
                friendly,
                kind,
            },
        }
    }
}

impl Symptom {
    pub fn new(clinical: impl Into<String>, kind: SymptomType) -> Self {
        Self {
            clinical: clinical.into(),
            friendly: String::new(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Acute,
    #[default]
    #[serde(other)]
    Chronic,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(rename = "type", default)]
    pub case_type: CaseType,
    #[serde(default)]
    pub miasm: Option<String>,
    #[serde(default)]
    pub constitution: Option<String>,
}

impl PatientProfile {
    pub fn acute() -> Self {
        Self {
            case_type: CaseType::Acute,
            ..Self::default()
        }
    }

    pub fn chronic() -> Self {
        Self::default()
    }
}

/// A ranked remedy candidate, in the shape the case store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub full_name: String,
    pub short_name: String,
    pub score: f64,
    pub percent_match: f64,
    pub clinical_justification: String,
    pub rubric_matches: u32,
    pub decisive_symptom_count: u32,
    pub characteristic_match_count: u32,
    /// Distinct symptoms that hit at least one rubric listing this remedy
    #[serde(default)]
    pub coverage: u32,
    /// Weighted intensity term of the score
    #[serde(default)]
    pub intensity: f64,
    pub pattern_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_description: Option<String>,
    #[serde(default)]
    pub boosts: Vec<String>,
}
