/// Clinical-importance classification of a single symptom.
///
/// Levels, highest first:
/// - 4 `DecisiveCharacteristic`: keynotes, intense/sudden qualities, characteristic modalities
/// - 3 `MentalEmotional`
/// - 2 `PhysicalGeneral`: fever, sleep, generals
/// - 1 `CommonLocal`
use serde::{Deserialize, Serialize};

use crate::model::{Symptom, SymptomType};

const DECISIVE_KEYWORDS: &[&str] = &[
    "sudden",
    "violent",
    "throbbing",
    "intense",
    "acute",
    "rapid",
    "burning",
    "shooting",
    "tearing",
    "bursting",
    "pulsating",
];

const CHARACTERISTIC_MODALITIES: &[&str] = &[
    "worse from light",
    "worse from noise",
    "worse from jar",
    "worse from motion",
    "better from pressure",
    "better from cold",
];

const GENERAL_MARKERS: &[&str] = &["general", "fever", "sleep"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymptomCategory {
    DecisiveCharacteristic,
    MentalEmotional,
    PhysicalGeneral,
    CommonLocal,
}

impl SymptomCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SymptomCategory::DecisiveCharacteristic => "DECISIVE_CHARACTERISTIC",
            SymptomCategory::MentalEmotional => "MENTAL_EMOTIONAL",
            SymptomCategory::PhysicalGeneral => "PHYSICAL_GENERAL",
            SymptomCategory::CommonLocal => "COMMON_LOCAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub level: u8,
    pub category: SymptomCategory,
    pub is_decisive: bool,
}

impl Classification {
    pub fn is_characteristic(&self) -> bool {
        self.level == 4
    }
}

pub fn classify(symptom: &Symptom) -> Classification {
    classify_text(&symptom.clinical, symptom.kind)
}

pub fn classify_text(text: &str, kind: SymptomType) -> Classification {
    let text = text.to_lowercase();

    let decisive = kind == SymptomType::Keynote
        || contains_any(&text, DECISIVE_KEYWORDS)
        || contains_any(&text, CHARACTERISTIC_MODALITIES);

    if decisive {
        Classification {
            level: 4,
            category: SymptomCategory::DecisiveCharacteristic,
            is_decisive: true,
        }
    } else if kind == SymptomType::Mental {
        Classification {
            level: 3,
            category: SymptomCategory::MentalEmotional,
            is_decisive: false,
        }
    } else if contains_any(&text, GENERAL_MARKERS) {
        Classification {
            level: 2,
            category: SymptomCategory::PhysicalGeneral,
            is_decisive: false,
        }
    } else {
        Classification {
            level: 1,
            category: SymptomCategory::CommonLocal,
            is_decisive: false,
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(*n))
}
