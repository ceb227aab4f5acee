/// Repertory store: the three read-only reference datasets.
///
/// - repertory: categories -> rubrics -> graded remedies
/// - remedy map: abbreviation -> full name
/// - remedy patterns: full name -> keyword signature (optional file)
///
/// Any missing or malformed file is a `DataLoad` error. Nothing here is mutated after
/// construction, so a store can be shared across threads behind an `Arc`.
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::EngineError;
use crate::matcher::{rubric_words, search_terms};
use crate::model::{Category, RemedyMap, RemedyPattern, RemedyPatterns, Repertory};

/// Locations of the reference files on disk.
#[derive(Debug, Clone)]
pub struct DataFiles {
    pub repertory: PathBuf,
    pub remedy_map: PathBuf,
    /// `None` runs without pattern recognition.
    pub patterns: Option<PathBuf>,
}

/// Match tokens of one category title and each of its rubric titles, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleWords {
    pub category: Vec<String>,
    pub rubrics: Vec<Vec<String>>,
}

impl TitleWords {
    fn of(category: &Category) -> Self {
        Self {
            category: search_terms(&category.title),
            rubrics: category.rubrics.iter().map(|r| rubric_words(&r.title)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepertoryStore {
    repertory: Repertory,
    remedy_map: RemedyMap,
    patterns: RemedyPatterns,
    title_words: Vec<TitleWords>,
}

impl RepertoryStore {
    pub fn load(files: &DataFiles) -> Result<Self, EngineError> {
        let repertory: Repertory = read_json(&files.repertory)?;
        let remedy_map: RemedyMap = read_json(&files.remedy_map)?;
        let patterns: RemedyPatterns = match &files.patterns {
            Some(path) => read_json(path)?,
            None => RemedyPatterns::new(),
        };

        let store = Self::from_parts(repertory, remedy_map, patterns);
        info!(
            categories = store.repertory.categories.len(),
            rubrics = store.rubric_count(),
            remedies = store.remedy_map.len(),
            patterns = store.patterns.len(),
            "repertory loaded"
        );
        Ok(store)
    }

    /// Build a store from JSON documents already in memory.
    pub fn from_json(
        repertory: &str,
        remedy_map: &str,
        patterns: Option<&str>,
    ) -> Result<Self, EngineError> {
        let repertory: Repertory = parse_json("<repertory>", repertory)?;
        let remedy_map: RemedyMap = parse_json("<remedy map>", remedy_map)?;
        let patterns: RemedyPatterns = match patterns {
            Some(json) => parse_json("<remedy patterns>", json)?,
            None => RemedyPatterns::new(),
        };
        Ok(Self::from_parts(repertory, remedy_map, patterns))
    }

    pub fn from_parts(repertory: Repertory, remedy_map: RemedyMap, patterns: RemedyPatterns) -> Self {
        let title_words = repertory.categories.iter().map(TitleWords::of).collect();
        Self {
            title_words,
            repertory,
            remedy_map,
            patterns,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.repertory.categories
    }

    /// Tokenized titles, parallel to `categories()`.
    pub fn title_words(&self) -> &[TitleWords] {
        &self.title_words
    }

    pub fn rubric_count(&self) -> usize {
        self.repertory.categories.iter().map(|c| c.rubrics.len()).sum()
    }

    /// Full remedy name for an abbreviation, falling back to the abbreviation itself.
    pub fn full_name<'a>(&'a self, abbreviation: &'a str) -> &'a str {
        self.remedy_map
            .get(abbreviation)
            .map(String::as_str)
            .unwrap_or(abbreviation)
    }

    pub fn pattern(&self, full_name: &str) -> Option<&RemedyPattern> {
        self.patterns.get(full_name)
    }

    /// Case-insensitive abbreviation lookup. Returns `(abbreviation, full_name)` as stored.
    pub fn lookup_abbreviation(&self, abbreviation: &str) -> Option<(&str, &str)> {
        self.remedy_map
            .iter()
            .find(|(abbr, _)| abbr.eq_ignore_ascii_case(abbreviation))
            .map(|(abbr, name)| (abbr.as_str(), name.as_str()))
    }

    pub fn find_category(&self, title: &str) -> Option<&Category> {
        self.repertory
            .categories
            .iter()
            .find(|c| c.title.eq_ignore_ascii_case(title))
    }
}

/// Lazily loaded, process-wide repertory.
///
/// The first successful `get` populates the cell; later calls return the same `Arc`.
/// A failed load is not cached. Racing first callers may each read the files, and
/// whichever `set` lands first wins. The data is identical either way.
pub struct SharedRepertory {
    files: DataFiles,
    cell: OnceLock<Arc<RepertoryStore>>,
}

impl SharedRepertory {
    pub fn new(files: DataFiles) -> Self {
        Self {
            files,
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<Arc<RepertoryStore>, EngineError> {
        if let Some(store) = self.cell.get() {
            return Ok(Arc::clone(store));
        }
        let loaded = Arc::new(RepertoryStore::load(&self.files)?);
        let _ = self.cell.set(loaded);
        self.cell
            .get()
            .map(Arc::clone)
            .ok_or_else(|| EngineError::Computation("repertory cell empty after load".to_string()))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let label = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|e| EngineError::data_load(label.clone(), e))?;
    parse_json(&label, &content)
}

fn parse_json<T: DeserializeOwned>(label: &str, content: &str) -> Result<T, EngineError> {
    serde_json::from_str(content).map_err(|e| EngineError::data_load(label, e))
}
