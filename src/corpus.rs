use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

static RESOURCES: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources");

const WORDS_FILE: &str = "words.json";
const PHRASES_FILE: &str = "phrases.json";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse corpus file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bundled resource '{0}' not found")]
    MissingResource(&'static str),

    #[error("No phrases found")]
    NoPhrases,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WordFile {
    #[serde(default)]
    words: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PhraseFile {
    #[serde(default)]
    phrases: Vec<String>,
}

fn bundled(name: &'static str) -> Result<&'static str, CorpusError> {
    RESOURCES
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .ok_or(CorpusError::MissingResource(name))
}

/// Candidate words for the random-words game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    /// The bundled English list. Degrades to an empty list if the resource is unusable.
    pub fn embedded() -> Self {
        let parsed = bundled(WORDS_FILE)
            .and_then(|s| serde_json::from_str::<WordFile>(s).map_err(CorpusError::from));
        match parsed {
            Ok(file) => Self::new(file.words),
            Err(e) => {
                log::warn!("bundled word list unavailable: {e}");
                Self::default()
            }
        }
    }

    /// Load a `{"words": [...]}` file. A missing file is an empty list.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(s) => Ok(Self::new(serde_json::from_str::<WordFile>(&s)?.words)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Bundled words plus any the user added at `path`, without duplicates.
    pub fn with_user_words<P: AsRef<Path>>(path: P) -> Self {
        let user = Self::from_path(path.as_ref()).unwrap_or_else(|e| {
            log::warn!("ignoring user word file {}: {e}", path.as_ref().display());
            Self::default()
        });
        let mut list = Self::embedded();
        list.merge(user.words);
        list
    }

    fn merge(&mut self, more: Vec<String>) {
        self.words = std::mem::take(&mut self.words)
            .into_iter()
            .chain(more)
            .unique()
            .collect();
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pick `count` words without replacement, or with replacement when the list is too short.
    pub fn sample(&self, count: usize) -> Vec<String> {
        if self.words.is_empty() {
            return Vec::new();
        }

        let mut rng = rand::thread_rng();
        if self.words.len() < count {
            return (0..count)
                .filter_map(|_| self.words.choose(&mut rng).cloned())
                .collect();
        }

        self.words
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    }
}

/// Append unique `new_words` to the word file at `path`, creating it if needed.
///
/// Returns how many words were actually added.
pub fn add_words<P: AsRef<Path>>(path: P, new_words: &[String]) -> Result<usize, CorpusError> {
    let path = path.as_ref();
    let mut list = WordList::from_path(path)?;
    // The file itself may repeat words.
    list.merge(Vec::new());
    let before = list.len();
    list.merge(
        new_words
            .iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect(),
    );

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = WordFile { words: list.words };
    fs::write(path, serde_json::to_vec_pretty(&file)?)?;

    Ok(file.words.len() - before)
}

/// Candidate phrases for the phrase game. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseBook {
    phrases: Vec<String>,
}

impl PhraseBook {
    pub fn new(phrases: Vec<String>) -> Result<Self, CorpusError> {
        let phrases: Vec<String> = phrases
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if phrases.is_empty() {
            return Err(CorpusError::NoPhrases);
        }
        Ok(Self { phrases })
    }

    pub fn embedded() -> Result<Self, CorpusError> {
        let file: PhraseFile = serde_json::from_str(bundled(PHRASES_FILE)?)?;
        Self::new(file.phrases)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let file: PhraseFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::new(file.phrases)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn random_phrase(&self) -> &str {
        self.phrases
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Content shared by every game the router starts.
#[derive(Debug, Clone)]
pub struct Library {
    pub words: Arc<WordList>,
    /// `None` when no usable phrase book could be loaded.
    pub phrases: Option<Arc<PhraseBook>>,
}

impl Library {
    pub fn new(words: WordList, phrases: Option<PhraseBook>) -> Self {
        Self {
            words: Arc::new(words),
            phrases: phrases.map(Arc::new),
        }
    }

    /// Bundled corpora plus the user's extra words.
    pub fn load<P: AsRef<Path>>(user_words: P) -> Self {
        Self::new(WordList::with_user_words(user_words), bundled_phrases())
    }
}

fn bundled_phrases() -> Option<PhraseBook> {
    PhraseBook::embedded()
        .inspect_err(|e| log::error!("phrase book unavailable: {e}"))
        .ok()
}

impl Default for Library {
    fn default() -> Self {
        Self::new(WordList::embedded(), bundled_phrases())
    }
}
