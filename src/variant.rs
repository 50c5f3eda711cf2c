use std::fmt::Debug;
use std::sync::Arc;

use crate::corpus::{Library, PhraseBook, WordList};
use crate::preferences::{DEFAULT_WORD_COUNT, MAX_WORD_COUNT, MIN_WORD_COUNT};
use crate::session::GameError;

/// Per-game options supplied when a game starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameConfig {
    pub word_count: Option<usize>,
}

impl GameConfig {
    pub fn with_word_count(word_count: usize) -> Self {
        Self {
            word_count: Some(word_count),
        }
    }
}

/// Games offered in the menu, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GameKind {
    #[strum(serialize = "Random Words")]
    RandomWords,
    #[strum(serialize = "Phrase Typing")]
    PhraseTyping,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::RandomWords, GameKind::PhraseTyping];

    pub fn description(&self) -> &'static str {
        match self {
            GameKind::RandomWords => {
                "Type randomly selected words as fast and accurately as possible"
            }
            GameKind::PhraseTyping => "Type complete phrases and quotes to improve your typing flow",
        }
    }

    /// A fresh, uninitialized content provider for this game.
    pub fn variant(&self, library: &Library) -> Box<dyn Variant> {
        match self {
            GameKind::RandomWords => Box::new(RandomWords::new(Arc::clone(&library.words))),
            GameKind::PhraseTyping => Box::new(PhraseTyping::new(library.phrases.clone())),
        }
    }
}

/// Content strategy plugged into a [`crate::session::Session`].
///
/// `initialize` validates the game's own parameters; `generate` produces the
/// words to type for one attempt.
pub trait Variant: Debug {
    fn kind(&self) -> GameKind;
    fn initialize(&mut self, config: &GameConfig) -> Result<(), GameError>;
    fn generate(&mut self) -> Result<Vec<String>, GameError>;
}

#[derive(Debug)]
pub struct RandomWords {
    words: Arc<WordList>,
    word_count: usize,
}

impl RandomWords {
    pub fn new(words: Arc<WordList>) -> Self {
        Self {
            words,
            word_count: DEFAULT_WORD_COUNT,
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

impl Variant for RandomWords {
    fn kind(&self) -> GameKind {
        GameKind::RandomWords
    }

    fn initialize(&mut self, config: &GameConfig) -> Result<(), GameError> {
        let count = config.word_count.unwrap_or(DEFAULT_WORD_COUNT);
        if !(MIN_WORD_COUNT..=MAX_WORD_COUNT).contains(&count) {
            return Err(GameError::WordCountOutOfRange {
                count,
                min: MIN_WORD_COUNT,
                max: MAX_WORD_COUNT,
            });
        }
        self.word_count = count;
        Ok(())
    }

    fn generate(&mut self) -> Result<Vec<String>, GameError> {
        if self.words.is_empty() {
            log::warn!("word list is empty, random words game has no content");
        }
        Ok(self.words.sample(self.word_count))
    }
}

#[derive(Debug)]
pub struct PhraseTyping {
    phrases: Option<Arc<PhraseBook>>,
}

impl PhraseTyping {
    pub fn new(phrases: Option<Arc<PhraseBook>>) -> Self {
        Self { phrases }
    }
}

impl Variant for PhraseTyping {
    fn kind(&self) -> GameKind {
        GameKind::PhraseTyping
    }

    fn initialize(&mut self, _config: &GameConfig) -> Result<(), GameError> {
        Ok(())
    }

    fn generate(&mut self) -> Result<Vec<String>, GameError> {
        let phrases = self.phrases.as_ref().ok_or(GameError::NoPhrases)?;
        Ok(phrases
            .random_phrase()
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn library() -> Library {
        Library::new(
            WordList::new(["one", "two", "three"].map(String::from).to_vec()),
            PhraseBook::new(vec!["to be or not".to_string()]).ok(),
        )
    }

    #[test]
    fn test_game_kind_names() {
        assert_eq!(GameKind::RandomWords.to_string(), "Random Words");
        assert_eq!(GameKind::PhraseTyping.to_string(), "Phrase Typing");
        assert_eq!(GameKind::ALL.len(), 2);
    }

    #[test]
    fn test_random_words_default_count() {
        let mut variant = GameKind::RandomWords.variant(&library());
        variant.initialize(&GameConfig::default()).unwrap();
        // Three candidates, twenty requested: sampled with replacement
        assert_eq!(variant.generate().unwrap().len(), DEFAULT_WORD_COUNT);
    }

    #[test]
    fn test_random_words_rejects_out_of_range() {
        let lib = library();
        let mut variant = RandomWords::new(Arc::clone(&lib.words));
        assert_matches!(
            variant.initialize(&GameConfig::with_word_count(MIN_WORD_COUNT - 1)),
            Err(GameError::WordCountOutOfRange { count: 4, .. })
        );
        assert_matches!(
            variant.initialize(&GameConfig::with_word_count(MAX_WORD_COUNT + 1)),
            Err(GameError::WordCountOutOfRange { .. })
        );
        assert_eq!(variant.word_count(), DEFAULT_WORD_COUNT);

        variant
            .initialize(&GameConfig::with_word_count(MAX_WORD_COUNT))
            .unwrap();
        assert_eq!(variant.word_count(), MAX_WORD_COUNT);
    }

    #[test]
    fn test_random_words_empty_list_yields_no_words() {
        let mut variant = RandomWords::new(Arc::new(WordList::default()));
        variant.initialize(&GameConfig::with_word_count(10)).unwrap();
        assert!(variant.generate().unwrap().is_empty());
    }

    #[test]
    fn test_phrase_is_split_into_words() {
        let mut variant = GameKind::PhraseTyping.variant(&library());
        variant.initialize(&GameConfig::with_word_count(1000)).unwrap();
        assert_eq!(variant.generate().unwrap(), vec!["to", "be", "or", "not"]);
    }

    #[test]
    fn test_phrase_without_book_fails() {
        let mut variant = PhraseTyping::new(None);
        variant.initialize(&GameConfig::default()).unwrap();
        assert_matches!(variant.generate(), Err(GameError::NoPhrases));
    }
}
