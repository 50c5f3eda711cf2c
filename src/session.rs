use std::time::SystemTime;

use chrono::Utc;
use thiserror::Error;

use crate::metrics::{compute_accuracy, compute_wpm};
use crate::result::GameResult;
use crate::variant::{GameConfig, GameKind, Variant};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Word count {count} is outside the allowed range {min}..={max}")]
    WordCountOutOfRange { count: usize, min: usize, max: usize },

    #[error("Game is not ready to start")]
    NotReady,

    #[error("No phrases available")]
    NoPhrases,

    #[error("No game is active")]
    NoActiveGame,

    #[error("Game is not accepting input")]
    NotAcceptingInput,

    #[error("No game at index {index} (catalog has {len})")]
    InvalidSelection { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    Ready,
    Active,
    Completed,
    Cancelled,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        match self {
            GameStatus::Completed | GameStatus::Cancelled => true,
            GameStatus::NotStarted | GameStatus::Ready | GameStatus::Active => false,
        }
    }
}

/// What a call to [`Session::process_input`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// The session is not accepting input; nothing changed.
    Inactive,
    /// Live input for the current word was recorded.
    Typing,
    /// A word was submitted and more remain.
    WordCompleted,
    /// Every word has been attempted.
    Complete,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayData<'a> {
    pub target_words: &'a [String],
    pub typed_words: &'a [String],
    pub current_index: usize,
    pub current_input: &'a str,
}

impl DisplayData<'_> {
    pub fn total_words(&self) -> usize {
        self.target_words.len()
    }

    pub fn current_target(&self) -> &str {
        self.target_words
            .get(self.current_index)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Live numbers for the stats bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStats {
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    pub total_words: usize,
    pub characters_typed: usize,
}

/// One typing attempt.
///
/// The variant supplies the words; the session tracks progress, timing and
/// mistakes, and produces a [`GameResult`] when finished.
#[derive(Debug)]
pub struct Session {
    variant: Box<dyn Variant>,
    status: GameStatus,
    target_words: Vec<String>,
    typed_words: Vec<String>,
    cursor: usize,
    error_count: usize,
    current_input: String,
    previous_input: String,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
    result: Option<GameResult>,
}

fn secs_between(start: SystemTime, end: SystemTime) -> f64 {
    end.duration_since(start)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

impl Session {
    pub fn new(variant: Box<dyn Variant>) -> Self {
        Self {
            variant,
            status: GameStatus::NotStarted,
            target_words: Vec::new(),
            typed_words: Vec::new(),
            cursor: 0,
            error_count: 0,
            current_input: String::new(),
            previous_input: String::new(),
            started_at: None,
            ended_at: None,
            result: None,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.variant.kind()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn target_words(&self) -> &[String] {
        &self.target_words
    }

    pub fn typed_words(&self) -> &[String] {
        &self.typed_words
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Validate `config` with the variant. On failure the status is left unchanged.
    pub fn initialize(&mut self, config: &GameConfig) -> Result<(), GameError> {
        match self.status {
            GameStatus::NotStarted | GameStatus::Ready => {}
            GameStatus::Active | GameStatus::Completed | GameStatus::Cancelled => {
                return Err(GameError::NotReady)
            }
        }
        self.variant.initialize(config)?;
        self.status = GameStatus::Ready;
        Ok(())
    }

    /// Fill the target words from the variant and clear all progress.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::Ready {
            return Err(GameError::NotReady);
        }
        self.target_words = self.variant.generate()?;
        self.reset_progress();
        log::debug!(
            "{} ready with {} words",
            self.kind(),
            self.target_words.len()
        );
        Ok(())
    }

    /// Swap in previously used words, e.g. to replay the same text.
    ///
    /// Only allowed before typing begins.
    pub fn replace_target(&mut self, words: Vec<String>) -> Result<(), GameError> {
        if self.status != GameStatus::Ready {
            return Err(GameError::NotReady);
        }
        self.target_words = words;
        self.reset_progress();
        Ok(())
    }

    fn reset_progress(&mut self) {
        self.typed_words.clear();
        self.cursor = 0;
        self.error_count = 0;
        self.current_input.clear();
        self.previous_input.clear();
        self.started_at = None;
        self.ended_at = None;
        self.result = None;
    }

    fn ensure_slot(&mut self) {
        while self.typed_words.len() <= self.cursor {
            self.typed_words.push(String::new());
        }
    }

    /// Feed live input (`is_complete == false`) or a submitted word.
    ///
    /// The first non-empty input on a ready session starts the timer.
    pub fn process_input(&mut self, text: &str, is_complete: bool) -> InputStatus {
        if self.status == GameStatus::Ready && self.started_at.is_none() && !text.is_empty() {
            self.status = GameStatus::Active;
            self.started_at = Some(SystemTime::now());
        }

        if self.status != GameStatus::Active {
            return InputStatus::Inactive;
        }

        if is_complete {
            self.submit_word(text)
        } else {
            self.update_partial(text)
        }
    }

    fn submit_word(&mut self, word: &str) -> InputStatus {
        if self.cursor >= self.target_words.len() {
            self.status = GameStatus::Completed;
            return InputStatus::Complete;
        }

        self.ensure_slot();
        self.typed_words[self.cursor] = word.to_string();
        self.cursor += 1;
        self.current_input.clear();
        self.previous_input.clear();

        if self.cursor >= self.target_words.len() {
            self.status = GameStatus::Completed;
            self.typed_words
                .resize(self.target_words.len().max(self.typed_words.len()), String::new());
            return InputStatus::Complete;
        }

        InputStatus::WordCompleted
    }

    fn update_partial(&mut self, text: &str) -> InputStatus {
        if let Some(target) = self.target_words.get(self.cursor) {
            // Only a newly added wrong character is a mistake; deletions never count.
            let grew = text.chars().count() > self.previous_input.chars().count();
            if !text.is_empty() && grew && !target.starts_with(text) {
                self.error_count += 1;
            }

            self.ensure_slot();
            self.typed_words[self.cursor] = text.to_string();
        }

        self.previous_input = text.to_string();
        self.current_input = text.to_string();
        InputStatus::Typing
    }

    fn attempted(&self) -> (&[String], &[String]) {
        let typed = &self.typed_words[..self.cursor.min(self.typed_words.len())];
        let target = &self.target_words[..self.cursor.min(self.target_words.len())];
        (typed, target)
    }

    /// Snapshot for the periodic refresh. Has no side effects.
    pub fn current_stats(&self) -> LiveStats {
        let total_words = self.target_words.len();
        let Some(started_at) = self.started_at else {
            return LiveStats {
                wpm: 0.0,
                accuracy: 100.0,
                elapsed_secs: 0.0,
                total_words,
                characters_typed: 0,
            };
        };

        let elapsed_secs = secs_between(started_at, self.ended_at.unwrap_or_else(SystemTime::now));
        let (typed, target) = self.attempted();
        let characters_typed = typed.iter().map(|w| w.chars().count()).sum();

        let (wpm, accuracy) = if typed.is_empty() {
            (0.0, 100.0)
        } else {
            (
                compute_wpm(typed, target, elapsed_secs),
                compute_accuracy(typed, target, self.error_count),
            )
        };

        LiveStats {
            wpm,
            accuracy,
            elapsed_secs,
            total_words,
            characters_typed,
        }
    }

    /// Complete the session and score the attempted words.
    ///
    /// Repeated calls return the same result. A cancelled session has none.
    pub fn finish(&mut self) -> Option<GameResult> {
        match self.status {
            GameStatus::Cancelled => return None,
            GameStatus::Completed if self.result.is_some() => return self.result.clone(),
            GameStatus::NotStarted | GameStatus::Ready | GameStatus::Active | GameStatus::Completed => {}
        }

        self.status = GameStatus::Completed;
        let ended_at = SystemTime::now();
        self.ended_at = Some(ended_at);
        let duration = self
            .started_at
            .map(|s| secs_between(s, ended_at))
            .unwrap_or(0.0);

        let (typed, target) = self.attempted();
        let result = GameResult {
            wpm: compute_wpm(typed, target, duration),
            accuracy: compute_accuracy(typed, target, self.error_count),
            duration,
            game_type: self.kind().to_string(),
            timestamp: Utc::now().fixed_offset(),
            total_characters: target.iter().map(|w| w.chars().count()).sum(),
            correct_characters: typed
                .iter()
                .zip(target)
                .filter(|(typed, target)| typed == target)
                .map(|(typed, _)| typed.chars().count())
                .sum(),
            error_count: self.error_count,
        };

        log::info!(
            "{} finished: {:.2} wpm, {:.2}% accuracy",
            result.game_type,
            result.wpm,
            result.accuracy
        );
        self.result = Some(result.clone());
        Some(result)
    }

    /// Abandon the attempt. Returns false if it had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.status.is_finished() {
            return false;
        }
        self.status = GameStatus::Cancelled;
        self.result = None;
        true
    }

    pub fn display_data(&self) -> DisplayData<'_> {
        DisplayData {
            target_words: &self.target_words,
            typed_words: &self.typed_words,
            current_index: self.cursor,
            current_input: &self.current_input,
        }
    }
}
