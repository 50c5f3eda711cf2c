use crate::corpus::Library;
use crate::history::{HistoryError, HistoryStore, SortOrder};
use crate::preferences::{Preferences, PreferencesError};
use crate::result::{GameResult, RecordAnnotation};
use crate::session::{DisplayData, GameError, InputStatus, LiveStats, Session};
use crate::variant::{GameConfig, GameKind};

/// One line of the game menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    pub index: usize,
    pub kind: GameKind,
    pub description: &'static str,
    pub is_selected: bool,
}

/// A finished game as committed to history.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedGame {
    pub result: GameResult,
    pub record: RecordAnnotation,
    /// False when the history write failed; the result is still valid.
    pub persisted: bool,
}

#[derive(Debug)]
struct ActiveGame {
    session: Session,
    outcome: Option<FinishedGame>,
}

/// Drives game selection and the lifecycle of the single active session.
#[derive(Debug)]
pub struct Router<H: HistoryStore> {
    history: H,
    library: Library,
    preferences: Preferences,
    catalog: Vec<GameKind>,
    selected: usize,
    active: Option<ActiveGame>,
}

impl<H: HistoryStore> Router<H> {
    pub fn new(history: H, preferences: Preferences) -> Self {
        Self::with_library(history, preferences, Library::default())
    }

    pub fn with_library(history: H, preferences: Preferences, library: Library) -> Self {
        Self {
            history,
            library,
            preferences,
            catalog: GameKind::ALL.to_vec(),
            selected: 0,
            active: None,
        }
    }

    pub fn available_games(&self) -> Vec<GameEntry> {
        self.catalog
            .iter()
            .enumerate()
            .map(|(index, kind)| GameEntry {
                index,
                kind: *kind,
                description: kind.description(),
                is_selected: index == self.selected,
            })
            .collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_kind(&self) -> GameKind {
        self.catalog[self.selected]
    }

    pub fn select(&mut self, index: usize) -> Result<(), GameError> {
        if index >= self.catalog.len() {
            return Err(GameError::InvalidSelection {
                index,
                len: self.catalog.len(),
            });
        }
        self.selected = index;
        Ok(())
    }

    /// Move the selection by `delta`, wrapping at both ends.
    pub fn navigate(&mut self, delta: isize) {
        let len = self.catalog.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    /// Start the selected game. A missing word count comes from preferences.
    ///
    /// On failure the previously installed game, if any, is left untouched.
    pub fn start(&mut self, config: Option<GameConfig>) -> Result<(), GameError> {
        let mut config = config.unwrap_or_default();
        config.word_count = config.word_count.or(Some(self.preferences.word_count));

        let kind = self.selected_kind();
        let mut session = Session::new(kind.variant(&self.library));
        if let Err(e) = session.initialize(&config).and_then(|_| session.start()) {
            log::warn!("could not start {kind}: {e}");
            return Err(e);
        }

        self.active = Some(ActiveGame {
            session,
            outcome: None,
        });
        Ok(())
    }

    /// Feed input to the active game. Input the session ignores is an error here.
    pub fn process_input(&mut self, text: &str, is_complete: bool) -> Result<InputStatus, GameError> {
        let active = self.active.as_mut().ok_or(GameError::NoActiveGame)?;
        match active.session.process_input(text, is_complete) {
            InputStatus::Inactive => Err(GameError::NotAcceptingInput),
            status => Ok(status),
        }
    }

    /// Finish the active game, compare it with the best stored result, and save it.
    ///
    /// The result is committed once; later calls return the same outcome.
    pub fn finish(&mut self) -> Option<FinishedGame> {
        let active = self.active.as_mut()?;
        if let Some(outcome) = &active.outcome {
            return Some(outcome.clone());
        }

        let result = active.session.finish()?;
        let best = self.history.get_best();
        let record = RecordAnnotation::against(result.wpm, best.as_ref());

        let persisted = match self.history.save(&result) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to save result: {e}");
                false
            }
        };

        let outcome = FinishedGame {
            result,
            record,
            persisted,
        };
        active.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Drop the active game without saving anything.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.session.cancel();
                true
            }
            None => false,
        }
    }

    /// Start the selected game again, optionally on the same words.
    pub fn restart(&mut self, keep_same_text: bool) -> Result<(), GameError> {
        let saved_words = self
            .active
            .as_ref()
            .filter(|_| keep_same_text)
            .map(|active| active.session.target_words().to_vec());

        self.cancel();
        self.start(None)?;

        if let (Some(words), Some(active)) = (saved_words, self.active.as_mut()) {
            active.session.replace_target(words)?;
        }
        Ok(())
    }

    pub fn return_to_menu(&mut self) {
        self.cancel();
        self.selected = 0;
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// A game is installed and still accepting input.
    pub fn is_game_active(&self) -> bool {
        self.session().is_some_and(|s| !s.is_finished())
    }

    pub fn is_game_finished(&self) -> bool {
        self.session().is_some_and(Session::is_finished)
    }

    pub fn display_data(&self) -> Option<DisplayData<'_>> {
        self.session().map(Session::display_data)
    }

    pub fn current_stats(&self) -> Option<LiveStats> {
        self.session().map(Session::current_stats)
    }

    pub fn all_results(&mut self, order: SortOrder) -> Vec<GameResult> {
        self.history.get_all(order)
    }

    pub fn best_result(&mut self) -> Option<GameResult> {
        self.history.get_best()
    }

    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.history.clear()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn set_word_count(&mut self, word_count: usize) -> Result<(), PreferencesError> {
        let prefs = Preferences { word_count };
        prefs.validate()?;
        self.preferences = prefs;
        Ok(())
    }
}
