mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::Path,
};
use termtypr::{
    app_dirs::AppDirs,
    corpus::{self, Library, WordList},
    history::{HistoryStore, HistorySummary, JsonHistoryStore, SortOrder},
    preferences::{FilePreferencesStore, PreferencesStore, MAX_WORD_COUNT, MIN_WORD_COUNT},
    result::GameResult,
    router::{FinishedGame, Router},
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner, TICK_INTERVAL},
    session::{GameStatus, LiveStats},
};

/// fast typing trainer for the terminal
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer with random-word and phrase games, live WPM and accuracy, and a personal history of every finished test."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// start the typing trainer with the main menu (default)
    Start,
    /// show typing test statistics
    Stats,
    /// list every word the random-words game can pick
    ListWords,
    /// add words to your personal word list
    AddWords {
        /// words to add
        words: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Typing,
    Results,
    Stats,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub router: Router<JsonHistoryStore>,
    prefs_store: FilePreferencesStore,
    pub state: AppState,
    /// The word being typed, as the user sees it.
    pub input: String,
    pub live: Option<LiveStats>,
    pub best_wpm: Option<f64>,
    pub outcome: Option<FinishedGame>,
    /// Oldest first, for the stats screen.
    pub records: Vec<GameResult>,
    pub word_count_draft: usize,
    /// One-line status shown under the current screen.
    pub message: Option<String>,
}

impl App {
    pub fn new(router: Router<JsonHistoryStore>, prefs_store: FilePreferencesStore) -> Self {
        let word_count_draft = router.preferences().word_count;
        Self {
            router,
            prefs_store,
            state: AppState::Menu,
            input: String::new(),
            live: None,
            best_wpm: None,
            outcome: None,
            records: Vec::new(),
            word_count_draft,
            message: None,
        }
    }

    /// Wire everything to the files in the data directory.
    pub fn load() -> Self {
        let prefs_store = FilePreferencesStore::new();
        let router = Router::with_library(
            JsonHistoryStore::new(),
            prefs_store.load(),
            Library::load(AppDirs::user_words_path()),
        );
        Self::new(router, prefs_store)
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            return Flow::Quit;
        }

        self.message = None;
        match self.state {
            AppState::Menu => return self.on_menu_key(key),
            AppState::Typing => self.on_typing_key(key),
            AppState::Results => match key.code {
                KeyCode::Enter | KeyCode::Char('n') => self.restart(false),
                KeyCode::Char('r') => self.restart(true),
                KeyCode::Char('s') => self.show_stats(),
                KeyCode::Esc | KeyCode::Char('m') => self.to_menu(),
                _ => {}
            },
            AppState::Stats => match key.code {
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => self.to_menu(),
                _ => {}
            },
            AppState::Settings => self.on_settings_key(key),
        }
        Flow::Continue
    }

    /// Periodic refresh. Only reads the session.
    pub fn on_tick(&mut self) {
        if self.state == AppState::Typing && self.router.is_game_active() {
            self.live = self.router.current_stats();
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.router.navigate(-1),
            KeyCode::Down | KeyCode::Char('j') => self.router.navigate(1),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Err(e) = self.router.select(index) {
                    self.message = Some(e.to_string());
                }
            }
            KeyCode::Enter => self.start(),
            KeyCode::Char('s') => self.show_stats(),
            KeyCode::Char('w') => {
                self.word_count_draft = self.router.preferences().word_count;
                self.state = AppState::Settings;
            }
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_typing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => self.submit_word(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.push_partial();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.push_partial();
            }
            KeyCode::Left => self.restart(true),
            KeyCode::Right => self.restart(false),
            KeyCode::Esc => {
                let started = self
                    .router
                    .session()
                    .is_some_and(|s| s.status() == GameStatus::Active);
                if started {
                    self.restart(true);
                } else {
                    self.to_menu();
                }
            }
            _ => {}
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let step = |draft: usize, delta: isize| {
            draft
                .saturating_add_signed(delta)
                .clamp(MIN_WORD_COUNT, MAX_WORD_COUNT)
        };

        match key.code {
            KeyCode::Up | KeyCode::Char('+') => self.word_count_draft = step(self.word_count_draft, 1),
            KeyCode::Down | KeyCode::Char('-') => {
                self.word_count_draft = step(self.word_count_draft, -1)
            }
            KeyCode::PageUp => self.word_count_draft = step(self.word_count_draft, 10),
            KeyCode::PageDown => self.word_count_draft = step(self.word_count_draft, -10),
            KeyCode::Enter => {
                self.save_word_count();
                self.state = AppState::Menu;
            }
            KeyCode::Esc => self.state = AppState::Menu,
            _ => {}
        }
    }

    fn save_word_count(&mut self) {
        let count = self.word_count_draft;
        let saved = self
            .router
            .set_word_count(count)
            .and_then(|_| self.prefs_store.save(&self.router.preferences()));
        self.message = Some(match saved {
            Ok(()) => format!("Word count set to {count}"),
            Err(e) => {
                log::error!("could not save preferences: {e}");
                format!("Word count set to {count} for this run only: {e}")
            }
        });
    }

    fn start(&mut self) {
        match self.router.start(None) {
            Ok(()) => self.begin_session(),
            Err(e) => {
                self.message = Some(format!("Could not start {}: {e}", self.router.selected_kind()))
            }
        }
    }

    fn restart(&mut self, keep_same_text: bool) {
        match self.router.restart(keep_same_text) {
            Ok(()) => self.begin_session(),
            Err(e) => {
                self.state = AppState::Menu;
                self.message = Some(format!("Could not restart: {e}"));
            }
        }
    }

    fn begin_session(&mut self) {
        self.input.clear();
        self.outcome = None;
        self.best_wpm = self.router.best_result().map(|r| r.wpm);
        self.live = self.router.current_stats();
        self.state = AppState::Typing;
    }

    fn push_partial(&mut self) {
        if self.router.process_input(&self.input, false).is_ok() {
            self.live = self.router.current_stats();
        }
    }

    fn submit_word(&mut self) {
        let word = self.input.trim().to_string();
        self.input.clear();
        if word.is_empty() {
            return;
        }

        if self.router.process_input(&word, true).is_err() {
            return;
        }
        self.live = self.router.current_stats();
        if self.router.is_game_finished() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        let Some(outcome) = self.router.finish() else {
            return;
        };
        if !outcome.persisted {
            self.message = Some("This result could not be saved, see termtypr.log".to_string());
        }
        self.outcome = Some(outcome);
        self.state = AppState::Results;
    }

    fn show_stats(&mut self) {
        self.records = self.router.all_results(SortOrder::Asc);
        self.state = AppState::Stats;
    }

    fn to_menu(&mut self) {
        self.router.return_to_menu();
        self.input.clear();
        self.live = None;
        self.state = AppState::Menu;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&AppDirs::log_path());

    let mut stdout = io::stdout();
    match cli.command.unwrap_or(Command::Start) {
        Command::Start => start_tui(),
        Command::Stats => print_stats(&mut stdout, &mut JsonHistoryStore::new()),
        Command::ListWords => print_words(
            &mut stdout,
            &WordList::with_user_words(AppDirs::user_words_path()),
        ),
        Command::AddWords { words } => add_words(&mut stdout, &AppDirs::user_words_path(), &words),
    }
}

/// Route log records to a file so they never land on the alternate screen.
fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn start_tui() -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), TICK_INTERVAL);
    let res = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    return Ok(());
                }
            }
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
        }
    }
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn print_stats<W: Write, H: HistoryStore>(out: &mut W, history: &mut H) -> Result<(), Box<dyn Error>> {
    let results = history.get_all(SortOrder::Desc);
    if results.is_empty() {
        writeln!(out, "No typing test records found.")?;
        return Ok(());
    }

    let summary = HistorySummary::from_results(&results);
    writeln!(out, "Total tests: {}", summary.total)?;
    if let Some(best) = &summary.best {
        writeln!(
            out,
            "Best performance: {:.1} WPM with {:.1}% accuracy on {}",
            best.wpm,
            best.accuracy,
            best.timestamp.format("%Y-%m-%d")
        )?;
        writeln!(
            out,
            "Average performance: {:.1} WPM with {:.1}% accuracy",
            summary.average_wpm, summary.average_accuracy
        )?;
    }
    Ok(())
}

fn print_words<W: Write>(out: &mut W, list: &WordList) -> Result<(), Box<dyn Error>> {
    if list.is_empty() {
        writeln!(out, "No words found in storage.")?;
        return Ok(());
    }

    writeln!(out, "Total words in storage: {}", list.len())?;
    let mut words = list.words().to_vec();
    words.sort_unstable();
    for (i, word) in words.iter().enumerate() {
        writeln!(out, "  {}. {word}", i + 1)?;
    }
    Ok(())
}

fn add_words<W: Write>(out: &mut W, path: &Path, words: &[String]) -> Result<(), Box<dyn Error>> {
    if words.is_empty() {
        writeln!(out, "No words provided. Use: add-words word1 word2 word3 ...")?;
        return Ok(());
    }

    let added = corpus::add_words(path, words)?;
    log::info!("added {added} words to {}", path.display());
    writeln!(out, "Added {added} new words to {}.", path.display())?;
    Ok(())
}
