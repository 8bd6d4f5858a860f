mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use quizzer::{
    app_dirs::AppDirs,
    catalog::{save_quiz, Catalog, SavedQuiz},
    config::{Config, ConfigStore, FileConfigStore},
    history::{export_csv, quiz_history},
    missed::{clear_missed_questions, TimeWindow},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    QuestionCount, QuizEngine, QuizMode, Screen, Store,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    collections::BTreeSet,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// Per-question timer presets cycled on the chapter selection screen
const TIMER_PRESETS: [u64; 5] = [0, 10, 20, 30, 60];

/// terminal quiz trainer with adaptive weakness practice
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal quiz trainer: pick chapters, answer multiple-choice questions against an optional clock, and let adaptive mode steer you toward the chapters and questions you keep missing."
)]
pub struct Cli {
    /// number of questions per quiz, or "all"
    #[clap(short = 'n', long)]
    number_of_questions: Option<QuestionCount>,

    /// seconds allowed per question (0 disables the timer)
    #[clap(short = 't', long)]
    timer_secs: Option<u64>,

    /// how questions are chosen
    #[clap(short = 'm', long, value_enum)]
    mode: Option<QuizMode>,

    /// chapter ids to pre-select, comma separated
    #[clap(short = 'c', long, value_delimiter = ',')]
    chapters: Option<Vec<String>>,

    /// JSON catalog ({"chapters": [...]}) to use instead of the built-in chapters
    #[clap(long)]
    catalog: Option<PathBuf>,

    /// add a quiz from a JSON file to your saved quizzes, then exit
    #[clap(long)]
    import: Option<PathBuf>,

    /// write quiz history as CSV to this file, then exit
    #[clap(long)]
    export_history: Option<PathBuf>,

    /// forget every missed question, then exit
    #[clap(long)]
    clear_missed: bool,

    /// forget all history, statistics, missed questions and saved quizzes, then exit
    #[clap(long)]
    reset: bool,

    /// print the available chapters, then exit
    #[clap(long)]
    list_chapters: bool,

    /// database file (defaults to ~/.local/state/quizzer/quizzer.db)
    #[clap(long)]
    db: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line flags onto the stored configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(count) = self.number_of_questions {
            config.question_count = count;
        }
        if let Some(secs) = self.timer_secs {
            config.timer_secs = secs;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(chapters) = &self.chapters {
            config.last_chapters = chapters.clone();
        }
    }

    fn open_store(&self) -> Result<Store, Box<dyn Error>> {
        Ok(match &self.db {
            Some(path) => Store::open(path)?,
            None => Store::new()?,
        })
    }

    fn load_catalog(&self, store: &Store) -> Result<Catalog, Box<dyn Error>> {
        let mut catalog = match &self.catalog {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin(),
        };
        catalog.merge_user_quizzes(store);
        Ok(catalog)
    }
}

/// Chapter selection screen state
#[derive(Debug, Default)]
pub struct SelectionState {
    pub cursor: usize,
    pub checked: BTreeSet<String>,
    pub error: Option<String>,
}

/// Statistics screen state
#[derive(Debug, Default)]
pub struct StatsViewState {
    pub scroll_offset: usize,
    pub window: Option<TimeWindow>,
}

pub struct App {
    pub engine: QuizEngine,
    pub selection: SelectionState,
    pub stats_view: StatsViewState,
    pub review_offset: usize,
}

impl App {
    pub fn new(engine: QuizEngine) -> Self {
        let checked = engine
            .config()
            .last_chapters
            .iter()
            .filter(|id| engine.catalog().chapter(id).is_some())
            .cloned()
            .collect();
        Self {
            engine,
            selection: SelectionState {
                checked,
                ..Default::default()
            },
            stats_view: StatsViewState::default(),
            review_offset: 0,
        }
    }

    /// Chapter IDs in display order
    pub fn chapter_ids(&self) -> Vec<String> {
        self.engine
            .catalog()
            .enabled_chapters()
            .map(|c| c.id.clone())
            .collect()
    }

    fn selected_ids(&self) -> Vec<String> {
        self.chapter_ids()
            .into_iter()
            .filter(|id| self.selection.checked.contains(id))
            .collect()
    }

    fn toggle_current(&mut self) {
        if let Some(id) = self.chapter_ids().get(self.selection.cursor) {
            if !self.selection.checked.remove(id) {
                self.selection.checked.insert(id.clone());
            }
        }
    }

    fn toggle_all(&mut self) {
        let ids = self.chapter_ids();
        if ids.iter().all(|id| self.selection.checked.contains(id)) {
            self.selection.checked.clear();
        } else {
            self.selection.checked.extend(ids);
        }
    }

    fn cycle_count(&mut self, up: bool) {
        let cfg = self.engine.config_mut();
        cfg.question_count = match (cfg.question_count, up) {
            (QuestionCount::All, true) => QuestionCount::Limit(5),
            (QuestionCount::All, false) => QuestionCount::All,
            (QuestionCount::Limit(n), true) => QuestionCount::Limit(n + 5),
            (QuestionCount::Limit(n), false) if n <= 5 => QuestionCount::All,
            (QuestionCount::Limit(n), false) => QuestionCount::Limit(n - 5),
        };
    }

    fn cycle_timer(&mut self) {
        let cfg = self.engine.config_mut();
        let next = TIMER_PRESETS
            .iter()
            .position(|&p| p == cfg.timer_secs)
            .map(|i| TIMER_PRESETS[(i + 1) % TIMER_PRESETS.len()])
            .unwrap_or(0);
        cfg.timer_secs = next;
    }

    fn start(&mut self) {
        let ids = self.selected_ids();
        let mode = self.engine.config().mode;
        let count = self.engine.config().question_count;
        match self.engine.start_quiz(&ids, mode, count) {
            Ok(_) => self.selection.error = None,
            Err(e) => self.selection.error = Some(e.to_string()),
        }
    }

    fn leave_statistics(&mut self) {
        if self.engine.last_result().is_some() {
            self.engine.back_to_results();
        } else {
            self.engine.go_home();
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match app.engine.screen() {
        Screen::Welcome => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Enter | KeyCode::Char(' ') => app.engine.open_chapter_selection(),
            KeyCode::Char('s') => app.engine.show_statistics(),
            _ => {}
        },
        Screen::ChapterSelection => {
            let len = app.chapter_ids().len();
            match key.code {
                KeyCode::Esc => app.engine.go_home(),
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Up | KeyCode::Char('k') => {
                    app.selection.cursor = app.selection.cursor.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if app.selection.cursor + 1 < len {
                        app.selection.cursor += 1;
                    }
                }
                KeyCode::Char(' ') => app.toggle_current(),
                KeyCode::Char('a') => app.toggle_all(),
                KeyCode::Char('m') => {
                    let cfg = app.engine.config_mut();
                    cfg.mode = cfg.mode.next();
                }
                KeyCode::Char('+') | KeyCode::Right => app.cycle_count(true),
                KeyCode::Char('-') | KeyCode::Left => app.cycle_count(false),
                KeyCode::Char('t') => app.cycle_timer(),
                KeyCode::Char('s') => app.engine.show_statistics(),
                KeyCode::Enter => app.start(),
                _ => {}
            }
        }
        Screen::Question(_) => match key.code {
            KeyCode::Esc => app.engine.abandon(),
            KeyCode::Char(c @ 'a'..='h') => {
                app.engine.select_answer(c as usize - 'a' as usize);
            }
            KeyCode::Char(c @ '1'..='3') => {
                app.engine.rate_confidence(c as u8 - b'0');
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('n') => {
                let answered = app
                    .engine
                    .session()
                    .and_then(|s| s.current_answer())
                    .is_some();
                // the next affordance only appears once an option is chosen
                if answered {
                    let _ = app.engine.next_question();
                    app.review_offset = 0;
                }
            }
            _ => {}
        },
        Screen::Results => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('r') => {
                let _ = app.engine.restart();
            }
            KeyCode::Char('n') => app.engine.new_quiz(),
            KeyCode::Char('m') => {
                app.review_offset = 0;
                let _ = app.engine.review_mistakes();
            }
            KeyCode::Char('s') => app.engine.show_statistics(),
            KeyCode::Char('x') => app.engine.dismiss_notice(),
            _ => {}
        },
        Screen::ReviewMistakes => match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.engine.back_to_results(),
            KeyCode::Up | KeyCode::Char('k') => {
                app.review_offset = app.review_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.review_offset + 1 < app.engine.mistakes().len() {
                    app.review_offset += 1;
                }
            }
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        },
        Screen::Statistics => match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.leave_statistics(),
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                app.stats_view.scroll_offset = app.stats_view.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                // Will check max scroll in render function
                app.stats_view.scroll_offset += 1;
            }
            KeyCode::Char('w') => {
                app.stats_view.window = match app.stats_view.window {
                    None => Some(TimeWindow::Week),
                    Some(TimeWindow::Week) => Some(TimeWindow::Month),
                    Some(TimeWindow::Month) => Some(TimeWindow::ThreeMonths),
                    Some(TimeWindow::ThreeMonths) => None,
                };
            }
            KeyCode::Char('C') => {
                app.engine.clear_missed_questions();
            }
            _ => {}
        },
    }
    Flow::Continue
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    // Logs go to a file so they never land on the alternate screen
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let mut builder = pretty_env_logger::formatted_builder();
        builder
            .parse_env("RUST_LOG")
            .target(env_logger::Target::Pipe(Box::new(file)));
        let _ = builder.try_init();
    }
}

/// Commands that do their work and exit without starting the TUI.
/// Returns true when one of them ran.
fn run_batch_commands(cli: &Cli, store: &Store) -> Result<bool, Box<dyn Error>> {
    let mut ran = false;

    if let Some(path) = &cli.import {
        let quiz: SavedQuiz = serde_json::from_slice(&fs::read(path)?)?;
        let title = quiz.title.clone();
        if !save_quiz(store, quiz) {
            return Err(format!("could not save quiz {title:?}").into());
        }
        println!("imported {title:?}");
        ran = true;
    }

    if cli.reset {
        if !store.clear_all() {
            return Err("could not reset progress".into());
        }
        println!("all progress cleared");
        ran = true;
    }

    if cli.clear_missed {
        if !clear_missed_questions(store) {
            return Err("could not clear missed questions".into());
        }
        println!("missed questions cleared");
        ran = true;
    }

    if let Some(path) = &cli.export_history {
        let history = quiz_history(store);
        export_csv(&history, fs::File::create(path)?)?;
        println!("exported {} quizzes to {}", history.len(), path.display());
        ran = true;
    }

    if cli.list_chapters {
        let catalog = cli.load_catalog(store)?;
        for chapter in catalog.chapters() {
            println!(
                "{}\t{}\t{} questions{}",
                chapter.id,
                chapter.title,
                chapter.questions.len(),
                if chapter.enabled { "" } else { "\t(disabled)" }
            );
        }
        ran = true;
    }

    Ok(ran)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = cli.open_store()?;
    if run_batch_commands(&cli, &store)? {
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);

    let catalog = cli.load_catalog(&store)?;
    let mut app = App::new(QuizEngine::new(store, catalog, config));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = config_store.save(app.engine.config()) {
        log::warn!("could not save config: {e}");
    }

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let (event, elapsed) = runner.step_timed();
        app.engine.on_tick(elapsed);

        match event {
            QuizEvent::Tick | QuizEvent::Resize => {}
            QuizEvent::Key(key) => {
                if handle_key(app, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
