use crate::core::{Session, plural};
use crate::ingest::Ingestor;
use crate::model::{FilterColumn, Settings, Theme};
use crate::query::QueryState;
use crate::sources;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const HELP_TEXT: &str = "Commands: load <path...> | search <text> | clear | column <name|album|artist> | years [yyyy...] | year <yyyy> | page <n>";

#[derive(Debug, Clone)]
pub struct AppStartupOptions {
    pub settings: Settings,
    pub page_size: usize,
    pub initial_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderSection {
    #[default]
    Songs,
    Episodes,
}

impl HeaderSection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Songs => "Songs",
            Self::Episodes => "Episodes",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Songs => Self::Episodes,
            Self::Episodes => Self::Songs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Years,
    Command,
}

#[derive(Debug)]
pub struct Viewer {
    pub session: Session,
    pub section: HeaderSection,
    pub input_mode: InputMode,
    pub input: String,
    pub theme: Theme,
}

impl Viewer {
    pub fn new(session: Session, theme: Theme) -> Self {
        Self {
            session,
            section: HeaderSection::default(),
            input_mode: InputMode::Normal,
            input: String::new(),
            theme,
        }
    }

    pub fn from_options(options: &AppStartupOptions) -> Self {
        let query = QueryState::new(options.page_size).with_column(options.settings.default_column);
        let session = Session::new(Ingestor::new(crate::ingest::observer_offset()), query);
        Self::new(session, options.settings.theme)
    }

    pub fn load_paths(&mut self, paths: &[PathBuf]) {
        match sources::read_sources(paths) {
            Ok(files) => {
                if let Err(err) = self.session.load_batch(&files) {
                    debug!(error = %err, "viewer.load.rejected");
                }
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "viewer.load.read_failed");
                self.session.set_status(&format!("load error: {err:#}"));
            }
        }
    }
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let mut viewer = Viewer::from_options(&options);
    if !options.initial_paths.is_empty() {
        viewer.load_paths(&options.initial_paths);
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut last_tick = Instant::now();
    let result: Result<()> = loop {
        if viewer.session.dirty || last_tick.elapsed() > Duration::from_millis(500) {
            let view = viewer.session.view();
            terminal.draw(|frame| crate::ui::draw(frame, &viewer, &view))?;
            viewer.session.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            viewer.session.dirty = true;
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if handle_key(&mut viewer, key) {
            break Ok(());
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Loads `options.initial_paths` and writes the first page as tab-separated
/// rows.
pub fn run_print(options: AppStartupOptions, out: &mut impl Write) -> Result<()> {
    let mut viewer = Viewer::from_options(&options);
    let files = sources::read_sources(&options.initial_paths)?;
    viewer.session.load_batch(&files)?;
    print_page(&viewer.session, out)
}

pub fn print_page(session: &Session, out: &mut impl Write) -> Result<()> {
    let view = session.view();
    writeln!(
        out,
        "# {} file{}, {} stream{}, {} song{}, {} episode{}, years {}",
        view.file_count,
        plural(view.file_count),
        view.song_streams,
        plural(view.song_streams),
        view.track_count,
        plural(view.track_count),
        view.episode_count,
        plural(view.episode_count),
        format_years(&view.years)
    )?;
    writeln!(out, "name\talbum\tartist\thours\tcount")?;
    for row in &view.page.rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{:.2}\t{}",
            row.name, row.album, row.artist, row.hours, row.count
        )?;
    }
    Ok(())
}

pub fn format_years(years: &[i32]) -> String {
    if years.is_empty() {
        return String::from("-");
    }
    years
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns true when the viewer should exit.
pub fn handle_key(viewer: &mut Viewer, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match viewer.input_mode {
        InputMode::Normal => return handle_normal_key(viewer, key),
        InputMode::Search => handle_search_key(viewer, key),
        InputMode::Years | InputMode::Command => handle_line_key(viewer, key),
    }
    false
}

fn handle_normal_key(viewer: &mut Viewer, key: KeyEvent) -> bool {
    let session = &mut viewer.session;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Left | KeyCode::PageUp => session.prev_page(),
        KeyCode::Right | KeyCode::PageDown => session.next_page(),
        KeyCode::Home => session.first_page(),
        KeyCode::End => session.last_page(),
        KeyCode::Char('c') => session.cycle_column(),
        KeyCode::Tab => {
            viewer.section = viewer.section.next();
            session.dirty = true;
        }
        KeyCode::Char('/') => {
            viewer.input = session.query().search().to_string();
            enter_mode(viewer, InputMode::Search);
        }
        KeyCode::Char('y') => {
            viewer.input = session
                .query()
                .years()
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            enter_mode(viewer, InputMode::Years);
        }
        KeyCode::Char(':') => {
            viewer.input.clear();
            enter_mode(viewer, InputMode::Command);
        }
        _ => {}
    }
    false
}

/// Search text applies as it is typed; Esc clears it.
fn handle_search_key(viewer: &mut Viewer, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            viewer.input.clear();
            viewer.session.clear_search();
            enter_mode(viewer, InputMode::Normal);
        }
        KeyCode::Enter => enter_mode(viewer, InputMode::Normal),
        KeyCode::Backspace => {
            viewer.input.pop();
            viewer.session.set_search(&viewer.input);
        }
        KeyCode::Char(ch) => {
            viewer.input.push(ch);
            viewer.session.set_search(&viewer.input);
        }
        _ => {}
    }
}

fn handle_line_key(viewer: &mut Viewer, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            viewer.input.clear();
            enter_mode(viewer, InputMode::Normal);
        }
        KeyCode::Enter => {
            let line = std::mem::take(&mut viewer.input);
            let mode = viewer.input_mode;
            enter_mode(viewer, InputMode::Normal);
            match mode {
                InputMode::Years => apply_years(viewer, &line),
                _ => run_command(viewer, &line),
            }
        }
        KeyCode::Backspace => {
            viewer.input.pop();
            viewer.session.dirty = true;
        }
        KeyCode::Char(ch) => {
            viewer.input.push(ch);
            viewer.session.dirty = true;
        }
        _ => {}
    }
}

fn enter_mode(viewer: &mut Viewer, mode: InputMode) {
    viewer.input_mode = mode;
    viewer.session.dirty = true;
}

pub fn run_command(viewer: &mut Viewer, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        viewer.session.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => viewer.session.set_status(HELP_TEXT),
        "load" => {
            if rest.is_empty() {
                viewer.session.set_status("Usage: load <path> [path...]");
                return;
            }
            let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            viewer.load_paths(&paths);
        }
        "search" => {
            viewer.session.set_search(rest);
            viewer.session.set_status(&format!("Search: {rest}"));
        }
        "clear" => {
            viewer.session.clear_search();
            viewer.session.clear_years();
            viewer.session.set_status("Filters cleared");
        }
        "column" => match FilterColumn::from_key(rest) {
            Some(column) => {
                viewer.session.set_column(column);
                viewer
                    .session
                    .set_status(&format!("Filter column: {}", column.label()));
            }
            None => viewer
                .session
                .set_status("Usage: column <name|album|artist>"),
        },
        "years" => apply_years(viewer, rest),
        "year" => match rest.parse::<i32>() {
            Ok(year) => {
                viewer.session.toggle_year(year);
                let selected = viewer.session.query().years().contains(&year);
                viewer.session.set_status(&format!(
                    "Year {year} {}",
                    if selected { "selected" } else { "removed" }
                ));
            }
            Err(_) => viewer.session.set_status("Usage: year <yyyy>"),
        },
        "page" => match rest.parse::<usize>() {
            Ok(page) => viewer.session.set_page(page),
            Err(_) => viewer.session.set_status("Usage: page <n>"),
        },
        _ => viewer.session.set_status("Unknown command. Use :help"),
    }
}

fn apply_years(viewer: &mut Viewer, raw: &str) {
    let parsed: Result<Vec<i32>, _> = raw
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse::<i32>)
        .collect();

    match parsed {
        Ok(years) if years.is_empty() => {
            viewer.session.clear_years();
            viewer.session.set_status("Year filter cleared");
        }
        Ok(years) => {
            viewer.session.set_years(years);
            let selected: Vec<i32> = viewer.session.query().years().iter().copied().collect();
            viewer
                .session
                .set_status(&format!("Years: {}", format_years(&selected)));
        }
        Err(_) => viewer
            .session
            .set_status("Years must be numbers, e.g. 2021 2022"),
    }
}
