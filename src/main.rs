//! Terminal front end: reads editor commands line by line and prints the grid.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use web_time::Instant;

use pathgrid::config::{AppConfig, LogLevel};
use pathgrid::editor::EditMode;
use pathgrid::library::{DirectorySource, HttpSource, Library, PresetSource};
use pathgrid::model::{Grid, Node, Path, PuzzleSnapshot};
use pathgrid::session::{EditorInput, EditorSession, SessionSettings};
use pathgrid::sync::{HttpJudge, MemoryJudge, SyncClient};
use pathgrid::text_view;

/// How long to wait for the judge before giving up on a reply.
const JUDGE_WAIT: Duration = Duration::from_secs(15);

const HELP: &str = "\
commands:
  click R C            click a lattice node (begin at start, finish at finish)
  hover R C [R C ...]  move the pointer over nodes
  cell R C             apply the current edit mode to a cell
  key LETTERS          press keys (default: c s n modes, k clear, z undo)
  mode color|star|not  switch edit mode
  new W H              replace the freeform grid
  preset N             open preset N
  menu                 back to the preset menu
  export FILE          write the current puzzle as JSON
  import FILE          open a puzzle JSON file in the freeform editor
  save-config [FILE]   write the current settings to FILE or the config file
  show                 redraw
  help                 this text
  quit                 exit";

#[derive(Parser)]
#[command(name = "pathgrid", version, about = "Grid path-puzzle editor")]
struct Cli {
    /// Judge base URL (overrides the config file)
    #[arg(long, env = "PATHGRID_SERVER")]
    server: Option<String>,
    /// Use an in-process judge instead of the server
    #[arg(long)]
    offline: bool,
    /// Freeform grid width
    #[arg(long)]
    width: Option<u32>,
    /// Freeform grid height
    #[arg(long)]
    height: Option<u32>,
    /// Open this preset on start
    #[arg(long)]
    preset: Option<u32>,
    /// Directory with puzzle{N}.json presets
    #[arg(long)]
    preset_dir: Option<PathBuf>,
    /// Base URL serving tutorial/puzzle{N}.json presets
    #[arg(long)]
    preset_url: Option<String>,
    /// Config file (defaults to the per-user config)
    #[arg(long)]
    config: Option<PathBuf>,
    /// error, warn, info, debug or trace
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    LogLevel::from_name(raw).ok_or_else(|| format!("unknown log level: {raw}"))
}

/// What the terminal is showing.
enum Screen {
    Freeform(EditorSession),
    Library(Library),
}

impl Screen {
    fn session_mut(&mut self) -> Option<&mut EditorSession> {
        match self {
            Screen::Freeform(session) => Some(session),
            Screen::Library(library) => library.session_mut(),
        }
    }

    fn render(&self) -> String {
        match self {
            Screen::Freeform(session) => text_view::render_session(session),
            Screen::Library(library) => text_view::render_library(library),
        }
    }
}

struct App {
    screen: Option<Screen>,
    config: AppConfig,
    config_path: Option<PathBuf>,
    settings: SessionSettings,
    preset_source: Option<Box<dyn PresetSource>>,
    default_size: (u32, u32),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };
    let level = cli.log_level.unwrap_or(config.preferences.log_level);
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();

    let prefs = &config.preferences;
    let sync = if cli.offline {
        log::info!("Using the offline judge");
        SyncClient::spawn(MemoryJudge::new(|s: &PuzzleSnapshot| {
            s.nodes.last().is_some() && s.nodes.last() == s.finish_node.as_ref()
        }))?
    } else {
        let server = cli.server.clone().unwrap_or_else(|| prefs.server_url.clone());
        log::info!("Using judge at {}", server);
        SyncClient::spawn(HttpJudge::new(server)?)?
    };

    let preset_source: Box<dyn PresetSource> =
        match cli.preset_url.clone().or_else(|| prefs.preset_url.clone()) {
            Some(url) => Box::new(HttpSource::new(url)?),
            None => Box::new(DirectorySource::new(
                cli.preset_dir.clone().unwrap_or_else(|| prefs.preset_dir.clone()),
            )),
        };

    let default_size = (
        cli.width.unwrap_or(prefs.width),
        cli.height.unwrap_or(prefs.height),
    );
    let settings = config.session_settings();

    let mut app = App {
        screen: None,
        config_path: cli.config.clone(),
        settings,
        preset_source: Some(preset_source),
        default_size,
        config,
    };

    match cli.preset {
        Some(index) => app.open_preset(sync, index),
        None => {
            let grid = Grid::new(default_size.0, default_size.1)?;
            app.screen = Some(Screen::Freeform(EditorSession::new(
                grid,
                Path::new(),
                sync,
                app.settings.clone(),
            )));
        }
    }

    println!("{}", HELP);
    app.show();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match app.run_line(line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => println!("{}", message),
        }
    }
    Ok(())
}

fn parse_numbers(args: &[&str]) -> Result<Vec<u32>, String> {
    args.iter()
        .map(|a| a.parse::<u32>().map_err(|_| format!("not a number: {a}")))
        .collect()
}

fn parse_pair(args: &[&str]) -> Result<(u32, u32), String> {
    match parse_numbers(args)?.as_slice() {
        [a, b] => Ok((*a, *b)),
        _ => Err("expected two numbers".to_string()),
    }
}

impl App {
    fn show(&self) {
        if let Some(screen) = &self.screen {
            println!("{}", screen.render());
        }
    }

    /// Take the judge connection out of whatever is on screen.
    fn take_sync(&mut self) -> Option<SyncClient> {
        match self.screen.take()? {
            Screen::Freeform(session) => Some(session.into_sync()),
            Screen::Library(library) => {
                let (source, sync) = library.into_parts();
                self.preset_source = Some(source);
                sync
            }
        }
    }

    fn open_preset(&mut self, sync: SyncClient, index: u32) {
        let Some(source) = self.preset_source.take() else {
            log::error!("Preset source already in use");
            return;
        };
        let mut library = Library::new(source, sync, self.settings.clone());
        if let Err(e) = library.open(index) {
            log::debug!("Preset {} unavailable: {}", index, e);
        }
        self.screen = Some(Screen::Library(library));
    }

    fn start_freeform(&mut self, grid: Grid, path: Path) -> Result<(), String> {
        let sync = self
            .take_sync()
            .ok_or_else(|| "judge connection lost".to_string())?;
        self.screen = Some(Screen::Freeform(EditorSession::new(
            grid,
            path,
            sync,
            self.settings.clone(),
        )));
        Ok(())
    }

    fn session(&mut self) -> Result<&mut EditorSession, String> {
        self.screen
            .as_mut()
            .and_then(Screen::session_mut)
            .ok_or_else(|| "no puzzle open (use `preset N` or `new W H`)".to_string())
    }

    /// Run one command line. Returns `Ok(false)` on quit.
    fn run_line(&mut self, line: &str) -> Result<bool, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            return Ok(true);
        };

        match *command {
            "quit" | "exit" => return Ok(false),
            "help" => {
                println!("{}", HELP);
                return Ok(true);
            }
            "show" => {}
            "click" => {
                let (r, c) = parse_pair(args)?;
                self.session()?.handle(EditorInput::ClickNode(Node::new(r, c)));
            }
            "hover" => {
                let numbers = parse_numbers(args)?;
                if numbers.is_empty() || numbers.len() % 2 == 1 {
                    return Err("expected pairs of numbers".to_string());
                }
                let session = self.session()?;
                for pair in numbers.chunks(2) {
                    session.handle(EditorInput::HoverNode(Node::new(pair[0], pair[1])));
                }
            }
            "cell" => {
                let (row, col) = parse_pair(args)?;
                self.session()?.handle(EditorInput::ClickCell { row, col });
            }
            "key" => {
                let session = self.session()?;
                for key in args.concat().chars() {
                    session.handle(EditorInput::Key(key));
                }
            }
            "mode" => {
                let mode = match args.first().copied() {
                    Some("color") | Some("colour") => EditMode::Color,
                    Some("star") => EditMode::Star,
                    Some("not") => EditMode::Not,
                    _ => return Err("expected color, star or not".to_string()),
                };
                self.session()?.set_mode(mode);
            }
            "new" => {
                let (w, h) = match args {
                    [] => self.default_size,
                    _ => parse_pair(args)?,
                };
                let grid = Grid::new(w, h).map_err(|e| e.to_string())?;
                self.start_freeform(grid, Path::new())?;
            }
            "preset" => {
                let index = parse_numbers(args)?
                    .first()
                    .copied()
                    .ok_or_else(|| "expected a preset number".to_string())?;
                if let Some(Screen::Library(library)) = &mut self.screen {
                    if let Err(e) = library.open(index) {
                        log::debug!("Preset {} unavailable: {}", index, e);
                    }
                } else {
                    let sync = self
                        .take_sync()
                        .ok_or_else(|| "judge connection lost".to_string())?;
                    self.open_preset(sync, index);
                }
            }
            "menu" => match &mut self.screen {
                Some(Screen::Library(library)) => library.back_to_menu(),
                _ => return Err("not in the preset library".to_string()),
            },
            "export" => {
                let file = args.first().copied().ok_or_else(|| "expected a file".to_string())?;
                let json = self
                    .session()?
                    .snapshot()
                    .to_json()
                    .map_err(|e| e.to_string())?;
                std::fs::write(file, json).map_err(|e| e.to_string())?;
                println!("wrote {}", file);
            }
            "import" => {
                let file = args.first().copied().ok_or_else(|| "expected a file".to_string())?;
                let json = std::fs::read_to_string(file).map_err(|e| e.to_string())?;
                let (grid, path) = PuzzleSnapshot::from_json(&json)
                    .and_then(PuzzleSnapshot::into_parts)
                    .map_err(|e| e.to_string())?;
                self.start_freeform(grid, path)?;
            }
            "save-config" => {
                let target = args
                    .first()
                    .map(|file| PathBuf::from(*file))
                    .or_else(|| self.config_path.clone());
                match target {
                    Some(path) => self.config.save_to_path(&path),
                    None => self.config.save_to_default_path(),
                }
                .map_err(|e| e.to_string())?;
                println!("configuration saved");
                return Ok(true);
            }
            other => return Err(format!("unknown command: {other} (try `help`)")),
        }

        self.play_out();
        self.show();
        Ok(true)
    }

    /// Wait for the judge and play any feedback sequence to the end.
    fn play_out(&mut self) {
        let Some(session) = self.screen.as_mut().and_then(Screen::session_mut) else {
            return;
        };
        session.pump(Instant::now());
        if !session.is_verdict_pending() && !session.feedback_active() {
            return;
        }

        session.settle(JUDGE_WAIT);
        while let Some(due) = session.next_feedback_due() {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            session.pump(Instant::now());
            println!("{}", text_view::render_status(session));
        }
    }
}
