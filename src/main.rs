//! tpanel demo - stacked, bordered windows on the terminal
//!
//! Opens a session, stacks a few bordered windows and lets you shuffle them
//! with the keyboard.
//!
//! | Key | Action |
//! |-----|--------|
//! | Tab | Bring the bottom window to the front |
//! | Arrow keys | Move the front window |
//! | h | Hide the front window (send to back) |
//! | d | Destroy the front window |
//! | q | Quit |

use std::env;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tpanel::{
    Backend, Colour, Config, HeadlessBackend, Input, Key, Point, RawInput, Session, Size,
    SurfaceId,
};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line options
#[derive(Default)]
struct Options {
    /// Run against an in-memory terminal with scripted keys
    headless: bool,
    /// Write the effective configuration to ~/.tpanel/config.toml and exit
    write_config: bool,
}

fn print_version() {
    eprintln!("tpanel {}", VERSION);
}

fn print_help() {
    eprintln!("tpanel {} - stacked terminal windows demo", VERSION);
    eprintln!();
    eprintln!("Usage: tpanel [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --headless            Run on an in-memory 24x80 screen and print it");
    eprintln!("  --write-config        Write the current configuration and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Tab                   Bring the bottom window to the front");
    eprintln!("  Arrow keys            Move the front window");
    eprintln!("  h                     Hide the front window");
    eprintln!("  d                     Destroy the front window");
    eprintln!("  q                     Quit");
    eprintln!();
    eprintln!("Configuration: ~/.tpanel/config.toml");
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--headless" => options.headless = true,
            "--write-config" => options.write_config = true,
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
    }
    Ok(options)
}

/// Log to a file; the terminal itself is busy showing windows
fn init_logging(config: &Config) {
    let Some(log_path) = config.log_path() else {
        return;
    };
    if let Some(dir) = log_path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

const PALETTE: [(Colour, Colour); 3] = [
    (Colour::White, Colour::Blue),
    (Colour::Black, Colour::Cyan),
    (Colour::Yellow, Colour::Red),
];

/// Stack the demo windows and paint them
fn build_windows<B: Backend>(session: &mut Session<B>) -> tpanel::Result<Vec<SurfaceId>> {
    let root = session.open()?;
    let screen = session.stack().screen().size();

    let mut win = session.window(root)?;
    win.attr_on("B")?
        .mvprint(0, 0, format_args!("tpanel {}  ", VERSION))?;
    win.attr_off("B")?
        .print(format_args!("Tab: cycle  arrows: move  h: hide  d: destroy  q: quit"))?;
    win.cursor(false)?;

    let rows = (screen.rows / 2).max(3);
    let cols = (screen.cols / 2).max(3);
    let mut ids = Vec::new();
    for (i, (fg, bg)) in PALETTE.iter().enumerate() {
        let step = i as u16 * 3;
        let origin = Point::new(2 + step, 4 + step * 2);
        let id = session
            .window(root)?
            .create_bordered_child(origin, Size::new(rows, cols))?;
        let mut win = session.window(id)?;
        win.colour(*fg, *bg)?.bgclear()?;
        win.attr_on("B")?
            .mvprint(0, 1, format_args!("Window {}", i + 1))?;
        win.attr_off("B")?.move_to_cell(2, 1)?;
        win.addgrstr("lqqqqk")?;
        win.move_to_cell(3, 1)?.addgrstr("mqqqqj")?;
        ids.push(id);
    }
    session.refresh()?;
    Ok(ids)
}

/// Key loop; returns when 'q' is pressed or no windows remain
fn run<B: Backend>(session: &mut Session<B>) -> tpanel::Result<()> {
    let ids = build_windows(session)?;
    info!("demo started with {} windows", ids.len());

    loop {
        let stack = session.stack();
        // Root sits at the bottom; everything above it is a demo window
        let order: Vec<SurfaceId> = stack.z_order().iter().skip(1).copied().collect();
        let Some(&front) = order.last() else {
            break;
        };
        let input = session.readch()?;
        match input {
            Input::Char('q') => break,
            Input::Char('\t') => {
                session.window(order[0])?.send_to_front()?;
            }
            Input::Char('h') => {
                session.window(front)?.hide()?;
            }
            Input::Char('d') => {
                session.destroy(front)?;
            }
            Input::Key(key) => {
                let mut win = session.window(front)?;
                let at = win.origin();
                let target = match key {
                    Key::Up => Point::new(at.row.saturating_sub(1), at.col),
                    Key::Down => Point::new(at.row + 1, at.col),
                    Key::Left => Point::new(at.row, at.col.saturating_sub(1)),
                    Key::Right => Point::new(at.row, at.col + 1),
                    _ => at,
                };
                // Moves that would leave the screen are ignored
                if win.move_window(target).is_err() {
                    info!("move to ({}, {}) rejected", target.row, target.col);
                }
            }
            other => info!("ignored {:?}", other),
        }
        session.refresh()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = Config::load();
    if options.write_config {
        let path = config.save().context("writing configuration")?;
        eprintln!("Configuration written to {}", path.display());
        return Ok(());
    }

    init_logging(&config);
    info!("tpanel starting...");

    if options.headless {
        let mut backend = HeadlessBackend::new(24, 80);
        for input in [
            RawInput::Char('\t'),
            RawInput::Code(tpanel::ui::keymapper::KEY_RIGHT),
            RawInput::Code(tpanel::ui::keymapper::KEY_DOWN),
            RawInput::Char('d'),
            RawInput::Char('q'),
        ] {
            backend.push_input(input);
        }
        let mut session = Session::new(backend, config)?;
        run(&mut session)?;
        print!("{}", session.backend().dump());
        session.close()?;
        return Ok(());
    }

    let mut session = Session::with_terminal(config).context("failed to set up the terminal")?;
    let result = run(&mut session);
    session.close()?;
    if let Err(e) = &result {
        error!("demo failed: {}", e);
    }
    result.context("demo failed")
}
