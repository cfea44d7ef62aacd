//! Terminal backend using crossterm
//!
//! Writes patches produced by the compositor to the real console and reads
//! keys from it.

use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::{debug, warn};

use super::keymapper::{KeyMapper, SUPPORTED_CODES};
use crate::core::backend::{Backend, Patch, RawInput, StyledCell};
use crate::core::term::{AttrFlags, Point, Size};

/// Style fields that go through SGR sequences
#[derive(Clone, Copy, PartialEq)]
struct Style {
    flags: AttrFlags,
    fg: Option<u8>,
    bg: Option<u8>,
}

impl From<&StyledCell> for Style {
    fn from(cell: &StyledCell) -> Self {
        Self {
            flags: cell.flags,
            fg: cell.fg,
            bg: cell.bg,
        }
    }
}

/// Backend bound to the process's stdout and stdin
pub struct CrosstermBackend {
    initialized: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { initialized: false }
    }

    /// Apply cell attributes
    fn apply_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
        // Reset first
        queue!(out, SetAttribute(Attribute::Reset))?;

        let flags = style.flags;
        if flags.contains(AttrFlags::BOLD) {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if flags.contains(AttrFlags::DIM) {
            queue!(out, SetAttribute(Attribute::Dim))?;
        }
        if flags.contains(AttrFlags::ITALIC) {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if flags.contains(AttrFlags::UNDERLINE) {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        if flags.contains(AttrFlags::BLINK) {
            queue!(out, SetAttribute(Attribute::SlowBlink))?;
        }
        // Standout renders as reverse video
        if flags.intersects(AttrFlags::REVERSE | AttrFlags::STANDOUT) {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        if flags.contains(AttrFlags::INVISIBLE) {
            queue!(out, SetAttribute(Attribute::Hidden))?;
        }

        if let Some(fg) = style.fg {
            queue!(out, SetForegroundColor(Color::AnsiValue(fg)))?;
        }
        if let Some(bg) = style.bg {
            queue!(out, SetBackgroundColor(Color::AnsiValue(bg)))?;
        }
        Ok(())
    }
}

impl Backend for CrosstermBackend {
    fn enter(&mut self) -> io::Result<()> {
        if self.initialized {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.initialized = true;
        debug!("terminal entered raw mode");
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, DisableMouseCapture, DisableFocusChange);
        let _ = execute!(stdout, Show, EnableLineWrap, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Raw mode must go even if the escapes above failed
        terminal::disable_raw_mode()?;
        debug!("terminal restored");
        Ok(())
    }

    fn size(&self) -> io::Result<Size> {
        let (cols, rows) = terminal::size()?;
        Ok(Size::new(rows, cols))
    }

    fn draw(&mut self, patches: &[Patch], cursor: Option<Point>) -> io::Result<()> {
        let mut out = BufWriter::with_capacity(64 * 1024, io::stdout().lock());

        // Synchronized update: the terminal shows the frame all at once
        write!(out, "\x1b[?2026h")?;
        queue!(out, Hide)?;

        let mut last_style: Option<Style> = None;
        let mut last_pos: Option<Point> = None;

        for patch in patches {
            // The left half of a wide glyph paints its continuation
            if patch.cell.is_continuation() {
                continue;
            }
            if last_pos != Some(patch.at) {
                queue!(out, MoveTo(patch.at.col, patch.at.row))?;
            }
            let style = Style::from(&patch.cell);
            if last_style != Some(style) {
                Self::apply_style(&mut out, style)?;
                last_style = Some(style);
            }
            write!(out, "{}", patch.cell.ch)?;
            last_pos = Some(Point::new(
                patch.at.row,
                patch.at.col + patch.cell.width.max(1) as u16,
            ));
        }

        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        if let Some(at) = cursor {
            queue!(out, MoveTo(at.col, at.row), Show)?;
        }
        write!(out, "\x1b[?2026l")?;
        out.flush()
    }

    fn poll_key(&mut self) -> io::Result<Option<RawInput>> {
        while event::poll(Duration::ZERO)? {
            let ev = event::read()?;
            if let Some(input) = KeyMapper::map_event(&ev) {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }

    fn has_key(&self, code: u16) -> bool {
        SUPPORTED_CODES.contains(&code)
    }

    fn has_colours(&self) -> bool {
        match crossterm::style::available_color_count() {
            0..=7 => {
                warn!("terminal reports fewer than 8 colours");
                false
            }
            _ => true,
        }
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}
