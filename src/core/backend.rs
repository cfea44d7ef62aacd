//! Terminal driver interface
//!
//! The compositor talks to the physical device only through [`Backend`]:
//! entering/leaving raw mode, drawing a list of changed cells, polling for
//! a key and answering capability questions. [`HeadlessBackend`] keeps the
//! "physical" screen in memory and takes scripted input; it backs the tests
//! and the `--headless` demo.

use std::collections::{HashSet, VecDeque};
use std::io;

use super::term::{AttrFlags, Point, Size};
use crate::ui::keymapper::SUPPORTED_CODES;

/// A key as reported by the device, before symbol translation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawInput {
    /// An ordinary character (control characters included)
    Char(char),
    /// A special-key device code (curses numbering)
    Code(u16),
}

/// A cell with its colours resolved, as the terminal will show it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyledCell {
    pub ch: char,
    pub width: u8,
    pub flags: AttrFlags,
    /// ANSI foreground, `None` for the terminal default
    pub fg: Option<u8>,
    /// ANSI background, `None` for the terminal default
    pub bg: Option<u8>,
}

impl Default for StyledCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            width: 1,
            flags: AttrFlags::empty(),
            fg: None,
            bg: None,
        }
    }
}

impl StyledCell {
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }
}

/// One changed cell to be written at an absolute screen position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Patch {
    pub at: Point,
    pub cell: StyledCell,
}

/// Raw primitives of a physical terminal
pub trait Backend {
    /// Switch the terminal into raw display mode
    fn enter(&mut self) -> io::Result<()>;

    /// Restore cooked mode
    fn leave(&mut self) -> io::Result<()>;

    /// Screen size in cells
    fn size(&self) -> io::Result<Size>;

    /// Write changed cells, then place the cursor (`None` hides it)
    fn draw(&mut self, patches: &[Patch], cursor: Option<Point>) -> io::Result<()>;

    /// Non-blocking key poll
    fn poll_key(&mut self) -> io::Result<Option<RawInput>>;

    /// Whether the terminal's capability table defines a special-key code
    fn has_key(&self, code: u16) -> bool;

    fn has_colours(&self) -> bool {
        true
    }
}

/// In-memory terminal
pub struct HeadlessBackend {
    size: Size,
    cells: Vec<StyledCell>,
    cursor: Option<Point>,
    raw: bool,
    input: VecDeque<RawInput>,
    /// Polls that report no key even when input is queued
    idle_polls: usize,
    polls: usize,
    supported: HashSet<u16>,
    colours: bool,
    draws: usize,
    last_patch_count: usize,
    patched_total: usize,
}

impl HeadlessBackend {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            size: Size::new(rows, cols),
            cells: vec![StyledCell::default(); rows as usize * cols as usize],
            cursor: None,
            raw: false,
            input: VecDeque::new(),
            idle_polls: 0,
            polls: 0,
            supported: SUPPORTED_CODES.iter().copied().collect(),
            colours: true,
            draws: 0,
            last_patch_count: 0,
            patched_total: 0,
        }
    }

    /// Pretend the terminal has no colour support
    pub fn without_colours(mut self) -> Self {
        self.colours = false;
        self
    }

    /// Replace the set of special-key codes the terminal claims to know
    pub fn with_supported_codes(mut self, codes: &[u16]) -> Self {
        self.supported = codes.iter().copied().collect();
        self
    }

    /// Make the next `polls` key polls come back empty, as if the user
    /// had not typed yet
    pub fn delay_input(&mut self, polls: usize) {
        self.idle_polls = polls;
    }

    /// Number of `poll_key` calls so far
    pub fn poll_count(&self) -> usize {
        self.polls
    }

    pub fn push_input(&mut self, input: RawInput) {
        self.input.push_back(input);
    }

    pub fn push_str(&mut self, s: &str) {
        self.input.extend(s.chars().map(RawInput::Char));
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Number of `draw` calls so far
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Cells written by the most recent `draw`
    pub fn last_patch_count(&self) -> usize {
        self.last_patch_count
    }

    /// Cells written since creation
    pub fn patched_total(&self) -> usize {
        self.patched_total
    }

    pub fn cell(&self, at: Point) -> Option<&StyledCell> {
        if at.row >= self.size.rows || at.col >= self.size.cols {
            return None;
        }
        self.cells.get(at.row as usize * self.size.cols as usize + at.col as usize)
    }

    /// Text of one screen row
    pub fn row_text(&self, row: u16) -> String {
        (0..self.size.cols)
            .filter_map(|col| self.cell(Point::new(row, col)))
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect()
    }

    /// Render the screen to a string (for debugging)
    pub fn dump(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "=== Screen {}x{} ===\n",
            self.size.cols, self.size.rows
        ));
        match self.cursor {
            Some(p) => output.push_str(&format!("Cursor: ({}, {})\n", p.row, p.col)),
            None => output.push_str("Cursor: hidden\n"),
        }
        output.push_str("─".repeat(self.size.cols as usize).as_str());
        output.push('\n');
        for row in 0..self.size.rows {
            let indicator = if self.cursor.map(|p| p.row) == Some(row) {
                '>'
            } else {
                ' '
            };
            output.push(indicator);
            output.push_str(&self.row_text(row));
            output.push('\n');
        }
        output.push_str("─".repeat(self.size.cols as usize).as_str());
        output.push('\n');
        output
    }
}

impl Backend for HeadlessBackend {
    fn enter(&mut self) -> io::Result<()> {
        self.raw = true;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        self.raw = false;
        self.cursor = None;
        Ok(())
    }

    fn size(&self) -> io::Result<Size> {
        Ok(self.size)
    }

    fn draw(&mut self, patches: &[Patch], cursor: Option<Point>) -> io::Result<()> {
        let cols = self.size.cols as usize;
        for patch in patches {
            let index = patch.at.row as usize * cols + patch.at.col as usize;
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = patch.cell;
            }
        }
        self.cursor = cursor;
        self.draws += 1;
        self.last_patch_count = patches.len();
        self.patched_total += patches.len();
        Ok(())
    }

    fn poll_key(&mut self) -> io::Result<Option<RawInput>> {
        self.polls += 1;
        if self.idle_polls > 0 {
            self.idle_polls -= 1;
            return Ok(None);
        }
        Ok(self.input.pop_front())
    }

    fn has_key(&self, code: u16) -> bool {
        self.supported.contains(&code)
    }

    fn has_colours(&self) -> bool {
        self.colours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_applies_patches() {
        let mut backend = HeadlessBackend::new(2, 3);
        let cell = StyledCell {
            ch: 'x',
            ..StyledCell::default()
        };
        backend
            .draw(&[Patch { at: Point::new(1, 2), cell }], Some(Point::new(1, 2)))
            .unwrap();
        assert_eq!(backend.row_text(1), "  x");
        assert_eq!(backend.cursor(), Some(Point::new(1, 2)));
        assert_eq!(backend.draw_count(), 1);
        assert_eq!(backend.last_patch_count(), 1);
    }

    #[test]
    fn test_scripted_input_is_fifo() {
        let mut backend = HeadlessBackend::new(1, 1);
        backend.push_str("ab");
        backend.push_input(RawInput::Code(0o402));
        assert_eq!(backend.poll_key().unwrap(), Some(RawInput::Char('a')));
        assert_eq!(backend.poll_key().unwrap(), Some(RawInput::Char('b')));
        assert_eq!(backend.poll_key().unwrap(), Some(RawInput::Code(0o402)));
        assert_eq!(backend.poll_key().unwrap(), None);
    }

    #[test]
    fn test_delayed_input() {
        let mut backend = HeadlessBackend::new(1, 1);
        backend.push_str("a");
        backend.delay_input(2);
        assert_eq!(backend.poll_key().unwrap(), None);
        assert_eq!(backend.poll_key().unwrap(), None);
        assert_eq!(backend.poll_key().unwrap(), Some(RawInput::Char('a')));
        assert_eq!(backend.poll_count(), 3);
    }

    #[test]
    fn test_capabilities() {
        let backend = HeadlessBackend::new(1, 1)
            .without_colours()
            .with_supported_codes(&[0o403]);
        assert!(!backend.has_colours());
        assert!(backend.has_key(0o403));
        assert!(!backend.has_key(0o402));
    }
}
