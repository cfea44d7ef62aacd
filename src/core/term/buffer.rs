//! Cell buffers
//!
//! A `CellBuffer` is one rectangular grid of character cells with its own
//! cursor and current attributes. Every surface frame and every nested
//! content region owns one. Writes only mutate cells and mark lines dirty;
//! nothing here talks to the terminal.

use bitflags::bitflags;
use std::collections::HashSet;
use std::fmt;
use unicode_width::UnicodeWidthChar;

/// A cell position (row, column)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: u16,
    pub col: u16,
}

impl Point {
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Translate by another point
    pub fn offset(self, by: Point) -> Point {
        Point::new(self.row.saturating_add(by.row), self.col.saturating_add(by.col))
    }
}

/// A rectangle size (rows, columns)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

bitflags! {
    /// Display attributes of a cell
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u32 {
        const STANDOUT   = 0b0000_0000_0001;
        const UNDERLINE  = 0b0000_0000_0010;
        const REVERSE    = 0b0000_0000_0100;
        const BLINK      = 0b0000_0000_1000;
        const DIM        = 0b0000_0001_0000;
        const BOLD       = 0b0000_0010_0000;
        const ITALIC     = 0b0000_0100_0000;
        const INVISIBLE  = 0b0000_1000_0000;
        const PROTECT    = 0b0001_0000_0000;
        const ALTCHARSET = 0b0010_0000_0000;
    }
}

impl AttrFlags {
    /// BOLD and DIM select the same intensity channel on a terminal (both are
    /// reset by SGR 22), so turning one on drops the other.
    fn normalized(mut self, requested: AttrFlags) -> AttrFlags {
        if requested.contains(AttrFlags::BOLD) {
            self.remove(AttrFlags::DIM);
        } else if requested.contains(AttrFlags::DIM) {
            self.remove(AttrFlags::BOLD);
        }
        self
    }
}

/// The eight palette colours, in palette order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colour {
    Black = 0,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl Colour {
    pub const ALL: [Colour; 8] = [
        Colour::Black,
        Colour::Blue,
        Colour::Green,
        Colour::Cyan,
        Colour::Red,
        Colour::Magenta,
        Colour::Yellow,
        Colour::White,
    ];

    /// Position in the palette (0..8)
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Colour> {
        Self::ALL.get(index as usize).copied()
    }

    /// ANSI colour number used by the terminal for this palette entry
    pub fn ansi(self) -> u8 {
        match self {
            Colour::Black => 0,
            Colour::Red => 1,
            Colour::Green => 2,
            Colour::Yellow => 3,
            Colour::Blue => 4,
            Colour::Magenta => 5,
            Colour::Cyan => 6,
            Colour::White => 7,
        }
    }
}

/// Number of addressable colour pairs (8 foregrounds x 8 backgrounds)
pub const PAIR_COUNT: usize = 64;

/// A registered colour pair index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColourPair(u8);

impl ColourPair {
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < PAIR_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ColourPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair {}", self.0)
    }
}

/// Cell attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellAttrs {
    pub flags: AttrFlags,
    pub pair: Option<ColourPair>,
}

/// A single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// Display width; 0 marks the right half of a wide character
    pub width: u8,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(CellAttrs::default())
    }
}

impl Cell {
    pub fn blank(attrs: CellAttrs) -> Self {
        Self { ch: ' ', width: 1, attrs }
    }

    pub fn continuation(attrs: CellAttrs) -> Self {
        Self { ch: ' ', width: 0, attrs }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }
}

/// A single row
#[derive(Clone, Debug)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cols: u16, attrs: CellAttrs) -> Self {
        Self {
            cells: vec![Cell::blank(attrs); cols as usize],
        }
    }

    pub fn clear(&mut self, attrs: CellAttrs) {
        for cell in &mut self.cells {
            *cell = Cell::blank(attrs);
        }
    }
}

/// Cursor state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorState {
    pub row: u16,
    pub col: u16,
    pub visible: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            visible: true,
        }
    }
}

impl CursorState {
    pub fn position(&self) -> Point {
        Point::new(self.row, self.col)
    }
}

/// A rectangular grid of cells placed at an absolute screen origin
#[derive(Clone, Debug)]
pub struct CellBuffer {
    origin: Point,
    rows: u16,
    cols: u16,
    lines: Vec<Row>,
    cursor: CursorState,
    attrs: CellAttrs,
    background: CellAttrs,
    dirty_lines: HashSet<usize>,
    full_redraw: bool,
    clear_requested: bool,
    /// Set once the bottom-right cell has been written
    stuck: bool,
}

impl CellBuffer {
    pub fn new(origin: Point, size: Size) -> Self {
        Self::with_attrs(origin, size, CellAttrs::default())
    }

    /// Create a buffer whose current and background attributes start as `attrs`
    pub fn with_attrs(origin: Point, size: Size, attrs: CellAttrs) -> Self {
        Self {
            origin,
            rows: size.rows,
            cols: size.cols,
            lines: (0..size.rows).map(|_| Row::new(size.cols, attrs)).collect(),
            cursor: CursorState::default(),
            attrs,
            background: attrs,
            dirty_lines: HashSet::new(),
            full_redraw: true,
            clear_requested: false,
            stuck: false,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
        self.full_redraw = true;
    }

    pub fn size(&self) -> Size {
        Size::new(self.rows, self.cols)
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor.visible = visible;
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.lines.get(row as usize)?.cells.get(col as usize)
    }

    /// Text of one row (continuation cells skipped)
    pub fn line_text(&self, row: u16) -> String {
        self.lines
            .get(row as usize)
            .map(|r| {
                r.cells
                    .iter()
                    .filter(|c| !c.is_continuation())
                    .map(|c| c.ch)
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- attribute state ----

    /// Effective attribute bits and colour pair
    pub fn attr_get(&self) -> (AttrFlags, Option<ColourPair>) {
        (self.attrs.flags, self.attrs.pair)
    }

    pub fn attrs(&self) -> CellAttrs {
        self.attrs
    }

    pub fn attr_on(&mut self, flags: AttrFlags) {
        self.attrs.flags = (self.attrs.flags | flags).normalized(flags);
    }

    pub fn attr_off(&mut self, flags: AttrFlags) {
        self.attrs.flags.remove(flags);
    }

    /// Replace the attribute bits; `None` leaves the colour pair as it is
    pub fn attr_set(&mut self, flags: AttrFlags, pair: Option<ColourPair>) {
        self.attrs.flags = flags.normalized(flags);
        if pair.is_some() {
            self.attrs.pair = pair;
        }
    }

    pub fn set_pair(&mut self, pair: ColourPair) {
        self.attrs.pair = Some(pair);
    }

    // ---- cursor movement ----

    /// Move the cursor; positions outside the buffer are rejected
    pub fn move_cursor(&mut self, row: u16, col: u16) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.cursor.row = row;
        self.cursor.col = col;
        self.stuck = false;
        true
    }

    fn newline(&mut self) -> bool {
        if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
            self.cursor.col = 0;
            true
        } else {
            false
        }
    }

    // ---- writing ----

    /// Put a character at the cursor and advance it.
    ///
    /// Returns false when nothing could be written (bottom-right overflow,
    /// zero-width characters, a wide character in a one-column buffer).
    pub fn put_char(&mut self, ch: char) -> bool {
        if self.rows == 0 || self.cols == 0 {
            return false;
        }
        match ch {
            '\n' if self.stuck => return false,
            '\n' => {
                self.clear_to_eol();
                return self.newline();
            }
            '\r' => {
                self.cursor.col = 0;
                self.stuck = false;
                return true;
            }
            '\t' => {
                let stop = ((self.cursor.col / 8) + 1) * 8;
                let spaces = stop.min(self.cols) - self.cursor.col;
                for _ in 0..spaces.max(1) {
                    if !self.put_char(' ') {
                        return false;
                    }
                }
                return true;
            }
            '\x08' => {
                self.cursor.col = self.cursor.col.saturating_sub(1);
                self.stuck = false;
                return true;
            }
            c if c.is_ascii_control() => {
                // Shown in caret notation, like ^C
                let shown = ((c as u8) ^ 0x40) as char;
                return self.put_char('^') && self.put_char(shown);
            }
            _ => {}
        }

        let width = ch.width().unwrap_or(0) as u16;
        if self.stuck || width == 0 || width > self.cols {
            return false;
        }

        if self.cursor.col + width > self.cols && !self.newline() {
            return false;
        }

        let (row, col) = (self.cursor.row as usize, self.cursor.col as usize);
        self.handle_wide_char_overwrite(row, col, width as usize);

        let attrs = self.attrs;
        let line = &mut self.lines[row];
        line.cells[col] = Cell {
            ch,
            width: width as u8,
            attrs,
        };
        if width == 2 {
            line.cells[col + 1] = Cell::continuation(attrs);
        }
        self.dirty_lines.insert(row);

        let next = self.cursor.col + width;
        if next < self.cols {
            self.cursor.col = next;
        } else if !self.newline() {
            // Bottom-right cell: the cursor stays on it
            self.cursor.col = self.cols - 1;
            self.stuck = true;
        }
        true
    }

    /// Put a string, returning the number of characters written
    pub fn put_str(&mut self, s: &str) -> usize {
        let mut written = 0;
        for ch in s.chars() {
            if !self.put_char(ch) {
                break;
            }
            written += 1;
        }
        written
    }

    /// Overwrite one cell without moving the cursor
    pub fn set_cell(&mut self, row: u16, col: u16, ch: char) {
        let attrs = self.attrs;
        if let Some(cell) = self
            .lines
            .get_mut(row as usize)
            .and_then(|r| r.cells.get_mut(col as usize))
        {
            *cell = Cell { ch, width: 1, attrs };
            self.dirty_lines.insert(row as usize);
        }
    }

    fn handle_wide_char_overwrite(&mut self, row: usize, col: usize, width: usize) {
        let attrs = self.attrs;
        let cols = self.cols as usize;
        let cells = &mut self.lines[row].cells;

        // Overwriting the right half of a wide char
        if col > 0 && cells[col].is_continuation() {
            cells[col - 1] = Cell::blank(attrs);
        }

        // Overwriting the left half of a wide char
        if cells[col].width == 2 && col + 1 < cols {
            cells[col + 1] = Cell::blank(attrs);
        }

        // A wide char whose right half lands on the left half of another
        if width == 2 && col + 2 < cols && cells[col + 1].width == 2 {
            cells[col + 2] = Cell::blank(attrs);
        }
    }

    // ---- erasing ----

    pub fn clear_to_eol(&mut self) {
        let row = self.cursor.row as usize;
        let background = self.background;
        if let Some(line) = self.lines.get_mut(row) {
            for cell in line.cells.iter_mut().skip(self.cursor.col as usize) {
                *cell = Cell::blank(background);
            }
            self.dirty_lines.insert(row);
        }
    }

    /// Blank every cell with the background attributes and home the cursor
    pub fn erase(&mut self) {
        let background = self.background;
        for line in &mut self.lines {
            line.clear(background);
        }
        self.cursor.row = 0;
        self.cursor.col = 0;
        self.stuck = false;
        self.full_redraw = true;
    }

    /// Erase and ask for the whole physical screen to be repainted
    pub fn clear(&mut self) {
        self.erase();
        self.clear_requested = true;
    }

    /// Make the current attributes the background and apply them to every cell
    pub fn fill_background(&mut self) {
        self.background = self.attrs;
        let attrs = self.attrs;
        for line in &mut self.lines {
            for cell in &mut line.cells {
                cell.attrs = attrs;
            }
        }
        self.full_redraw = true;
    }

    // ---- composition support ----

    /// Copy every cell of `other` into this buffer at `at` (buffer-local)
    pub fn blit(&mut self, other: &CellBuffer, at: Point) {
        for (r, line) in other.lines.iter().enumerate() {
            let row = at.row as usize + r;
            let Some(target) = self.lines.get_mut(row) else {
                break;
            };
            for (c, cell) in line.cells.iter().enumerate() {
                if let Some(slot) = target.cells.get_mut(at.col as usize + c) {
                    *slot = *cell;
                }
            }
        }
    }

    /// Fill this buffer from the cells of `other` starting at `at`
    /// (`other`-local); the inverse of [`CellBuffer::blit`]
    pub fn copy_from(&mut self, other: &CellBuffer, at: Point) {
        for (r, target) in self.lines.iter_mut().enumerate() {
            let Some(source) = other.lines.get(at.row as usize + r) else {
                break;
            };
            for (c, slot) in target.cells.iter_mut().enumerate() {
                if let Some(cell) = source.cells.get(at.col as usize + c) {
                    *slot = *cell;
                }
            }
            // A wide char cut by the left edge leaves only its right half
            if let Some(first) = target.cells.first_mut() {
                if first.is_continuation() {
                    *first = Cell::blank(first.attrs);
                }
            }
        }
        self.full_redraw = true;
    }

    /// Mark the whole buffer as needing a redraw
    pub fn touch(&mut self) {
        self.full_redraw = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.full_redraw || !self.dirty_lines.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_lines.clear();
        self.full_redraw = false;
    }

    /// Take (and reset) a pending full-screen clear request
    pub fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }

    /// Place the cursor without bounds side effects (used for reconciling
    /// the frame cursor with a nested region)
    pub(crate) fn place_cursor(&mut self, at: Point, visible: bool) {
        self.cursor.row = at.row.min(self.rows.saturating_sub(1));
        self.cursor.col = at.col.min(self.cols.saturating_sub(1));
        self.cursor.visible = visible;
    }

    pub(crate) fn rows_iter(&self) -> impl Iterator<Item = &Row> {
        self.lines.iter()
    }
}

/// `fmt::Write` adapter counting the characters that landed in a buffer
pub struct CellWriter<'a> {
    buffer: &'a mut CellBuffer,
    written: usize,
}

impl<'a> CellWriter<'a> {
    pub fn new(buffer: &'a mut CellBuffer) -> Self {
        Self { buffer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl fmt::Write for CellWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.written += self.buffer.put_str(s);
        Ok(())
    }
}
