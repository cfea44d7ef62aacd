//! Physical screen compositor
//!
//! `Screen` keeps two full-screen grids: the *virtual* screen, rebuilt from
//! the stacked frame buffers by [`Screen::recompute`], and the *physical*
//! screen, which mirrors what the terminal currently shows. [`Screen::flush`]
//! sends only the cells where the two differ.
//!
//! ```text
//! frames (bottom → top) ──recompute──▶ virtual ──flush(diff)──▶ backend
//!                                                   │
//!                                                   └─▶ physical := virtual
//! ```

use std::io;
use tracing::debug;

use super::buffer::{AttrFlags, CellBuffer, Colour, ColourPair, Point, Size, PAIR_COUNT};
use crate::core::backend::{Backend, Patch, StyledCell};
use crate::ui::glyphs::acs_glyph;

pub struct Screen<B: Backend> {
    backend: B,
    size: Size,
    virtual_cells: Vec<StyledCell>,
    physical: Vec<StyledCell>,
    /// Colour pairs registered with the terminal
    pairs: [Option<(Colour, Colour)>; PAIR_COUNT],
    cursor: Option<Point>,
    physical_cursor: Option<Point>,
    /// Next flush repaints every cell
    force_full: bool,
    active: bool,
    flushes: u64,
}

impl<B: Backend> Screen<B> {
    pub fn new(backend: B) -> io::Result<Self> {
        let size = backend.size()?;
        let cells = size.rows as usize * size.cols as usize;
        Ok(Self {
            backend,
            size,
            virtual_cells: vec![StyledCell::default(); cells],
            physical: vec![StyledCell::default(); cells],
            pairs: [None; PAIR_COUNT],
            cursor: None,
            physical_cursor: None,
            force_full: true,
            active: false,
            flushes: 0,
        })
    }

    /// Enter raw display mode
    pub fn enter(&mut self) -> io::Result<()> {
        self.backend.enter()?;
        self.active = true;
        self.force_full = true;
        Ok(())
    }

    /// Leave raw display mode
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.backend.leave()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn has_colours(&self) -> bool {
        self.backend.has_colours()
    }

    pub fn has_key(&self, code: u16) -> bool {
        self.backend.has_key(code)
    }

    /// Register one colour pair with the terminal
    pub fn init_pair(&mut self, pair: ColourPair, fg: Colour, bg: Colour) {
        self.pairs[pair.index() as usize] = Some((fg, bg));
    }

    /// Forget every registered pair (terminal teardown)
    pub fn reset_pairs(&mut self) {
        self.pairs = [None; PAIR_COUNT];
    }

    /// Force the next flush to repaint every cell
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// Where the cursor goes on the next flush (`None` hides it)
    pub fn set_cursor(&mut self, cursor: Option<Point>) {
        self.cursor = cursor.filter(|p| p.row < self.size.rows && p.col < self.size.cols);
    }

    /// Rebuild the virtual screen from frames listed bottom to top
    pub fn recompute<'a>(&mut self, frames: impl IntoIterator<Item = &'a CellBuffer>) {
        self.virtual_cells.fill(StyledCell::default());
        for frame in frames {
            self.paint(frame);
        }
    }

    fn paint(&mut self, frame: &CellBuffer) {
        let origin = frame.origin();
        let (rows, cols) = (self.size.rows as usize, self.size.cols as usize);

        for (r, line) in frame.rows_iter().enumerate() {
            let row = origin.row as usize + r;
            if row >= rows {
                break;
            }
            for (c, cell) in line.cells.iter().enumerate() {
                let col = origin.col as usize + c;
                if col >= cols {
                    break;
                }
                let mut styled = self.resolve(cell.ch, cell.width, cell.attrs.flags, cell.attrs.pair);
                // A wide glyph cut by the screen edge becomes a blank
                if styled.width == 2 && col + 1 >= cols {
                    styled.ch = ' ';
                    styled.width = 1;
                }
                self.virtual_cells[row * cols + col] = styled;
            }
            // A frame edge that splits a wide glyph underneath leaves an orphan
            let edge = origin.col as usize + line.cells.len();
            if edge < cols && self.virtual_cells[row * cols + edge].is_continuation() {
                self.virtual_cells[row * cols + edge].width = 1;
            }
            if origin.col > 0 && (origin.col as usize) <= cols {
                let left = row * cols + origin.col as usize - 1;
                if self.virtual_cells[left].width == 2 {
                    self.virtual_cells[left].ch = ' ';
                    self.virtual_cells[left].width = 1;
                }
            }
        }
    }

    fn resolve(&self, ch: char, width: u8, flags: AttrFlags, pair: Option<ColourPair>) -> StyledCell {
        let colours = pair.and_then(|p| self.pairs[p.index() as usize]);
        let ch = if flags.contains(AttrFlags::INVISIBLE) {
            ' '
        } else if flags.contains(AttrFlags::ALTCHARSET) {
            acs_glyph(ch)
        } else {
            ch
        };
        StyledCell {
            ch,
            width,
            flags,
            fg: colours.map(|(fg, _)| fg.ansi()),
            bg: colours.map(|(_, bg)| bg.ansi()),
        }
    }

    /// Send every difference between the virtual and physical screens to the
    /// terminal. Returns the number of cells written.
    pub fn flush(&mut self) -> io::Result<usize> {
        let cols = self.size.cols as usize;
        let full = std::mem::take(&mut self.force_full);

        let patches: Vec<Patch> = self
            .virtual_cells
            .iter()
            .zip(self.physical.iter())
            .enumerate()
            .filter(|(_, (new, old))| full || new != old)
            .map(|(i, (new, _))| Patch {
                at: Point::new((i / cols) as u16, (i % cols) as u16),
                cell: *new,
            })
            .collect();

        if patches.is_empty() && self.cursor == self.physical_cursor {
            return Ok(0);
        }

        self.backend.draw(&patches, self.cursor)?;
        self.physical.copy_from_slice(&self.virtual_cells);
        self.physical_cursor = self.cursor;
        self.flushes += 1;
        debug!("flush #{}: {} cells", self.flushes, patches.len());
        Ok(patches.len())
    }

    /// Number of flushes that reached the terminal
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// What the terminal shows at a cell
    pub fn physical_cell(&self, at: Point) -> Option<&StyledCell> {
        if at.row >= self.size.rows || at.col >= self.size.cols {
            return None;
        }
        self.physical
            .get(at.row as usize * self.size.cols as usize + at.col as usize)
    }

    /// Text the terminal shows on one row
    pub fn physical_row_text(&self, row: u16) -> String {
        (0..self.size.cols)
            .filter_map(|col| self.physical_cell(Point::new(row, col)))
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect()
    }
}
