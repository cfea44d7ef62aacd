//! Cell buffers and screen composition

pub mod buffer;
pub mod screen;

pub use buffer::{
    AttrFlags, Cell, CellAttrs, CellBuffer, CellWriter, Colour, ColourPair, CursorState, Point,
    Row, Size, PAIR_COUNT,
};
pub use screen::Screen;
