//! Terminal-facing pieces: output, input and glyph tables.
//!
//! - **renderer**: `CrosstermBackend`, the real-terminal backend
//! - **keymapper**: crossterm events to device key codes, and the key table
//! - **glyphs**: border character sets and alternate-charset glyphs

pub mod glyphs;
pub mod keymapper;
pub mod renderer;

pub use glyphs::{BorderChars, BorderStyle};
pub use keymapper::{Input, Key, KeyMapper};
pub use renderer::CrosstermBackend;
