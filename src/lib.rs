//! tpanel - stacked, overlapping windows on a character-cell terminal
//!
//! Windows (surfaces) are painted in memory, kept in a z-ordered stack and
//! composited onto the terminal in one diff-based write per refresh.
//!
//! # Quick Start
//!
//! ```no_run
//! use tpanel::{Colour, Config, Point, Session, Size};
//!
//! fn main() -> tpanel::Result<()> {
//!     let mut session = Session::with_terminal(Config::load())?;
//!     let root = session.open()?;
//!     let dialog = session
//!         .window(root)?
//!         .create_bordered_child(Point::new(2, 4), Size::new(8, 40))?;
//!     session
//!         .window(dialog)?
//!         .colour(Colour::White, Colour::Blue)?
//!         .bgclear()?
//!         .addstr("Press any key")?;
//!     session.refresh()?;
//!     session.readch()?;
//!     session.close()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod session;
pub mod ui;
pub mod wm;

pub use crate::config::Config;
pub use crate::core::backend::{Backend, HeadlessBackend, RawInput};
pub use crate::core::term::{AttrFlags, Colour, ColourPair, Point, Size};
pub use crate::error::{Error, Result};
pub use crate::session::{Session, SessionState};
pub use crate::ui::glyphs::BorderStyle;
pub use crate::ui::keymapper::{Input, Key};
pub use crate::ui::renderer::CrosstermBackend;
pub use crate::wm::{SurfaceId, Window};
