//! Terminal driver layer.
//!
//! Everything below the window stack lives here:
//!
//! - **backend**: `Backend` trait for the physical device, plus the in-memory
//!   `HeadlessBackend`
//! - **term**: cell buffers and the physical screen compositor
//!
//! # Architecture
//!
//! ```text
//! Screen
//! ├── Backend (raw mode, cell writes, key polling)
//! ├── virtual grid  (rebuilt from stacked CellBuffers)
//! └── physical grid (what the terminal shows)
//! ```

pub mod backend;
pub mod term;

pub use backend::{Backend, HeadlessBackend, Patch, RawInput, StyledCell};
