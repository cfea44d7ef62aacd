//! Window management - stacked surfaces and their compositing.
//!
//! - **surface**: `Surface` (frame buffer + optional content region)
//! - **stack**: `StackCoordinator` (z-order, deferred repaint)
//! - **registry**: attribute codes, colour pairs, key symbols
//! - **window**: `Window`, the fluent handle callers paint through
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs       - Module exports
//! ├── stack.rs     - StackCoordinator (top-level compositor)
//! ├── surface.rs   - Surface (frame + content region)
//! ├── registry.rs  - Registry (lookup tables)
//! └── window.rs    - Window (paint/structure API)
//! ```

pub mod registry;
pub mod stack;
pub mod surface;
pub mod window;

pub use registry::Registry;
pub use stack::StackCoordinator;
pub use surface::{Surface, SurfaceId};
pub use window::Window;
