//! Window - fluent handle onto one surface
//!
//! A `Window` borrows the stack and the registry for as long as it lives, so
//! at most one window is being painted at a time. Paint operations only
//! touch cell buffers; nothing reaches the terminal until [`Window::refresh`]
//! (or [`crate::Session::refresh`]).
//!
//! ```ignore
//! let mut win = session.window(id)?;
//! win.attr_on("B")?.colour(Colour::Yellow, Colour::Blue)?;
//! win.mvprint(0, 0, format_args!("{} items", n))?;
//! win.refresh()?;
//! ```

use std::fmt::{self, Write as _};

use super::registry::Registry;
use super::stack::StackCoordinator;
use super::surface::{Surface, SurfaceId};
use crate::core::backend::Backend;
use crate::core::term::{AttrFlags, CellBuffer, CellWriter, Colour, ColourPair, Point, Size};
use crate::error::{Error, Result};

pub struct Window<'a, B: Backend> {
    id: SurfaceId,
    stack: &'a mut StackCoordinator<B>,
    registry: &'a mut Registry,
}

impl<'a, B: Backend> Window<'a, B> {
    pub(crate) fn new(
        id: SurfaceId,
        stack: &'a mut StackCoordinator<B>,
        registry: &'a mut Registry,
    ) -> Result<Self> {
        stack.get(id)?;
        Ok(Self { id, stack, registry })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    fn surface(&self) -> Result<&Surface> {
        self.stack.get(self.id)
    }

    fn surface_mut(&mut self) -> Result<&mut Surface> {
        self.stack.get_mut(self.id)
    }

    /// Run a paint operation against the active buffer
    fn with_active<T>(&mut self, f: impl FnOnce(&mut CellBuffer) -> T) -> Result<T> {
        Ok(f(self.surface_mut()?.active_mut()))
    }

    /// Change attribute state, then re-read what the buffer actually holds
    fn with_attrs(&mut self, f: impl FnOnce(&mut CellBuffer)) -> Result<&mut Self> {
        let surface = self.surface_mut()?;
        f(surface.active_mut());
        surface.read_back();
        Ok(self)
    }

    // ---- paint ----

    pub fn addch(&mut self, ch: char) -> Result<&mut Self> {
        self.with_active(|buf| buf.put_char(ch))?;
        Ok(self)
    }

    pub fn addstr(&mut self, s: &str) -> Result<&mut Self> {
        self.with_active(|buf| buf.put_str(s))?;
        Ok(self)
    }

    /// Formatted write at the cursor; returns the number of characters written
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize> {
        let (result, written) = self.with_active(|buf| {
            let mut writer = CellWriter::new(buf);
            // A short write shows up in the count; only Display impls fail
            let result = writer.write_fmt(args);
            (result, writer.written())
        })?;
        result?;
        Ok(written)
    }

    /// Move, then formatted write
    pub fn mvprint(&mut self, row: u16, col: u16, args: fmt::Arguments<'_>) -> Result<usize> {
        self.move_to_cell(row, col)?;
        self.print(args)
    }

    /// Write line-drawing glyphs given as alternate-character-set letters
    pub fn addgrstr(&mut self, s: &str) -> Result<&mut Self> {
        self.with_active(|buf| {
            let (flags, _) = buf.attr_get();
            buf.attr_on(AttrFlags::ALTCHARSET);
            buf.put_str(s);
            buf.attr_set(flags, None);
        })?;
        Ok(self)
    }

    /// Move the cursor inside the active region
    pub fn move_to_cell(&mut self, row: u16, col: u16) -> Result<&mut Self> {
        let id = self.id;
        let moved = self.with_active(|buf| buf.move_cursor(row, col))?;
        if !moved {
            return Err(Error::invariant(format!(
                "cursor ({}, {}) is outside {}",
                row, col, id
            )));
        }
        Ok(self)
    }

    /// Erase and repaint the whole terminal on the next update
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.with_active(CellBuffer::clear)?;
        Ok(self)
    }

    pub fn erase(&mut self) -> Result<&mut Self> {
        self.with_active(CellBuffer::erase)?;
        Ok(self)
    }

    /// Fill the background with the current attributes
    pub fn bgclear(&mut self) -> Result<&mut Self> {
        self.with_active(CellBuffer::fill_background)?;
        Ok(self)
    }

    // ---- attributes and colour ----

    pub fn attr_on(&mut self, code: &str) -> Result<&mut Self> {
        let flags = self.registry.attrs_from_code(code);
        self.with_attrs(|buf| buf.attr_on(flags))
    }

    pub fn attr_off(&mut self, code: &str) -> Result<&mut Self> {
        let flags = self.registry.attrs_from_code(code);
        self.with_attrs(|buf| buf.attr_off(flags))
    }

    /// Replace the attribute bits; `None` keeps the current colour pair
    pub fn attr_set(&mut self, code: &str, pair: Option<ColourPair>) -> Result<&mut Self> {
        if pair.is_some() {
            self.registry.ensure_colour_pairs(self.stack.screen_mut())?;
        }
        let flags = self.registry.attrs_from_code(code);
        self.with_attrs(|buf| buf.attr_set(flags, pair))
    }

    /// Select a foreground/background pair, building the colour table if needed
    pub fn colour(&mut self, fg: Colour, bg: Colour) -> Result<&mut Self> {
        self.registry.ensure_colour_pairs(self.stack.screen_mut())?;
        let pair = self.registry.colour_pair(fg, bg)?;
        self.with_attrs(|buf| buf.set_pair(pair))
    }

    fn current_colours(&self) -> Result<(Colour, Colour)> {
        let pair = self.surface()?.colour_pair().ok_or_else(|| {
            Error::invariant(format!("{} has no colour pair to change", self.id))
        })?;
        self.registry.decompose(pair)
    }

    /// Change the foreground, keeping the background
    pub fn fg(&mut self, colour: Colour) -> Result<&mut Self> {
        let (_, bg) = self.current_colours()?;
        self.colour(colour, bg)
    }

    /// Change the background, keeping the foreground
    pub fn bg(&mut self, colour: Colour) -> Result<&mut Self> {
        let (fg, _) = self.current_colours()?;
        self.colour(fg, colour)
    }

    /// Effective attribute bits as last read back
    pub fn attrs(&self) -> AttrFlags {
        self.surface().map(Surface::attrs).unwrap_or_default()
    }

    pub fn colour_pair(&self) -> Option<ColourPair> {
        self.surface().ok().and_then(Surface::colour_pair)
    }

    // ---- structure ----

    /// New child at `origin` relative to this window's frame
    pub fn create_child(&mut self, origin: Point, size: Size) -> Result<SurfaceId> {
        self.stack.create(self.id, origin, size, false)
    }

    /// New child with a border and a content region inset by one cell
    pub fn create_bordered_child(&mut self, origin: Point, size: Size) -> Result<SurfaceId> {
        self.stack.create(self.id, origin, size, true)
    }

    /// Replace this window's content region
    pub fn create_nested_region(&mut self, origin: Point, size: Size) -> Result<&mut Self> {
        self.stack.create_nested_region(self.id, origin, size)?;
        Ok(self)
    }

    pub fn raise(&mut self) -> Result<&mut Self> {
        self.stack.raise(self.id)?;
        Ok(self)
    }

    pub fn lower(&mut self) -> Result<&mut Self> {
        self.stack.lower(self.id)?;
        Ok(self)
    }

    pub fn send_to_front(&mut self) -> Result<&mut Self> {
        self.stack.send_to_front(self.id)?;
        Ok(self)
    }

    pub fn send_to_back(&mut self) -> Result<&mut Self> {
        self.stack.send_to_back(self.id)?;
        Ok(self)
    }

    /// Bury the window just above the root
    pub fn hide(&mut self) -> Result<&mut Self> {
        self.send_to_back()
    }

    pub fn show(&mut self) -> Result<&mut Self> {
        self.send_to_front()
    }

    /// Move to an absolute screen origin
    pub fn move_window(&mut self, origin: Point) -> Result<&mut Self> {
        self.stack.move_surface(self.id, origin)?;
        Ok(self)
    }

    /// Show or hide the cursor of the active region
    pub fn cursor(&mut self, visible: bool) -> Result<&mut Self> {
        self.with_active(|buf| buf.set_cursor_visible(visible))?;
        Ok(self)
    }

    /// Push every pending change to the terminal
    pub fn refresh(&mut self) -> Result<usize> {
        self.stack.perform_update()
    }

    // ---- queries ----

    pub fn origin(&self) -> Point {
        self.surface().map(Surface::origin).unwrap_or_default()
    }

    pub fn size(&self) -> Size {
        self.surface().map(Surface::size).unwrap_or_default()
    }

    pub fn cursor_position(&self) -> Point {
        self.surface().map(Surface::cursor_position).unwrap_or_default()
    }

    pub fn content_origin(&self) -> Point {
        self.surface().map(Surface::content_origin).unwrap_or_default()
    }

    pub fn content_size(&self) -> Size {
        self.surface().map(Surface::content_size).unwrap_or_default()
    }

    pub fn has_content(&self) -> bool {
        self.surface().is_ok_and(Surface::has_content)
    }

    /// Text of one row of the active region
    pub fn line_text(&self, row: u16) -> String {
        self.surface()
            .map(|s| s.active().line_text(row))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::HeadlessBackend;
    use crate::core::term::Screen;
    use crate::ui::glyphs::BorderChars;

    struct Fixture {
        stack: StackCoordinator<HeadlessBackend>,
        registry: Registry,
        root: SurfaceId,
    }

    impl Fixture {
        fn new(rows: u16, cols: u16) -> Self {
            let mut screen = Screen::new(HeadlessBackend::new(rows, cols)).unwrap();
            screen.enter().unwrap();
            let mut stack = StackCoordinator::new(screen, BorderChars::single(), true);
            let root = stack.create_root().unwrap();
            Self {
                stack,
                registry: Registry::default(),
                root,
            }
        }

        fn window(&mut self, id: SurfaceId) -> Window<'_, HeadlessBackend> {
            Window::new(id, &mut self.stack, &mut self.registry).unwrap()
        }
    }

    #[test]
    fn test_attr_on_off_restores() {
        let mut fx = Fixture::new(4, 10);
        let root = fx.root;
        let mut win = fx.window(root);
        let before = win.attrs();
        win.attr_on("B").unwrap();
        assert!(win.attrs().contains(AttrFlags::BOLD));
        win.attr_off("B").unwrap();
        assert_eq!(win.attrs(), before);

        win.attr_on("Z").unwrap();
        assert_eq!(win.attrs(), before);
    }

    #[test]
    fn test_read_back_reflects_normalisation() {
        let mut fx = Fixture::new(4, 10);
        let root = fx.root;
        let mut win = fx.window(root);
        win.attr_on("D").unwrap().attr_on("B").unwrap();
        assert_eq!(win.attrs(), AttrFlags::BOLD);
    }

    #[test]
    fn test_colour_channels() {
        let mut fx = Fixture::new(4, 10);
        let root = fx.root;
        let mut win = fx.window(root);
        assert!(matches!(win.fg(Colour::Red), Err(Error::InvariantViolation(_))));

        win.colour(Colour::Yellow, Colour::Blue).unwrap();
        win.fg(Colour::Red).unwrap();
        let pair = win.colour_pair().unwrap();
        assert_eq!(fx.registry.decompose(pair).unwrap(), (Colour::Red, Colour::Blue));

        let mut win = fx.window(root);
        win.bg(Colour::Green).unwrap();
        let pair = win.colour_pair().unwrap();
        assert_eq!(fx.registry.decompose(pair).unwrap(), (Colour::Red, Colour::Green));
    }

    #[test]
    fn test_print_counts_cells() {
        let mut fx = Fixture::new(2, 5);
        let root = fx.root;
        let mut win = fx.window(root);
        assert_eq!(win.mvprint(1, 1, format_args!("{}{}", 12, 345)).unwrap(), 4);
        assert_eq!(win.line_text(1), " 1234");
        assert!(win.mvprint(2, 0, format_args!("x")).is_err());
    }

    #[test]
    fn test_print_reports_display_errors() {
        struct Broken;
        impl fmt::Display for Broken {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("ok")?;
                Err(fmt::Error)
            }
        }

        let mut fx = Fixture::new(1, 6);
        let root = fx.root;
        let mut win = fx.window(root);
        assert!(matches!(win.print(format_args!("{}", Broken)), Err(Error::Format(_))));
        // What was written before the failure stays
        assert_eq!(win.line_text(0), "ok    ");
    }

    #[test]
    fn test_attr_set_pair_builds_colour_table() {
        let mut fx = Fixture::new(1, 4);
        let root = fx.root;
        // Green on Black, before any colour() call
        let pair = ColourPair::new(16);
        fx.window(root).attr_set("", pair).unwrap().addstr("ok").unwrap();
        assert!(fx.registry.is_built());
        assert_eq!(fx.registry.decompose(pair.unwrap()).unwrap(), (Colour::Green, Colour::Black));

        fx.window(root).refresh().unwrap();
        let cell = fx.stack.screen().backend().cell(Point::new(0, 0)).unwrap();
        assert_eq!(cell.fg, Some(Colour::Green.ansi()));
        assert_eq!(cell.bg, Some(Colour::Black.ansi()));
    }

    #[test]
    fn test_bordered_child_paints_into_content() {
        let mut fx = Fixture::new(10, 20);
        let root = fx.root;
        let child = fx
            .window(root)
            .create_bordered_child(Point::new(1, 2), Size::new(4, 8))
            .unwrap();

        let mut win = fx.window(child);
        assert_eq!(win.origin(), Point::new(1, 2));
        assert_eq!(win.content_origin(), Point::new(1, 1));
        assert_eq!(win.content_size(), Size::new(2, 6));
        win.addstr("hello").unwrap();
        win.refresh().unwrap();

        let backend = fx.stack.screen().backend();
        assert_eq!(backend.row_text(1), "  ┌──────┐          ");
        assert_eq!(backend.row_text(2), "  │hello │          ");
        assert_eq!(backend.cursor(), Some(Point::new(2, 8)));
    }

    #[test]
    fn test_addgrstr_keeps_attributes() {
        let mut fx = Fixture::new(1, 4);
        let root = fx.root;
        let mut win = fx.window(root);
        win.attr_on("U").unwrap();
        win.addgrstr("lqk").unwrap();
        assert_eq!(win.attrs(), AttrFlags::UNDERLINE);
        win.refresh().unwrap();
        assert_eq!(fx.stack.screen().backend().row_text(0), "┌─┐ ");
    }

    #[test]
    fn test_nested_region_replaces_content() {
        let mut fx = Fixture::new(10, 20);
        let root = fx.root;
        let child = fx
            .window(root)
            .create_bordered_child(Point::new(0, 0), Size::new(6, 10))
            .unwrap();
        let mut win = fx.window(child);
        win.create_nested_region(Point::new(2, 3), Size::new(0, 0)).unwrap();
        assert_eq!(win.content_origin(), Point::new(2, 3));
        assert_eq!(win.content_size(), Size::new(4, 7));
        win.move_to_cell(0, 0).unwrap().refresh().unwrap();
        assert_eq!(fx.stack.screen().backend().cursor(), Some(Point::new(2, 3)));
    }

    #[test]
    fn test_hide_and_show() {
        let mut fx = Fixture::new(4, 4);
        let root = fx.root;
        let a = fx.window(root).create_child(Point::default(), Size::new(1, 1)).unwrap();
        let b = fx.window(root).create_child(Point::default(), Size::new(1, 1)).unwrap();
        fx.window(b).hide().unwrap();
        assert_eq!(fx.stack.z_order(), &[root, b, a]);
        fx.window(b).show().unwrap();
        assert_eq!(fx.stack.z_order(), &[root, a, b]);
    }
}
