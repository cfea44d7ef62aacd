//! Surface - a stacked window with an optional nested content region

use std::fmt;

use crate::core::term::{AttrFlags, CellAttrs, CellBuffer, ColourPair, Point, Size};
use crate::ui::glyphs::BorderChars;

/// Opaque surface handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Inset region that receives every paint operation of its surface
#[derive(Debug)]
struct ContentRegion {
    /// Offset from the frame origin
    offset: Point,
    buffer: CellBuffer,
}

/// A rectangular window registered with the stack coordinator
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    root: bool,
    frame: CellBuffer,
    content: Option<ContentRegion>,
    /// Effective attributes as last read back from the active buffer
    attrs: AttrFlags,
    colour: Option<ColourPair>,
    border: Option<BorderChars>,
}

impl Surface {
    pub(crate) fn new(id: SurfaceId, origin: Point, size: Size, attrs: CellAttrs, root: bool) -> Self {
        Self {
            id,
            root,
            frame: CellBuffer::with_attrs(origin, size, attrs),
            content: None,
            attrs: attrs.flags,
            colour: attrs.pair,
            border: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn frame(&self) -> &CellBuffer {
        &self.frame
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn border(&self) -> Option<&BorderChars> {
        self.border.as_ref()
    }

    /// The buffer paint operations go to
    pub fn active(&self) -> &CellBuffer {
        match &self.content {
            Some(region) => &region.buffer,
            None => &self.frame,
        }
    }

    pub fn active_mut(&mut self) -> &mut CellBuffer {
        match &mut self.content {
            Some(region) => &mut region.buffer,
            None => &mut self.frame,
        }
    }

    /// Replace the content region. Pending writes of the previous region are
    /// kept in the frame, and the new region starts from the frame cells it
    /// covers.
    pub(crate) fn set_content(&mut self, offset: Point, size: Size, visible: bool) {
        let attrs = self.active().attrs();
        if let Some(old) = self.content.take() {
            if old.buffer.is_dirty() {
                self.frame.blit(&old.buffer, old.offset);
                self.frame.touch();
            }
        }
        let mut buffer = CellBuffer::with_attrs(self.frame.origin().offset(offset), size, attrs);
        buffer.copy_from(&self.frame, offset);
        buffer.set_cursor_visible(visible);
        self.content = Some(ContentRegion { offset, buffer });
    }

    pub(crate) fn take_content(&mut self) -> Option<CellBuffer> {
        self.content.take().map(|region| region.buffer)
    }

    /// Paint a border around the frame edge
    pub(crate) fn draw_border(&mut self, chars: BorderChars) {
        let Size { rows, cols } = self.frame.size();
        if rows < 2 || cols < 2 {
            return;
        }
        let (bottom, right) = (rows - 1, cols - 1);
        let frame = &mut self.frame;
        frame.set_cell(0, 0, chars.top_left);
        frame.set_cell(0, right, chars.top_right);
        frame.set_cell(bottom, 0, chars.bottom_left);
        frame.set_cell(bottom, right, chars.bottom_right);
        for col in 1..right {
            frame.set_cell(0, col, chars.horizontal);
            frame.set_cell(bottom, col, chars.horizontal);
        }
        for row in 1..bottom {
            frame.set_cell(row, 0, chars.vertical);
            frame.set_cell(row, right, chars.vertical);
        }
        self.border = Some(chars);
    }

    /// Re-read the effective attribute and colour state from the active buffer
    pub(crate) fn read_back(&mut self) {
        let (attrs, colour) = self.active().attr_get();
        self.attrs = attrs;
        self.colour = colour;
    }

    pub fn attrs(&self) -> AttrFlags {
        self.attrs
    }

    pub fn colour_pair(&self) -> Option<ColourPair> {
        self.colour
    }

    /// Absolute screen origin of the frame
    pub fn origin(&self) -> Point {
        self.frame.origin()
    }

    pub fn size(&self) -> Size {
        self.frame.size()
    }

    /// Content offset from the frame origin, (0, 0) without a content region
    pub fn content_origin(&self) -> Point {
        self.content
            .as_ref()
            .map(|region| region.offset)
            .unwrap_or_default()
    }

    pub fn content_size(&self) -> Size {
        self.active().size()
    }

    /// Cursor position local to the active buffer
    pub fn cursor_position(&self) -> Point {
        self.active().cursor().position()
    }

    pub(crate) fn move_to(&mut self, origin: Point) {
        self.frame.set_origin(origin);
        if let Some(region) = &mut self.content {
            region.buffer.set_origin(origin.offset(region.offset));
        }
    }

    /// Copy dirty content into the frame. Returns true when a full-screen
    /// clear was requested since the last call.
    pub(crate) fn touch(&mut self) -> bool {
        let mut clear = self.frame.take_clear_request();
        if let Some(region) = &mut self.content {
            clear |= region.buffer.take_clear_request();
            if region.buffer.is_dirty() {
                self.frame.blit(&region.buffer, region.offset);
                self.frame.touch();
                region.buffer.clear_dirty();
            }
        }
        clear
    }

    /// Point the frame cursor at the content cursor
    pub(crate) fn reconcile_cursor(&mut self) {
        if let Some(region) = &self.content {
            let cursor = region.buffer.cursor();
            let at = region.offset.offset(cursor.position());
            self.frame.place_cursor(at, cursor.visible);
        }
    }

    /// Absolute screen position of the cursor, if it is visible
    pub fn screen_cursor(&self) -> Option<Point> {
        let cursor = self.frame.cursor();
        cursor
            .visible
            .then(|| self.frame.origin().offset(cursor.position()))
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.frame.clear_dirty();
    }

    /// Whether the frame covers an absolute screen cell
    pub fn contains(&self, at: Point) -> bool {
        let origin = self.frame.origin();
        let size = self.frame.size();
        at.row >= origin.row
            && at.col >= origin.col
            && (at.row - origin.row) < size.rows
            && (at.col - origin.col) < size.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(row: u16, col: u16, rows: u16, cols: u16) -> Surface {
        Surface::new(
            SurfaceId::new(1),
            Point::new(row, col),
            Size::new(rows, cols),
            CellAttrs::default(),
            false,
        )
    }

    #[test]
    fn test_paint_goes_to_content() {
        let mut s = surface(2, 3, 5, 10);
        s.set_content(Point::new(1, 1), Size::new(3, 8), true);
        s.active_mut().put_str("hi");
        assert_eq!(s.frame().line_text(1), "          ");

        s.touch();
        assert_eq!(s.frame().line_text(1), " hi       ");
        assert_eq!(s.content_origin(), Point::new(1, 1));
        assert_eq!(s.content_size(), Size::new(3, 8));
    }

    #[test]
    fn test_reconcile_cursor_offsets_content() {
        let mut s = surface(4, 6, 5, 10);
        s.set_content(Point::new(1, 1), Size::new(3, 8), true);
        s.active_mut().move_cursor(0, 0);
        s.reconcile_cursor();
        assert_eq!(s.frame().cursor().position(), Point::new(1, 1));
        assert_eq!(s.screen_cursor(), Some(Point::new(5, 7)));
    }

    #[test]
    fn test_border_glyphs() {
        let mut s = surface(0, 0, 3, 4);
        s.draw_border(BorderChars::single());
        assert_eq!(s.frame().line_text(0), "┌──┐");
        assert_eq!(s.frame().line_text(1), "│  │");
        assert_eq!(s.frame().line_text(2), "└──┘");
    }

    #[test]
    fn test_move_carries_content() {
        let mut s = surface(0, 0, 4, 4);
        s.set_content(Point::new(1, 1), Size::new(2, 2), true);
        s.move_to(Point::new(5, 5));
        assert_eq!(s.origin(), Point::new(5, 5));
        assert_eq!(s.active().origin(), Point::new(6, 6));
        assert_eq!(s.content_origin(), Point::new(1, 1));
    }

    #[test]
    fn test_contains() {
        let s = surface(1, 1, 2, 3);
        assert!(s.contains(Point::new(1, 1)));
        assert!(s.contains(Point::new(2, 3)));
        assert!(!s.contains(Point::new(3, 1)));
        assert!(!s.contains(Point::new(1, 4)));
        assert!(!s.contains(Point::new(0, 0)));
    }

    #[test]
    fn test_clear_request_surfaces_through_touch() {
        let mut s = surface(0, 0, 3, 3);
        s.set_content(Point::new(1, 1), Size::new(1, 1), true);
        s.active_mut().clear();
        assert!(s.touch());
        assert!(!s.touch());
    }
}
