//! Stack coordinator - z-ordered surfaces and the deferred repaint
//!
//! Surfaces live in an arena keyed by [`SurfaceId`]; `z_order` lists the live
//! ids bottom to top with the root always at index 0. Paint operations only
//! touch cell buffers. [`StackCoordinator::perform_update`] is the single
//! place where anything reaches the terminal:
//!
//! 1. reconcile every frame cursor with its content region,
//! 2. copy dirty content regions into their frames,
//! 3. composite all frames bottom to top (only if something changed),
//! 4. flush the difference to the terminal once.

use std::collections::HashMap;
use tracing::debug;

use super::surface::{Surface, SurfaceId};
use crate::core::backend::Backend;
use crate::core::term::{CellAttrs, Point, Screen, Size};
use crate::error::{Error, Result};
use crate::ui::glyphs::BorderChars;

pub struct StackCoordinator<B: Backend> {
    surfaces: HashMap<SurfaceId, Surface>,
    /// Bottom to top
    z_order: Vec<SurfaceId>,
    next_id: u64,
    screen: Screen<B>,
    root: Option<SurfaceId>,
    /// Bumped on every structural change (create, destroy, restack, move)
    generation: u64,
    rendered_generation: u64,
    border: BorderChars,
    cursor_visible: bool,
}

impl<B: Backend> StackCoordinator<B> {
    pub fn new(screen: Screen<B>, border: BorderChars, cursor_visible: bool) -> Self {
        Self {
            surfaces: HashMap::new(),
            z_order: Vec::new(),
            next_id: 1,
            screen,
            root: None,
            generation: 0,
            rendered_generation: 0,
            border,
            cursor_visible,
        }
    }

    pub fn screen(&self) -> &Screen<B> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<B> {
        &mut self.screen
    }

    pub fn root(&self) -> Option<SurfaceId> {
        self.root
    }

    /// Live surface ids, bottom to top
    pub fn z_order(&self) -> &[SurfaceId] {
        &self.z_order
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    pub fn get(&self, id: SurfaceId) -> Result<&Surface> {
        self.surfaces.get(&id).ok_or(Error::UnknownSurface(id))
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Result<&mut Surface> {
        self.surfaces.get_mut(&id).ok_or(Error::UnknownSurface(id))
    }

    fn allocate_id(&mut self) -> SurfaceId {
        let id = SurfaceId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create the full-screen root surface at the bottom of the stack
    pub fn create_root(&mut self) -> Result<SurfaceId> {
        if let Some(root) = self.root {
            return Ok(root);
        }
        let size = self.screen.size();
        if size.is_empty() {
            return Err(Error::Allocation {
                row: 0,
                col: 0,
                rows: size.rows,
                cols: size.cols,
                reason: "the screen has no cells",
            });
        }
        let id = self.allocate_id();
        let mut root = Surface::new(id, Point::default(), size, CellAttrs::default(), true);
        root.active_mut().set_cursor_visible(self.cursor_visible);
        self.surfaces.insert(id, root);
        self.z_order.insert(0, id);
        self.root = Some(id);
        self.generation += 1;
        debug!("created root {} ({}x{})", id, size.rows, size.cols);
        Ok(id)
    }

    /// Resolve a child's absolute geometry. Zero dimensions extend to the
    /// screen edge.
    fn resolve_geometry(&self, origin: Point, size: Size) -> Result<Size> {
        let screen = self.screen.size();
        let rows = match size.rows {
            0 => screen.rows.saturating_sub(origin.row),
            n => n,
        };
        let cols = match size.cols {
            0 => screen.cols.saturating_sub(origin.col),
            n => n,
        };
        let resolved = Size::new(rows, cols);
        if resolved.is_empty() {
            return Err(Error::invariant(format!(
                "surface at ({}, {}) would have no cells",
                origin.row, origin.col
            )));
        }
        self.check_fits(origin, resolved)?;
        Ok(resolved)
    }

    fn check_fits(&self, origin: Point, size: Size) -> Result<()> {
        let screen = self.screen.size();
        let bottom = origin.row as u32 + size.rows as u32;
        let right = origin.col as u32 + size.cols as u32;
        if bottom > screen.rows as u32 || right > screen.cols as u32 {
            return Err(Error::Allocation {
                row: origin.row,
                col: origin.col,
                rows: size.rows,
                cols: size.cols,
                reason: "does not fit the screen",
            });
        }
        Ok(())
    }

    /// Create a child of `parent` at the top of the stack. `origin` is
    /// relative to the parent frame.
    pub fn create(
        &mut self,
        parent: SurfaceId,
        origin: Point,
        size: Size,
        bordered: bool,
    ) -> Result<SurfaceId> {
        let parent_surface = self.get(parent)?;
        let absolute = parent_surface.origin().offset(origin);
        let attrs = parent_surface.active().attrs();
        let size = self.resolve_geometry(absolute, size)?;

        let id = self.allocate_id();
        let mut surface = Surface::new(id, absolute, size, attrs, false);
        if bordered && size.rows > 2 && size.cols > 2 {
            surface.draw_border(self.border);
            surface.set_content(
                Point::new(1, 1),
                Size::new(size.rows - 2, size.cols - 2),
                self.cursor_visible,
            );
        }
        surface.active_mut().set_cursor_visible(self.cursor_visible);

        self.surfaces.insert(id, surface);
        self.z_order.push(id);
        self.generation += 1;
        debug!(
            "created {} at ({}, {}) size {}x{} bordered={}",
            id, absolute.row, absolute.col, size.rows, size.cols, bordered
        );
        Ok(id)
    }

    /// Replace a surface's content region. `origin` is frame-relative and
    /// zero dimensions extend to the frame edge.
    pub fn create_nested_region(&mut self, id: SurfaceId, origin: Point, size: Size) -> Result<()> {
        let visible = self.cursor_visible;
        let surface = self.get_mut(id)?;
        let frame = surface.size();
        if origin.row >= frame.rows || origin.col >= frame.cols {
            return Err(Error::invariant(format!(
                "region origin ({}, {}) is outside the {}x{} frame of {}",
                origin.row, origin.col, frame.rows, frame.cols, id
            )));
        }
        let rows = match size.rows {
            0 => frame.rows - origin.row,
            n => n,
        };
        let cols = match size.cols {
            0 => frame.cols - origin.col,
            n => n,
        };
        if origin.row as u32 + rows as u32 > frame.rows as u32
            || origin.col as u32 + cols as u32 > frame.cols as u32
        {
            return Err(Error::invariant(format!(
                "region {}x{} at ({}, {}) does not fit the {}x{} frame of {}",
                rows, cols, origin.row, origin.col, frame.rows, frame.cols, id
            )));
        }
        surface.set_content(origin, Size::new(rows, cols), visible);
        surface.read_back();
        Ok(())
    }

    /// Remove a surface and repaint what it covered
    pub fn destroy(&mut self, id: SurfaceId) -> Result<usize> {
        if self.root == Some(id) {
            return Err(Error::invariant("the root surface is owned by the session"));
        }
        let surface = self.get_mut(id)?;
        surface.take_content();
        self.z_order.retain(|&other| other != id);
        self.surfaces.remove(&id);
        self.generation += 1;
        debug!("destroyed {}", id);
        self.perform_update()
    }

    /// Drop every surface, root included
    pub fn remove_all(&mut self) {
        for id in self.z_order.drain(..).rev() {
            if let Some(mut surface) = self.surfaces.remove(&id) {
                surface.take_content();
            }
        }
        self.surfaces.clear();
        self.root = None;
        self.generation += 1;
    }

    fn position(&self, id: SurfaceId) -> Result<usize> {
        self.z_order
            .iter()
            .position(|&other| other == id)
            .ok_or(Error::UnknownSurface(id))
    }

    /// Move a surface from one stack slot to another; the root never moves
    fn restack(&mut self, id: SurfaceId, target: impl FnOnce(usize, usize) -> usize) -> Result<()> {
        let current = self.position(id)?;
        if self.root == Some(id) {
            return Ok(());
        }
        let top = self.z_order.len() - 1;
        // Slot 0 belongs to the root
        let floor = usize::from(self.root.is_some());
        let target = target(current, top).clamp(floor, top);
        if target != current {
            let moved = self.z_order.remove(current);
            self.z_order.insert(target, moved);
            self.generation += 1;
        }
        Ok(())
    }

    /// One slot up
    pub fn raise(&mut self, id: SurfaceId) -> Result<()> {
        self.restack(id, |current, _| current + 1)
    }

    /// One slot down, never below the root
    pub fn lower(&mut self, id: SurfaceId) -> Result<()> {
        self.restack(id, |current, _| current.saturating_sub(1))
    }

    pub fn send_to_front(&mut self, id: SurfaceId) -> Result<()> {
        self.restack(id, |_, top| top)
    }

    /// Just above the root
    pub fn send_to_back(&mut self, id: SurfaceId) -> Result<()> {
        self.restack(id, |_, _| 0)
    }

    /// Move a surface to an absolute screen origin
    pub fn move_surface(&mut self, id: SurfaceId, origin: Point) -> Result<()> {
        let size = self.get(id)?.size();
        self.check_fits(origin, size)?;
        let surface = self.get_mut(id)?;
        if surface.origin() != origin {
            surface.move_to(origin);
            self.generation += 1;
        }
        Ok(())
    }

    /// Top-most surface covering a screen cell
    pub fn surface_at(&self, at: Point) -> Option<SurfaceId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|id| self.surfaces.get(id).is_some_and(|s| s.contains(at)))
    }

    /// Point every frame cursor at its content cursor and the physical
    /// cursor at the top-most surface
    pub fn reconcile_positions(&mut self) {
        for id in &self.z_order {
            if let Some(surface) = self.surfaces.get_mut(id) {
                surface.reconcile_cursor();
            }
        }
        let cursor = self
            .z_order
            .last()
            .and_then(|id| self.surfaces.get(id))
            .and_then(Surface::screen_cursor);
        self.screen.set_cursor(cursor);
    }

    /// Whether the next update has to recomposite
    pub fn is_stale(&self) -> bool {
        self.generation != self.rendered_generation
            || self
                .surfaces
                .values()
                .any(|s| s.is_dirty() || s.active().is_dirty())
    }

    /// Bring the terminal up to date with one physical write.
    /// Returns the number of cells sent.
    pub fn perform_update(&mut self) -> Result<usize> {
        self.reconcile_positions();

        let mut stale = self.generation != self.rendered_generation;
        for id in &self.z_order {
            if let Some(surface) = self.surfaces.get_mut(id) {
                if surface.touch() {
                    self.screen.invalidate();
                    stale = true;
                }
                stale |= surface.is_dirty();
            }
        }

        if stale {
            let surfaces = &self.surfaces;
            self.screen.recompute(
                self.z_order
                    .iter()
                    .filter_map(|id| surfaces.get(id))
                    .map(Surface::frame),
            );
            for surface in self.surfaces.values_mut() {
                surface.clear_dirty();
            }
            self.rendered_generation = self.generation;
        }

        let written = self.screen.flush()?;
        debug!("update: {} surfaces, {} cells written", self.z_order.len(), written);
        Ok(written)
    }
}
