//! Dirty-region tracking for incremental presentation.
//!
//! Each window keeps two generations of dirty state: the *update* set
//! accumulates invalidations for the frame being built, and the *render*
//! set holds the snapshot consumed by the presenter. `snapshot` moves the
//! former into the latter at the start of a render cycle, so invalidations
//! arriving mid-render land in the next frame rather than the current one.
use arrayvec::ArrayVec;

use crate::geom::Rect;

/// The maximum number of dirty rectangles tracked per generation. One more
/// and the set degrades to a full-surface redraw.
pub const DIRTY_RECT_CAP: usize = 10;

/// A bounded set of dirty rectangles with a full-surface fallback.
#[derive(Debug, Clone, Default)]
pub struct DirtyRects {
    rects: ArrayVec<[Rect; DIRTY_RECT_CAP]>,
    full: bool,
}

impl DirtyRects {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the whole surface must be redrawn.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// `true` if nothing is dirty.
    pub fn is_empty(&self) -> bool {
        !self.full && self.rects.is_empty()
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Degrade to a full-surface redraw, discarding the tracked rectangles.
    pub fn mark_full(&mut self) {
        self.full = true;
        self.rects.clear();
    }

    /// Add `rect` to the dirty set.
    ///
    /// Slot 0 is kept as the largest tracked rectangle; a new rectangle
    /// already covered by it is dropped, and a new rectangle larger than it
    /// takes its place (the displaced one is dropped if the newcomer covers
    /// it, or appended otherwise). Once the set holds [`DIRTY_RECT_CAP`]
    /// rectangles, the next distinct one latches the full-surface state.
    /// Containment tests run even at capacity, so a mark that slot 0
    /// already covers (or that covers slot 0) never degrades the set.
    pub fn mark(&mut self, rect: Rect) {
        if self.full || rect.is_empty() {
            return;
        }

        if let Some(&largest) = self.rects.first() {
            if largest.contains_rect(&rect) {
                return;
            }

            if rect.area() > largest.area() {
                if self.rects.len() >= DIRTY_RECT_CAP && !rect.contains_rect(&largest) {
                    self.mark_full();
                    return;
                }
                self.rects[0] = rect;
                if rect.contains_rect(&largest) {
                    return;
                }
                // The displaced rectangle is still dirty; track it in the
                // newcomer's stead.
                self.rects.push(largest);
                return;
            }
        }

        if self.rects.len() >= DIRTY_RECT_CAP {
            self.mark_full();
            return;
        }

        self.rects.push(rect);
    }

    /// `true` if `rect` is covered by the dirty set.
    pub fn covers(&self, rect: &Rect) -> bool {
        self.full || self.rects.iter().any(|r| r.contains_rect(rect))
    }

    fn reset(&mut self) {
        self.rects.clear();
        self.full = false;
    }
}

/// An integral sub-rectangle of the swapchain surface, ready for
/// incremental presentation. Edges are in pixels, top-left origin,
/// right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Per-window dirty state, double-buffered across render cycles.
#[derive(Debug, Default)]
pub struct DirtyRegion {
    update: DirtyRects,
    render: DirtyRects,
}

impl DirtyRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate `rect` for the next render cycle.
    pub fn mark(&mut self, rect: Rect) {
        self.update.mark(rect);
    }

    /// Invalidate the whole surface for the next render cycle.
    pub fn mark_full(&mut self) {
        self.update.mark_full();
    }

    /// `true` if the pending (update) generation has work for a new frame.
    pub fn needs_render(&self) -> bool {
        !self.update.is_empty()
    }

    /// Move the accumulated update set into the render generation and reset
    /// the update set. Returns the render set for this cycle.
    pub fn snapshot(&mut self) -> &DirtyRects {
        self.render = std::mem::take(&mut self.update);
        &self.render
    }

    /// The render set produced by the last `snapshot`.
    pub fn render_set(&self) -> &DirtyRects {
        &self.render
    }

    /// Fold the last render generation back into the update set. Used when
    /// presentation fails and the frame's damage must not be lost.
    pub fn reclaim_render(&mut self) {
        if self.render.is_full() {
            self.update.mark_full();
        } else {
            for &r in self.render.rects() {
                self.update.mark(r);
            }
        }
        self.render.reset();
    }
}

/// Convert a dirty set to integral presentation rectangles clamped to a
/// `width`×`height` surface. Fractional edges are expanded outward so every
/// touched pixel is presented. Returns `None` if the set is full (or became
/// degenerate), meaning the whole surface must be presented.
pub fn to_present_rects(
    dirty: &DirtyRects,
    width: u32,
    height: u32,
) -> Option<ArrayVec<[PresentRect; DIRTY_RECT_CAP]>> {
    if dirty.is_full() {
        return None;
    }

    let mut out = ArrayVec::new();
    for r in dirty.rects() {
        let left = (r.min.x.max(0.0)) as i32;
        let top = (r.min.y.max(0.0)) as i32;
        let right = (r.max.x.ceil() as i32).min(width as i32);
        let bottom = (r.max.y.ceil() as i32).min(height as i32);
        if right <= left || bottom <= top {
            continue;
        }
        out.push(PresentRect {
            left,
            top,
            right,
            bottom,
        });
    }
    Some(out)
}
