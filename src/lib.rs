//! Shoji is the window core of a retained-mode GUI toolkit for Windows:
//! native window lifecycle, incremental rendering driven by a bounded
//! dirty-rectangle tracker, and per-window input routing (focus, capture,
//! the default control, access keys, and UTF-16 text reassembly).
//!
//! The crate is split in two halves:
//!
//!  - Portable state machines with no OS dependency: [`dirty`], [`input`],
//!    [`popup`], [`registry`] and [`style`]. These carry the observable
//!    semantics and are fully testable anywhere.
//!  - The Windows backend ([`windows`], `cfg(target_os = "windows")`):
//!    window classes and the window procedure, the shared Direct3D 11 /
//!    Direct2D device pair, flip-model swapchains presented with
//!    per-frame dirty rectangles, and the message loop.
//!
//! Windows own no controls; the control tree is reached only through the
//! [`iface::Control`] trait and weak references that are nulled when a
//! control detaches. Rendering is damage-driven: controls mark dirty
//! rectangles, the tracker bounds them ([`dirty::DIRTY_RECT_CAP`], beyond
//! which a frame degrades to a full redraw), and the render cycle
//! snapshots the accumulated set so mid-frame invalidations land in the
//! next frame.
pub mod dirty;
pub mod geom;
pub mod iface;
pub mod input;
pub mod popup;
pub mod registry;
pub mod style;

#[cfg(target_os = "windows")]
pub mod windows;

pub use crate::{
    dirty::{DirtyRegion, DIRTY_RECT_CAP},
    geom::Rect,
    iface::{
        Control, ControlRc, ControlWeak, CursorShape, EventStatus, InputEvent, Key, Modifiers,
        MouseEventKind, MouseInput, WndConfig,
    },
    input::InputRouter,
    popup::{PopupSlot, PopupToggle},
    registry::NamedControlMap,
    style::{StyleEngine, StyleError, StyleLoader, StyleSheet},
};

#[cfg(target_os = "windows")]
pub use crate::windows::{enter_main_loop, terminate, HWnd, Viewport, WndOptions};
