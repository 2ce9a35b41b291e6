//! Collaborator interfaces between the window core and the control tree.
//!
//! The window core does not know what a control *is* — widgets, layout and
//! painting of individual elements live elsewhere. It only needs a small
//! contract: enough tree introspection to validate focus changes, and event
//! entry points for the input router to call into.
use bitflags::bitflags;
use cgmath::Point2;
use std::rc::{Rc, Weak};

/// A strong handle to a control tree node.
pub type ControlRc = Rc<dyn Control>;

/// A non-owning back-reference into the control tree.
///
/// The window core never owns controls. Each of these must be proactively
/// nulled out when the referent is detached (see
/// [`crate::input::InputRouter::control_detached`]).
pub type ControlWeak = Weak<dyn Control>;

bitflags! {
    /// Window configuration, fixed at creation time.
    pub struct WndConfig: u8 {
        /// A popup surface (menu, combo box drop-down). Uses the
        /// drop-shadow window class and never takes activation on click.
        const POPUP = 1 << 0;
        /// A tool window, kept out of the taskbar.
        const TOOL = 1 << 1;
        /// An inline (embedded, non-top-level) surface.
        const INLINE = 1 << 2;
    }
}

impl Default for WndConfig {
    fn default() -> Self {
        WndConfig::empty()
    }
}

bitflags! {
    /// Key modifier state attached to a mouse event. The bit values match
    /// the `MK_*` constants delivered in `WPARAM` by the native queue.
    pub struct Modifiers: u32 {
        const LBUTTON = 0x0001;
        const RBUTTON = 0x0002;
        const SHIFT = 0x0004;
        const CONTROL = 0x0008;
        const MBUTTON = 0x0010;
    }
}

/// The semantic kind of a mouse event after native-message translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Enter,
    Leave,
    Move,
    LButtonDown,
    LButtonUp,
    RButtonDown,
    RButtonUp,
    MButtonDown,
    MButtonUp,
    /// Vertical wheel. `wheel` is normalized to ±1.0 per notch.
    WheelV,
    /// Horizontal wheel (native, or shift + vertical wheel).
    WheelH,
    Unknown,
}

/// A translated mouse event, in window client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub kind: MouseEventKind,
    pub pos: Point2<f32>,
    pub wheel: f32,
    pub modifiers: Modifiers,
}

/// A virtual key code. The values are the platform's `VK_*` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key(pub u16);

impl Key {
    pub const TAB: Key = Key(0x09);
    pub const RETURN: Key = Key(0x0D);
    pub const MENU: Key = Key(0x12);
}

/// A translated keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    /// A complete code point. Surrogate pairs have already been combined by
    /// the input router.
    Char(char),
}

/// The receiver's verdict on an input event, used for Enter-key
/// fall-through to the default control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Handled,
    Ignored,
}

/// The mouse cursor shape requested by a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Arrow,
    Hand,
    Crosshair,
    Text,
    NotAllowed,
    Move,
    EwResize,
    NsResize,
    Wait,
    Help,
}

impl Default for CursorShape {
    fn default() -> Self {
        CursorShape::Arrow
    }
}

/// The contract a control tree node presents to the window core.
///
/// All methods have no-op defaults so test doubles and minimal viewports
/// stay small.
pub trait Control {
    /// The parent node, or `None` for a tree root. Used to validate focus
    /// changes (a focused ancestor must not steal focus to a descendant).
    fn parent(&self) -> Option<ControlRc> {
        None
    }

    /// Whether the control accepts keyboard focus.
    fn is_focusable(&self) -> bool {
        false
    }

    /// Whether the control may act as the window's default control.
    fn is_defaultable(&self) -> bool {
        false
    }

    /// The control's access key (`'A'..='Z'`), if any.
    fn access_key(&self) -> Option<char> {
        None
    }

    /// Focus was gained (`true`) or lost (`false`). Implementations start
    /// their focus transition animation here.
    fn focus_changed(&self, _gained: bool) {}

    /// Default-control status was gained or lost.
    fn default_changed(&self, _gained: bool) {}

    /// The access-key affordance was toggled for the whole window.
    fn access_key_display(&self, _shown: bool) {}

    /// The control's access key was activated (Alt + letter).
    fn access_key_action(&self) {}

    /// A mouse event routed to this control (it is either the captured
    /// control or the window's root).
    fn mouse_event(&self, _ev: &MouseInput) {}

    /// A keyboard event routed to this control.
    fn input_event(&self, _ev: &InputEvent) -> EventStatus {
        EventStatus::Ignored
    }
}

/// `true` if `a` and `b` are the same node.
pub fn same_control(a: &ControlRc, b: &ControlRc) -> bool {
    // Compare data pointers only; the vtable pointer may differ between
    // instantiations of the same impl.
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// `true` if `candidate` is a (proper) ancestor of `ctrl`.
pub fn has_ancestor(ctrl: &ControlRc, candidate: &ControlRc) -> bool {
    let mut cur = ctrl.parent();
    while let Some(c) = cur {
        if same_control(&c, candidate) {
            return true;
        }
        cur = c.parent();
    }
    false
}
