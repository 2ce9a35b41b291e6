//! Per-window input routing: focus, mouse capture, the default control,
//! access keys, and UTF-16 text reassembly.
use log::trace;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::iface::{
    has_ancestor, same_control, ControlRc, ControlWeak, EventStatus, InputEvent, Key,
    MouseEventKind, MouseInput,
};

/// Reassembles a stream of UTF-16 code units into complete code points.
///
/// The native queue delivers text one code unit at a time, so astral-plane
/// characters arrive as two messages. A high surrogate is buffered until
/// its low half arrives; a lone surrogate of either kind produces nothing.
#[derive(Debug, Default)]
pub struct Utf16Reassembler {
    pending_high: Option<u16>,
}

impl Utf16Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one code unit; returns a character once one is complete.
    pub fn push(&mut self, unit: u16) -> Option<char> {
        match unit {
            0xD800..=0xDBFF => {
                // A second high surrogate drops the first.
                self.pending_high = Some(unit);
                None
            }
            0xDC00..=0xDFFF => {
                let high = self.pending_high.take()?;
                let c = 0x10000
                    + ((u32::from(high) - 0xD800) << 10)
                    + (u32::from(unit) - 0xDC00);
                std::char::from_u32(c)
            }
            _ => {
                self.pending_high = None;
                std::char::from_u32(u32::from(unit))
            }
        }
    }
}

fn upgrade(slot: &Option<ControlWeak>) -> Option<ControlRc> {
    slot.as_ref().and_then(Weak::upgrade)
}

/// The number of access-key slots (`'A'..='Z'`).
pub const ACCESS_KEY_COUNT: usize = 26;

/// Per-window input state.
///
/// State lives in field-level cells so every operation takes `&self`, and
/// no cell is borrowed while a control callback runs. Event handlers are
/// therefore free to call back into the router (a click handler moving
/// focus, an Enter handler installing a default control).
///
/// All control references are weak; [`InputRouter::control_detached`] must
/// be called when a node leaves the tree so no slot outlives its referent.
#[derive(Default)]
pub struct InputRouter {
    focused: RefCell<Option<ControlWeak>>,
    captured: RefCell<Option<ControlWeak>>,
    /// The window's designated default control.
    wnd_default: RefCell<Option<ControlWeak>>,
    /// A transient default (e.g. a focused push button) that shadows
    /// `wnd_default` while set.
    now_default: RefCell<Option<ControlWeak>>,
    access_keys: RefCell<[Option<ControlWeak>; ACCESS_KEY_COUNT]>,
    access_keys_shown: Cell<bool>,
    utf16: RefCell<Utf16Reassembler>,
    mouse_entered: Cell<bool>,
    mouse_left_down: Cell<bool>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<ControlRc> {
        upgrade(&self.focused.borrow())
    }

    pub fn captured(&self) -> Option<ControlRc> {
        upgrade(&self.captured.borrow())
    }

    /// The control currently displayed as the default: the transient one if
    /// set, the window's designated one otherwise.
    pub fn effective_default(&self) -> Option<ControlRc> {
        upgrade(&self.now_default.borrow()).or_else(|| upgrade(&self.wnd_default.borrow()))
    }

    /// Move keyboard focus to `target`.
    ///
    /// Returns `false` without any state change if `target` refuses focus.
    /// Refocusing the already-focused control is a no-op. Otherwise the old
    /// control sees exactly one `focus_changed(false)` and the new one
    /// exactly one `focus_changed(true)`, in that order.
    pub fn set_focus(&self, target: ControlRc) -> bool {
        if !target.is_focusable() {
            return false;
        }

        let old = self.focused();
        if let Some(old) = &old {
            if same_control(old, &target) {
                return true;
            }
            // A focused container must relinquish focus explicitly before a
            // descendant takes it.
            debug_assert!(
                !has_ancestor(&target, old),
                "focus moved from a control to its own descendant"
            );
        }

        *self.focused.borrow_mut() = Some(Rc::downgrade(&target));
        if let Some(old) = old {
            old.focus_changed(false);
        }
        target.focus_changed(true);
        true
    }

    /// Clear keyboard focus, notifying the holder if any.
    pub fn kill_focus(&self) {
        let old = self.focused();
        *self.focused.borrow_mut() = None;
        if let Some(old) = old {
            old.focus_changed(false);
        }
    }

    /// Direct all subsequent mouse events to `target` until release.
    pub fn set_capture(&self, target: &ControlRc) {
        *self.captured.borrow_mut() = Some(Rc::downgrade(target));
    }

    /// Return mouse routing to hit-order dispatch. Returns `true` if a
    /// capture was actually in place.
    pub fn release_capture(&self) -> bool {
        self.captured.borrow_mut().take().is_some()
    }

    /// Designate `target` as the window's default control.
    pub fn set_default(&self, target: ControlRc) -> bool {
        if !target.is_defaultable() {
            return false;
        }
        let old = self.effective_default();
        *self.wnd_default.borrow_mut() = Some(Rc::downgrade(&target));
        self.notify_default_change(old);
        true
    }

    /// Temporarily show `target` as the default, shadowing the designated
    /// one. Used while a defaultable control holds focus.
    pub fn set_now_default(&self, target: ControlRc) -> bool {
        if !target.is_defaultable() {
            return false;
        }
        let old = self.effective_default();
        *self.now_default.borrow_mut() = Some(Rc::downgrade(&target));
        self.notify_default_change(old);
        true
    }

    /// Drop the transient default, restoring the designated one.
    pub fn reset_now_default(&self) {
        let old = self.effective_default();
        *self.now_default.borrow_mut() = None;
        self.notify_default_change(old);
    }

    fn notify_default_change(&self, old: Option<ControlRc>) {
        let new = self.effective_default();
        if let (Some(o), Some(n)) = (&old, &new) {
            if same_control(o, n) {
                return;
            }
        }
        if let Some(o) = old {
            o.default_changed(false);
        }
        if let Some(n) = new {
            n.default_changed(true);
        }
    }

    /// Register `target` under its access key. Returns the hot-key slot
    /// index (`0` for `'A'` .. `25` for `'Z'`), or `None` if the control
    /// declares no key or the key is out of range.
    pub fn register_access_key(&self, target: &ControlRc) -> Option<usize> {
        let key = target.access_key()?.to_ascii_uppercase();
        if !key.is_ascii_uppercase() {
            return None;
        }
        let slot = (key as u8 - b'A') as usize;
        let mut keys = self.access_keys.borrow_mut();
        if upgrade(&keys[slot]).is_some() {
            trace!("access key {:?} re-registered", key);
        }
        keys[slot] = Some(Rc::downgrade(target));
        Some(slot)
    }

    /// Fire the access key in `slot`. Returns `false` if the slot is empty
    /// or its control is gone, in which case the caller should signal the
    /// rejection (e.g. a beep).
    pub fn on_hot_key(&self, slot: usize) -> bool {
        let ctrl = self.access_keys.borrow().get(slot).and_then(upgrade);
        match ctrl {
            Some(c) => {
                c.access_key_action();
                true
            }
            None => false,
        }
    }

    /// `true` if the access-key affordance is currently shown.
    pub fn access_keys_shown(&self) -> bool {
        self.access_keys_shown.get()
    }

    /// Null every slot referring to `target` or to a descendant of it.
    /// Must be called when a control is detached from the tree so no weak
    /// reference outlives its referent's membership.
    pub fn control_detached(&self, target: &ControlRc) {
        fn in_subtree(slot: &RefCell<Option<ControlWeak>>, target: &ControlRc) -> bool {
            let ctrl = upgrade(&slot.borrow());
            ctrl.map_or(false, |c| same_control(&c, target) || has_ancestor(&c, target))
        }

        if in_subtree(&self.focused, target) {
            *self.focused.borrow_mut() = None;
        }
        if in_subtree(&self.captured, target) {
            *self.captured.borrow_mut() = None;
        }
        if in_subtree(&self.wnd_default, target) {
            *self.wnd_default.borrow_mut() = None;
        }
        if in_subtree(&self.now_default, target) {
            *self.now_default.borrow_mut() = None;
        }
        for i in 0..ACCESS_KEY_COUNT {
            let ctrl = self.access_keys.borrow()[i].as_ref().and_then(Weak::upgrade);
            if ctrl.map_or(false, |c| same_control(&c, target) || has_ancestor(&c, target)) {
                self.access_keys.borrow_mut()[i] = None;
            }
        }
    }

    /// Route a translated mouse event.
    ///
    /// Events go to the captured control if one is set, to `root`
    /// otherwise. The first `Move` after a `Leave` (or ever) synthesizes an
    /// `Enter` delivered before it. A left-button-up without a recorded
    /// matching down is dropped; the return value is `false` when the
    /// event was swallowed this way.
    pub fn route_mouse(&self, ev: &MouseInput, root: &ControlRc) -> bool {
        match ev.kind {
            MouseEventKind::Move => {
                if !self.mouse_entered.replace(true) {
                    let enter = MouseInput {
                        kind: MouseEventKind::Enter,
                        ..*ev
                    };
                    self.dispatch_mouse(&enter, root);
                }
            }
            MouseEventKind::Leave => {
                self.mouse_entered.set(false);
            }
            MouseEventKind::LButtonDown => {
                self.mouse_left_down.set(true);
            }
            MouseEventKind::LButtonUp => {
                if !self.mouse_left_down.replace(false) {
                    return false;
                }
            }
            _ => {}
        }

        self.dispatch_mouse(ev, root);
        true
    }

    fn dispatch_mouse(&self, ev: &MouseInput, root: &ControlRc) {
        // Snapshot the target first; no cell is borrowed during the call.
        let captured = self.captured();
        match captured {
            Some(c) => c.mouse_event(ev),
            None => root.mouse_event(ev),
        }
    }

    /// Route a key press.
    ///
    /// Enter goes straight to the effective default control when one is
    /// set; otherwise it reaches the focused control like any other key,
    /// and an ignored Enter still falls through to whatever default
    /// appears by then.
    pub fn on_key_down(&self, key: Key) -> EventStatus {
        let ev = InputEvent::KeyDown(key);

        if key == Key::RETURN {
            if let Some(default) = self.effective_default() {
                return default.input_event(&ev);
            }
        }

        let focused = match self.focused() {
            Some(f) => f,
            None => return EventStatus::Ignored,
        };
        let status = focused.input_event(&ev);
        if status == EventStatus::Ignored && key == Key::RETURN {
            if let Some(default) = self.effective_default() {
                return default.input_event(&ev);
            }
        }
        status
    }

    /// Route a system key press (Alt held). A non-repeat Alt toggles the
    /// access-key affordance on every registered control. Returns `true`
    /// if the event was consumed.
    pub fn on_system_key_down(&self, key: Key, repeat: bool) -> bool {
        if key != Key::MENU || repeat {
            return false;
        }
        let shown = !self.access_keys_shown.get();
        self.access_keys_shown.set(shown);
        let targets: Vec<ControlRc> = self.access_keys.borrow().iter().filter_map(upgrade).collect();
        for ctrl in targets {
            ctrl.access_key_display(shown);
        }
        true
    }

    /// Feed one UTF-16 code unit of text input.
    pub fn on_char_unit(&self, unit: u16) {
        let c = self.utf16.borrow_mut().push(unit);
        if let Some(c) = c {
            self.on_char(c);
        }
    }

    /// Deliver a complete character to the focused control. Control
    /// characters other than tab are dropped; they arrive separately as
    /// key events.
    pub fn on_char(&self, c: char) {
        if (c as u32) < 0x20 && c != '\t' {
            return;
        }
        if let Some(focused) = self.focused() {
            focused.input_event(&InputEvent::Char(c));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface::{Control, Modifiers};
    use cgmath::Point2;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct MockCtrl {
        parent: RefCell<Option<ControlRc>>,
        focusable: bool,
        defaultable: bool,
        access_key: Option<char>,
        focus_log: RefCell<Vec<bool>>,
        default_log: RefCell<Vec<bool>>,
        access_display_log: RefCell<Vec<bool>>,
        access_fired: Cell<u32>,
        mouse_log: RefCell<Vec<MouseEventKind>>,
        input_log: RefCell<Vec<InputEvent>>,
        input_verdict: Cell<EventStatus>,
    }

    impl Default for MockCtrl {
        fn default() -> Self {
            Self {
                parent: RefCell::new(None),
                focusable: false,
                defaultable: false,
                access_key: None,
                focus_log: RefCell::new(Vec::new()),
                default_log: RefCell::new(Vec::new()),
                access_display_log: RefCell::new(Vec::new()),
                access_fired: Cell::new(0),
                mouse_log: RefCell::new(Vec::new()),
                input_log: RefCell::new(Vec::new()),
                input_verdict: Cell::new(EventStatus::Ignored),
            }
        }
    }

    impl MockCtrl {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                focusable: true,
                ..Default::default()
            })
        }
    }

    impl Control for MockCtrl {
        fn parent(&self) -> Option<ControlRc> {
            self.parent.borrow().clone()
        }
        fn is_focusable(&self) -> bool {
            self.focusable
        }
        fn is_defaultable(&self) -> bool {
            self.defaultable
        }
        fn access_key(&self) -> Option<char> {
            self.access_key
        }
        fn focus_changed(&self, gained: bool) {
            self.focus_log.borrow_mut().push(gained);
        }
        fn default_changed(&self, gained: bool) {
            self.default_log.borrow_mut().push(gained);
        }
        fn access_key_display(&self, shown: bool) {
            self.access_display_log.borrow_mut().push(shown);
        }
        fn access_key_action(&self) {
            self.access_fired.set(self.access_fired.get() + 1);
        }
        fn mouse_event(&self, ev: &MouseInput) {
            self.mouse_log.borrow_mut().push(ev.kind);
        }
        fn input_event(&self, ev: &InputEvent) -> EventStatus {
            self.input_log.borrow_mut().push(*ev);
            self.input_verdict.get()
        }
    }

    fn as_ctrl(c: &Rc<MockCtrl>) -> ControlRc {
        c.clone() as ControlRc
    }

    fn mouse(kind: MouseEventKind) -> MouseInput {
        MouseInput {
            kind,
            pos: Point2::new(0.0, 0.0),
            wheel: 0.0,
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn surrogate_pair_reassembles() {
        let mut r = Utf16Reassembler::new();
        assert_eq!(r.push(0xD83D), None);
        assert_eq!(r.push(0xDE00), Some('\u{1F600}'));
    }

    #[test]
    fn lone_surrogates_produce_nothing() {
        let mut r = Utf16Reassembler::new();
        assert_eq!(r.push(0xDE00), None);
        assert_eq!(r.push(0xD83D), None);
        // A BMP unit clears the dangling high surrogate.
        assert_eq!(r.push(0x0041), Some('A'));
        assert_eq!(r.push(0xDE00), None);
    }

    #[test]
    fn focus_transition_fires_exactly_once_each() {
        let a = MockCtrl::new();
        let b = MockCtrl::new();
        let router = InputRouter::new();

        assert!(router.set_focus(as_ctrl(&a)));
        assert_eq!(*a.focus_log.borrow(), vec![true]);

        assert!(router.set_focus(as_ctrl(&b)));
        assert_eq!(*a.focus_log.borrow(), vec![true, false]);
        assert_eq!(*b.focus_log.borrow(), vec![true]);
    }

    #[test]
    fn refocusing_same_control_is_a_no_op() {
        let a = MockCtrl::new();
        let router = InputRouter::new();
        assert!(router.set_focus(as_ctrl(&a)));
        assert!(router.set_focus(as_ctrl(&a)));
        assert_eq!(*a.focus_log.borrow(), vec![true]);
    }

    #[test]
    fn non_focusable_control_is_refused() {
        let a = Rc::new(MockCtrl::default());
        let router = InputRouter::new();
        assert!(!router.set_focus(as_ctrl(&a)));
        assert!(router.focused().is_none());
        assert!(a.focus_log.borrow().is_empty());
    }

    #[test]
    fn detach_nulls_every_reference() {
        let a = MockCtrl::new();
        let router = InputRouter::new();
        router.set_focus(as_ctrl(&a));
        router.set_capture(&as_ctrl(&a));

        router.control_detached(&as_ctrl(&a));
        assert!(router.focused().is_none());
        assert!(router.captured().is_none());
        // Detach is not a focus loss event; the control is already gone
        // from the tree.
        assert_eq!(*a.focus_log.borrow(), vec![true]);
    }

    #[test]
    fn detaching_an_ancestor_clears_descendant_focus() {
        let parent = MockCtrl::new();
        let child = MockCtrl::new();
        *child.parent.borrow_mut() = Some(as_ctrl(&parent));

        let router = InputRouter::new();
        router.set_focus(as_ctrl(&child));
        router.control_detached(&as_ctrl(&parent));
        assert!(router.focused().is_none());
    }

    #[test]
    fn capture_redirects_mouse_events() {
        let root = MockCtrl::new();
        let grabber = MockCtrl::new();
        let router = InputRouter::new();

        router.route_mouse(&mouse(MouseEventKind::Move), &as_ctrl(&root));
        assert_eq!(
            *root.mouse_log.borrow(),
            vec![MouseEventKind::Enter, MouseEventKind::Move]
        );

        router.set_capture(&as_ctrl(&grabber));
        router.route_mouse(&mouse(MouseEventKind::Move), &as_ctrl(&root));
        assert_eq!(*grabber.mouse_log.borrow(), vec![MouseEventKind::Move]);

        assert!(router.release_capture());
        assert!(!router.release_capture());
    }

    #[test]
    fn enter_is_resynthesized_after_leave() {
        let root = MockCtrl::new();
        let router = InputRouter::new();
        let rc = as_ctrl(&root);

        router.route_mouse(&mouse(MouseEventKind::Move), &rc);
        router.route_mouse(&mouse(MouseEventKind::Move), &rc);
        router.route_mouse(&mouse(MouseEventKind::Leave), &rc);
        router.route_mouse(&mouse(MouseEventKind::Move), &rc);

        use MouseEventKind::*;
        assert_eq!(
            *root.mouse_log.borrow(),
            vec![Enter, Move, Move, Leave, Enter, Move]
        );
    }

    /// A root control whose click handler moves focus, re-entering the
    /// router from inside the dispatch.
    struct ClickFocuses {
        router: Rc<InputRouter>,
        target: ControlRc,
    }

    impl Control for ClickFocuses {
        fn mouse_event(&self, ev: &MouseInput) {
            if ev.kind == MouseEventKind::LButtonDown {
                self.router.set_focus(Rc::clone(&self.target));
            }
        }
    }

    #[test]
    fn a_click_handler_may_move_focus() {
        let router = Rc::new(InputRouter::new());
        let editor = MockCtrl::new();
        let root = Rc::new(ClickFocuses {
            router: Rc::clone(&router),
            target: as_ctrl(&editor),
        });
        let rc = root.clone() as ControlRc;

        assert!(router.route_mouse(&mouse(MouseEventKind::LButtonDown), &rc));
        assert!(same_control(&router.focused().unwrap(), &as_ctrl(&editor)));
        assert_eq!(*editor.focus_log.borrow(), vec![true]);
    }

    #[test]
    fn enter_key_goes_to_the_default_control_first() {
        let editor = MockCtrl::new();
        let button = Rc::new(MockCtrl {
            defaultable: true,
            ..Default::default()
        });
        let router = InputRouter::new();
        router.set_focus(as_ctrl(&editor));
        assert!(router.set_default(as_ctrl(&button)));

        router.on_key_down(Key::RETURN);
        assert_eq!(
            *button.input_log.borrow(),
            vec![InputEvent::KeyDown(Key::RETURN)]
        );
        // The focused control never sees it while a default is set.
        assert!(editor.input_log.borrow().is_empty());
    }

    #[test]
    fn enter_key_reaches_focused_control_without_a_default() {
        let editor = MockCtrl::new();
        let router = InputRouter::new();
        router.set_focus(as_ctrl(&editor));

        assert_eq!(router.on_key_down(Key::RETURN), EventStatus::Ignored);
        assert_eq!(
            *editor.input_log.borrow(),
            vec![InputEvent::KeyDown(Key::RETURN)]
        );
    }

    /// A focused control that reacts to Enter by installing a transient
    /// default control, then reports the key as unhandled.
    struct EnterInstallsDefault {
        router: Rc<InputRouter>,
        button: ControlRc,
    }

    impl Control for EnterInstallsDefault {
        fn is_focusable(&self) -> bool {
            true
        }
        fn input_event(&self, ev: &InputEvent) -> EventStatus {
            if *ev == InputEvent::KeyDown(Key::RETURN) {
                self.router.set_now_default(Rc::clone(&self.button));
            }
            EventStatus::Ignored
        }
    }

    #[test]
    fn ignored_enter_falls_through_to_a_default_installed_by_the_handler() {
        let router = Rc::new(InputRouter::new());
        let button = Rc::new(MockCtrl {
            defaultable: true,
            ..Default::default()
        });
        let editor = Rc::new(EnterInstallsDefault {
            router: Rc::clone(&router),
            button: as_ctrl(&button),
        });
        router.set_focus(editor.clone() as ControlRc);

        router.on_key_down(Key::RETURN);
        assert_eq!(
            *button.input_log.borrow(),
            vec![InputEvent::KeyDown(Key::RETURN)]
        );
    }

    #[test]
    fn other_keys_do_not_reach_default() {
        let button = Rc::new(MockCtrl {
            defaultable: true,
            ..Default::default()
        });
        let router = InputRouter::new();
        router.set_default(as_ctrl(&button));
        router.on_key_down(Key::TAB);
        assert!(button.input_log.borrow().is_empty());
    }

    #[test]
    fn transient_default_shadows_designated_one() {
        let designated = Rc::new(MockCtrl {
            defaultable: true,
            ..Default::default()
        });
        let transient = Rc::new(MockCtrl {
            defaultable: true,
            ..Default::default()
        });
        let router = InputRouter::new();

        router.set_default(as_ctrl(&designated));
        assert_eq!(*designated.default_log.borrow(), vec![true]);

        router.set_now_default(as_ctrl(&transient));
        assert_eq!(*designated.default_log.borrow(), vec![true, false]);
        assert_eq!(*transient.default_log.borrow(), vec![true]);

        router.reset_now_default();
        assert_eq!(*transient.default_log.borrow(), vec![true, false]);
        assert_eq!(*designated.default_log.borrow(), vec![true, false, true]);
    }

    #[test]
    fn alt_toggles_access_key_display_without_repeats() {
        let btn = Rc::new(MockCtrl {
            access_key: Some('S'),
            ..Default::default()
        });
        let router = InputRouter::new();
        let slot = router.register_access_key(&as_ctrl(&btn));
        assert_eq!(slot, Some(18));

        assert!(router.on_system_key_down(Key::MENU, false));
        assert_eq!(*btn.access_display_log.borrow(), vec![true]);

        // Held-key auto-repeat must not flicker the affordance.
        assert!(!router.on_system_key_down(Key::MENU, true));
        assert_eq!(*btn.access_display_log.borrow(), vec![true]);

        assert!(router.on_system_key_down(Key::MENU, false));
        assert_eq!(*btn.access_display_log.borrow(), vec![true, false]);
    }

    #[test]
    fn hot_key_fires_registered_control() {
        init_logger();
        let btn = Rc::new(MockCtrl {
            access_key: Some('a'),
            ..Default::default()
        });
        let router = InputRouter::new();
        let slot = router.register_access_key(&as_ctrl(&btn)).unwrap();
        assert_eq!(slot, 0);

        assert!(router.on_hot_key(slot));
        assert_eq!(btn.access_fired.get(), 1);

        router.control_detached(&as_ctrl(&btn));
        assert!(!router.on_hot_key(slot));
        assert!(!router.on_hot_key(99));
    }

    #[test]
    fn char_input_reaches_focused_control() {
        let editor = MockCtrl::new();
        let router = InputRouter::new();
        router.set_focus(as_ctrl(&editor));

        router.on_char_unit(0x41);
        router.on_char_unit(0x09); // tab passes through
        router.on_char_unit(0x0D); // CR is dropped
        router.on_char_unit(0xD83D);
        router.on_char_unit(0xDE00);

        assert_eq!(
            *editor.input_log.borrow(),
            vec![
                InputEvent::Char('A'),
                InputEvent::Char('\t'),
                InputEvent::Char('\u{1F600}')
            ]
        );
    }

    #[test]
    fn unpaired_button_up_is_dropped() {
        let root = MockCtrl::new();
        let router = InputRouter::new();
        let rc = as_ctrl(&root);

        assert!(!router.route_mouse(&mouse(MouseEventKind::LButtonUp), &rc));
        assert!(root.mouse_log.borrow().is_empty());

        assert!(router.route_mouse(&mouse(MouseEventKind::LButtonDown), &rc));
        assert!(router.route_mouse(&mouse(MouseEventKind::LButtonUp), &rc));
        // A second up has no matching down any more.
        assert!(!router.route_mouse(&mouse(MouseEventKind::LButtonUp), &rc));
    }
}
