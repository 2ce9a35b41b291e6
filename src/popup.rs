//! Popup ownership for a host window.
//!
//! A window owns at most one popup at a time. Opening a popup from the
//! control that owns the current one closes it instead (the toggle a menu
//! button expects), while opening a different popup replaces the current
//! one, closing it first.

/// The host's current popup, if any.
///
/// `W` is the popup handle type. Handles compare equal when they denote
/// the same popup surface.
#[derive(Debug, Default)]
pub struct PopupSlot<W> {
    current: Option<W>,
}

/// The outcome of [`PopupSlot::toggle`]. Any handle carried inside is no
/// longer owned by the slot and must be closed by the caller.
#[derive(Debug, PartialEq)]
pub enum PopupToggle<W> {
    /// The requested popup was already open; it has been removed from the
    /// slot and should be closed.
    Closed(W),
    /// The requested popup is now the current one. If a different popup
    /// was open before, it is carried here for the caller to close.
    Opened { replaced: Option<W> },
}

impl<W: PartialEq> PopupSlot<W> {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<&W> {
        self.current.as_ref()
    }

    /// Request `popup` to be shown.
    pub fn toggle(&mut self, popup: W) -> PopupToggle<W> {
        match self.current.take() {
            Some(cur) if cur == popup => PopupToggle::Closed(cur),
            replaced => {
                self.current = Some(popup);
                PopupToggle::Opened { replaced }
            }
        }
    }

    /// Remove the current popup from the slot, if any. The caller closes
    /// the returned handle.
    pub fn take(&mut self) -> Option<W> {
        self.current.take()
    }

    /// Forget `popup` if it is the current one. Used when the popup closes
    /// itself (e.g. on focus loss) and the host must not try to close it
    /// again.
    pub fn forget(&mut self, popup: &W) -> bool {
        if self.current.as_ref() == Some(popup) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_same_popup_closes_it() {
        let mut slot = PopupSlot::new();
        assert_eq!(slot.toggle(7), PopupToggle::Opened { replaced: None });
        assert_eq!(slot.current(), Some(&7));

        assert_eq!(slot.toggle(7), PopupToggle::Closed(7));
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn different_popup_replaces_the_open_one() {
        let mut slot = PopupSlot::new();
        slot.toggle(1);
        assert_eq!(slot.toggle(2), PopupToggle::Opened { replaced: Some(1) });
        assert_eq!(slot.current(), Some(&2));
    }

    #[test]
    fn forget_only_drops_the_matching_popup() {
        let mut slot = PopupSlot::new();
        slot.toggle(1);
        assert!(!slot.forget(&2));
        assert_eq!(slot.current(), Some(&1));
        assert!(slot.forget(&1));
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn self_closed_popup_leaves_no_stale_handle() {
        let mut slot = PopupSlot::new();
        slot.toggle(3);

        // The popup dismissed itself (focus loss); the host forgets it and
        // its next click finds nothing left to close.
        assert!(slot.forget(&3));
        assert_eq!(slot.take(), None);

        // Re-opening the same popup afterwards is a plain open, not a
        // toggle-close.
        assert_eq!(slot.toggle(3), PopupToggle::Opened { replaced: None });
    }

    #[test]
    fn take_empties_the_slot() {
        let mut slot = PopupSlot::new();
        slot.toggle(5);
        assert_eq!(slot.take(), Some(5));
        assert_eq!(slot.take(), None);
    }
}
