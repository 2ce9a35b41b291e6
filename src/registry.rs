//! The per-window named-control map.
//!
//! Windows expose controls to scripting and styling by name. The map holds
//! weak references; a detached control leaves its name registered but the
//! slot empty, so a later lookup distinguishes "never existed" from
//! "existed and went away".
use std::collections::HashMap;
use std::rc::Rc;

use crate::iface::{same_control, ControlRc, ControlWeak};

#[derive(Default)]
pub struct NamedControlMap {
    map: HashMap<String, Option<ControlWeak>>,
}

impl NamedControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ctrl` under `name`, displacing a previous holder of the
    /// name. Re-using the name of a still-live control is a caller bug.
    pub fn insert(&mut self, name: &str, ctrl: &ControlRc) {
        let slot = self.map.entry(name.to_owned()).or_insert(None);
        debug_assert!(
            slot.as_ref().and_then(|w| w.upgrade()).is_none(),
            "control name {:?} is already taken",
            name
        );
        *slot = Some(Rc::downgrade(ctrl));
    }

    /// Look up a control by name. Returns `None` both for unknown names
    /// and for names whose control has been detached.
    pub fn get(&self, name: &str) -> Option<ControlRc> {
        self.map.get(name)?.as_ref()?.upgrade()
    }

    /// `true` if `name` was ever registered, even if its control is gone.
    pub fn is_registered(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Empty every slot referring to `ctrl`, keeping the names registered.
    pub fn control_detached(&mut self, ctrl: &ControlRc) {
        for slot in self.map.values_mut() {
            let gone = slot
                .as_ref()
                .and_then(|w| w.upgrade())
                .map_or(false, |c| same_control(&c, ctrl));
            if gone {
                *slot = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface::Control;

    struct Dummy;
    impl Control for Dummy {}

    fn ctrl() -> ControlRc {
        Rc::new(Dummy)
    }

    #[test]
    fn lookup_returns_the_registered_control() {
        let mut map = NamedControlMap::new();
        let c = ctrl();
        map.insert("ok_button", &c);
        assert!(same_control(&map.get("ok_button").unwrap(), &c));
        assert!(map.get("cancel_button").is_none());
    }

    #[test]
    fn detach_empties_the_slot_but_keeps_the_name() {
        let mut map = NamedControlMap::new();
        let c = ctrl();
        map.insert("ok_button", &c);

        map.control_detached(&c);
        assert!(map.get("ok_button").is_none());
        assert!(map.is_registered("ok_button"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn a_dropped_control_reads_as_absent() {
        let mut map = NamedControlMap::new();
        {
            let c = ctrl();
            map.insert("ephemeral", &c);
        }
        assert!(map.get("ephemeral").is_none());
        assert!(map.is_registered("ephemeral"));
    }

    #[test]
    fn emptied_name_can_be_reused() {
        let mut map = NamedControlMap::new();
        let a = ctrl();
        map.insert("slot", &a);
        map.control_detached(&a);

        let b = ctrl();
        map.insert("slot", &b);
        assert!(same_control(&map.get("slot").unwrap(), &b));
        assert_eq!(map.len(), 1);
    }
}
