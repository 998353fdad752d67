use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::constants::FOCUS_HISTORY_CAPACITY;
use crate::dispatch::Dispatcher;
use crate::pane::{Pane, PaneRef, PaneWeak};
use crate::ui::{first_focusable_descendant, ElementRef, ElementWeak, UiElement};

use super::record::{FocusRecord, RestoreAttempt};

struct TrackedInstance {
    pane: PaneWeak,
    // Root captured at track time so ownership lookups never have to
    // borrow the pane cell (the lookup can run re-entrantly from inside
    // a pane's own lifecycle hook).
    root: ElementWeak,
}

/// RAII token that pauses focus recording for as long as it is alive.
/// Useful around bulk UI rebuilds, where transient focus churn would
/// otherwise pollute the history. Nests; recording resumes when the
/// last guard drops.
pub struct SuspendGuard {
    depth: Rc<Cell<usize>>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Single source of truth for "what had keyboard focus".
///
/// The hosting UI layer pushes raw focus-gained/lost signals in via
/// `on_focus_gained`/`on_focus_lost`; restoration walks a fallback
/// chain that by construction always lands somewhere as long as a main
/// window exists. Restoration against a still-loading subtree is
/// deferred through the element's ready signal and the dispatcher
/// rather than failing.
pub struct FocusCoordinator {
    history: VecDeque<FocusRecord>,
    last_by_pane: BTreeMap<String, FocusRecord>,
    tracked: BTreeMap<String, Vec<TrackedInstance>>,
    main_window: Option<ElementWeak>,
    suspend_depth: Rc<Cell<usize>>,
    dispatcher: Dispatcher,
}

impl FocusCoordinator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            history: VecDeque::new(),
            last_by_pane: BTreeMap::new(),
            tracked: BTreeMap::new(),
            main_window: None,
            suspend_depth: Rc::new(Cell::new(0)),
            dispatcher,
        }
    }

    /// Last-resort focus target once every pane-level candidate is
    /// exhausted.
    pub fn set_main_window(&mut self, element: &ElementRef) {
        self.main_window = Some(Rc::downgrade(element));
    }

    pub fn suspend(&self) -> SuspendGuard {
        self.suspend_depth.set(self.suspend_depth.get() + 1);
        SuspendGuard {
            depth: Rc::clone(&self.suspend_depth),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_depth.get() > 0
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent focus record, if any. The modal stack snapshots this
    /// when saving focus around an overlay.
    pub fn current_record(&self) -> Option<FocusRecord> {
        self.history.back().cloned()
    }

    pub fn last_record_for(&self, pane_name: &str) -> Option<FocusRecord> {
        self.last_by_pane.get(pane_name).cloned()
    }

    /// Last-resort focus target for callers outside the pane fallback
    /// chain (modal unwinding, shutdown). Callers invoke `focus()` on
    /// the returned element after releasing any borrow of the
    /// coordinator, since the host's focus signal re-enters it.
    pub fn main_window_element(&self) -> Option<ElementRef> {
        self.main_window.as_ref().and_then(Weak::upgrade)
    }

    /// Raw focus-gained signal from the UI host. Interactive elements
    /// are recorded with their input state; structural elements and
    /// anything seen while recording is suspended are ignored.
    pub fn on_focus_gained(&mut self, element: &ElementRef) {
        if self.is_suspended() {
            return;
        }
        let kind = element.kind();
        if !kind.is_interactive() {
            return;
        }
        let pane_name = self.owning_pane(element);
        let record = FocusRecord::capture(element, pane_name.clone());
        tracing::trace!(kind = ?kind, pane = ?pane_name, "focus recorded");
        self.history.push_back(record.clone());
        if self.history.len() > FOCUS_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        if let Some(name) = pane_name {
            self.last_by_pane.insert(name, record);
        }
    }

    /// Raw focus-lost signal. The element's input state may have changed
    /// while it held focus, so the newest matching records are
    /// refreshed to the state at hand-off.
    pub fn on_focus_lost(&mut self, element: &ElementRef) {
        if self.is_suspended() {
            return;
        }
        if let Some(record) = self
            .history
            .iter_mut()
            .rev()
            .find(|record| record.refers_to(element))
        {
            record.refresh_state();
        }
        for record in self.last_by_pane.values_mut() {
            if record.refers_to(element) {
                record.refresh_state();
            }
        }
    }

    /// Register a live pane instance under its logical name. Multiple
    /// concurrent instances may share a name.
    pub fn track_pane(&mut self, pane: &PaneRef) {
        let (name, root) = {
            let pane = pane.borrow();
            (pane.name().to_string(), pane.root())
        };
        tracing::debug!(pane = %name, "tracking pane");
        self.tracked.entry(name).or_default().push(TrackedInstance {
            pane: Rc::downgrade(pane),
            root: Rc::downgrade(&root),
        });
    }

    /// Deregister an instance. The name's focus history is purged only
    /// once no tracked instance under it remains alive.
    pub fn untrack_pane(&mut self, pane: &PaneRef) {
        let name = pane.borrow().name().to_string();
        let Some(instances) = self.tracked.get_mut(&name) else {
            tracing::warn!(pane = %name, "untrack for a pane that was never tracked");
            return;
        };
        let target = Rc::downgrade(pane);
        instances.retain(|instance| {
            instance.pane.strong_count() > 0 && !Weak::ptr_eq(&instance.pane, &target)
        });
        if instances.is_empty() {
            tracing::debug!(pane = %name, "last instance untracked, purging focus history");
            self.tracked.remove(&name);
            self.last_by_pane.remove(&name);
            self.history
                .retain(|record| record.pane_name() != Some(name.as_str()));
        }
    }

    pub fn tracked_instances(&self, pane_name: &str) -> usize {
        self.tracked
            .get(pane_name)
            .map_or(0, |instances| {
                instances
                    .iter()
                    .filter(|instance| instance.pane.strong_count() > 0)
                    .count()
            })
    }

    /// Logical owner of an element: walk the containment chain upward
    /// until an ancestor is some tracked instance's root.
    fn owning_pane(&self, element: &ElementRef) -> Option<String> {
        let mut current = Some(Rc::clone(element));
        while let Some(ancestor) = current {
            for (name, instances) in &self.tracked {
                for instance in instances {
                    if let Some(root) = instance.root.upgrade()
                        && Rc::ptr_eq(&root, &ancestor)
                    {
                        return Some(name.clone());
                    }
                }
            }
            current = ancestor.parent();
        }
        None
    }

    /// Restore keyboard focus into `pane`, trying in order: the pane's
    /// most recent focus record, the first focusable descendant of its
    /// root, the root itself, and finally the main window. A candidate
    /// whose subtree has not finished loading defers the whole attempt
    /// until its ready signal fires; only full exhaustion returns
    /// `false`.
    ///
    /// Takes the shared handle so deferred retries can re-enter after
    /// the original call has returned.
    pub fn restore_pane_focus(this: &Rc<RefCell<Self>>, pane: &PaneRef) -> bool {
        let (name, root) = {
            let pane = pane.borrow();
            (pane.name().to_string(), pane.root())
        };

        let record = this.borrow().last_by_pane.get(&name).cloned();
        if let Some(record) = record {
            match record.try_restore() {
                RestoreAttempt::Applied => return true,
                RestoreAttempt::NotLoaded(element) => {
                    Self::retry_when_ready(this, pane, &element);
                    return true;
                }
                RestoreAttempt::Dead => {}
            }
        }

        if let Some(candidate) = first_focusable_descendant(&root) {
            if !candidate.is_loaded() {
                Self::retry_when_ready(this, pane, &candidate);
                return true;
            }
            if candidate.focus() {
                return true;
            }
        }

        if !root.is_loaded() {
            Self::retry_when_ready(this, pane, &root);
            return true;
        }
        if root.focus() {
            return true;
        }

        let main = this
            .borrow()
            .main_window
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(main) = main
            && main.focus()
        {
            tracing::debug!(pane = %name, "focus fell back to the main window");
            return true;
        }

        tracing::warn!(pane = %name, "focus restoration exhausted every fallback");
        false
    }

    /// Re-run the whole restoration once `element` reports ready. The
    /// retry is scheduled through the dispatcher and silently abandoned
    /// if the pane or the coordinator is gone by then.
    fn retry_when_ready(this: &Rc<RefCell<Self>>, pane: &PaneRef, element: &ElementRef) {
        let dispatcher = this.borrow().dispatcher.clone();
        let coordinator = Rc::downgrade(this);
        let pane = Rc::downgrade(pane);
        tracing::trace!("restoration deferred until element is ready");
        element.on_ready(Box::new(move || {
            dispatcher.defer(move || {
                let (Some(coordinator), Some(pane)) = (coordinator.upgrade(), pane.upgrade())
                else {
                    tracing::trace!("deferred focus restoration abandoned");
                    return;
                };
                let _ = Self::restore_pane_focus(&coordinator, &pane);
            });
        }));
    }

    /// Drop the newest history entry and refocus the record beneath it,
    /// discarding stale or still-loading entries along the way.
    pub fn navigate_back(this: &Rc<RefCell<Self>>) -> bool {
        if this.borrow_mut().history.pop_back().is_none() {
            return false;
        }
        loop {
            let record = this.borrow_mut().history.pop_back();
            let Some(record) = record else {
                return false;
            };
            // A successful restore re-records itself through the host's
            // focus-gained signal, so popping here is not a loss.
            if matches!(record.try_restore(), RestoreAttempt::Applied) {
                return true;
            }
        }
    }
}

impl std::fmt::Debug for FocusCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusCoordinator")
            .field("history", &self.history.len())
            .field("tracked", &self.tracked.len())
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{BasicElement, ElementKind, FocusHub};

    fn coordinator() -> Rc<RefCell<FocusCoordinator>> {
        Rc::new(RefCell::new(FocusCoordinator::new(Dispatcher::new())))
    }

    #[test]
    fn history_is_bounded() {
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let elements: Vec<_> = (0..FOCUS_HISTORY_CAPACITY + 1)
            .map(|_| BasicElement::new(&hub, ElementKind::Button))
            .collect();
        let first = elements[0].as_element();
        for element in &elements {
            coordinator.borrow_mut().on_focus_gained(&element.as_element());
        }
        let inner = coordinator.borrow();
        assert_eq!(inner.history_len(), FOCUS_HISTORY_CAPACITY);
        // The oldest record was evicted.
        assert!(!inner
            .history
            .iter()
            .any(|record| record.refers_to(&first)));
    }

    #[test]
    fn structural_elements_are_not_recorded() {
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let splitter = BasicElement::new(&hub, ElementKind::Splitter);
        coordinator
            .borrow_mut()
            .on_focus_gained(&splitter.as_element());
        assert_eq!(coordinator.borrow().history_len(), 0);
    }

    #[test]
    fn suspension_guard_pauses_recording_and_resumes_on_drop() {
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let button = BasicElement::new(&hub, ElementKind::Button);
        {
            let guard = coordinator.borrow().suspend();
            coordinator
                .borrow_mut()
                .on_focus_gained(&button.as_element());
            assert_eq!(coordinator.borrow().history_len(), 0);
            drop(guard);
        }
        coordinator
            .borrow_mut()
            .on_focus_gained(&button.as_element());
        assert_eq!(coordinator.borrow().history_len(), 1);
    }

    #[test]
    fn focus_lost_refreshes_captured_state() {
        use crate::ui::ControlState;
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let input = BasicElement::new(&hub, ElementKind::TextInput);
        input.set_state(ControlState::Text {
            text: "a".into(),
            caret: 1,
            selection: None,
        });
        coordinator.borrow_mut().on_focus_gained(&input.as_element());
        input.set_state(ControlState::Text {
            text: "ab".into(),
            caret: 2,
            selection: None,
        });
        coordinator.borrow_mut().on_focus_lost(&input.as_element());
        let record = coordinator.borrow().current_record().unwrap();
        assert_eq!(
            record.state(),
            Some(&ControlState::Text {
                text: "ab".into(),
                caret: 2,
                selection: None,
            })
        );
    }

    #[test]
    fn navigate_back_restores_previous_entry() {
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let first = BasicElement::new(&hub, ElementKind::Button);
        let second = BasicElement::new(&hub, ElementKind::Button);
        coordinator.borrow_mut().on_focus_gained(&first.as_element());
        coordinator
            .borrow_mut()
            .on_focus_gained(&second.as_element());

        assert!(FocusCoordinator::navigate_back(&coordinator));
        assert!(Rc::ptr_eq(
            &hub.focused().unwrap(),
            &first.as_element()
        ));
    }

    #[test]
    fn navigate_back_skips_dead_entries() {
        let hub = FocusHub::new();
        let coordinator = coordinator();
        let survivor = BasicElement::new(&hub, ElementKind::Button);
        coordinator
            .borrow_mut()
            .on_focus_gained(&survivor.as_element());
        {
            let ephemeral = BasicElement::new(&hub, ElementKind::Button);
            coordinator
                .borrow_mut()
                .on_focus_gained(&ephemeral.as_element());
            let top = BasicElement::new(&hub, ElementKind::Button);
            coordinator.borrow_mut().on_focus_gained(&top.as_element());
            drop(top);
        }
        // Top and the entry beneath it are both gone; the walk lands on
        // the survivor.
        assert!(FocusCoordinator::navigate_back(&coordinator));
        assert!(Rc::ptr_eq(
            &hub.focused().unwrap(),
            &survivor.as_element()
        ));
    }
}
