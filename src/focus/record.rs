use std::rc::Rc;
use std::time::Instant;

use crate::ui::{ControlState, ElementKind, ElementRef, ElementWeak, UiElement};

/// Outcome of a single restoration attempt against a recorded element.
pub enum RestoreAttempt {
    /// Focus applied (and control state re-applied where captured).
    Applied,
    /// The element is alive but its subtree has not finished loading;
    /// the caller may register a ready callback and retry.
    NotLoaded(ElementRef),
    /// The element is gone or refused focus; fall through to the next
    /// candidate.
    Dead,
}

impl std::fmt::Debug for RestoreAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreAttempt::Applied => f.write_str("Applied"),
            RestoreAttempt::NotLoaded(element) => {
                f.debug_tuple("NotLoaded").field(&element.kind()).finish()
            }
            RestoreAttempt::Dead => f.write_str("Dead"),
        }
    }
}

/// Captured snapshot of a focused element: identity (weak, never keeps
/// the element alive), kind, owning pane name when resolvable, and the
/// kind-specific input state at capture time.
#[derive(Clone)]
pub struct FocusRecord {
    element: ElementWeak,
    kind: ElementKind,
    pane_name: Option<String>,
    recorded_at: Instant,
    state: Option<ControlState>,
}

impl FocusRecord {
    pub fn capture(element: &ElementRef, pane_name: Option<String>) -> Self {
        Self {
            element: Rc::downgrade(element),
            kind: element.kind(),
            pane_name,
            recorded_at: Instant::now(),
            state: element.capture_state(),
        }
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.element.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.element.strong_count() > 0
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn pane_name(&self) -> Option<&str> {
        self.pane_name.as_deref()
    }

    pub fn recorded_at(&self) -> Instant {
        self.recorded_at
    }

    pub fn state(&self) -> Option<&ControlState> {
        self.state.as_ref()
    }

    pub fn refers_to(&self, element: &ElementRef) -> bool {
        self.element()
            .is_some_and(|recorded| Rc::ptr_eq(&recorded, element))
    }

    /// Re-capture the element's current input state, keeping identity
    /// and timestamp.
    pub fn refresh_state(&mut self) {
        if let Some(element) = self.element() {
            self.state = element.capture_state();
        }
    }

    /// Attempt to focus the recorded element and re-apply its captured
    /// state. Never panics and never errors; staleness degrades to
    /// `Dead`.
    pub fn try_restore(&self) -> RestoreAttempt {
        let Some(element) = self.element() else {
            return RestoreAttempt::Dead;
        };
        if !element.is_loaded() {
            return RestoreAttempt::NotLoaded(element);
        }
        if !element.focus() {
            return RestoreAttempt::Dead;
        }
        if let Some(state) = &self.state {
            element.restore_state(state);
        }
        RestoreAttempt::Applied
    }
}

impl std::fmt::Debug for FocusRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusRecord")
            .field("kind", &self.kind)
            .field("pane", &self.pane_name)
            .field("alive", &self.is_alive())
            .field("state", &self.state)
            .finish()
    }
}
