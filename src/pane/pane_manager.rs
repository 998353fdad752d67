use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use ratatui::prelude::Rect;

use crate::dispatch::Dispatcher;
use crate::error::ShellError;
use crate::feedback::NavigationFeedback;
use crate::focus::FocusCoordinator;
use crate::layout::{Direction, TilingLayout, TilingMode};

use super::{Pane, PaneFactory, PaneId, PaneManagerState, PaneRef, ShellEvent};

fn log_hook_failure(name: &str, hook: &'static str, error: &dyn std::error::Error) {
    let error = ShellError::PaneHook {
        name: name.to_string(),
        hook,
        message: error.to_string(),
    };
    tracing::warn!(error = %error, "pane hook failure isolated");
}

struct OpenPane {
    pane: PaneRef,
    name: String,
}

/// Orchestrator for the pane grid: opens and closes panes through the
/// layout engine, tracks the single focused pane, delegates real
/// keyboard focus to the coordinator's fallback chain, and emits
/// lifecycle events for the host to drain.
pub struct PaneManager {
    layout: TilingLayout<PaneId>,
    panes: BTreeMap<PaneId, OpenPane>,
    open_order: Vec<PaneId>,
    focused: Option<PaneId>,
    coordinator: Rc<RefCell<FocusCoordinator>>,
    dispatcher: Dispatcher,
    feedback: NavigationFeedback,
    area: Rect,
    next_pane_seq: u64,
    events: VecDeque<ShellEvent>,
}

impl PaneManager {
    pub fn new(
        coordinator: Rc<RefCell<FocusCoordinator>>,
        dispatcher: Dispatcher,
        feedback: NavigationFeedback,
    ) -> Self {
        Self {
            layout: TilingLayout::new(),
            panes: BTreeMap::new(),
            open_order: Vec::new(),
            focused: None,
            coordinator,
            dispatcher,
            feedback,
            area: Rect {
                x: 0,
                y: 0,
                width: 80,
                height: 24,
            },
            next_pane_seq: 0,
            events: VecDeque::new(),
        }
    }

    /// Canvas geometry the layout tiles into. Hosts call this on every
    /// resize.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn layout(&self) -> &TilingLayout<PaneId> {
        &self.layout
    }

    pub fn set_mode(&mut self, mode: TilingMode) {
        self.layout.set_mode(mode);
    }

    pub fn mode(&self) -> TilingMode {
        self.layout.mode()
    }

    pub fn open_count(&self) -> usize {
        self.open_order.len()
    }

    pub fn focused_pane(&self) -> Option<PaneId> {
        self.focused
    }

    pub fn pane(&self, id: PaneId) -> Option<PaneRef> {
        self.panes.get(&id).map(|open| Rc::clone(&open.pane))
    }

    pub fn pane_name(&self, id: PaneId) -> Option<&str> {
        self.panes.get(&id).map(|open| open.name.as_str())
    }

    /// Visible pane regions tiling the current canvas.
    pub fn regions(&self) -> Vec<(PaneId, Rect)> {
        self.layout.regions(self.area)
    }

    pub fn take_events(&mut self) -> Vec<ShellEvent> {
        self.events.drain(..).collect()
    }

    pub fn feedback(&self) -> &NavigationFeedback {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut NavigationFeedback {
        &mut self.feedback
    }

    fn id_of(&self, pane: &PaneRef) -> Option<PaneId> {
        self.panes
            .iter()
            .find(|(_, open)| Rc::ptr_eq(&open.pane, pane))
            .map(|(id, _)| *id)
    }

    /// Open a pane: initialize it, split the focused cell for it, and
    /// focus it. Opening an instance that is already open just refocuses
    /// it.
    pub fn open_pane(&mut self, pane: PaneRef) -> PaneId {
        if let Some(existing) = self.id_of(&pane) {
            tracing::debug!(pane = %existing, "already open, refocusing");
            self.focus_pane(existing);
            return existing;
        }
        let name = pane.borrow().name().to_string();
        if let Err(error) = pane.borrow_mut().initialize() {
            log_hook_failure(&name, "initialize", error.as_ref());
        }
        let id = PaneId(self.next_pane_seq);
        self.next_pane_seq += 1;
        self.layout.insert(id, self.focused);
        self.coordinator.borrow_mut().track_pane(&pane);
        self.panes.insert(
            id,
            OpenPane {
                pane,
                name: name.clone(),
            },
        );
        self.open_order.push(id);
        tracing::debug!(pane = %id, name = %name, "pane opened");
        self.events.push_back(ShellEvent::PaneOpened { id, name });
        self.focus_pane(id);
        id
    }

    /// Close a pane: remove its cell (siblings absorb the space),
    /// dispose it, and — when it held focus — move focus to the first
    /// remaining pane. Closing an unknown pane is a logged no-op.
    pub fn close_pane(&mut self, id: PaneId) -> bool {
        let Some(open) = self.panes.remove(&id) else {
            let error = ShellError::UnknownPane {
                name: id.to_string(),
            };
            tracing::warn!(error = %error, "close is a no-op");
            return false;
        };
        self.layout.remove(id);
        self.open_order.retain(|open_id| *open_id != id);
        self.coordinator.borrow_mut().untrack_pane(&open.pane);
        if let Err(error) = open.pane.borrow_mut().dispose() {
            log_hook_failure(&open.name, "dispose", error.as_ref());
        }
        tracing::debug!(pane = %id, name = %open.name, "pane closed");
        self.events.push_back(ShellEvent::PaneClosed {
            id,
            name: open.name,
        });
        if self.focused == Some(id) {
            self.focused = None;
            if let Some(&next) = self.open_order.first() {
                self.focus_pane(next);
            } else {
                self.events.push_back(ShellEvent::PaneFocusChanged {
                    previous: Some(id),
                    current: None,
                });
            }
        }
        true
    }

    pub fn close_pane_ref(&mut self, pane: &PaneRef) -> bool {
        match self.id_of(pane) {
            Some(id) => self.close_pane(id),
            None => {
                tracing::warn!("close requested for a pane instance that is not open");
                false
            }
        }
    }

    pub fn close_focused_pane(&mut self) -> bool {
        match self.focused {
            Some(id) => self.close_pane(id),
            None => false,
        }
    }

    /// Close every open pane. A failing dispose hook never stops the
    /// drain.
    pub fn close_all(&mut self) {
        for id in self.open_order.clone() {
            self.close_pane(id);
        }
    }

    /// Make `id` the focused pane: deactivate the old one, activate the
    /// new one, and schedule real keyboard focus through the
    /// coordinator's fallback chain on the next dispatch pass (giving a
    /// freshly built subtree time to finish loading).
    pub fn focus_pane(&mut self, id: PaneId) -> bool {
        if !self.panes.contains_key(&id) {
            let error = ShellError::UnknownPane {
                name: id.to_string(),
            };
            tracing::warn!(error = %error, "focus is a no-op");
            return false;
        }
        if self.focused == Some(id) {
            self.defer_focus_restore(id);
            return true;
        }
        let previous = self.focused;
        if let Some(previous) = previous
            && let Some(open) = self.panes.get(&previous)
        {
            if let Err(error) = open.pane.borrow_mut().set_active(false) {
                log_hook_failure(&open.name, "set_active", error.as_ref());
            }
        }
        if let Some(open) = self.panes.get(&id)
            && let Err(error) = open.pane.borrow_mut().set_active(true)
        {
            log_hook_failure(&open.name, "set_active", error.as_ref());
        }
        self.focused = Some(id);
        self.layout.reveal(id);
        self.events.push_back(ShellEvent::PaneFocusChanged {
            previous,
            current: Some(id),
        });
        self.defer_focus_restore(id);
        true
    }

    fn defer_focus_restore(&self, id: PaneId) {
        let Some(open) = self.panes.get(&id) else {
            return;
        };
        let coordinator = Rc::clone(&self.coordinator);
        let pane = Rc::downgrade(&open.pane);
        self.dispatcher.defer(move || {
            let Some(pane) = pane.upgrade() else {
                return;
            };
            let _ = FocusCoordinator::restore_pane_focus(&coordinator, &pane);
        });
    }

    /// Move focus to the neighboring pane in the given direction. At the
    /// edge of the grid the focused pane and the tree stay untouched and
    /// the feedback collaborator fires once.
    pub fn navigate_focus(&mut self, direction: Direction) -> bool {
        let Some(focused) = self.focused else {
            self.feedback.signal_edge(direction);
            return false;
        };
        match self.layout.find_in_direction(focused, direction, self.area) {
            Some(neighbor) => self.focus_pane(neighbor),
            None => {
                self.feedback.signal_edge(direction);
                false
            }
        }
    }

    /// Swap the focused pane's cell with its neighbor in the given
    /// direction. Focus stays on the moved pane.
    pub fn move_pane(&mut self, direction: Direction) -> bool {
        let Some(focused) = self.focused else {
            self.feedback.signal_edge(direction);
            return false;
        };
        match self.layout.find_in_direction(focused, direction, self.area) {
            Some(neighbor) => self.layout.swap(focused, neighbor),
            None => {
                self.feedback.signal_edge(direction);
                false
            }
        }
    }

    /// Serializable snapshot: open pane type names in opening order plus
    /// the focused index.
    pub fn state(&self) -> PaneManagerState {
        PaneManagerState {
            open_pane_type_names: self
                .open_order
                .iter()
                .filter_map(|id| self.panes.get(id))
                .map(|open| open.name.clone())
                .collect(),
            focused_pane_index: self
                .focused
                .and_then(|focused| self.open_order.iter().position(|id| *id == focused)),
        }
    }

    /// Reopen a saved workspace from caller-constructed pane instances,
    /// supplied in snapshot order.
    pub fn restore_state(&mut self, state: &PaneManagerState, panes: Vec<PaneRef>) {
        if panes.len() != state.open_pane_type_names.len() {
            tracing::warn!(
                expected = state.open_pane_type_names.len(),
                supplied = panes.len(),
                "restore called with a mismatched pane list"
            );
        }
        let ids: Vec<PaneId> = panes.into_iter().map(|pane| self.open_pane(pane)).collect();
        if let Some(index) = state.focused_pane_index
            && let Some(&id) = ids.get(index)
        {
            self.focus_pane(id);
        }
    }

    /// Reopen a saved workspace, constructing instances through the
    /// factory. Type names the factory does not recognize are skipped
    /// with a warning.
    pub fn restore_state_with(&mut self, state: &PaneManagerState, factory: &dyn PaneFactory) {
        let mut by_index: Vec<Option<PaneId>> = Vec::with_capacity(state.open_pane_type_names.len());
        for name in &state.open_pane_type_names {
            match factory.create(name) {
                Some(pane) => by_index.push(Some(self.open_pane(pane))),
                None => {
                    tracing::warn!(pane = %name, "factory cannot construct pane type");
                    by_index.push(None);
                }
            }
        }
        if let Some(index) = state.focused_pane_index
            && let Some(Some(id)) = by_index.get(index)
        {
            self.focus_pane(*id);
        }
    }
}

impl std::fmt::Debug for PaneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneManager")
            .field("open", &self.open_order.len())
            .field("focused", &self.focused)
            .field("mode", &self.layout.mode())
            .finish()
    }
}
