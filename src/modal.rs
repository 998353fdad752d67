use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent};

use crate::dispatch::Dispatcher;
use crate::error::ShellError;
use crate::focus::{FocusCoordinator, FocusRecord, RestoreAttempt};
use crate::ui::{ElementRef, UiElement};

pub type ModalRef = Rc<RefCell<dyn Modal>>;

/// Overlay content capability. Accept/cancel handlers return whether the
/// modal wants to close as a result of the key; returning `false` keeps
/// it open (the key is still consumed by the stack).
pub trait Modal {
    fn name(&self) -> &str;

    /// Root of the modal's content subtree, wrapped by the host overlay.
    fn root(&self) -> ElementRef;

    fn show(&mut self);

    fn hide(&mut self);

    fn dispose(&mut self);

    /// Enter pressed while topmost.
    fn on_accept(&mut self) -> bool;

    /// Escape pressed while topmost.
    fn on_cancel(&mut self) -> bool;
}

/// Host capability for overlay chrome: wrapping modal content in a
/// backdrop layer, hit-test/input gating of the background, and the
/// close animation. `animate_close` must invoke `done` exactly once;
/// a host without animations calls it synchronously.
pub trait OverlayHost {
    fn attach_overlay(&self, content: &ElementRef) -> ElementRef;

    fn detach_overlay(&self, overlay: &ElementRef);

    fn set_background_input_enabled(&self, enabled: bool);

    fn animate_close(&self, overlay: &ElementRef, done: Box<dyn FnOnce()>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalResult {
    Accepted,
    Cancelled,
    /// Closed programmatically (drain, shutdown) rather than by a key.
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    Opened { name: String },
    Closed { name: String, result: ModalResult },
}

struct ModalEntry {
    modal: ModalRef,
    overlay: ElementRef,
    // What had focus when this entry was pushed; restored when the
    // entry comes back off the top of the stack.
    saved_focus: Option<FocusRecord>,
}

/// Ordered stack of open overlays. Only the top entry receives key
/// routing; background input is disabled exactly while the stack is
/// non-empty. Each entry saves and restores focus independently, so
/// nested dialogs unwind to the right place.
pub struct ModalStack {
    entries: Vec<ModalEntry>,
    host: Rc<dyn OverlayHost>,
    coordinator: Rc<RefCell<FocusCoordinator>>,
    dispatcher: Dispatcher,
    events: VecDeque<ModalEvent>,
}

impl ModalStack {
    pub fn new(
        host: Rc<dyn OverlayHost>,
        coordinator: Rc<RefCell<FocusCoordinator>>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            entries: Vec::new(),
            host,
            coordinator,
            dispatcher,
            events: VecDeque::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn top(&self) -> Option<ModalRef> {
        self.entries.last().map(|entry| Rc::clone(&entry.modal))
    }

    pub fn take_events(&mut self) -> Vec<ModalEvent> {
        self.events.drain(..).collect()
    }

    /// Push a modal: save the current focus target, wrap and display the
    /// overlay, and block background input.
    pub fn show_modal(this: &Rc<RefCell<Self>>, modal: ModalRef) {
        let (host, coordinator) = {
            let stack = this.borrow();
            (Rc::clone(&stack.host), Rc::clone(&stack.coordinator))
        };
        let saved_focus = coordinator.borrow().current_record();
        let (name, root) = {
            let modal = modal.borrow();
            (modal.name().to_string(), modal.root())
        };
        let overlay = host.attach_overlay(&root);
        host.set_background_input_enabled(false);
        modal.borrow_mut().show();
        tracing::debug!(modal = %name, "modal opened");
        let mut stack = this.borrow_mut();
        stack.entries.push(ModalEntry {
            modal,
            overlay,
            saved_focus,
        });
        stack.events.push_back(ModalEvent::Opened { name });
    }

    /// Close a modal — the top of the stack when `target` is `None`.
    /// Closing out of order is permitted: the entry is removed wherever
    /// it sits (with a warning), and its saved focus target is handed to
    /// the entry that was directly above it so the eventual unwinding
    /// still restores the pre-modal focus. Returns `false` for modals
    /// not on the stack.
    pub fn close_modal(
        this: &Rc<RefCell<Self>>,
        target: Option<&ModalRef>,
        result: ModalResult,
    ) -> bool {
        let (entry, was_top, host) = {
            let mut stack = this.borrow_mut();
            let index = match target {
                None => {
                    if stack.entries.is_empty() {
                        tracing::warn!("close requested on an empty modal stack");
                        return false;
                    }
                    stack.entries.len() - 1
                }
                Some(target) => {
                    let Some(index) = stack
                        .entries
                        .iter()
                        .position(|entry| Rc::ptr_eq(&entry.modal, target))
                    else {
                        let error = ShellError::UnknownModal {
                            name: target.borrow().name().to_string(),
                        };
                        tracing::warn!(error = %error, "close is a no-op");
                        return false;
                    };
                    index
                }
            };
            let was_top = index + 1 == stack.entries.len();
            let mut entry = stack.entries.remove(index);
            if !was_top {
                tracing::warn!(
                    modal = %entry.modal.borrow().name(),
                    "modal closed out of stack order"
                );
                // The entry above saved focus inside the modal being
                // removed; hand it the removed entry's save so the
                // unwind chain stays meaningful.
                if let Some(above) = stack.entries.get_mut(index) {
                    above.saved_focus = entry.saved_focus.take();
                }
            }
            (entry, was_top, Rc::clone(&stack.host))
        };

        entry.modal.borrow_mut().hide();

        let done_stack = Rc::downgrade(this);
        let dispatcher = this.borrow().dispatcher.clone();
        let modal = entry.modal;
        let overlay = entry.overlay;
        let saved_focus = entry.saved_focus;
        host.animate_close(
            &Rc::clone(&overlay),
            Box::new(move || {
                dispatcher.defer(move || {
                    let Some(stack) = done_stack.upgrade() else {
                        return;
                    };
                    Self::finish_close(&stack, modal, overlay, saved_focus, was_top, result);
                });
            }),
        );
        true
    }

    /// Completion of the close animation: detach the overlay, re-enable
    /// background input once the stack is empty, restore the saved focus
    /// target, dispose the modal, and announce the close.
    fn finish_close(
        this: &Rc<RefCell<Self>>,
        modal: ModalRef,
        overlay: ElementRef,
        saved_focus: Option<FocusRecord>,
        was_top: bool,
        result: ModalResult,
    ) {
        let (host, coordinator, now_empty) = {
            let stack = this.borrow();
            (
                Rc::clone(&stack.host),
                Rc::clone(&stack.coordinator),
                stack.entries.is_empty(),
            )
        };
        host.detach_overlay(&overlay);
        if now_empty {
            host.set_background_input_enabled(true);
        }
        if was_top {
            let restored = saved_focus
                .as_ref()
                .is_some_and(|record| matches!(record.try_restore(), RestoreAttempt::Applied));
            if !restored && now_empty {
                let main = coordinator.borrow().main_window_element();
                if !main.is_some_and(|main| main.focus()) {
                    tracing::warn!("no live focus target after modal close");
                }
            }
        }
        let name = {
            let mut modal = modal.borrow_mut();
            modal.dispose();
            modal.name().to_string()
        };
        tracing::debug!(modal = %name, result = ?result, "modal closed");
        let mut stack = this.borrow_mut();
        stack.events.push_back(ModalEvent::Closed { name, result });
    }

    /// Route Enter/Escape to the topmost modal. Other keys, or an empty
    /// stack, are not consumed.
    pub fn handle_key(this: &Rc<RefCell<Self>>, key: &KeyEvent) -> bool {
        let Some(top) = this.borrow().top() else {
            return false;
        };
        match key.code {
            KeyCode::Enter => {
                if top.borrow_mut().on_accept() {
                    Self::close_modal(this, Some(&top), ModalResult::Accepted);
                }
                true
            }
            KeyCode::Esc => {
                if top.borrow_mut().on_cancel() {
                    Self::close_modal(this, Some(&top), ModalResult::Cancelled);
                }
                true
            }
            _ => false,
        }
    }

    /// Drain the stack top-to-bottom, one close at a time.
    pub fn close_all(this: &Rc<RefCell<Self>>) {
        while this.borrow().is_open() {
            if !Self::close_modal(this, None, ModalResult::Dismissed) {
                break;
            }
        }
    }
}

impl std::fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalStack")
            .field("depth", &self.entries.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
