use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{ControlState, ElementKind, ElementRef, ElementWeak, UiElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gained,
    Lost,
}

type FocusListener = Box<dyn Fn(&ElementRef, FocusChange)>;

/// Reference implementation of the host's global focus signaling.
///
/// Elements announce focus moves here; subscribers (typically a
/// forwarder into the focus coordinator) receive gained/lost
/// notifications in order: the old element loses focus before the new
/// one gains it.
#[derive(Default)]
pub struct FocusHub {
    focused: RefCell<Option<ElementWeak>>,
    listeners: RefCell<Vec<FocusListener>>,
}

impl FocusHub {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn subscribe(&self, listener: impl Fn(&ElementRef, FocusChange) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn focused(&self) -> Option<ElementRef> {
        self.focused.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn announce_focus(&self, element: &ElementRef) {
        let previous = self.focused();
        if let Some(previous) = &previous
            && Rc::ptr_eq(previous, element)
        {
            return;
        }
        *self.focused.borrow_mut() = Some(Rc::downgrade(element));
        if let Some(previous) = previous {
            self.notify(&previous, FocusChange::Lost);
        }
        self.notify(element, FocusChange::Gained);
    }

    fn notify(&self, element: &ElementRef, change: FocusChange) {
        // Take a snapshot of listener count first; listeners may not
        // subscribe re-entrantly during notification.
        let listeners = self.listeners.borrow();
        for listener in listeners.iter() {
            listener(element, change);
        }
    }
}

impl std::fmt::Debug for FocusHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusHub")
            .field("has_focus", &self.focused().is_some())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

/// Reference `UiElement` implementation: a plain single-threaded element
/// tree with explicit loaded/focusable flags and one-shot ready
/// callbacks. Hosts with a real widget toolkit implement `UiElement`
/// over their own types instead; the demo binary and the test suite use
/// this one.
pub struct BasicElement {
    kind: ElementKind,
    label: RefCell<String>,
    focusable: Cell<bool>,
    loaded: Cell<bool>,
    state: RefCell<Option<ControlState>>,
    children: RefCell<Vec<Rc<BasicElement>>>,
    parent: RefCell<Weak<BasicElement>>,
    ready: RefCell<Vec<Box<dyn FnOnce()>>>,
    hub: Rc<FocusHub>,
    self_weak: Weak<BasicElement>,
}

impl BasicElement {
    pub fn new(hub: &Rc<FocusHub>, kind: ElementKind) -> Rc<Self> {
        Rc::new_cyclic(|self_weak| Self {
            kind,
            label: RefCell::new(String::new()),
            focusable: Cell::new(kind.is_interactive()),
            loaded: Cell::new(true),
            state: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            ready: RefCell::new(Vec::new()),
            hub: Rc::clone(hub),
            self_weak: self_weak.clone(),
        })
    }

    pub fn container(hub: &Rc<FocusHub>) -> Rc<Self> {
        Self::new(hub, ElementKind::Container)
    }

    pub fn with_label(hub: &Rc<FocusHub>, kind: ElementKind, label: &str) -> Rc<Self> {
        let element = Self::new(hub, kind);
        element.set_label(label);
        element
    }

    pub fn as_element(self: &Rc<Self>) -> ElementRef {
        let element: ElementRef = self.clone();
        element
    }

    pub fn add_child(parent: &Rc<Self>, child: &Rc<Self>) {
        *child.parent.borrow_mut() = Rc::downgrade(parent);
        parent.children.borrow_mut().push(Rc::clone(child));
    }

    pub fn remove_child(parent: &Rc<Self>, child: &Rc<Self>) {
        parent
            .children
            .borrow_mut()
            .retain(|existing| !Rc::ptr_eq(existing, child));
        *child.parent.borrow_mut() = Weak::new();
    }

    pub fn label(&self) -> String {
        self.label.borrow().clone()
    }

    pub fn set_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }

    pub fn set_focusable(&self, focusable: bool) {
        self.focusable.set(focusable);
    }

    /// Flip the loaded flag. Transitioning to loaded fires any pending
    /// one-shot ready callbacks, in registration order.
    pub fn set_loaded(&self, loaded: bool) {
        let was = self.loaded.replace(loaded);
        if loaded && !was {
            let callbacks = std::mem::take(&mut *self.ready.borrow_mut());
            for callback in callbacks {
                callback();
            }
        }
    }

    pub fn hub(&self) -> Rc<FocusHub> {
        Rc::clone(&self.hub)
    }

    pub fn set_state(&self, state: ControlState) {
        *self.state.borrow_mut() = Some(state);
    }
}

impl UiElement for BasicElement {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn is_focusable(&self) -> bool {
        self.focusable.get()
    }

    fn parent(&self) -> Option<ElementRef> {
        self.parent.borrow().upgrade().map(|parent| {
            let element: ElementRef = parent;
            element
        })
    }

    fn children(&self) -> Vec<ElementRef> {
        self.children
            .borrow()
            .iter()
            .map(|child| {
                let element: ElementRef = child.clone();
                element
            })
            .collect()
    }

    fn focus(&self) -> bool {
        if !self.loaded.get() || !self.focusable.get() {
            return false;
        }
        let Some(this) = self.self_weak.upgrade() else {
            return false;
        };
        self.hub.announce_focus(&this.as_element());
        true
    }

    fn capture_state(&self) -> Option<ControlState> {
        self.state.borrow().clone()
    }

    fn restore_state(&self, state: &ControlState) {
        *self.state.borrow_mut() = Some(state.clone());
    }

    fn on_ready(&self, callback: Box<dyn FnOnce()>) {
        if self.loaded.get() {
            callback();
        } else {
            self.ready.borrow_mut().push(callback);
        }
    }
}

impl std::fmt::Debug for BasicElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicElement")
            .field("kind", &self.kind)
            .field("label", &self.label.borrow())
            .field("loaded", &self.loaded.get())
            .field("focusable", &self.focusable.get())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}
