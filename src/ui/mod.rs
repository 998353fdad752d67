pub mod element;

pub use element::{BasicElement, FocusChange, FocusHub};

use std::collections::VecDeque;
use std::rc::{Rc, Weak};

pub type ElementRef = Rc<dyn UiElement>;
pub type ElementWeak = Weak<dyn UiElement>;

/// What kind of control an element is. Drives which input state gets
/// captured alongside a focus record and whether the element is a
/// restoration candidate at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    List,
    Tree,
    ComboBox,
    Button,
    CheckBox,
    RadioButton,
    /// Generic grouping container. Traversed but never focused directly
    /// unless a host marks it focusable (pane roots do this).
    Container,
    /// Purely structural chrome (splitters, separators). Never a
    /// restoration candidate.
    Splitter,
}

impl ElementKind {
    /// Kinds whose focus-gained signals are worth recording.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            Self::TextInput
                | Self::List
                | Self::Tree
                | Self::ComboBox
                | Self::Button
                | Self::CheckBox
                | Self::RadioButton
        )
    }

    pub fn is_structural(self) -> bool {
        matches!(self, Self::Container | Self::Splitter)
    }
}

/// Kind-specific input state captured when an element gains focus and
/// re-applied on restoration.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
    Text {
        text: String,
        caret: usize,
        selection: Option<(usize, usize)>,
    },
    List {
        selected: Option<usize>,
        scroll_offset: usize,
    },
    Tree {
        selected_path: Vec<usize>,
    },
    Combo {
        selected: Option<usize>,
        text: String,
    },
    Toggle {
        checked: bool,
    },
}

/// Capability the hosting UI layer implements for every element the shell
/// core needs to reason about.
///
/// All methods take `&self`; implementations use interior mutability, in
/// keeping with the single-thread `Rc`/`RefCell` model of the crate.
pub trait UiElement {
    fn kind(&self) -> ElementKind;

    /// Whether the element's visual subtree has finished constructing and
    /// the element can actually receive focus right now.
    fn is_loaded(&self) -> bool;

    fn is_focusable(&self) -> bool;

    fn parent(&self) -> Option<ElementRef>;

    fn children(&self) -> Vec<ElementRef>;

    /// Ask the host to move real keyboard focus here. Returns whether the
    /// host accepted; a loaded, focusable element is expected to accept.
    fn focus(&self) -> bool;

    fn capture_state(&self) -> Option<ControlState>;

    fn restore_state(&self, state: &ControlState);

    /// Register a one-shot callback fired when the element becomes
    /// loaded. Fired immediately if it already is.
    fn on_ready(&self, callback: Box<dyn FnOnce()>);
}

/// Breadth-first search for the first focusable, non-structural element
/// in a subtree. The root itself is a candidate only when it is not
/// structural; structural elements are traversed through, not returned.
pub fn first_focusable_descendant(root: &ElementRef) -> Option<ElementRef> {
    let mut queue: VecDeque<ElementRef> = VecDeque::new();
    queue.push_back(Rc::clone(root));
    while let Some(element) = queue.pop_front() {
        if !element.kind().is_structural() && element.is_focusable() {
            return Some(element);
        }
        for child in element.children() {
            queue.push_back(child);
        }
    }
    None
}
