pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod focus;
pub mod layout;
pub mod modal;
pub mod pane;
pub mod theme;
pub mod tracing_sub;
pub mod ui;

pub use config::ShellConfig;
pub use dispatch::Dispatcher;
pub use feedback::NavigationFeedback;
pub use focus::{FocusCoordinator, FocusRecord};
pub use layout::{Direction, InsertPosition, LayoutNode, TilingLayout, TilingMode};
pub use modal::{Modal, ModalEvent, ModalResult, ModalStack, OverlayHost};
pub use pane::{Pane, PaneFactory, PaneId, PaneManager, PaneManagerState, ShellEvent};
pub use ui::{BasicElement, ControlState, ElementKind, FocusHub, UiElement};
