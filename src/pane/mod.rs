pub mod pane_manager;

pub use pane_manager::PaneManager;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::HookResult;
use crate::ui::ElementRef;

pub type PaneRef = Rc<RefCell<dyn Pane>>;
pub type PaneWeak = Weak<RefCell<dyn Pane>>;

/// Stable per-instance key used by the layout tree. Monotonically
/// increasing, never reused within a manager's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PaneId(pub u64);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pane#{}", self.0)
    }
}

/// Content capability. A pane is an opaque content unit identified by a
/// stable type name; several instances may share one name. The manager
/// owns an instance exclusively from open to close and disposes it on
/// close.
///
/// Lifecycle hooks return `Err` for content failures; the shell logs
/// and isolates those rather than letting them abort batch operations.
pub trait Pane {
    /// Stable type name; doubles as the logical pane id.
    fn name(&self) -> &str;

    fn initialize(&mut self) -> HookResult;

    fn dispose(&mut self) -> HookResult;

    fn set_active(&mut self, active: bool) -> HookResult;

    /// Root of the pane's UI subtree.
    fn root(&self) -> ElementRef;
}

/// Constructs pane instances by type name for workspace-state
/// restoration. Implemented by the host; unknown names yield `None`.
pub trait PaneFactory {
    fn create(&self, type_name: &str) -> Option<PaneRef>;
}

/// Lifecycle notifications drained by the host loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    PaneOpened { id: PaneId, name: String },
    PaneClosed { id: PaneId, name: String },
    PaneFocusChanged {
        previous: Option<PaneId>,
        current: Option<PaneId>,
    },
}

/// Serializable workspace snapshot: ordered open-pane type names plus
/// which of them holds focus. The wire format is owned by the host's
/// persistence layer; this type only needs to round-trip through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneManagerState {
    pub open_pane_type_names: Vec<String>,
    pub focused_pane_index: Option<usize>,
}
