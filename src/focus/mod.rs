pub mod coordinator;
pub mod record;

pub use coordinator::{FocusCoordinator, SuspendGuard};
pub use record::{FocusRecord, RestoreAttempt};
