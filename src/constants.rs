//! Shared crate-wide constants.

/// Maximum number of focus records retained in the global history stack.
///
/// The history is a bounded LIFO: once full, pushing a new record evicts
/// the oldest one. Fifty entries is enough to walk back through several
/// pane switches without the stack growing unbounded across a long
/// session.
pub const FOCUS_HISTORY_CAPACITY: usize = 50;

/// Default duration of the edge-navigation flash, in milliseconds.
///
/// Used when the host configuration does not override
/// `feedback_duration_ms`. Long enough to register, short enough not to
/// linger after the user has already moved on.
pub const DEFAULT_FEEDBACK_DURATION_MS: u64 = 150;
