use thiserror::Error;

/// Result type for pane and modal lifecycle hooks.
///
/// Content implementations surface their own failures through the boxed
/// error; the shell logs and isolates them rather than propagating.
pub type HookResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Error)]
pub enum ShellError {
    /// A pane lifecycle hook (`initialize`, `set_active`, `dispose`)
    /// reported a failure. Carried in logs and events only; the shell
    /// never aborts a batch operation because of one.
    #[error("pane `{name}` {hook} hook failed: {message}")]
    PaneHook {
        name: String,
        hook: &'static str,
        message: String,
    },

    /// An operation referenced a pane that is not currently open.
    #[error("pane `{name}` is not open")]
    UnknownPane { name: String },

    /// An operation referenced a modal that is not on the stack.
    #[error("modal `{name}` is not on the stack")]
    UnknownModal { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pane_hook_error_display_includes_context() {
        let err = ShellError::PaneHook {
            name: "tasks".into(),
            hook: "dispose",
            message: "boom".into(),
        };
        let text = err.to_string();
        assert!(text.contains("tasks"));
        assert!(text.contains("dispose"));
        assert!(text.contains("boom"));
    }
}
