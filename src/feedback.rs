use std::time::Instant;

use ratatui::style::Color;

use crate::config::ShellConfig;
use crate::layout::Direction;
use crate::theme;

/// An armed edge flash: the renderer paints the boundary on the flashed
/// side until the deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct EdgeFlash {
    pub direction: Direction,
    pub color: Color,
    pub until: Instant,
}

/// Visual/audio cue for a directional move that hit the edge of the
/// grid. Purely cosmetic: never touches layout or focus state, and
/// disabled toggles make it a no-op.
#[derive(Debug)]
pub struct NavigationFeedback {
    config: ShellConfig,
    flash: Option<EdgeFlash>,
    bell_pending: bool,
    last_signal: Option<Direction>,
}

impl NavigationFeedback {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            flash: None,
            bell_pending: false,
            last_signal: None,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn signal_edge(&mut self, direction: Direction) {
        tracing::debug!(direction = ?direction, "navigation hit the grid edge");
        self.last_signal = Some(direction);
        if self.config.enable_visual_feedback {
            self.flash = Some(EdgeFlash {
                direction,
                color: theme::edge_flash(),
                until: Instant::now() + self.config.feedback_duration(),
            });
        }
        if self.config.enable_audio_feedback {
            self.bell_pending = true;
        }
    }

    /// The flash to render, if one is armed and not yet expired.
    pub fn active_flash(&self) -> Option<EdgeFlash> {
        self.flash
            .filter(|flash| Instant::now() < flash.until)
    }

    /// Drain the pending bell cue; the host emits the actual alert.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// Drain the most recent edge signal. One signal per failed move.
    pub fn take_signal(&mut self) -> Option<Direction> {
        self.last_signal.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_arms_flash_and_drains_once() {
        let mut feedback = NavigationFeedback::new(ShellConfig::default());
        feedback.signal_edge(Direction::Left);
        assert!(feedback.active_flash().is_some());
        assert_eq!(feedback.take_signal(), Some(Direction::Left));
        assert_eq!(feedback.take_signal(), None);
        // Audio is off by default.
        assert!(!feedback.take_bell());
    }

    #[test]
    fn disabled_visual_feedback_never_flashes() {
        let mut feedback = NavigationFeedback::new(ShellConfig {
            enable_visual_feedback: false,
            enable_audio_feedback: true,
            ..ShellConfig::default()
        });
        feedback.signal_edge(Direction::Down);
        assert!(feedback.active_flash().is_none());
        assert!(feedback.take_bell());
        assert!(!feedback.take_bell());
    }
}
