pub mod tiling;

pub use tiling::*;

use ratatui::prelude::Rect;

/// Compass direction for spatial navigation between visible cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Whether `candidate` lies strictly beyond `current` in this
    /// direction (no overlap along the primary axis).
    pub fn is_beyond(self, current: Rect, candidate: Rect) -> bool {
        match self {
            Self::Left => candidate.x.saturating_add(candidate.width) <= current.x,
            Self::Right => candidate.x >= current.x.saturating_add(current.width),
            Self::Up => candidate.y.saturating_add(candidate.height) <= current.y,
            Self::Down => candidate.y >= current.y.saturating_add(current.height),
        }
    }

    /// Ranking key for neighbor candidates: primary-axis distance first,
    /// then secondary-axis offset, both between region centers. Smaller
    /// is closer, so the nearest cell in the same row/column wins.
    pub fn distance_key(self, current: Rect, candidate: Rect) -> (u32, u32) {
        let (cur_x, cur_y) = center(current);
        let (cand_x, cand_y) = center(candidate);
        let dx = cur_x.abs_diff(cand_x);
        let dy = cur_y.abs_diff(cand_y);
        match self {
            Self::Left | Self::Right => (dx, dy),
            Self::Up | Self::Down => (dy, dx),
        }
    }
}

fn center(rect: Rect) -> (u32, u32) {
    (
        u32::from(rect.x) + u32::from(rect.width) / 2,
        u32::from(rect.y) + u32::from(rect.height) / 2,
    )
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let max_x = rect.x.saturating_add(rect.width);
    let max_y = rect.y.saturating_add(rect.height);
    column >= rect.x && column < max_x && row >= rect.y && row < max_y
}
