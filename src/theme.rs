use ratatui::style::Color;

// Centralized theme colors. Kept as small helpers so a host can remap
// them to terminal-supported colors in one place.

pub const EDGE_FLASH_RGB: (u8, u8, u8) = (255, 165, 0);

pub fn rgb_to_color(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Border color used to flash a pane edge when a directional move hits
/// the boundary of the grid.
pub fn edge_flash() -> Color {
    rgb_to_color(EDGE_FLASH_RGB)
}

pub fn pane_border() -> Color {
    Color::DarkGray
}

pub fn pane_border_focused() -> Color {
    Color::Gray
}

pub fn modal_bg() -> Color {
    Color::Black
}

pub fn modal_fg() -> Color {
    Color::White
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_flash_is_rgb() {
        match edge_flash() {
            Color::Rgb(_, _, _) => {}
            other => panic!("unexpected color variant: {other:?}"),
        }
    }
}
