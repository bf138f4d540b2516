use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct KioskLayout {
    pub content: Rect,
    pub status_bar: Rect,
}

pub fn compute_layout(area: Rect) -> KioskLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Page or overlay
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    KioskLayout {
        content: chunks[0],
        status_bar: chunks[1],
    }
}

/// Popup of `width` x `height` centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
