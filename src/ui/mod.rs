mod content;
mod layout;
mod prompt;
mod status_bar;
mod theme;

use crate::app::state::KioskState;
use ratatui::prelude::*;

pub fn render(frame: &mut Frame, state: &KioskState) {
    let area = frame.area();
    let kiosk_layout = layout::compute_layout(area);

    content::render(frame, kiosk_layout.content, state);
    status_bar::render(frame, kiosk_layout.status_bar, state);
    prompt::render(frame, state);
}
