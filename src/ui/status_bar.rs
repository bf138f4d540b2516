use crate::app::state::*;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, area: Rect, state: &KioskState) {
    let state_style = match state.display {
        s if s.is_failure() => Theme::error_text(),
        DisplayState::Displayed => Theme::displayed(),
        DisplayState::Loading => Theme::loading(),
        _ => Theme::muted(),
    };

    let mut parts: Vec<Span> = vec![
        Span::styled(
            format!(" [{}] ", state.display.label()),
            state_style.bg(Color::DarkGray),
        ),
        Span::styled(format!(" {} ", state.status_line()), Theme::status_bar()),
    ];

    // Pad to fill remaining space
    let version = concat!("kiosk-pin ", env!("CARGO_PKG_VERSION"));
    let used: usize = parts.iter().map(|s| s.content.width()).sum();
    let remaining = (area.width as usize).saturating_sub(used + version.len() + 2);
    parts.push(Span::styled(" ".repeat(remaining), Theme::status_bar()));
    parts.push(Span::styled(format!(" {} ", version), Theme::muted().bg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
