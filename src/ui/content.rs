//! Main area: the loaded page summary, or the full-screen status overlay while
//! the kiosk is not displaying anything.

use crate::app::state::*;
use crate::ui::layout::centered;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub fn render(frame: &mut Frame, area: Rect, state: &KioskState) {
    match (&state.overlay, state.display) {
        (Some(overlay), _) => render_overlay(frame, area, overlay),
        (None, DisplayState::Displayed) => render_page(frame, area, state),
        (None, DisplayState::Loading) => render_notice(
            frame,
            area,
            "Loading",
            vec![Line::styled(state.current_url.clone(), Theme::url())],
        ),
        (None, _) => render_notice(frame, area, "Starting", vec![]),
    }
}

fn render_overlay(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    let mut lines: Vec<Line> = overlay
        .message
        .lines()
        .map(|l| Line::styled(l.to_string(), Theme::body_text()))
        .collect();
    lines.insert(0, Line::from(""));
    render_notice(frame, area, &overlay.title, lines);
}

fn render_notice(frame: &mut Frame, area: Rect, title: &str, body: Vec<Line>) {
    let mut lines = vec![Line::styled(title.to_string(), Theme::overlay_title())];
    lines.extend(body);

    let height = lines.len() as u16;
    let box_area = centered(area, area.width.saturating_sub(4), height);
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, box_area);
}

fn render_page(frame: &mut Frame, area: Rect, state: &KioskState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Theme::border())
        .style(Style::default().bg(Theme::BG_SURFACE));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(page) = &state.page else {
        return;
    };

    let status = match page.status {
        Some(code) => format!("HTTP {}", code),
        None => "loaded".to_string(),
    };
    let lines = vec![
        Line::styled(page.url.clone(), Theme::url()),
        Line::from(""),
        Line::from(vec![
            Span::styled(status, Theme::displayed()),
            Span::styled(format!("  since {}", page.loaded_at), Theme::muted()),
        ]),
    ];

    let body = centered(inner, inner.width.saturating_sub(2), lines.len() as u16);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        body,
    );
}
