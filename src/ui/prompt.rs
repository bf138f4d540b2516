use crate::app::state::*;
use crate::ui::layout::centered;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::block::Padding;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Chevron shown in front of the editor text.
const CHEVRON: &str = "❯ ";

pub fn render(frame: &mut Frame, state: &KioskState) {
    let Some(prompt) = &state.prompt else {
        return;
    };

    let area = frame.area();
    let popup_w = (area.width * 70 / 100).max(40).min(area.width.saturating_sub(2));
    let popup_area = centered(area, popup_w, 8);

    // Clear background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Kiosk Settings ")
        .title_style(Theme::title())
        .title_bottom(Line::styled(
            format!(" v{} ", env!("CARGO_PKG_VERSION")),
            Theme::muted(),
        ))
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Style::default().fg(Theme::ACCENT_TEAL))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Theme::BG_SURFACE));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.height < 4 || inner.width < 10 {
        return;
    }

    let label = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(Paragraph::new(Span::styled("URL", Theme::title())), label);

    let (visible, cursor_col) = visible_window(prompt, inner.width.saturating_sub(2) as usize);
    let input = Rect::new(inner.x, inner.y + 1, inner.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(CHEVRON, Style::default().fg(Theme::ACCENT_TEAL)),
            Span::styled(visible, Theme::input_text()),
        ])),
        input,
    );

    let hints = Rect::new(inner.x, inner.y + 3, inner.width, inner.height - 3);
    frame.render_widget(
        Paragraph::new(vec![
            Line::styled("Enter save · Esc cancel · Ctrl-U clear", Theme::muted()),
            Line::styled("Remote: kiosk-pin push-url <URL>", Theme::muted()),
        ]),
        hints,
    );

    // Cursor offset: chevron (2 columns)
    let cursor_x = input.x + 2 + cursor_col as u16;
    frame.set_cursor_position((cursor_x.min(input.right().saturating_sub(1)), input.y));
}

/// Tail of the prompt text that fits in `width` columns with the cursor in
/// view, and the cursor column inside that tail.
fn visible_window(prompt: &PromptState, width: usize) -> (String, usize) {
    let cursor_col = prompt.cursor_column();
    if cursor_col < width {
        return (prompt.text.clone(), cursor_col);
    }

    // Scroll so the cursor sits at the right edge.
    let skip = cursor_col + 1 - width;
    let mut skipped = 0;
    let mut start = 0;
    for (i, c) in prompt.text.char_indices() {
        if skipped >= skip {
            start = i;
            break;
        }
        skipped += unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        start = i + c.len_utf8();
    }
    (prompt.text[start..].to_string(), cursor_col - skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unscrolled() {
        let p = PromptState::with_text("http://a");
        assert_eq!(visible_window(&p, 20), ("http://a".to_string(), 8));
    }

    #[test]
    fn test_long_text_keeps_cursor_visible() {
        let p = PromptState::with_text("http://homeassistant.local:8123");
        let (visible, col) = visible_window(&p, 10);
        assert_eq!(col, 9);
        assert!(visible.ends_with(":8123"));
        assert!(visible.len() <= 10);
    }
}
