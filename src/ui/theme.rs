use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

pub struct Theme;

impl Theme {
    pub const ACCENT_TEAL: Color = Color::Rgb(64, 196, 180);
    pub const BG_SURFACE: Color = Color::Rgb(24, 26, 32);
    pub const WARN_AMBER: Color = Color::Rgb(240, 180, 60);

    pub fn border() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn border_type() -> BorderType {
        BorderType::Rounded
    }

    pub fn title() -> Style {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    }

    pub fn muted() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn body_text() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn url() -> Style {
        Style::default()
            .fg(Self::ACCENT_TEAL)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn overlay_title() -> Style {
        Style::default()
            .fg(Self::WARN_AMBER)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_text() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn loading() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn displayed() -> Style {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    }

    pub fn input_text() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    }
}
