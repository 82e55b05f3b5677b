use ratatui::style::{Color, Modifier, Style};

use docve_core::models::DocumentStatus;

// Color palette
pub const PRIMARY: Color = Color::Rgb(102, 110, 234);
pub const SECONDARY: Color = Color::Rgb(72, 187, 120);
pub const ACCENT: Color = Color::Rgb(236, 177, 64);
pub const ERROR: Color = Color::Rgb(220, 80, 80);
pub const MUTED: Color = Color::Rgb(128, 128, 140);
pub const HIGHLIGHT: Color = Color::Rgb(44, 46, 72);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(30, 30, 42)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Form field text; focused fields get the selection background.
pub fn field_style(focused: bool) -> Style {
    if focused {
        selected_style()
    } else {
        list_item_style()
    }
}

pub fn stat_value_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

pub fn gauge_style() -> Style {
    Style::default().fg(PRIMARY).bg(HIGHLIGHT)
}

pub fn document_status_style(status: DocumentStatus) -> Style {
    match status {
        DocumentStatus::Indexed => success_style(),
        DocumentStatus::Processing => highlight_style(),
        DocumentStatus::Failed => error_style(),
        DocumentStatus::Removed | DocumentStatus::Unknown => muted_style(),
    }
}

pub fn user_message_style() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn assistant_message_style() -> Style {
    Style::default().fg(Color::White)
}
