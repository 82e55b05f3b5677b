//! Sign-in and account creation screens.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus, SignupFocus};
use crate::ui::render::{centered_rect_fixed, logo_lines};
use crate::ui::styles;

/// Visible width of a form field
const FIELD_WIDTH: usize = 22;

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    // Keep the tail visible while typing past the field width
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::styled(format!("  {:>17}: [", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH),
            styles::field_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

fn field_error(message: Option<&String>) -> Option<Line<'static>> {
    message.map(|m| {
        Line::from(Span::styled(
            format!("                      {}", m),
            styles::error_style(),
        ))
    })
}

fn button_line(label: &str, focused: bool, busy: bool) -> Line<'static> {
    let text = if busy {
        format!("   {}...   ", label)
    } else if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("                 ["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}

fn render_box(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(60, height, area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = logo_lines();
    lines.push(Line::from(Span::styled(
        "   Sign in to your document shelves",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    let errors = &app.login_field_errors;
    lines.push(field_line(
        "Username",
        &app.login_username,
        app.login_focus == LoginFocus::Username,
    ));
    lines.extend(field_error(errors.username.as_ref()));
    lines.push(field_line(
        "Password",
        &masked(&app.login_password),
        app.login_focus == LoginFocus::Password,
    ));
    lines.extend(field_error(errors.password.as_ref()));

    lines.push(Line::from(""));
    lines.push(button_line(
        "Sign In",
        app.login_focus == LoginFocus::Button,
        app.login_busy,
    ));

    if app.login_success {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "   ✓ Login successful! Redirecting...",
            styles::success_style(),
        )));
    } else if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("   {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   No account? Press ", styles::muted_style()),
        Span::styled("Ctrl+R", styles::help_key_style()),
        Span::styled(" to create one", styles::muted_style()),
    ]));

    render_box(frame, area, lines);
}

pub fn render_signup(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = logo_lines();
    lines.push(Line::from(Span::styled(
        "   Create your account",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    let form = &app.signup;
    let fields = [
        (SignupFocus::Username, "Username", form.username.clone()),
        (SignupFocus::Email, "Email", form.email.clone()),
        (SignupFocus::Password, "Password", masked(&form.password)),
        (SignupFocus::Confirm, "Confirm Password", masked(&form.confirm_password)),
    ];
    for (focus, label, value) in fields {
        lines.push(field_line(label, &value, app.signup_focus == focus));
        let error = focus.error_key().and_then(|k| app.signup_errors.get(k));
        lines.extend(field_error(error));
    }

    lines.push(Line::from(""));
    lines.push(button_line(
        "Create Account",
        app.signup_focus == SignupFocus::Button,
        app.signup_busy,
    ));

    if app.signup_success {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "   ✓ Account created! Redirecting to sign in...",
            styles::success_style(),
        )));
    } else if let Some(ref error) = app.signup_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("   {}", error),
            styles::error_style(),
        )));
    }

    render_box(frame, area, lines);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_counts_chars() {
        assert_eq!(masked("pässword"), "********");
        assert_eq!(masked(""), "");
    }

    #[test]
    fn test_field_line_keeps_tail() {
        let long = "x".repeat(30) + "end";
        let line = field_line("Username", &long, true);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("end▌"));
        assert!(!text.contains(&"x".repeat(FIELD_WIDTH)));
    }
}
