use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use docve_core::Route;

use crate::app::{App, AppState, Tab};

use super::styles;
use super::views::{admin, auth, chat, dashboard, documents, shelves};

const LOGO: [&str; 3] = [
    "   ╔╦╗╔═╗╔═╗╦  ╦╔═╗",
    "    ║║║ ║║  ╚╗╔╝║╣ ",
    "   ═╩╝╚═╝╚═╝ ╚╝ ╚═╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let public = Tab::from_route(&app.route).is_none();

    let chunks = if public {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Min(10),   // Form
                Constraint::Length(2), // Status bar
            ])
            .split(frame.area())
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(3), // Tabs
                Constraint::Min(10),   // Main content
                Constraint::Length(2), // Status bar
            ])
            .split(frame.area())
    };

    render_title_bar(frame, app, chunks[0]);
    if public {
        render_main_content(frame, app, chunks[1]);
        render_status_bar(frame, app, chunks[2]);
    } else {
        render_tabs(frame, app, chunks[1]);
        render_main_content(frame, app, chunks[2]);
        render_status_bar(frame, app, chunks[3]);
    }

    // Render overlays
    match &app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete(target) => render_delete_overlay(frame, &target.describe()),
        AppState::EditingShelf => shelves::render_shelf_form(frame, app),
        AppState::ManagingAccess | AppState::GrantingAccess => shelves::render_access_panel(frame, app),
        AppState::EnteringUploadPath => documents::render_upload_prompt(frame, app),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

pub fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Docve  ·  {}", app.route.title());
    let help_hint = if Tab::from_route(&app.route).is_some() {
        "[?] Help"
    } else {
        ""
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.chars().count() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.current_tab();

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        spans.push(Span::styled(label, styles::tab_style(current == Some(*tab))));
    }

    if let Route::ShelfDocuments(_) = app.route {
        let shelf_name = app
            .current_shelf
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("...");
        spans.push(Span::styled("   › ", styles::muted_style()));
        spans.push(Span::styled(shelf_name.to_string(), styles::highlight_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Login => auth::render_login(frame, app, area),
        Route::Signup => auth::render_signup(frame, app, area),
        Route::Dashboard => dashboard::render(frame, app, area),
        Route::Shelves | Route::MyShelves => shelves::render(frame, app, area),
        Route::ShelfDocuments(_) => documents::render(frame, app, area),
        Route::Chat => chat::render(frame, app, area),
        Route::SuperAdmin => admin::render(frame, app, area),
    }
}

fn shortcuts(app: &App) -> &'static str {
    match app.route {
        Route::Login => "[Tab] next field | [Ctrl+R] create account | [Esc] quit",
        Route::Signup => "[Tab] next field | [Esc] back to sign in",
        Route::Dashboard => "[r]efresh | [L]ogout | [q]uit",
        Route::Shelves | Route::MyShelves => "[/]search [n]ew [e]dit [d]elete [a]ccess | [q]uit",
        Route::ShelfDocuments(_) => "[u]pload [i]ndexed [f]ailed [x]removed [d]elete [c]hat | [Esc] back",
        Route::Chat => "[Tab] focus | [Enter] select/send | [n]ew chat",
        Route::SuperAdmin => "[r]efresh [d]elete | [q]uit",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None if app.is_authenticated() => " Signed in ".to_string(),
        None => " Not signed in ".to_string(),
    };
    let right_text = format!(" {} ", shortcuts(app));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc.to_string(), styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 30, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("              version {}", version),
        styles::muted_style(),
    )));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Navigation", styles::highlight_style())));
    help_text.push(help_line("1-5", "Switch tabs"));
    help_text.push(help_line("←/→", "Previous/next tab"));
    help_text.push(help_line("↑/↓ j/k", "Move selection"));
    help_text.push(help_line("PgUp/PgDn", "Move by a page"));
    help_text.push(help_line("Enter", "Open / select"));
    help_text.push(help_line("Esc", "Go back"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Shelves", styles::highlight_style())));
    help_text.push(help_line("/", "Search shelves"));
    help_text.push(help_line("n / e / d", "New, edit or delete shelf"));
    help_text.push(help_line("a", "Manage access (shared shelves)"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Documents", styles::highlight_style())));
    help_text.push(help_line("u", "Upload a file"));
    help_text.push(help_line("i / f / x", "Mark indexed, failed or removed"));
    help_text.push(help_line("c", "Chat about the document"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Session", styles::highlight_style())));
    help_text.push(help_line("r", "Refresh view"));
    help_text.push(help_line("L", "Sign out"));
    help_text.push(help_line("q", "Quit"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("         Press ", styles::muted_style()),
        Span::styled("?", styles::help_key_style()),
        Span::styled(" or ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm(frame: &mut Frame, question: Line<'static>) {
    let area = centered_rect_fixed(50, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(question);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled("y", styles::help_key_style()),
        Span::raw("]es   ["),
        Span::styled("n", styles::help_key_style()),
        Span::raw("]o"),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm(
        frame,
        Line::from(Span::styled("         Quit Docve?", styles::highlight_style())),
    );
}

fn render_delete_overlay(frame: &mut Frame, what: &str) {
    render_confirm(
        frame,
        Line::from(vec![
            Span::raw("  Delete "),
            Span::styled(what.to_string(), styles::error_style()),
            Span::raw("?"),
        ]),
    );
}
