use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use docve_core::models::AccessGrant;
use docve_core::utils::truncate_string;

use crate::app::{App, AppState, ShelfField};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_search_bar(frame, app, chunks[0]);
    render_shelf_table(frame, app, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;
    let line = if app.search_query.is_empty() && !searching {
        Line::from(Span::styled(
            " Press / to search shelves",
            styles::muted_style(),
        ))
    } else {
        let cursor = if searching { "▌" } else { "" };
        Line::from(vec![
            Span::styled(" Search: ", styles::muted_style()),
            Span::styled(format!("{}{}", app.search_query, cursor), styles::search_style()),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_shelf_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Type"),
        Cell::from("Documents"),
        Cell::from("Created"),
        Cell::from("Description"),
    ])
    .style(styles::title_style())
    .height(1);

    let shelves = app.visible_shelves();

    let rows: Vec<Row> = shelves
        .iter()
        .enumerate()
        .map(|(i, shelf)| {
            let style = if i == app.shelf_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let type_style = if shelf.is_shared() {
                styles::highlight_style()
            } else {
                styles::muted_style()
            };
            Row::new(vec![
                Cell::from(shelf.name.clone()),
                Cell::from(Span::styled(shelf.type_label(), type_style)),
                Cell::from(shelf.documents_display()),
                Cell::from(shelf.created_display()),
                Cell::from(truncate_string(
                    shelf.description.as_deref().unwrap_or(""),
                    60,
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(28),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(14),
        Constraint::Fill(1),
    ];

    let status = if app.shelves_loading { " loading..." } else { "" };
    let title = format!(" {} ({}){} ", app.route.title(), shelves.len(), status);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(app.state == AppState::Normal)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !shelves.is_empty() {
        state.select(Some(app.shelf_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

pub fn render_shelf_form(frame: &mut Frame, app: &App) {
    let form = &app.shelf_form;
    let height = if form.error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(58, height, frame.area());
    frame.render_widget(Clear, area);

    let field = |label: &str, value: &str, focus: ShelfField| {
        let focused = form.focus == focus;
        let cursor = if focused { "▌" } else { " " };
        Line::from(vec![
            Span::styled(format!("  {:>12}: [", label), styles::muted_style()),
            Span::styled(
                format!("{:<32}{}", truncate_string(value, 32), cursor),
                styles::field_style(focused),
            ),
            Span::styled("]", styles::muted_style()),
        ])
    };

    let type_focused = form.focus == ShelfField::Type;
    let button_focused = form.focus == ShelfField::Button;
    let button = if form.saving {
        "   Saving...   "
    } else if button_focused {
        " ▶ Save Shelf ◀ "
    } else {
        "   Save Shelf   "
    };

    let mut lines = vec![
        Line::from(""),
        field("Name", &form.name, ShelfField::Name),
        field("Description", &form.description, ShelfField::Description),
        Line::from(vec![
            Span::styled(format!("  {:>12}: ", "Type"), styles::muted_style()),
            Span::styled(
                format!("< {} >", form.shelf_type.label()),
                styles::field_style(type_focused),
            ),
            Span::styled("  (Space to toggle)", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("                 ["),
            Span::styled(button, styles::field_style(button_focused)),
            Span::raw("]"),
        ]),
    ];

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  [Tab] next field  [Enter] save  [Esc] cancel",
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(format!(" {} ", form.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_access_panel(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(70, 20, frame.area());
    frame.render_widget(Clear, area);

    let shelf_name = app
        .access_shelf
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("");

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(area);

    let managing = app.state == AppState::ManagingAccess;

    let rows: Vec<Row> = app
        .access
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if managing && i == app.access_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(entry.display_name()),
                Cell::from(entry.email.clone().unwrap_or_default()),
                Cell::from(Span::styled(
                    entry.permission().unwrap_or("-").to_string(),
                    styles::highlight_style(),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(35),
        Constraint::Fill(1),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![Cell::from("User"), Cell::from("Email"), Cell::from("Permission")])
                .style(styles::title_style()),
        )
        .block(
            Block::default()
                .title(format!(" Access · {} ", shelf_name))
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(managing)),
        );
    frame.render_widget(table, chunks[0]);

    let granting = app.state == AppState::GrantingAccess;
    let grant_lines = if granting {
        vec![
            Line::from(vec![
                Span::styled("  User id: [", styles::muted_style()),
                Span::styled(format!("{:<20}▌", app.grant_form.user_id), styles::field_style(true)),
                Span::styled("]  Permission: ", styles::muted_style()),
                Span::styled(
                    format!("< {} >", app.grant_form.permission_label()),
                    styles::highlight_style(),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    "  [Tab] permission ({})  [Enter] grant  [Esc] cancel",
                    AccessGrant::PERMISSIONS.join(" / ")
                ),
                styles::muted_style(),
            )),
        ]
    } else {
        vec![Line::from(Span::styled(
            "  [a] grant access  [d] revoke selected  [Esc] close",
            styles::muted_style(),
        ))]
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(granting));
    frame.render_widget(Paragraph::new(grant_lines).block(block), chunks[1]);
}
