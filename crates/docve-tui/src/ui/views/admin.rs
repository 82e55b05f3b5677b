use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use docve_core::utils::format_date;

use crate::app::App;
use crate::ui::styles;

/// All accounts, for the super-admin view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Username"),
        Cell::from("Email"),
        Cell::from("Role"),
        Cell::from("Status"),
        Cell::from("Created"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == app.user_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let status = match user.is_active {
                Some(true) => Span::styled("Active", styles::success_style()),
                Some(false) => Span::styled("Inactive", styles::error_style()),
                None => Span::styled("-", styles::muted_style()),
            };
            Row::new(vec![
                Cell::from(user.username.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(user.email.clone().unwrap_or_default()),
                Cell::from(user.role.clone().unwrap_or_default()),
                Cell::from(status),
                Cell::from(
                    user.created_at
                        .as_deref()
                        .map(format_date)
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let loading = if app.users_loading { " loading..." } else { "" };
    let title = format!(" Users ({}){} ", app.users.len(), loading);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.users.is_empty() {
        state.select(Some(app.user_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
