use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use docve_core::utils::{format_relative, initials};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    render_stat_cards(frame, app, chunks[0]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(lower[0]);

    render_recent_users(frame, app, left[0]);
    render_activity(frame, app, left[1]);
    render_health(frame, app, lower[1]);
}

fn render_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let placeholder = if app.dashboard_loading { "..." } else { "-" };
    let values: [(&str, String); 4] = match app.stats {
        Some(ref stats) => [
            ("Total Users", stats.total_users.to_string()),
            ("Active Users", stats.active_users.to_string()),
            ("Documents Processed", stats.documents_processed.to_string()),
            ("Storage Used", stats.storage_used.clone()),
        ],
        None => [
            ("Total Users", placeholder.to_string()),
            ("Active Users", placeholder.to_string()),
            ("Documents Processed", placeholder.to_string()),
            ("Storage Used", placeholder.to_string()),
        ],
    };

    for (card, (label, value)) in cards.iter().zip(values) {
        let lines = vec![
            Line::from(Span::styled(format!(" {}", value), styles::stat_value_style())),
            Line::from(Span::styled(format!(" {}", label), styles::muted_style())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

fn render_recent_users(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let rows: Vec<Row> = app
        .recent_users
        .iter()
        .map(|user| {
            let name = user.display_name();
            let joined = user
                .created()
                .map(|t| format_relative(t, now))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(Span::styled(initials(&name), styles::highlight_style())),
                Cell::from(name),
                Cell::from(user.email.clone().unwrap_or_default()),
                Cell::from(Span::styled(joined, styles::muted_style())),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(30),
        Constraint::Fill(1),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths).block(
        Block::default()
            .title(" Recent Users ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(table, area);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![Cell::from("Admin"), Cell::from("Action"), Cell::from("Time")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .activity
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.admin.clone()),
                Cell::from(entry.action.clone()),
                Cell::from(Span::styled(entry.time.clone(), styles::muted_style())),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Fill(1),
        Constraint::Length(22),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Recent Admin Activity ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(table, area);
}

fn render_health(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    match app.stats.as_ref().and_then(|s| s.health.as_ref()) {
        Some(health) => {
            let status_style = if health.is_healthy() {
                styles::success_style()
            } else {
                styles::error_style()
            };
            lines.push(Line::from(vec![
                Span::styled("Status:   ", styles::muted_style()),
                Span::styled(health.status_label().to_string(), status_style),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Storage:  ", styles::muted_style()),
                Span::raw(health.storage_display()),
            ]));
            if let Some(ref version) = health.version {
                lines.push(Line::from(vec![
                    Span::styled("Version:  ", styles::muted_style()),
                    Span::raw(version.clone()),
                ]));
            }
            let components = health.components();
            if !components.is_empty() {
                lines.push(Line::from(""));
                for (name, status) in components {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {:<16}", name), styles::muted_style()),
                        Span::raw(status),
                    ]));
                }
            }
        }
        None if app.dashboard_loading => {
            lines.push(Line::from(Span::styled("Checking...", styles::muted_style())));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Health information unavailable",
                styles::muted_style(),
            )));
        }
    }

    if let Some(ref error) = app.dashboard_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    }

    let block = Block::default()
        .title(" System Health ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
