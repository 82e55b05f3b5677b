use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState},
    Frame,
};

use docve_core::utils::format_bytes;

use crate::app::{App, AppState};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let constraints = if app.uploading || app.upload_progress.is_some() {
        vec![Constraint::Length(4), Constraint::Min(5), Constraint::Length(3)]
    } else {
        vec![Constraint::Length(4), Constraint::Min(5)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_shelf_header(frame, app, chunks[0]);
    render_document_table(frame, app, chunks[1]);
    if chunks.len() > 2 {
        render_upload_progress(frame, app, chunks[2]);
    }
}

fn render_shelf_header(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.current_shelf {
        Some(ref shelf) => vec![
            Line::from(vec![
                Span::styled(shelf.name.clone(), styles::title_style()),
                Span::styled(format!("  ({})", shelf.type_label()), styles::muted_style()),
            ]),
            Line::from(Span::styled(
                shelf.description.clone().unwrap_or_default(),
                styles::muted_style(),
            )),
        ],
        None => vec![Line::from(Span::styled("Loading shelf...", styles::muted_style()))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_document_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Type"),
        Cell::from("Size"),
        Cell::from("Uploaded"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let style = if i == app.document_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let status = doc.status();
            Row::new(vec![
                Cell::from(doc.name.clone()),
                Cell::from(doc.type_label()),
                Cell::from(doc.size_display()),
                Cell::from(doc.date_display()),
                Cell::from(Span::styled(status.label(), styles::document_status_style(status))),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Length(12),
    ];

    let loading = if app.documents_loading { " loading..." } else { "" };
    let title = format!(" Documents ({}){} ", app.documents.len(), loading);

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
    if !app.documents.is_empty() {
        state.select(Some(app.document_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_upload_progress(frame: &mut Frame, app: &App, area: Rect) {
    let progress = app.upload_progress.unwrap_or_default();
    let label = if app.upload_progress.is_none() {
        "Starting upload...".to_string()
    } else if progress.is_complete() && !app.uploading {
        "Upload complete".to_string()
    } else {
        format!(
            "{}%  {} / {}",
            progress.percent,
            format_bytes(progress.sent),
            format_bytes(progress.total)
        )
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Upload ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(app.uploading)),
        )
        .gauge_style(styles::gauge_style())
        .percent(u16::from(progress.percent.min(100)))
        .label(label);
    frame.render_widget(gauge, area);
}

pub fn render_upload_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(64, 7, frame.area());
    frame.render_widget(Clear, area);

    let focused = app.state == AppState::EnteringUploadPath;
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  File: ", styles::muted_style()),
            Span::styled(format!("{}▌", app.upload_path), styles::field_style(focused)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  [Enter] upload  [Esc] cancel",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" Upload Document ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
