use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use docve_core::chat::Role;

use crate::app::{App, ChatFocus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    render_document_list(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(chunks[1]);

    render_conversation(frame, app, right[0]);
    render_input(frame, app, right[1]);
}

fn render_document_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.chat_focus == ChatFocus::Documents;
    let active = app.chat.document().map(|d| d.id.as_str());

    let items: Vec<ListItem> = app
        .chat_documents
        .iter()
        .map(|doc| {
            let marker = if Some(doc.id.as_str()) == active { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, styles::success_style()),
                Span::raw(doc.name.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Documents ({}) ", app.chat_documents.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !app.chat_documents.is_empty() {
        state.select(Some(app.chat_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_conversation(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.chat.document() {
        Some(doc) => format!(" Chat · {} ", doc.name),
        None => " Chat ".to_string(),
    };

    let mut lines = Vec::new();
    if app.chat.document().is_none() {
        lines.push(Line::from(Span::styled(
            "Select a document on the left to start chatting.",
            styles::muted_style(),
        )));
    }

    for message in app.chat.messages() {
        let (who, style) = match message.role {
            Role::User => ("You", styles::user_message_style()),
            Role::Assistant => ("Docve", styles::assistant_message_style()),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", who), styles::title_style()),
            Span::styled(message.timestamp.clone(), styles::muted_style()),
        ]));
        lines.push(Line::from(Span::styled(message.content.clone(), style)));
        lines.push(Line::from(""));
    }

    if app.chat.is_typing() {
        lines.push(Line::from(Span::styled("Docve is typing...", styles::muted_style())));
    }

    // Stick to the bottom once the conversation outgrows the pane
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(inner_height) as u16;

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.chat_focus == ChatFocus::Input;
    let line = if app.chat_input.is_empty() && !focused {
        Line::from(Span::styled(
            " Ask a question about this document...",
            styles::muted_style(),
        ))
    } else {
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::styled(" › ", styles::muted_style()),
            Span::raw(format!("{}{}", app.chat_input, cursor)),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));
    frame.render_widget(Paragraph::new(line).block(block), area);
}
