use codigo_core::{highlight_references, segments, MessageKind, Segment, Speaker};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, CompareField, FocusPane, InputMode};

/// Split a line on `**bold**` markers. Unclosed markers stay literal.
fn markdown_runs(text: &str) -> Vec<(String, bool)> {
    let mut runs = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else { break };
        if close == 0 {
            break;
        }
        if open > 0 {
            runs.push((rest[..open].to_string(), false));
        }
        runs.push((after[..close].to_string(), true));
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        runs.push((rest.to_string(), false));
    }
    runs
}

/// One line of a bot message, with article numbers highlighted.
///
/// References are detected on the raw text each time it is drawn; the spans
/// never feed back into the text, so nothing is highlighted twice.
fn bot_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let article_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    for (run, bold) in markdown_runs(text) {
        let style = if bold { base.add_modifier(Modifier::BOLD) } else { base };
        let refs = highlight_references(&run);
        for segment in segments(&run, &refs) {
            match segment {
                Segment::Plain(s) => spans.push(Span::styled(s.to_string(), style)),
                Segment::Article(n) => spans.push(Span::styled(n.to_string(), article_style)),
            }
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);

    // Popups (in order of priority)
    if app.notice.is_some() {
        render_notice(app, frame, area);
    } else if app.compare_popup.is_some() {
        render_compare_popup(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let history_len = app
        .session
        .as_ref()
        .map(|s| s.history_snapshot().len())
        .unwrap_or(0);

    let title = Line::from(vec![
        Span::styled(" Código Penal · Chat RAG ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[historial {}/{}]", history_len, codigo_core::HISTORY_LIMIT),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDITAR ",
    };

    let hints = if let Some(status) = &app.status_line {
        status.clone()
    } else {
        match app.input_mode {
            InputMode::Editing => "Enter enviar · Esc salir de edición".to_string(),
            InputMode::Normal => {
                "i preguntar · c comparar · Tab foco · r limpiar · e exportar · s stats · q salir"
                    .to_string()
            }
        }
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(mode_text, mode_style.add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::Gray)),
    ]));
    frame.render_widget(footer, area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let refs_height = if app.extracted_references.is_empty() {
        0
    } else {
        (app.extracted_references.len().min(5) + 2) as u16 // +2 for borders
    };

    let [chat_area, refs_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(refs_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Inner size minus borders, for scroll calculations
    app.query_chat_height = chat_area.height.saturating_sub(2);
    app.query_chat_width = chat_area.width.saturating_sub(2);

    render_chat(app, frame, chat_area);
    if refs_height > 0 {
        render_references(app, frame, refs_area);
    }
    render_input(app, frame, input_area);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.focus == FocusPane::Chat { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.config.chat_url));

    let chat_text = if app.transcript.is_empty() && !app.is_busy() {
        Text::from(vec![
            Line::from(Span::styled(
                "Pregunta lo que quieras sobre el Código Penal.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Pulsa 'c' en modo normal para comparar dos artículos.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for entry in app.transcript.entries() {
            match entry.speaker {
                Speaker::User => {
                    lines.push(Line::from(Span::styled(
                        "Tú:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    for line in entry.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Speaker::Bot => {
                    let (label_color, text_style) = match entry.kind {
                        MessageKind::Normal => (Color::Green, Style::default()),
                        MessageKind::Error => (Color::Red, Style::default().fg(Color::Red)),
                        MessageKind::Warning => (Color::Yellow, Style::default().fg(Color::Yellow)),
                    };
                    lines.push(Line::from(Span::styled(
                        "Bot:",
                        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
                    )));
                    for line in entry.text.lines() {
                        lines.push(bot_line(line, text_style));
                    }
                }
            }
            lines.push(Line::default());
        }

        if app.is_busy() {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Pensando{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.query_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_references(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::References;
    let border_color = if focused { Color::Cyan } else { Color::Magenta };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Artículos citados (Tab para enfocar, Enter para abrir) ");

    let items: Vec<ListItem> = app
        .extracted_references
        .iter()
        .enumerate()
        .map(|(i, r)| ListItem::new(format!(" {}. {} ", i + 1, r.display_title())))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.references_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing || app.focus == FocusPane::Input {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.query_task.is_some() {
        " Esperando respuesta... "
    } else {
        " Pregunta "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll so the cursor stays visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing && app.compare_popup.is_none() && app.notice.is_none() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Centered rectangle of the given size, clamped to `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn render_compare_popup(app: &App, frame: &mut Frame, area: Rect) {
    let Some(popup) = app.compare_popup.as_ref() else {
        return;
    };

    let popup_area = centered(area, 50, 9);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" ⚖️ Comparar artículos (Enter, Esc cancelar) ");

    let field_line = |label: &str, value: &str, active: bool| {
        let marker = if active { "> " } else { "  " };
        let value_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(marker.to_string()),
            Span::styled(format!("{:<12}", label), Style::default().fg(Color::Gray)),
            Span::styled(value.to_string(), value_style),
        ])
    };

    let mut lines = vec![
        Line::default(),
        field_line("Artículo 1:", &popup.first, popup.field == CompareField::First),
        field_line("Artículo 2:", &popup.second, popup.field == CompareField::Second),
        Line::default(),
    ];
    if let Some(error) = &popup.error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        )));
    } else if app.is_busy() {
        lines.push(Line::from(Span::styled(
            "  Espera a que termine la consulta en curso",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = app.notice.as_deref() else {
        return;
    };

    let popup_area = centered(area, 60, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Artículo (Enter/Esc para cerrar) ");

    let paragraph = Paragraph::new(notice.to_string())
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}
