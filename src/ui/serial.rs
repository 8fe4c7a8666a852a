//! Serial port panel: detected ports, selection and connection state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, SerialStatus};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Serial @ {} baud ", app.settings.serial.baud_rate))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).split(inner);

    let (status, style) = match &app.serial_status {
        SerialStatus::Connected(desc) => (desc.clone(), Style::default().fg(app.theme.healthy)),
        SerialStatus::Closing => ("closing...".to_string(), Style::default().fg(app.theme.warning)),
        SerialStatus::Disconnected => {
            ("not connected".to_string(), Style::default().fg(app.theme.muted))
        }
    };
    let mut lines = vec![Line::from(Span::styled(status, style))];
    if let Some(ref err) = app.serial_error {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(app.theme.critical),
        )));
    }
    frame.render_widget(Paragraph::new(lines), chunks[0]);

    if app.ports.is_empty() {
        let hint = match app.settings.serial.port {
            Some(ref port) => format!("configured: {} (c:connect)", port),
            None => "no ports listed (d:detect)".to_string(),
        };
        frame.render_widget(
            Paragraph::new(hint).style(Style::default().add_modifier(Modifier::DIM)),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = app.ports.iter().map(|p| ListItem::new(p.as_str())).collect();
    let list = List::new(items).highlight_style(app.theme.selected).highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(app.selected_port.min(app.ports.len() - 1)));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}
