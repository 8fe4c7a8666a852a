//! Common UI components.
//!
//! This module contains the header bar, selector bar, status bar, and help overlay.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, SerialStatus};
use crate::cycle::CycleState;

/// Render the header bar.
///
/// Displays: cycle state, verdict so far, data source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.cycle_state();
    let result = app.cycle.result();

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.cycle_style(state)),
        Span::styled("AMORTICHECK PRO ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(state.label(), app.theme.cycle_style(state)),
        Span::raw(" │ "),
        Span::styled(result.state.label(), app.theme.state_style(result.state)),
        Span::raw(" │ "),
        Span::raw(app.source_description().to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the profile and manufacturer selectors.
///
/// Dimmed while a cycle runs, since changes are rejected then.
pub fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let locked = app.cycle.is_running();
    let value_style = if locked {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
    };

    let chunks = Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).split(area);

    let profile = app.profile();
    let profile_line = Line::from(vec![
        Span::raw("◀ "),
        Span::styled(profile.name, value_style),
        Span::raw(" ▶ "),
        Span::styled(profile.description, Style::default().fg(app.theme.muted)),
    ]);
    let block = Block::default()
        .title(" Shock absorber [p/P] ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(profile_line).block(block), chunks[0]);

    let manufacturer = app.manufacturer();
    let muted = Style::default().fg(app.theme.muted);
    let manufacturer_lines = vec![
        Line::from(vec![
            Span::raw("◀ "),
            Span::styled(manufacturer.name, value_style),
            Span::raw(" ▶ "),
            Span::styled(format!("Norm {}", manufacturer.norm), muted),
        ]),
        Line::from(Span::styled(
            format!(
                "Gas {} · Fatigue {} cycles",
                manufacturer.gas_pressure, manufacturer.fatigue_cycles
            ),
            muted,
        )),
    ];
    let block = Block::default()
        .title(" Manufacturer [m/M] ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(manufacturer_lines).block(block), chunks[1]);
}

/// Render the status bar at the bottom.
///
/// Shows temporary status messages first, then serial errors, then the
/// context-sensitive controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.serial_error {
        let paragraph = Paragraph::new(format!(" Serial: {} | d:detect c:connect", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.cycle_state() {
        CycleState::Running => "Space:stop t:table ?:help q:quit",
        CycleState::Completed => "Space:restart e:export p/m:select t:table ?:help q:quit",
        CycleState::Idle => "Space:start p/m:select d:detect t:table ?:help q:quit",
    };
    let serial = match app.serial_status {
        SerialStatus::Connected(_) => " x:disconnect",
        SerialStatus::Disconnected => " c:connect",
        SerialStatus::Closing => "",
    };

    let paragraph = Paragraph::new(format!(" {}{}", controls, serial))
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Diagnosis"),
        Line::from("  Space/Enter Start / stop the cycle"),
        Line::from("  p / P       Next / previous profile"),
        Line::from("  m / M       Next / previous manufacturer"),
        Line::from("  t           Toggle detailed sensor table"),
        Line::from("  e           Export report"),
        Line::from(""),
        section(" Serial device"),
        Line::from("  d           Detect ports"),
        Line::from("  ↑/↓ j/k     Select port"),
        Line::from("  c           Connect"),
        Line::from("  x           Disconnect"),
        Line::from(""),
        section(" General"),
        Line::from("  ?           Toggle help"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 48u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
