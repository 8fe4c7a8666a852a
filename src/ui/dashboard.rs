//! Dashboard rendering: the diagnosis widget and one card per sensor channel.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::theme::hex_color;
use crate::app::App;
use crate::catalog::SensorChannel;
use crate::cycle::CycleState;
use crate::data::duration::{format_seconds, remaining};
use crate::data::SensorReading;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the diagnosis widget: verdict, description, progress and tests.
pub fn render_diagnosis(frame: &mut Frame, app: &App, area: Rect) {
    let result = app.cycle.result();
    let state_style = app.theme.state_style(result.state);

    let block = Block::default()
        .title(" Diagnosis ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(state_style.remove_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(3), // Verdict + description
        Constraint::Length(1), // Progress
        Constraint::Min(1),    // Tests performed
    ])
    .split(inner);

    let text = vec![
        Line::from(vec![
            Span::raw(format!("{} ", result.icon)),
            Span::styled(result.state.label(), state_style),
        ]),
        Line::from(result.description.as_ref()),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), chunks[0]);

    render_progress(frame, app, chunks[1]);

    let tests = app.cycle.tests_performed();
    let mut lines = vec![Line::from(Span::styled(
        "Tests performed",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if tests.is_empty() {
        lines.push(Line::from(Span::styled(
            "  none yet",
            Style::default().add_modifier(Modifier::DIM),
        )));
    } else {
        lines.extend(tests.iter().map(|t| Line::from(format!("  • {}", t))));
    }
    frame.render_widget(Paragraph::new(lines), chunks[2]);
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let progress = app.cycle.progress();
    let label = match app.cycle_state() {
        CycleState::Running => {
            let left = app
                .cycle
                .elapsed()
                .map(|e| remaining(app.cycle.timing().duration, e))
                .unwrap_or(app.cycle.timing().duration);
            format!("{}% · {} left", progress, format_seconds(left))
        }
        CycleState::Completed => "100% · complete".to_string(),
        CycleState::Idle => "idle".to_string(),
    };

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(app.theme.highlight))
        .percent(u16::from(progress.min(100)))
        .label(label);
    frame.render_widget(gauge, area);
}

/// Render one card per channel of the active profile.
pub fn render_sensor_cards(frame: &mut Frame, app: &App, area: Rect) {
    let profile = app.profile();
    let constraints = vec![Constraint::Fill(1); profile.channels.len().max(1)];
    let cards = Layout::horizontal(constraints).split(area);

    for (channel, card) in profile.channels.iter().zip(cards.iter()) {
        let reading = app.cycle.aggregator().get(channel.id);
        render_card(frame, app, channel, reading, *card);
    }
}

fn render_card(
    frame: &mut Frame,
    app: &App,
    channel: &SensorChannel,
    reading: Option<&SensorReading>,
    area: Rect,
) {
    let color = hex_color(channel.color, app.theme.highlight);
    let block = Block::default()
        .title(format!(" {} {} ", channel.icon, channel.name))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);

    let Some(reading) = reading else {
        frame.render_widget(block, area);
        return;
    };
    let summary = reading.summary();

    let width = inner.width as usize;
    let levels = reading.sparkline(channel.min, channel.max);
    let skip = levels.len().saturating_sub(width);
    let sparkline: String = levels[skip..].iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect();

    let lines = vec![
        Line::from(Span::styled(
            format!("{:.2} {}", summary.current, channel.unit),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("min {:.2}  max {:.2}", summary.min, summary.max)),
        Line::from(format!("avg {:.2}", summary.average)),
        Line::from(Span::styled(sparkline, Style::default().fg(color))),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
