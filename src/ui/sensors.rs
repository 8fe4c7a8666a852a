//! Detailed sensor table.
//!
//! Shows every channel of the active profile with its nominal range and
//! rolling aggregates. On a completed cycle the frozen snapshot is shown.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use super::theme::hex_color;
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let profile = app.profile();
    let (aggregates, source) = match app.cycle.snapshot() {
        Some(snapshot) => (snapshot, "snapshot"),
        None => (app.cycle.aggregator(), "live"),
    };

    let header = Row::new(vec![
        Cell::from("Sensor"),
        Cell::from("Range"),
        Cell::from("Current"),
        Cell::from("Min"),
        Cell::from("Max"),
        Cell::from("Average"),
        Cell::from("Samples"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = profile
        .channels
        .iter()
        .map(|channel| {
            let color = hex_color(channel.color, app.theme.highlight);
            let value = |v: f64| format!("{:.2} {}", v, channel.unit);
            let (current, min, max, average, samples) = match aggregates.get(channel.id) {
                Some(reading) => {
                    let s = reading.summary();
                    (
                        value(s.current),
                        value(s.min),
                        value(s.max),
                        value(s.average),
                        reading.history().len().to_string(),
                    )
                }
                None => ("-".into(), "-".into(), "-".into(), "-".into(), "0".into()),
            };

            Row::new(vec![
                Cell::from(format!("{} {}", channel.icon, channel.name))
                    .style(Style::default().fg(color)),
                Cell::from(format!("{}–{} {}", channel.min, channel.max, channel.unit)),
                Cell::from(current),
                Cell::from(min),
                Cell::from(max),
                Cell::from(average),
                Cell::from(samples),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3), // Sensor
        Constraint::Fill(2), // Range
        Constraint::Fill(2), // Current
        Constraint::Fill(2), // Min
        Constraint::Fill(2), // Max
        Constraint::Fill(2), // Average
        Constraint::Min(7),  // Samples
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Sensor data ({}) [t:cards] ", source))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(table, area);
}
