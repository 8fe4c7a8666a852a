//! Terminal rendering.
//!
//! - [`common`]: header, selector bar, status bar and help overlay
//! - [`dashboard`]: diagnosis widget and per-channel sensor cards
//! - [`sensors`]: detailed sensor table
//! - [`serial`]: serial port panel
//! - [`theme`]: colors and styles

pub mod common;
pub mod dashboard;
pub mod sensors;
pub mod serial;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Minimum terminal size for usable display
pub const MIN_WIDTH: u16 = 70;
pub const MIN_HEIGHT: u16 = 20;

/// Render the whole screen.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.warning));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5);
        frame.render_widget(paragraph, centered.intersection(area));
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),  // Header bar
        Constraint::Length(4),  // Profile / manufacturer selectors
        Constraint::Length(10), // Diagnosis + serial panel
        Constraint::Min(7),     // Sensors
        Constraint::Length(1),  // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_selectors(frame, app, chunks[1]);

    let middle = Layout::horizontal([Constraint::Fill(2), Constraint::Fill(1)]).split(chunks[2]);
    dashboard::render_diagnosis(frame, app, middle[0]);
    serial::render(frame, app, middle[1]);

    if app.show_sensor_table {
        sensors::render(frame, app, chunks[3]);
    } else {
        dashboard::render_sensor_cards(frame, app, chunks[3]);
    }

    common::render_status_bar(frame, app, chunks[4]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
