use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Windows reports releases too
    if key.kind == KeyEventKind::Release {
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Cycle
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_cycle(),

        // Selectors
        KeyCode::Char('p') => app.next_profile(),
        KeyCode::Char('P') => app.prev_profile(),
        KeyCode::Char('m') => app.next_manufacturer(),
        KeyCode::Char('M') => app.prev_manufacturer(),

        // Views
        KeyCode::Char('t') => app.toggle_sensor_table(),
        KeyCode::Char('?') => app.toggle_help(),

        // Serial device
        KeyCode::Char('d') => app.detect_ports(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_port(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_port(),
        KeyCode::Char('c') => app.connect(),
        KeyCode::Char('x') => app.disconnect(),

        // Export
        KeyCode::Char('e') => match app.export_report() {
            Ok(path) => app.set_status_message(format!("Exported to {}", path.display())),
            Err(e) => app.set_status_message(format!("Export failed: {}", e)),
        },

        _ => {}
    }
}
