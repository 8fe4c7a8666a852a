//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::cycle::CycleState;
use crate::data::DiagnosticState;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for acceptable / in-progress states.
    pub warning: Color,
    /// Color for the critical verdict and errors.
    pub critical: Color,
    /// Color for the optimal verdict.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for text that carries no state.
    pub muted: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            muted: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            muted: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a diagnostic state
    pub fn state_style(&self, state: DiagnosticState) -> Style {
        match state {
            DiagnosticState::Unknown => Style::default().fg(self.muted),
            DiagnosticState::Evaluating => Style::default().fg(self.warning),
            DiagnosticState::Optimal => {
                Style::default().fg(self.healthy).add_modifier(Modifier::BOLD)
            }
            DiagnosticState::Acceptable => {
                Style::default().fg(self.warning).add_modifier(Modifier::BOLD)
            }
            DiagnosticState::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Get style for the cycle lifecycle indicator
    pub fn cycle_style(&self, state: CycleState) -> Style {
        match state {
            CycleState::Idle => Style::default().fg(self.muted),
            CycleState::Running => Style::default().fg(self.highlight).add_modifier(Modifier::BOLD),
            CycleState::Completed => Style::default().fg(self.healthy),
        }
    }
}

/// Parse a catalog `#RRGGBB` color, falling back to `fallback`.
pub fn hex_color(hex: &str, fallback: Color) -> Color {
    Color::from_str(hex).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#4CAF50", Color::Reset), Color::Rgb(0x4c, 0xaf, 0x50));
        assert_eq!(hex_color("not a color", Color::Gray), Color::Gray);
    }

    #[test]
    fn test_verdicts_are_bold() {
        let theme = Theme::dark();
        for state in [DiagnosticState::Optimal, DiagnosticState::Acceptable, DiagnosticState::Critical]
        {
            assert!(theme.state_style(state).add_modifier.contains(Modifier::BOLD));
        }
        assert!(!theme.state_style(DiagnosticState::Unknown).add_modifier.contains(Modifier::BOLD));
    }
}
