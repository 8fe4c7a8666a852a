//! Diagnostic results and the verdict rotation.

use std::borrow::Cow;

use serde::Serialize;

/// Categorical state shown in the diagnostic widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticState {
    Unknown,
    Evaluating,
    Optimal,
    Critical,
    Acceptable,
}

impl DiagnosticState {
    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticState::Unknown => "Unknown",
            DiagnosticState::Evaluating => "Evaluating",
            DiagnosticState::Optimal => "OPTIMAL",
            DiagnosticState::Critical => "CRITICAL",
            DiagnosticState::Acceptable => "ACCEPTABLE",
        }
    }
}

/// Final categorical verdict of a completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Optimal,
    Critical,
    Acceptable,
}

impl Verdict {
    /// Fixed rotation order.
    pub const ROTATION: [Verdict; 3] = [Verdict::Optimal, Verdict::Critical, Verdict::Acceptable];

    pub fn state(&self) -> DiagnosticState {
        match self {
            Verdict::Optimal => DiagnosticState::Optimal,
            Verdict::Critical => DiagnosticState::Critical,
            Verdict::Acceptable => DiagnosticState::Acceptable,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Optimal => {
                "The shock absorber operates under optimal conditions according to the manufacturer's standards."
            }
            Verdict::Critical => {
                "The shock absorber requires immediate intervention according to the test results."
            }
            Verdict::Acceptable => {
                "The shock absorber shows signs of wear; an inspection is recommended."
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Verdict::Optimal => "#4CAF50",
            Verdict::Critical => "#F44336",
            Verdict::Acceptable => "#FF9800",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Verdict::Optimal => "✅",
            Verdict::Critical => "❌",
            Verdict::Acceptable => "⚠️",
        }
    }
}

/// State, description and presentation of the current diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticResult {
    pub state: DiagnosticState,
    pub description: Cow<'static, str>,
    pub color: &'static str,
    pub icon: &'static str,
}

pub const PROMPT_DESCRIPTION: &str = "Select the shock absorber type and manufacturer to begin";
pub const STOPPED_DESCRIPTION: &str = "Diagnosis stopped. Ready for a new evaluation.";
pub const STARTING_DESCRIPTION: &str = "Starting profile-specific tests...";
pub const TESTING_DESCRIPTION: &str = "Running technical tests...";

impl DiagnosticResult {
    pub fn unknown(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            state: DiagnosticState::Unknown,
            description: description.into(),
            color: "#9E9E9E",
            icon: "❓",
        }
    }

    pub fn evaluating(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            state: DiagnosticState::Evaluating,
            description: description.into(),
            color: "#FF9800",
            icon: "⏳",
        }
    }

    pub fn verdict(verdict: Verdict) -> Self {
        Self {
            state: verdict.state(),
            description: Cow::Borrowed(verdict.description()),
            color: verdict.color(),
            icon: verdict.icon(),
        }
    }
}

impl Default for DiagnosticResult {
    fn default() -> Self {
        Self::unknown(PROMPT_DESCRIPTION)
    }
}

/// Counter selecting the next verdict.
///
/// Lives for the whole session and is never reset by `start`/`stop`; only
/// completed cycles advance it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerdictRotation {
    completed: u64,
}

impl VerdictRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The verdict the next completed cycle will get.
    pub fn peek(&self) -> Verdict {
        Verdict::ROTATION[(self.completed % Verdict::ROTATION.len() as u64) as usize]
    }

    /// Take the verdict for a completed cycle and advance.
    pub fn advance(&mut self) -> Verdict {
        let verdict = self.peek();
        self.completed += 1;
        verdict
    }

    /// Number of cycles completed so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_order() {
        let mut rotation = VerdictRotation::new();
        let verdicts: Vec<_> = (0..6).map(|_| rotation.advance()).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::Optimal,
                Verdict::Critical,
                Verdict::Acceptable,
                Verdict::Optimal,
                Verdict::Critical,
                Verdict::Acceptable,
            ]
        );
        assert_eq!(rotation.completed(), 6);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut rotation = VerdictRotation::new();
        for _ in 0..4 {
            rotation.advance();
        }
        assert_eq!(rotation.peek(), Verdict::Critical);
        assert_eq!(rotation.peek(), Verdict::Critical);
        assert_eq!(rotation.completed(), 4);
    }

    #[test]
    fn test_result_presentation() {
        let result = DiagnosticResult::verdict(Verdict::Critical);
        assert_eq!(result.state, DiagnosticState::Critical);
        assert_eq!(result.color, "#F44336");

        let idle = DiagnosticResult::default();
        assert_eq!(idle.state.label(), "Unknown");
        assert_eq!(idle.description, PROMPT_DESCRIPTION);
    }
}
