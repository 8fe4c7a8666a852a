//! Diagnostic technical report.
//!
//! A report is built from a completed cycle's frozen snapshot and rendered
//! either as paginated plain text or as JSON.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::catalog::{ManufacturerStandard, ShockAbsorberProfile};
use crate::data::{DiagnosticResult, ReadingSummary, SensorAggregator};

pub const REPORT_TITLE: &str = "AmortiCheck Pro – Diagnostic Technical Report";

/// Lines per text page, footer included.
pub const LINES_PER_PAGE: usize = 40;

/// Output format of an exported report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSection {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    #[serde(flatten)]
    pub summary: ReadingSummary,
}

/// Everything printed on a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: &'static str,
    pub date: NaiveDate,
    pub profile: ProfileSection,
    pub manufacturer: ManufacturerStandard,
    pub diagnosis: DiagnosticResult,
    pub tests_performed: Vec<&'static str>,
    pub sensors: Vec<SensorRow>,
}

impl Report {
    /// Assemble a report from a frozen snapshot.
    ///
    /// Channels of `profile` missing from `snapshot` are reported as zero.
    pub fn build(
        profile: &ShockAbsorberProfile,
        manufacturer: &ManufacturerStandard,
        diagnosis: &DiagnosticResult,
        tests_performed: &[&'static str],
        snapshot: &SensorAggregator,
        date: NaiveDate,
    ) -> Self {
        let sensors = profile
            .channels
            .iter()
            .map(|channel| SensorRow {
                id: channel.id,
                name: channel.name,
                unit: channel.unit,
                summary: snapshot
                    .get(channel.id)
                    .map(|r| r.summary())
                    .unwrap_or(ReadingSummary {
                        current: 0.0,
                        min: 0.0,
                        max: 0.0,
                        average: 0.0,
                    }),
            })
            .collect();

        Self {
            title: REPORT_TITLE,
            date,
            profile: ProfileSection {
                id: profile.id,
                name: profile.name,
                description: profile.description,
            },
            manufacturer: *manufacturer,
            diagnosis: diagnosis.clone(),
            tests_performed: tests_performed.to_vec(),
            sensors,
        }
    }

    /// `report-<profile>-<YYYY-MM-DD>.<ext>`
    pub fn file_name(&self, format: ReportFormat) -> String {
        format!(
            "report-{}-{}.{}",
            self.profile.id,
            self.date.format("%Y-%m-%d"),
            format.extension()
        )
    }

    fn body_lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.title.to_string(),
            "=".repeat(self.title.chars().count()),
            String::new(),
            "Shock absorber type:".to_string(),
            format!("  {} - {}", self.profile.name, self.profile.description),
            String::new(),
            "Manufacturer:".to_string(),
            format!("  {} (Norm: {})", self.manufacturer.name, self.manufacturer.norm),
            String::new(),
            "Diagnosis:".to_string(),
            format!("  {} - {}", self.diagnosis.state.label(), self.diagnosis.description),
            String::new(),
            "Date:".to_string(),
            format!("  {}", self.date.format("%Y-%m-%d")),
            String::new(),
            "Tests performed:".to_string(),
        ];

        if self.tests_performed.is_empty() {
            lines.push("  (none recorded)".to_string());
        } else {
            lines.extend(self.tests_performed.iter().map(|t| format!("  • {}", t)));
        }

        lines.push(String::new());
        lines.push("Sensor technical data:".to_string());
        lines.push(format!(
            "  {:<24} {:>12} {:>12} {:>12} {:>12}",
            "Sensor", "Value", "Min", "Max", "Average"
        ));
        for row in &self.sensors {
            let cell = |v: f64| format!("{:.0} {}", v.round(), row.unit);
            lines.push(format!(
                "  {:<24} {:>12} {:>12} {:>12} {:>12}",
                row.name,
                cell(row.summary.current),
                cell(row.summary.min),
                cell(row.summary.max),
                cell(row.summary.average)
            ));
        }

        lines.push(String::new());
        lines.push("Manufacturer standards:".to_string());
        lines.push(format!("  • Applied norm: {}", self.manufacturer.norm));
        lines.push(format!("  • Gas pressure: {}", self.manufacturer.gas_pressure));
        lines.push(format!("  • Fatigue cycles: {}", self.manufacturer.fatigue_cycles));
        lines
    }

    /// Render as plain text pages separated by form feeds.
    pub fn render_text(&self) -> String {
        let body = self.body_lines();
        // Blank line plus footer
        let per_page = LINES_PER_PAGE - 2;
        let pages: Vec<&[String]> = body.chunks(per_page).collect();
        let total = pages.len();

        let mut out = String::new();
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                out.push('\u{c}');
            }
            for line in page.iter() {
                out.push_str(line);
                out.push('\n');
            }
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "AmortiCheck Pro © {} – page {}/{}",
                self.date.year(),
                i + 1,
                total
            );
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Write the report into `dir`, creating it if needed.
    pub fn write(&self, dir: &Path, format: ReportFormat) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report directory {}", dir.display()))?;
        let path = dir.join(self.file_name(format));
        fs::write(&path, self.render(format)?)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::data::Verdict;

    fn sample_report(tests: &[&'static str]) -> Report {
        let profile = catalog::profile("gas_monotubo").unwrap();
        let manufacturer = catalog::manufacturer("ohlins").unwrap();
        let mut snapshot = SensorAggregator::new(profile.channels);
        snapshot.ingest("vibracion", 10.4);
        snapshot.ingest("vibracion", 20.6);
        snapshot.ingest("presion_gas", 24.5);

        Report::build(
            profile,
            manufacturer,
            &DiagnosticResult::verdict(Verdict::Acceptable),
            tests,
            &snapshot,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        )
    }

    #[test]
    fn test_file_name() {
        let report = sample_report(&[]);
        assert_eq!(report.file_name(ReportFormat::Text), "report-gas_monotubo-2024-03-09.txt");
        assert_eq!(report.file_name(ReportFormat::Json), "report-gas_monotubo-2024-03-09.json");
    }

    #[test]
    fn test_rows_follow_profile_channels() {
        let report = sample_report(&[]);
        let profile = catalog::profile("gas_monotubo").unwrap();
        let ids: Vec<_> = report.sensors.iter().map(|r| r.id).collect();
        let expected: Vec<_> = profile.channels.iter().map(|c| c.id).collect();
        assert_eq!(ids, expected);

        let vibration = &report.sensors[0];
        assert_eq!(vibration.summary.current, 20.6);
        assert_eq!(vibration.summary.min, 10.4);
        assert_eq!(vibration.summary.average, 15.5);
    }

    #[test]
    fn test_text_sections() {
        let text = sample_report(&["Gas Pressure Measurement (20-30 bar)"]).render_text();
        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("ACCEPTABLE - "));
        assert!(text.contains("  • Gas Pressure Measurement (20-30 bar)"));
        assert!(text.contains("Öhlins (Norm: "));
        assert!(text.contains("2024-03-09"));
        // Rounded to integers with unit
        assert!(text.contains("21 Hz"));
        assert!(text.contains("AmortiCheck Pro © 2024 – page 1/1"));
        assert!(!text.contains('\u{c}'));
    }

    #[test]
    fn test_empty_tests_are_marked() {
        let text = sample_report(&[]).render_text();
        assert!(text.contains("(none recorded)"));
    }

    #[test]
    fn test_long_reports_are_paginated() {
        let tests: Vec<&'static str> = vec!["Repeated test"; 60];
        let report = sample_report(&tests);
        let text = report.render_text();

        let pages: Vec<&str> = text.split('\u{c}').collect();
        assert!(pages.len() >= 3);
        let total = pages.len();
        for (i, page) in pages.iter().enumerate() {
            assert!(page.lines().count() <= LINES_PER_PAGE);
            assert!(page.trim_end().ends_with(&format!("page {}/{}", i + 1, total)));
        }
    }

    #[test]
    fn test_json_model() {
        let json = sample_report(&["Oil Leak Test"]).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["date"], "2024-03-09");
        assert_eq!(value["profile"]["id"], "gas_monotubo");
        assert_eq!(value["diagnosis"]["state"], "Acceptable");
        assert_eq!(value["tests_performed"][0], "Oil Leak Test");
        assert_eq!(value["sensors"][0]["id"], "vibracion");
        assert_eq!(value["sensors"][0]["max"], 20.6);
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports");
        let report = sample_report(&[]);

        let path = report.write(&target, ReportFormat::Json).unwrap();
        assert_eq!(path, target.join("report-gas_monotubo-2024-03-09.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_json().unwrap());
    }
}
