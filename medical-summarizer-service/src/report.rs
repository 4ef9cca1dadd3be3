use chrono::{DateTime, Local, Utc};
use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::models::{AnalysisResult, Parameter};

/// Visual category of a parameter status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Normal,
    Critical,
    Abnormal,
    Borderline,
    Unknown,
}

impl StatusCategory {
    /// Case-insensitive lookup. The first matching rule wins, so "Borderline High"
    /// lands in `Abnormal`.
    pub fn classify(status: &str) -> Self {
        let status = status.to_lowercase();
        if status == "normal" {
            StatusCategory::Normal
        } else if status.contains("critical") {
            StatusCategory::Critical
        } else if status.contains("high") || status.contains("low") {
            StatusCategory::Abnormal
        } else if status.contains("borderline") {
            StatusCategory::Borderline
        } else {
            StatusCategory::Unknown
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            StatusCategory::Normal => "[ok]",
            StatusCategory::Critical => "[!!]",
            StatusCategory::Abnormal => "[! ]",
            StatusCategory::Borderline => "[~ ]",
            StatusCategory::Unknown => "[  ]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub data: AnalysisResult,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    pub fn new(data: AnalysisResult, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn title(&self) -> &str {
        self.data
            .patient
            .as_ref()
            .and_then(|patient| patient.report_type.as_deref())
            .unwrap_or(&self.file_name)
    }

    /// Plain-text export: one line per parameter, or the summary when there are none.
    pub fn copy_text(&self) -> String {
        if self.data.parameters.is_empty() {
            return self.data.summary.clone().unwrap_or_default();
        }
        self.data
            .parameters
            .iter()
            .map(|p| format!("{}: {} (Range: {}) - {}", p.name, p.result, p.normal_range, p.status))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let time = self.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let _ = writeln!(out, "== {} ({}) ==", self.title(), time);

        if let Some(patient) = self.data.patient.as_ref().filter(|p| p.has_identifying_info()) {
            if let Some(name) = &patient.name {
                let _ = writeln!(out, "Patient:    {}", name);
            }
            let age_gender = [patient.age.as_deref(), patient.gender.as_deref()]
                .into_iter()
                .flatten()
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(" / ");
            if !age_gender.is_empty() {
                let _ = writeln!(out, "Age/Gender: {}", age_gender);
            }
            if let Some(lab) = &patient.lab {
                let _ = writeln!(out, "Lab:        {}", lab);
            }
            if let Some(doctor) = &patient.doctor {
                let _ = writeln!(out, "Doctor:     {}", doctor);
            }
        }

        if !self.data.parameters.is_empty() {
            out.push('\n');
            out.push_str(&render_table(&self.data.parameters));
        }

        if let Some(summary) = self.data.summary.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "\nAssessment\n{}", summary);
        }

        if !self.data.recommendations.is_empty() {
            let _ = writeln!(out, "\nRecommendations");
            for (i, recommendation) in self.data.recommendations.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, recommendation);
            }
        }

        out
    }
}

fn render_table(parameters: &[Parameter]) -> String {
    let headers = ["Parameter", "Result", "Normal Range"];
    let mut widths = headers.map(str::len);
    for p in parameters {
        widths[0] = widths[0].max(p.name.chars().count());
        widths[1] = widths[1].max(p.result.chars().count());
        widths[2] = widths[2].max(p.normal_range.chars().count());
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<w0$}  {:<w1$}  {:<w2$}  Status",
        headers[0],
        headers[1],
        headers[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    );
    for p in parameters {
        let category = StatusCategory::classify(&p.status);
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:<w2$}  {} {}",
            p.name,
            p.result,
            p.normal_range,
            category.marker(),
            p.status,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    }
    out
}

/// Reports produced during one session, newest first. Nothing is persisted.
#[derive(Debug, Default)]
pub struct ReportHistory {
    reports: VecDeque<Report>,
}

impl ReportHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: Report) {
        self.reports.push_front(report);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientInfo;

    fn parameter(name: &str, result: &str, range: &str, status: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            result: result.to_string(),
            normal_range: range.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn status_labels_map_to_categories() {
        let cases = [
            ("Normal", StatusCategory::Normal),
            ("NORMAL", StatusCategory::Normal),
            ("Critical High", StatusCategory::Critical),
            ("critical low", StatusCategory::Critical),
            ("High", StatusCategory::Abnormal),
            ("Slightly Low", StatusCategory::Abnormal),
            ("Borderline High", StatusCategory::Abnormal),
            ("Borderline", StatusCategory::Borderline),
            ("Within normal limits", StatusCategory::Unknown),
            ("", StatusCategory::Unknown),
        ];
        for (label, expected) in cases {
            assert_eq!(StatusCategory::classify(label), expected, "label {label:?}");
        }
    }

    #[test]
    fn history_is_newest_first() {
        let mut history = ReportHistory::new();
        history.record(Report::new(AnalysisResult::default(), "first.txt"));
        history.record(Report::new(AnalysisResult::default(), "second.png"));

        let names: Vec<_> = history.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["second.png", "first.txt"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn copy_text_lists_parameters() {
        let data = AnalysisResult {
            parameters: vec![
                parameter("Hemoglobin", "10 g/dL", "13-17 g/dL", "Low"),
                parameter("WBC", "7.2", "4-11", "Normal"),
            ],
            summary: Some("Low hemoglobin.".to_string()),
            ..AnalysisResult::default()
        };
        let report = Report::new(data, "cbc.txt");

        assert_eq!(
            report.copy_text(),
            "Hemoglobin: 10 g/dL (Range: 13-17 g/dL) - Low\nWBC: 7.2 (Range: 4-11) - Normal"
        );
    }

    #[test]
    fn copy_text_falls_back_to_summary() {
        let report = Report::new(AnalysisResult::raw_fallback("unreadable scan"), "scan.png");
        assert_eq!(report.copy_text(), "unreadable scan");
    }

    #[test]
    fn render_includes_every_section() {
        let data = AnalysisResult {
            patient: Some(PatientInfo {
                name: Some("Jane Doe".to_string()),
                age: Some("42".to_string()),
                gender: Some("Female".to_string()),
                report_type: Some("CBC".to_string()),
                ..PatientInfo::default()
            }),
            parameters: vec![parameter("Hemoglobin", "10 g/dL", "12-15 g/dL", "Low")],
            summary: Some("Mild anemia.".to_string()),
            recommendations: vec!["Repeat CBC".to_string(), "Iron studies".to_string()],
            raw_text: false,
        };
        let rendered = Report::new(data, "cbc.txt").render();

        assert!(rendered.starts_with("== CBC ("));
        assert!(rendered.contains("Patient:    Jane Doe"));
        assert!(rendered.contains("Age/Gender: 42 / Female"));
        assert!(rendered.contains("[! ] Low"));
        assert!(rendered.contains("Assessment\nMild anemia."));
        assert!(rendered.contains("1. Repeat CBC\n2. Iron studies"));
    }

    #[test]
    fn patient_block_needs_identifying_fields() {
        let data = AnalysisResult {
            patient: Some(PatientInfo {
                gender: Some("Male".to_string()),
                ..PatientInfo::default()
            }),
            ..AnalysisResult::default()
        };
        let rendered = Report::new(data, "labs.txt").render();

        assert!(rendered.starts_with("== labs.txt ("));
        assert!(!rendered.contains("Age/Gender"));
    }
}
