use std::{fs, io, path::Path, path::PathBuf};

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static REPORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)(?:-\d+)?_changes_(\d{8}_\d{6})\.html$").expect("valid report name regex")
});

/// A persisted report discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub domain: String,
    pub generated_at: NaiveDateTime,
    pub path: PathBuf,
}

/// Lists reports in `dir`, newest first. Files that do not follow the
/// report naming scheme are ignored.
pub fn list_reports(dir: &Path) -> io::Result<Vec<ReportEntry>> {
    let mut reports = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(report) = parse_report_name(name) {
            reports.push(ReportEntry {
                path: entry.path(),
                ..report
            });
        }
    }
    reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    Ok(reports)
}

fn parse_report_name(name: &str) -> Option<ReportEntry> {
    let captures = REPORT_NAME.captures(name)?;
    let generated_at = NaiveDateTime::parse_from_str(&captures[2], "%Y%m%d_%H%M%S").ok()?;
    Some(ReportEntry {
        domain: captures[1].replace('_', "."),
        generated_at,
        path: PathBuf::from(name),
    })
}
