use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    diff::{escape_html, render_table_html, DiffRow},
    domain::Target,
};

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const HEADING_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const STYLESHEET: &str = r#"        body {
            margin: 20px 40px;
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            line-height: 1.6;
        }
        .summary {
            white-space: pre-wrap;
        }
        .diff-container {
            border: 1px solid #e1e4e8;
            border-radius: 8px;
            margin: 20px 0;
            overflow-x: auto;
        }
        .diff-table {
            width: 100%;
            border-collapse: collapse;
            table-layout: fixed;
        }
        .diff-table td {
            width: 50%;
            vertical-align: top;
            padding: 12px;
            border: 1px solid #e1e4e8;
            font-family: SFMono-Regular, Consolas, Liberation Mono, Menlo, monospace;
            font-size: 14px;
        }
        .removed td {
            background-color: #ffebe9;
        }
        .added td {
            background-color: #e6ffec;
        }
        .diff-remove {
            background-color: #ffd7d5;
            text-decoration: line-through;
            color: #86181d;
        }
        .diff-add {
            background-color: #ccffd8;
            color: #176f2c;
        }
        h1, h2 {
            color: #1a1a1a;
        }
        .timestamp {
            color: #666;
            font-size: 0.9em;
        }"#;

/// A rendered, self-contained change report ready to persist.
#[derive(Debug, Clone)]
pub struct Report {
    pub target: Target,
    pub document: String,
    label: String,
    stamp: String,
}

impl Report {
    /// `{label}_changes_{YYYYmmdd_HHMMSS}.html`
    pub fn file_name(&self) -> String {
        format!("{}_changes_{}.html", self.label, self.stamp)
    }

    /// Name for the `attempt`-th report sharing a label and second; the
    /// first attempt is the plain name, later ones get `-N` on the label.
    pub fn numbered_file_name(&self, attempt: u32) -> String {
        if attempt <= 1 {
            self.file_name()
        } else {
            format!("{}-{}_changes_{}.html", self.label, attempt, self.stamp)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    timezone: Tz,
}

impl ReportGenerator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn generate(&self, target: &Target, summary: &str, rows: &[DiffRow]) -> Report {
        self.generate_at(target, summary, rows, Utc::now())
    }

    pub fn generate_at(
        &self,
        target: &Target,
        summary: &str,
        rows: &[DiffRow],
        generated_at: DateTime<Utc>,
    ) -> Report {
        let local = generated_at.with_timezone(&self.timezone);
        let escaped_target = escape_html(target.as_str());
        let document = format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>Change Report - {target}</title>\n\
             <style>\n{style}\n</style>\n\
             </head>\n\
             <body>\n\
             <h1>Website Change Report</h1>\n\
             <h2>{target} <span class=\"timestamp\">({heading_time})</span></h2>\n\
             <h3>Summary of Changes</h3>\n\
             <div class=\"summary\">{summary}</div>\n\
             <h3>Detailed Comparison</h3>\n\
             {table}\n\
             </body>\n\
             </html>\n",
            target = escaped_target,
            style = STYLESHEET,
            heading_time = local.format(HEADING_TIMESTAMP_FORMAT),
            summary = escape_html(summary),
            table = render_table_html(rows),
        );

        Report {
            target: target.clone(),
            document,
            label: target.file_label(),
            stamp: local.format(FILE_TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::diff::{compute_diff, render_side_by_side};

    #[test]
    fn document_embeds_heading_summary_and_table() {
        let generator = ReportGenerator::new(chrono_tz::UTC);
        let rows = render_side_by_side(&compute_diff("A\nB\nC", "A\nX\nC"));
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let report = generator.generate_at(
            &Target::new("https://www.example.com/page"),
            "- B became X",
            &rows,
            at,
        );

        assert_eq!(report.file_name(), "example.com_changes_20240309_140507.html");
        assert_eq!(
            report.numbered_file_name(2),
            "example.com-2_changes_20240309_140507.html"
        );
        assert!(report.document.starts_with("<!DOCTYPE html>"));
        assert!(report.document.contains(
            "<h2>https://www.example.com/page <span class=\"timestamp\">(2024-03-09 14:05)</span></h2>"
        ));
        assert!(report
            .document
            .contains("<div class=\"summary\">- B became X</div>"));
        assert!(report
            .document
            .contains("<span class=\"diff-remove\">B</span>"));
        assert!(report.document.contains("<span class=\"diff-add\">X</span>"));
    }

    #[test]
    fn timezone_applies_to_name_and_heading() {
        let generator = ReportGenerator::new(chrono_tz::Asia::Seoul);
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let report = generator.generate_at(&Target::new("https://example.com"), "s", &[], at);
        assert_eq!(report.file_name(), "example.com_changes_20250101_050000.html");
        assert!(report.document.contains("(2025-01-01 05:00)"));
    }

    #[test]
    fn summary_markup_is_escaped() {
        let generator = ReportGenerator::new(chrono_tz::UTC);
        let report = generator.generate(&Target::new("https://example.com"), "<script>x</script>", &[]);
        assert!(!report.document.contains("<script>"));
        assert!(report.document.contains("&lt;script&gt;x&lt;/script&gt;"));
    }
}
