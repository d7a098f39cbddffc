//! Trailing report page: policy and plain-text body.

use serde::{Deserialize, Serialize};

/// When the trailing summary page is appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPolicy {
    /// Always append, including zero-missing runs.
    #[default]
    Always,
    /// Append only when at least one tag was never found.
    OnlyWhenMissing,
}

pub const REPORT_FONT_SIZE: f32 = 12.0;
/// Report text origin, measured from the page's top-left corner.
pub const REPORT_POSITION: (f32, f32) = (50.0, 50.0);

/// Body of the report page: a count line, then one tag per line.
pub fn render_report(missing: &[String]) -> String {
    let mut body = format!("Missing tags ({}):", missing.len());
    if missing.is_empty() {
        body.push('\n');
        body.push_str("All tags were found.");
    } else {
        for tag in missing {
            body.push('\n');
            body.push_str(tag);
        }
    }
    body
}

/// Whether a page should be appended for this run. An empty tag source never
/// gets a report page.
pub fn should_append(policy: ReportPolicy, tag_count: usize, missing_count: usize) -> bool {
    if tag_count == 0 {
        return false;
    }
    match policy {
        ReportPolicy::Always => true,
        ReportPolicy::OnlyWhenMissing => missing_count > 0,
    }
}
