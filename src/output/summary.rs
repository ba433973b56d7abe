//! Markdown summary generation
//!
//! This module renders a human-readable markdown report of one job: run
//! metadata, capture statistics and a table of captured pages.

use super::OutputResult;
use crate::jobs::Job;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `job` to `output_path`
pub fn write_job_summary(job: &Job, output_path: &Path) -> OutputResult<()> {
    let markdown = format_job_summary(job);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a job as markdown
pub fn format_job_summary(job: &Job) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Shutter Job Summary\n\n");

    // Job metadata
    md.push_str("## Job Information\n\n");
    md.push_str(&format!("- **Job ID**: {}\n", job.id));
    md.push_str(&format!("- **Source URL**: {}\n", job.source_url));
    md.push_str(&format!("- **Domain**: {}\n", job.domain));
    md.push_str(&format!("- **Status**: {}\n", job.status));
    md.push_str(&format!("- **Page Limit**: {}\n", job.page_limit));
    md.push_str(&format!("- **Started**: {}\n", job.start_time.to_rfc3339()));
    if let Some(end) = job.end_time {
        md.push_str(&format!("- **Finished**: {}\n", end.to_rfc3339()));
    }
    if let Some(duration) = job.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(error) = &job.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Pages Captured**: {}\n", job.screenshots.len()));
    md.push_str(&format!(
        "- **Limit Usage**: {:.2}%\n\n",
        job.screenshots.len() as f64 * 100.0 / job.page_limit.max(1) as f64
    ));

    if job.screenshots.is_empty() {
        md.push_str("_No pages were captured._\n");
        return md;
    }

    md.push_str("## Captured Pages\n\n");
    md.push_str("| # | Title | URL | Thumbnail |\n");
    md.push_str("|---|-------|-----|-----------|\n");
    for (i, screenshot) in job.screenshots.iter().enumerate() {
        let title = if screenshot.title.is_empty() {
            "(untitled)".to_string()
        } else {
            escape_cell(&screenshot.title)
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            i + 1,
            title,
            escape_cell(&screenshot.source_url),
            screenshot.thumbnail_url
        ));
    }

    md
}

/// Keeps table cells on one line and out of the column separators
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}
