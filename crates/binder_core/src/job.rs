use std::time::Duration;

use crate::filename::filesystem_safe_name;
use crate::report::Report;

/// How the accumulated chapters are packaged at the end of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One concatenated text document.
    Merged,
    /// One ZIP archive with a named entry per chapter.
    Archived,
}

/// Immutable configuration for one download run. Built once when the job
/// is launched and read-only for the job's lifetime.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub work_title: String,
    /// Processing order; may be empty, in which case the job completes
    /// trivially with an empty report.
    pub urls: Vec<String>,
    /// Mandatory pause between items, applied after failures too.
    pub item_delay: Duration,
    pub mode: OutputMode,
    /// Set when this job replays a previous failure report, so the new
    /// report replaces the old one under the same name.
    pub source_report_name: Option<String>,
}

impl DownloadJob {
    pub fn new(
        work_title: impl Into<String>,
        urls: Vec<String>,
        item_delay: Duration,
        mode: OutputMode,
    ) -> Self {
        Self {
            work_title: work_title.into(),
            urls,
            item_delay,
            mode,
            source_report_name: None,
        }
    }

    /// Build a retry job from a previously serialized failure report. Only
    /// the URLs are recovered; the report's own name is kept so the retry
    /// writes its remaining failures back to the same file.
    pub fn retry_from_report(
        work_title: impl Into<String>,
        report_name: impl Into<String>,
        report_text: &str,
        item_delay: Duration,
        mode: OutputMode,
    ) -> Self {
        Self {
            work_title: work_title.into(),
            urls: Report::parse_urls(report_text),
            item_delay,
            mode,
            source_report_name: Some(report_name.into()),
        }
    }

    pub fn artifact_filename(&self) -> String {
        let safe = filesystem_safe_name(&self.work_title);
        match self.mode {
            OutputMode::Merged => format!("{safe}.txt"),
            OutputMode::Archived => format!("{safe}.zip"),
        }
    }

    pub fn report_filename(&self) -> String {
        match &self.source_report_name {
            Some(name) => name.clone(),
            None => format!("{}_failed.txt", filesystem_safe_name(&self.work_title)),
        }
    }
}

/// Final output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// The accumulated text document (merged mode).
    Merged(String),
    /// Materialized ZIP bytes (archived mode); the failure report is an
    /// entry inside the archive.
    Archive(Vec<u8>),
}

/// Terminal state of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Completed {
        artifact: Artifact,
        artifact_filename: String,
        report: Report,
        report_filename: String,
        completed_count: usize,
    },
    /// Loop stopped at an iteration boundary after a cancel signal. The
    /// partial report covers everything classified before the stop.
    Cancelled {
        partial_report: Report,
        report_filename: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_derive_from_the_work_title() {
        let job = DownloadJob::new(
            "My: Novel",
            vec!["https://example.com/1".into()],
            Duration::ZERO,
            OutputMode::Merged,
        );
        assert_eq!(job.artifact_filename(), "My_ Novel.txt");
        assert_eq!(job.report_filename(), "My_ Novel_failed.txt");
    }

    #[test]
    fn retry_job_reuses_the_report_name_and_urls() {
        let text = "Skipped chapters:\nURL: https://example.com/2 (Reason: CAPTCHA/blocked)\nIncomplete chapters:\nnone\n";
        let job = DownloadJob::retry_from_report(
            "My Novel",
            "My Novel_failed.txt",
            text,
            Duration::from_millis(500),
            OutputMode::Archived,
        );
        assert_eq!(job.urls, vec!["https://example.com/2".to_string()]);
        assert_eq!(job.report_filename(), "My Novel_failed.txt");
        assert_eq!(job.artifact_filename(), "My Novel.zip");
    }
}
