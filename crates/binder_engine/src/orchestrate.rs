use std::collections::HashMap;
use std::sync::{mpsc, Arc};

use binder_core::{
    entry_filename, Artifact, DownloadJob, FailedItem, FetchOutcome, JobResult, OutputMode,
    ProgressStats, ProgressTracker, Report,
};
use binder_logging::{binder_debug, binder_info, binder_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::archive::{ArchiveFactory, ArchiveWriter, ZipArchiveFactory};
use crate::fetch::ChapterFetcher;

/// Fatal pre-loop failures. Everything per-item is a [`FetchOutcome`] and
/// never crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Archived mode was requested but no archive writer could be created.
    /// Raised before any network activity; no job state is mutated.
    #[error("archiving capability unavailable: {0}")]
    ArchiveUnavailable(String),
    #[error("http client unavailable: {0}")]
    HttpClient(String),
}

/// Stats surfaced to observers after every processed item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// 1-based position in the URL sequence (processed items, not
    /// successes).
    pub position: usize,
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub incomplete: usize,
    pub stats: ProgressStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress(ProgressUpdate),
    Finished { result: Result<JobResult, SetupError> },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: DownloadEvent);
}

/// Sink that forwards events over a std mpsc channel, for consumers
/// polling from another thread.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<DownloadEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<DownloadEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: DownloadEvent) {
        let _ = self.tx.send(event);
    }
}

/// Mutable state for one run, owned exclusively by the orchestrator loop
/// and dropped when the job ends.
struct JobState {
    completed_count: usize,
    skipped: Vec<FailedItem>,
    incomplete: Vec<FailedItem>,
    cancelled: bool,
    merged: String,
    entry_names: HashMap<String, usize>,
}

impl JobState {
    fn new() -> Self {
        Self {
            completed_count: 0,
            skipped: Vec::new(),
            incomplete: Vec::new(),
            cancelled: false,
            merged: String::new(),
            entry_names: HashMap::new(),
        }
    }

    fn append_merged(&mut self, title: &str, content: &str) {
        if !self.merged.is_empty() {
            self.merged.push_str("\n\n");
        }
        self.merged.push_str(&format!("===== {title} =====\n\n"));
        self.merged.push_str(content);
    }

    /// Archive entry name for a chapter title; a repeated title gets a
    /// ` (n)` suffix so no entry is silently overwritten.
    fn unique_entry_name(&mut self, title: &str) -> String {
        let base = entry_filename(title, "txt");
        let seen = self.entry_names.entry(base.clone()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            base
        } else {
            let stem = base.strip_suffix(".txt").unwrap_or(&base);
            format!("{stem} ({}).txt", *seen)
        }
    }
}

/// Drives the sequential loop over a job's URL sequence: rate-limits,
/// classifies each fetch, accumulates output, reports progress, honors
/// cancellation at iteration boundaries and assembles the final artifact
/// plus failure report.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn ChapterFetcher>,
    archives: Arc<dyn ArchiveFactory>,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: Arc<dyn ChapterFetcher>, archives: Arc<dyn ArchiveFactory>) -> Self {
        Self { fetcher, archives }
    }

    pub fn with_default_archives(fetcher: Arc<dyn ChapterFetcher>) -> Self {
        Self::new(fetcher, Arc::new(ZipArchiveFactory))
    }

    pub async fn run(
        &self,
        job: &DownloadJob,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<JobResult, SetupError> {
        // Archived mode needs its writer before the first fetch; a missing
        // packaging capability must not surface as a mid-job failure.
        let mut archive: Option<Box<dyn ArchiveWriter>> = match job.mode {
            OutputMode::Archived => Some(
                self.archives
                    .create()
                    .map_err(|err| SetupError::ArchiveUnavailable(err.to_string()))?,
            ),
            OutputMode::Merged => None,
        };

        binder_info!(
            "job '{}' started: {} urls, {:?} mode",
            job.work_title,
            job.urls.len(),
            job.mode
        );

        let mut state = JobState::new();
        let mut tracker = ProgressTracker::new(job.urls.len());

        for (index, url) in job.urls.iter().enumerate() {
            // Checked only at iteration boundaries; an in-flight fetch is
            // never aborted, so at most one extra item completes.
            if cancel.is_cancelled() {
                state.cancelled = true;
                break;
            }

            let outcome = self.fetcher.fetch(url).await;
            self.record(&mut state, &mut archive, url, outcome);

            let stats = tracker.update(index + 1);
            binder_debug!(
                "item {}/{}: {}%, about {} left",
                index + 1,
                job.urls.len(),
                stats.percent,
                stats.remaining_text()
            );
            sink.emit(DownloadEvent::Progress(ProgressUpdate {
                position: index + 1,
                total: job.urls.len(),
                completed: state.completed_count,
                skipped: state.skipped.len(),
                incomplete: state.incomplete.len(),
                stats,
            }));

            // Rate bound: the pause applies after failed fetches too.
            if index + 1 < job.urls.len() && !job.item_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(job.item_delay) => {}
                }
            }
        }

        self.finalize(job, state, archive)
    }

    fn record(
        &self,
        state: &mut JobState,
        archive: &mut Option<Box<dyn ArchiveWriter>>,
        url: &str,
        outcome: FetchOutcome,
    ) {
        match outcome {
            FetchOutcome::Success { title, content } => {
                match archive {
                    Some(writer) => {
                        let name = state.unique_entry_name(&title);
                        if let Err(err) = writer.add_entry(&name, &content) {
                            binder_warn!("archive entry '{name}' failed: {err}");
                            state
                                .incomplete
                                .push(FailedItem::new(url, format!("archive write: {err}")));
                            return;
                        }
                    }
                    None => state.append_merged(&title, &content),
                }
                state.completed_count += 1;
            }
            blocked @ FetchOutcome::Blocked => {
                binder_warn!("blocked at {url}");
                let reason = blocked.failure_reason().unwrap_or_default();
                state.skipped.push(FailedItem::new(url, reason));
            }
            failure => {
                let reason = failure.failure_reason().unwrap_or_default();
                binder_warn!("failed at {url}: {reason}");
                state.incomplete.push(FailedItem::new(url, reason));
            }
        }
    }

    fn finalize(
        &self,
        job: &DownloadJob,
        state: JobState,
        archive: Option<Box<dyn ArchiveWriter>>,
    ) -> Result<JobResult, SetupError> {
        let report = Report::new(state.skipped, state.incomplete);
        let report_filename = job.report_filename();

        if state.cancelled {
            binder_info!("job '{}' cancelled after {} items", job.work_title, state.completed_count);
            return Ok(JobResult::Cancelled {
                partial_report: report,
                report_filename,
            });
        }

        let artifact = match archive {
            Some(mut writer) => {
                if let Err(err) = writer.add_entry(&report_filename, &report.serialize()) {
                    binder_warn!("report entry failed: {err}");
                }
                let bytes = writer
                    .finish()
                    .map_err(|err| SetupError::ArchiveUnavailable(err.to_string()))?;
                Artifact::Archive(bytes)
            }
            None => Artifact::Merged(state.merged),
        };

        binder_info!(
            "job '{}' completed: {} ok, {} failed",
            job.work_title,
            state.completed_count,
            report.len()
        );

        Ok(JobResult::Completed {
            artifact,
            artifact_filename: job.artifact_filename(),
            report,
            report_filename,
            completed_count: state.completed_count,
        })
    }
}
