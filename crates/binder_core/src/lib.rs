//! Binder core: pure job model, progress arithmetic and the failure-report codec.
mod filename;
mod job;
mod outcome;
mod progress;
mod report;

pub use filename::{entry_filename, filesystem_safe_name};
pub use job::{Artifact, DownloadJob, JobResult, OutputMode};
pub use outcome::FetchOutcome;
pub use progress::{format_duration, ProgressStats, ProgressTracker, SAMPLE_WINDOW};
pub use report::{FailedItem, Report};
