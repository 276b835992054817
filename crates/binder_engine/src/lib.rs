//! Binder engine: the chapter download pipeline and its IO seams.
mod archive;
mod extract;
mod fetch;
mod handle;
mod orchestrate;
mod persist;

pub use archive::{ArchiveError, ArchiveFactory, ArchiveWriter, ZipArchiveFactory, ZipArchiveWriter};
pub use extract::{normalize_content, ExtractedChapter, Extractor, SelectorExtractor, IMAGE_PLACEHOLDER};
pub use fetch::{ChapterFetcher, FetchSettings, ReqwestChapterFetcher};
pub use handle::DownloadHandle;
pub use orchestrate::{
    ChannelProgressSink, DownloadEvent, DownloadOrchestrator, ProgressSink, ProgressUpdate,
    SetupError,
};
pub use persist::{ensure_output_dir, save_result, AtomicFileWriter, PersistError, SavedArtifacts};
