use std::sync::{mpsc, Arc};
use std::thread;

use binder_core::DownloadJob;
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchSettings, ReqwestChapterFetcher};
use crate::orchestrate::{
    ChannelProgressSink, DownloadEvent, DownloadOrchestrator, SetupError,
};

/// Runs one job on a dedicated thread with its own tokio runtime and
/// streams [`DownloadEvent`]s back over a channel. This is the surface a
/// presentation layer polls; the job itself stays strictly sequential.
pub struct DownloadHandle {
    cancel: CancellationToken,
    event_rx: mpsc::Receiver<DownloadEvent>,
}

impl DownloadHandle {
    pub fn spawn(job: DownloadJob, settings: FetchSettings) -> Self {
        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel();
        let token = cancel.clone();

        thread::spawn(move || {
            let fetcher = match ReqwestChapterFetcher::new(&settings) {
                Ok(fetcher) => Arc::new(fetcher),
                Err(err) => {
                    let _ = event_tx.send(DownloadEvent::Finished {
                        result: Err(SetupError::HttpClient(err.to_string())),
                    });
                    return;
                }
            };
            let orchestrator = DownloadOrchestrator::with_default_archives(fetcher);
            let sink = ChannelProgressSink::new(event_tx.clone());

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = event_tx.send(DownloadEvent::Finished {
                        result: Err(SetupError::HttpClient(err.to_string())),
                    });
                    return;
                }
            };
            let result = runtime.block_on(orchestrator.run(&job, &sink, &token));
            let _ = event_tx.send(DownloadEvent::Finished { result });
        });

        Self { cancel, event_rx }
    }

    /// Request cancellation; honored at the next loop boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn try_recv(&self) -> Option<DownloadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event or the worker thread is gone.
    pub fn recv(&self) -> Option<DownloadEvent> {
        self.event_rx.recv().ok()
    }
}
