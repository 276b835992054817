use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use binder_core::{Artifact, DownloadJob, JobResult, OutputMode, Report};
use binder_engine::{
    ArchiveError, ArchiveFactory, ArchiveWriter, DownloadEvent, DownloadOrchestrator,
    FetchSettings, ProgressSink, ReqwestChapterFetcher, SetupError,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chapter_body(title: &str, text: &str) -> String {
    format!(
        "<html><body><h1>{title}</h1>\
         <div id=\"novel_content\"><p>{text}</p></div></body></html>"
    )
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<DownloadEvent>>,
    cancel_after_first: Option<CancellationToken>,
}

impl CollectingSink {
    fn take(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: DownloadEvent) {
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
        self.events.lock().unwrap().push(event);
    }
}

fn orchestrator() -> DownloadOrchestrator {
    let fetcher =
        Arc::new(ReqwestChapterFetcher::new(&FetchSettings::default()).expect("client"));
    DownloadOrchestrator::with_default_archives(fetcher)
}

async fn mount_scenario(server: &MockServer) -> Vec<String> {
    Mock::given(method("GET"))
        .and(path("/ch/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(chapter_body("Chapter 1", "First chapter."), "text/html"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ch/2"))
        .respond_with(ResponseTemplate::new(403))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ch/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    (1..=3).map(|i| format!("{}/ch/{i}", server.uri())).collect()
}

#[tokio::test]
async fn mixed_outcomes_split_into_output_and_report() {
    let server = MockServer::start().await;
    let urls = mount_scenario(&server).await;
    let job = DownloadJob::new("My Work", urls.clone(), Duration::ZERO, OutputMode::Merged);
    let sink = CollectingSink::default();

    let result = orchestrator()
        .run(&job, &sink, &CancellationToken::new())
        .await
        .expect("no setup error");

    let JobResult::Completed {
        artifact,
        report,
        completed_count,
        artifact_filename,
        ..
    } = result
    else {
        panic!("expected completion");
    };

    assert_eq!(completed_count, 1);
    assert_eq!(artifact_filename, "My Work.txt");

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].url, urls[1]);
    assert_eq!(report.skipped[0].reason, "CAPTCHA/blocked");
    assert_eq!(report.incomplete.len(), 1);
    assert_eq!(report.incomplete[0].url, urls[2]);
    assert!(report.incomplete[0].reason.contains("500"));

    let Artifact::Merged(text) = artifact else {
        panic!("expected merged text");
    };
    assert_eq!(text.matches("=====").count(), 2, "exactly one chapter section");
    assert!(text.contains("===== Chapter 1 ====="));
    assert!(text.contains("First chapter."));

    // One progress event per processed item, percent driven by position.
    let percents: Vec<f64> = sink
        .take()
        .into_iter()
        .map(|event| match event {
            DownloadEvent::Progress(update) => update.stats.percent,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(percents, vec![33.3, 66.7, 100.0]);
}

#[tokio::test]
async fn archived_mode_packages_chapters_and_report() {
    let server = MockServer::start().await;
    let urls = mount_scenario(&server).await;
    let job = DownloadJob::new("My Work", urls, Duration::ZERO, OutputMode::Archived);
    let sink = CollectingSink::default();

    let result = orchestrator()
        .run(&job, &sink, &CancellationToken::new())
        .await
        .expect("no setup error");

    let JobResult::Completed { artifact, .. } = result else {
        panic!("expected completion");
    };
    let Artifact::Archive(bytes) = artifact else {
        panic!("expected archive bytes");
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("readable zip");
    assert_eq!(archive.len(), 2);

    let mut chapter = String::new();
    archive
        .by_name("Chapter 1.txt")
        .expect("chapter entry")
        .read_to_string(&mut chapter)
        .unwrap();
    assert_eq!(chapter, "First chapter.");

    let mut report_text = String::new();
    archive
        .by_name("My Work_failed.txt")
        .expect("report entry")
        .read_to_string(&mut report_text)
        .unwrap();
    assert_eq!(Report::parse_urls(&report_text).len(), 2);
}

#[tokio::test]
async fn inter_item_delay_applies_after_failed_fetches_too() {
    let server = MockServer::start().await;
    let mut urls = mount_scenario(&server).await;
    // Failures first: the rate bound must hold even when nothing succeeds
    // before the pause.
    urls.rotate_left(1);
    let delay = Duration::from_millis(100);
    let job = DownloadJob::new("My Work", urls, delay, OutputMode::Merged);
    let sink = CollectingSink::default();

    let started = std::time::Instant::now();
    let result = orchestrator()
        .run(&job, &sink, &CancellationToken::new())
        .await
        .expect("no setup error");
    // Three items, two pauses, the first one after a 403.
    assert!(started.elapsed() >= delay * 2);

    let JobResult::Completed {
        completed_count,
        report,
        ..
    } = result
    else {
        panic!("expected completion");
    };
    assert_eq!(completed_count, 1);
    assert_eq!(report.len(), 2);
}

#[tokio::test]
async fn cancellation_before_start_processes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let job = DownloadJob::new(
        "My Work",
        vec![format!("{}/ch/1", server.uri())],
        Duration::ZERO,
        OutputMode::Merged,
    );
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = CollectingSink::default();

    let result = orchestrator().run(&job, &sink, &cancel).await.unwrap();
    let JobResult::Cancelled { partial_report, .. } = result else {
        panic!("expected cancellation");
    };
    assert!(partial_report.is_empty());
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn cancellation_mid_job_keeps_items_already_processed() {
    let server = MockServer::start().await;
    let urls = mount_scenario(&server).await;
    let job = DownloadJob::new("My Work", urls, Duration::from_millis(200), OutputMode::Merged);

    let cancel = CancellationToken::new();
    let sink = CollectingSink {
        events: Mutex::new(Vec::new()),
        cancel_after_first: Some(cancel.clone()),
    };

    let result = orchestrator().run(&job, &sink, &cancel).await.unwrap();
    let JobResult::Cancelled { partial_report, .. } = result else {
        panic!("expected cancellation");
    };
    // Item 1 finished before the signal was honored; items 2 and 3 never ran.
    assert!(partial_report.is_empty());
    assert_eq!(sink.take().len(), 1);
}

#[tokio::test]
async fn empty_url_list_completes_trivially() {
    let job = DownloadJob::new("My Work", Vec::new(), Duration::ZERO, OutputMode::Merged);
    let sink = CollectingSink::default();

    let result = orchestrator()
        .run(&job, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let JobResult::Completed {
        artifact,
        report,
        completed_count,
        ..
    } = result
    else {
        panic!("expected completion");
    };
    assert_eq!(completed_count, 0);
    assert!(report.is_empty());
    assert_eq!(artifact, Artifact::Merged(String::new()));
}

struct FailingArchiveFactory;

impl ArchiveFactory for FailingArchiveFactory {
    fn create(&self) -> Result<Box<dyn ArchiveWriter>, ArchiveError> {
        Err(ArchiveError::Unavailable("zip backend not loaded".into()))
    }
}

#[tokio::test]
async fn missing_archive_capability_aborts_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher =
        Arc::new(ReqwestChapterFetcher::new(&FetchSettings::default()).expect("client"));
    let orchestrator = DownloadOrchestrator::new(fetcher, Arc::new(FailingArchiveFactory));

    let job = DownloadJob::new(
        "My Work",
        vec![format!("{}/ch/1", server.uri())],
        Duration::ZERO,
        OutputMode::Archived,
    );
    let sink = CollectingSink::default();

    let err = orchestrator
        .run(&job, &sink, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SetupError::ArchiveUnavailable(_)));
    assert!(sink.take().is_empty());
}
