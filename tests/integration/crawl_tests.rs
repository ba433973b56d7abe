//! Integration tests for the crawler
//!
//! These tests drive the full orchestrator against an in-memory site served
//! by the testing render backend, and use wiremock where the content probe
//! needs a real HTTP server.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use sumi_shutter::config::Config;
use sumi_shutter::events::JobEvent;
use sumi_shutter::render::testing::{SiteFixture, TestLauncher};
use sumi_shutter::render::BackendLauncher;
use sumi_shutter::{CaptureEvent, Job, JobRequest, JobStatus, Orchestrator, ShutterError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    tmp: TempDir,
    site: SiteFixture,
    orchestrator: Orchestrator,
}

fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.navigation_timeout = 1;
    config.crawler.settle_delay_ms = 0;
    config.crawler.probe_content_type = false;
    config.browser.viewport_width = 64;
    config.browser.viewport_height = 48;
    config.output.screenshots_dir = tmp.path().to_path_buf();
    config
}

fn harness(site: SiteFixture) -> Harness {
    harness_with(site.clone(), TestLauncher::new(site), |_| {})
}

fn harness_with<L, F>(site: SiteFixture, launcher: L, configure: F) -> Harness
where
    L: BackendLauncher + 'static,
    F: FnOnce(&mut Config),
{
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    configure(&mut config);

    let orchestrator = Orchestrator::new(config, Arc::new(launcher)).unwrap();
    Harness {
        tmp,
        site,
        orchestrator,
    }
}

/// Runs one job to its terminal event and returns the job and its events
async fn run_job(h: &Harness, url: &str, page_limit: Option<usize>) -> (Job, Vec<JobEvent>) {
    let events = h.orchestrator.subscribe();
    let handle = h
        .orchestrator
        .submit(JobRequest {
            source_url: url.to_string(),
            page_limit,
        })
        .await
        .unwrap();
    let job_id = handle.id();

    let events = tokio::time::timeout(Duration::from_secs(30), events.until_terminal())
        .await
        .expect("job did not finish");
    handle.wait().await.unwrap();

    let job = h.orchestrator.get(job_id).await.unwrap();
    (job, events)
}

fn captured_paths(job: &Job) -> Vec<String> {
    job.screenshots
        .iter()
        .map(|s| Url::parse(&s.source_url).unwrap().path().to_string())
        .collect()
}

fn failed_urls(events: &[JobEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            CaptureEvent::PageFailed { url, .. } => Some(url.clone()),
            _ => None,
        })
        .collect()
}

fn completion(events: &[JobEvent]) -> (usize, bool) {
    match events.last().map(|e| &e.event) {
        Some(CaptureEvent::JobCompleted {
            total_pages,
            limit_reached,
        }) => (*total_pages, *limit_reached),
        other => panic!("expected job-completed last, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_source_url_is_rejected() {
    let h = harness(SiteFixture::new());

    let result = h.orchestrator.submit(JobRequest::new("not a url")).await;

    assert!(matches!(result, Err(ShutterError::Url(_))));
    assert!(h.orchestrator.jobs().await.is_empty());
    assert_eq!(h.site.launches(), 0);
}

#[tokio::test]
async fn test_page_limit_bounds_the_crawl() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/a", "/b", "/c"])
        .page("https://site.test/a", "A", &[])
        .page("https://site.test/b", "B", &[])
        .page("https://site.test/c", "C", &[]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", Some(2)).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.screenshots.len(), 2);
    assert_eq!(completion(&events), (2, true));
    assert_eq!(h.site.navigations().len(), 2);
}

#[tokio::test]
async fn test_page_without_links() {
    let site = SiteFixture::new().page("https://site.test/", "Lonely", &[]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.screenshots.len(), 1);
    assert_eq!(job.screenshots[0].title, "Lonely");
    assert_eq!(completion(&events), (1, false));
}

#[tokio::test]
async fn test_link_cycle_terminates() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/a", "/"])
        .page("https://site.test/a", "A", &["/", "/a", "/#top"]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(captured_paths(&job), vec!["/", "/a"]);
    assert_eq!(completion(&events), (2, false));
    assert_eq!(h.site.navigations().len(), 2);
}

#[tokio::test]
async fn test_timeout_does_not_abort_the_job() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/slow", "/a", "/b"])
        .hanging("https://site.test/slow")
        .page("https://site.test/a", "A", &[])
        .page("https://site.test/b", "B", &[]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(captured_paths(&job), vec!["/", "/a", "/b"]);
    assert_eq!(failed_urls(&events), vec!["https://site.test/slow"]);
    assert_eq!(completion(&events), (3, false));
    assert_eq!(h.site.open_pages(), 0);
}

#[tokio::test]
async fn test_breadth_first_order() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Root", &["/a", "/b"])
        .page("https://site.test/a", "A", &["/a/deep"])
        .page("https://site.test/b", "B", &["/b/deep", "/a"])
        .page("https://site.test/a/deep", "A deep", &[])
        .page("https://site.test/b/deep", "B deep", &[]);
    let h = harness(site);

    let (job, _) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(
        captured_paths(&job),
        vec!["/", "/a", "/b", "/a/deep", "/b/deep"]
    );
}

#[tokio::test]
async fn test_links_are_navigated_as_written() {
    let site = SiteFixture::new()
        .page(
            "https://site.test/",
            "Home",
            &["/search?print", "/p?utm_source=x&id=7#top", "/search?print#again"],
        )
        .page("https://site.test/search?print", "Print", &[])
        .page("https://site.test/p?utm_source=x&id=7", "Tracked", &[]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(
        h.site.navigations(),
        vec![
            "https://site.test/",
            "https://site.test/search?print",
            "https://site.test/p?utm_source=x&id=7",
        ]
    );
    assert!(failed_urls(&events).is_empty());
    assert_eq!(job.screenshots[1].source_url, "https://site.test/search?print");
    assert_eq!(job.screenshots[2].title, "Tracked");
}

#[tokio::test]
async fn test_only_same_domain_pages_are_captured() {
    let site = SiteFixture::new()
        .page(
            "https://site.test/",
            "Home",
            &[
                "https://other.test/",
                "https://blog.site.test/",
                "http://site.test:8080/",
                "/inside",
            ],
        )
        .page("https://site.test/inside", "Inside", &[])
        .page("https://other.test/", "Other", &[])
        .page("https://blog.site.test/", "Blog", &[]);
    let h = harness(site);

    let (job, _) = run_job(&h, "https://site.test/", None).await;

    for screenshot in &job.screenshots {
        let url = Url::parse(&screenshot.source_url).unwrap();
        assert_eq!(url.host_str(), Some("site.test"));
    }
    assert!(!h
        .site
        .navigations()
        .iter()
        .any(|u| u.contains("other.test") || u.contains("blog.site.test")));
}

#[tokio::test]
async fn test_visited_pages_are_unique_and_bounded() {
    let links: Vec<String> = (0..12).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut site = SiteFixture::new().page("https://site.test/", "Home", &link_refs);
    for link in &links {
        // Every page links back to all the others.
        site = site.page(&format!("https://site.test{}", link), link, &link_refs);
    }
    let h = harness(site);

    let (job, _) = run_job(&h, "https://site.test/", Some(5)).await;

    let navigations = h.site.navigations();
    let unique: HashSet<&String> = navigations.iter().collect();
    assert_eq!(navigations.len(), 5);
    assert_eq!(unique.len(), navigations.len());
    assert_eq!(job.screenshots.len(), 5);
}

#[tokio::test]
async fn test_event_stream_shape() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/broken", "/a"])
        .failing("https://site.test/broken", "net::ERR_CONNECTION_REFUSED")
        .page("https://site.test/a", "A", &[]);
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert!(events.iter().all(|e| e.job_id == job.id));
    assert_eq!(
        events[0].event,
        CaptureEvent::PageDiscovered {
            url: "https://site.test/".to_string()
        }
    );

    let terminal: Vec<_> = events.iter().filter(|e| e.event.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);

    let captured: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.event {
            CaptureEvent::PageCaptured {
                url, screenshot_ref, ..
            } => Some((url.clone(), screenshot_ref.id)),
            _ => None,
        })
        .collect();
    let expected: Vec<_> = job
        .screenshots
        .iter()
        .map(|s| (s.source_url.clone(), s.id))
        .collect();
    assert_eq!(captured, expected);

    let (total_pages, _) = completion(&events);
    assert_eq!(total_pages, job.screenshots.len());
}

#[tokio::test]
async fn test_registry_is_final_before_terminal_event() {
    let site = SiteFixture::new().page("https://site.test/", "Home", &[]);
    let h = harness(site);

    let mut events = h.orchestrator.subscribe();
    let handle = h
        .orchestrator
        .submit(JobRequest::new("https://site.test/"))
        .await
        .unwrap();

    loop {
        let event = events.next().await.unwrap();
        if event.event.is_terminal() {
            let status = h.orchestrator.status(handle.id()).await.unwrap();
            assert_eq!(status.status, JobStatus::Completed);
            assert_eq!(status.screenshots_count, 1);
            assert!(status.end_time.is_some());
            break;
        }
    }
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_source_failure_still_completes() {
    let site = SiteFixture::new().failing("https://site.test/", "net::ERR_NAME_NOT_RESOLVED");
    let h = harness(site);

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.screenshots.is_empty());
    assert!(job.error.is_none());
    assert_eq!(failed_urls(&events), vec!["https://site.test/"]);
    assert_eq!(completion(&events), (0, false));
}

#[tokio::test]
async fn test_launch_failure_fails_the_job() {
    let site = SiteFixture::new().page("https://site.test/", "Home", &[]);
    let h = harness_with(
        site.clone(),
        TestLauncher::failing(site, "chrome not found"),
        |_| {},
    );

    let (job, events) = run_job(&h, "https://site.test/", None).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.end_time.is_some());
    let error = job.error.clone().unwrap();
    assert!(error.contains("chrome not found"));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, CaptureEvent::JobFailed { error });

    let status = h.orchestrator.status(job.id).await.unwrap();
    assert_eq!(status.status, JobStatus::Failed);
    assert!(h.orchestrator.results(job.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_browser_is_released() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/slow", "/broken"])
        .hanging("https://site.test/slow")
        .failing("https://site.test/broken", "net::ERR_FAILED");
    let h = harness(site);

    run_job(&h, "https://site.test/", None).await;

    assert_eq!(h.site.launches(), 1);
    assert_eq!(h.site.shutdowns(), 1);
    assert_eq!(h.site.open_pages(), 0);
}

#[tokio::test]
async fn test_artifacts_are_written() {
    let site = SiteFixture::new().page("https://site.test/", "Home", &[]);
    let h = harness(site);

    let (job, _) = run_job(&h, "https://site.test/", None).await;
    let screenshot = &job.screenshots[0];

    let job_dir = h.tmp.path().join(job.id.to_string());
    assert_eq!(
        screenshot.full_image_path,
        job_dir.join("hd").join(format!("{}.png", screenshot.id))
    );
    assert_eq!(
        screenshot.thumbnail_path,
        job_dir.join("thumbnails").join(format!("{}.jpg", screenshot.id))
    );

    let full = image::open(&screenshot.full_image_path).unwrap();
    assert_eq!((full.width(), full.height()), (64, 96));

    let thumb = image::open(&screenshot.thumbnail_path).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (320, 240));

    assert_eq!(
        screenshot.thumbnail_url,
        format!("/screenshots/{}/thumbnails/{}.jpg", job.id, screenshot.id)
    );
}

#[tokio::test]
async fn test_status_and_results_views() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/a"])
        .page("https://site.test/a", "A", &[]);
    let h = harness(site);

    let (job, _) = run_job(&h, "https://site.test/", None).await;

    let status = h.orchestrator.status(job.id).await.unwrap();
    assert_eq!(status.domain, "site.test");
    assert_eq!(status.screenshots_count, 2);
    assert!(status.error.is_none());

    let results = h.orchestrator.results(job.id).await.unwrap();
    let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "A"]);

    let value = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(value["sourceUrl"], "https://site.test/");
    assert!(value["thumbnailUrl"].as_str().unwrap().ends_with(".jpg"));
}

#[tokio::test]
async fn test_concurrent_jobs_are_isolated() {
    let site = SiteFixture::new()
        .page("https://one.test/", "One", &["/x", "https://two.test/"])
        .page("https://one.test/x", "One X", &[])
        .page("https://two.test/", "Two", &["/y"])
        .page("https://two.test/y", "Two Y", &[]);
    let h = harness(site);

    let first = h
        .orchestrator
        .submit(JobRequest::new("https://one.test/"))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .submit(JobRequest::new("https://two.test/"))
        .await
        .unwrap();
    let (first_id, second_id) = (first.id(), second.id());
    assert_ne!(first_id, second_id);

    first.wait().await.unwrap();
    second.wait().await.unwrap();

    let one = h.orchestrator.get(first_id).await.unwrap();
    let two = h.orchestrator.get(second_id).await.unwrap();
    assert_eq!(captured_paths(&one), vec!["/", "/x"]);
    assert_eq!(captured_paths(&two), vec!["/", "/y"]);
    assert!(one
        .screenshots
        .iter()
        .all(|s| s.source_url.starts_with("https://one.test/")));
    assert_eq!(h.site.launches(), 2);
    assert_eq!(h.site.shutdowns(), 2);
}

#[tokio::test]
async fn test_cancel_stops_after_current_page() {
    let site = SiteFixture::new()
        .page("https://site.test/", "Home", &["/slow", "/a", "/b"])
        .hanging("https://site.test/slow")
        .page("https://site.test/a", "A", &[])
        .page("https://site.test/b", "B", &[]);
    let h = harness(site);

    let mut events = h.orchestrator.subscribe();
    let handle = h
        .orchestrator
        .submit(JobRequest::new("https://site.test/"))
        .await
        .unwrap();
    let job_id = handle.id();

    loop {
        let event = events.next().await.unwrap();
        if matches!(event.event, CaptureEvent::PageCaptured { .. }) {
            assert!(h.orchestrator.cancel(job_id).await);
            break;
        }
    }
    handle.wait().await.unwrap();

    let job = h.orchestrator.get(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(captured_paths(&job), vec!["/"]);
    assert!(!h.site.navigations().iter().any(|u| u.ends_with("/a")));
    assert!(!h.orchestrator.cancel(job_id).await);
}

#[tokio::test]
async fn test_non_html_targets_are_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&server)
        .await;

    let root = format!("{}/", base);
    let pdf = format!("{}/report.pdf", base);
    let site = SiteFixture::new()
        .page(&root, "Home", &["/report.pdf", "/no-head"])
        .page(&pdf, "PDF", &[])
        .page(&format!("{}/no-head", base), "No HEAD", &[]);
    let h = harness_with(site.clone(), TestLauncher::new(site), |config| {
        config.crawler.probe_content_type = true;
    });

    let (job, events) = run_job(&h, &root, None).await;

    assert_eq!(captured_paths(&job), vec!["/", "/no-head"]);
    assert_eq!(failed_urls(&events), vec![pdf.clone()]);
    assert!(events.iter().any(|e| matches!(
        &e.event,
        CaptureEvent::PageFailed { error, .. } if error.contains("application/pdf")
    )));
    assert!(!h.site.navigations().contains(&pdf));
}
