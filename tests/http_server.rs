//! Integration tests for the HTTP surface
//!
//! Runs the full service on an ephemeral port: upstream, scheduler, cache
//! and server, then talks to it with a real HTTP client.

mod common;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use common::{Reply, Upstream, FIXTURE_NAMES, JSON_FIXTURE};
use signs::app::refresh::{create_shutdown_channel, wait_for_shutdown_signal};
use signs::app::server::{router, HealthStatus};
use signs::app::{
    AppState, AssetConfig, FeedFormat, HttpServer, Presentation, RefreshConfig,
    RefreshScheduler, Schedule, ScheduleCache, ServerConfig,
};
use signs::errors::{SchedulerError, ServerError};

struct Service {
    _assets: TempDir,
    addr: SocketAddr,
    cache: Arc<ScheduleCache>,
    scheduler: Arc<RefreshScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    server: JoinHandle<Result<(), ServerError>>,
}

impl Service {
    async fn start(upstream: &Upstream) -> Self {
        let assets_dir = TempDir::new().unwrap();
        let assets = write_assets(assets_dir.path());

        let cache = Arc::new(ScheduleCache::new());
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&cache),
            upstream.fetcher(),
            Arc::new(FeedFormat::Auto),
            RefreshConfig::default(),
        ));

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let app = router(
            AppState::new(Arc::clone(&cache), &assets),
            &assets,
            config.request_timeout,
        );
        let server = HttpServer::bind(&config, app).await.unwrap();
        let addr = server.local_addr();

        let (shutdown_tx, _) = create_shutdown_channel();
        let shutdown = wait_for_shutdown_signal(shutdown_tx.subscribe());
        let server = tokio::spawn(server.serve(shutdown));

        Self {
            _assets: assets_dir,
            addr,
            cache,
            scheduler,
            shutdown_tx,
            server,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::get(self.url(path)).await.unwrap()
    }

    async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let (stopped, drained) = tokio::join!(
            self.scheduler.stop(Duration::from_secs(1)),
            tokio::time::timeout(Duration::from_secs(2), self.server),
        );
        if let Err(e) = stopped {
            assert!(
                matches!(e, SchedulerError::InvalidTransition { .. }),
                "unexpected stop error: {e}"
            );
        }
        assert!(matches!(drained, Ok(Ok(Ok(())))));
    }
}

fn write_assets(root: &Path) -> AssetConfig {
    let frontend = root.join("frontend");
    let sponsors = root.join("sponsors");
    std::fs::create_dir_all(frontend.join("assets")).unwrap();
    std::fs::create_dir_all(sponsors.join("archive")).unwrap();
    std::fs::write(frontend.join("index.html"), "<div id=\"root\"></div>").unwrap();
    std::fs::write(frontend.join("assets").join("app.js"), "console.log(1)").unwrap();
    for name in ["aws.png", "github.png", "Grafana.PNG"] {
        std::fs::write(sponsors.join(name), b"\x89PNG").unwrap();
    }
    std::fs::write(sponsors.join("archive").join("old.gif"), b"GIF89a").unwrap();
    std::fs::write(sponsors.join("README.txt"), "not an image").unwrap();

    AssetConfig {
        frontend_dir: frontend,
        sponsors_dir: sponsors,
        ..AssetConfig::default()
    }
}

#[tokio::test]
async fn test_serves_empty_schedule_before_first_refresh() {
    let upstream =
        Upstream::start(Reply::ok(JSON_FIXTURE).delayed(Duration::from_millis(300))).await;
    let service = Service::start(&upstream).await;

    // Server is up while the warm-up fetch is still waiting on the upstream
    let start = {
        let scheduler = Arc::clone(&service.scheduler);
        tokio::spawn(async move { scheduler.start().await })
    };

    let response = service.get("/schedule").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sessionCount"], 0);
    assert_eq!(body["Presentations"], serde_json::json!([]));
    assert_eq!(body["lastRefreshTime"], "");
    assert_eq!(body["contentHash"], "");

    start.await.unwrap().unwrap();
    let schedule: Schedule = service.get("/schedule").await.json().await.unwrap();
    assert_eq!(schedule.session_count, 3);

    service.shutdown().await;
}

#[tokio::test]
async fn test_schedule_wire_format() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;
    service.scheduler.start().await.unwrap();

    let body: serde_json::Value = service.get("/schedule").await.json().await.unwrap();
    assert_eq!(body["sessionCount"], 3);
    assert_eq!(body["contentHash"].as_str().unwrap().len(), 64);
    assert!(body["lastUpdateTime"].as_str().unwrap().ends_with('Z'));

    let first = &body["Presentations"][0];
    assert_eq!(first["Name"], "Opening Keynote");
    assert_eq!(first["Location"], "Ballroom DE");
    assert_eq!(first["StartTime"], "2025-03-06T09:00:00-08:00");
    assert_eq!(first["Speakers"], serde_json::json!(["Ada Lovelace", "Alan Turing"]));
    assert_eq!(first["Topic"], "Keynote");

    let presentations: Vec<Presentation> =
        serde_json::from_value(body["Presentations"].clone()).unwrap();
    let names: Vec<&str> = presentations.iter().map(|p| p.name()).collect();
    assert_eq!(names, FIXTURE_NAMES);
    assert_eq!(presentations, *service.cache.snapshot().presentations);

    service.shutdown().await;
}

#[tokio::test]
async fn test_outage_keeps_serving_last_good_schedule() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;
    service.scheduler.refresh_once().await.unwrap();
    let before: Schedule = service.get("/schedule").await.json().await.unwrap();

    upstream.set(Reply::status(axum::http::StatusCode::BAD_GATEWAY));
    assert!(service.scheduler.refresh_once().await.is_err());

    let after: Schedule = service.get("/schedule").await.json().await.unwrap();
    assert_eq!(after.presentations, before.presentations);
    assert_eq!(after.last_update_time, before.last_update_time);
    assert!(after.last_refresh_time >= before.last_refresh_time);

    service.shutdown().await;
}

#[tokio::test]
async fn test_healthz() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;
    service.scheduler.refresh_once().await.unwrap();

    let health: HealthStatus = service.get("/healthz").await.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.session_count, 3);
    assert!(health.last_refresh_time.is_some());

    service.shutdown().await;
}

#[tokio::test]
async fn test_sponsor_routes() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;

    let platinum: Vec<String> = service.get("/sponsors/platinum").await.json().await.unwrap();
    assert_eq!(platinum[0], "aws.png");

    let diamond: Vec<String> = service.get("/sponsors/diamond").await.json().await.unwrap();
    assert_eq!(diamond, vec!["microsoft.png"]);

    let all: Vec<String> = service.get("/sponsors/all").await.json().await.unwrap();
    assert_eq!(
        all,
        vec!["Grafana.PNG", "archive/old.gif", "aws.png", "github.png"]
    );

    let image = service.get("/sponsors/images/archive/old.gif").await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.bytes().await.unwrap().as_ref(), b"GIF89a");

    service.shutdown().await;
}

#[tokio::test]
async fn test_frontend_fallback() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;

    let index = service.get("/").await;
    assert_eq!(index.status(), StatusCode::OK);
    assert_eq!(index.text().await.unwrap(), "<div id=\"root\"></div>");

    let script = service.get("/assets/app.js").await;
    assert_eq!(script.status(), StatusCode::OK);

    let missing = service.get("/nope.css").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    service.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting_connections() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;
    service.scheduler.start().await.unwrap();
    let url = service.url("/healthz");

    service.shutdown().await;

    assert!(reqwest::get(&url).await.is_err());
}

#[tokio::test]
async fn test_concurrent_readers_see_whole_snapshots() {
    let upstream = Upstream::start(Reply::ok(JSON_FIXTURE)).await;
    let service = Service::start(&upstream).await;
    service.scheduler.refresh_once().await.unwrap();
    upstream.set(Reply::ok(common::XML_FIXTURE));

    let client = reqwest::Client::new();
    let reads = (0..32).map(|_| {
        let client = client.clone();
        let url = service.url("/schedule");
        async move {
            let schedule: Schedule = client.get(url).send().await?.json().await?;
            Ok::<_, reqwest::Error>(schedule)
        }
    });
    let (results, refreshed) = tokio::join!(join_all(reads), service.scheduler.refresh_once());
    assert!(refreshed.unwrap().changed());

    for schedule in results {
        let schedule = schedule.unwrap();
        assert_eq!(schedule.session_count, schedule.presentations.len());
        assert_eq!(schedule.session_count, 3);
        assert!(schedule.content_hash.is_some());
    }

    drop(client);
    service.shutdown().await;
}
