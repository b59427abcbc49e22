//! Shared helpers for integration tests
//!
//! [`Upstream`] is a local stand-in for the conference website: an axum
//! server on an ephemeral port whose reply can be swapped mid-test.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use signs::app::{ClientConfig, HttpFetcher};

pub const JSON_FIXTURE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/sign.json"
));

pub const XML_FIXTURE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/sign.xml"
));

/// Valid presentations in either fixture, in document order
pub const FIXTURE_NAMES: [&str; 3] = [
    "Opening Keynote",
    "Kernel Scheduling Deep Dive",
    "Closing Game Night",
];

/// What the upstream answers with
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: b"upstream unavailable".to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct Shared {
    reply: Arc<Mutex<Reply>>,
    hits: Arc<AtomicUsize>,
}

/// Local schedule endpoint serving `GET /signs`
pub struct Upstream {
    url: Url,
    shared: Shared,
    task: JoinHandle<()>,
}

impl Upstream {
    pub async fn start(reply: Reply) -> Self {
        let shared = Shared {
            reply: Arc::new(Mutex::new(reply)),
            hits: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/signs", get(feed))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{}/signs", addr)).unwrap(),
            shared,
            task,
        }
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    pub fn set(&self, reply: Reply) {
        *self.shared.reply.lock() = reply;
    }

    pub fn hits(&self) -> usize {
        self.shared.hits.load(Ordering::SeqCst)
    }

    pub fn fetcher(&self) -> Arc<HttpFetcher> {
        Arc::new(HttpFetcher::new(self.url(), &ClientConfig::default()).unwrap())
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn feed(State(shared): State<Shared>) -> Response {
    shared.hits.fetch_add(1, Ordering::SeqCst);
    let reply = shared.reply.lock().clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (reply.status, reply.body).into_response()
}

/// A URL nothing is listening on
pub async fn refused_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/signs", addr)).unwrap()
}

pub fn names(presentations: &[signs::app::Presentation]) -> Vec<&str> {
    presentations.iter().map(|p| p.name()).collect()
}
