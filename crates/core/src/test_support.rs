//! Local HTTP stub for exercising the blocking adapters.

use axum::http::{HeaderMap, Uri};
use axum::Router;
use serde_json::Value;
use std::sync::{mpsc, Arc, Mutex};

/// One request seen by a stub route.
#[derive(Clone, Debug)]
pub struct Seen {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

pub type SeenLog = Arc<Mutex<Vec<Seen>>>;

pub fn seen_log() -> SeenLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Serve `router` on an ephemeral localhost port from a background runtime and
/// return its base URL.
pub fn serve(router: Router) -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

/// Record the parts of a request the adapters are expected to set.
pub fn record(log: &SeenLog, uri: &Uri, headers: &HeaderMap, body: &str) {
    let seen = Seen {
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_str(body).unwrap_or(Value::Null),
    };
    log.lock().unwrap().push(seen);
}

/// Requests recorded so far.
pub fn seen(log: &SeenLog) -> Vec<Seen> {
    log.lock().unwrap().clone()
}
