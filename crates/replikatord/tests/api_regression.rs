//! End-to-end router tests.
//!
//! Drives the full router (routes, middleware, executor, metrics) through
//! `tower::ServiceExt::oneshot` against an in-memory gateway.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tokio::sync::Notify;
use tower::ServiceExt;

use replikator_api::{ApiState, build_router};
use replikator_exec::{CommandGateway, ProcessGateway};

const LIST_JSON: &str = r#"{"DatabaseGlobalState": {
    "eReplicationState": "Running",
    "iReplicationLag": "12.5",
    "sAllocatedForDb": "2048",
    "sTotalStorageCapacity": "1000",
    "sFree": "400",
    "sTotalMemCapacity": "800",
    "sFreeMem": "300",
    "DatabaseInstanceState": [
        {"DatabaseProperties": {"sInstanceId": "db1"}, "eState": "Running",
         "sSizeTotal": "10", "sMemAllocated": "20", "sMemUsed": "15"},
        {"DatabaseProperties": {"sInstanceId": "db2"}, "eState": "Stopped",
         "sSizeTotal": "30", "sMemAllocated": "0", "sMemUsed": "0"}
    ]
}}"#;

type Span = (String, Instant, Instant);

/// Serves `--list` from a swappable payload. `--stop` calls block until
/// released when a gate is installed. Every call's span is recorded.
struct FakeReplikator {
    list: Mutex<String>,
    spans: Mutex<Vec<Span>>,
    stop_entered: Arc<Notify>,
    stop_gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl FakeReplikator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            list: Mutex::new(LIST_JSON.to_string()),
            spans: Mutex::new(Vec::new()),
            stop_entered: Arc::new(Notify::new()),
            stop_gate: Mutex::new(None),
        })
    }

    /// Make the next `--stop` block until the returned sender fires.
    fn gate_stop(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.stop_gate.lock().unwrap() = Some(rx);
        tx
    }

    fn span(&self, needle: &str) -> Span {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .find(|(args, _, _)| args.contains(needle))
            .cloned()
            .unwrap_or_else(|| panic!("no call matching {needle}"))
    }
}

impl CommandGateway for FakeReplikator {
    fn invoke(&self, args: &str) -> Result<String, String> {
        let start = Instant::now();
        let result = if args.ends_with("--list") {
            Ok(self.list.lock().unwrap().clone())
        } else if args.contains("--stop") {
            self.stop_entered.notify_one();
            let gate = self.stop_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            Ok(r#"{"stopped":true}"#.to_string())
        } else if args.contains("missing") {
            Err("Error: replikator missing not found".to_string())
        } else {
            Ok(format!(r#"{{"ok":"{args}"}}"#))
        };
        self.spans
            .lock()
            .unwrap()
            .push((args.to_string(), start, Instant::now()));
        result
    }
}

fn router_with(gateway: Arc<FakeReplikator>) -> Router {
    build_router(ApiState::new(gateway).unwrap())
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn list_replikators_passes_output_through() {
    let router = router_with(FakeReplikator::new());

    let resp = router.oneshot(request("GET", "/replikators")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_text(resp).await, LIST_JSON);
}

#[tokio::test]
async fn every_route_maps_to_its_verb() {
    let gateway = FakeReplikator::new();
    let router = router_with(gateway.clone());

    let cases = [
        ("PUT", "/replikator/foo", "--output json --create foo"),
        (
            "PUT",
            "/replikator/foo?fromReplica=db1",
            "--output json --create foo --from-replica db1",
        ),
        ("PUT", "/replikator/foo/stop", "--output json --stop foo"),
        ("PUT", "/replikator/foo/start", "--output json --run foo"),
        ("GET", "/replikator/foo", "--output json --get-status foo"),
        ("DELETE", "/replikator/foo", "--output json --delete foo"),
    ];

    for (method, uri, _) in cases {
        let resp = router.clone().oneshot(request(method, uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method} {uri}");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    }

    let spans = gateway.spans.lock().unwrap();
    let called: Vec<&str> = spans.iter().map(|(args, _, _)| args.as_str()).collect();
    let expected: Vec<&str> = cases.iter().map(|(_, _, args)| *args).collect();
    assert_eq!(called, expected);
}

#[tokio::test]
async fn tool_error_is_returned_with_200() {
    let router = router_with(FakeReplikator::new());

    let resp = router
        .oneshot(request("GET", "/replikator/missing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Error: replikator missing not found");
}

#[tokio::test]
async fn unknown_routes_and_methods_rejected() {
    let router = router_with(FakeReplikator::new());

    let resp = router.clone().oneshot(request("GET", "/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = router
        .oneshot(request("POST", "/replikators"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn whitespace_in_name_rejected() {
    let gateway = FakeReplikator::new();
    let router = router_with(gateway.clone());

    let resp = router
        .oneshot(request("DELETE", "/replikator/foo%20--delete%20bar"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.spans.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn status_read_waits_for_inflight_stop() {
    let gateway = FakeReplikator::new();
    let release = gateway.gate_stop();
    let router = router_with(gateway.clone());

    let stop = tokio::spawn(
        router
            .clone()
            .oneshot(request("PUT", "/replikator/foo/stop")),
    );
    gateway.stop_entered.notified().await;

    let get = tokio::spawn(router.clone().oneshot(request("GET", "/replikator/foo")));

    // The read must still be queued behind the stop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!get.is_finished());

    release.send(()).unwrap();
    let stop = stop.await.unwrap().unwrap();
    let get = get.await.unwrap().unwrap();
    assert_eq!(stop.status(), StatusCode::OK);
    assert_eq!(get.status(), StatusCode::OK);

    let (_, _, stop_end) = gateway.span("--stop foo");
    let (_, get_start, _) = gateway.span("--get-status foo");
    assert!(get_start >= stop_end);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn other_replikators_not_blocked_by_stop() {
    let gateway = FakeReplikator::new();
    let release = gateway.gate_stop();
    let router = router_with(gateway.clone());

    let stop = tokio::spawn(
        router
            .clone()
            .oneshot(request("PUT", "/replikator/foo/stop")),
    );
    gateway.stop_entered.notified().await;

    let other = tokio::time::timeout(
        Duration::from_secs(2),
        router.clone().oneshot(request("GET", "/replikator/bar")),
    )
    .await
    .expect("a different name must not wait on foo's lock")
    .unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    let list = tokio::time::timeout(
        Duration::from_secs(2),
        router.clone().oneshot(request("GET", "/replikators")),
    )
    .await
    .expect("list must not wait on any lock")
    .unwrap();
    assert_eq!(list.status(), StatusCode::OK);

    release.send(()).unwrap();
    assert_eq!(stop.await.unwrap().unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_reflect_latest_list() {
    let gateway = FakeReplikator::new();
    let router = router_with(gateway.clone());

    let resp = router.clone().oneshot(request("GET", "/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        replikator_metrics::CONTENT_TYPE
    );
    let body = body_text(resp).await;
    assert!(body.contains("replikator_replication_lag{state=\"running\"} 12.5"));
    assert!(body.contains("replikator_replication_disk_usage{state=\"running\"} 2048"));
    assert!(body.contains("replikator_disk_free 400"));
    assert!(body.contains("replikator_replica_disk_usage{replica=\"db1\",state=\"running\"} 10"));
    assert!(body.contains("replikator_replica_disk_usage{replica=\"db2\",state=\"stopped\"} 30"));

    // db2 goes away and the lag becomes unreadable.
    *gateway.list.lock().unwrap() = r#"{"DatabaseGlobalState": {
        "eReplicationState": "Running",
        "iReplicationLag": "n/a",
        "DatabaseInstanceState": [
            {"DatabaseProperties": {"sInstanceId": "db1"}, "eState": "Running", "sSizeTotal": "11"}
        ]
    }}"#
    .to_string();

    let body = body_text(router.oneshot(request("GET", "/metrics")).await.unwrap()).await;
    assert!(body.contains("replikator_replication_lag{state=\"running\"} -1"));
    assert!(body.contains("replikator_replication_disk_usage{state=\"running\"} 0"));
    assert!(body.contains("replikator_replica_disk_usage{replica=\"db1\",state=\"running\"} 11"));
    assert!(!body.contains("db2"));
}

#[tokio::test]
async fn metrics_survive_undecodable_output() {
    let gateway = FakeReplikator::new();
    *gateway.list.lock().unwrap() = "sudo: replikator-ctl: command not found".to_string();
    let router = router_with(gateway);

    let resp = router.oneshot(request("GET", "/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("replikator_replication_lag{state=\"\"} -1"));
    assert!(body.contains("replikator_memory_capacity 0"));
    assert!(!body.contains("replikator_replica_memory_used{"));
}

#[tokio::test]
async fn http_requests_are_counted() {
    let router = router_with(FakeReplikator::new());

    for _ in 0..2 {
        let resp = router
            .clone()
            .oneshot(request("GET", "/replikator/foo"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let body = body_text(router.oneshot(request("GET", "/metrics")).await.unwrap()).await;
    assert!(body.contains("http_requests_total{code=\"200\",method=\"GET\"} 2"));
    assert!(body.contains(
        "http_request_duration_seconds_count{method=\"GET\",path=\"/replikator/{name}\"} 2"
    ));
}

#[tokio::test]
async fn metrics_scrapes_are_not_counted() {
    let router = router_with(FakeReplikator::new());

    let resp = router
        .clone()
        .oneshot(request("GET", "/replikator/foo"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    for _ in 0..3 {
        body_text(router.clone().oneshot(request("GET", "/metrics")).await.unwrap()).await;
    }

    let body = body_text(router.oneshot(request("GET", "/metrics")).await.unwrap()).await;
    assert!(body.contains("http_requests_total{code=\"200\",method=\"GET\"} 1"));
    assert!(!body.contains("path=\"/metrics\""));
}

#[cfg(unix)]
#[tokio::test]
async fn process_gateway_end_to_end() {
    // `echo` stands in for replikator-ctl: the response is the argv it got.
    let gateway = ProcessGateway::new("echo").unwrap();
    let router = build_router(ApiState::new(Arc::new(gateway)).unwrap());

    let resp = router
        .oneshot(request("PUT", "/replikator/foo/start"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "--output json --run foo\n");
}
