#![allow(clippy::unwrap_used)]
// End-to-end tests for `StreamWorker` and `Supervisor` against wiremock
// cameras and collectors.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use alertrelay_core::{
    AuthScheme, CollectorConfig, CoreError, Credentials, Device, ForwardErrorPolicy, RelayConfig,
    Signal, SignalSink, StreamWorker, Supervisor, Termination, TerminationKind, WorkerState,
};

const STREAM_PATH: &str = "/ISAPI/Event/notification/alertStream";

// ── Sinks ───────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSink {
    fn recorded(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }
}

impl SignalSink for RecordingSink {
    async fn forward(&self, signal: &Signal) -> Result<(), CoreError> {
        self.signals.lock().unwrap().push(signal.clone());
        Ok(())
    }
}

#[derive(Default)]
struct FailingSink {
    attempts: AtomicU32,
}

impl SignalSink for FailingSink {
    async fn forward(&self, _signal: &Signal) -> Result<(), CoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::Forward {
            message: "collector rejected signal (HTTP 500)".into(),
            status: Some(500),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn alert(event_type: &str, state: &str, date_time: &str) -> String {
    format!(
        "<EventNotificationAlert version=\"2.0\" xmlns=\"http://www.hikvision.com/ver20/XMLSchema\">\
         <ipAddress>192.168.1.25</ipAddress><portNo>80</portNo><protocol>HTTP</protocol>\
         <channelID>1</channelID><dateTime>{date_time}</dateTime><activePostCount>1</activePostCount>\
         <eventType>{event_type}</eventType><eventState>{state}</eventState>\
         <eventDescription>Motion alarm</eventDescription></EventNotificationAlert>"
    )
}

fn motion(date_time: &str) -> String {
    alert("VMD", "active", date_time)
}

fn part(body: &str) -> String {
    format!("--boundary\r\nContent-Type: application/xml; charset=\"UTF-8\"\r\n\r\n{body}\r\n")
}

fn closed_stream(parts: &[String]) -> String {
    let mut body: String = parts.iter().map(|p| part(p)).collect();
    body.push_str("--boundary--\r\n");
    body
}

/// A body that drops after `parts`, partway into the next one.
fn dropped_stream(parts: &[String]) -> String {
    let mut body: String = parts.iter().map(|p| part(p)).collect();
    body.push_str("--boundary\r\nContent-Type: applic");
    body
}

fn stream_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "multipart/mixed; boundary=boundary")
        .set_body_bytes(body.into_bytes())
}

async fn camera(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(stream_response(body))
        .mount(&server)
        .await;
    server
}

fn relay_config(devices: Vec<Device>, collector_url: &str) -> RelayConfig {
    RelayConfig::new(
        devices,
        Credentials::new("admin", SecretString::from("secret".to_string())),
        CollectorConfig {
            url: Url::parse(collector_url).unwrap(),
            token: SecretString::from("session-token".to_string()),
            timeout: Duration::from_secs(5),
        },
    )
}

fn worker<S: SignalSink>(
    server: &MockServer,
    id: u32,
    sink: S,
    policy: ForwardErrorPolicy,
) -> StreamWorker<S> {
    let device = Device::new(server.address().to_string(), id);
    let mut config = relay_config(vec![device.clone()], "http://127.0.0.1:9/api/signals");
    config.on_forward_error = policy;
    StreamWorker::new(device, &config, sink, CancellationToken::new()).unwrap()
}

// ── Worker ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_active_motion_becomes_signal() {
    let server = camera(closed_stream(&[motion("2024-03-01T10:00:00+00:00")])).await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 3, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert!(matches!(summary.termination, Termination::StreamEnded));
    assert_eq!(summary.scheme, Some(AuthScheme::None));
    assert_eq!(summary.parts, 1);
    assert_eq!(summary.signals, 1);

    let signals = sink.recorded();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].signal_ids, vec![3]);
    assert_eq!(signals[0].states, vec![1]);
    assert_eq!(signals[0].start.rel_90k, 153_835_848_000_000);
    assert_eq!(signals[0].end.rel_90k, 153_835_848_900_000);
    assert_eq!(
        *worker.state().borrow(),
        WorkerState::Terminated(TerminationKind::StreamEnded)
    );
}

#[tokio::test]
async fn test_non_motion_events_are_ignored() {
    let server = camera(closed_stream(&[
        alert("VMD", "inactive", "2024-03-01T10:00:00+00:00"),
        alert("videoloss", "inactive", "2024-03-01T10:00:01+00:00"),
        alert("linedetection", "active", "2024-03-01T10:00:02+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert!(matches!(summary.termination, Termination::StreamEnded));
    assert_eq!(summary.parts, 3);
    assert!(sink.recorded().is_empty());
}

#[tokio::test]
async fn test_malformed_part_does_not_end_stream() {
    let server = camera(closed_stream(&[
        "<EventNotificationAlert><eventType>VMD".to_string(),
        motion("2024-03-01T10:00:00+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert!(matches!(summary.termination, Termination::StreamEnded));
    assert_eq!(summary.parts, 2);
    assert_eq!(sink.recorded().len(), 1);
}

#[tokio::test]
async fn test_unparseable_timestamp_is_skipped() {
    let server = camera(closed_stream(&[
        motion("2024-03-01 10:00:00"),
        motion("2024-03-01T10:00:05+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    worker.run().await;

    let signals = sink.recorded();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].start.rel_90k, 153_835_848_450_000);
}

#[tokio::test]
async fn test_signals_keep_arrival_order() {
    let server = camera(closed_stream(&[
        motion("2024-03-01T10:00:10+00:00"),
        motion("2024-03-01T10:00:00+00:00"),
        motion("2024-03-01T10:00:05+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    worker.run().await;

    let starts: Vec<i64> = sink.recorded().iter().map(|s| s.start.rel_90k).collect();
    assert_eq!(
        starts,
        vec![153_835_848_900_000, 153_835_848_000_000, 153_835_848_450_000]
    );
}

#[tokio::test]
async fn test_stream_drop_keeps_earlier_signals() {
    let server = camera(dropped_stream(&[
        motion("2024-03-01T10:00:00+00:00"),
        alert("VMD", "inactive", "2024-03-01T10:00:01+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert_eq!(summary.termination.kind(), TerminationKind::StreamReadError);
    assert_eq!(summary.parts, 2);
    assert_eq!(sink.recorded().len(), 1);
}

#[tokio::test]
async fn test_empty_numeric_fields_still_forward() {
    let blank = motion("2024-03-01T10:00:00+00:00")
        .replace("<portNo>80</portNo>", "<portNo></portNo>")
        .replace("<activePostCount>1</activePostCount>", "<activePostCount/>");
    let server = camera(closed_stream(&[blank])).await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 4, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert!(matches!(summary.termination, Termination::StreamEnded));
    assert_eq!(summary.signals, 1);
    assert_eq!(sink.recorded()[0].signal_ids, vec![4]);
}

/// Serve one request: headers, then `body`, then hold the socket open.
async fn stalling_camera(body: String) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: multipart/mixed; boundary=boundary\r\nConnection: close\r\n\r\n{body}"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    (address, handle)
}

#[tokio::test]
async fn test_stalled_stream_hits_read_timeout() {
    let mut body = part(&motion("2024-03-01T10:00:00+00:00"));
    body.push_str("--boundary\r\n");
    let (address, server) = stalling_camera(body).await;

    let device = Device::new(address.to_string(), 2);
    let mut config = relay_config(vec![device.clone()], "http://127.0.0.1:9/api/signals");
    config.read_timeout = Some(Duration::from_millis(500));
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = StreamWorker::new(device, &config, sink.clone(), CancellationToken::new()).unwrap();

    let summary = tokio::time::timeout(Duration::from_secs(10), worker.run())
        .await
        .unwrap();
    server.abort();

    assert_eq!(summary.termination.kind(), TerminationKind::StreamReadError);
    assert_eq!(summary.parts, 1);
    assert_eq!(summary.signals, 1);
    assert_eq!(sink.recorded().len(), 1);
}

#[tokio::test]
async fn test_missing_boundary_terminates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/xml")
                .set_body_string(motion("2024-03-01T10:00:00+00:00")),
        )
        .mount(&server)
        .await;
    let sink = std::sync::Arc::new(RecordingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert_eq!(summary.termination.kind(), TerminationKind::BoundaryMissing);
    assert_eq!(summary.parts, 0);
    assert!(sink.recorded().is_empty());
}

#[tokio::test]
async fn test_refused_credentials_terminate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let worker = worker(
        &server,
        1,
        RecordingSink::default(),
        ForwardErrorPolicy::Terminate,
    );

    let summary = worker.run().await;

    assert_eq!(summary.termination.kind(), TerminationKind::AuthFailure);
    assert!(summary.scheme.is_none());
}

#[tokio::test]
async fn test_forward_error_terminates_by_default() {
    let server = camera(closed_stream(&[
        motion("2024-03-01T10:00:00+00:00"),
        motion("2024-03-01T10:00:05+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(FailingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Terminate);

    let summary = worker.run().await;

    assert_eq!(summary.termination.kind(), TerminationKind::ForwardError);
    assert_eq!(summary.parts, 1);
    assert_eq!(summary.signals, 0);
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forward_error_can_be_skipped() {
    let server = camera(closed_stream(&[
        motion("2024-03-01T10:00:00+00:00"),
        motion("2024-03-01T10:00:05+00:00"),
    ]))
    .await;
    let sink = std::sync::Arc::new(FailingSink::default());
    let worker = worker(&server, 1, sink.clone(), ForwardErrorPolicy::Continue);

    let summary = worker.run().await;

    assert!(matches!(summary.termination, Termination::StreamEnded));
    assert_eq!(summary.parts, 2);
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancel_while_connecting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(stream_response(closed_stream(&[])).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let device = Device::new(server.address().to_string(), 1);
    let config = relay_config(vec![device.clone()], "http://127.0.0.1:9/api/signals");
    let cancel = CancellationToken::new();
    let worker = StreamWorker::new(device, &config, RecordingSink::default(), cancel.clone()).unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), worker.run())
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(matches!(summary.termination, Termination::Cancelled));
    assert!(!summary.termination.is_failure());
}

// ── Supervisor ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_supervisor_posts_to_collector() {
    let camera = camera(closed_stream(&[
        motion("2024-03-01T10:00:00+00:00"),
        alert("VMD", "inactive", "2024-03-01T10:00:10+00:00"),
    ]))
    .await;

    let collector = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signals"))
        .and(header("cookie", "s=session-token"))
        .and(body_json(serde_json::json!({
            "signalIds": [7],
            "states": [1],
            "start": { "base": "epoch", "rel90k": 153_835_848_000_000_i64 },
            "end": { "base": "epoch", "rel90k": 153_835_848_900_000_i64 }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&collector)
        .await;

    let config = relay_config(
        vec![Device::new(camera.address().to_string(), 7).with_name("Garage")],
        &format!("{}/api/signals", collector.uri()),
    );
    let reports = Supervisor::new(config).unwrap().run().await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].termination, TerminationKind::StreamEnded);
    assert_eq!(reports[0].signals, 1);
    assert_eq!(reports[0].connections, 1);
    assert!(!reports[0].is_failure());
}

#[tokio::test]
async fn test_supervisor_isolates_device_failures() {
    let healthy = camera(closed_stream(&[motion("2024-03-01T10:00:00+00:00")])).await;

    let collector = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/signals"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&collector)
        .await;

    let config = relay_config(
        vec![
            Device::new("127.0.0.1:1", 1),
            Device::new(healthy.address().to_string(), 2),
        ],
        &format!("{}/api/signals", collector.uri()),
    );
    let reports = Supervisor::new(config).unwrap().run().await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].device.id, 1);
    assert_eq!(reports[0].termination, TerminationKind::AuthFailure);
    assert!(reports[0].is_failure());
    assert_eq!(reports[1].device.id, 2);
    assert_eq!(reports[1].termination, TerminationKind::StreamEnded);
    assert_eq!(reports[1].signals, 1);
}

#[tokio::test]
async fn test_supervisor_reconnects_until_budget_spent() {
    // The stream closes without a single part, so no connection counts as healthy.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(stream_response(closed_stream(&[])))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = relay_config(
        vec![Device::new(server.address().to_string(), 1)],
        "http://127.0.0.1:9/api/signals",
    );
    config.reconnect.initial_delay = Duration::from_millis(10);
    config.reconnect.max_delay = Duration::from_millis(20);
    config.reconnect.max_retries = Some(2);

    let reports = Supervisor::new(config).unwrap().run().await;

    assert_eq!(reports[0].termination, TerminationKind::StreamEnded);
    assert_eq!(reports[0].connections, 3);
}

#[tokio::test]
async fn test_supervisor_rejects_empty_roster() {
    let config = relay_config(Vec::new(), "http://127.0.0.1:9/api/signals");
    assert!(matches!(Supervisor::new(config), Err(CoreError::Config { .. })));
}

#[tokio::test]
async fn test_supervisor_shutdown_cancels_workers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STREAM_PATH))
        .respond_with(stream_response(closed_stream(&[])).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let config = relay_config(
        vec![Device::new(server.address().to_string(), 1)],
        "http://127.0.0.1:9/api/signals",
    );
    let supervisor = Supervisor::new(config).unwrap();
    let cancel = supervisor.cancel_token();
    let mut events = supervisor.subscribe();

    let run = tokio::spawn(supervisor.run());
    let first = events.recv().await.unwrap();
    assert_eq!(first.state, WorkerState::Connecting);
    cancel.cancel();

    let reports = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reports[0].termination, TerminationKind::Cancelled);
    assert!(!reports[0].is_failure());
}
