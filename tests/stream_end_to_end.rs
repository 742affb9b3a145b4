//! End-to-end tests against a local websocket feed

use std::sync::Arc;
use std::time::Duration;

use book_feed_monitor::{
    Clock, Config, ConnectionStatus, DisplayState, Engine, FeedTelemetry, SharedDisplay,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};

const E2E_FRAME: &str =
    r#"{"bids":[[100.5,2.0]],"asks":[[101.0,1.5]],"eventTime":1000,"serverTime":1000}"#;

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

async fn wait_for(display: &SharedDisplay, check: impl Fn(&DisplayState) -> bool) -> bool {
    for _ in 0..300 {
        if check(&*display.read().await) {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Serve `frames` to the first client, then close once `close_rx` fires
async fn feed_server(frames: Vec<String>, close_rx: oneshot::Receiver<()>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame)).await.unwrap();
        }
        let _ = close_rx.await;
        let _ = ws
            .close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "feed shutting down".into(),
            }))
            .await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    url
}

fn engine_for(url: &str, telemetry: FeedTelemetry) -> Engine {
    let config = Config::from_lookup(|key| match key {
        "STREAM_URL" => Some(url.to_string()),
        "HTTP_ADDR" => Some("127.0.0.1:0".to_string()),
        _ => None,
    })
    .unwrap();
    Engine::with_clock(Arc::new(config), telemetry, Box::new(FixedClock(1005)))
}

#[tokio::test]
async fn test_feed_renders_latest_snapshot() {
    let (close_tx, close_rx) = oneshot::channel();
    let url = feed_server(vec![E2E_FRAME.to_string()], close_rx).await;

    let mut handle = engine_for(&url, FeedTelemetry::new().unwrap()).spawn();
    let display = handle.display();

    assert!(wait_for(&display, |d| d.snapshot.is_some()).await);
    {
        let state = display.read().await;
        assert_eq!(state.status, ConnectionStatus::Connected);
        let surface = state.surface();
        assert_eq!(surface.latency_text, "5ms");
        assert_eq!(surface.bid_rows[0].to_string(), "100.50 / 2.0000");
        assert_eq!(surface.ask_rows[0].to_string(), "101.00 / 1.5000");
    }

    close_tx.send(()).unwrap();
    assert!(wait_for(&display, |d| d.status == ConnectionStatus::Disconnected).await);

    // Stale data survives the disconnect
    assert!(display.read().await.snapshot.is_some());

    handle.shutdown().await;
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_malformed_frames_do_not_stop_ingestion() {
    let mut frames: Vec<String> = (0..500)
        .map(|i| {
            format!(
                r#"{{"bids":[[{}.0,1.0]],"asks":[],"eventTime":1000,"serverTime":1000}}"#,
                100 + i
            )
        })
        .collect();
    frames.insert(250, r#"{"bids":[[1.0,2.0,3.0]]}"#.to_string());

    let (_close_tx, close_rx) = oneshot::channel();
    let url = feed_server(frames, close_rx).await;

    let telemetry = FeedTelemetry::new().unwrap();
    let mut handle = engine_for(&url, telemetry.clone()).spawn();
    let display = handle.display();

    assert!(
        wait_for(&display, |d| {
            d.snapshot
                .as_ref()
                .is_some_and(|s| s.bids[0].price == 599.0)
        })
        .await
    );
    assert_eq!(telemetry.frames_decoded.get(), 500);
    assert_eq!(telemetry.decode_errors.get(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_feed_reports_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let telemetry = FeedTelemetry::new().unwrap();
    let mut handle = engine_for(&url, telemetry.clone()).spawn();
    let display = handle.display();

    assert!(wait_for(&display, |d| d.status == ConnectionStatus::Disconnected).await);
    assert!(display.read().await.snapshot.is_none());
    assert_eq!(telemetry.transport_errors.get(), 1);

    // Timers keep running after the session ends
    assert!(handle.is_running());
    handle.shutdown().await;
}
