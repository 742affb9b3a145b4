//! WebSocket client for the order book feed
//!
//! Owns the single persistent connection and surfaces its lifecycle as
//! [`StreamEvent`]s, delivered in transport arrival order.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{MonitorError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the transport drops without a close handshake
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported for a close frame that carried no status
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Upper bound on the close handshake during teardown
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Raw inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lifecycle and data events raised by a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Handshake completed. Raised exactly once per successful connection.
    Opened,

    /// One inbound data frame.
    Message(Frame),

    /// Transport-level failure. May be followed by `Closed`.
    Errored(String),

    /// Session ended. Raised at most once and always last.
    Closed { code: u16, reason: String },
}

/// Handle to a running connection
pub struct StreamHandle {
    events: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    finished: bool,
    disconnected: bool,
}

/// Open a connection to `url`.
///
/// Returns immediately. Connection failures arrive as `Errored` followed by
/// `Closed` rather than as an error from this call. Must be called from
/// within a tokio runtime.
pub fn connect(url: &str, buffer: usize) -> StreamHandle {
    let (events_tx, events_rx) = mpsc::channel(buffer.max(1));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_connection(url.to_string(), events_tx, cancel.clone()));

    StreamHandle::from_parts(events_rx, cancel, task)
}

impl StreamHandle {
    pub(crate) fn from_parts(
        events: mpsc::Receiver<StreamEvent>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            cancel,
            task: Some(task),
            finished: false,
            disconnected: false,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the session has closed or the handle has been
    /// disconnected.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if !self.is_active() {
            return None;
        }

        match self.events.recv().await {
            Some(event) => {
                if matches!(event, StreamEvent::Closed { .. }) {
                    self.finished = true;
                }
                Some(event)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Whether further events may still arrive
    pub fn is_active(&self) -> bool {
        !self.finished && !self.disconnected
    }

    /// Tear down the connection. No event is delivered afterwards.
    ///
    /// Safe to call more than once.
    pub async fn disconnect(&mut self) {
        if self.disconnected {
            return;
        }
        self.disconnected = true;
        self.cancel.cancel();
        self.events.close();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Stream task ended abnormally");
            }
        }
        info!("Stream disconnected");
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connection task: connect, then forward frames until close or cancellation
async fn run_connection(
    url: String,
    events: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) {
    info!(url = %url, "Connecting to feed stream");

    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };

    let stream = match connected {
        Ok((stream, response)) => {
            info!(status = ?response.status(), "Feed stream connected");
            stream
        }
        Err(e) => {
            let err = MonitorError::from(e);
            error!(error = %err, "Failed to connect to feed stream");
            if emit(&events, StreamEvent::Errored(err.to_string())).await {
                emit(
                    &events,
                    StreamEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: err.to_string(),
                    },
                )
                .await;
            }
            return;
        }
    };

    if !emit(&events, StreamEvent::Opened).await {
        return;
    }

    let mut client = WebSocketClient { stream };

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => {
                client.close().await;
                return;
            }
            received = client.recv() => received,
        };

        let event = match received {
            Ok(Some(frame)) => StreamEvent::Message(frame),
            Ok(None) => continue,
            Err(MonitorError::ConnectionClosed { code, reason }) => {
                emit(&events, StreamEvent::Closed { code, reason }).await;
                return;
            }
            Err(e) => {
                if emit(&events, StreamEvent::Errored(e.to_string())).await {
                    emit(
                        &events,
                        StreamEvent::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: e.to_string(),
                        },
                    )
                    .await;
                }
                return;
            }
        };

        if !emit(&events, event).await {
            client.close().await;
            return;
        }
    }
}

/// Forward an event; `false` once the handle has gone away
async fn emit(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    events.send(event).await.is_ok()
}

/// Established websocket connection
struct WebSocketClient {
    stream: WsStream,
}

impl WebSocketClient {
    /// Receive the next data frame.
    ///
    /// `Ok(None)` for control frames; `ConnectionClosed` once the peer closes.
    async fn recv(&mut self) -> Result<Option<Frame>> {
        match self.stream.next().await {
            Some(Ok(Message::Text(text))) => {
                trace!(len = text.len(), "Received text frame");
                Ok(Some(Frame::Text(text)))
            }
            Some(Ok(Message::Binary(data))) => {
                trace!(len = data.len(), "Received binary frame");
                Ok(Some(Frame::Binary(data)))
            }
            Some(Ok(Message::Ping(_))) => {
                // tungstenite queues the pong reply itself
                debug!("Received ping");
                Ok(None)
            }
            Some(Ok(Message::Pong(_))) => {
                debug!("Received pong");
                Ok(None)
            }
            Some(Ok(Message::Close(frame))) => {
                warn!(frame = ?frame, "Received close frame");
                let (code, reason) = match frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                    None => (NO_STATUS_RECEIVED, String::new()),
                };
                Err(MonitorError::ConnectionClosed { code, reason })
            }
            Some(Ok(Message::Frame(_))) => Ok(None),
            Some(Err(e)) => {
                error!(error = %e, "WebSocket error");
                Err(MonitorError::from(e))
            }
            None => {
                warn!("WebSocket stream ended");
                Err(MonitorError::Transport("stream ended".to_string()))
            }
        }
    }

    /// Close the connection
    async fn close(&mut self) {
        if timeout(CLOSE_GRACE, self.stream.close(None)).await.is_err() {
            debug!("Close handshake did not complete");
        }
    }
}
