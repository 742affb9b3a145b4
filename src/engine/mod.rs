//! Feed engine
//!
//! Runs the ingestion path, the render scheduler and the throughput sampler
//! on a single task. Handlers run to completion one at a time, so the
//! staging buffer needs no lock: the message branch writes it and the render
//! branch reads it, never concurrently.

mod pipeline;

pub use pipeline::Pipeline;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::MonitorError;
use crate::metrics::{Clock, FeedTelemetry, SystemClock};
use crate::render::{periodic, ConnectionStatus, DisplayState, RenderScheduler, SharedDisplay};
use crate::stream::{self, StreamEvent, StreamHandle};

/// Feed engine, ready to be spawned
pub struct Engine {
    config: Arc<Config>,
    pipeline: Pipeline,
    scheduler: RenderScheduler,
    display: SharedDisplay,
    clock: Box<dyn Clock>,
}

impl Engine {
    pub fn new(config: Arc<Config>, telemetry: FeedTelemetry) -> Self {
        Self::with_clock(config, telemetry, Box::new(SystemClock))
    }

    pub fn with_clock(config: Arc<Config>, telemetry: FeedTelemetry, clock: Box<dyn Clock>) -> Self {
        let pipeline = Pipeline::new(&config, telemetry);
        let scheduler = RenderScheduler::new(config.render_interval());

        Self {
            config,
            pipeline,
            scheduler,
            display: DisplayState::shared(),
            clock,
        }
    }

    pub fn display(&self) -> SharedDisplay {
        Arc::clone(&self.display)
    }

    /// Connect to the configured stream and start processing
    pub fn spawn(self) -> EngineHandle {
        let stream = stream::connect(&self.config.stream_url, self.config.event_buffer);
        self.spawn_with(stream)
    }

    pub(crate) fn spawn_with(self, stream: StreamHandle) -> EngineHandle {
        let cancel = CancellationToken::new();
        let display = self.display();
        let task = tokio::spawn(self.run(stream, cancel.clone()));

        EngineHandle {
            cancel,
            task: Some(task),
            display,
        }
    }

    async fn run(mut self, mut stream: StreamHandle, cancel: CancellationToken) {
        self.display.write().await.status = ConnectionStatus::Connecting;

        let mut render_ticker = self.scheduler.ticker();
        let mut throughput_ticker = periodic(self.config.throughput_window());

        info!(
            url = %self.config.stream_url,
            render_interval_ms = self.config.render_interval_ms,
            throughput_window_ms = self.config.throughput_window_ms,
            "Feed engine started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = stream.next_event(), if stream.is_active() => {
                    if let Some(event) = event {
                        self.on_event(event).await;
                    }
                }
                _ = render_ticker.tick() => self.render().await,
                _ = throughput_ticker.tick() => self.sample_throughput().await,
            }
        }

        stream.disconnect().await;
        info!(
            renders = self.scheduler.renders(),
            staged = self.pipeline.staging().writes(),
            "Feed engine stopped"
        );
    }

    async fn on_event(&mut self, event: StreamEvent) {
        match &event {
            StreamEvent::Message(frame) => {
                // Fast path: never touches the display state
                let received_at_ms = self.clock.now_ms();
                if let Err(e) = self.pipeline.ingest(frame.as_bytes(), received_at_ms) {
                    let err = MonitorError::from(e);
                    warn!(error = %err, len = frame.len(), "Dropping malformed frame");
                }
                return;
            }
            StreamEvent::Opened => {
                info!(url = %self.config.stream_url, "Feed connected");
            }
            StreamEvent::Errored(info) => {
                self.pipeline.telemetry().transport_errors.inc();
                let err = MonitorError::Transport(info.clone());
                warn!(error = %err, "Feed transport error");
            }
            StreamEvent::Closed { code, reason } => {
                let err = MonitorError::ConnectionClosed {
                    code: *code,
                    reason: reason.clone(),
                };
                warn!(error = %err, "Feed disconnected");
            }
        }

        let mut state = self.display.write().await;
        state.status = state.status.transition(&event);
        debug!(status = %state.status, "Connection status changed");
    }

    async fn render(&mut self) {
        let mut state = self.display.write().await;
        if self.scheduler.tick(self.pipeline.staging(), &mut state) {
            trace!(latency = %state.latency, "Display refreshed");
        }
    }

    async fn sample_throughput(&mut self) {
        let sample = self.pipeline.sample_throughput();
        self.display.write().await.throughput_hz = sample;
        trace!(throughput_hz = sample, "Throughput sampled");
    }
}

/// Handle to a running engine
pub struct EngineHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    display: SharedDisplay,
}

impl EngineHandle {
    pub fn display(&self) -> SharedDisplay {
        Arc::clone(&self.display)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the engine: cancels both timers and closes the connection.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Feed engine task ended abnormally");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
