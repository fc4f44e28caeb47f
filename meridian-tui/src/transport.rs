//! Live feed for one analysis request: WebSocket with reconnect, polling
//! fallback, terminal-state detection.
//!
//! The feed runs as one tokio task owned by a [`LiveFeed`] handle. Dropping
//! or stopping the handle aborts the task, so no frame is delivered after
//! the view goes away.

use crate::config::{ReconnectConfig, TransportKind, TuiConfig};
use crate::events::TuiEvent;
use futures_util::StreamExt;
use meridian_core::{now_timestamp, RequestStatus};
use meridian_events::{events_from_poll, PollBatch, PollResponse};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Why the feed stopped on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    Failed,
}

impl FinishReason {
    /// Request status the graph records for this outcome.
    pub fn request_status(&self) -> RequestStatus {
        match self {
            FinishReason::Completed => RequestStatus::Completed,
            FinishReason::Failed => RequestStatus::Error,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Completed => write!(f, "analysis completed"),
            FinishReason::Failed => write!(f, "analysis failed"),
        }
    }
}

/// Everything the feed reports to the event loop.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Connected { transport: TransportKind },
    Frame(Value),
    Poll(PollBatch),
    Disconnected { reason: String },
    Reconnecting { attempt: u32, delay_ms: u64 },
    FellBackToPolling { failures: u32 },
    Finished(FinishReason),
    Error(String),
}

// ============================================================================
// FRAME CLASSIFICATION
// ============================================================================

/// What the transport does with one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameClass {
    /// Forwarded to the normalizer
    Data(Value),
    /// Stop the feed without reconnecting
    Terminal(FinishReason),
    /// Keep-alive traffic
    Ignored,
    Malformed(String),
}

pub fn classify_frame(text: &str) -> FrameClass {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return FrameClass::Malformed(err.to_string()),
    };
    match value.get("type").and_then(Value::as_str) {
        Some("analysis_complete") | Some("analysis_completed") => {
            FrameClass::Terminal(FinishReason::Completed)
        }
        Some("analysis_failed") => FrameClass::Terminal(FinishReason::Failed),
        Some("ping") | Some("pong") => FrameClass::Ignored,
        _ => FrameClass::Data(value),
    }
}

/// Terminal outcome reported by a poll response, if any.
pub fn poll_finish_reason(batch: &PollBatch) -> Option<FinishReason> {
    match batch.request_status {
        Some(RequestStatus::Completed) => Some(FinishReason::Completed),
        Some(RequestStatus::Error) => Some(FinishReason::Failed),
        Some(RequestStatus::Active) | None => None,
    }
}

// ============================================================================
// RECONNECT BACKOFF
// ============================================================================

/// Reconnect delays. `multiplier = 1.0` with `max_ms = initial_ms` gives a
/// fixed delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current_ms: u64,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let current_ms = config.initial_ms;
        Self { config, current_ms }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = jittered_backoff(self.current_ms, self.config.jitter_ms);
        let next = (self.current_ms as f64 * self.config.multiplier) as u64;
        self.current_ms = next.min(self.config.max_ms).max(self.config.initial_ms);
        Duration::from_millis(delay)
    }

    pub fn reset(&mut self) {
        self.current_ms = self.config.initial_ms;
    }
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    let jitter = nanos % jitter_ms;
    base_ms.saturating_add(jitter)
}

// ============================================================================
// LIVE FEED
// ============================================================================

/// The parts of the config the feed task needs.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub ws_url: String,
    pub status_url: String,
    pub transport: TransportKind,
    pub poll_interval: Duration,
    pub fallback_to_polling_after: u32,
    pub reconnect: ReconnectConfig,
}

impl From<&TuiConfig> for FeedSettings {
    fn from(config: &TuiConfig) -> Self {
        Self {
            ws_url: config.ws_url(),
            status_url: config.status_url(),
            transport: config.transport,
            poll_interval: config.poll_interval(),
            fallback_to_polling_after: config.fallback_to_polling_after,
            reconnect: config.reconnect.clone(),
        }
    }
}

/// Owned handle to the running feed task.
#[derive(Debug)]
pub struct LiveFeed {
    handle: JoinHandle<()>,
}

impl LiveFeed {
    pub fn spawn(config: &TuiConfig, sender: mpsc::Sender<TuiEvent>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let settings = FeedSettings::from(config);
        let handle = tokio::spawn(run_feed(settings, client, sender));
        Ok(Self { handle })
    }

    /// Abort the feed task. Takes effect at its next suspension point; no
    /// further events are sent after that.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

enum WsExit {
    Finished,
    ReceiverGone,
    FallBack { failures: u32 },
}

async fn emit(sender: &mpsc::Sender<TuiEvent>, event: FeedEvent) -> bool {
    sender.send(TuiEvent::Feed(event)).await.is_ok()
}

async fn run_feed(settings: FeedSettings, client: reqwest::Client, sender: mpsc::Sender<TuiEvent>) {
    if settings.transport == TransportKind::Websocket {
        match run_websocket(&settings, &sender).await {
            WsExit::Finished | WsExit::ReceiverGone => return,
            WsExit::FallBack { failures } => {
                info!(failures, "Switching analysis feed to polling");
                if !emit(&sender, FeedEvent::FellBackToPolling { failures }).await {
                    return;
                }
            }
        }
    }
    run_polling(&settings, &client, &sender).await;
}

async fn run_websocket(settings: &FeedSettings, sender: &mpsc::Sender<TuiEvent>) -> WsExit {
    let mut backoff = Backoff::new(settings.reconnect.clone());
    let mut failures = 0u32;
    let mut attempt = 0u32;

    loop {
        debug!(url = %settings.ws_url, attempt, "Connecting analysis feed");
        match connect_async(settings.ws_url.as_str()).await {
            Ok((mut stream, _)) => {
                info!(url = %settings.ws_url, "Analysis feed connected");
                let connected = FeedEvent::Connected {
                    transport: TransportKind::Websocket,
                };
                if !emit(sender, connected).await {
                    return WsExit::ReceiverGone;
                }
                backoff.reset();
                attempt = 0;
                let mut delivered = false;
                let mut reason = "connection closed".to_string();

                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => match classify_frame(&text) {
                            FrameClass::Data(value) => {
                                delivered = true;
                                failures = 0;
                                if !emit(sender, FeedEvent::Frame(value)).await {
                                    return WsExit::ReceiverGone;
                                }
                            }
                            FrameClass::Terminal(finish) => {
                                info!(reason = %finish, "Analysis feed finished");
                                let _ = stream.close(None).await;
                                let _ = emit(sender, FeedEvent::Finished(finish)).await;
                                return WsExit::Finished;
                            }
                            FrameClass::Ignored => {}
                            FrameClass::Malformed(err) => {
                                debug!(error = %err, "Skipping non-JSON frame");
                            }
                        },
                        Ok(Message::Close(frame)) => {
                            if let Some(frame) = frame {
                                reason = format!("closed by server: {}", frame.reason);
                            }
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(error = %err, "Analysis feed read failed");
                            reason = err.to_string();
                            break;
                        }
                    }
                }

                if !delivered {
                    failures += 1;
                }
                if !emit(sender, FeedEvent::Disconnected { reason }).await {
                    return WsExit::ReceiverGone;
                }
            }
            Err(err) => {
                failures += 1;
                warn!(url = %settings.ws_url, error = %err, failures, "Analysis feed connect failed");
                if !emit(sender, FeedEvent::Error(format!("connect failed: {}", err))).await {
                    return WsExit::ReceiverGone;
                }
            }
        }

        if settings.fallback_to_polling_after > 0 && failures >= settings.fallback_to_polling_after
        {
            return WsExit::FallBack { failures };
        }

        attempt += 1;
        let delay = backoff.next_delay();
        let reconnecting = FeedEvent::Reconnecting {
            attempt,
            delay_ms: delay.as_millis() as u64,
        };
        if !emit(sender, reconnecting).await {
            return WsExit::ReceiverGone;
        }
        tokio::time::sleep(delay).await;
    }
}

async fn run_polling(settings: &FeedSettings, client: &reqwest::Client, sender: &mpsc::Sender<TuiEvent>) {
    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut healthy = false;

    loop {
        ticker.tick().await;
        match poll_once(client, &settings.status_url).await {
            Ok(response) => {
                if !healthy {
                    healthy = true;
                    let connected = FeedEvent::Connected {
                        transport: TransportKind::Polling,
                    };
                    if !emit(sender, connected).await {
                        return;
                    }
                }
                let batch = events_from_poll(&response, &now_timestamp());
                let finish = poll_finish_reason(&batch);
                debug!(events = batch.events.len(), status = %response.status, "Polled analysis status");
                if !emit(sender, FeedEvent::Poll(batch)).await {
                    return;
                }
                if let Some(finish) = finish {
                    info!(reason = %finish, "Analysis feed finished");
                    let _ = emit(sender, FeedEvent::Finished(finish)).await;
                    return;
                }
            }
            Err(err) => {
                healthy = false;
                warn!(url = %settings.status_url, error = %err, "Status poll failed");
                if !emit(sender, FeedEvent::Error(format!("poll failed: {}", err))).await {
                    return;
                }
            }
        }
    }
}

async fn poll_once(client: &reqwest::Client, url: &str) -> Result<PollResponse, TransportError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<PollResponse>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconnect(initial_ms: u64, max_ms: u64, multiplier: f64) -> ReconnectConfig {
        ReconnectConfig {
            initial_ms,
            max_ms,
            multiplier,
            jitter_ms: 0,
        }
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(
            classify_frame(r#"{"type":"analysis_completed"}"#),
            FrameClass::Terminal(FinishReason::Completed)
        );
        assert_eq!(
            classify_frame(r#"{"type":"analysis_complete","result":{}}"#),
            FrameClass::Terminal(FinishReason::Completed)
        );
        assert_eq!(
            classify_frame(r#"{"type":"analysis_failed"}"#),
            FrameClass::Terminal(FinishReason::Failed)
        );
        assert_eq!(classify_frame(r#"{"type":"ping"}"#), FrameClass::Ignored);
        assert!(matches!(classify_frame("garbage"), FrameClass::Malformed(_)));
    }

    #[test]
    fn test_data_frames_pass_through() {
        let frame = classify_frame(r#"{"type":"agent_status","agent":"CEO"}"#);
        assert_eq!(
            frame,
            FrameClass::Data(json!({"type": "agent_status", "agent": "CEO"}))
        );
        // Unknown types are the normalizer's call, not the transport's.
        assert!(matches!(classify_frame(r#"{"type":"whatever"}"#), FrameClass::Data(_)));
    }

    #[test]
    fn test_fixed_backoff_never_grows() {
        let mut backoff = Backoff::new(reconnect(3_000, 3_000, 1.0));
        for _ in 0..5 {
            assert_eq!(backoff.next_delay(), Duration::from_millis(3_000));
        }
    }

    #[test]
    fn test_exponential_backoff_is_capped_and_resets() {
        let mut backoff = Backoff::new(reconnect(100, 500, 2.0));
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_millis() as u64).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..20 {
            let delay = jittered_backoff(1_000, 250);
            assert!((1_000..1_250).contains(&delay));
        }
    }

    #[test]
    fn test_poll_terminal_statuses() {
        let batch = |status: Option<RequestStatus>| PollBatch {
            events: Vec::new(),
            request_status: status,
        };
        assert_eq!(poll_finish_reason(&batch(None)), None);
        assert_eq!(poll_finish_reason(&batch(Some(RequestStatus::Active))), None);
        assert_eq!(
            poll_finish_reason(&batch(Some(RequestStatus::Completed))),
            Some(FinishReason::Completed)
        );
        assert_eq!(
            poll_finish_reason(&batch(Some(RequestStatus::Error))),
            Some(FinishReason::Failed)
        );
    }

    #[tokio::test]
    async fn test_dropping_feed_stops_delivery() {
        let (tx, mut rx) = mpsc::channel::<TuiEvent>(16);
        let mut config = crate::config::tests::sample_config();
        config.transport = TransportKind::Polling;
        config.api_base_url = "http://127.0.0.1:9".to_string();
        config.poll_interval_ms = 60_000;

        let feed = LiveFeed::spawn(&config, tx).expect("spawn feed");
        drop(feed);

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "feed kept its sender alive after drop");
    }
}
