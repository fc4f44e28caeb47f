//! Application state for one live view.

use crate::config::{TransportKind, TuiConfig};
use crate::layout::{layout, GraphLayout, LayoutParams, Pins, Position};
use crate::nav::View;
use crate::notifications::{Notification, NotificationLevel, MAX_NOTIFICATIONS};
use crate::theme::SynthBruteTheme;
use crate::transport::{FeedEvent, FinishReason};
use meridian_core::{AgentId, AgentNode};
use meridian_events::PollBatch;
use meridian_graph::{GraphStore, IngestOutcome};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::trace;

/// Ticks per half period of the pulsing marker.
pub const PULSE_TICKS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Polling,
    Finished(FinishReason),
}

impl ConnectionState {
    pub fn label(&self) -> String {
        match self {
            ConnectionState::Connecting => "connecting".to_string(),
            ConnectionState::Connected => "connected".to_string(),
            ConnectionState::Reconnecting { attempt } => format!("reconnecting ({})", attempt),
            ConnectionState::Polling => "polling".to_string(),
            ConnectionState::Finished(_) => "finished".to_string(),
        }
    }
}

/// Feed data waiting to be folded while updates are paused.
#[derive(Debug, Clone)]
pub enum QueuedItem {
    Frame(Value),
    Poll(PollBatch),
    Finish(FinishReason),
}

#[derive(Debug)]
pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub store: GraphStore,
    pub active_view: View,

    pub selected: Option<AgentId>,
    /// Selected node follows h/j/k/l on the graph
    pub grabbed: bool,
    pub pins: Pins,
    pub layout: GraphLayout,
    layout_params: LayoutParams,
    layout_version: Option<u64>,
    layout_stale: bool,

    pub connection: ConnectionState,
    pub notifications: Vec<Notification>,
    pub updates_paused: bool,
    pub event_queue: VecDeque<QueuedItem>,
    pub tick: u64,
    dirty: bool,
}

impl App {
    pub fn new(config: TuiConfig) -> Self {
        let store = GraphStore::new(config.store_options());
        let layout_params = LayoutParams::from(&config.layout);
        Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            store,
            active_view: View::Graph,
            selected: None,
            grabbed: false,
            pins: Pins::new(),
            layout: GraphLayout::default(),
            layout_params,
            layout_version: None,
            layout_stale: true,
            connection: ConnectionState::Connecting,
            notifications: Vec::new(),
            updates_paused: false,
            event_queue: VecDeque::new(),
            tick: 0,
            dirty: true,
        }
    }

    pub fn handle_feed(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connected { transport } => {
                self.connection = match transport {
                    TransportKind::Websocket => ConnectionState::Connected,
                    TransportKind::Polling => ConnectionState::Polling,
                };
                self.notify(NotificationLevel::Info, "Analysis feed connected");
            }
            FeedEvent::Frame(frame) => self.enqueue(QueuedItem::Frame(frame)),
            FeedEvent::Poll(batch) => self.enqueue(QueuedItem::Poll(batch)),
            FeedEvent::Disconnected { reason } => {
                self.notify(NotificationLevel::Warning, format!("Disconnected: {}", reason));
            }
            FeedEvent::Reconnecting { attempt, delay_ms } => {
                self.connection = ConnectionState::Reconnecting { attempt };
                self.notify(
                    NotificationLevel::Info,
                    format!("Reconnecting in {} ms (attempt {})", delay_ms, attempt),
                );
            }
            FeedEvent::FellBackToPolling { failures } => {
                self.connection = ConnectionState::Polling;
                self.notify(
                    NotificationLevel::Warning,
                    format!("WebSocket failed {} times, polling instead", failures),
                );
            }
            FeedEvent::Finished(reason) => {
                self.connection = ConnectionState::Finished(reason);
                self.enqueue(QueuedItem::Finish(reason));
                let level = match reason {
                    FinishReason::Completed => NotificationLevel::Success,
                    FinishReason::Failed => NotificationLevel::Error,
                };
                self.notify(level, reason.to_string());
            }
            FeedEvent::Error(message) => self.notify(NotificationLevel::Error, message),
        }
    }

    pub fn enqueue(&mut self, item: QueuedItem) {
        if self.updates_paused {
            self.event_queue.push_back(item);
        } else {
            self.apply(item);
        }
    }

    pub fn flush_queued_events(&mut self) {
        while let Some(item) = self.event_queue.pop_front() {
            self.apply(item);
        }
    }

    fn apply(&mut self, item: QueuedItem) {
        match item {
            QueuedItem::Frame(frame) => {
                let outcome = self.store.ingest_raw(&frame);
                trace!(?outcome, "Folded feed frame");
            }
            QueuedItem::Poll(batch) => {
                let applied = self
                    .store
                    .ingest_poll(&batch)
                    .into_iter()
                    .filter(|o| *o == IngestOutcome::Applied)
                    .count();
                trace!(applied, "Folded poll batch");
            }
            QueuedItem::Finish(reason) => {
                let changed = self.store.finish(reason.request_status());
                trace!(%reason, changed, "Folded terminal status");
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        self.updates_paused = !self.updates_paused;
        if !self.updates_paused {
            self.flush_queued_events();
        }
        self.dirty = true;
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
        self.dirty = true;
    }

    /// Agent ids in display order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.store.snapshot().nodes.keys().cloned().collect()
    }

    pub fn selected_node(&self) -> Option<AgentNode> {
        let id = self.selected.as_ref()?;
        self.store.snapshot().node(id).cloned()
    }

    pub fn select_next(&mut self) {
        let ids = self.agent_ids();
        select_next_id(&ids, &mut self.selected);
        self.dirty = true;
    }

    pub fn select_previous(&mut self) {
        let ids = self.agent_ids();
        select_prev_id(&ids, &mut self.selected);
        self.dirty = true;
    }

    /// Grab the selected node, or release it. A released node stays pinned.
    pub fn toggle_grab(&mut self) {
        if self.grabbed {
            self.grabbed = false;
            self.dirty = true;
            return;
        }
        let Some(id) = self.selected.clone() else {
            self.notify(NotificationLevel::Info, "Select an agent to grab it");
            return;
        };
        let at = self
            .pins
            .get(&id)
            .copied()
            .or_else(|| self.layout.position(&id))
            .unwrap_or(Position::new(0.0, 0.0));
        self.pins.insert(id, at);
        self.grabbed = true;
        self.layout_stale = true;
        self.dirty = true;
    }

    /// Nudge the grabbed node by whole steps. Canvas y grows upwards.
    pub fn move_grabbed(&mut self, dx: i32, dy: i32) {
        if !self.grabbed {
            return;
        }
        let Some(id) = self.selected.as_ref() else {
            return;
        };
        let step = self.layout_params.spring_length / 4.0;
        if let Some(pin) = self.pins.get_mut(id) {
            pin.x += dx as f64 * step;
            pin.y += dy as f64 * step;
            self.layout_stale = true;
            self.dirty = true;
        }
    }

    pub fn reset_pins(&mut self) {
        self.pins.clear();
        self.grabbed = false;
        self.layout_stale = true;
        self.dirty = true;
    }

    /// Recompute the layout if the snapshot or the pins changed.
    pub fn refresh_layout(&mut self) -> bool {
        let snapshot = self.store.snapshot();
        if !self.layout_stale && self.layout_version == Some(snapshot.version) {
            return false;
        }
        self.layout = layout(
            &snapshot,
            Some(&self.layout),
            &self.pins,
            &self.layout_params,
            &self.theme,
        );
        self.layout_version = Some(snapshot.version);
        self.layout_stale = false;
        if let Some(id) = &self.selected {
            if !snapshot.nodes.contains_key(id) {
                self.selected = None;
                self.grabbed = false;
            }
        }
        true
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Advance the clock. True when the next frame must be drawn.
    pub fn on_tick(&mut self) -> bool {
        self.tick = self.tick.wrapping_add(1);
        let changed = self.refresh_layout();
        let pulse_flipped = self.tick % PULSE_TICKS == 0
            && self.layout.visuals.values().any(|v| v.animated);
        let redraw = changed || pulse_flipped || self.dirty;
        self.dirty = false;
        redraw
    }

    /// Phase of the pulsing marker for animated statuses.
    pub fn pulse_on(&self) -> bool {
        (self.tick / PULSE_TICKS) % 2 == 0
    }

    /// Stop folding. Later frames are refused by the store.
    pub fn dispose(&self) {
        self.store.dispose();
    }
}

fn select_next_id(ids: &[AgentId], selected: &mut Option<AgentId>) {
    if ids.is_empty() {
        *selected = None;
        return;
    }
    let next = selected
        .as_ref()
        .and_then(|id| ids.iter().position(|candidate| candidate == id))
        .map(|index| (index + 1) % ids.len())
        .unwrap_or(0);
    *selected = Some(ids[next].clone());
}

fn select_prev_id(ids: &[AgentId], selected: &mut Option<AgentId>) {
    if ids.is_empty() {
        *selected = None;
        return;
    }
    let index = selected
        .as_ref()
        .and_then(|id| ids.iter().position(|candidate| candidate == id))
        .unwrap_or(0);
    let prev = if index == 0 { ids.len() - 1 } else { index - 1 };
    *selected = Some(ids[prev].clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use meridian_core::{AgentStatus, RequestStatus};
    use meridian_events::{events_from_poll, PollResponse};
    use meridian_test_utils::fixtures::reference_run_frames;
    use serde_json::json;

    fn app_with_reference_run() -> App {
        let mut app = App::new(sample_config());
        for frame in reference_run_frames() {
            app.handle_feed(FeedEvent::Frame(frame));
        }
        app
    }

    #[test]
    fn test_frames_fold_as_they_arrive() {
        let app = app_with_reference_run();
        let snapshot = app.store.snapshot();
        assert_eq!(snapshot.version, 3);
        assert_eq!(
            snapshot.node("Research_Leader").map(|n| n.status),
            Some(AgentStatus::Completed)
        );
    }

    #[test]
    fn test_paused_frames_replay_on_resume() {
        let mut app = App::new(sample_config());
        app.toggle_pause();
        for frame in reference_run_frames() {
            app.handle_feed(FeedEvent::Frame(frame));
        }
        assert_eq!(app.store.snapshot().version, 0);
        assert_eq!(app.event_queue.len(), 3);

        app.toggle_pause();
        assert!(app.event_queue.is_empty());
        assert_eq!(app.store.snapshot().version, 3);
    }

    #[test]
    fn test_connection_labels_follow_feed() {
        let mut app = App::new(sample_config());
        assert_eq!(app.connection.label(), "connecting");
        app.handle_feed(FeedEvent::Connected {
            transport: TransportKind::Websocket,
        });
        assert_eq!(app.connection.label(), "connected");
        app.handle_feed(FeedEvent::Reconnecting {
            attempt: 2,
            delay_ms: 3_000,
        });
        assert_eq!(app.connection.label(), "reconnecting (2)");
        app.handle_feed(FeedEvent::FellBackToPolling { failures: 3 });
        assert_eq!(app.connection, ConnectionState::Polling);
        app.handle_feed(FeedEvent::Finished(FinishReason::Completed));
        assert_eq!(app.connection.label(), "finished");
    }

    #[test]
    fn test_failed_feed_reaches_request_status() {
        let mut app = app_with_reference_run();
        assert_eq!(app.store.request_status(), RequestStatus::Active);
        app.handle_feed(FeedEvent::Finished(FinishReason::Failed));
        assert_eq!(
            app.store.snapshot().aggregates.request_status,
            RequestStatus::Error
        );
    }

    #[test]
    fn test_terminal_status_waits_behind_paused_frames() {
        let mut app = App::new(sample_config());
        app.toggle_pause();
        for frame in reference_run_frames() {
            app.handle_feed(FeedEvent::Frame(frame));
        }
        app.handle_feed(FeedEvent::Finished(FinishReason::Completed));
        assert_eq!(app.connection.label(), "finished");
        assert_eq!(app.store.request_status(), RequestStatus::Active);

        app.toggle_pause();
        assert_eq!(app.store.request_status(), RequestStatus::Completed);
        assert_eq!(app.store.snapshot().version, 4);
    }

    #[test]
    fn test_failed_poll_reaches_request_status() {
        let mut app = app_with_reference_run();
        let response: PollResponse =
            serde_json::from_str(r#"{"status":"failed"}"#).expect("poll body");
        app.handle_feed(FeedEvent::Poll(events_from_poll(&response, "2024-05-01T10:00:09.000Z")));
        assert_eq!(app.store.request_status(), RequestStatus::Error);
    }

    #[test]
    fn test_graph_survives_reconnect() {
        let mut app = app_with_reference_run();
        app.handle_feed(FeedEvent::Disconnected {
            reason: "reset".to_string(),
        });
        app.handle_feed(FeedEvent::Reconnecting {
            attempt: 1,
            delay_ms: 3_000,
        });
        assert_eq!(app.store.snapshot().nodes.len(), 2);
    }

    #[test]
    fn test_selection_wraps_around() {
        let mut app = app_with_reference_run();
        app.select_next();
        assert_eq!(app.selected.as_deref(), Some("CEO"));
        app.select_next();
        assert_eq!(app.selected.as_deref(), Some("Research_Leader"));
        app.select_next();
        assert_eq!(app.selected.as_deref(), Some("CEO"));
        app.select_previous();
        assert_eq!(app.selected.as_deref(), Some("Research_Leader"));
    }

    #[test]
    fn test_dragging_never_touches_the_store() {
        let mut app = app_with_reference_run();
        app.refresh_layout();
        let before = app.store.snapshot();

        app.select_next();
        app.toggle_grab();
        assert!(app.grabbed);
        app.move_grabbed(1, 0);
        app.move_grabbed(0, -2);
        assert!(app.refresh_layout());

        let pinned = app.pins.get("CEO").copied();
        assert_eq!(app.layout.position("CEO"), pinned);
        assert_eq!(*app.store.snapshot(), *before);

        app.reset_pins();
        assert!(app.pins.is_empty());
        assert!(!app.grabbed);
    }

    #[test]
    fn test_layout_only_recomputes_on_change() {
        let mut app = app_with_reference_run();
        assert!(app.refresh_layout());
        assert!(!app.refresh_layout());
        app.handle_feed(FeedEvent::Frame(json!({
            "type": "agent_status",
            "agent": "Analysis_Leader",
            "status": "active",
        })));
        assert!(app.refresh_layout());
        assert!(app.layout.position("Analysis_Leader").is_some());
    }

    #[test]
    fn test_disposed_app_ignores_late_frames() {
        let mut app = app_with_reference_run();
        app.dispose();
        app.handle_feed(FeedEvent::Frame(json!({"type": "agent_status", "agent": "CEO"})));
        assert_eq!(app.store.snapshot().version, 3);
    }

    #[test]
    fn test_notifications_are_bounded() {
        let mut app = App::new(sample_config());
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            app.notify(NotificationLevel::Info, format!("note {}", i));
        }
        assert_eq!(app.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(
            app.notifications.last().map(|n| n.message.as_str()),
            Some(format!("note {}", MAX_NOTIFICATIONS + 4).as_str())
        );
    }
}
