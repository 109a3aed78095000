//! In-memory route sessions using DashMap.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use velo_core::{dispatch, EditCommand, EngineConfig, InteractionMode, MapEvent, RouteEditor, RoutingGateway};

/// One editable route and the map interaction state around it.
pub struct RouteSession<G> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub editor: RouteEditor<G>,
    pub mode: InteractionMode,
    last_seen: Instant,
}

/// Application state - route sessions sharing one routing gateway.
pub struct AppState<G> {
    sessions: DashMap<String, RouteSession<G>>,
    gateway: Arc<G>,
    engine: EngineConfig,
}

impl<G: RoutingGateway> AppState<G> {
    pub fn new(gateway: impl Into<Arc<G>>, engine: EngineConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            gateway: gateway.into(),
            engine,
        }
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Open a new session; returns its id, creation time and editor.
    pub fn create_session(&self) -> (String, DateTime<Utc>, RouteEditor<G>) {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let editor = RouteEditor::new(Arc::clone(&self.gateway), self.engine.clone());
        self.sessions.insert(
            id.clone(),
            RouteSession {
                id: id.clone(),
                created_at,
                editor: editor.clone(),
                mode: InteractionMode::default(),
                last_seen: Instant::now(),
            },
        );
        (id, created_at, editor)
    }

    /// Editor of session `id`, marking the session as used.
    pub fn editor(&self, id: &str) -> Option<(DateTime<Utc>, RouteEditor<G>)> {
        let mut session = self.sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some((session.created_at, session.editor.clone()))
    }

    /// Editor of session `id` for a path drop, which ends any drag in progress.
    pub fn finish_path_drag(&self, id: &str) -> Option<(DateTime<Utc>, RouteEditor<G>)> {
        let mut session = self.sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        session.mode.dragging = false;
        Some((session.created_at, session.editor.clone()))
    }

    /// Translate a map event under the session's interaction mode.
    pub fn dispatch_event(&self, id: &str, event: MapEvent) -> Option<(Option<EditCommand>, InteractionMode)> {
        let mut session = self.sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        let sequence = session.editor.sequence();
        let command = dispatch(event, &mut session.mode, &sequence);
        Some((command, session.mode))
    }

    pub fn remove_session(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for longer than `max_idle`, then the least recently
    /// used ones until at most `max_sessions` remain. Returns how many went.
    pub fn prune_sessions(&self, max_sessions: usize, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        let now = Instant::now();
        self.sessions
            .retain(|_, session| now.duration_since(session.last_seen) <= max_idle);

        if self.sessions.len() > max_sessions {
            let mut by_age: Vec<(String, Instant)> = self
                .sessions
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().last_seen))
                .collect();
            by_age.sort_by_key(|(_, last_seen)| *last_seen);
            let excess = by_age.len().saturating_sub(max_sessions);
            for (id, _) in by_age.into_iter().take(excess) {
                self.sessions.remove(&id);
            }
        }
        before.saturating_sub(self.sessions.len())
    }
}
