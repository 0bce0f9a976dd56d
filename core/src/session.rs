//! The search session: owns every piece of client state and is the only place
//! that mutates it.
//!
//! Network calls and the reveal timer run as spawned tasks that report back
//! through an [`AppEvent`] channel. Callers drive the session by feeding it
//! those events ([`SearchSession::step`]), so all state transitions happen in
//! one logical thread, in the order events are handled.

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::backend::SearchBackend;
use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::error::ValidationError;
use crate::history::HistoryFile;
use crate::history::SearchHistory;
use crate::i18n::LocaleState;
use crate::i18n::TextBundle;
use crate::notification::Notice;
use crate::notification::NotificationSlot;
use crate::orchestrator::Reconciliation;
use crate::orchestrator::SearchOrchestrator;
use crate::orchestrator::SearchTicket;
use crate::orchestrator::normalize_query;
use crate::preferences::PreferenceStore;
use crate::preferences::Preferences;
use crate::reveal::Revealer;
use crate::upload::UploadFile;
use neurodoc_protocol::FilterSpec;
use neurodoc_protocol::Locale;
use neurodoc_protocol::LocaleSelection;
use neurodoc_protocol::SearchPayload;
use neurodoc_protocol::SearchRequest;
use neurodoc_protocol::SearchResult;
use neurodoc_protocol::Theme;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// External collaborators of a session, injected so tests can substitute them.
pub struct SessionInit {
    pub config: ClientConfig,
    pub backend: Arc<dyn SearchBackend>,
    pub preferences: Box<dyn PreferenceStore>,
    /// `None` keeps history for the lifetime of the session only.
    pub history_file: Option<HistoryFile>,
    /// Platform locale consulted when the selection is `auto`.
    pub environment_locale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Searching,
    Rendering,
    ResultsShown,
}

pub struct SearchSession {
    backend: Arc<dyn SearchBackend>,
    app_event_tx: AppEventSender,
    app_event_rx: UnboundedReceiver<AppEvent>,

    orchestrator: SearchOrchestrator,
    revealer: Revealer,
    notifications: NotificationSlot,
    history: SearchHistory,
    history_file: Option<HistoryFile>,

    locale: LocaleState,
    theme: Theme,
    preferences: Box<dyn PreferenceStore>,

    input: String,
    /// Applied to the next issued search only.
    pending_filters: Option<FilterSpec>,
    search_task: Option<JoinHandle<()>>,
    uploads_in_flight: usize,
}

impl SearchSession {
    pub fn new(init: SessionInit) -> Self {
        let SessionInit {
            config,
            backend,
            preferences,
            history_file,
            environment_locale,
        } = init;

        let stored = preferences.load().unwrap_or_else(|err| {
            warn!("failed to load preferences, using defaults: {err}");
            Preferences::default()
        });
        let history = match &history_file {
            Some(file) => file.load().unwrap_or_else(|err| {
                warn!("failed to load search history: {err}");
                SearchHistory::new()
            }),
            None => SearchHistory::new(),
        };

        let (app_event_tx, app_event_rx) = unbounded_channel();
        Self {
            backend,
            app_event_tx: AppEventSender::new(app_event_tx),
            app_event_rx,
            orchestrator: SearchOrchestrator::new(),
            revealer: Revealer::new(config.reveal_interval()),
            notifications: NotificationSlot::new(config.notification_ttl()),
            history,
            history_file,
            locale: LocaleState::new(stored.locale, environment_locale),
            theme: stored.theme,
            preferences,
            input: String::new(),
            pending_filters: None,
            search_task: None,
            uploads_in_flight: 0,
        }
    }

    /// Issues a search for `raw`. Whitespace-only input only posts the
    /// "empty query" notification.
    pub fn search(&mut self, raw: &str) -> Result<SearchTicket, ValidationError> {
        let query = match normalize_query(raw) {
            Ok(query) => query.to_string(),
            Err(err) => {
                self.notifications.notify(self.locale.texts().empty_query);
                return Err(err);
            }
        };

        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        let ticket = self.orchestrator.begin(&query);
        self.revealer.reset();

        let request = SearchRequest::new(query, self.locale.active())
            .with_filters(self.pending_filters.take());
        debug!(
            generation = ticket.generation,
            query = %request.query,
            lang = %request.lang,
            filtered = request.filters.is_some(),
            "issuing search"
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.app_event_tx.clone();
        let generation = ticket.generation;
        self.search_task = Some(tokio::spawn(async move {
            let outcome = backend.search(&request).await;
            tx.send(AppEvent::SearchSettled {
                generation,
                outcome,
            });
        }));
        Ok(ticket)
    }

    /// Searches for whatever the input box holds.
    pub fn submit_input(&mut self) -> Result<SearchTicket, ValidationError> {
        let input = self.input.clone();
        self.search(&input)
    }

    /// Re-runs a history entry. The history itself is untouched until that
    /// search succeeds.
    pub fn replay_history(&mut self, query: &str) -> Result<SearchTicket, ValidationError> {
        self.input = query.to_string();
        self.search(query)
    }

    /// Stores `filters` for the next search and, when the input box is not
    /// empty, re-runs it right away.
    pub fn apply_filters(
        &mut self,
        filters: FilterSpec,
    ) -> Option<Result<SearchTicket, ValidationError>> {
        self.pending_filters = Some(filters);
        if self.input.is_empty() {
            return None;
        }
        Some(self.submit_input())
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Clears the input box and everything on screen; history and loading are
    /// left alone.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.orchestrator.clear_input();
        self.revealer.reset();
    }

    pub fn remove_history(&mut self, query: &str) {
        if self.history.remove(query) {
            self.persist_history();
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    /// Sends `file` to the upload endpoint. Failures are logged, never shown.
    pub fn upload(&mut self, file: Option<UploadFile>) {
        let Some(file) = file else {
            return;
        };
        self.uploads_in_flight += 1;
        self.orchestrator.annotate_upload(file.name.clone());
        self.sync_reveal();

        debug!(file = %file.name, bytes = file.contents.len(), "uploading file");
        let backend = Arc::clone(&self.backend);
        let tx = self.app_event_tx.clone();
        let file_name = file.name.clone();
        tokio::spawn(async move {
            let outcome = backend.upload(file).await;
            tx.send(AppEvent::UploadSettled { file_name, outcome });
        });
    }

    pub fn select_locale(&mut self, selection: LocaleSelection) {
        if self.locale.select(selection) {
            info!(selection = %selection, active = %self.locale.active(), "locale changed");
            self.persist_preferences();
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            info!(%theme, "theme changed");
            self.persist_preferences();
        }
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.app_event_rx.recv().await
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SearchSettled {
                generation,
                outcome,
            } => self.on_search_settled(generation, outcome),
            AppEvent::UploadSettled { file_name, outcome } => {
                self.on_upload_settled(&file_name, outcome)
            }
            AppEvent::RevealTick { response_id } => {
                self.revealer.on_tick(response_id);
            }
        }
    }

    /// Waits for and handles one event. Returns `false` if the channel closed.
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Handles events until no request is outstanding and no reveal runs.
    /// Never returns while a request hangs.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            if !self.step().await {
                break;
            }
        }
    }

    fn on_search_settled(
        &mut self,
        generation: u64,
        outcome: Result<SearchPayload, BackendError>,
    ) {
        match self
            .orchestrator
            .reconcile(generation, outcome, self.locale.texts())
        {
            Reconciliation::Stale { generation } => {
                debug!(generation, "discarding superseded search response");
                return;
            }
            Reconciliation::Results { query, count } => {
                debug!(%query, count, "search returned results");
                self.history.record(&query);
                self.persist_history();
            }
            Reconciliation::NoResults { query } => {
                debug!(%query, "search returned no results");
            }
            Reconciliation::Failed { query, error } => {
                warn!(%query, "search failed: {error}");
            }
        }
        self.search_task = None;
        self.sync_reveal();
    }

    fn on_upload_settled(&mut self, file_name: &str, outcome: Result<(), BackendError>) {
        self.uploads_in_flight = self.uploads_in_flight.saturating_sub(1);
        match outcome {
            Ok(()) => debug!(file = %file_name, "upload finished"),
            Err(err) => warn!(file = %file_name, "upload failed: {err}"),
        }
        self.sync_reveal();
    }

    /// Starts the reveal of a fresh response once nothing is loading; stops a
    /// running reveal while something is.
    fn sync_reveal(&mut self) {
        if self.loading() {
            self.revealer.halt();
            return;
        }
        let render = self.orchestrator.render();
        if render.response.is_empty() || self.revealer.has_started(render.response_id) {
            return;
        }
        self.revealer
            .start(render.response_id, &render.response, &self.app_event_tx);
    }

    fn persist_history(&self) {
        if let Some(file) = &self.history_file
            && let Err(err) = file.save(&self.history)
        {
            warn!("failed to persist search history: {err}");
        }
    }

    fn persist_preferences(&self) {
        let preferences = Preferences {
            locale: self.locale.selection(),
            theme: self.theme,
        };
        if let Err(err) = self.preferences.save(&preferences) {
            warn!("failed to persist preferences: {err}");
        }
    }

    /// True exactly while a search or an upload is outstanding.
    pub fn loading(&self) -> bool {
        self.orchestrator.is_searching() || self.uploads_in_flight > 0
    }

    pub fn is_busy(&self) -> bool {
        self.loading() || self.revealer.is_revealing()
    }

    pub fn phase(&self) -> SearchPhase {
        if self.orchestrator.is_searching() {
            SearchPhase::Searching
        } else if !self.orchestrator.render().results.is_empty() {
            SearchPhase::ResultsShown
        } else if self.revealer.is_revealing() {
            SearchPhase::Rendering
        } else {
            SearchPhase::Idle
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.orchestrator.render().results
    }

    pub fn response(&self) -> &str {
        &self.orchestrator.render().response
    }

    pub fn displayed(&self) -> &str {
        self.revealer.displayed()
    }

    pub fn uploaded_file(&self) -> Option<&str> {
        self.orchestrator.render().uploaded_file.as_deref()
    }

    pub fn notification(&self) -> Option<&Notice> {
        self.notifications.current()
    }

    pub fn notifications_posted(&self) -> u64 {
        self.notifications.posted()
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn pending_filters(&self) -> Option<&FilterSpec> {
        self.pending_filters.as_ref()
    }

    pub fn active_locale(&self) -> Locale {
        self.locale.active()
    }

    pub fn locale_selection(&self) -> LocaleSelection {
        self.locale.selection()
    }

    pub fn texts(&self) -> &'static TextBundle {
        self.locale.texts()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
    }
}
