//! Host-side bridge to an e-book renderer running inside an isolated web
//! surface.
//!
//! Host intents are encoded into scripts and handed to a [`RemoteHandle`];
//! renderer events come back as JSON messages and are folded into a single
//! [`ReaderState`] snapshot by the reducer.

use std::sync::Arc;

use shared::{
    domain::{
        Cfi, FontSize, Location, MarkKind, MarkToken, RequestId, SearchResult, StyleRules, Theme,
    },
    protocol::{decode_message, ReaderEvent},
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

pub mod config;
pub mod encoder;
pub mod error;
pub mod literal;
pub mod marks;
pub mod pending;
pub mod reducer;
pub mod remote;
pub mod state;
pub mod store;
pub mod surface;

pub use config::{load_settings, Settings};
pub use encoder::{Command, FontFamily, MarkRequest, SearchQuery};
pub use error::{BridgeError, DispatchError, EncodeError};
pub use literal::Script;
pub use marks::{MarkActivation, MarkHandler};
pub use pending::RequestKind;
pub use remote::{ChannelRemote, RemoteHandle};
pub use state::{ReaderState, StateUpdate};

use crate::{
    marks::MarkRegistry,
    pending::{Admission, PendingRequests},
    store::StateStore,
};

/// Controller for one reader instance.
///
/// Owns the state store, the optional remote handle and the bookkeeping for
/// in-flight requests and annotation handlers. Several bridges can coexist;
/// nothing is process-global.
///
/// Commands issued while no rendering surface is registered are dropped
/// without error: an unmounted surface is an expected transient state.
///
/// Only one search and one text extraction are live at a time. Issuing a new
/// one supersedes the previous request, whose answer is then ignored.
pub struct ReaderBridge {
    store: StateStore,
    remote: Option<Arc<dyn RemoteHandle>>,
    pending: PendingRequests,
    marks: MarkRegistry,
    events: broadcast::Sender<ReaderEvent>,
    default_mark_styles: StyleRules,
}

impl ReaderBridge {
    pub fn new(settings: &Settings) -> Self {
        let initial = ReaderState {
            font_family: settings.font_family.clone(),
            font_size: settings.font_size,
            ..ReaderState::default()
        };
        let (events, _) = broadcast::channel(settings.event_buffer.clamp(1, config::MAX_CAPACITY));
        Self {
            store: StateStore::new(initial),
            remote: None,
            pending: PendingRequests::default(),
            marks: MarkRegistry::default(),
            events,
            default_mark_styles: settings.default_mark_styles(),
        }
    }

    /// Seeds the location table with one computed earlier (for example a
    /// table saved from a previous session).
    pub fn with_locations(mut self, locations: Vec<Cfi>) -> Self {
        self.store
            .apply_update(StateUpdate::SetLocations(Arc::from(locations)));
        self
    }

    pub fn register_remote(&mut self, remote: Arc<dyn RemoteHandle>) {
        info!("rendering surface registered");
        self.remote = Some(remote);
    }

    /// Detaches the rendering surface. Later commands become no-ops and
    /// annotation handlers are released along with the page that held them.
    pub fn unregister_remote(&mut self) {
        if self.remote.take().is_some() {
            info!("rendering surface unregistered");
        }
        self.release_page_bindings();
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn snapshot(&self) -> Arc<ReaderState> {
        self.store.snapshot()
    }

    pub fn state(&self) -> &ReaderState {
        self.store.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<Arc<ReaderState>> {
        self.store.subscribe()
    }

    /// Every decoded renderer event, passthrough events included, after it
    /// has been applied to the snapshot.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    pub fn get_locations(&self) -> Arc<[Cfi]> {
        Arc::clone(&self.store.state().locations)
    }

    pub fn get_current_location(&self) -> Option<Location> {
        self.store.state().current_location.clone()
    }

    pub fn set_at_start(&mut self, at_start: bool) {
        self.store.apply_update(StateUpdate::SetAtStart(at_start));
    }

    pub fn set_at_end(&mut self, at_end: bool) {
        self.store.apply_update(StateUpdate::SetAtEnd(at_end));
    }

    pub fn set_total_locations(&mut self, total_locations: u32) {
        self.store
            .apply_update(StateUpdate::SetTotalLocations(total_locations));
    }

    pub fn set_current_location(&mut self, location: Location) {
        self.store
            .apply_update(StateUpdate::SetCurrentLocation(location));
    }

    /// Values above 100 are clamped.
    pub fn set_progress(&mut self, progress: u8) {
        self.store.apply_update(StateUpdate::SetProgress(progress));
    }

    pub fn set_locations(&mut self, locations: Vec<Cfi>) {
        self.store
            .apply_update(StateUpdate::SetLocations(Arc::from(locations)));
    }

    pub fn set_is_loading(&mut self, is_loading: bool) {
        self.store.apply_update(StateUpdate::SetIsLoading(is_loading));
    }

    pub fn set_is_rendering(&mut self, is_rendering: bool) {
        self.store
            .apply_update(StateUpdate::SetIsRendering(is_rendering));
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.store.apply_update(StateUpdate::SetKey(key.into()));
    }

    pub fn set_search_results(&mut self, results: Vec<SearchResult>) {
        self.store
            .apply_update(StateUpdate::SetSearchResults(Arc::from(results)));
    }

    pub fn set_current_html(&mut self, html: impl Into<String>) {
        self.store
            .apply_update(StateUpdate::SetCurrentHtml(html.into()));
    }

    /// Applies `theme` in the renderer. The snapshot is updated optimistically.
    pub fn change_theme(&mut self, theme: Theme) {
        self.dispatch(&Command::ChangeTheme(theme.clone()));
        self.store.apply_update(StateUpdate::ChangeTheme(theme));
    }

    /// # Errors
    ///
    /// Rejects empty families and characters outside a CSS family list.
    pub fn change_font_family(&mut self, font_family: &str) -> Result<(), BridgeError> {
        let family = FontFamily::new(font_family)?;
        let stored = family.as_str().to_string();
        self.dispatch(&Command::ChangeFontFamily(family));
        self.store
            .apply_update(StateUpdate::ChangeFontFamily(stored));
        Ok(())
    }

    pub fn change_font_size(&mut self, size: FontSize) {
        self.dispatch(&Command::ChangeFontSize(size));
        self.store.apply_update(StateUpdate::ChangeFontSize(size));
    }

    pub fn go_to_location(&mut self, cfi: Cfi) {
        self.dispatch(&Command::GoToLocation(cfi));
    }

    /// Displays entry `location` of the location table.
    ///
    /// # Errors
    ///
    /// The location table must have been generated (`onLocationsReady`) or
    /// supplied via [`ReaderBridge::with_locations`]/[`ReaderBridge::set_locations`]
    /// beforehand; otherwise [`BridgeError::LocationTableMissing`] is returned.
    /// Offsets past the end of the table yield
    /// [`BridgeError::LocationOutOfRange`].
    pub fn go_to_location_with_number(&mut self, location: u32) -> Result<(), BridgeError> {
        let total = self.store.state().locations.len();
        if total == 0 {
            return Err(BridgeError::LocationTableMissing);
        }
        if location as usize >= total {
            return Err(BridgeError::LocationOutOfRange {
                requested: location,
                total,
            });
        }
        self.dispatch(&Command::GoToLocationNumber(location));
        Ok(())
    }

    pub fn go_previous(&mut self) {
        self.dispatch(&Command::GoPrevious);
    }

    pub fn go_next(&mut self) {
        self.dispatch(&Command::GoNext);
    }

    /// Searches every section; results arrive later as `onSearch`.
    ///
    /// # Errors
    ///
    /// Rejects queries that are empty after trimming.
    pub fn search(&mut self, query: &str) -> Result<(), BridgeError> {
        let query = SearchQuery::new(query)?;
        self.dispatch_request(RequestKind::Search, |request| Command::Search {
            query,
            request,
        })
    }

    /// Extracts the text of the current view; it arrives later as `onHtml`.
    pub fn calculate_html(&mut self) {
        if let Err(err) = self.dispatch_request(RequestKind::Html, |request| {
            Command::CalculateHtml { request }
        }) {
            warn!(command = "calculate_html", error = %err, "failed to encode command");
        }
    }

    /// Adds an annotation. When `handler` is given, clicks on the annotation
    /// are routed back to it and the minted token is returned.
    ///
    /// # Errors
    ///
    /// Fails only if the annotation data cannot be encoded.
    pub fn add_mark(
        &mut self,
        mark: MarkRequest,
        handler: Option<MarkHandler>,
    ) -> Result<Option<MarkToken>, BridgeError> {
        if self.remote.is_none() {
            debug!(command = "add_mark", "no rendering surface; dropping command");
            return Ok(None);
        }

        let styles = mark
            .styles()
            .cloned()
            .unwrap_or_else(|| self.default_mark_styles.clone());
        let token = handler.map(|handler| {
            self.marks
                .register(mark.kind(), mark.cfi_range().clone(), handler)
        });

        let command = Command::AddMark {
            mark,
            styles,
            token,
        };
        match self.try_dispatch(&command) {
            Ok(true) => Ok(token),
            Ok(false) => {
                if let Some(token) = token {
                    self.marks.unregister(token);
                }
                Ok(None)
            }
            Err(err) => {
                if let Some(token) = token {
                    self.marks.unregister(token);
                }
                Err(err)
            }
        }
    }

    pub fn remove_mark(&mut self, cfi_range: Cfi, kind: MarkKind) {
        let forgotten = self.marks.forget_range(&cfi_range, kind);
        if forgotten > 0 {
            debug!(forgotten, "released annotation handlers");
        }
        self.dispatch(&Command::RemoveMark { cfi_range, kind });
    }

    /// Decodes and applies one message posted by the rendering surface.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Protocol`] for undecodable messages and
    /// [`BridgeError::Display`] when the renderer reports that the book could
    /// not be displayed. Unknown event tags are not errors.
    pub fn handle_message(&mut self, raw: &str) -> Result<(), BridgeError> {
        let event = decode_message(raw).map_err(|err| {
            warn!(error = %err, "dropping undecodable renderer message");
            BridgeError::Protocol(err)
        })?;
        self.handle_event(event)
    }

    pub fn handle_event(&mut self, event: ReaderEvent) -> Result<(), BridgeError> {
        match &event {
            ReaderEvent::Started => {
                info!("rendering surface started");
                self.release_page_bindings();
            }
            ReaderEvent::Ready {
                total_locations, ..
            } => info!(total_locations, "book ready"),
            ReaderEvent::Search {
                request_id, error, ..
            } => {
                if let Admission::Stale { live } =
                    self.pending.admit(RequestKind::Search, *request_id)
                {
                    debug!(answer = ?request_id, live = ?live, "ignoring stale search results");
                    return Ok(());
                }
                if let Some(error) = error {
                    warn!(answer = ?request_id, %error, "renderer failed to search");
                }
            }
            ReaderEvent::Html { request_id, .. } => {
                if let Admission::Stale { live } = self.pending.admit(RequestKind::Html, *request_id)
                {
                    debug!(answer = ?request_id, live = ?live, "ignoring stale extracted text");
                    return Ok(());
                }
            }
            ReaderEvent::MarkClicked { token, cfi_range } => {
                if !self.marks.activate(*token, cfi_range) {
                    debug!(%token, "annotation click for unknown token");
                }
            }
            ReaderEvent::Unknown => debug!("ignoring unknown renderer event"),
            _ => {}
        }

        self.store.apply_event(&event);

        let failure = match &event {
            ReaderEvent::DisplayError { reason } => Some(reason.clone()),
            _ => None,
        };
        let _ = self.events.send(event);

        match failure {
            Some(reason) => Err(BridgeError::Display { reason }),
            None => Ok(()),
        }
    }

    pub fn in_flight(&self, kind: RequestKind) -> Option<RequestId> {
        self.pending.in_flight(kind)
    }

    /// Number of annotation handlers still waiting for clicks.
    pub fn mark_handlers(&self) -> usize {
        self.marks.len()
    }

    /// Requests and annotations belong to one loaded page; a reload or an
    /// unmount leaves nothing that could answer them.
    fn release_page_bindings(&mut self) {
        self.pending.clear();
        let released = self.marks.clear();
        if released > 0 {
            debug!(released, "released annotation handlers");
        }
    }

    fn dispatch_request(
        &mut self,
        kind: RequestKind,
        build: impl FnOnce(RequestId) -> Command,
    ) -> Result<(), BridgeError> {
        if self.remote.is_none() {
            debug!(?kind, "no rendering surface; dropping request");
            return Ok(());
        }

        let request = self.pending.issue(kind);
        match self.try_dispatch(&build(request)) {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.pending.forget(kind, request);
                Ok(())
            }
            Err(err) => {
                self.pending.forget(kind, request);
                Err(err)
            }
        }
    }

    /// Fire-and-forget dispatch for commands without fallible parameters.
    fn dispatch(&self, command: &Command) {
        if let Err(err) = self.try_dispatch(command) {
            warn!(command = command.name(), error = %err, "failed to encode command");
        }
    }

    /// Returns whether the script was handed to the remote.
    fn try_dispatch(&self, command: &Command) -> Result<bool, BridgeError> {
        let Some(remote) = &self.remote else {
            debug!(command = command.name(), "no rendering surface; dropping command");
            return Ok(false);
        };

        let script = encoder::encode(command)?;
        match remote.inject(&script) {
            Ok(()) => {
                debug!(command = command.name(), "dispatched script");
                Ok(true)
            }
            Err(err) => {
                warn!(command = command.name(), error = %err, "dropping script");
                Ok(false)
            }
        }
    }
}

impl Default for ReaderBridge {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
