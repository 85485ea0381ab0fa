use std::sync::Arc;

use serde::Serialize;
use shared::domain::{Cfi, FontSize, Location, SearchResult, Theme};

/// Complete reader snapshot.
///
/// Snapshots are never edited in place once published; every transition
/// builds a new value. Large collections sit behind `Arc` so transitions that
/// do not touch them keep sharing the same allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderState {
    pub theme: Arc<Theme>,
    pub font_family: String,
    pub font_size: FontSize,
    pub at_start: bool,
    pub at_end: bool,
    pub key: String,
    pub total_locations: u32,
    pub current_location: Option<Location>,
    /// Whole percent, `0..=100`.
    pub progress: u8,
    pub locations: Arc<[Cfi]>,
    pub is_loading: bool,
    pub is_rendering: bool,
    pub search_results: Arc<[SearchResult]>,
    pub current_html: String,
    pub is_ready: bool,
    pub display_error: Option<String>,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            theme: Arc::new(Theme::default()),
            font_family: "Helvetica".to_string(),
            font_size: FontSize::default(),
            at_start: false,
            at_end: false,
            key: String::new(),
            total_locations: 0,
            current_location: None,
            progress: 0,
            locations: Arc::from(Vec::new()),
            is_loading: true,
            is_rendering: true,
            search_results: Arc::from(Vec::new()),
            current_html: String::new(),
            is_ready: false,
            display_error: None,
        }
    }
}

/// Single-facet change to a [`ReaderState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    ChangeTheme(Theme),
    ChangeFontSize(FontSize),
    ChangeFontFamily(String),
    SetAtStart(bool),
    SetAtEnd(bool),
    SetKey(String),
    SetTotalLocations(u32),
    SetCurrentLocation(Location),
    SetProgress(u8),
    SetLocations(Arc<[Cfi]>),
    SetIsLoading(bool),
    SetIsRendering(bool),
    SetSearchResults(Arc<[SearchResult]>),
    SetCurrentHtml(String),
    SetReady(bool),
    SetDisplayError(Option<String>),
}

impl ReaderState {
    /// Returns the snapshot that results from applying `update`.
    pub fn with(&self, update: StateUpdate) -> Self {
        let mut next = self.clone();
        update.apply_to(&mut next);
        next
    }
}

impl StateUpdate {
    pub(crate) fn apply_to(self, state: &mut ReaderState) {
        match self {
            StateUpdate::ChangeTheme(theme) => state.theme = Arc::new(theme),
            StateUpdate::ChangeFontSize(size) => state.font_size = size,
            StateUpdate::ChangeFontFamily(family) => state.font_family = family,
            StateUpdate::SetAtStart(value) => state.at_start = value,
            StateUpdate::SetAtEnd(value) => state.at_end = value,
            StateUpdate::SetKey(key) => state.key = key,
            StateUpdate::SetTotalLocations(total) => state.total_locations = total,
            StateUpdate::SetCurrentLocation(location) => state.current_location = Some(location),
            StateUpdate::SetProgress(progress) => state.progress = progress.min(100),
            StateUpdate::SetLocations(locations) => state.locations = locations,
            StateUpdate::SetIsLoading(value) => state.is_loading = value,
            StateUpdate::SetIsRendering(value) => state.is_rendering = value,
            StateUpdate::SetSearchResults(results) => state.search_results = results,
            StateUpdate::SetCurrentHtml(html) => state.current_html = html,
            StateUpdate::SetReady(value) => state.is_ready = value,
            StateUpdate::SetDisplayError(reason) => state.display_error = reason,
        }
    }
}
