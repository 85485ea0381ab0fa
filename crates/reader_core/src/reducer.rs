//! Event reducer: `(snapshot, renderer event) -> snapshot`.
//!
//! The reducer is total over [`ReaderEvent`], performs no I/O and depends on
//! nothing but its two arguments. Events that leave the snapshot untouched
//! (passthrough and unknown tags) return the very same `Arc`.

use std::sync::Arc;

use shared::protocol::ReaderEvent;

use crate::state::{ReaderState, StateUpdate};

pub fn reduce(state: &Arc<ReaderState>, event: &ReaderEvent) -> Arc<ReaderState> {
    let updates = transitions(event);
    if updates.is_empty() {
        return Arc::clone(state);
    }

    let mut next = ReaderState::clone(state);
    for update in updates {
        update.apply_to(&mut next);
    }
    Arc::new(next)
}

fn transitions(event: &ReaderEvent) -> Vec<StateUpdate> {
    match event {
        ReaderEvent::Started => vec![
            StateUpdate::SetReady(true),
            StateUpdate::SetDisplayError(None),
        ],
        ReaderEvent::Ready {
            total_locations,
            current_location,
            progress,
        } => vec![
            StateUpdate::SetTotalLocations(*total_locations),
            StateUpdate::SetCurrentLocation(current_location.clone()),
            StateUpdate::SetProgress(percent_from_fraction(*progress)),
            StateUpdate::SetDisplayError(None),
        ],
        ReaderEvent::LocationsReady {
            book_key,
            locations,
        } => vec![
            StateUpdate::SetKey(book_key.clone()),
            StateUpdate::SetLocations(Arc::from(locations.as_slice())),
        ],
        ReaderEvent::LocationChange {
            total_locations,
            current_location,
            progress,
        } => vec![
            StateUpdate::SetTotalLocations(*total_locations),
            StateUpdate::SetAtStart(current_location.at_start),
            StateUpdate::SetAtEnd(current_location.at_end),
            StateUpdate::SetCurrentLocation(current_location.clone()),
            StateUpdate::SetProgress(clamp_percent(*progress)),
        ],
        ReaderEvent::Beginning => vec![StateUpdate::SetAtStart(true)],
        ReaderEvent::Finish => vec![StateUpdate::SetAtEnd(true)],
        ReaderEvent::Search { results, .. } => {
            vec![StateUpdate::SetSearchResults(Arc::from(results.as_slice()))]
        }
        ReaderEvent::Html { html, .. } => vec![StateUpdate::SetCurrentHtml(html.clone())],
        ReaderEvent::DisplayError { reason } => {
            vec![StateUpdate::SetDisplayError(Some(reason.clone()))]
        }
        ReaderEvent::NavigationLoaded { .. }
        | ReaderEvent::OrientationChange { .. }
        | ReaderEvent::Rendered { .. }
        | ReaderEvent::Layout { .. }
        | ReaderEvent::Selected { .. }
        | ReaderEvent::MarkPressed { .. }
        | ReaderEvent::Resized { .. }
        | ReaderEvent::MarkClicked { .. }
        | ReaderEvent::Unknown => Vec::new(),
    }
}

/// Converts a `0.0..=1.0` fraction to a floored whole percent.
pub fn percent_from_fraction(fraction: f64) -> u8 {
    clamp_percent(fraction * 100.0)
}

/// Floors a percent value and clamps it to `0..=100`; non-finite input is 0.
pub fn clamp_percent(percent: f64) -> u8 {
    if !percent.is_finite() {
        return 0;
    }
    percent.floor().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
