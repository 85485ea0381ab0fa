use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{Cfi, Location, MarkToken, NavItem, RequestId, SearchResult},
    error::ProtocolError,
};

/// Event posted by the rendering surface.
///
/// Messages arrive as JSON objects tagged by `type`. Tags outside this
/// vocabulary decode to [`ReaderEvent::Unknown`] so a newer renderer never
/// breaks an older host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReaderEvent {
    #[serde(rename = "onStarted")]
    Started,
    #[serde(rename = "onReady", rename_all = "camelCase")]
    Ready {
        total_locations: u32,
        current_location: Location,
        /// Fraction of the book in `0.0..=1.0`.
        #[serde(default, deserialize_with = "wire::lenient_number")]
        progress: f64,
    },
    #[serde(rename = "onLocationsReady")]
    LocationsReady {
        #[serde(rename = "epubKey", default)]
        book_key: String,
        #[serde(deserialize_with = "wire::location_table")]
        locations: Vec<Cfi>,
    },
    #[serde(rename = "onNavigationLoaded")]
    NavigationLoaded {
        #[serde(default, deserialize_with = "wire::toc")]
        toc: Vec<NavItem>,
    },
    #[serde(rename = "onLocationChange", rename_all = "camelCase")]
    LocationChange {
        total_locations: u32,
        current_location: Location,
        /// Percent in `0..=100`, already floored by the renderer.
        #[serde(default, deserialize_with = "wire::lenient_number")]
        progress: f64,
    },
    #[serde(rename = "onBeginning")]
    Beginning,
    #[serde(rename = "onFinish")]
    Finish,
    #[serde(rename = "onOrientationChange")]
    OrientationChange {
        #[serde(default, deserialize_with = "wire::lenient_string")]
        orientation: String,
    },
    #[serde(rename = "onRendered", rename_all = "camelCase")]
    Rendered {
        #[serde(default)]
        section: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_section: Option<Value>,
    },
    #[serde(rename = "onLayout")]
    Layout {
        #[serde(default)]
        layout: Value,
    },
    #[serde(rename = "onSelected", rename_all = "camelCase")]
    Selected {
        cfi_range: Cfi,
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "onMarkPressed", rename_all = "camelCase")]
    MarkPressed {
        cfi_range: Cfi,
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "onResized")]
    Resized {
        #[serde(default)]
        layout: Value,
    },
    #[serde(rename = "onSearch", rename_all = "camelCase")]
    Search {
        #[serde(default)]
        results: Vec<SearchResult>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        /// Set when the search itself failed; `results` is then empty.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "onHtml", rename_all = "camelCase")]
    Html {
        #[serde(default)]
        html: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    #[serde(rename = "onMarkClicked", rename_all = "camelCase")]
    MarkClicked { token: MarkToken, cfi_range: Cfi },
    #[serde(rename = "onDisplayError")]
    DisplayError {
        #[serde(default, deserialize_with = "wire::lenient_string")]
        reason: String,
    },
    #[serde(other)]
    Unknown,
}

impl ReaderEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            ReaderEvent::Started => "onStarted",
            ReaderEvent::Ready { .. } => "onReady",
            ReaderEvent::LocationsReady { .. } => "onLocationsReady",
            ReaderEvent::NavigationLoaded { .. } => "onNavigationLoaded",
            ReaderEvent::LocationChange { .. } => "onLocationChange",
            ReaderEvent::Beginning => "onBeginning",
            ReaderEvent::Finish => "onFinish",
            ReaderEvent::OrientationChange { .. } => "onOrientationChange",
            ReaderEvent::Rendered { .. } => "onRendered",
            ReaderEvent::Layout { .. } => "onLayout",
            ReaderEvent::Selected { .. } => "onSelected",
            ReaderEvent::MarkPressed { .. } => "onMarkPressed",
            ReaderEvent::Resized { .. } => "onResized",
            ReaderEvent::Search { .. } => "onSearch",
            ReaderEvent::Html { .. } => "onHtml",
            ReaderEvent::MarkClicked { .. } => "onMarkClicked",
            ReaderEvent::DisplayError { .. } => "onDisplayError",
            ReaderEvent::Unknown => "unknown",
        }
    }

    /// Events forwarded to subscribers without touching the reader snapshot.
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            ReaderEvent::NavigationLoaded { .. }
                | ReaderEvent::OrientationChange { .. }
                | ReaderEvent::Rendered { .. }
                | ReaderEvent::Layout { .. }
                | ReaderEvent::Selected { .. }
                | ReaderEvent::MarkPressed { .. }
                | ReaderEvent::Resized { .. }
                | ReaderEvent::MarkClicked { .. }
        )
    }
}

/// Decodes one message posted by the rendering surface.
pub fn decode_message(raw: &str) -> Result<ReaderEvent, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}

mod wire {
    use serde::{de::Error as _, Deserialize, Deserializer};
    use serde_json::Value;

    use crate::domain::{Cfi, NavItem};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTable {
        Serialized(String),
        Table(Vec<Cfi>),
    }

    /// The renderer saves its location table as a JSON string; accept that or
    /// a plain array.
    pub(super) fn location_table<'de, D>(deserializer: D) -> Result<Vec<Cfi>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTable::deserialize(deserializer)? {
            RawTable::Table(table) => Ok(table),
            RawTable::Serialized(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            RawTable::Serialized(raw) => serde_json::from_str(&raw).map_err(|err| {
                D::Error::custom(format!("invalid serialized location table: {err}"))
            }),
        }
    }

    pub(super) fn toc<'de, D>(deserializer: D) -> Result<Vec<NavItem>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawToc {
            Items(Vec<NavItem>),
            Wrapped { toc: Vec<NavItem> },
        }

        Ok(match Option::<RawToc>::deserialize(deserializer)? {
            Some(RawToc::Items(items)) | Some(RawToc::Wrapped { toc: items }) => items,
            None => Vec::new(),
        })
    }

    pub(super) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(value) => value,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub(super) fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| D::Error::custom("progress is not representable as f64")),
            Value::Null => Ok(0.0),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
