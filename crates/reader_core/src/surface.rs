//! The page loaded into the rendering surface.
//!
//! The page expects a handful of globals (book source, theme, precomputed
//! location table, selection flag). They are injected as escaped literals in
//! front of the renderer script.

use shared::domain::{Cfi, Theme};

use crate::{
    config::Settings,
    error::EncodeError,
    literal::{js_literal, Script},
};

const PAGE_TEMPLATE: &str = include_str!("../assets/surface.html");
const BOOTSTRAP_PLACEHOLDER: &str = "/*__READER_BOOTSTRAP__*/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookSource {
    Epub(String),
    Opf(String),
    Binary(String),
    /// Inline base64-encoded EPUB archive.
    Base64(String),
}

impl BookSource {
    pub fn from_kind(kind: &str, payload: impl Into<String>) -> Option<Self> {
        let payload = payload.into();
        match kind {
            "epub" => Some(BookSource::Epub(payload)),
            "opf" => Some(BookSource::Opf(payload)),
            "binary" => Some(BookSource::Binary(payload)),
            "base64" => Some(BookSource::Base64(payload)),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookSource::Epub(_) => "epub",
            BookSource::Opf(_) => "opf",
            BookSource::Binary(_) => "binary",
            BookSource::Base64(_) => "base64",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            BookSource::Epub(v) | BookSource::Opf(v) | BookSource::Binary(v) | BookSource::Base64(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub source: BookSource,
    pub theme: Theme,
    /// A previously saved location table; when absent the renderer generates
    /// one and reports it with `onLocationsReady`.
    pub locations: Option<Vec<Cfi>>,
    /// Keeps the reader's text selection visible. `onSelected` is posted
    /// either way.
    pub enable_selection: bool,
    pub locations_breakpoint: u32,
}

impl SurfaceOptions {
    pub fn new(source: BookSource, settings: &Settings) -> Self {
        Self {
            source,
            theme: Theme::default(),
            locations: None,
            enable_selection: settings.enable_selection,
            locations_breakpoint: settings.locations_breakpoint,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_locations(mut self, locations: Vec<Cfi>) -> Self {
        self.locations = Some(locations);
        self
    }
}

pub fn bootstrap_script(options: &SurfaceOptions) -> Result<Script, EncodeError> {
    // The renderer loads saved tables from the same JSON string it produces.
    let locations = match &options.locations {
        Some(table) => js_literal(&serde_json::to_string(table)?)?,
        None => "null".to_string(),
    };
    let body = format!(
        "window.type = {}; window.book = {}; window.theme = {}; window.locations = {locations}; \
         window.enable_selection = {}; window.locations_breakpoint = {};",
        js_literal(options.source.kind())?,
        js_literal(options.source.payload())?,
        js_literal(&options.theme)?,
        options.enable_selection,
        options.locations_breakpoint,
    );
    Ok(Script::new(body))
}

pub fn render_page(options: &SurfaceOptions) -> Result<String, EncodeError> {
    let bootstrap = bootstrap_script(options)?;
    Ok(PAGE_TEMPLATE.replacen(BOOTSTRAP_PLACEHOLDER, bootstrap.as_str(), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(source: BookSource) -> SurfaceOptions {
        SurfaceOptions::new(source, &Settings::default())
    }

    #[test]
    fn bootstrap_declares_every_global() {
        let script = bootstrap_script(&options(BookSource::Epub(
            "https://example.org/moby.epub".into(),
        )))
        .expect("bootstrap");
        let body = script.as_str();
        assert!(body.contains(r#"window.type = "epub";"#));
        assert!(body.contains(r#"window.book = "https://example.org/moby.epub";"#));
        assert!(body.contains("window.locations = null;"));
        assert!(body.contains("window.enable_selection = false;"));
        assert!(body.contains("window.locations_breakpoint = 950;"));
    }

    #[test]
    fn saved_table_is_passed_as_serialized_string() {
        let opts = options(BookSource::Base64("UEsDBA==".into()))
            .with_locations(vec![Cfi::from("a"), Cfi::from("b")]);
        let body = bootstrap_script(&opts).expect("bootstrap").into_string();
        assert!(body.contains(r#"window.locations = "[\"a\",\"b\"]";"#));
        assert!(body.contains(r#"window.type = "base64";"#));
    }

    #[test]
    fn hostile_source_cannot_close_the_script_element() {
        let page = render_page(&options(BookSource::Epub(
            "</script><script>alert(1)</script>".into(),
        )))
        .expect("page");
        assert!(!page.contains("</script><script>alert(1)"));
        assert!(!page.contains(BOOTSTRAP_PLACEHOLDER));
        assert!(page.contains("postReaderMessage"));
    }

    #[test]
    fn selections_are_reported_even_when_not_kept() {
        let page = render_page(&options(BookSource::Epub("book.epub".into()))).expect("page");
        let start = page.find("rendition.on('selected'").expect("selected handler");
        let end = start + page[start..].find("rendition.on('markClicked'").expect("next handler");
        let handler = &page[start..end];

        assert!(handler.contains("type: 'onSelected'"));
        assert!(handler.contains("removeAllRanges()"));
        assert!(!handler.contains("return;"));
    }

    #[test]
    fn source_kinds_round_trip() {
        for kind in ["epub", "opf", "binary", "base64"] {
            let source = BookSource::from_kind(kind, "x").expect("known kind");
            assert_eq!(source.kind(), kind);
            assert_eq!(source.payload(), "x");
        }
        assert_eq!(BookSource::from_kind("pdf", "x"), None);
    }
}
