//! Typed reader commands and their script encodings.
//!
//! Each [`Command`] maps to exactly one [`Script`]. Parameters are validated
//! when the command is built ([`SearchQuery`], [`FontFamily`], [`MarkRequest`],
//! [`FontSize`]) so the encoder only ever sees well-formed values.

use serde_json::Value;
use shared::domain::{Cfi, FontSize, MarkKind, MarkToken, RequestId, StyleRules, Theme};

use crate::{
    error::EncodeError,
    literal::{js_literal, Script},
};

/// Name of the function the surface page installs for posting events back
/// to the host.
pub const POST_FUNCTION: &str = "postReaderMessage";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GoToLocation(Cfi),
    /// Requires the renderer to hold a generated location table.
    GoToLocationNumber(u32),
    GoNext,
    GoPrevious,
    ChangeTheme(Theme),
    ChangeFontFamily(FontFamily),
    ChangeFontSize(FontSize),
    Search {
        query: SearchQuery,
        request: RequestId,
    },
    CalculateHtml {
        request: RequestId,
    },
    AddMark {
        mark: MarkRequest,
        styles: StyleRules,
        token: Option<MarkToken>,
    },
    RemoveMark {
        cfi_range: Cfi,
        kind: MarkKind,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GoToLocation(_) => "go_to_location",
            Command::GoToLocationNumber(_) => "go_to_location_number",
            Command::GoNext => "go_next",
            Command::GoPrevious => "go_previous",
            Command::ChangeTheme(_) => "change_theme",
            Command::ChangeFontFamily(_) => "change_font_family",
            Command::ChangeFontSize(_) => "change_font_size",
            Command::Search { .. } => "search",
            Command::CalculateHtml { .. } => "calculate_html",
            Command::AddMark { .. } => "add_mark",
            Command::RemoveMark { .. } => "remove_mark",
        }
    }
}

/// Trimmed, non-empty search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(raw: &str) -> Result<Self, EncodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EncodeError::EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A CSS font family list such as `Georgia, "Times New Roman", serif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamily(String);

impl FontFamily {
    pub fn new(raw: &str) -> Result<Self, EncodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EncodeError::EmptyFontFamily);
        }
        let allowed = |c: char| {
            c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | ',' | '"' | '\'' | '.')
        };
        if !trimmed.chars().all(allowed) {
            return Err(EncodeError::InvalidFontFamily(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters for an annotation over a marker range.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkRequest {
    kind: MarkKind,
    cfi_range: Cfi,
    data: Value,
    class_name: Option<String>,
    styles: Option<StyleRules>,
}

impl MarkRequest {
    pub fn new(kind: MarkKind, cfi_range: impl Into<Cfi>) -> Self {
        Self {
            kind,
            cfi_range: cfi_range.into(),
            data: Value::Object(Default::default()),
            class_name: None,
            styles: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_class_name(mut self, class_name: &str) -> Result<Self, EncodeError> {
        let valid = !class_name.is_empty()
            && !class_name.starts_with(|c: char| c.is_ascii_digit())
            && class_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(EncodeError::InvalidClassName(class_name.to_string()));
        }
        self.class_name = Some(class_name.to_string());
        Ok(self)
    }

    pub fn with_styles(mut self, styles: StyleRules) -> Self {
        self.styles = Some(styles);
        self
    }

    pub fn kind(&self) -> MarkKind {
        self.kind
    }

    pub fn cfi_range(&self) -> &Cfi {
        &self.cfi_range
    }

    pub fn styles(&self) -> Option<&StyleRules> {
        self.styles.as_ref()
    }
}

pub fn encode(command: &Command) -> Result<Script, EncodeError> {
    let body = match command {
        Command::GoToLocation(cfi) => {
            format!("rendition.display({}); true;", js_literal(cfi.as_str())?)
        }
        Command::GoToLocationNumber(location) => format!(
            "(function () {{ var cfi = book.locations.cfiFromLocation({location}); \
             rendition.display(cfi.toString()); }})(); true;"
        ),
        Command::GoNext => "rendition.next(); true;".to_string(),
        Command::GoPrevious => "rendition.prev(); true;".to_string(),
        Command::ChangeTheme(theme) => format!(
            "rendition.themes.register({{ theme: {} }}); \
             rendition.themes.select('theme'); \
             rendition.views().forEach(function (view) {{ if (view.pane) {{ view.pane.render(); }} }}); \
             true;",
            js_literal(theme)?
        ),
        Command::ChangeFontFamily(family) => format!(
            "rendition.themes.font({}); true;",
            js_literal(family.as_str())?
        ),
        Command::ChangeFontSize(size) => format!(
            "rendition.themes.override('line-height', '1.5', true); \
             rendition.themes.fontSize({}); true;",
            js_literal(&size.to_string())?
        ),
        Command::Search { query, request } => format!(
            "(function (query, requestId) {{\n\
             \x20 Promise.all(book.spine.spineItems.map(function (item) {{\n\
             \x20   return item.load(book.load.bind(book)).then(function () {{\n\
             \x20     var found = item.find(query);\n\
             \x20     item.unload();\n\
             \x20     return found;\n\
             \x20   }});\n\
             \x20 }})).then(function (results) {{\n\
             \x20   {POST_FUNCTION}({{ type: 'onSearch', requestId: requestId, results: [].concat.apply([], results) }});\n\
             \x20 }}).catch(function (err) {{\n\
             \x20   {POST_FUNCTION}({{ type: 'onSearch', requestId: requestId, results: [], error: String(err) }});\n\
             \x20 }});\n\
             }})({}, {}); true;",
            js_literal(query.as_str())?,
            request.0
        ),
        Command::CalculateHtml { request } => format!(
            "(function (requestId) {{\n\
             \x20 var post = function (text) {{\n\
             \x20   {POST_FUNCTION}({{ type: 'onHtml', requestId: requestId, html: text }});\n\
             \x20 }};\n\
             \x20 var current = rendition.currentLocation();\n\
             \x20 if (!current || !current.start || !current.end) {{ post(''); return; }}\n\
             \x20 var text = '';\n\
             \x20 book.getRange(makeRangeCfi(current.start.cfi, current.end.cfi)).then(function (range) {{\n\
             \x20   if (range) {{ text = range.toString(); }}\n\
             \x20 }}).finally(function () {{ post(text); }});\n\
             }})({}); true;",
            request.0
        ),
        Command::AddMark {
            mark,
            styles,
            token,
        } => {
            let cfi_range = js_literal(mark.cfi_range.as_str())?;
            let callback = match token {
                Some(token) => format!(
                    "function () {{ {POST_FUNCTION}({{ type: 'onMarkClicked', token: {}, cfiRange: {cfi_range} }}); }}",
                    js_literal(token)?
                ),
                None => "undefined".to_string(),
            };
            let class_name = match &mark.class_name {
                Some(class_name) => js_literal(class_name)?,
                None => "undefined".to_string(),
            };
            format!(
                "rendition.annotations.add({}, {cfi_range}, {}, {callback}, {class_name}, {}); true;",
                js_literal(mark.kind.as_str())?,
                js_literal(&mark.data)?,
                js_literal(styles)?
            )
        }
        Command::RemoveMark { cfi_range, kind } => format!(
            "rendition.annotations.remove({}, {}); true;",
            js_literal(cfi_range.as_str())?,
            js_literal(kind.as_str())?
        ),
    };
    Ok(Script::new(body))
}

#[cfg(test)]
#[path = "tests/encoder_tests.rs"]
mod tests;
