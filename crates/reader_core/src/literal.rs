//! Centralized conversion of host values into script literals.
//!
//! Every value that ends up inside an injected script goes through
//! [`js_literal`]; call sites never splice raw strings into script text.

use std::fmt;

use serde::Serialize;

use crate::error::EncodeError;

/// A script ready to be evaluated by the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script(String);

impl Script {
    pub(crate) fn new(body: String) -> Self {
        Self(body)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes `value` as a JavaScript expression literal.
///
/// JSON is a subset of JavaScript expression syntax once U+2028/U+2029 are
/// escaped. `<` is escaped too so the literal is also safe inside an inline
/// `<script>` element.
pub fn js_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodeError> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_escaped_inside_string_literal() {
        assert_eq!(
            js_literal("it's \"here\"").expect("literal"),
            r#""it's \"here\"""#
        );
    }

    #[test]
    fn line_separators_and_script_close_are_escaped() {
        let literal = js_literal("a\u{2028}b</script>").expect("literal");
        assert_eq!(literal, r#""a\u2028b\u003c/script>""#);
    }

    #[test]
    fn structured_values_become_object_literals() {
        let literal = js_literal(&serde_json::json!({ "fill": "yellow" })).expect("literal");
        assert_eq!(literal, r#"{"fill":"yellow"}"#);
    }
}
