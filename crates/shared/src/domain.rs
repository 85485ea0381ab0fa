use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(RequestId);

/// Opaque renderer-defined position marker (an EPUB CFI).
///
/// Markers are only stored and handed back to the renderer; the host never
/// orders or interprets them, so no `Ord` is provided.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cfi(pub String);

impl Cfi {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cfi {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Cfi {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability token minted for an annotation with a host-side click handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkToken(pub Uuid);

impl MarkToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MarkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedPage {
    pub page: u32,
    pub total: u32,
}

/// One end of the renderer's current view.
///
/// The renderer usually reports a full object, but a bare marker string is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawLocationPoint")]
pub struct LocationPoint {
    pub cfi: Cfi,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed: Option<DisplayedPage>,
}

impl LocationPoint {
    pub fn at(cfi: impl Into<Cfi>) -> Self {
        Self {
            cfi: cfi.into(),
            href: None,
            index: None,
            location: None,
            percentage: None,
            displayed: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocationPoint {
    Marker(Cfi),
    Detailed(DetailedLocationPoint),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailedLocationPoint {
    cfi: Cfi,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    location: Option<u32>,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    displayed: Option<DisplayedPage>,
}

impl From<RawLocationPoint> for LocationPoint {
    fn from(raw: RawLocationPoint) -> Self {
        match raw {
            RawLocationPoint::Marker(cfi) => Self::at(cfi),
            RawLocationPoint::Detailed(point) => Self {
                cfi: point.cfi,
                href: point.href,
                index: point.index,
                location: point.location,
                percentage: point.percentage,
                displayed: point.displayed,
            },
        }
    }
}

/// The span of the document currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub start: LocationPoint,
    pub end: LocationPoint,
    #[serde(default)]
    pub at_start: bool,
    #[serde(default)]
    pub at_end: bool,
}

impl Location {
    pub fn between(start: impl Into<Cfi>, end: impl Into<Cfi>) -> Self {
        Self {
            start: LocationPoint::at(start),
            end: LocationPoint::at(end),
            at_start: false,
            at_end: false,
        }
    }
}

pub type StyleRules = BTreeMap<String, String>;

/// Stylesheet applied inside the rendering surface, keyed by CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub BTreeMap<String, StyleRules>);

impl Theme {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_rule(
        mut self,
        selector: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.0
            .entry(selector.into())
            .or_default()
            .insert(property.into(), value.into());
        self
    }

    pub fn rules(&self, selector: &str) -> Option<&StyleRules> {
        self.0.get(selector)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::empty()
            .with_rule("body", "background", "#fff")
            .with_rule("span", "color", "#000 !important")
            .with_rule("p", "color", "#000 !important")
            .with_rule("li", "color", "#000 !important")
            .with_rule("h1", "color", "#000 !important")
            .with_rule("a", "color", "#000 !important")
            .with_rule("a", "pointer-events", "auto")
            .with_rule("a", "cursor", "pointer")
            .with_rule("::selection", "background", "lightskyblue")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontUnit {
    Px,
    Pt,
    Em,
    Rem,
    Percent,
}

impl FontUnit {
    const ALL: [FontUnit; 5] = [
        FontUnit::Rem,
        FontUnit::Em,
        FontUnit::Px,
        FontUnit::Pt,
        FontUnit::Percent,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            FontUnit::Px => "px",
            FontUnit::Pt => "pt",
            FontUnit::Em => "em",
            FontUnit::Rem => "rem",
            FontUnit::Percent => "%",
        }
    }

    fn max_value(self) -> f32 {
        match self {
            FontUnit::Px | FontUnit::Pt => 96.0,
            FontUnit::Em | FontUnit::Rem => 8.0,
            FontUnit::Percent => 400.0,
        }
    }
}

/// A validated CSS font size token such as `12pt` or `1.25em`.
///
/// Only the units in [`FontUnit`] are accepted and the magnitude is bounded
/// per unit, so arbitrary strings never reach the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontSize {
    value: f32,
    unit: FontUnit,
}

impl FontSize {
    pub fn new(value: f32, unit: FontUnit) -> Result<Self, DomainError> {
        if !value.is_finite() || value <= 0.0 || value > unit.max_value() {
            return Err(DomainError::InvalidFontSize(format!(
                "{value}{}",
                unit.suffix()
            )));
        }
        Ok(Self { value, unit })
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn unit(&self) -> FontUnit {
        self.unit
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self {
            value: 12.0,
            unit: FontUnit::Pt,
        }
    }
}

impl FromStr for FontSize {
    type Err = DomainError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidFontSize(token.to_string());
        let trimmed = token.trim();
        let (number, unit) = FontUnit::ALL
            .iter()
            .find_map(|unit| {
                trimmed
                    .strip_suffix(unit.suffix())
                    .map(|number| (number, *unit))
            })
            .ok_or_else(invalid)?;

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(invalid());
        }
        let value = number.parse::<f32>().map_err(|_| invalid())?;
        Self::new(value, unit).map_err(|_| invalid())
    }
}

impl TryFrom<String> for FontSize {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontSize> for String {
    fn from(value: FontSize) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Highlight,
    Underline,
    Mark,
}

impl MarkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkKind::Highlight => "highlight",
            MarkKind::Underline => "underline",
            MarkKind::Mark => "mark",
        }
    }
}

impl FromStr for MarkKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "highlight" => Ok(MarkKind::Highlight),
            "underline" => Ok(MarkKind::Underline),
            "mark" => Ok(MarkKind::Mark),
            _ => Err(DomainError::UnknownMarkKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub cfi: Cfi,
    pub excerpt: String,
}

/// Table-of-contents entry as reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    #[serde(default)]
    pub id: String,
    pub href: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<NavItem>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
