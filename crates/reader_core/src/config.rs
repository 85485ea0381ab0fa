use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::{FontSize, StyleRules};
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "reader.toml";
const ENV_PREFIX: &str = "READER__";
/// Upper bound for the script queue and the event buffer; both are allocated
/// up front.
pub const MAX_CAPACITY: usize = 65_536;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub font_family: String,
    pub font_size: FontSize,
    /// Characters per generated location when the renderer builds its table.
    pub locations_breakpoint: u32,
    pub enable_selection: bool,
    pub script_queue_capacity: usize,
    pub event_buffer: usize,
    pub mark_fill: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".into(),
            font_size: FontSize::default(),
            locations_breakpoint: 950,
            enable_selection: false,
            script_queue_capacity: 64,
            event_buffer: 256,
            mark_fill: "yellow".into(),
        }
    }
}

impl Settings {
    pub fn default_mark_styles(&self) -> StyleRules {
        StyleRules::from([("fill".to_string(), self.mark_fill.clone())])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    font_family: Option<String>,
    font_size: Option<String>,
    locations_breakpoint: Option<u32>,
    enable_selection: Option<bool>,
    script_queue_capacity: Option<usize>,
    event_buffer: Option<usize>,
    mark_fill: Option<String>,
}

/// Loads settings from defaults, then `path` (or `reader.toml` in the working
/// directory), then `READER__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring unreadable settings file"),
        }
    }

    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.font_family {
        settings.font_family = v;
    }
    if let Some(v) = file_cfg.font_size {
        set_font_size(settings, &v);
    }
    if let Some(v) = file_cfg.locations_breakpoint {
        set_breakpoint(settings, v);
    }
    if let Some(v) = file_cfg.enable_selection {
        settings.enable_selection = v;
    }
    if let Some(v) = file_cfg.script_queue_capacity {
        set_capacity(&mut settings.script_queue_capacity, "script_queue_capacity", v);
    }
    if let Some(v) = file_cfg.event_buffer {
        set_capacity(&mut settings.event_buffer, "event_buffer", v);
    }
    if let Some(v) = file_cfg.mark_fill {
        settings.mark_fill = v;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("FONT_FAMILY") {
        settings.font_family = v;
    }
    if let Some(v) = var("FONT_SIZE") {
        set_font_size(settings, &v);
    }
    if let Some(v) = var("LOCATIONS_BREAKPOINT") {
        match v.parse::<u32>() {
            Ok(parsed) => set_breakpoint(settings, parsed),
            Err(_) => warn!(value = %v, "ignoring invalid READER__LOCATIONS_BREAKPOINT"),
        }
    }
    if let Some(v) = var("ENABLE_SELECTION") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.enable_selection = true,
            "0" | "false" | "no" => settings.enable_selection = false,
            _ => warn!(value = %v, "ignoring invalid READER__ENABLE_SELECTION"),
        }
    }
    if let Some(v) = var("SCRIPT_QUEUE_CAPACITY") {
        match v.trim().parse::<usize>() {
            Ok(parsed) => set_capacity(
                &mut settings.script_queue_capacity,
                "script_queue_capacity",
                parsed,
            ),
            Err(_) => warn!(value = %v, "ignoring invalid READER__SCRIPT_QUEUE_CAPACITY"),
        }
    }
    if let Some(v) = var("EVENT_BUFFER") {
        match v.trim().parse::<usize>() {
            Ok(parsed) => set_capacity(&mut settings.event_buffer, "event_buffer", parsed),
            Err(_) => warn!(value = %v, "ignoring invalid READER__EVENT_BUFFER"),
        }
    }
    if let Some(v) = var("MARK_FILL") {
        settings.mark_fill = v;
    }
}

fn set_font_size(settings: &mut Settings, token: &str) {
    match token.parse::<FontSize>() {
        Ok(size) => settings.font_size = size,
        Err(err) => warn!(error = %err, "keeping default font size"),
    }
}

fn set_capacity(slot: &mut usize, name: &str, value: usize) {
    if !(1..=MAX_CAPACITY).contains(&value) {
        warn!(setting = name, value, max = MAX_CAPACITY, "capacity out of range; keeping {}", *slot);
        return;
    }
    *slot = value;
}

fn set_breakpoint(settings: &mut Settings, value: u32) {
    if value == 0 {
        warn!("locations breakpoint must be positive; keeping {}", settings.locations_breakpoint);
        return;
    }
    settings.locations_breakpoint = value;
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
