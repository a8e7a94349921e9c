//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file; every key is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! [search]
//! input_id = "searchInput"       # Element ids the search box attaches to
//! button_id = "searchBtn"
//! results_id = "searchResults"
//! container_class = "search-container"  # Clicks outside this close results
//! debounce_ms = 300              # Input inactivity before searching
//!
//! [language]
//! param = "lang"                 # Query parameter carrying the language
//! default = "English"            # "English", "Chinese" or "中文"
//! link_class = "lang-link"
//! post_class = "post-item"
//! post_attribute = "data-language"
//! stagger_ms = 50                # Per-post reveal delay
//! base_delay_ms = 50
//!
//! [animation]
//! start_delay_ms = 100           # Let language filtering settle first
//! threshold = 0.1
//! root_margin = "0px 0px -50px 0px"
//! duration_secs = 0.6
//! stagger_secs = 0.1
//!
//! [subscribe]
//! storage_key = "blogSubscribers"
//! delay_ms = 1000                # Simulated round-trip
//! close_after_ms = 2000          # Modal closes this long after success
//!
//! [fruit]
//! container_id = "fruits-container"
//! tooltip_id = "tooltip"
//! tooltip_offset_px = 5
//! sway_min_secs = 3.0
//! sway_jitter_secs = 2.0
//! sway_step_secs = 0.2
//!
//! [[articles]]
//! title = "..."
//! summary = "..."
//! date = "2025-08-18"
//! url = "posts/....html"
//! content = "keywords"
//!
//! [[fruits]]
//! id = "fruit1"
//! name = "GitHub"
//! short_name = "GitHub"
//! url = "https://github.com/..."
//! position = { x = 90, y = 5 }
//! type = 1
//! ```
//!
//! Setting `articles` or `fruits` replaces the whole stock list. Unknown keys
//! are rejected to catch typos early.

use crate::language::Language;
use crate::types::{Article, FruitLink, Position};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub search: SearchConfig,
    pub language: LanguageConfig,
    pub animation: AnimationConfig,
    pub subscribe: SubscribeConfig,
    pub fruit: FruitConfig,
    /// Search catalog, in display order.
    pub articles: Vec<Article>,
    /// Fruit tree markers.
    pub fruits: Vec<FruitLink>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            language: LanguageConfig::default(),
            animation: AnimationConfig::default(),
            subscribe: SubscribeConfig::default(),
            fruit: FruitConfig::default(),
            articles: default_articles(),
            fruits: default_fruits(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.animation.threshold) {
            return Err(ConfigError::Validation(
                "animation.threshold must be between 0 and 1".into(),
            ));
        }
        if self.language.param.trim().is_empty() {
            return Err(ConfigError::Validation(
                "language.param must not be empty".into(),
            ));
        }
        if self.subscribe.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "subscribe.storage_key must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for fruit in &self.fruits {
            if !seen.insert(fruit.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate fruit id '{}'",
                    fruit.id
                )));
            }
        }
        Ok(())
    }
}

/// Search box wiring and debounce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub input_id: String,
    pub button_id: String,
    pub results_id: String,
    /// Clicks outside any element with this class hide the results.
    pub container_class: String,
    /// Milliseconds of input inactivity before a search runs.
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            input_id: "searchInput".to_string(),
            button_id: "searchBtn".to_string(),
            results_id: "searchResults".to_string(),
            container_class: "search-container".to_string(),
            debounce_ms: 300,
        }
    }
}

/// Language filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageConfig {
    /// Query parameter carrying the active language.
    pub param: String,
    /// Language used when the address has none.
    pub default: Language,
    pub link_class: String,
    pub post_class: String,
    /// Attribute on each post holding its language.
    pub post_attribute: String,
    pub stagger_ms: u64,
    pub base_delay_ms: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            param: "lang".to_string(),
            default: Language::English,
            link_class: "lang-link".to_string(),
            post_class: "post-item".to_string(),
            post_attribute: "data-language".to_string(),
            stagger_ms: 50,
            base_delay_ms: 50,
        }
    }
}

/// Reveal-on-scroll settings for post items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Delay after DOM-ready before observing posts.
    pub start_delay_ms: u64,
    /// Visible fraction at which a post counts as intersecting.
    pub threshold: f64,
    pub root_margin: String,
    pub duration_secs: f64,
    /// Per-index transition delay.
    pub stagger_secs: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 100,
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_string(),
            duration_secs: 0.6,
            stagger_secs: 0.1,
        }
    }
}

/// Subscription form and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubscribeConfig {
    /// Storage key holding the subscriber list.
    pub storage_key: String,
    pub modal_id: String,
    pub form_id: String,
    pub input_id: String,
    pub button_id: String,
    pub message_id: String,
    /// Simulated round-trip while the button shows its loading state.
    pub delay_ms: u64,
    /// How long the success message stays before the modal closes.
    pub close_after_ms: u64,
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self {
            storage_key: "blogSubscribers".to_string(),
            modal_id: "subscribeModal".to_string(),
            form_id: "subscribeForm".to_string(),
            input_id: "subscribeEmail".to_string(),
            button_id: "subscribeBtn".to_string(),
            message_id: "subscribeMessage".to_string(),
            delay_ms: 1000,
            close_after_ms: 2000,
        }
    }
}

/// Fruit tree widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FruitConfig {
    pub container_id: String,
    pub tooltip_id: String,
    /// Gap between the pointer and the tooltip.
    pub tooltip_offset_px: f64,
    /// Shortest sway cycle.
    pub sway_min_secs: f64,
    /// Random extra added to each marker's sway cycle.
    pub sway_jitter_secs: f64,
    /// Per-index sway start delay.
    pub sway_step_secs: f64,
}

impl Default for FruitConfig {
    fn default() -> Self {
        Self {
            container_id: "fruits-container".to_string(),
            tooltip_id: "tooltip".to_string(),
            tooltip_offset_px: 5.0,
            sway_min_secs: 3.0,
            sway_jitter_secs: 2.0,
            sway_step_secs: 0.2,
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// The stock search catalog.
pub fn default_articles() -> Vec<Article> {
    vec![
        Article {
            title: "How to Set Up Notion and Blog Sync".to_string(),
            summary: "Overview This integration system allows you to write blog posts directly in Notion and automatically sync them to your website! Fully compatible with ...".to_string(),
            date: date(2025, 8, 18),
            url: "posts/how-to-set-up-notion-and-blog-sync.html".to_string(),
            content: "notion integration blog sync automatic website markdown".to_string(),
        },
        Article {
            title: "Hello to My Little World".to_string(),
            summary: "Welcome to my personal corner of the internet! This is where I'll be sharing my thoughts, discoveries, and adventures in technology, life, and everything in between.".to_string(),
            date: date(2024, 1, 18),
            url: "posts/hello-to-my-little-world.html".to_string(),
            content: "personal blog welcome introduction digital garden technology life thoughts discoveries adventures".to_string(),
        },
    ]
}

fn fruit(id: &str, name: &str, short: &str, url: &str, x: f64, y: f64, kind: i64) -> FruitLink {
    FruitLink {
        id: id.to_string(),
        name: name.to_string(),
        short_name: Some(short.to_string()),
        url: url.to_string(),
        position: Position { x, y },
        kind,
    }
}

/// The stock fruit tree markers.
pub fn default_fruits() -> Vec<FruitLink> {
    vec![
        fruit("fruit1", "GitHub", "GitHub", "https://github.com/JoyceGu", 90.0, 5.0, 1),
        fruit("fruit2", "Instagram", "Instagram", "https://www.instagram.com/joyceguuu/", 90.0, 10.0, 4),
        fruit("fruit3", "LinkedIn", "LinkedIn", "https://linkedin.com", 90.0, 15.0, 5),
        fruit(
            "fruit4",
            "Shop Sentry - Personal Gmail Agent",
            "Gmail Agent",
            "https://shopsentry.cloudautofish.com/",
            35.0,
            55.0,
            3,
        ),
    ]
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values (including arrays of tables) replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, on top of the
/// stock defaults.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Search box
# ---------------------------------------------------------------------------
[search]
input_id = "searchInput"
button_id = "searchBtn"
results_id = "searchResults"
# Clicking outside any element with this class hides the results panel.
container_class = "search-container"
# Milliseconds of typing inactivity before a search runs.
debounce_ms = 300

# ---------------------------------------------------------------------------
# Language filter
# ---------------------------------------------------------------------------
[language]
# Query parameter carrying the active language (?lang=Chinese).
param = "lang"
# "English" or "Chinese" ("中文" is accepted as an alias).
default = "English"
link_class = "lang-link"
post_class = "post-item"
post_attribute = "data-language"
# Matching posts fade in after index * stagger_ms + base_delay_ms.
stagger_ms = 50
base_delay_ms = 50

# ---------------------------------------------------------------------------
# Post reveal animation
# ---------------------------------------------------------------------------
[animation]
# Wait for language filtering before observing posts.
start_delay_ms = 100
threshold = 0.1
root_margin = "0px 0px -50px 0px"
duration_secs = 0.6
stagger_secs = 0.1

# ---------------------------------------------------------------------------
# Subscription form
# ---------------------------------------------------------------------------
[subscribe]
storage_key = "blogSubscribers"
modal_id = "subscribeModal"
form_id = "subscribeForm"
input_id = "subscribeEmail"
button_id = "subscribeBtn"
message_id = "subscribeMessage"
# Simulated round-trip while the button shows "Subscribing...".
delay_ms = 1000
# The modal closes this long after a successful subscription.
close_after_ms = 2000

# ---------------------------------------------------------------------------
# Fruit tree
# ---------------------------------------------------------------------------
[fruit]
container_id = "fruits-container"
tooltip_id = "tooltip"
tooltip_offset_px = 5.0
# Each marker sways for sway_min_secs + random(0..sway_jitter_secs) seconds,
# starting index * sway_step_secs after load.
sway_min_secs = 3.0
sway_jitter_secs = 2.0
sway_step_secs = 0.2

# ---------------------------------------------------------------------------
# Search catalog (replaces the whole list when present)
# ---------------------------------------------------------------------------
[[articles]]
title = "How to Set Up Notion and Blog Sync"
summary = "Overview This integration system allows you to write blog posts directly in Notion and automatically sync them to your website! Fully compatible with ..."
date = "2025-08-18"
url = "posts/how-to-set-up-notion-and-blog-sync.html"
content = "notion integration blog sync automatic website markdown"

[[articles]]
title = "Hello to My Little World"
summary = "Welcome to my personal corner of the internet! This is where I'll be sharing my thoughts, discoveries, and adventures in technology, life, and everything in between."
date = "2024-01-18"
url = "posts/hello-to-my-little-world.html"
content = "personal blog welcome introduction digital garden technology life thoughts discoveries adventures"

# ---------------------------------------------------------------------------
# Fruit tree markers (replaces the whole list when present)
# type: 1 red, 2 orange, 3 yellow, 4 green, 5 blue; anything else is red.
# ---------------------------------------------------------------------------
[[fruits]]
id = "fruit1"
name = "GitHub"
short_name = "GitHub"
url = "https://github.com/JoyceGu"
position = { x = 90.0, y = 5.0 }
type = 1

[[fruits]]
id = "fruit2"
name = "Instagram"
short_name = "Instagram"
url = "https://www.instagram.com/joyceguuu/"
position = { x = 90.0, y = 10.0 }
type = 4

[[fruits]]
id = "fruit3"
name = "LinkedIn"
short_name = "LinkedIn"
url = "https://linkedin.com"
position = { x = 90.0, y = 15.0 }
type = 5

[[fruits]]
id = "fruit4"
name = "Shop Sentry - Personal Gmail Agent"
short_name = "Gmail Agent"
url = "https://shopsentry.cloudautofish.com/"
position = { x = 35.0, y = 55.0 }
type = 3
"##
}
