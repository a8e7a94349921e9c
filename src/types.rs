//! Shared types loaded from `config.toml` and used by the page components.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of the search catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    pub title: String,
    pub summary: String,
    /// Publication date, written as a quoted `"YYYY-MM-DD"` string in TOML.
    pub date: NaiveDate,
    /// Link relative to the page the search box lives on.
    pub url: String,
    /// Extra keywords that are searchable but never displayed.
    #[serde(default)]
    pub content: String,
}

impl Article {
    /// Display date, e.g. `August 18, 2025`.
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }
}

/// Marker position as percentages of the fruit container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A clickable link marker on the fruit tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FruitLink {
    pub id: String,
    /// Full name, shown in the hover tooltip.
    pub name: String,
    /// Label under the marker; falls back to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub url: String,
    pub position: Position,
    /// Raw style number as configured. See [`crate::fruit::FruitStyle`].
    #[serde(rename = "type", default = "default_fruit_type")]
    pub kind: i64,
}

fn default_fruit_type() -> i64 {
    1
}

impl FruitLink {
    pub fn label(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}
