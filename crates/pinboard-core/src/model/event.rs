use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

use crate::error::PinboardError;

/// The fixed marker palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Black,
    #[default]
    White,
}

impl Color {
    pub const ALL: [Self; 7] = [
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Purple,
        Self::Black,
        Self::White,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Black => "black",
            Self::White => "white",
        }
    }

    /// Hex value used by map renderers.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Red => "#ff0000",
            Self::Green => "#00ff00",
            Self::Yellow => "#ffff00",
            Self::Blue => "#0000ff",
            Self::Purple => "#800080",
            Self::Black => "#000000",
            Self::White => "#ffffff",
        }
    }

    /// Parse a palette name, falling back to white for anything unknown.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a color name is not in the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColor(pub String);

impl fmt::Display for UnknownColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown color '{}' (expected one of red, green, yellow, blue, purple, black, white)",
            self.0
        )
    }
}

impl std::error::Error for UnknownColor {}

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

// Legacy documents carry arbitrary strings, nulls, or nothing at all.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(name)) => Self::parse_or_default(&name),
            _ => Self::White,
        })
    }
}

/// One submitted suggestion, as stored in the shared document.
///
/// Decoding is lenient per field: a missing or null text field reads as
/// empty and a number or boolean is kept as its text, so one odd row never
/// fails the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
}

impl Event {
    /// Build a new event stamped at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PinboardError::InvalidEvent`] if the trimmed title is empty.
    pub fn new(
        title: &str,
        description: &str,
        color: Color,
        now: DateTime<Utc>,
    ) -> Result<Self, PinboardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PinboardError::InvalidEvent("title must not be empty"));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.trim().to_string(),
            color,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            id: generate_event_id(now),
        })
    }
}

/// Best-effort unique id: creation millis in hex plus a random suffix.
///
/// Collisions are possible but improbable; nothing relies on uniqueness.
#[must_use]
pub fn generate_event_id(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::random();
    format!("{:x}-{suffix:04x}", now.timestamp_millis())
}

// Older documents carry nulls, and `Date.now()`-style numeric ids.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}
