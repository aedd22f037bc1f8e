use serde::{Deserialize, Serialize};

use super::{Color, Event};

/// A confirmed annotation placed at coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub title: String,
    pub description: String,
    pub color: Color,
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    /// Place a submitted event at the given coordinates.
    #[must_use]
    pub fn from_event(event: &Event, lat: f64, lng: f64) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            color: event.color,
            lat,
            lng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_event_copies_display_fields() {
        let event = Event {
            title: "Bench".into(),
            description: "near the pond".into(),
            color: Color::Green,
            timestamp: "2024-05-17T09:30:00.000Z".into(),
            id: "18f85b1e0c0-00ff".into(),
        };
        let point = Point::from_event(&event, 53.5511, 9.9937);
        assert_eq!(point.title, "Bench");
        assert_eq!(point.description, "near the pond");
        assert_eq!(point.color, Color::Green);
        assert!((point.lat - 53.5511).abs() < f64::EPSILON);
        assert!((point.lng - 9.9937).abs() < f64::EPSILON);
    }
}
