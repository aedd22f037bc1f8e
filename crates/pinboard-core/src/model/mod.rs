//! Domain types shared by the codec, session, and board.

pub mod event;
pub mod point;

pub use event::{Color, Event, UnknownColor, generate_event_id};
pub use point::Point;
