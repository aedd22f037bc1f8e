pub mod completions;
pub mod context;
pub mod init;
pub mod join_url;
pub mod pending;
pub mod place;
pub mod role;
pub mod show;
pub mod submit;
pub mod watch;

use pinboard_core::Event;
use std::io::{self, Write};

/// One line per event: position, color, title, and description.
pub(crate) fn write_event_lines(
    w: &mut dyn Write,
    events: &[Event],
    first_index: usize,
) -> io::Result<()> {
    for (offset, event) in events.iter().enumerate() {
        let index = first_index + offset;
        if event.description.is_empty() {
            writeln!(w, "  [{index}] {:<7} {}", event.color.as_str(), event.title)?;
        } else {
            writeln!(
                w,
                "  [{index}] {:<7} {}  {}",
                event.color.as_str(),
                event.title,
                event.description
            )?;
        }
    }
    Ok(())
}

/// Tab-separated rows for piping.
pub(crate) fn write_event_rows(
    w: &mut dyn Write,
    events: &[Event],
    first_index: usize,
) -> io::Result<()> {
    for (offset, event) in events.iter().enumerate() {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            first_index + offset,
            event.color,
            event.title,
            event.description,
            event.timestamp
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::Color;

    fn event(title: &str, description: &str) -> Event {
        Event {
            title: title.to_string(),
            description: description.to_string(),
            color: Color::Red,
            timestamp: "2024-05-17T09:30:00.000Z".to_string(),
            id: "x".to_string(),
        }
    }

    #[test]
    fn lines_start_at_given_index() {
        let mut buf = Vec::new();
        write_event_lines(&mut buf, &[event("Bench", ""), event("Tree", "old oak")], 3)
            .expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "  [3] red     Bench\n  [4] red     Tree  old oak\n");
    }

    #[test]
    fn rows_are_tab_separated() {
        let mut buf = Vec::new();
        write_event_rows(&mut buf, &[event("Bench", "near gate")], 0).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "0\tred\tBench\tnear gate\t2024-05-17T09:30:00.000Z\n"
        );
    }
}
