//! Points placed on the map, kept in step with a renderer.

use tracing::trace;

use crate::model::Point;

/// Draws points somewhere (a map widget, a terminal, a test recorder).
pub trait MapRenderer {
    /// Token for retracting a rendering later.
    type Handle;

    fn render_point(&mut self, point: &Point, index: usize) -> Self::Handle;

    fn remove_rendering(&mut self, handle: Self::Handle);
}

/// Ordered point list whose renderings always match its contents.
pub struct Board<R: MapRenderer> {
    renderer: R,
    entries: Vec<(Point, R::Handle)>,
}

impl<R: MapRenderer> Board<R> {
    #[must_use]
    pub const fn new(renderer: R) -> Self {
        Self {
            renderer,
            entries: Vec::new(),
        }
    }

    /// Append and render a point, returning its index.
    pub fn add(&mut self, point: Point) -> usize {
        let index = self.entries.len();
        let handle = self.renderer.render_point(&point, index);
        trace!(index, title = %point.title, "point rendered");
        self.entries.push((point, handle));
        index
    }

    /// Replace the point at `index`. The old rendering is removed before
    /// the new one is drawn. Returns the previous point, or `None` when
    /// `index` is out of range.
    pub fn edit(&mut self, index: usize, point: Point) -> Option<Point> {
        if index >= self.entries.len() {
            return None;
        }
        let (old, handle) = self.entries.remove(index);
        self.renderer.remove_rendering(handle);
        let handle = self.renderer.render_point(&point, index);
        self.entries.insert(index, (point, handle));
        Some(old)
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.entries.iter().map(|(point, _)| point)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every point and its rendering.
    pub fn clear(&mut self) {
        for (_, handle) in self.entries.drain(..) {
            self.renderer.remove_rendering(handle);
        }
    }

    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    #[derive(Debug, Default)]
    struct Recorder {
        next: u32,
        live: Vec<u32>,
        log: Vec<String>,
    }

    impl MapRenderer for Recorder {
        type Handle = u32;

        fn render_point(&mut self, point: &Point, index: usize) -> u32 {
            self.next += 1;
            self.live.push(self.next);
            self.log.push(format!("draw {index} {}", point.title));
            self.next
        }

        fn remove_rendering(&mut self, handle: u32) {
            self.live.retain(|h| *h != handle);
            self.log.push(format!("remove {handle}"));
        }
    }

    fn point(title: &str) -> Point {
        Point {
            title: title.to_string(),
            description: String::new(),
            color: Color::Yellow,
            lat: 48.1,
            lng: 11.5,
        }
    }

    #[test]
    fn add_renders_each_point_once() {
        let mut board = Board::new(Recorder::default());
        assert_eq!(board.add(point("Bench")), 0);
        assert_eq!(board.add(point("Tree")), 1);
        assert_eq!(board.renderer().live, [1, 2]);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn edit_retracts_before_redrawing() {
        let mut board = Board::new(Recorder::default());
        board.add(point("Bench"));
        board.add(point("Tree"));

        let old = board.edit(0, point("Fountain")).expect("in range");
        assert_eq!(old.title, "Bench");
        assert_eq!(board.renderer().live, [2, 3]);
        assert_eq!(
            &board.renderer().log[2..],
            ["remove 1".to_string(), "draw 0 Fountain".to_string()]
        );

        let titles: Vec<_> = board.points().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Fountain", "Tree"]);
    }

    #[test]
    fn edit_out_of_range_draws_nothing() {
        let mut board = Board::new(Recorder::default());
        assert!(board.edit(0, point("Bench")).is_none());
        assert!(board.renderer().log.is_empty());
    }

    #[test]
    fn clear_removes_every_rendering() {
        let mut board = Board::new(Recorder::default());
        board.add(point("Bench"));
        board.add(point("Tree"));
        board.clear();
        assert!(board.is_empty());
        assert!(board.renderer().live.is_empty());
    }
}
