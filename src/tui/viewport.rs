//! Mapping between canvas coordinates and terminal cells.
//!
//! `zoom` is canvas units per terminal column. A row covers twice as many
//! canvas units as a column so cards keep roughly their on-canvas proportions.

use ratatui::layout::Rect;

use crate::models::Position;
use crate::placement::{CARD_HEIGHT, CARD_WIDTH};

/// Zoom steps, closest first
pub const ZOOM_LEVELS: [f64; 8] = [2.5, 4.0, 6.0, 8.0, 10.0, 14.0, 20.0, 30.0];

const ROW_ASPECT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas point shown in the middle of the area
    pub center: Position,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(center: Position, zoom: f64) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom.clamp(ZOOM_LEVELS[0], ZOOM_LEVELS[ZOOM_LEVELS.len() - 1])
        } else {
            ZOOM_LEVELS[4]
        };
        Self { center, zoom }
    }

    fn row_units(&self) -> f64 {
        self.zoom * ROW_ASPECT
    }

    /// Screen offset of a canvas point relative to the area's top-left, in cells
    pub fn to_screen(&self, point: Position, area: Rect) -> (f64, f64) {
        let col = (point.x - self.center.x) / self.zoom + area.width as f64 / 2.0;
        let row = (point.y - self.center.y) / self.row_units() + area.height as f64 / 2.0;
        (col, row)
    }

    /// Canvas point under a cell offset
    pub fn to_canvas(&self, col: f64, row: f64, area: Rect) -> Position {
        Position::new(
            self.center.x + (col - area.width as f64 / 2.0) * self.zoom,
            self.center.y + (row - area.height as f64 / 2.0) * self.row_units(),
        )
    }

    /// Cells covered by a card whose top-left corner is `position`, clipped to `area`.
    /// `None` when the card is entirely outside.
    pub fn card_rect(&self, position: Position, area: Rect) -> Option<Rect> {
        let (col, row) = self.to_screen(position, area);
        let left = area.x as f64 + col.round();
        let top = area.y as f64 + row.round();
        let width = (CARD_WIDTH / self.zoom).round().max(1.0);
        let height = (CARD_HEIGHT / self.row_units()).round().max(1.0);

        let x0 = left.max(area.x as f64);
        let y0 = top.max(area.y as f64);
        let x1 = (left + width).min(area.right() as f64);
        let y1 = (top + height).min(area.bottom() as f64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
    }

    /// Whether the whole card fits on screen
    pub fn shows_card(&self, position: Position, area: Rect) -> bool {
        let (col, row) = self.to_screen(position, area);
        col >= 0.0
            && row >= 0.0
            && col + CARD_WIDTH / self.zoom <= area.width as f64
            && row + CARD_HEIGHT / self.row_units() <= area.height as f64
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center = self.center.offset(dx, dy);
    }

    /// Center on a card's middle
    pub fn center_on_card(&mut self, position: Position) {
        self.center = position.offset(CARD_WIDTH / 2.0, CARD_HEIGHT / 2.0);
    }

    /// Step to the next closer zoom level; false when already closest
    pub fn zoom_in(&mut self) -> bool {
        match ZOOM_LEVELS.iter().rev().find(|level| **level < self.zoom) {
            Some(level) => {
                self.zoom = *level;
                true
            }
            None => false,
        }
    }

    /// Step to the next farther zoom level; false when already farthest
    pub fn zoom_out(&mut self) -> bool {
        match ZOOM_LEVELS.iter().find(|level| **level > self.zoom) {
            Some(level) => {
                self.zoom = *level;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    #[test]
    fn center_maps_to_middle_of_area() {
        let viewport = Viewport::new(Position::new(2500.0, 2500.0), 10.0);
        assert_eq!(viewport.to_screen(Position::new(2500.0, 2500.0), area()), (50.0, 20.0));
        assert_eq!(viewport.to_screen(Position::new(2600.0, 2700.0), area()), (60.0, 30.0));
        assert_eq!(viewport.to_canvas(60.0, 30.0, area()), Position::new(2600.0, 2700.0));
    }

    #[test]
    fn card_rect_scales_with_zoom() {
        let viewport = Viewport::new(Position::new(2500.0, 2500.0), 10.0);
        let rect = viewport.card_rect(Position::new(2500.0, 2500.0), area()).unwrap();
        assert_eq!(rect, Rect::new(50, 20, 30, 8));

        let close = Viewport::new(Position::new(2500.0, 2500.0), 5.0);
        let rect = close.card_rect(Position::new(2500.0, 2500.0), area()).unwrap();
        // 60 columns wide, clipped at the right edge
        assert_eq!((rect.width, rect.height), (50, 16));
    }

    #[test]
    fn card_rect_is_clipped_or_hidden() {
        let viewport = Viewport::new(Position::new(2500.0, 2500.0), 10.0);
        // 20 columns left of the area edge, 10 still visible
        let clipped = viewport.card_rect(Position::new(1800.0, 2500.0), area()).unwrap();
        assert_eq!(clipped, Rect::new(0, 20, 10, 8));

        assert_eq!(viewport.card_rect(Position::new(0.0, 0.0), area()), None);
        assert!(!viewport.shows_card(Position::new(1800.0, 2500.0), area()));
        assert!(viewport.shows_card(Position::new(2500.0, 2500.0), area()));
    }

    #[test]
    fn card_rect_respects_area_offset() {
        let viewport = Viewport::new(Position::new(0.0, 0.0), 10.0);
        let inner = Rect::new(5, 3, 100, 40);
        let rect = viewport.card_rect(Position::new(0.0, 0.0), inner).unwrap();
        assert_eq!((rect.x, rect.y), (55, 23));
    }

    #[test]
    fn zoom_steps_through_levels_and_stops_at_ends() {
        let mut viewport = Viewport::new(Position::default(), 10.0);
        assert!(viewport.zoom_in());
        assert_eq!(viewport.zoom, 8.0);
        assert!(viewport.zoom_out());
        assert!(viewport.zoom_out());
        assert_eq!(viewport.zoom, 14.0);

        let mut far = Viewport::new(Position::default(), 1000.0);
        assert_eq!(far.zoom, 30.0);
        assert!(!far.zoom_out());

        let mut near = Viewport::new(Position::default(), 2.5);
        assert!(!near.zoom_in());
    }

    #[test]
    fn invalid_zoom_falls_back_to_default_level() {
        assert_eq!(Viewport::new(Position::default(), 0.0).zoom, 10.0);
        assert_eq!(Viewport::new(Position::default(), f64::NAN).zoom, 10.0);
    }

    #[test]
    fn centering_on_card_uses_its_middle() {
        let mut viewport = Viewport::new(Position::default(), 10.0);
        viewport.center_on_card(Position::new(100.0, 200.0));
        assert_eq!(viewport.center, Position::new(250.0, 280.0));
        viewport.pan(-50.0, 20.0);
        assert_eq!(viewport.center, Position::new(200.0, 300.0));
    }
}
