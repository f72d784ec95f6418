//! Placement of new cards on the canvas.
//!
//! A new card is placed by a bounded randomized search for a spot whose padded
//! rectangle overlaps no existing card. Small populations are clustered around
//! the canvas center; larger ones are spread over the whole interior. When the
//! random search runs out of attempts, a spiral scan over a coarse grid is tried,
//! and when that fails too the card lands on the canvas center.

use rand::Rng;
use std::collections::HashSet;
use std::f64::consts::PI;

use crate::models::{Position, Todo};

pub const CANVAS_WIDTH: f64 = 5000.0;
pub const CANVAS_HEIGHT: f64 = 5000.0;
pub const CARD_WIDTH: f64 = 300.0;
pub const CARD_HEIGHT: f64 = 160.0;

/// Which phase produced a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    Random,
    Grid,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Position,
    pub strategy: PlacementStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementEngine {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub card_width: f64,
    pub card_height: f64,
    /// Extra space kept between card rectangles
    pub padding: f64,
    /// Distance kept from the canvas edge, also the grid origin offset
    pub margin: f64,
    pub max_attempts: usize,
    /// Below this many cards, candidates are drawn from the center disk
    pub cluster_threshold: usize,
    pub initial_radius: f64,
    pub spiral_radius_limit: i64,
    pub spiral_steps: i64,
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            card_width: CARD_WIDTH,
            card_height: CARD_HEIGHT,
            padding: 20.0,
            margin: 100.0,
            max_attempts: 50,
            cluster_threshold: 10,
            initial_radius: f64::min(800.0, CANVAS_WIDTH / 4.0),
            spiral_radius_limit: 10,
            spiral_steps: 8,
        }
    }
}

impl PlacementEngine {
    pub fn center(&self) -> Position {
        Position::new(self.canvas_width / 2.0, self.canvas_height / 2.0)
    }

    /// Compute a position for a new card given the cards already on the canvas.
    /// Never fails; the last resort may overlap an existing card.
    pub fn place<R: Rng + ?Sized>(&self, existing: &[Todo], rng: &mut R) -> Placement {
        if let Some(position) = self.random_position(existing, rng) {
            return Placement {
                position,
                strategy: PlacementStrategy::Random,
            };
        }

        if let Some(position) = self.grid_position(existing) {
            return Placement {
                position,
                strategy: PlacementStrategy::Grid,
            };
        }

        Placement {
            position: self.fallback_position(),
            strategy: PlacementStrategy::Fallback,
        }
    }

    /// Whether a card at `a` and a card at `b` come closer than the padding allows
    pub fn overlaps(&self, a: Position, b: Position) -> bool {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        dx < self.card_width + self.padding && dy < self.card_height + self.padding
    }

    fn random_position<R: Rng + ?Sized>(&self, existing: &[Todo], rng: &mut R) -> Option<Position> {
        let center = self.center();
        let max_x = self.canvas_width - self.card_width - self.margin;
        let max_y = self.canvas_height - self.card_height - self.margin;

        for _ in 0..self.max_attempts {
            let (x, y) = if existing.len() < self.cluster_threshold {
                let angle = rng.random::<f64>() * 2.0 * PI;
                let radius = rng.random::<f64>() * self.initial_radius;
                (
                    center.x + angle.cos() * radius - self.card_width / 2.0,
                    center.y + angle.sin() * radius - self.card_height / 2.0,
                )
            } else {
                (
                    rng.random::<f64>() * (self.canvas_width - self.card_width - 2.0 * self.margin) + self.margin,
                    rng.random::<f64>() * (self.canvas_height - self.card_height - 2.0 * self.margin) + self.margin,
                )
            };

            let candidate = Position::new(x.clamp(self.margin, max_x), y.clamp(self.margin, max_y));

            if !existing.iter().any(|todo| self.overlaps(candidate, todo.position)) {
                return Some(candidate);
            }
        }

        None
    }

    fn grid_position(&self, existing: &[Todo]) -> Option<Position> {
        let cell = self.card_width + self.padding;
        let cols = (self.canvas_width / cell).floor() as i64;
        let rows = (self.canvas_height / cell).floor() as i64;
        let start_col = cols / 2 - 5;
        let start_row = rows / 2 - 5;

        let occupied: HashSet<(i64, i64)> = existing
            .iter()
            .map(|todo| {
                (
                    (todo.position.x / cell).floor() as i64,
                    (todo.position.y / cell).floor() as i64,
                )
            })
            .collect();

        for radius in 0..self.spiral_radius_limit {
            for step in 0..self.spiral_steps {
                let angle = step as f64 * 2.0 * PI / self.spiral_steps as f64;
                let col = start_col + (radius as f64 * angle.cos()).round() as i64;
                let row = start_row + (radius as f64 * angle.sin()).round() as i64;

                if col < 0 || col >= cols || row < 0 || row >= rows {
                    continue;
                }
                if !occupied.contains(&(col, row)) {
                    return Some(Position::new(
                        col as f64 * cell + self.margin,
                        row as f64 * cell + self.margin,
                    ));
                }
            }
        }

        None
    }

    fn fallback_position(&self) -> Position {
        let center = self.center();
        Position::new(center.x - self.card_width / 2.0, center.y - self.card_height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn todo_at(x: f64, y: f64) -> Todo {
        Todo {
            id: format!("{}-{}", x, y),
            title: "card".to_string(),
            priority: Priority::Medium,
            category: Category::Other,
            position: Position::new(x, y),
            created_at: Utc::now(),
        }
    }

    /// Cards on a 300x160 lattice: every point of the canvas is within overlap range of one
    fn packed_canvas() -> Vec<Todo> {
        let mut todos = Vec::new();
        let mut x = 0.0;
        while x <= CANVAS_WIDTH {
            let mut y = 0.0;
            while y <= CANVAS_HEIGHT {
                todos.push(todo_at(x, y));
                y += 160.0;
            }
            x += 300.0;
        }
        todos
    }

    #[test]
    fn first_card_lands_in_center_disk() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(7);
        let placement = engine.place(&[], &mut rng);

        assert_eq!(placement.strategy, PlacementStrategy::Random);
        let card_center = placement
            .position
            .offset(engine.card_width / 2.0, engine.card_height / 2.0);
        let center = engine.center();
        let distance = ((card_center.x - center.x).powi(2) + (card_center.y - center.y).powi(2)).sqrt();
        assert!(distance <= engine.initial_radius + 1e-9);
    }

    #[test]
    fn random_placements_do_not_overlap() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut todos: Vec<Todo> = Vec::new();

        for _ in 0..40 {
            let placement = engine.place(&todos, &mut rng);
            if placement.strategy == PlacementStrategy::Random {
                assert!(
                    todos.iter().all(|t| !engine.overlaps(placement.position, t.position)),
                    "random phase returned an overlapping position"
                );
            }
            todos.push(todo_at(placement.position.x, placement.position.y));
        }
    }

    #[test]
    fn random_placements_stay_inside_margins() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut todos: Vec<Todo> = Vec::new();

        for _ in 0..25 {
            let p = engine.place(&todos, &mut rng).position;
            assert!(p.x >= engine.margin && p.x <= CANVAS_WIDTH - CARD_WIDTH - engine.margin);
            assert!(p.y >= engine.margin && p.y <= CANVAS_HEIGHT - CARD_HEIGHT - engine.margin);
            todos.push(todo_at(p.x, p.y));
        }
    }

    #[test]
    fn spiral_scan_finds_free_grid_cell() {
        let engine = PlacementEngine::default();
        let cell = engine.card_width + engine.padding;
        // Free the spiral's starting cell (col 2, row 2) while keeping random search hopeless
        let todos: Vec<Todo> = packed_canvas()
            .into_iter()
            .filter(|t| {
                !((t.position.x / cell).floor() as i64 == 2 && (t.position.y / cell).floor() as i64 == 2)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(11);
        let placement = engine.place(&todos, &mut rng);

        assert_eq!(placement.strategy, PlacementStrategy::Grid);
        assert_eq!(placement.position, Position::new(2.0 * cell + 100.0, 2.0 * cell + 100.0));
    }

    #[test]
    fn full_canvas_falls_back_to_center() {
        let engine = PlacementEngine::default();
        let mut rng = StdRng::seed_from_u64(5);
        let placement = engine.place(&packed_canvas(), &mut rng);

        assert_eq!(placement.strategy, PlacementStrategy::Fallback);
        assert_eq!(
            placement.position,
            Position::new(CANVAS_WIDTH / 2.0 - CARD_WIDTH / 2.0, CANVAS_HEIGHT / 2.0 - CARD_HEIGHT / 2.0)
        );
    }

    #[test]
    fn overlap_uses_padded_rectangles() {
        let engine = PlacementEngine::default();
        let origin = Position::new(1000.0, 1000.0);
        assert!(engine.overlaps(origin, origin.offset(319.0, 0.0)));
        assert!(!engine.overlaps(origin, origin.offset(320.0, 0.0)));
        assert!(engine.overlaps(origin, origin.offset(0.0, 179.0)));
        assert!(!engine.overlaps(origin, origin.offset(0.0, 180.0)));
    }
}
