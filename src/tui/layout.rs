use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub canvas_area: Rect,
    pub panel_area: Rect, // Zero width unless a side panel is open
    pub filters_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions (inside the outer border).
    /// Width fits a side panel (30) next to a usable canvas (30).
    /// Height: canvas (8) + filters (3) + status (1) + buffer.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 14;

    const PANEL_PERCENT: u16 = 40;
    const PANEL_MIN_WIDTH: u16 = 30;

    pub fn calculate(size: Rect, panel_open: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Canvas (+ panel)
                Constraint::Length(3), // Filters
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let panel_width = if panel_open {
            ((inner_area.width * Self::PANEL_PERCENT) / 100)
                .max(Self::PANEL_MIN_WIDTH)
                .min(inner_area.width.saturating_sub(Self::PANEL_MIN_WIDTH))
        } else {
            0
        };

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(panel_width)])
            .split(vertical[0]);

        Self {
            inner_area,
            canvas_area: horizontal[0],
            panel_area: horizontal[1],
            filters_area: vertical[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_panel_leaves_canvas_full_width() {
        let layout = Layout::calculate(Rect::new(0, 0, 120, 40), false);
        assert_eq!(layout.canvas_area.width, 118);
        assert_eq!(layout.panel_area.width, 0);
        assert_eq!(layout.filters_area.height, 3);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.canvas_area.height, 38 - 4);
    }

    #[test]
    fn open_panel_takes_a_share_of_the_width() {
        let layout = Layout::calculate(Rect::new(0, 0, 102, 40), true);
        assert_eq!(layout.panel_area.width, 40);
        assert_eq!(layout.canvas_area.width, 60);

        let narrow = Layout::calculate(Rect::new(0, 0, 62, 20), true);
        assert_eq!(narrow.panel_area.width, 30);
        assert_eq!(narrow.canvas_area.width, 30);
    }
}
