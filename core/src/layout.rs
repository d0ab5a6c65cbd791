use core::ops::Range;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Stroke width used when the automatic policy has room for it.
pub const DEFAULT_GRID_LINE_STROKE_WIDTH: f64 = 3.0;

/// Automatic strokes never exceed this fraction of the smallest possible cell.
const AUTO_STROKE_CELL_DIVISOR: f64 = 16.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LineWidthPolicy {
    Automatic,
    Fixed(f64),
}

impl LineWidthPolicy {
    pub fn stroke_width(self, rows: usize, columns: usize, content: Rect) -> f64 {
        match self {
            Self::Fixed(width) => width,
            Self::Automatic if rows == 0 || columns == 0 => DEFAULT_GRID_LINE_STROKE_WIDTH,
            Self::Automatic => {
                let fit = (content.width() / columns as f64).min(content.height() / rows as f64);
                DEFAULT_GRID_LINE_STROKE_WIDTH.min(fit / AUTO_STROKE_CELL_DIVISOR)
            }
        }
    }
}

impl Default for LineWidthPolicy {
    fn default() -> Self {
        Self::Automatic
    }
}

/// Derived placement of the grid inside the content rect.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub rows: usize,
    pub columns: usize,
    pub cell_size: u32,
    pub grid_rect: Rect,
    pub line_stroke_width: f64,
}

impl GridGeometry {
    pub fn compute(rows: usize, columns: usize, content: Rect, policy: LineWidthPolicy) -> Self {
        let line_stroke_width = policy.stroke_width(rows, columns, content);

        let cell_size = if rows == 0 || columns == 0 {
            0
        } else {
            let max_cell_width = (content.width() - line_stroke_width) / columns as f64;
            let max_cell_height = (content.height() - line_stroke_width) / rows as f64;
            let fit = max_cell_width.min(max_cell_height).floor();
            if fit.is_finite() && fit > 0.0 {
                fit as u32
            } else {
                0
            }
        };

        let grid_width = f64::from(cell_size) * columns as f64;
        let grid_height = f64::from(cell_size) * rows as f64;
        let left = ((content.x0 + content.x1 - grid_width) / 2.0).floor();
        let top = ((content.y0 + content.y1 - grid_height) / 2.0).floor();

        let geometry = Self {
            rows,
            columns,
            cell_size,
            grid_rect: Rect::new(left, top, left + grid_width, top + grid_height),
            line_stroke_width,
        };
        log::debug!("grid layout: {geometry:?}");
        geometry
    }

    fn cell_extent(&self) -> f64 {
        f64::from(self.cell_size)
    }

    /// Cell `(column, row)` under a grid-space point, if any.
    pub fn cell_at(&self, point: Point) -> Option<(usize, usize)> {
        if self.cell_size == 0 {
            return None;
        }
        let grid = self.grid_rect;
        if !(point.x >= grid.x0 && point.x < grid.x1 && point.y >= grid.y0 && point.y < grid.y1) {
            return None;
        }

        let column = ((point.x - grid.x0) / self.cell_extent()).floor() as usize;
        let row = ((point.y - grid.y0) / self.cell_extent()).floor() as usize;
        (column < self.columns && row < self.rows).then_some((column, row))
    }

    pub fn cell_bounds(&self, column: usize, row: usize) -> Rect {
        let size = self.cell_extent();
        let x0 = self.grid_rect.x0 + column as f64 * size;
        let y0 = self.grid_rect.y0 + row as f64 * size;
        Rect::new(x0, y0, x0 + size, y0 + size)
    }

    pub fn cell_center(&self, column: usize, row: usize) -> Point {
        self.cell_bounds(column, row).center()
    }

    /// Index range intersecting `viewport`, padded by one cell on every side.
    pub fn visible_range(&self, viewport: Rect) -> VisibleRange {
        if self.cell_size == 0 || self.rows == 0 || self.columns == 0 {
            return VisibleRange::EMPTY;
        }
        let size = self.cell_extent();
        let grid = self.grid_rect;

        let span = |start: f64, end: f64, origin: f64, limit: usize| -> Range<usize> {
            let first = ((start - origin) / size).floor() - 1.0;
            let last = ((end - origin) / size).ceil() + 1.0;
            let first = first.clamp(0.0, limit as f64) as usize;
            let last = last.clamp(0.0, limit as f64) as usize;
            first..last.max(first)
        };

        VisibleRange {
            rows: span(viewport.y0, viewport.y1, grid.y0, self.rows),
            columns: span(viewport.x0, viewport.x1, grid.x0, self.columns),
        }
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            rows: 0,
            columns: 0,
            cell_size: 0,
            grid_rect: Rect::ZERO,
            line_stroke_width: DEFAULT_GRID_LINE_STROKE_WIDTH,
        }
    }
}

/// Rows and columns that need drawing for the current viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRange {
    pub rows: Range<usize>,
    pub columns: Range<usize>,
}

impl VisibleRange {
    pub const EMPTY: Self = Self {
        rows: 0..0,
        columns: 0..0,
    };

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    pub fn contains(&self, column: usize, row: usize) -> bool {
        self.columns.contains(&column) && self.rows.contains(&row)
    }

    /// `(column, row)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let columns = self.columns.clone();
        self.rows
            .clone()
            .flat_map(move |row| columns.clone().map(move |column| (column, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Rect {
        Rect::new(0.0, 0.0, size, size)
    }

    #[test]
    fn fixed_zero_stroke_fills_content_exactly() {
        let geometry = GridGeometry::compute(10, 10, square(300.0), LineWidthPolicy::Fixed(0.0));

        assert_eq!(geometry.cell_size, 30);
        assert_eq!(geometry.grid_rect, Rect::new(0.0, 0.0, 300.0, 300.0));
    }

    #[test]
    fn automatic_stroke_is_capped_by_cell_fraction() {
        let geometry = GridGeometry::compute(10, 10, square(300.0), LineWidthPolicy::Automatic);
        assert_eq!(geometry.line_stroke_width, 30.0 / 16.0);
        assert_eq!(geometry.cell_size, 29);

        let roomy = GridGeometry::compute(2, 2, square(300.0), LineWidthPolicy::Automatic);
        assert_eq!(roomy.line_stroke_width, DEFAULT_GRID_LINE_STROKE_WIDTH);
    }

    #[test]
    fn limiting_axis_decides_square_cells_and_grid_is_centered() {
        let content = Rect::new(10.0, 20.0, 410.0, 220.0);
        let geometry = GridGeometry::compute(4, 8, content, LineWidthPolicy::Fixed(0.0));

        assert_eq!(geometry.cell_size, 50);
        assert_eq!(geometry.grid_rect, Rect::new(10.0, 20.0, 410.0, 220.0));

        let geometry = GridGeometry::compute(5, 8, content, LineWidthPolicy::Fixed(0.0));
        assert_eq!(geometry.cell_size, 40);
        assert_eq!(geometry.grid_rect, Rect::new(50.0, 20.0, 370.0, 220.0));
    }

    #[test]
    fn empty_dimensions_yield_empty_grid() {
        let geometry = GridGeometry::compute(0, 5, square(100.0), LineWidthPolicy::Automatic);
        assert_eq!(geometry.cell_size, 0);
        assert_eq!(geometry.cell_at(Point::new(50.0, 50.0)), None);
        assert!(geometry.visible_range(square(100.0)).is_empty());
    }

    #[test]
    fn cell_at_excludes_trailing_edges_and_padding() {
        let content = Rect::new(0.0, 0.0, 300.0, 200.0);
        let geometry = GridGeometry::compute(4, 4, content, LineWidthPolicy::Fixed(0.0));

        assert_eq!(geometry.grid_rect, Rect::new(50.0, 0.0, 250.0, 200.0));
        assert_eq!(geometry.cell_at(Point::new(49.9, 10.0)), None);
        assert_eq!(geometry.cell_at(Point::new(50.0, 0.0)), Some((0, 0)));
        assert_eq!(geometry.cell_at(Point::new(249.9, 199.9)), Some((3, 3)));
        assert_eq!(geometry.cell_at(Point::new(250.0, 100.0)), None);
    }

    #[test]
    fn cell_centers_map_back_to_their_cells() {
        let content = Rect::new(7.0, 3.0, 523.0, 811.0);
        for (rows, columns) in [(1, 1), (9, 9), (16, 30), (24, 3)] {
            let geometry =
                GridGeometry::compute(rows, columns, content, LineWidthPolicy::Automatic);
            for row in 0..rows {
                for column in 0..columns {
                    let center = geometry.cell_center(column, row);
                    assert_eq!(geometry.cell_at(center), Some((column, row)));
                }
            }
        }
    }

    #[test]
    fn full_viewport_sees_every_cell() {
        let geometry = GridGeometry::compute(10, 10, square(300.0), LineWidthPolicy::Fixed(0.0));
        let range = geometry.visible_range(square(300.0));
        assert_eq!(range.rows, 0..10);
        assert_eq!(range.columns, 0..10);
        assert_eq!(range.iter().count(), 100);
    }

    #[test]
    fn culling_keeps_one_cell_margin() {
        let geometry =
            GridGeometry::compute(1000, 1000, square(10_000.0), LineWidthPolicy::Fixed(0.0));
        assert_eq!(geometry.cell_size, 10);

        let viewport = Rect::new(500.0, 2000.0, 600.0, 2100.0);
        let range = geometry.visible_range(viewport);

        assert_eq!(range.columns, 49..61);
        assert_eq!(range.rows, 199..211);
        assert!(range.cell_count() <= 12 * 12);
        assert!(range.contains(50, 200));
        assert!(!range.contains(48, 200));
    }

    #[test]
    fn iteration_is_row_major() {
        let range = VisibleRange {
            rows: 2..4,
            columns: 5..7,
        };
        let cells: Vec<_> = range.iter().collect();
        assert_eq!(cells, vec![(5, 2), (6, 2), (5, 3), (6, 3)]);
    }
}
