use kurbo::{Affine, Point, Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{CellVisualState, GridGeometry, OverlaySlot, ViewportTransform, VisibleRange};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const GRAY: Self = Self::rgb(0x88, 0x88, 0x88);
    pub const LIGHT_GRAY: Self = Self::rgb(0xCC, 0xCC, 0xCC);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_css(self) -> String {
        if self.a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                f64::from(self.a) / 255.0
            )
        }
    }
}

/// Colors used for the cell backgrounds and the separator lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStyle {
    pub cell_background: Color,
    pub revealed_background: Color,
    pub grid_lines: Color,
}

impl GridStyle {
    pub fn background_for(&self, state: CellVisualState) -> Color {
        if state.is_unrevealed() {
            self.cell_background
        } else {
            self.revealed_background
        }
    }
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            cell_background: Color::LIGHT_GRAY,
            revealed_background: Color::GRAY,
            grid_lines: Color::BLACK,
        }
    }
}

/// Optional symbol per [`OverlaySlot`]; empty slots draw nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolOverlays<O> {
    slots: [Option<O>; OverlaySlot::COUNT],
}

impl<O> SymbolOverlays<O> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    pub fn get(&self, slot: OverlaySlot) -> Option<&O> {
        self.slots[slot.index()].as_ref()
    }

    pub fn set(&mut self, slot: OverlaySlot, overlay: Option<O>) -> Option<O> {
        core::mem::replace(&mut self.slots[slot.index()], overlay)
    }

    pub fn with(mut self, slot: OverlaySlot, overlay: O) -> Self {
        self.set(slot, Some(overlay));
        self
    }
}

impl<O> Default for SymbolOverlays<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drawing primitives the grid needs from a host surface.
pub trait Surface {
    type Overlay;

    fn save(&mut self);
    fn restore(&mut self);
    fn clip_rect(&mut self, rect: Rect);
    fn set_transform(&mut self, transform: Affine);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64);
    fn draw_overlay(&mut self, overlay: &Self::Overlay, bounds: Rect);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cells: usize,
    pub lines: usize,
}

#[derive(Clone, Debug)]
pub struct GridRenderer<O> {
    style: GridStyle,
    overlays: SymbolOverlays<O>,
}

impl<O> Default for GridRenderer<O> {
    fn default() -> Self {
        Self::new(GridStyle::default(), SymbolOverlays::new())
    }
}

impl<O> GridRenderer<O> {
    pub fn new(style: GridStyle, overlays: SymbolOverlays<O>) -> Self {
        Self { style, overlays }
    }

    pub fn style(&self) -> &GridStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: GridStyle) {
        self.style = style;
    }

    pub fn overlays(&self) -> &SymbolOverlays<O> {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut SymbolOverlays<O> {
        &mut self.overlays
    }

    /// Draws the culled part of the grid.
    ///
    /// `cells` is indexed `[row, column]`; without a snapshot every cell is drawn
    /// as unchecked.
    pub fn draw<S>(
        &self,
        surface: &mut S,
        cells: Option<&Array2<CellVisualState>>,
        geometry: &GridGeometry,
        view: &ViewportTransform,
        range: &VisibleRange,
    ) -> RenderStats
    where
        S: Surface<Overlay = O>,
    {
        let mut stats = RenderStats::default();

        surface.save();
        surface.clip_rect(view.content_rect());
        surface.set_transform(view.matrix());

        for (column, row) in range.iter() {
            let state = cells
                .and_then(|cells| cells.get((row, column)).copied())
                .unwrap_or_default();
            let bounds = geometry.cell_bounds(column, row);

            surface.fill_rect(bounds, self.style.background_for(state));
            if let Some(overlay) = self.overlays.get(state.overlay_slot()) {
                surface.draw_overlay(overlay, bounds);
            }
            stats.cells += 1;
        }

        if !range.is_empty() {
            stats.lines = self.draw_grid_lines(surface, geometry, range);
        }

        surface.restore();
        log::trace!("rendered {stats:?} for {range:?}");
        stats
    }

    fn draw_grid_lines<S>(
        &self,
        surface: &mut S,
        geometry: &GridGeometry,
        range: &VisibleRange,
    ) -> usize
    where
        S: Surface<Overlay = O>,
    {
        let size = f64::from(geometry.cell_size);
        let origin = geometry.grid_rect.origin();
        let width = geometry.line_stroke_width;
        let color = self.style.grid_lines;

        let top = origin.y + range.rows.start as f64 * size;
        let bottom = origin.y + range.rows.end as f64 * size;
        let left = origin.x + range.columns.start as f64 * size;
        let right = origin.x + range.columns.end as f64 * size;

        let mut lines = 0;
        for column in range.columns.start..=range.columns.end {
            let x = origin.x + column as f64 * size;
            surface.stroke_line(Point::new(x, top), Point::new(x, bottom), color, width);
            lines += 1;
        }
        for row in range.rows.start..=range.rows.end {
            let y = origin.y + row as f64 * size;
            surface.stroke_line(Point::new(left, y), Point::new(right, y), color, width);
            lines += 1;
        }
        lines
    }
}
