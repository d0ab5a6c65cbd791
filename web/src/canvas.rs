use minegrid_core::{Affine, Color, OverlaySlot, Point, Rect, Size, Surface, SymbolOverlays};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// A glyph drawn centred in its cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasSymbol {
    pub glyph: &'static str,
    pub color: Color,
}

impl CanvasSymbol {
    pub const fn new(glyph: &'static str, color: Color) -> Self {
        Self { glyph, color }
    }
}

const GLYPH_SCALE: f64 = 0.7;

/// Number colours from the classic board, then mine, flag and question mark.
pub fn classic_overlays() -> SymbolOverlays<CanvasSymbol> {
    use OverlaySlot::*;
    SymbolOverlays::new()
        .with(One, CanvasSymbol::new("1", Color::rgb(0x00, 0x00, 0xFF)))
        .with(Two, CanvasSymbol::new("2", Color::rgb(0x00, 0x80, 0x00)))
        .with(Three, CanvasSymbol::new("3", Color::rgb(0xFF, 0x00, 0x00)))
        .with(Four, CanvasSymbol::new("4", Color::rgb(0x00, 0x00, 0x80)))
        .with(Five, CanvasSymbol::new("5", Color::rgb(0x80, 0x00, 0x00)))
        .with(Six, CanvasSymbol::new("6", Color::rgb(0x00, 0x80, 0x80)))
        .with(Seven, CanvasSymbol::new("7", Color::BLACK))
        .with(Eight, CanvasSymbol::new("8", Color::rgb(0x80, 0x80, 0x80)))
        .with(Mine, CanvasSymbol::new("●", Color::BLACK))
        .with(Flagged, CanvasSymbol::new("⚑", Color::rgb(0xFF, 0x00, 0x00)))
        .with(Marked, CanvasSymbol::new("?", Color::BLACK))
}

/// Backing-store size for a canvas of `css_size` on a display with `pixel_ratio`.
pub fn backing_size(css_size: Size, pixel_ratio: f64) -> (u32, u32) {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let scaled = (css_size * ratio).round();
    (scaled.width.max(0.0) as u32, scaled.height.max(0.0) as u32)
}

/// [`Surface`] over a 2D canvas context. Coordinates are CSS pixels; the
/// device pixel ratio is folded into every transform.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
    backing: (u32, u32),
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            ctx,
            pixel_ratio: 1.0,
            backing: (canvas.width(), canvas.height()),
        })
    }

    /// Sizes the canvas backing store to match its CSS box.
    pub fn fit(&mut self, canvas: &HtmlCanvasElement, css_size: Size, pixel_ratio: f64) {
        let (width, height) = backing_size(css_size, pixel_ratio);
        if (width, height) != self.backing {
            canvas.set_width(width);
            canvas.set_height(height);
            self.backing = (width, height);
        }
        self.pixel_ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        log::debug!("canvas backing store {width}x{height} at ratio {pixel_ratio}");
    }

    pub fn clear(&mut self) {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
        let (width, height) = self.backing;
        self.ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
        self.set_transform(Affine::IDENTITY);
    }
}

impl Surface for CanvasSurface {
    type Overlay = CanvasSymbol;

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.ctx.begin_path();
        self.ctx.rect(rect.x0, rect.y0, rect.width(), rect.height());
        self.ctx.clip();
    }

    fn set_transform(&mut self, transform: Affine) {
        let [a, b, c, d, e, f] = (Affine::scale(self.pixel_ratio) * transform).as_coeffs();
        if let Err(err) = self.ctx.set_transform(a, b, c, d, e, f) {
            log::warn!("could not set canvas transform: {err:?}");
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        // a zero line width is ignored by the canvas, keeping the previous one
        if width <= 0.0 {
            return;
        }
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.stroke();
    }

    fn draw_overlay(&mut self, symbol: &CanvasSymbol, bounds: Rect) {
        let center = bounds.center();
        self.ctx
            .set_font(&format!("bold {:.1}px sans-serif", bounds.height() * GLYPH_SCALE));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&symbol.color.to_css());
        if let Err(err) = self.ctx.fill_text(symbol.glyph, center.x, center.y) {
            log::warn!("could not draw {:?}: {err:?}", symbol.glyph);
        }
    }
}
