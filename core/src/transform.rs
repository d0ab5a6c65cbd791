use kurbo::{Affine, Point, Rect, Vec2};

use crate::{GridError, Result, clamp_viewport};

fn is_usable_extent(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

/// Builds the view matrix that maps `viewport` (grid space) onto `content` (surface space).
///
/// Falls back to the identity when either rectangle has a zero or non-finite
/// extent.
pub fn matrix_from_viewport(content: Rect, viewport: Rect) -> Affine {
    let scale_x = content.width() / viewport.width();
    let scale_y = content.height() / viewport.height();

    if !is_usable_extent(scale_x) || !is_usable_extent(scale_y) {
        log::trace!("degenerate viewport {viewport:?} for content {content:?}");
        return Affine::IDENTITY;
    }

    Affine::new([
        scale_x,
        0.0,
        0.0,
        scale_y,
        content.x0 - scale_x * viewport.x0,
        content.y0 - scale_y * viewport.y0,
    ])
}

/// Recovers the visible region of grid space by mapping the content corners
/// back through `matrix`.
pub fn viewport_from_matrix(content: Rect, matrix: Affine) -> Option<Rect> {
    let inverse = invert(matrix).ok()?;
    let top_left = inverse * Point::new(content.x0, content.y0);
    let bottom_right = inverse * Point::new(content.x1, content.y1);
    Some(Rect::from_points(top_left, bottom_right))
}

fn invert(matrix: Affine) -> Result<Affine> {
    let det = matrix.determinant();
    if !is_usable_extent(det) {
        return Err(GridError::DegenerateTransform);
    }
    Ok(matrix.inverse())
}

/// Owner of the content rect, the viewport rect and the matrix between them.
///
/// The viewport always stays within the content rect; every mutation goes
/// through [`clamp_viewport`] before the matrix is rebuilt.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewportTransform {
    content: Rect,
    viewport: Rect,
    matrix: Affine,
}

impl ViewportTransform {
    pub fn new(content: Rect) -> Self {
        let mut transform = Self {
            content: Rect::ZERO,
            viewport: Rect::ZERO,
            matrix: Affine::IDENTITY,
        };
        transform.set_content_rect(content);
        transform
    }

    pub fn content_rect(&self) -> Rect {
        self.content
    }

    pub fn viewport_rect(&self) -> Rect {
        self.viewport
    }

    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Horizontal magnification; 1.0 when fully zoomed out.
    pub fn zoom(&self) -> f64 {
        if self.is_degenerate() {
            1.0
        } else {
            self.content.width() / self.viewport.width()
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !is_usable_extent(self.content.width())
            || !is_usable_extent(self.content.height())
            || !is_usable_extent(self.viewport.width())
            || !is_usable_extent(self.viewport.height())
    }

    /// Replaces the content rect and zooms all the way out.
    pub fn set_content_rect(&mut self, content: Rect) {
        self.content = content.abs();
        self.viewport = self.content;
        self.matrix = matrix_from_viewport(self.content, self.viewport);
        if self.is_degenerate() {
            log::debug!("content rect {content:?} is degenerate, gestures disabled");
        }
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.viewport != self.content;
        self.viewport = self.content;
        self.matrix = matrix_from_viewport(self.content, self.viewport);
        changed
    }

    pub fn inverse(&self) -> Result<Affine> {
        if self.is_degenerate() {
            return Err(GridError::DegenerateTransform);
        }
        invert(self.matrix)
    }

    /// Maps a raw surface coordinate into grid space.
    pub fn to_grid_space(&self, surface_point: Point) -> Option<Point> {
        self.inverse().ok().map(|inverse| inverse * surface_point)
    }

    /// Places the viewport explicitly, clamped to the content rect.
    pub fn set_viewport(&mut self, viewport: Rect) -> bool {
        if self.is_degenerate() {
            return false;
        }
        self.commit_viewport(viewport)
    }

    /// Moves the rendered content by `delta` surface pixels.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        if self.is_degenerate() || !delta.is_finite() {
            return false;
        }
        self.apply(Affine::translate(delta))
    }

    /// Scales the rendered content by `factor` around `focus` (surface space).
    pub fn zoom_about(&mut self, factor: f64, focus: Point) -> bool {
        if self.is_degenerate() || !factor.is_finite() || factor <= 0.0 || !focus.is_finite() {
            return false;
        }
        let about = focus.to_vec2();
        self.apply(Affine::translate(about) * Affine::scale(factor) * Affine::translate(-about))
    }

    fn apply(&mut self, post: Affine) -> bool {
        let matrix = post * self.matrix;
        match viewport_from_matrix(self.content, matrix) {
            Some(viewport) => self.commit_viewport(viewport),
            None => {
                log::warn!("dropping non-invertible view matrix {matrix:?}");
                false
            }
        }
    }

    fn commit_viewport(&mut self, viewport: Rect) -> bool {
        let clamped = clamp_viewport(viewport, self.content);
        if clamped.width() <= 0.0 || clamped.height() <= 0.0 {
            log::trace!("ignoring collapsed viewport {viewport:?}");
            return false;
        }
        let changed = clamped != self.viewport;
        self.viewport = clamped;
        self.matrix = matrix_from_viewport(self.content, self.viewport);
        changed
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}
