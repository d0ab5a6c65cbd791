use kurbo::Rect;

/// Whether `inner` lies entirely within `outer`, edges included.
pub fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

/// Corrects `viewport` so it never leaves `content` nor grows beyond it.
///
/// Each axis is handled on its own: an axis that is larger than the content is
/// reset to the content's extent, then the viewport is shifted back inside
/// while keeping its size. A viewport already inside the content is returned
/// untouched.
pub fn clamp_viewport(viewport: Rect, content: Rect) -> Rect {
    let viewport = viewport.abs();
    let content = content.abs();

    if rect_contains(content, viewport) {
        return viewport;
    }

    let (x0, x1) = clamp_axis((viewport.x0, viewport.x1), (content.x0, content.x1));
    let (y0, y1) = clamp_axis((viewport.y0, viewport.y1), (content.y0, content.y1));
    Rect::new(x0, y0, x1, y1)
}

fn clamp_axis((start, end): (f64, f64), (min, max): (f64, f64)) -> (f64, f64) {
    let extent = end - start;
    if extent > max - min {
        return (min, max);
    }

    if start < min {
        (min, (min + extent).min(max))
    } else if end > max {
        ((max - extent).max(min), max)
    } else {
        (start, end)
    }
}
