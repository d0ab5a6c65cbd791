use serde::{Deserialize, Serialize};

use crate::{Gesture, GridGeometry, ViewportTransform};

/// Cell action delivered to listeners, in grid coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridAction {
    Primary { column: usize, row: usize },
    Secondary { column: usize, row: usize },
}

impl GridAction {
    pub const fn coords(self) -> (usize, usize) {
        match self {
            Self::Primary { column, row } | Self::Secondary { column, row } => (column, row),
        }
    }
}

/// Effect of routing one gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    Action(GridAction),
    Redraw,
    Ignored,
}

/// Maps classified gestures onto viewport changes or cell actions.
#[derive(Copy, Clone, Debug, Default)]
pub struct GestureRouter;

impl GestureRouter {
    pub fn route(
        &self,
        gesture: Gesture,
        view: &mut ViewportTransform,
        geometry: &GridGeometry,
    ) -> Routed {
        match gesture {
            Gesture::Tap(point) => Self::resolve_cell(view, geometry, point)
                .map_or(Routed::Ignored, |(column, row)| {
                    log::debug!("primary cell action on ({column}, {row})");
                    Routed::Action(GridAction::Primary { column, row })
                }),
            Gesture::LongPress(point) => Self::resolve_cell(view, geometry, point)
                .map_or(Routed::Ignored, |(column, row)| {
                    log::debug!("secondary cell action on ({column}, {row})");
                    Routed::Action(GridAction::Secondary { column, row })
                }),
            Gesture::Drag { distance } => {
                if view.pan_by(-distance) {
                    log::trace!("panned to {:?}", view.viewport_rect());
                    Routed::Redraw
                } else {
                    Routed::Ignored
                }
            }
            Gesture::Pinch { factor, focus } => {
                if view.zoom_about(factor, focus) {
                    log::trace!("zoomed x{factor} to {:?}", view.viewport_rect());
                    Routed::Redraw
                } else {
                    Routed::Ignored
                }
            }
        }
    }

    fn resolve_cell(
        view: &ViewportTransform,
        geometry: &GridGeometry,
        surface_point: kurbo::Point,
    ) -> Option<(usize, usize)> {
        let Some(grid_point) = view.to_grid_space(surface_point) else {
            log::trace!("no inverse transform, dropping gesture at {surface_point:?}");
            return None;
        };
        let cell = geometry.cell_at(grid_point);
        if cell.is_none() {
            log::trace!("gesture at {grid_point:?} is outside the grid");
        }
        cell
    }
}
