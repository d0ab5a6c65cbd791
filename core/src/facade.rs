use kurbo::{Insets, Point, Rect, Size};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    CellVisualState, GestureConfig, GestureRecognizer, GestureRouter, GestureState, GridAction,
    GridError, GridGeometry, GridRenderer, GridStyle, LineWidthPolicy, OverlaySlot, PointerEvent,
    RenderStats, Result, Routed, Surface, SymbolOverlays, ViewportTransform,
};

pub const DEFAULT_ROWS: usize = 13;
pub const DEFAULT_COLUMNS: usize = 10;

/// Smallest cell, in density-independent pixels, that is comfortable to tap.
pub const CLICKABLE_CELL_DP: f64 = 48.0;
/// Smallest cell that still reads well when zoomed all the way out.
pub const REASONABLE_CELL_DP: f64 = 24.0;
/// Below this a cell is too small to draw at all.
pub const UNREASONABLE_CELL_DP: f64 = 8.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub columns: usize,
    pub style: GridStyle,
    pub gestures: GestureConfig,
    /// Fixed separator width; `None` picks one from the cell size.
    pub line_width: Option<f64>,
    /// Physical pixels per density-independent pixel.
    pub display_density: f64,
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.line_width {
            validate_line_width(width)?;
        }
        validate_density(self.display_density)?;
        self.gestures.validate()
    }

    fn line_width_policy(&self) -> LineWidthPolicy {
        self.line_width
            .map_or(LineWidthPolicy::Automatic, LineWidthPolicy::Fixed)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            style: GridStyle::default(),
            gestures: GestureConfig::default(),
            line_width: None,
            display_density: 1.0,
        }
    }
}

fn validate_line_width(width: f64) -> Result<()> {
    if width.is_finite() && width >= 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidConfiguration(
            "grid line width must be a non-negative number",
        ))
    }
}

fn validate_density(density: f64) -> Result<()> {
    if density.is_finite() && density > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidConfiguration(
            "display density must be a positive number",
        ))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// How many `(columns, rows)` fit the content rect at three cell sizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCapacity {
    pub clickable: (usize, usize),
    pub reasonable: (usize, usize),
    pub unreasonable: (usize, usize),
}

type Listener = Box<dyn FnMut(GridAction)>;

fn inset_content(surface: Size, padding: Insets) -> Rect {
    let inner = Rect::from_origin_size(Point::ZERO, surface) - padding;
    if inner.width() > 0.0 && inner.height() > 0.0 {
        inner
    } else {
        Rect::from_origin_size(inner.origin(), Size::ZERO)
    }
}

/// Everything a host needs to show and drive a board: layout, viewport,
/// gesture recognition, rendering and action listeners.
///
/// `O` is the host's overlay handle, drawn by its [`Surface`].
pub struct GridView<O> {
    rows: usize,
    columns: usize,
    cells: Option<Array2<CellVisualState>>,
    surface_size: Size,
    padding: Insets,
    line_width: LineWidthPolicy,
    display_density: f64,
    view: ViewportTransform,
    geometry: GridGeometry,
    recognizer: GestureRecognizer,
    router: GestureRouter,
    renderer: GridRenderer<O>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    needs_redraw: bool,
}

impl<O> GridView<O> {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: GridConfig) -> Self {
        let mut view = Self {
            rows: config.rows,
            columns: config.columns,
            cells: None,
            surface_size: Size::ZERO,
            padding: Insets::ZERO,
            line_width: config.line_width_policy(),
            display_density: config.display_density,
            view: ViewportTransform::default(),
            geometry: GridGeometry::default(),
            recognizer: GestureRecognizer::new(config.gestures),
            router: GestureRouter,
            renderer: GridRenderer::new(config.style, SymbolOverlays::new()),
            listeners: Vec::new(),
            next_listener: 0,
            needs_redraw: true,
        };
        view.relayout();
        view
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cells(&self) -> Option<&Array2<CellVisualState>> {
        self.cells.as_ref()
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn content_rect(&self) -> Rect {
        self.view.content_rect()
    }

    pub fn viewport_rect(&self) -> Rect {
        self.view.viewport_rect()
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.view
    }

    pub fn gesture_state(&self) -> GestureState {
        self.recognizer.state()
    }

    /// Time at which [`GridView::poll`] would fire a pending long-press.
    pub fn long_press_deadline(&self) -> Option<f64> {
        self.recognizer.long_press_deadline()
    }

    pub fn style(&self) -> &GridStyle {
        self.renderer.style()
    }

    pub fn overlays(&self) -> &SymbolOverlays<O> {
        self.renderer.overlays()
    }

    pub fn set_surface_size(&mut self, size: Size) {
        if self.surface_size == size {
            return;
        }
        self.surface_size = size;
        self.reset_content();
    }

    pub fn set_padding(&mut self, padding: Insets) {
        if self.padding == padding {
            return;
        }
        self.padding = padding;
        self.reset_content();
    }

    fn reset_content(&mut self) {
        let content = inset_content(self.surface_size, self.padding);
        log::debug!("content rect {content:?}");
        self.view.set_content_rect(content);
        self.relayout();
    }

    /// New dimensions start from a fully zoomed-out view.
    fn resize_grid(&mut self, rows: usize, columns: usize) {
        log::debug!("grid resized to {columns}x{rows}");
        self.rows = rows;
        self.columns = columns;
        self.view.reset();
        self.relayout();
    }

    fn relayout(&mut self) {
        self.geometry =
            GridGeometry::compute(self.rows, self.columns, self.view.content_rect(), self.line_width);
        self.needs_redraw = true;
    }

    /// Replaces the snapshot with rows of cells.
    ///
    /// Every row must be as long as the first one; on mismatch nothing changes.
    pub fn set_cells<R>(&mut self, rows: &[R]) -> Result<()>
    where
        R: AsRef<[CellVisualState]>,
    {
        let expected = rows.first().map_or(0, |row| row.as_ref().len());
        for (index, row) in rows.iter().enumerate() {
            let found = row.as_ref().len();
            if found != expected {
                return Err(GridError::ShapeMismatch {
                    row: index,
                    expected,
                    found,
                });
            }
        }

        let cells = Array2::from_shape_fn((rows.len(), expected), |(row, column)| {
            rows[row].as_ref()[column]
        });
        self.set_cell_array(cells);
        Ok(())
    }

    /// Replaces the snapshot; the array is indexed `[row, column]`.
    pub fn set_cell_array(&mut self, cells: Array2<CellVisualState>) {
        let (rows, columns) = cells.dim();
        self.cells = Some(cells);
        if (rows, columns) != (self.rows, self.columns) {
            self.resize_grid(rows, columns);
        }
        self.needs_redraw = true;
    }

    pub fn set_rows(&mut self, rows: usize) {
        if self.rows != rows {
            self.resize_grid(rows, self.columns);
        }
    }

    pub fn set_columns(&mut self, columns: usize) {
        if self.columns != columns {
            self.resize_grid(self.rows, columns);
        }
    }

    pub fn grid_line_width(&self) -> f64 {
        self.geometry.line_stroke_width
    }

    pub fn set_grid_line_width(&mut self, width: f64) -> Result<()> {
        validate_line_width(width)?;
        self.line_width = LineWidthPolicy::Fixed(width);
        self.relayout();
        Ok(())
    }

    pub fn unset_grid_line_width(&mut self) {
        self.line_width = LineWidthPolicy::Automatic;
        self.relayout();
    }

    pub fn set_style(&mut self, style: GridStyle) {
        if *self.renderer.style() != style {
            self.renderer.set_style(style);
            self.needs_redraw = true;
        }
    }

    /// Installs the symbol for `slot`, returning the previous one.
    pub fn set_overlay(&mut self, slot: OverlaySlot, overlay: Option<O>) -> Option<O> {
        self.needs_redraw = true;
        self.renderer.overlays_mut().set(slot, overlay)
    }

    pub fn set_gesture_config(&mut self, config: GestureConfig) -> Result<()> {
        config.validate()?;
        self.recognizer.set_config(config);
        Ok(())
    }

    pub fn display_density(&self) -> f64 {
        self.display_density
    }

    pub fn set_display_density(&mut self, density: f64) -> Result<()> {
        validate_density(density)?;
        self.display_density = density;
        Ok(())
    }

    pub fn add_listener(&mut self, listener: impl FnMut(GridAction) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn broadcast(&mut self, action: GridAction) {
        for (_, listener) in &mut self.listeners {
            listener(action);
        }
    }

    /// Feeds one raw pointer event through recognition and routing.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Routed {
        match self.recognizer.handle(event) {
            Some(gesture) => self.dispatch(gesture),
            None => Routed::Ignored,
        }
    }

    /// Advances the long-press timer to `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Routed {
        match self.recognizer.poll(now_ms) {
            Some(gesture) => self.dispatch(gesture),
            None => Routed::Ignored,
        }
    }

    fn dispatch(&mut self, gesture: crate::Gesture) -> Routed {
        let routed = self.router.route(gesture, &mut self.view, &self.geometry);
        match routed {
            Routed::Action(action) => self.broadcast(action),
            Routed::Redraw => self.needs_redraw = true,
            Routed::Ignored => {}
        }
        routed
    }

    /// Zooms by `factor` about a surface point, as a wheel would.
    pub fn zoom_by(&mut self, factor: f64, focus: Point) -> bool {
        let changed = self.view.zoom_about(factor, focus);
        self.needs_redraw |= changed;
        changed
    }

    pub fn reset_view(&mut self) -> bool {
        let changed = self.view.reset();
        self.needs_redraw |= changed;
        changed
    }

    pub fn max_dimensions(&self) -> GridCapacity {
        let content = self.view.content_rect();
        let fit = |target_dp: f64| {
            let cell = target_dp * self.display_density;
            (
                (content.width() / cell).floor() as usize,
                (content.height() / cell).floor() as usize,
            )
        };
        GridCapacity {
            clickable: fit(CLICKABLE_CELL_DP),
            reasonable: fit(REASONABLE_CELL_DP),
            unreasonable: fit(UNREASONABLE_CELL_DP),
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        core::mem::take(&mut self.needs_redraw)
    }

    pub fn draw<S>(&mut self, surface: &mut S) -> RenderStats
    where
        S: Surface<Overlay = O>,
    {
        let range = self.geometry.visible_range(self.view.viewport_rect());
        let stats = self.renderer.draw(
            surface,
            self.cells.as_ref(),
            &self.geometry,
            &self.view,
            &range,
        );
        self.needs_redraw = false;
        stats
    }
}

impl<O> Default for GridView<O> {
    fn default() -> Self {
        Self::from_config(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::render::tests::RecordingSurface;
    use crate::{GestureKind, PointerPhase};

    fn view_300(rows: usize, columns: usize) -> GridView<&'static str> {
        let mut view = GridView::new(GridConfig {
            rows,
            columns,
            line_width: Some(0.0),
            ..GridConfig::default()
        })
        .unwrap();
        view.set_surface_size(Size::new(300.0, 300.0));
        view
    }

    fn recorded(view: &mut GridView<&'static str>) -> Rc<RefCell<Vec<GridAction>>> {
        let actions = Rc::new(RefCell::new(Vec::new()));
        let sink = actions.clone();
        view.add_listener(move |action| sink.borrow_mut().push(action));
        actions
    }

    fn tap(view: &mut GridView<&'static str>, x: f64, y: f64) -> Routed {
        view.handle_pointer(PointerEvent::new(1, PointerPhase::Down, (x, y), 0.0));
        view.handle_pointer(PointerEvent::new(1, PointerPhase::Up, (x, y), 50.0))
    }

    #[test]
    fn defaults_match_classic_board() {
        let view: GridView<&'static str> = GridView::default();
        assert_eq!((view.rows(), view.columns()), (13, 10));
        assert_eq!(*view.style(), GridStyle::default());
        assert!(view.needs_redraw());
    }

    #[test]
    fn tap_on_full_view_emits_primary_action() {
        let mut view = view_300(10, 10);
        let actions = recorded(&mut view);

        assert_eq!(view.geometry().cell_size, 30);
        assert_eq!(view.geometry().grid_rect, Rect::new(0.0, 0.0, 300.0, 300.0));

        let routed = tap(&mut view, 45.0, 75.0);

        assert_eq!(
            routed,
            Routed::Action(GridAction::Primary { column: 1, row: 2 })
        );
        assert_eq!(
            *actions.borrow(),
            vec![GridAction::Primary { column: 1, row: 2 }]
        );
    }

    #[test]
    fn pinch_zooms_about_focus() {
        let mut view = view_300(10, 10);
        view.take_redraw();

        view.handle_pointer(PointerEvent::new(1, PointerPhase::Down, (100.0, 150.0), 0.0));
        view.handle_pointer(PointerEvent::new(2, PointerPhase::Down, (150.0, 150.0), 5.0));
        assert_eq!(
            view.gesture_state(),
            GestureState::Tracking(GestureKind::Pinch)
        );
        let routed =
            view.handle_pointer(PointerEvent::new(2, PointerPhase::Move, (200.0, 150.0), 20.0));

        assert_eq!(routed, Routed::Redraw);
        let viewport = view.viewport_rect();
        assert!((viewport.width() - 150.0).abs() < 1e-9);
        assert!((viewport.height() - 150.0).abs() < 1e-9);
        assert!((viewport.center() - Point::new(150.0, 150.0)).hypot() < 1e-9);
        assert!(view.take_redraw());
    }

    #[test]
    fn resized_snapshots_relayout() {
        let mut view = view_300(10, 10);

        view.set_cells(&vec![vec![CellVisualState::Hidden; 5]; 5])
            .unwrap();
        assert_eq!(view.geometry().cell_size, 60);
        assert_eq!((view.rows(), view.columns()), (5, 5));

        view.set_cells(&vec![vec![CellVisualState::Hidden; 8]; 8]).unwrap();
        let geometry = view.geometry();
        assert_eq!((geometry.rows, geometry.columns), (8, 8));
        assert_eq!(geometry.cell_size, 37);
        assert_eq!(geometry.grid_rect, Rect::new(2.0, 2.0, 298.0, 298.0));
    }

    #[test]
    fn new_dimensions_reset_zoom() {
        let mut view = view_300(10, 10);
        assert!(view.zoom_by(2.0, Point::new(150.0, 150.0)));

        view.set_cells(&vec![vec![CellVisualState::Hidden; 8]; 8]).unwrap();
        assert_eq!(view.viewport_rect(), view.content_rect());

        view.zoom_by(2.0, Point::new(150.0, 150.0));
        view.set_rows(12);
        assert_eq!(view.viewport_rect(), view.content_rect());

        view.zoom_by(2.0, Point::new(150.0, 150.0));
        view.set_columns(12);
        assert_eq!(view.viewport_rect(), view.content_rect());
    }

    #[test]
    fn same_dimensions_keep_zoom() {
        let mut view = view_300(10, 10);
        view.set_cells(&vec![vec![CellVisualState::Hidden; 10]; 10]).unwrap();
        view.zoom_by(2.0, Point::new(150.0, 150.0));
        let zoomed = view.viewport_rect();
        assert_ne!(zoomed, view.content_rect());

        view.set_cells(&vec![vec![CellVisualState::Flagged; 10]; 10]).unwrap();

        assert_eq!(view.viewport_rect(), zoomed);
    }

    #[test]
    fn jagged_snapshot_is_rejected_without_side_effects() {
        let mut view = view_300(10, 10);
        view.set_cells(&vec![vec![CellVisualState::Mine; 10]; 10])
            .unwrap();
        let before = *view.geometry();

        let mut rows = vec![vec![CellVisualState::Hidden; 4]; 3];
        rows[2].pop();
        let err = view.set_cells(&rows).unwrap_err();

        assert_eq!(
            err,
            GridError::ShapeMismatch {
                row: 2,
                expected: 4,
                found: 3
            }
        );
        assert_eq!(*view.geometry(), before);
        let cells = view.cells().unwrap();
        assert_eq!(cells.dim(), (10, 10));
        assert!(cells.iter().all(|cell| *cell == CellVisualState::Mine));
    }

    #[test]
    fn same_dimensions_keep_geometry() {
        let mut view = view_300(3, 3);
        view.set_cells(&[[CellVisualState::Hidden; 3]; 3]).unwrap();
        view.take_redraw();

        view.set_cells(&[[CellVisualState::Flagged; 3]; 3]).unwrap();

        assert!(view.take_redraw());
        assert_eq!(view.geometry().cell_size, 100);
    }

    #[test]
    fn listeners_run_in_registration_order_until_removed() {
        let mut view = view_300(10, 10);
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = log.clone();
        let first_id = view.add_listener(move |_| first.borrow_mut().push("first"));
        let second = log.clone();
        view.add_listener(move |_| second.borrow_mut().push("second"));

        tap(&mut view, 10.0, 10.0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        assert!(view.remove_listener(first_id));
        assert!(!view.remove_listener(first_id));
        tap(&mut view, 10.0, 10.0);
        assert_eq!(*log.borrow(), vec!["first", "second", "second"]);
    }

    #[test]
    fn long_press_fires_from_poll() {
        let mut view = view_300(10, 10);
        let actions = recorded(&mut view);

        view.handle_pointer(PointerEvent::new(1, PointerPhase::Down, (295.0, 5.0), 100.0));
        assert_eq!(view.long_press_deadline(), Some(600.0));
        assert_eq!(view.poll(599.0), Routed::Ignored);
        assert_eq!(
            view.poll(600.0),
            Routed::Action(GridAction::Secondary { column: 9, row: 0 })
        );
        assert_eq!(
            view.handle_pointer(PointerEvent::new(1, PointerPhase::Up, (295.0, 5.0), 700.0)),
            Routed::Ignored
        );
        assert_eq!(actions.borrow().len(), 1);
    }

    #[test]
    fn padding_shrinks_content_and_resets_view() {
        let mut view = view_300(10, 10);
        view.zoom_by(2.0, Point::new(150.0, 150.0));

        view.set_padding(Insets::uniform(10.0));

        assert_eq!(view.content_rect(), Rect::new(10.0, 10.0, 290.0, 290.0));
        assert_eq!(view.viewport_rect(), view.content_rect());
        assert_eq!(view.geometry().cell_size, 28);
        assert_eq!(tap(&mut view, 5.0, 5.0), Routed::Ignored);
    }

    #[test]
    fn oversized_padding_disables_gestures() {
        let mut view = view_300(10, 10);
        view.set_padding(Insets::uniform(200.0));

        assert_eq!(view.geometry().cell_size, 0);
        assert_eq!(tap(&mut view, 150.0, 150.0), Routed::Ignored);
    }

    #[test]
    fn line_width_validation() {
        let mut view = view_300(10, 10);
        assert!(matches!(
            view.set_grid_line_width(-1.0),
            Err(GridError::InvalidConfiguration(_))
        ));
        assert!(view.set_grid_line_width(f64::NAN).is_err());
        assert_eq!(view.grid_line_width(), 0.0);

        view.unset_grid_line_width();
        assert_eq!(view.grid_line_width(), 30.0 / 16.0);
        assert_eq!(view.geometry().cell_size, 29);

        assert!(
            GridView::<&'static str>::new(GridConfig {
                display_density: 0.0,
                ..GridConfig::default()
            })
            .is_err()
        );
    }

    #[test]
    fn capacity_tiers_are_ordered() {
        let mut view = view_300(10, 10);
        view.set_surface_size(Size::new(480.0, 960.0));

        let capacity = view.max_dimensions();
        assert_eq!(capacity.clickable, (10, 20));
        assert_eq!(capacity.reasonable, (20, 40));
        assert_eq!(capacity.unreasonable, (60, 120));

        view.set_display_density(2.0).unwrap();
        assert_eq!(view.max_dimensions().clickable, (5, 10));
        assert!(view.set_display_density(-1.0).is_err());
    }

    #[test]
    fn draw_clears_pending_redraw() {
        let mut view = view_300(2, 2);
        view.set_overlay(OverlaySlot::Unchecked, Some("tile"));
        let mut surface = RecordingSurface::default();

        let stats = view.draw(&mut surface);

        assert_eq!(stats.cells, 4);
        assert_eq!(surface.overlays(), vec!["tile"; 4]);
        assert!(!view.take_redraw());

        assert!(!view.reset_view());
        assert!(!view.take_redraw());
        assert!(view.zoom_by(1.5, Point::new(0.0, 0.0)));
        assert!(view.take_redraw());
        assert!(!view.take_redraw());
    }

    #[test]
    fn gesture_config_is_validated() {
        let mut view = view_300(10, 10);
        let bad = GestureConfig {
            long_press_ms: 0.0,
            ..GestureConfig::default()
        };
        assert!(view.set_gesture_config(bad).is_err());

        let config = GestureConfig {
            long_press_ms: 250.0,
            ..GestureConfig::default()
        };
        view.set_gesture_config(config).unwrap();
        view.handle_pointer(PointerEvent::new(1, PointerPhase::Down, (10.0, 10.0), 0.0));
        assert_eq!(view.long_press_deadline(), Some(250.0));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config: GridConfig = serde_json::from_str(r#"{"rows": 16, "line_width": 2.0}"#).unwrap();
        assert_eq!(config.rows, 16);
        assert_eq!(config.columns, DEFAULT_COLUMNS);
        assert_eq!(config.line_width, Some(2.0));
        assert_eq!(config.display_density, 1.0);
    }
}
