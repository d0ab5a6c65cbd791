use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions};
use gloo::render::{AnimationFrame, request_animation_frame};
use gloo::timers::callback::Timeout;
use gloo::utils::window;
use minegrid_core::{
    CellVisualState, GridAction, GridConfig, GridView, ListenerId, OverlaySlot, Point, Size,
};
use ndarray::Array2;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WheelEvent};
use yew::prelude::*;

use crate::canvas::{CanvasSurface, CanvasSymbol, classic_overlays};
use crate::pointer;

/// Zoom factor per wheel delta unit, applied exponentially.
const WHEEL_ZOOM_RATE: f64 = 0.002;

#[derive(Properties, PartialEq)]
pub struct GridCanvasProps {
    pub cells: Rc<Array2<CellVisualState>>,
    #[prop_or_default]
    pub config: GridConfig,
    #[prop_or_default]
    pub on_action: Callback<GridAction>,
}

pub enum Msg {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    LongPressDue(f64),
    Resize,
    Frame,
}

/// Canvas-backed board. Draws on animation frames, and only when the view
/// has something new to show.
pub struct GridCanvas {
    view: GridView<CanvasSymbol>,
    canvas: NodeRef,
    surface: Option<CanvasSurface>,
    action_listener: ListenerId,
    long_press: Option<Timeout>,
    frame: Option<AnimationFrame>,
    _wheel_listener: Option<EventListener>,
    _resize_listener: EventListener,
}

fn forward_actions(
    view: &mut GridView<CanvasSymbol>,
    on_action: &Callback<GridAction>,
) -> ListenerId {
    let on_action = on_action.clone();
    view.add_listener(move |action| on_action.emit(action))
}

impl GridCanvas {
    fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.canvas.cast::<HtmlCanvasElement>()
    }

    fn canvas_origin(canvas: &HtmlCanvasElement) -> Point {
        let rect = canvas.get_bounding_client_rect();
        Point::new(rect.left(), rect.top())
    }

    fn resize(&mut self) {
        let Some(canvas) = self.canvas() else {
            return;
        };
        let size = Size::new(
            f64::from(canvas.client_width()),
            f64::from(canvas.client_height()),
        );
        if let Some(surface) = self.surface.as_mut() {
            surface.fit(&canvas, size, window().device_pixel_ratio());
        }
        self.view.set_surface_size(size);
        // resizing the backing store wipes the canvas
        self.paint();
    }

    fn paint(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        let stats = self.view.draw(surface);
        log::trace!("painted {stats:?}");
    }

    fn arm_long_press(&mut self, ctx: &Context<Self>, now_ms: f64) {
        self.long_press = self.view.long_press_deadline().map(|deadline| {
            let link = ctx.link().clone();
            let delay = (deadline - now_ms).max(0.0).ceil() as u32;
            Timeout::new(delay, move || link.send_message(Msg::LongPressDue(deadline)))
        });
    }

    fn schedule_frame(&mut self, ctx: &Context<Self>) {
        if self.frame.is_some() || !self.view.needs_redraw() {
            return;
        }
        let link = ctx.link().clone();
        self.frame = Some(request_animation_frame(move |_| {
            link.send_message(Msg::Frame)
        }));
    }

    fn apply_config(&mut self, config: &GridConfig) {
        self.view.set_style(config.style);
        if let Err(err) = self.view.set_gesture_config(config.gestures) {
            log::warn!("keeping gesture config: {err}");
        }
        if let Err(err) = self.view.set_display_density(config.display_density) {
            log::warn!("keeping display density: {err}");
        }
        match config.line_width {
            Some(width) => {
                if let Err(err) = self.view.set_grid_line_width(width) {
                    log::warn!("keeping grid line width: {err}");
                }
            }
            None => self.view.unset_grid_line_width(),
        }
    }

    fn install_wheel_listener(&mut self, ctx: &Context<Self>, canvas: &HtmlCanvasElement) {
        let link = ctx.link().clone();
        self._wheel_listener = Some(EventListener::new_with_options(
            canvas,
            "wheel",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(event) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                if event.ctrl_key() {
                    event.prevent_default();
                    link.send_message(Msg::Wheel(event.clone()));
                }
            },
        ));
    }
}

impl Component for GridCanvas {
    type Message = Msg;
    type Properties = GridCanvasProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let mut view = GridView::new(props.config).unwrap_or_else(|err| {
            log::warn!("invalid grid config, using defaults: {err}");
            GridView::default()
        });
        let overlays = classic_overlays();
        for slot in OverlaySlot::ALL {
            view.set_overlay(slot, overlays.get(slot).cloned());
        }
        view.set_cell_array(props.cells.as_ref().clone());
        let action_listener = forward_actions(&mut view, &props.on_action);

        let link = ctx.link().clone();
        let resize_listener =
            EventListener::new(&window(), "resize", move |_| link.send_message(Msg::Resize));

        Self {
            view,
            canvas: NodeRef::default(),
            surface: None,
            action_listener,
            long_press: None,
            frame: None,
            _wheel_listener: None,
            _resize_listener: resize_listener,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Pointer(event) => {
                let Some(canvas) = self.canvas() else {
                    return false;
                };
                if event.type_() == "pointerdown" {
                    if let Err(err) = canvas.set_pointer_capture(event.pointer_id()) {
                        log::debug!("pointer capture failed: {err:?}");
                    }
                }
                if let Some(sample) = pointer::to_core_event(&event, Self::canvas_origin(&canvas))
                {
                    self.view.handle_pointer(sample);
                    self.arm_long_press(ctx, sample.time_ms);
                }
            }
            Msg::LongPressDue(deadline) => {
                self.long_press = None;
                self.view.poll(deadline);
            }
            Msg::Wheel(event) => {
                if let Some(canvas) = self.canvas() {
                    let origin = Self::canvas_origin(&canvas);
                    let focus = Point::new(
                        f64::from(event.client_x()) - origin.x,
                        f64::from(event.client_y()) - origin.y,
                    );
                    let factor = (-event.delta_y() * WHEEL_ZOOM_RATE).exp();
                    self.view.zoom_by(factor, focus);
                }
            }
            Msg::Resize => self.resize(),
            Msg::Frame => {
                self.frame = None;
                self.paint();
            }
        }
        self.schedule_frame(ctx);
        false
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        let props = ctx.props();
        if props.config != old_props.config {
            self.apply_config(&props.config);
        }
        if props.on_action != old_props.on_action {
            self.view.remove_listener(self.action_listener);
            self.action_listener = forward_actions(&mut self.view, &props.on_action);
        }
        if !Rc::ptr_eq(&props.cells, &old_props.cells) {
            self.view.set_cell_array(props.cells.as_ref().clone());
        }
        self.schedule_frame(ctx);
        false
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_pointer = ctx.link().callback(Msg::Pointer);

        html! {
            <canvas
                ref={self.canvas.clone()}
                class="minegrid"
                style="touch-action: none; width: 100%; height: 100%;"
                onpointerdown={on_pointer.clone()}
                onpointermove={on_pointer.clone()}
                onpointerup={on_pointer.clone()}
                onpointercancel={on_pointer}
                oncontextmenu={Callback::from(|e: MouseEvent| e.prevent_default())}
            />
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if !first_render {
            return;
        }
        let Some(canvas) = self.canvas() else {
            log::error!("grid canvas was not mounted");
            return;
        };
        match CanvasSurface::new(&canvas) {
            Ok(surface) => self.surface = Some(surface),
            Err(err) => log::error!("could not get a 2d context: {err:?}"),
        }
        self.install_wheel_listener(ctx, &canvas);
        self.resize();
    }
}
