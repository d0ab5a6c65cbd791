use bitflags::bitflags;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GridError, Result};

pub const DEFAULT_TOUCH_SLOP_PX: f64 = 8.0;
pub const DEFAULT_LONG_PRESS_MS: f64 = 500.0;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PointerButtons: u16 {
        const PRIMARY   = 1;
        const SECONDARY = 1 << 1;
        const AUXILIARY = 1 << 2;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw sample from the host's input system, in surface coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
    pub buttons: PointerButtons,
    pub time_ms: f64,
}

impl PointerEvent {
    pub fn new(id: i32, phase: PointerPhase, position: impl Into<Point>, time_ms: f64) -> Self {
        Self {
            id: PointerId(id),
            phase,
            position: position.into(),
            buttons: PointerButtons::PRIMARY,
            time_ms,
        }
    }

    pub fn with_buttons(mut self, buttons: PointerButtons) -> Self {
        self.buttons = buttons;
        self
    }
}

/// A classified gesture, still in surface coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Gesture {
    Tap(Point),
    LongPress(Point),
    /// Previous position minus current position.
    Drag { distance: Vec2 },
    Pinch { factor: f64, focus: Point },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    SingleTap,
    LongPress,
    Drag,
    Pinch,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureState {
    Idle,
    Tracking(GestureKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Movement in surface pixels after which a press becomes a drag.
    pub touch_slop: f64,
    /// Hold time after which a press becomes a long-press.
    pub long_press_ms: f64,
}

impl GestureConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.touch_slop.is_finite() || self.touch_slop < 0.0 {
            return Err(GridError::InvalidConfiguration(
                "touch slop must be a non-negative number",
            ));
        }
        if !self.long_press_ms.is_finite() || self.long_press_ms <= 0.0 {
            return Err(GridError::InvalidConfiguration(
                "long-press delay must be a positive number",
            ));
        }
        Ok(())
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: DEFAULT_TOUCH_SLOP_PX,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct TrackedPointer {
    id: PointerId,
    position: Point,
}

#[derive(Copy, Clone, Debug)]
enum Session {
    Idle,
    Press {
        start: Point,
        start_ms: f64,
        secondary: bool,
        long_pressed: bool,
    },
    Drag {
        last: Point,
    },
    Pinch {
        last_span: f64,
    },
}

/// Turns a raw pointer stream into tap, long-press, drag and pinch gestures.
///
/// Only the first two concurrent pointers are tracked. Long presses need the
/// host to call [`GestureRecognizer::poll`] while a pointer is held; a release
/// past the threshold still resolves to a long-press when it never did.
#[derive(Clone, Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    pointers: SmallVec<[TrackedPointer; 2]>,
    session: Session,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            pointers: SmallVec::new(),
            session: Session::Idle,
        }
    }

    pub fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    pub fn state(&self) -> GestureState {
        use GestureKind::*;
        match self.session {
            Session::Idle => GestureState::Idle,
            Session::Press {
                secondary,
                long_pressed,
                ..
            } if secondary || long_pressed => GestureState::Tracking(LongPress),
            Session::Press { .. } => GestureState::Tracking(SingleTap),
            Session::Drag { .. } => GestureState::Tracking(Drag),
            Session::Pinch { .. } => GestureState::Tracking(Pinch),
        }
    }

    /// When a pending press turns into a long-press, if one is pending.
    pub fn long_press_deadline(&self) -> Option<f64> {
        match self.session {
            Session::Press {
                start_ms,
                secondary: false,
                long_pressed: false,
                ..
            } => Some(start_ms + self.config.long_press_ms),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<Gesture> {
        match event.phase {
            PointerPhase::Down => self.on_down(event),
            PointerPhase::Move => self.on_move(event),
            PointerPhase::Up => self.on_up(event),
            PointerPhase::Cancel => {
                log::trace!("pointer {:?} cancelled gesture", event.id);
                self.pointers.clear();
                self.session = Session::Idle;
                None
            }
        }
    }

    pub fn poll(&mut self, now_ms: f64) -> Option<Gesture> {
        let deadline = self.long_press_deadline()?;
        if now_ms < deadline {
            return None;
        }
        if let Session::Press {
            start,
            ref mut long_pressed,
            ..
        } = self.session
        {
            *long_pressed = true;
            log::trace!("long-press at {start:?}");
            return Some(Gesture::LongPress(start));
        }
        None
    }

    fn index_of(&self, id: PointerId) -> Option<usize> {
        self.pointers.iter().position(|pointer| pointer.id == id)
    }

    fn span(&self) -> Option<(f64, Point)> {
        match self.pointers.as_slice() {
            [a, b, ..] => Some((a.position.distance(b.position), a.position.midpoint(b.position))),
            _ => None,
        }
    }

    fn on_down(&mut self, event: PointerEvent) -> Option<Gesture> {
        if let Some(index) = self.index_of(event.id) {
            self.pointers[index].position = event.position;
            return None;
        }
        if self.pointers.len() >= 2 {
            log::trace!("ignoring extra pointer {:?}", event.id);
            return None;
        }
        if !event
            .buttons
            .intersects(PointerButtons::PRIMARY | PointerButtons::SECONDARY)
        {
            log::trace!("ignoring {:?} press of pointer {:?}", event.buttons, event.id);
            return None;
        }

        self.pointers.push(TrackedPointer {
            id: event.id,
            position: event.position,
        });

        if self.pointers.len() == 1 {
            self.session = Session::Press {
                start: event.position,
                start_ms: event.time_ms,
                secondary: event.buttons == PointerButtons::SECONDARY,
                long_pressed: false,
            };
        } else if let Some((span, _)) = self.span() {
            log::trace!("pinch started, span {span}");
            self.session = Session::Pinch { last_span: span };
        }
        None
    }

    fn on_move(&mut self, event: PointerEvent) -> Option<Gesture> {
        let index = self.index_of(event.id)?;
        self.pointers[index].position = event.position;

        match self.session {
            Session::Idle => None,
            Session::Press {
                start,
                long_pressed,
                ..
            } => {
                if long_pressed || start.distance(event.position) <= self.config.touch_slop {
                    return None;
                }
                self.session = Session::Drag {
                    last: event.position,
                };
                Some(Gesture::Drag {
                    distance: start - event.position,
                })
            }
            Session::Drag { last } => {
                let distance = last - event.position;
                self.session = Session::Drag {
                    last: event.position,
                };
                (distance != Vec2::ZERO).then_some(Gesture::Drag { distance })
            }
            Session::Pinch { last_span } => {
                let (span, focus) = self.span()?;
                self.session = Session::Pinch { last_span: span };
                if last_span <= 0.0 || span <= 0.0 || span == last_span {
                    return None;
                }
                Some(Gesture::Pinch {
                    factor: span / last_span,
                    focus,
                })
            }
        }
    }

    fn on_up(&mut self, event: PointerEvent) -> Option<Gesture> {
        let index = self.index_of(event.id)?;
        self.pointers.remove(index);

        match self.session {
            Session::Idle => None,
            Session::Press {
                start,
                start_ms,
                secondary,
                long_pressed,
            } => {
                self.session = Session::Idle;
                if long_pressed {
                    return None;
                }
                let held = event.time_ms - start_ms;
                if secondary || held >= self.config.long_press_ms {
                    Some(Gesture::LongPress(start))
                } else {
                    Some(Gesture::Tap(event.position))
                }
            }
            Session::Drag { .. } => {
                if self.pointers.is_empty() {
                    self.session = Session::Idle;
                }
                None
            }
            Session::Pinch { .. } => {
                self.session = match self.pointers.first() {
                    Some(remaining) => Session::Drag {
                        last: remaining.position,
                    },
                    None => Session::Idle,
                };
                None
            }
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
