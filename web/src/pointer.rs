use bitflags::bitflags;
use minegrid_core::{Point, PointerButtons, PointerEvent, PointerPhase};
use serde::{Deserialize, Serialize};

bitflags! {
    /// DOM `buttons` bitmask.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

impl MouseButtons {
    /// Maps a DOM `button` index (which orders middle before right) to its mask bit.
    pub fn from_button_index(index: i16) -> Self {
        match index {
            0 => Self::LEFT,
            1 => Self::MIDDLE,
            2 => Self::RIGHT,
            3 => Self::BACK,
            4 => Self::FORWARD,
            _ => Self::empty(),
        }
    }
}

impl From<MouseButtons> for PointerButtons {
    fn from(buttons: MouseButtons) -> Self {
        let mut mapped = PointerButtons::empty();
        mapped.set(PointerButtons::PRIMARY, buttons.contains(MouseButtons::LEFT));
        mapped.set(PointerButtons::SECONDARY, buttons.contains(MouseButtons::RIGHT));
        mapped.set(PointerButtons::AUXILIARY, buttons.contains(MouseButtons::MIDDLE));
        mapped
    }
}

pub fn phase_for(event_type: &str) -> Option<PointerPhase> {
    match event_type {
        "pointerdown" => Some(PointerPhase::Down),
        "pointermove" => Some(PointerPhase::Move),
        "pointerup" => Some(PointerPhase::Up),
        "pointercancel" => Some(PointerPhase::Cancel),
        _ => None,
    }
}

/// Converts a DOM pointer event into surface coordinates relative to `origin`,
/// the canvas' top-left corner in client space.
pub fn to_core_event(event: &web_sys::PointerEvent, origin: Point) -> Option<PointerEvent> {
    let phase = phase_for(&event.type_())?;
    let position = Point::new(
        f64::from(event.client_x()) - origin.x,
        f64::from(event.client_y()) - origin.y,
    );
    let buttons = MouseButtons::from_button_index(event.button());
    log::trace!(
        "pointer {} {phase:?} at {position:?} ({buttons:?})",
        event.pointer_id()
    );
    Some(
        PointerEvent::new(event.pointer_id(), phase, position, event.time_stamp())
            .with_buttons(buttons.into()),
    )
}
