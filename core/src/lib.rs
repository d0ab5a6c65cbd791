//! Presentation and input-mapping core for an interactive minesweeper board.
//!
//! The crate draws a snapshot of [`CellVisualState`]s onto any [`Surface`], keeps
//! a pannable/zoomable viewport over it and turns raw pointer streams into
//! grid-coordinate [`GridAction`]s. It never decides game rules: the host feeds it
//! snapshots and reacts to the actions it emits.

pub use cell::*;
pub use clamp::*;
pub use error::*;
pub use facade::*;
pub use gesture::*;
pub use input::*;
pub use layout::*;
pub use render::*;
pub use transform::*;

pub use kurbo::{Affine, Insets, Point, Rect, Size, Vec2};

mod cell;
mod clamp;
mod error;
mod facade;
mod gesture;
mod input;
mod layout;
mod render;
mod transform;
