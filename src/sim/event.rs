//! Events emitted during a stage tick.
//! The presentation layer consumes these for visuals and sound.

use crate::domain::grid::{Direction, Pos};
use crate::domain::scene::Vec3;
use crate::domain::soil::SoilKind;

#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    PlayerMoved { from: Pos, to: Pos, direction: Direction, dug: bool },
    SoilOpened { pos: Pos, kind: SoilKind },
    HintShown { pos: Pos },
    HintRevealed { pos: Pos, kind: SoilKind },
    /// Elevator cabin should be drawn at `position` this frame.
    ElevatorTracked { position: Vec3 },
    ZoomToggled { zoomed: bool },
    FieldOfViewChanged { fov: f32 },
}
