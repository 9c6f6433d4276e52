//! Movement rules: truth-table driven.
//!
//! Pure functions over the grid, the soil field and the elevator anchor.
//! They decide "what is legal" and never perform the move; applying an
//! accepted plan is the stage's job.
//!
//! `W` is the level width, `B` the bottom row of the shaft.
//!
//! ### Down
//! ┌──────────────────────────────┬────────┬──────────────────────────┐
//! │ Condition                    │ Allow? │ Notes                    │
//! ├──────────────────────────────┼────────┼──────────────────────────┤
//! │ x < W-1 and y == 0           │ DENY   │ town row is solid        │
//! │ y <= B                       │ DENY   │ shaft floor              │
//! │ Otherwise                    │ ALLOW  │ elevator lane passes y=0 │
//! └──────────────────────────────┴────────┴──────────────────────────┘
//!
//! ### Up
//! ┌──────────────────────────────┬────────┬──────────────────────────┐
//! │ x < W-1 and y == -2          │ DENY   │ no climbing into ground  │
//! │ y >= 0                       │ DENY   │ sky                      │
//! │ Otherwise                    │ ALLOW  │                          │
//! └──────────────────────────────┴────────┴──────────────────────────┘
//!
//! ### Left (always faces left, even when denied)
//! ┌──────────────────────────────┬────────┬──────────────────────────┐
//! │ y == -1                      │ DENY   │ ground line              │
//! │ x == 0                       │ DENY   │ left edge                │
//! │ Otherwise                    │ ALLOW  │                          │
//! └──────────────────────────────┴────────┴──────────────────────────┘
//!
//! ### Right (always faces right, even when denied)
//! ┌──────────────────────────────┬────────┬──────────────────────────┐
//! │ x < W-2                      │ ALLOW  │                          │
//! │ x == W-2 and y == anchor row │ ALLOW  │ step into the cabin      │
//! │ Otherwise                    │ DENY   │ cabin elsewhere / edge   │
//! └──────────────────────────────┴────────┴──────────────────────────┘
//!
//! A plan carries `dig` when the target holds a closed soil tile: the stage
//! opens it and uses the dig duration. Enterability is checked by the stage
//! *after* opening, so digging into water still reveals it.

use super::entity::Facing;
use super::grid::{Direction, Grid, Pos, SOIL_OFFSET_Y, SURFACE_ROW};
use super::soil::SoilField;

/// Accepted move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MovePlan {
    pub direction: Direction,
    pub target: Pos,
    pub dig: bool,
}

/// Resolver output: a facing side effect (horizontal requests only) and
/// the plan, `None` when rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Resolution {
    pub facing: Option<Facing>,
    pub plan: Option<MovePlan>,
}

impl Resolution {
    pub fn is_accepted(&self) -> bool {
        self.plan.is_some()
    }
}

// ── Per-direction legality ──

pub fn can_move_down(grid: &Grid, from: Pos) -> bool {
    if from.x < grid.elevator_column() && from.y == SURFACE_ROW {
        return false;
    }
    from.y > grid.bottom_row()
}

pub fn can_move_up(grid: &Grid, from: Pos) -> bool {
    if from.x < grid.elevator_column() && from.y == SOIL_OFFSET_Y {
        return false;
    }
    from.y < SURFACE_ROW
}

pub fn can_move_left(grid: &Grid, from: Pos) -> bool {
    if from.y == grid.ground_row() {
        return false;
    }
    from.x > 0
}

pub fn can_move_right(grid: &Grid, from: Pos, elevator_row: i32) -> bool {
    let last_shaft_col = grid.level_width() - 2;
    from.x < last_shaft_col || (from.x == last_shaft_col && from.y == elevator_row)
}

// ── Resolver ──

pub fn resolve_move(
    grid: &Grid,
    soil: &SoilField,
    elevator_row: i32,
    from: Pos,
    direction: Direction,
) -> Resolution {
    let (facing, allowed) = match direction {
        Direction::Down => (None, can_move_down(grid, from)),
        Direction::Up => (None, can_move_up(grid, from)),
        Direction::Left => (Some(Facing::Left), can_move_left(grid, from)),
        Direction::Right => (Some(Facing::Right), can_move_right(grid, from, elevator_row)),
    };
    if !allowed {
        return Resolution { facing, plan: None };
    }

    let target = from.step(direction);
    let dig = grid
        .to_soil_index(target)
        .and_then(|idx| soil.get(idx))
        .is_some_and(|tile| tile.is_closed());

    Resolution {
        facing,
        plan: Some(MovePlan { direction, target, dig }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::SoilIndex;
    use crate::domain::soil::SoilKind;
    use crate::domain::scene::testing::RecordingScene;

    fn setup() -> (Grid, SoilField, RecordingScene) {
        let grid = Grid::new(35, 30);
        let mut scene = RecordingScene::new();
        let soil = SoilField::build(&grid, &mut scene, |_| SoilKind::Sandstone);
        (grid, soil, scene)
    }

    #[test]
    fn down_blocked_on_town_row_except_elevator() {
        let (g, soil, _) = setup();
        let r = resolve_move(&g, &soil, 0, Pos::new(30, 0), Direction::Down);
        assert!(!r.is_accepted());
        assert_eq!(r.facing, None);

        let r = resolve_move(&g, &soil, 0, Pos::new(34, 0), Direction::Down);
        let plan = r.plan.unwrap();
        assert_eq!(plan.target, Pos::new(34, -1));
        assert!(!plan.dig);
    }

    #[test]
    fn down_stops_at_shaft_floor() {
        let (g, _, _) = setup();
        assert!(can_move_down(&g, Pos::new(5, -30)));
        assert!(!can_move_down(&g, Pos::new(5, -31)));
        assert!(!can_move_down(&g, Pos::new(34, -31)));
    }

    #[test]
    fn down_into_closed_soil_digs() {
        let (g, soil, _) = setup();
        let plan = resolve_move(&g, &soil, 0, Pos::new(5, -3), Direction::Down)
            .plan
            .unwrap();
        assert_eq!(plan.target, Pos::new(5, -4));
        assert!(plan.dig);
    }

    #[test]
    fn down_into_opened_soil_walks() {
        let (g, mut soil, mut scene) = setup();
        soil.get_mut(SoilIndex::new(5, 2)).unwrap().open(&mut scene);
        let plan = resolve_move(&g, &soil, 0, Pos::new(5, -3), Direction::Down)
            .plan
            .unwrap();
        assert!(!plan.dig);
    }

    #[test]
    fn up_rules() {
        let (g, _, _) = setup();
        // top soil row cannot climb into the ground line
        assert!(!can_move_up(&g, Pos::new(5, -2)));
        assert!(can_move_up(&g, Pos::new(5, -3)));
        // elevator lane climbs through
        assert!(can_move_up(&g, Pos::new(34, -2)));
        assert!(can_move_up(&g, Pos::new(34, -1)));
        assert!(!can_move_up(&g, Pos::new(34, 0)));
        assert!(!can_move_up(&g, Pos::new(10, 0)));
    }

    #[test]
    fn left_faces_left_even_when_rejected() {
        let (g, soil, _) = setup();
        let r = resolve_move(&g, &soil, 0, Pos::new(0, 0), Direction::Left);
        assert_eq!(r.facing, Some(Facing::Left));
        assert!(!r.is_accepted());

        let r = resolve_move(&g, &soil, 0, Pos::new(34, -1), Direction::Left);
        assert_eq!(r.facing, Some(Facing::Left));
        assert!(!r.is_accepted());

        let r = resolve_move(&g, &soil, 0, Pos::new(30, 0), Direction::Left);
        assert_eq!(r.plan.unwrap().target, Pos::new(29, 0));
    }

    #[test]
    fn right_needs_aligned_elevator() {
        let (g, soil, _) = setup();
        let r = resolve_move(&g, &soil, 0, Pos::new(33, -5), Direction::Right);
        assert_eq!(r.facing, Some(Facing::Right));
        assert!(!r.is_accepted());

        let r = resolve_move(&g, &soil, -5, Pos::new(33, -5), Direction::Right);
        assert_eq!(r.plan.unwrap().target, Pos::new(34, -5));

        assert!(can_move_right(&g, Pos::new(32, -5), 0));
        assert!(!can_move_right(&g, Pos::new(34, 0), 0));
    }

    #[test]
    fn elevator_lane_has_no_soil() {
        let (g, soil, _) = setup();
        let plan = resolve_move(&g, &soil, -5, Pos::new(34, -5), Direction::Down)
            .plan
            .unwrap();
        assert!(!plan.dig);
    }
}
