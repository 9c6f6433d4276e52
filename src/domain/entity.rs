//! Entities: the miner and the elevator.
//! Both own their logical position; visuals are only pushed, never read.

use super::grid::{Direction, Pos};
use super::scene::{Vec3, VisualId, BACKDROP_Z, PLAYFIELD_Z, TILE_SIZE_Y};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// In-flight move: visual slides from `from` to `to` over `total` ticks.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MoveAnimation {
    pub from: Vec3,
    pub to: Vec3,
    pub direction: Direction,
    pub remaining: u32,
    pub total: u32,
}

impl MoveAnimation {
    /// Interpolated position for the current countdown.
    pub fn position(&self) -> Vec3 {
        if self.total == 0 {
            return self.to;
        }
        let t = self.remaining as f32 / self.total as f32;
        Vec3::lerp(self.to, self.from, t)
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Pos,
    pub facing: Facing,
    /// Ticks until the next move may be accepted.
    pub move_block: u32,
    pub animation: Option<MoveAnimation>,
    pub zoomed: bool,
    pub field_of_view: f32,
    pub visual: VisualId,
}

impl Player {
    pub fn new(pos: Pos, field_of_view: f32, visual: VisualId) -> Self {
        Player {
            pos,
            facing: Facing::Right,
            move_block: 0,
            animation: None,
            zoomed: false,
            field_of_view,
            visual,
        }
    }

    pub fn world_position(pos: Pos) -> Vec3 {
        Vec3::at_cell(pos, PLAYFIELD_Z)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Commits `to` and starts the slide from the previous cell.
    pub fn begin_move(&mut self, to: Pos, direction: Direction, ticks: u32) {
        let from = Self::world_position(self.pos);
        self.pos = to;
        self.animation = Some(MoveAnimation {
            from,
            to: Self::world_position(to),
            direction,
            remaining: ticks,
            total: ticks,
        });
    }

    /// Counts the animation down by one tick and returns the new visual
    /// position. The animation ends once the countdown reaches zero.
    pub fn advance_animation(&mut self) -> Option<Vec3> {
        let anim = self.animation.as_mut()?;
        anim.remaining = anim.remaining.saturating_sub(1);
        let position = anim.position();
        if anim.remaining == 0 {
            self.animation = None;
        }
        Some(position)
    }

    pub fn toggle_zoom(&mut self) -> bool {
        self.zoomed = !self.zoomed;
        self.zoomed
    }

    /// Moves the field of view one `step` toward its target, clamped.
    /// Returns the new value when it changed.
    pub fn step_field_of_view(&mut self, default_fov: f32, max_zoom: f32, step: f32) -> Option<f32> {
        let target = if self.zoomed { max_zoom } else { default_fov };
        let next = if self.field_of_view < target {
            (self.field_of_view + step).min(target)
        } else if self.field_of_view > target {
            (self.field_of_view - step).max(target)
        } else {
            return None;
        };
        self.field_of_view = next;
        Some(next)
    }
}

#[derive(Clone, Debug)]
pub struct Elevator {
    /// Column is fixed to the elevator lane; only the row changes.
    pub anchor: Pos,
    pub sticks_to_player: bool,
    pub visual: VisualId,
}

impl Elevator {
    pub fn new(anchor: Pos, visual: VisualId) -> Self {
        Elevator {
            anchor,
            sticks_to_player: false,
            visual,
        }
    }

    pub fn anchor_row(&self) -> i32 {
        self.anchor.y
    }

    pub fn follow(&mut self, pos: Pos) {
        self.sticks_to_player = true;
        self.anchor = pos;
    }

    pub fn release(&mut self) {
        self.sticks_to_player = false;
    }

    /// Cabin placement for a miner visual at `player`: one tile lower,
    /// pushed back behind the playfield.
    pub fn mesh_position(player: Vec3) -> Vec3 {
        Vec3::new(player.x, player.y - TILE_SIZE_Y, BACKDROP_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn animation_runs_from_old_cell_to_new() {
        let mut p = Player::new(Pos::new(30, 0), 1.1, VisualId(0));
        p.begin_move(Pos::new(29, 0), Direction::Left, 10);
        assert_eq!(p.pos, Pos::new(29, 0));

        let first = p.advance_animation().unwrap();
        // 9/10 of the way back toward x=30
        assert!(close(first.x, 29.0 * 1.6 + 0.9 * 1.6));

        for _ in 0..8 {
            p.advance_animation();
        }
        let last = p.advance_animation().unwrap();
        assert!(close(last.x, 29.0 * 1.6));
        assert!(!p.is_animating());
        assert_eq!(p.advance_animation(), None);
    }

    #[test]
    fn field_of_view_clamps_at_bounds() {
        let mut p = Player::new(Pos::new(0, 0), 1.1, VisualId(0));
        assert_eq!(p.step_field_of_view(1.1, 2.5, 0.1), None);

        p.toggle_zoom();
        let mut steps = 0;
        while p.step_field_of_view(1.1, 2.5, 0.1).is_some() {
            steps += 1;
            assert!(p.field_of_view <= 2.5);
        }
        assert_eq!(p.field_of_view, 2.5);
        assert!((13..=15).contains(&steps));

        p.toggle_zoom();
        while p.step_field_of_view(1.1, 2.5, 0.1).is_some() {
            assert!(p.field_of_view >= 1.1);
        }
        assert_eq!(p.field_of_view, 1.1);
    }

    #[test]
    fn elevator_follow_and_release() {
        let mut e = Elevator::new(Pos::new(34, 0), VisualId(1));
        assert_eq!(e.anchor_row(), 0);
        e.follow(Pos::new(34, -7));
        assert!(e.sticks_to_player);
        assert_eq!(e.anchor_row(), -7);
        e.release();
        assert!(!e.sticks_to_player);
        assert_eq!(e.anchor_row(), -7);
    }

    #[test]
    fn cabin_sits_below_miner() {
        let cabin = Elevator::mesh_position(Vec3::new(54.4, -5.0, PLAYFIELD_Z));
        assert!(close(cabin.x, 54.4));
        assert!(close(cabin.y, -7.5));
        assert!(close(cabin.z, 2.4));
    }
}
