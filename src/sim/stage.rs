//! The stage: owns the soil field, miner, elevator and scenery, and
//! advances them one tick at a time.
//!
//! Processing order per tick (skipped entirely while paused):
//!   1. Move-block countdown
//!   2. Move animation (and elevator tracking while it sticks)
//!   3. Movement: poll Down, Up, Left, Right; resolve; apply
//!   4. Zoom toggle and field-of-view stepping
//!
//! Applying an accepted move follows a fixed order, since later steps read
//! what earlier ones changed:
//!   open target → enterability check → clear current → commit + animate
//!   → neighbor hints → elevator stick/release

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::entity::{Elevator, Facing, Player};
use crate::domain::grid::{Direction, Grid, Pos, SoilIndex, SOIL_OFFSET_Y, SURFACE_ROW};
use crate::domain::rules::{self, MovePlan};
use crate::domain::scene::{Building, Scene, Sprite, Vec3, VisualId, BACKDROP_Z, TILE_SIZE_Z};
use crate::domain::soil::{HintOutcome, SoilField, SoilKind};
use super::control::{Action, InputSource, RandomSource};
use super::event::StageEvent;

/// Town houses: anchor column and building.
const HOUSES: [(i32, Building); 4] = [
    (5, Building::Bank),
    (12, Building::Hospital),
    (20, Building::Saloon),
    (28, Building::Store),
];

/// Loose decorations: sprite and cell (rows above the surface are sky).
const DECORATIONS: [(Sprite, Pos); 4] = [
    (Sprite::Table, Pos::new(34, 0)),
    (Sprite::Cactus, Pos::new(2, 0)),
    (Sprite::Bird, Pos::new(4, 2)),
    (Sprite::Bird, Pos::new(26, 1)),
];

/// Per-stage constants taken from the config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    pub walk_ticks: u32,
    pub dig_ticks: u32,
    pub hint_luck: u32,
    pub default_fov: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Tuning {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Tuning {
            walk_ticks: cfg.timing.walk_ticks,
            dig_ticks: cfg.timing.dig_ticks,
            hint_luck: cfg.soil.hint_luck,
            default_fov: cfg.camera.default_fov,
            max_zoom: cfg.camera.max_zoom,
            zoom_step: cfg.camera.zoom_step,
        }
    }
}

pub struct Stage {
    grid: Grid,
    tuning: Tuning,
    soil: SoilField,
    tunnels: Vec<VisualId>,
    scenery: Vec<VisualId>,
    player: Player,
    elevator: Elevator,
    paused: bool,
    tick: u64,
}

impl Stage {
    /// Builds a stage with weighted-random soil content.
    pub fn build(cfg: &GameConfig, scene: &mut dyn Scene, rng: &mut dyn RandomSource) -> Self {
        Self::build_with(cfg, scene, |_| {
            SoilKind::from_percentile(rng.int_in_range(0, SoilKind::PERCENTILE_MAX))
        })
    }

    /// Builds a stage whose soil content comes from `content`.
    pub fn build_with(
        cfg: &GameConfig,
        scene: &mut dyn Scene,
        content: impl FnMut(SoilIndex) -> SoilKind,
    ) -> Self {
        let grid = Grid::new(cfg.stage.level_width, cfg.stage.shaft_depth);
        let tuning = Tuning::from_config(cfg);

        let tunnels = (0..grid.shaft_width())
            .flat_map(|col| (0..grid.shaft_depth() as usize).map(move |row| SoilIndex::new(col, row)))
            .map(|idx| scene.create(Sprite::Tunnel, Vec3::at_cell(grid.soil_position(idx), TILE_SIZE_Z)))
            .collect();
        let soil = SoilField::build(&grid, scene, content);
        let scenery = build_scenery(&grid, scene);

        let start = Pos::new(cfg.stage.player_start_x as i32, SURFACE_ROW);
        let player_visual = scene.create(Sprite::Miner(Facing::Right), Player::world_position(start));
        let player = Player::new(start, tuning.default_fov, player_visual);

        let anchor = Pos::new(grid.elevator_column(), SURFACE_ROW);
        let cabin = Elevator::mesh_position(Player::world_position(anchor));
        let elevator = Elevator::new(anchor, scene.create(Sprite::Elevator, cabin));

        info!(
            width = grid.level_width(),
            depth = grid.shaft_depth(),
            tiles = soil.len(),
            start = %start,
            "stage built"
        );

        Stage {
            grid,
            tuning,
            soil,
            tunnels,
            scenery,
            player,
            elevator,
            paused: false,
            tick: 0,
        }
    }

    // ── Accessors ──

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn soil(&self) -> &SoilField {
        &self.soil
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn elevator(&self) -> &Elevator {
        &self.elevator
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        info!(paused = self.paused, "pause toggled");
        self.paused
    }

    // ── Tick ──

    pub fn tick(
        &mut self,
        input: &mut dyn InputSource,
        rng: &mut dyn RandomSource,
        scene: &mut dyn Scene,
    ) -> Vec<StageEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        self.tick += 1;

        if self.player.move_block > 0 {
            self.player.move_block -= 1;
        }

        if let Some(position) = self.player.advance_animation() {
            scene.set_position(self.player.visual, position);
            if self.elevator.sticks_to_player {
                events.push(StageEvent::ElevatorTracked {
                    position: Elevator::mesh_position(position),
                });
            }
        }

        if self.player.move_block == 0 {
            let requested = Direction::POLL_ORDER
                .into_iter()
                .find(|&dir| input.is_requested(Action::Move(dir)));
            if let Some(dir) = requested {
                if let Some(plan) = self.resolve(dir, scene) {
                    input.consume(Action::Move(dir));
                    self.apply_move(plan, rng, scene, &mut events);
                }
            }
        }

        if input.is_requested(Action::ToggleZoom) {
            input.consume(Action::ToggleZoom);
            let zoomed = self.player.toggle_zoom();
            events.push(StageEvent::ZoomToggled { zoomed });
        }
        let t = &self.tuning;
        if let Some(fov) = self.player.step_field_of_view(t.default_fov, t.max_zoom, t.zoom_step) {
            events.push(StageEvent::FieldOfViewChanged { fov });
        }

        events
    }

    /// Runs the resolver and applies its facing side effect.
    fn resolve(&mut self, dir: Direction, scene: &mut dyn Scene) -> Option<MovePlan> {
        let resolution = rules::resolve_move(
            &self.grid,
            &self.soil,
            self.elevator.anchor_row(),
            self.player.pos,
            dir,
        );
        if let Some(facing) = resolution.facing {
            if facing != self.player.facing {
                self.player.facing = facing;
                scene.set_sprite(self.player.visual, Sprite::Miner(facing));
            }
        }
        resolution.plan
    }

    fn apply_move(
        &mut self,
        plan: MovePlan,
        rng: &mut dyn RandomSource,
        scene: &mut dyn Scene,
        events: &mut Vec<StageEvent>,
    ) {
        let from = self.player.pos;
        let current = self.grid.to_soil_index(from);
        let target = self.grid.to_soil_index(plan.target);

        self.player.move_block = self.tuning.walk_ticks;
        let mut dug = false;

        if let Some(tile) = target.and_then(|idx| self.soil.get_mut(idx)) {
            if tile.is_closed() {
                tile.open(scene);
                dug = true;
                self.player.move_block = self.tuning.dig_ticks;
                debug!(pos = %plan.target, kind = tile.kind().name(), "soil opened");
                events.push(StageEvent::SoilOpened { pos: plan.target, kind: tile.kind() });
            }
            if !tile.is_enterable() {
                debug!(pos = %plan.target, kind = tile.kind().name(), "entry blocked");
                return;
            }
        }

        if let Some(tile) = current.and_then(|idx| self.soil.get_mut(idx)) {
            tile.clear(scene);
        }

        self.player.begin_move(plan.target, plan.direction, self.player.move_block);
        debug!(from = %from, to = %plan.target, dug, "player moved");
        events.push(StageEvent::PlayerMoved {
            from,
            to: plan.target,
            direction: plan.direction,
            dug,
        });

        self.check_hints(rng, scene, events);

        if plan.direction.is_vertical() && self.grid.is_elevator_column(plan.target.x) {
            self.elevator.follow(plan.target);
        } else {
            self.elevator.release();
        }
    }

    /// Rolls a hint for each closed, non-empty neighbor of the miner.
    fn check_hints(
        &mut self,
        rng: &mut dyn RandomSource,
        scene: &mut dyn Scene,
        events: &mut Vec<StageEvent>,
    ) {
        let pos = self.player.pos;
        if pos.y > SOIL_OFFSET_Y || self.grid.is_elevator_column(pos.x) {
            return;
        }
        // neighbors in poll order: down, up, left, right
        for dir in Direction::POLL_ORDER {
            let cell = pos.step(dir);
            let Some(tile) = self.grid.to_soil_index(cell).and_then(|idx| self.soil.get_mut(idx)) else {
                continue;
            };
            if !tile.is_closed() || tile.contains_nothing() {
                continue;
            }
            if rng.int_in_range(1, self.tuning.hint_luck) != 1 {
                continue;
            }
            match tile.trigger_hint(scene) {
                HintOutcome::StoneShown => {
                    debug!(pos = %cell, "hint shown");
                    events.push(StageEvent::HintShown { pos: cell });
                }
                HintOutcome::ContentRevealed => {
                    debug!(pos = %cell, kind = tile.kind().name(), "hint revealed");
                    events.push(StageEvent::HintRevealed { pos: cell, kind: tile.kind() });
                }
                HintOutcome::Ignored => {}
            }
        }
    }

    /// Releases every visual this stage created.
    pub fn dispose(self, scene: &mut dyn Scene) {
        self.soil.dispose(scene);
        for id in self.tunnels.iter().chain(self.scenery.iter()) {
            scene.dispose(*id);
        }
        scene.dispose(self.player.visual);
        scene.dispose(self.elevator.visual);
        info!(ticks = self.tick, "stage disposed");
    }
}

/// Ground line, houses and decorations. Anything that would not fit the
/// configured width is left out.
fn build_scenery(grid: &Grid, scene: &mut dyn Scene) -> Vec<VisualId> {
    let mut ids = Vec::new();

    for x in 0..grid.elevator_column() {
        let cell = Pos::new(x, grid.ground_row());
        ids.push(scene.create(Sprite::Ground, Vec3::at_cell(cell, 0.0)));
    }

    for (x, building) in HOUSES {
        let (cols, _) = building.footprint();
        if x + cols as i32 <= grid.elevator_column() {
            let at = Vec3::at_cell(Pos::new(x, SURFACE_ROW), BACKDROP_Z);
            ids.push(scene.create(Sprite::House(building), at));
        }
    }

    for (sprite, cell) in DECORATIONS {
        if cell.x < grid.level_width() {
            ids.push(scene.create(sprite, Vec3::at_cell(cell, BACKDROP_Z)));
        }
    }

    ids
}
