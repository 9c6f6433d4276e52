//! Visual handle seam between the simulation and whatever draws it.
//!
//! The core never queries visuals. It creates them, moves them, shows or
//! hides them, swaps their sprite and finally disposes them. World-space
//! positions use the tile sizes below; the camera looks along +z, so a
//! larger `z` is farther away.

use super::entity::Facing;
use super::grid::Pos;
use super::soil::SoilKind;

pub const TILE_SIZE_X: f32 = 1.6;
pub const TILE_SIZE_Y: f32 = 2.5;
pub const TILE_SIZE_Z: f32 = 1.6;

/// Thickness of a flat face (billboard sprites).
pub const FACE_DEPTH: f32 = 0.0001;

/// Depth of sprites standing in the playfield (player).
pub const PLAYFIELD_Z: f32 = 0.5 * TILE_SIZE_Z;

/// Depth of backdrop sprites (houses, elevator, decorations).
pub const BACKDROP_Z: f32 = 1.5 * TILE_SIZE_Z;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    /// World position of a grid cell at the given depth.
    pub fn at_cell(pos: Pos, z: f32) -> Self {
        Vec3::new(pos.x as f32 * TILE_SIZE_X, pos.y as f32 * TILE_SIZE_Y, z)
    }

    pub fn lerp(from: Vec3, to: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            from.x + (to.x - from.x) * t,
            from.y + (to.y - from.y) * t,
            from.z + (to.z - from.z) * t,
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Building {
    Bank,
    Hospital,
    Saloon,
    Store,
}

impl Building {
    /// Size in cells, `(columns, rows)`, growing right and up from the anchor.
    pub fn footprint(self) -> (u32, u32) {
        match self {
            Building::Bank | Building::Store => (4, 2),
            Building::Hospital | Building::Saloon => (5, 2),
        }
    }
}

/// Texture reference of a visual.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sprite {
    Miner(Facing),
    /// Undug soil.
    SoilCover,
    /// Generic marker: something lies here, content still hidden.
    HintStone,
    /// Revealed soil content.
    Ore(SoilKind),
    /// Dug-out background behind a soil tile.
    Tunnel,
    Ground,
    Elevator,
    House(Building),
    Cactus,
    Table,
    Bird,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VisualId(pub u32);

pub trait Scene {
    fn create(&mut self, sprite: Sprite, position: Vec3) -> VisualId;
    fn set_position(&mut self, id: VisualId, position: Vec3);
    fn set_visible(&mut self, id: VisualId, visible: bool);
    fn set_sprite(&mut self, id: VisualId, sprite: Sprite);
    fn dispose(&mut self, id: VisualId);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_to_world() {
        let v = Vec3::at_cell(Pos::new(2, -3), PLAYFIELD_Z);
        assert!((v.x - 3.2).abs() < 1e-5);
        assert!((v.y + 7.5).abs() < 1e-5);
        assert!((v.z - 0.8).abs() < 1e-5);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.6, -2.5, 0.0);
        assert_eq!(Vec3::lerp(a, b, 0.0), a);
        assert_eq!(Vec3::lerp(a, b, 1.0), b);
        let mid = Vec3::lerp(a, b, 0.5);
        assert!((mid.y + 1.25).abs() < 1e-5);
    }

    #[test]
    fn recording_scene_tracks_and_disposes() {
        let mut scene = testing::RecordingScene::new();
        let id = scene.create(Sprite::Bird, Vec3::new(0.0, 5.0, BACKDROP_Z));
        scene.set_visible(id, false);
        scene.set_sprite(id, Sprite::Cactus);
        let v = scene.get(id).unwrap();
        assert_eq!((v.sprite, v.visible), (Sprite::Cactus, false));
        assert_eq!(scene.len(), 1);
        scene.dispose(id);
        assert!(scene.is_empty());
        assert!(scene.get(id).is_none());
    }
}
