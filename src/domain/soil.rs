//! Soil tiles: content kinds, the reveal state machine and the soil field.
//!
//! ## State machine
//!
//! ```text
//!   ClosedNoHint ──trigger_hint──▶ ClosedHintShown
//!        │                             │
//!        └────────── open ─────────────┴──▶ Opened (terminal)
//! ```
//!
//! A second `trigger_hint` on `ClosedHintShown` reveals the content face but
//! keeps the tile closed: the miner still has to dig it.
//!
//! Kind properties are queried via methods, not stored as flags,
//! so soil semantics are centralized here.

use super::grid::{Grid, SoilIndex};
use super::scene::{Scene, Sprite, Vec3, VisualId, FACE_DEPTH, TILE_SIZE_Z};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoilKind {
    Nothing,
    Sandstone,
    Water,
    Granite,
    Silver,
    Gold,
    Platinum,
}

/// Content distribution: first row whose threshold is above the drawn
/// percentile wins, anything past the table is `Nothing`.
pub const CONTENT_TABLE: [(u32, SoilKind); 6] = [
    (4, SoilKind::Platinum),
    (10, SoilKind::Gold),
    (15, SoilKind::Silver),
    (30, SoilKind::Sandstone),
    (33, SoilKind::Water),
    (40, SoilKind::Granite),
];

impl SoilKind {
    /// Percentiles are drawn from `0 ..= PERCENTILE_MAX`.
    pub const PERCENTILE_MAX: u32 = 100;

    pub fn from_percentile(percentile: u32) -> SoilKind {
        CONTENT_TABLE
            .iter()
            .find(|(threshold, _)| percentile < *threshold)
            .map(|(_, kind)| *kind)
            .unwrap_or(SoilKind::Nothing)
    }

    /// Can the miner stand inside an opened tile of this kind?
    pub fn is_enterable(self) -> bool {
        match self {
            SoilKind::Nothing
            | SoilKind::Sandstone
            | SoilKind::Silver
            | SoilKind::Gold
            | SoilKind::Platinum => true,
            SoilKind::Water | SoilKind::Granite => false,
        }
    }

    /// Obstacles stay visible after the miner walked past them.
    pub fn is_obstacle(self) -> bool {
        !self.is_enterable()
    }

    pub fn is_precious(self) -> bool {
        matches!(self, SoilKind::Silver | SoilKind::Gold | SoilKind::Platinum)
    }

    pub fn name(self) -> &'static str {
        match self {
            SoilKind::Nothing => "nothing",
            SoilKind::Sandstone => "sandstone",
            SoilKind::Water => "water",
            SoilKind::Granite => "granite",
            SoilKind::Silver => "silver",
            SoilKind::Gold => "gold",
            SoilKind::Platinum => "platinum",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SoilState {
    ClosedNoHint,
    ClosedHintShown,
    Opened,
}

/// What the tile currently shows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SoilFace {
    Covered,
    HintStone,
    Content,
    Hidden,
}

/// Result of [`Soil::trigger_hint`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HintOutcome {
    Ignored,
    StoneShown,
    ContentRevealed,
}

#[derive(Clone, Debug)]
pub struct Soil {
    kind: SoilKind,
    state: SoilState,
    face: SoilFace,
    origin: Vec3,
    visual: VisualId,
}

impl Soil {
    /// Creates the closed tile and its covered visual at `origin`.
    pub fn new(kind: SoilKind, origin: Vec3, scene: &mut dyn Scene) -> Self {
        let visual = scene.create(Sprite::SoilCover, origin);
        Soil {
            kind,
            state: SoilState::ClosedNoHint,
            face: SoilFace::Covered,
            origin,
            visual,
        }
    }

    pub fn kind(&self) -> SoilKind {
        self.kind
    }

    pub fn state(&self) -> SoilState {
        self.state
    }

    pub fn face(&self) -> SoilFace {
        self.face
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    pub fn is_closed(&self) -> bool {
        self.state != SoilState::Opened
    }

    pub fn is_enterable(&self) -> bool {
        self.kind.is_enterable()
    }

    pub fn contains_nothing(&self) -> bool {
        self.kind == SoilKind::Nothing
    }

    pub fn hint_shown(&self) -> bool {
        self.state == SoilState::ClosedHintShown
    }

    /// Opens the tile and reveals its content. Enterable tiles move behind
    /// the miner.
    pub fn open(&mut self, scene: &mut dyn Scene) {
        if self.state == SoilState::Opened {
            return;
        }
        self.state = SoilState::Opened;
        self.show_content(scene);
        if self.is_enterable() {
            let pushed = Vec3::new(
                self.origin.x,
                self.origin.y,
                self.origin.z + FACE_DEPTH + 0.5 * TILE_SIZE_Z,
            );
            scene.set_position(self.visual, pushed);
        }
    }

    /// Called whenever the miner leaves this cell.
    pub fn clear(&mut self, scene: &mut dyn Scene) {
        if self.kind.is_obstacle() {
            return;
        }
        self.hide(scene);
    }

    /// First call shows the hint stone, the second reveals the content.
    pub fn trigger_hint(&mut self, scene: &mut dyn Scene) -> HintOutcome {
        match self.state {
            SoilState::Opened => HintOutcome::Ignored,
            SoilState::ClosedHintShown => {
                self.show_content(scene);
                HintOutcome::ContentRevealed
            }
            SoilState::ClosedNoHint => {
                self.state = SoilState::ClosedHintShown;
                self.face = SoilFace::HintStone;
                scene.set_sprite(self.visual, Sprite::HintStone);
                HintOutcome::StoneShown
            }
        }
    }

    pub fn dispose(&self, scene: &mut dyn Scene) {
        scene.dispose(self.visual);
    }

    fn show_content(&mut self, scene: &mut dyn Scene) {
        match self.kind {
            SoilKind::Nothing => self.hide(scene),
            kind => {
                self.face = SoilFace::Content;
                scene.set_sprite(self.visual, Sprite::Ore(kind));
            }
        }
    }

    fn hide(&mut self, scene: &mut dyn Scene) {
        self.face = SoilFace::Hidden;
        scene.set_visible(self.visual, false);
    }
}

/// All soil tiles of a stage, stored column-major.
#[derive(Clone, Debug, Default)]
pub struct SoilField {
    columns: Vec<Vec<Soil>>,
}

impl SoilField {
    /// Builds every tile of `grid`, asking `content` for each kind.
    pub fn build(
        grid: &Grid,
        scene: &mut dyn Scene,
        mut content: impl FnMut(SoilIndex) -> SoilKind,
    ) -> Self {
        let rows = grid.shaft_depth() as usize;
        let columns = (0..grid.shaft_width())
            .map(|col| {
                (0..rows)
                    .map(|row| {
                        let index = SoilIndex::new(col, row);
                        let origin = Vec3::at_cell(grid.soil_position(index), 0.0);
                        Soil::new(content(index), origin, scene)
                    })
                    .collect()
            })
            .collect();
        SoilField { columns }
    }

    pub fn get(&self, index: SoilIndex) -> Option<&Soil> {
        self.columns.get(index.col).and_then(|c| c.get(index.row))
    }

    pub fn get_mut(&mut self, index: SoilIndex) -> Option<&mut Soil> {
        self.columns.get_mut(index.col).and_then(|c| c.get_mut(index.row))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SoilIndex, &Soil)> {
        self.columns.iter().enumerate().flat_map(|(col, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, soil)| (SoilIndex::new(col, row), soil))
        })
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn dispose(&self, scene: &mut dyn Scene) {
        for (_, soil) in self.iter() {
            soil.dispose(scene);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scene::testing::RecordingScene;

    fn tile(kind: SoilKind) -> (Soil, RecordingScene) {
        let mut scene = RecordingScene::new();
        let soil = Soil::new(kind, Vec3::new(1.6, -5.0, 0.0), &mut scene);
        (soil, scene)
    }

    #[test]
    fn content_table_thresholds() {
        assert_eq!(SoilKind::from_percentile(0), SoilKind::Platinum);
        assert_eq!(SoilKind::from_percentile(3), SoilKind::Platinum);
        assert_eq!(SoilKind::from_percentile(4), SoilKind::Gold);
        assert_eq!(SoilKind::from_percentile(9), SoilKind::Gold);
        assert_eq!(SoilKind::from_percentile(10), SoilKind::Silver);
        assert_eq!(SoilKind::from_percentile(15), SoilKind::Sandstone);
        assert_eq!(SoilKind::from_percentile(29), SoilKind::Sandstone);
        assert_eq!(SoilKind::from_percentile(30), SoilKind::Water);
        assert_eq!(SoilKind::from_percentile(33), SoilKind::Granite);
        assert_eq!(SoilKind::from_percentile(39), SoilKind::Granite);
        assert_eq!(SoilKind::from_percentile(40), SoilKind::Nothing);
        assert_eq!(SoilKind::from_percentile(SoilKind::PERCENTILE_MAX), SoilKind::Nothing);
    }

    #[test]
    fn content_table_share_of_nothing() {
        let nothing = (0..=SoilKind::PERCENTILE_MAX)
            .filter(|&p| SoilKind::from_percentile(p) == SoilKind::Nothing)
            .count();
        assert_eq!(nothing, 61);
    }

    #[test]
    fn enterability_by_kind() {
        assert!(SoilKind::Nothing.is_enterable());
        assert!(SoilKind::Sandstone.is_enterable());
        assert!(SoilKind::Silver.is_enterable());
        assert!(SoilKind::Gold.is_enterable());
        assert!(SoilKind::Platinum.is_enterable());
        assert!(!SoilKind::Water.is_enterable());
        assert!(!SoilKind::Granite.is_enterable());
    }

    #[test]
    fn open_reveals_and_pushes_back() {
        let (mut soil, mut scene) = tile(SoilKind::Gold);
        assert!(soil.is_closed());
        soil.open(&mut scene);
        assert!(!soil.is_closed());
        assert_eq!(soil.face(), SoilFace::Content);
        let entry = scene.get(soil.visual()).unwrap();
        assert_eq!(entry.sprite, Sprite::Ore(SoilKind::Gold));
        assert!(entry.position.z > 0.7);
    }

    #[test]
    fn open_obstacle_stays_in_front() {
        let (mut soil, mut scene) = tile(SoilKind::Granite);
        soil.open(&mut scene);
        let entry = scene.get(soil.visual()).unwrap();
        assert_eq!(entry.sprite, Sprite::Ore(SoilKind::Granite));
        assert_eq!(entry.position.z, 0.0);
        assert!(entry.visible);
    }

    #[test]
    fn open_nothing_hides_tile() {
        let (mut soil, mut scene) = tile(SoilKind::Nothing);
        soil.open(&mut scene);
        assert_eq!(soil.face(), SoilFace::Hidden);
        assert!(!scene.get(soil.visual()).unwrap().visible);
    }

    #[test]
    fn clear_is_idempotent() {
        let (mut soil, mut scene) = tile(SoilKind::Silver);
        soil.open(&mut scene);
        soil.clear(&mut scene);
        let once = (soil.face(), scene.get(soil.visual()).unwrap().visible);
        soil.clear(&mut scene);
        soil.clear(&mut scene);
        let thrice = (soil.face(), scene.get(soil.visual()).unwrap().visible);
        assert_eq!(once, thrice);
        assert_eq!(once, (SoilFace::Hidden, false));
    }

    #[test]
    fn clear_keeps_obstacles_visible() {
        for kind in [SoilKind::Water, SoilKind::Granite] {
            let (mut soil, mut scene) = tile(kind);
            soil.open(&mut scene);
            soil.clear(&mut scene);
            assert_eq!(soil.face(), SoilFace::Content);
            assert!(scene.get(soil.visual()).unwrap().visible);
        }
    }

    #[test]
    fn hint_twice_reveals_but_stays_closed() {
        let (mut soil, mut scene) = tile(SoilKind::Platinum);
        assert_eq!(soil.trigger_hint(&mut scene), HintOutcome::StoneShown);
        assert!(soil.hint_shown());
        assert_eq!(scene.get(soil.visual()).unwrap().sprite, Sprite::HintStone);

        assert_eq!(soil.trigger_hint(&mut scene), HintOutcome::ContentRevealed);
        assert!(soil.is_closed());
        assert_eq!(soil.face(), SoilFace::Content);
        assert_eq!(scene.get(soil.visual()).unwrap().sprite, Sprite::Ore(SoilKind::Platinum));
    }

    #[test]
    fn hint_on_opened_tile_is_noop() {
        let (mut soil, mut scene) = tile(SoilKind::Sandstone);
        soil.open(&mut scene);
        assert_eq!(soil.trigger_hint(&mut scene), HintOutcome::Ignored);
        assert!(!soil.is_closed());
        assert!(!soil.hint_shown());
    }

    #[test]
    fn opened_never_closes_again() {
        let (mut soil, mut scene) = tile(SoilKind::Gold);
        soil.trigger_hint(&mut scene);
        soil.open(&mut scene);
        soil.clear(&mut scene);
        soil.trigger_hint(&mut scene);
        soil.open(&mut scene);
        assert_eq!(soil.state(), SoilState::Opened);
    }

    #[test]
    fn field_covers_whole_shaft() {
        let grid = Grid::new(35, 30);
        let mut scene = RecordingScene::new();
        let field = SoilField::build(&grid, &mut scene, |_| SoilKind::Sandstone);
        assert_eq!(field.len(), 34 * 30);
        assert!(field.get(SoilIndex::new(33, 29)).is_some());
        assert!(field.get(SoilIndex::new(34, 0)).is_none());
        assert!(field.get(SoilIndex::new(0, 30)).is_none());
        assert_eq!(scene.len(), 34 * 30);
    }
}
