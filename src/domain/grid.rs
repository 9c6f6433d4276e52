//! Grid coordinate model.
//!
//! Logical positions are `(x, y)` cells:
//!   - `y = 0`  is the town row (surface)
//!   - `y = -1` is the ground line (solid, only the elevator column passes)
//!   - `y <= SOIL_OFFSET_Y` is the soil shaft, growing downward
//!
//! The shaft covers columns `0 ..= level_width - 2`; the last column is the
//! elevator lane. Everything here is pure: no state is mutated.

/// Row of the town surface.
pub const SURFACE_ROW: i32 = 0;

/// First diggable row, relative to the surface.
pub const SOIL_OFFSET_Y: i32 = -2;

/// Accepted dimension ranges; the config loader rejects anything outside.
pub const LEVEL_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 3..=256;
pub const SHAFT_DEPTH_RANGE: std::ops::RangeInclusive<u32> = 1..=256;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Input poll order: the first requested direction wins.
    pub const POLL_ORDER: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
    ];

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Unit step in grid space (`y` grows upward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    pub fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        Pos::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Column/row into the soil field. `row` counts downward from the first
/// diggable row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SoilIndex {
    pub col: usize,
    pub row: usize,
}

impl SoilIndex {
    pub const fn new(col: usize, row: usize) -> Self {
        SoilIndex { col, row }
    }
}

/// Fixed grid dimensions of one stage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Grid {
    level_width: i32,
    shaft_depth: i32,
}

impl Grid {
    /// Dimensions are clamped into `LEVEL_WIDTH_RANGE` / `SHAFT_DEPTH_RANGE`;
    /// a validated config never needs it.
    pub fn new(level_width: u32, shaft_depth: u32) -> Self {
        Grid {
            level_width: clamp_dimension(level_width, &LEVEL_WIDTH_RANGE),
            shaft_depth: clamp_dimension(shaft_depth, &SHAFT_DEPTH_RANGE),
        }
    }

    pub fn level_width(&self) -> i32 {
        self.level_width
    }

    pub fn shaft_depth(&self) -> i32 {
        self.shaft_depth
    }

    /// Number of soil columns (every column but the elevator lane).
    pub fn shaft_width(&self) -> usize {
        (self.level_width - 1) as usize
    }

    pub fn elevator_column(&self) -> i32 {
        self.level_width - 1
    }

    pub fn is_elevator_column(&self, x: i32) -> bool {
        x == self.elevator_column()
    }

    /// The solid row between town and shaft.
    pub fn ground_row(&self) -> i32 {
        SURFACE_ROW - 1
    }

    pub fn soil_top_row(&self) -> i32 {
        SOIL_OFFSET_Y
    }

    /// Deepest row a player can stand on.
    pub fn bottom_row(&self) -> i32 {
        SOIL_OFFSET_Y - self.shaft_depth + 1
    }

    /// Is `pos` a cell the player may occupy at all?
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= 0
            && pos.x < self.level_width
            && pos.y <= SURFACE_ROW
            && pos.y >= self.bottom_row()
    }

    pub fn is_inside_shaft(&self, pos: Pos) -> bool {
        pos.x >= 0
            && pos.x < self.level_width - 1
            && pos.y > SOIL_OFFSET_Y - self.shaft_depth
            && pos.y <= SOIL_OFFSET_Y
    }

    /// Soil index under `pos`, or `None` on the surface, the ground line,
    /// the elevator lane and anywhere off the grid.
    pub fn to_soil_index(&self, pos: Pos) -> Option<SoilIndex> {
        if !self.is_inside_shaft(pos) {
            return None;
        }
        Some(SoilIndex::new(pos.x as usize, (SOIL_OFFSET_Y - pos.y) as usize))
    }

    /// Inverse of [`Grid::to_soil_index`].
    pub fn soil_position(&self, index: SoilIndex) -> Pos {
        Pos::new(index.col as i32, SOIL_OFFSET_Y - index.row as i32)
    }
}

fn clamp_dimension(value: u32, range: &std::ops::RangeInclusive<u32>) -> i32 {
    let clamped = value.clamp(*range.start(), *range.end());
    i32::try_from(clamped).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(35, 30)
    }

    #[test]
    fn shaft_band_bounds() {
        let g = grid();
        assert!(g.is_inside_shaft(Pos::new(0, -2)));
        assert!(g.is_inside_shaft(Pos::new(33, -31)));
        // ground line and surface are not soil
        assert!(!g.is_inside_shaft(Pos::new(5, -1)));
        assert!(!g.is_inside_shaft(Pos::new(5, 0)));
        // below the deepest row
        assert!(!g.is_inside_shaft(Pos::new(5, -32)));
        // elevator lane
        assert!(!g.is_inside_shaft(Pos::new(34, -10)));
        assert!(!g.is_inside_shaft(Pos::new(-1, -10)));
    }

    #[test]
    fn soil_index_counts_down_from_offset() {
        let g = grid();
        assert_eq!(g.to_soil_index(Pos::new(4, -2)), Some(SoilIndex::new(4, 0)));
        assert_eq!(g.to_soil_index(Pos::new(4, -31)), Some(SoilIndex::new(4, 29)));
        assert_eq!(g.to_soil_index(Pos::new(4, 0)), None);
        assert_eq!(g.to_soil_index(Pos::new(34, -5)), None);
    }

    #[test]
    fn soil_position_inverts_index() {
        let g = grid();
        for pos in [Pos::new(0, -2), Pos::new(12, -17), Pos::new(33, -31)] {
            let idx = g.to_soil_index(pos).unwrap();
            assert_eq!(g.soil_position(idx), pos);
        }
    }

    #[test]
    fn rows_and_columns() {
        let g = grid();
        assert_eq!(g.elevator_column(), 34);
        assert!(g.is_elevator_column(34));
        assert!(!g.is_elevator_column(33));
        assert_eq!(g.ground_row(), -1);
        assert_eq!(g.soil_top_row(), -2);
        assert_eq!(g.bottom_row(), -31);
        assert_eq!(g.shaft_width(), 34);
    }

    #[test]
    fn contains_whole_playfield() {
        let g = grid();
        assert!(g.contains(Pos::new(0, 0)));
        assert!(g.contains(Pos::new(34, -1)));
        assert!(g.contains(Pos::new(34, -31)));
        assert!(!g.contains(Pos::new(35, 0)));
        assert!(!g.contains(Pos::new(0, 1)));
        assert!(!g.contains(Pos::new(0, -32)));
    }

    #[test]
    fn step_follows_delta() {
        let p = Pos::new(3, -4);
        assert_eq!(p.step(Direction::Down), Pos::new(3, -5));
        assert_eq!(p.step(Direction::Up), Pos::new(3, -3));
        assert_eq!(p.step(Direction::Left), Pos::new(2, -4));
        assert_eq!(p.step(Direction::Right), Pos::new(4, -4));
        assert!(Direction::Up.is_vertical());
        assert!(!Direction::Left.is_vertical());
    }

    #[test]
    fn oversized_dimensions_are_clamped() {
        let g = Grid::new(u32::MAX, 2_147_483_648);
        assert_eq!(g.level_width(), 256);
        assert_eq!(g.shaft_depth(), 256);
        assert_eq!(g.shaft_width(), 255);
        assert_eq!(g.bottom_row(), SOIL_OFFSET_Y - 255);

        let tiny = Grid::new(0, 0);
        assert_eq!(tiny.level_width(), 3);
        assert_eq!(tiny.shaft_depth(), 1);
    }
}
