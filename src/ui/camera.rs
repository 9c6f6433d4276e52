//! Camera: a viewport into the stage, in map cells.
//!
//! Map rows count downward from the sky: map row 0 is `SKY_ROW`, so the
//! miner's grid `y` converts with `SKY_ROW - y`. The camera follows the
//! miner with a dead zone and draws each cell at `scale` (1 or 2) to
//! reflect the field of view.

/// Highest grid row that holds anything (the upper bird).
pub const SKY_ROW: i32 = 2;

#[derive(Clone, Debug, Default)]
pub struct Camera {
    /// Map column of the left-most visible cell (negative when centering)
    pub x: i32,
    /// Map row of the top visible cell
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
    /// Terminal cells per map cell, vertically; horizontally it is doubled.
    pub scale: usize,
}

impl Camera {
    pub fn new() -> Self {
        Camera { scale: 2, ..Default::default() }
    }

    /// Picks the cell scale for a field of view: close-up until the view
    /// has widened past the midpoint toward `max_zoom`.
    pub fn scale_for(fov: f32, default_fov: f32, max_zoom: f32) -> usize {
        if fov < (default_fov + max_zoom) / 2.0 { 2 } else { 1 }
    }

    /// Fits the viewport to a terminal area of `cols` x `rows` characters.
    pub fn resize(&mut self, cols: usize, rows: usize, scale: usize) {
        self.scale = scale.max(1);
        self.view_w = cols / (2 * self.scale);
        self.view_h = rows / self.scale;
    }

    pub fn map_row(grid_y: i32) -> i32 {
        SKY_ROW - grid_y
    }

    /// Dead-zone follow: only scroll when the target nears the edge.
    pub fn follow(&mut self, target_x: i32, target_y: i32, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = follow_axis(self.x, target_x, self.view_w, world_w);
        self.y = follow_axis(self.y, target_y, self.view_h, world_h);
    }

    /// Snap camera directly to center on a position (no dead zone).
    pub fn center_on(&mut self, target_x: i32, target_y: i32, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(target_x, self.view_w, world_w);
        self.y = center_axis(target_y, self.view_h, world_h);
    }

    /// Convert map coordinate to viewport coordinate.
    /// Returns None if outside the visible area.
    pub fn world_to_view(&self, wx: i32, wy: i32) -> Option<(usize, usize)> {
        let vx = wx - self.x;
        let vy = wy - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

fn follow_axis(origin: i32, target: i32, view: usize, world: usize) -> i32 {
    let view = view as i32;
    let world = world as i32;
    // map fits: center it
    if world <= view {
        return -((view - world) / 2);
    }
    // 20% margin on each side
    let margin = view / 5;
    let low = origin + margin;
    let high = origin + view - margin - 1;
    let moved = if target < low {
        target - margin
    } else if target > high {
        target - view + margin + 1
    } else {
        origin
    };
    moved.clamp(0, world - view)
}

fn center_axis(target: i32, view: usize, world: usize) -> i32 {
    let view = view as i32;
    let world = world as i32;
    if world <= view {
        return -((view - world) / 2);
    }
    (target - view / 2).clamp(0, world - view)
}
