//! Sprite table: the scene the stage writes into and the renderer reads.
//! Slots are reused after dispose; ids stay unique per live sprite.

use crate::domain::scene::{Scene, Sprite, Vec3, VisualId};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SpriteEntry {
    pub sprite: Sprite,
    pub position: Vec3,
    pub visible: bool,
}

#[derive(Default, Debug)]
pub struct SpriteTable {
    slots: Vec<Option<SpriteEntry>>,
    free: Vec<u32>,
    live: usize,
}

impl SpriteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: VisualId) -> Option<&SpriteEntry> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: VisualId) -> Option<&mut SpriteEntry> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Number of live sprites.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Visible sprites, back to front.
    pub fn draw_order(&self) -> Vec<&SpriteEntry> {
        let mut visible: Vec<&SpriteEntry> = self
            .slots
            .iter()
            .flatten()
            .filter(|e| e.visible)
            .collect();
        visible.sort_by(|a, b| b.position.z.total_cmp(&a.position.z));
        visible
    }
}

impl Scene for SpriteTable {
    fn create(&mut self, sprite: Sprite, position: Vec3) -> VisualId {
        let entry = SpriteEntry { sprite, position, visible: true };
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(entry);
                VisualId(slot)
            }
            None => {
                self.slots.push(Some(entry));
                VisualId((self.slots.len() - 1) as u32)
            }
        }
    }

    fn set_position(&mut self, id: VisualId, position: Vec3) {
        if let Some(e) = self.get_mut(id) {
            e.position = position;
        }
    }

    fn set_visible(&mut self, id: VisualId, visible: bool) {
        if let Some(e) = self.get_mut(id) {
            e.visible = visible;
        }
    }

    fn set_sprite(&mut self, id: VisualId, sprite: Sprite) {
        if let Some(e) = self.get_mut(id) {
            e.sprite = sprite;
        }
    }

    fn dispose(&mut self, id: VisualId) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            if slot.take().is_some() {
                self.free.push(id.0);
                self.live -= 1;
            }
        }
    }
}
