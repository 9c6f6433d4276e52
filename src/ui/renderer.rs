//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Paint backdrop colors, then every visible sprite back to front,
//!      into the `front` buffer
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! Sprites are placed by snapping their world position to the nearest map
//! cell; a map cell covers `2 * scale` columns and `scale` rows.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Facing;
use crate::domain::grid::Pos;
use crate::domain::scene::{Building, Sprite, TILE_SIZE_X, TILE_SIZE_Y};
use crate::domain::soil::SoilKind;
use super::camera::Camera;
use super::sprites::SpriteTable;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a real cell: forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Draws a glyph char over the existing cell; `bg: None` keeps the
    /// background already there.
    fn paint(&mut self, x: usize, y: usize, ch: char, fg: Color, bg: Option<Color>) {
        let under = self.get(x, y);
        self.set(x, y, Cell { ch, fg, bg: bg.unwrap_or(under.bg) });
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell { ch: ' ', fg: Color::White, bg });
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Option<Color>) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.paint(x + i, y, ch, fg, bg);
        }
    }
}

// ── Sprite glyphs ──

/// Two characters per map cell.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Glyph {
    chars: [char; 2],
    fg: Color,
    bg: Option<Color>,
}

const fn glyph(a: char, b: char, fg: Color, bg: Option<Color>) -> Glyph {
    Glyph { chars: [a, b], fg, bg }
}

const SKY: Color = Color::Rgb { r: 70, g: 120, b: 185 };
const EARTH: Color = Color::Rgb { r: 38, g: 26, b: 18 };
const COVER: Color = Color::Rgb { r: 96, g: 66, b: 38 };
const TUNNEL: Color = Color::Rgb { r: 52, g: 36, b: 24 };

fn glyph_for(sprite: Sprite) -> Glyph {
    match sprite {
        Sprite::Miner(Facing::Left) => glyph('<', '@', Color::Yellow, None),
        Sprite::Miner(Facing::Right) => glyph('@', '>', Color::Yellow, None),
        Sprite::SoilCover => glyph('▒', '▒', Color::Rgb { r: 130, g: 95, b: 60 }, Some(COVER)),
        Sprite::HintStone => glyph('<', '>', Color::White, Some(COVER)),
        Sprite::Ore(kind) => ore_glyph(kind),
        Sprite::Tunnel => glyph(' ', ' ', Color::White, Some(TUNNEL)),
        Sprite::Ground => glyph('▀', '▀', Color::Rgb { r: 110, g: 150, b: 60 }, Some(Color::Rgb { r: 120, g: 84, b: 44 })),
        Sprite::Elevator => glyph('[', ']', Color::White, Some(Color::DarkGrey)),
        Sprite::House(b) => glyph('▓', '▓', house_color(b), None),
        Sprite::Cactus => glyph('Ψ', ' ', Color::Green, None),
        Sprite::Table => glyph('╥', '╥', Color::Rgb { r: 150, g: 100, b: 50 }, None),
        Sprite::Bird => glyph('v', ' ', Color::White, None),
    }
}

fn ore_glyph(kind: SoilKind) -> Glyph {
    match kind {
        SoilKind::Nothing => glyph(' ', ' ', Color::White, Some(TUNNEL)),
        SoilKind::Sandstone => glyph(':', ':', Color::Rgb { r: 215, g: 180, b: 120 }, Some(TUNNEL)),
        SoilKind::Water => glyph('~', '~', Color::Cyan, Some(Color::DarkBlue)),
        SoilKind::Granite => glyph('#', '#', Color::Grey, Some(Color::DarkGrey)),
        SoilKind::Silver => glyph('$', '$', Color::Rgb { r: 200, g: 200, b: 215 }, Some(TUNNEL)),
        SoilKind::Gold => glyph('$', '$', Color::Yellow, Some(TUNNEL)),
        SoilKind::Platinum => glyph('*', '*', Color::Rgb { r: 235, g: 235, b: 255 }, Some(TUNNEL)),
    }
}

fn house_color(b: Building) -> Color {
    match b {
        Building::Bank => Color::Rgb { r: 170, g: 170, b: 150 },
        Building::Hospital => Color::Rgb { r: 225, g: 225, b: 225 },
        Building::Saloon => Color::Rgb { r: 160, g: 90, b: 50 },
        Building::Store => Color::Rgb { r: 130, g: 110, b: 70 },
    }
}

// ── HUD ──

/// Status shown above the map.
#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    pub pos: Pos,
    pub field_of_view: f32,
    pub zoomed: bool,
    pub paused: bool,
    pub gamepad: bool,
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Rows below the map: gap + help bar.
const FOOTER_ROWS: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Keyboard enhancement pushed: the terminal reports key releases.
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_release = true;
        }
        self.sync_size()?;
        Ok(())
    }

    /// Whether key Release events can be trusted for hold tracking.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_release = false;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Terminal area available to the map, in characters.
    pub fn map_area(&self) -> (usize, usize) {
        (self.term_w, self.term_h.saturating_sub(MAP_ROW + FOOTER_ROWS))
    }

    pub fn render(&mut self, sprites: &SpriteTable, camera: &Camera, hud: &Hud) -> io::Result<()> {
        self.sync_size()?;
        self.compose(sprites, camera, hud);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Detect terminal resize and force a full repaint when it happens.
    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, sprites: &SpriteTable, camera: &Camera, hud: &Hud) {
        self.front.clear();
        self.compose_hud(hud);
        self.compose_backdrop(camera);
        for entry in sprites.draw_order() {
            let col = (entry.position.x / TILE_SIZE_X).round() as i32;
            let row = Camera::map_row((entry.position.y / TILE_SIZE_Y).round() as i32);
            match entry.sprite {
                Sprite::House(b) => {
                    let (w, h) = b.footprint();
                    for dy in 0..h as i32 {
                        for dx in 0..w as i32 {
                            self.paint_cell(camera, col + dx, row - dy, glyph_for(entry.sprite));
                        }
                    }
                }
                sprite => self.paint_cell(camera, col, row, glyph_for(sprite)),
            }
        }
        self.compose_footer(camera);
        if hud.paused {
            self.compose_pause_overlay(camera);
        }
    }

    fn compose_hud(&mut self, hud: &Hud) {
        let bar = Color::Rgb { r: 20, g: 20, b: 60 };
        let depth = (-hud.pos.y - 1).max(0);
        let text = format!(
            " SOIL MINER   pos {}   depth {:<3}  fov {:.2}{}{} ",
            hud.pos,
            depth,
            hud.field_of_view,
            if hud.zoomed { "  [zoom]" } else { "" },
            if hud.gamepad { "  [pad]" } else { "" },
        );
        self.front.fill_row(HUD_ROW, bar);
        self.front.put_str(0, HUD_ROW, &text, Color::White, Some(bar));
    }

    /// Sky above the surface, earth below it.
    fn compose_backdrop(&mut self, camera: &Camera) {
        let surface = Camera::map_row(0);
        for vy in 0..camera.view_h {
            let map_row = camera.y + vy as i32;
            let bg = if map_row <= surface { SKY } else { EARTH };
            for vx in 0..camera.view_w {
                self.paint_cell(camera, camera.x + vx as i32, map_row, glyph(' ', ' ', Color::White, Some(bg)));
            }
        }
    }

    fn paint_cell(&mut self, camera: &Camera, col: i32, row: i32, g: Glyph) {
        let Some((vx, vy)) = camera.world_to_view(col, row) else { return };
        let s = camera.scale;
        for sy in 0..s {
            for sx in 0..2 * s {
                let x = vx * 2 * s + sx;
                let y = MAP_ROW + vy * s + sy;
                self.front.paint(x, y, g.chars[sx % 2], g.fg, g.bg);
            }
        }
    }

    fn compose_footer(&mut self, camera: &Camera) {
        let help_row = MAP_ROW + camera.view_h * camera.scale + 1;
        if help_row < self.front.height {
            let help = " ←↑↓→/WASD:Move  Enter:Zoom  Esc:Pause  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, None);
        }
    }

    fn compose_pause_overlay(&mut self, camera: &Camera) {
        let text = "  PAUSED  (Esc to resume)  ";
        let w = text.chars().count();
        let map_w = camera.view_w * 2 * camera.scale;
        let map_h = camera.view_h * camera.scale;
        let x = map_w.saturating_sub(w) / 2;
        let y = MAP_ROW + map_h / 2;
        self.front.put_str(x, y, text, Color::Black, Some(Color::Rgb { r: 200, g: 180, b: 50 }));
    }
}
