//! Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use tracing::{error, info};

use config::GameConfig;
use domain::scene::{Scene, TILE_SIZE_X, TILE_SIZE_Y};
use sim::event::StageEvent;
use sim::stage::Stage;
use ui::camera::{Camera, SKY_ROW};
use ui::gamepad::GamepadState;
use ui::input::{ControlState, InputState};
use ui::renderer::{Hud, Renderer};
use ui::sound::{Cue, SoundEngine};
use ui::sprites::SpriteTable;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// What the run achieved, printed after the terminal is restored.
#[derive(Default)]
struct Tally {
    deepest_row: i32,
    tiles_dug: u32,
    treasures: u32,
}

impl Tally {
    fn record(&mut self, event: &StageEvent) {
        match event {
            StageEvent::PlayerMoved { to, .. } => self.deepest_row = self.deepest_row.min(to.y),
            StageEvent::SoilOpened { kind, .. } => {
                self.tiles_dug += 1;
                if kind.is_precious() {
                    self.treasures += 1;
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };

    let config = GameConfig::load();

    let mut sprites = SpriteTable::new();
    let mut rng = rand::thread_rng();
    let mut stage = Stage::build(&config, &mut sprites, &mut rng);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let mut tally = Tally::default();

    let result = game_loop(&mut stage, &mut sprites, &mut renderer, sound.as_ref(), &config, &mut tally);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = &result {
        error!(error = %e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    let ticks = stage.tick_count();
    stage.dispose(&mut sprites);
    info!(ticks, live_sprites = sprites.len(), "shutdown");

    println!();
    println!("Thanks for playing Soil Miner!");
    println!(
        "Deepest row: {}   Tiles dug: {}   Treasures: {}",
        (-tally.deepest_row - 1).max(0),
        tally.tiles_dug,
        tally.treasures,
    );
}

fn game_loop(
    stage: &mut Stage,
    sprites: &mut SpriteTable,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    tally: &mut Tally,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);
    let mut keyboard = InputState::new();
    keyboard.honor_release = renderer.reports_key_release();
    info!(key_release = keyboard.honor_release, "keyboard ready");
    let mut controls = ControlState::new(keyboard, gamepad);
    let mut rng = rand::thread_rng();

    let mut camera = Camera::new();
    let mut centered = false;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        controls.update();

        if controls.quit_pressed() {
            info!("quit requested");
            break;
        }
        if controls.pause_pressed() {
            stage.toggle_pause();
        }

        if last_tick.elapsed() >= tick_rate {
            let events = stage.tick(&mut controls, &mut rng, sprites);
            for event in &events {
                if let StageEvent::ElevatorTracked { position } = event {
                    sprites.set_position(stage.elevator().visual, *position);
                }
                tally.record(event);
            }
            process_sound_events(sound, &events);
            last_tick = Instant::now();
        }

        // Camera follows the miner's drawn position, so it glides with the walk.
        let tuning = stage.tuning();
        let scale = Camera::scale_for(stage.player().field_of_view, tuning.default_fov, tuning.max_zoom);
        let (cols, rows) = renderer.map_area();
        if scale != camera.scale {
            centered = false;
        }
        camera.resize(cols, rows, scale);

        let (focus_x, focus_y) = player_cell(stage, sprites);
        let world_w = stage.grid().level_width().max(0) as usize;
        let world_h = (SKY_ROW - stage.grid().bottom_row() + 1).max(0) as usize;
        if centered {
            camera.follow(focus_x, focus_y, world_w, world_h);
        } else {
            camera.center_on(focus_x, focus_y, world_w, world_h);
            centered = true;
        }

        let player = stage.player();
        let hud = Hud {
            pos: player.pos,
            field_of_view: player.field_of_view,
            zoomed: player.zoomed,
            paused: stage.is_paused(),
            gamepad: controls.gamepad.connected,
        };
        renderer.render(sprites, &camera, &hud)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Map cell under the miner's sprite.
fn player_cell(stage: &Stage, sprites: &SpriteTable) -> (i32, i32) {
    let player = stage.player();
    match sprites.get(player.visual) {
        Some(entry) => (
            (entry.position.x / TILE_SIZE_X).round() as i32,
            Camera::map_row((entry.position.y / TILE_SIZE_Y).round() as i32),
        ),
        None => (player.pos.x, Camera::map_row(player.pos.y)),
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[StageEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for cue in events.iter().filter_map(Cue::for_event) {
        sfx.play(cue);
    }
}
