use log::{info, warn};
use macroquad::prelude::*;

use walkcycle::catalog::{AnimationCatalog, View, LOOP_DOWN, LOOP_DOWN_LEFT, LOOP_DOWN_RIGHT, LOOP_LEFT, LOOP_RIGHT, LOOP_UP, LOOP_UP_LEFT, LOOP_UP_RIGHT};
use walkcycle::command_log::{Command, CommandLog};
use walkcycle::config::Config;
use walkcycle::controller::MovementController;
use walkcycle::plan::WalkSpeed;
use walkcycle::{Character, WalkableMask};

const WALK_VIEW: usize = 0;
const IDLE_VIEW: usize = 1;

/// Unit vector drawn to show which way a loop faces
fn loop_heading(loop_index: usize) -> (f32, f32) {
    const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
    match loop_index {
        LOOP_DOWN => (0.0, 1.0),
        LOOP_LEFT => (-1.0, 0.0),
        LOOP_RIGHT => (1.0, 0.0),
        LOOP_UP => (0.0, -1.0),
        LOOP_DOWN_RIGHT => (D, D),
        LOOP_UP_RIGHT => (D, -D),
        LOOP_DOWN_LEFT => (-D, D),
        LOOP_UP_LEFT => (-D, -D),
        _ => (0.0, 0.0),
    }
}

/// Visualization state
struct DemoState {
    controller: MovementController,
    log: CommandLog,
    selected: usize,
    background: Color,
}

impl DemoState {
    fn new(config: &Config) -> Self {
        let catalog = AnimationCatalog::new(vec![View::walking(8, 5, 0), View::walking(8, 3, 4)]);
        let mask = WalkableMask::new(config.room.rows, config.room.cols, config.room.cell_width, config.room.cell_height);
        let mut controller = MovementController::with_grid_pathfinder(config.movement.clone(), catalog, mask, 0);

        let spots = [("Ego", 4, 4), ("Pal", config.room.cols - 5, config.room.rows - 5)];
        for (name, cx, cy) in spots {
            let center = controller.mask().cell_center(cx, cy);
            let mut ch = Character::new(0, name, WALK_VIEW, center.x, center.y, 0);
            ch.walk_speed = WalkSpeed::uniform(config.characters.walk_speed);
            ch.anim_speed = config.characters.anim_speed;
            ch.blocking_width = config.characters.blocking_width;
            ch.blocking_height = config.characters.blocking_height;
            ch.set_idle_view(Some(IDLE_VIEW), 5);
            controller.add_character(ch);
        }

        DemoState {
            controller,
            log: CommandLog::new(),
            selected: 0,
            background: Color::from_rgba(config.visual.background_r, config.visual.background_g, config.visual.background_b, 255),
        }
    }

    fn issue(&mut self, command: Command) {
        if let Err(e) = self.log.issue(&mut self.controller, command) {
            warn!("Command rejected: {}", e);
        }
    }

    /// Screen pixels per room unit
    fn scale(&self) -> f32 {
        let mask = self.controller.mask();
        (screen_width() / mask.width() as f32).min(screen_height() / mask.height() as f32)
    }

    fn mouse_room_position(&self) -> (i32, i32) {
        let (mx, my) = mouse_position();
        let scale = self.scale();
        ((mx / scale) as i32, (my / scale) as i32)
    }

    fn handle_input(&mut self) {
        let (x, y) = self.mouse_room_position();
        let id = self.selected;

        if is_mouse_button_pressed(MouseButton::Left) {
            self.issue(Command::Walk { id, x, y, ignore_walkable: false });
        } else if is_mouse_button_pressed(MouseButton::Right) {
            let mask = self.controller.mask();
            let (cx, cy) = mask.cell_of(walkcycle::Point::new(x, y));
            let blocked = !mask.is_blocked(cx, cy);
            self.issue(Command::SetCell { x: cx, y: cy, blocked });
        }

        if is_key_pressed(KeyCode::Tab) {
            self.selected = (self.selected + 1) % self.controller.characters().len().max(1);
        }
        if is_key_pressed(KeyCode::M) {
            self.issue(Command::Move { id, x, y, ignore_walkable: false });
        }
        if is_key_pressed(KeyCode::L) {
            self.issue(Command::WalkStraight { id, x, y });
        }
        if is_key_pressed(KeyCode::W) {
            self.issue(Command::AddWaypoint { id, x, y });
        }
        if is_key_pressed(KeyCode::S) {
            self.issue(Command::Stop { id });
        }
        if is_key_pressed(KeyCode::F) {
            self.issue(Command::FaceLocation { id, x, y });
        }
        if is_key_pressed(KeyCode::C) {
            let other = (id + 1) % self.controller.characters().len().max(1);
            self.issue(Command::FaceCharacter { id, other });
        }
    }

    fn draw(&self) {
        clear_background(self.background);
        let scale = self.scale();
        let mask = self.controller.mask();

        for y in 0..mask.rows {
            for x in 0..mask.cols {
                let px = (x * mask.cell_width) as f32 * scale;
                let py = (y * mask.cell_height) as f32 * scale;
                let color = if mask.is_blocked(x, y) {
                    RED
                } else {
                    Color::from_rgba(60, 60, 60, 255)
                };
                draw_rectangle(px, py, mask.cell_width as f32 * scale - 1.0, mask.cell_height as f32 * scale - 1.0, color);
            }
        }

        for ch in self.controller.characters() {
            if let Some(plan) = &ch.plan {
                let mut from = ch.position();
                for &point in plan.waypoints().iter().skip(plan.current_stage() + 1) {
                    draw_line(from.x as f32 * scale, from.y as f32 * scale, point.x as f32 * scale, point.y as f32 * scale, 1.0, YELLOW);
                    from = point;
                }
            }

            let (px, py) = (ch.x as f32 * scale, ch.y as f32 * scale);
            let color = if ch.id == self.selected { BLUE } else { GREEN };
            let radius = 0.4 * mask.cell_width as f32 * scale;
            draw_circle(px, py, radius, color);
            let (hx, hy) = loop_heading(ch.loop_index);
            draw_line(px, py, px + hx * radius * 1.5, py + hy * radius * 1.5, 2.0, WHITE);
            draw_text(&format!("{} f{}", ch.name, ch.frame), px + radius, py - radius, 16.0, WHITE);
        }

        let info = format!(
            "Tick: {}\nLeft click: walk | Right click: toggle wall\nM: move | L: walk straight | W: add waypoint | S: stop\nF: face mouse | C: face other | Tab: select\nEsc: close window",
            self.controller.tick()
        );
        draw_multiline_text(&info, 10.0, 20.0, 18.0, None, WHITE);
    }
}

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title,
        window_width: 960,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let config = Config::load();
    let mut state = DemoState::new(&config);
    info!("Started with {} characters", state.controller.characters().len());

    loop {
        state.handle_input();

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.controller.step_all_characters();
        state.draw();

        next_frame().await
    }

    if config.logging.enable_command_log {
        match state.log.save_to_file(&config.logging.command_log_path) {
            Ok(()) => info!("Saved {} commands to {}", state.log.len(), config.logging.command_log_path),
            Err(e) => warn!("Failed to save command log: {}", e),
        }
        info!("{}", state.log.summary());
    }
}
