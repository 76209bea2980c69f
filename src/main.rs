//! Monkey's Bed entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::{PI, TAU};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent};

    use monkey_bed::consts::SIM_DT;
    use monkey_bed::leaderboard::LocalStorageLeaderboard;
    use monkey_bed::session::IdentifierPrompt;
    use monkey_bed::sim::{Particle, TickInput};
    use monkey_bed::tasks::WasmSpawner;
    use monkey_bed::{Phase, Session, Settings, Snapshot, Tuning};

    /// Game instance holding all state
    struct Game {
        session: Session,
        ctx: CanvasRenderingContext2d,
        canvas: HtmlCanvasElement,
        settings: Rc<RefCell<Settings>>,
        input: TickInput,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// Convert a client-space x to field coordinates
        fn client_to_field_x(&self, x: f32) -> f32 {
            let client_w = self.canvas.client_width().max(1) as f32;
            x * self.session.tuning().field_width / client_w
        }

        fn update(&mut self, dt: f32, time: f64) {
            self.session.update(dt, &self.input);

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 && time > oldest_time {
                self.fps = (60000.0 / (time - oldest_time)).round() as u32;
            }
        }

        fn render(&self, time: f64) -> Result<(), JsValue> {
            let snapshot = self.session.snapshot();
            let settings = self.settings.borrow();
            let tuning = self.session.tuning();
            let (w, h) = (tuning.field_width as f64, tuning.field_height as f64);

            let ctx = &self.ctx;
            ctx.set_fill_style_str("#C8E6FF");
            ctx.fill_rect(0.0, 0.0, w, h);

            match snapshot.phase {
                Phase::Start => {
                    draw_text(ctx, "Monkey's Bed", w / 2.0, h / 2.0 - 80.0, 40, true)?;
                    draw_text(
                        ctx,
                        "Move the bed with your mouse to bounce the monkey.",
                        w / 2.0,
                        h / 2.0 - 20.0,
                        20,
                        false,
                    )?;
                    draw_text(ctx, "Collect bananas, avoid obstacles!", w / 2.0, h / 2.0 + 10.0, 20, false)?;
                    draw_button(ctx, "Click to Start", w / 2.0, h / 2.0 + 40.0)?;
                    draw_leaderboard(ctx, &snapshot, w / 2.0, h / 2.0 + 130.0)?;
                }
                Phase::Playing => {
                    draw_bed(ctx, &snapshot);
                    draw_monkey(ctx, &snapshot, &settings)?;
                    for banana in &snapshot.collectibles {
                        draw_banana(ctx, banana)?;
                    }
                    let spin = settings.effective_rotation((time * 0.005) as f32) as f64;
                    for obstacle in &snapshot.hazards {
                        draw_obstacle(ctx, obstacle, spin)?;
                    }
                    ctx.set_text_align("left");
                    ctx.set_fill_style_str("#000000");
                    ctx.set_font("bold 20px Arial");
                    ctx.fill_text(&format!("Score: {}", snapshot.score), 10.0, 30.0)?;
                    if let Some(best) = snapshot.best_score {
                        ctx.set_text_align("right");
                        ctx.fill_text(&format!("Best: {}", best), w - 10.0, 30.0)?;
                        ctx.set_text_align("left");
                    }
                    if settings.show_fps {
                        ctx.set_font("14px Arial");
                        ctx.fill_text(&format!("{} fps", self.fps), 10.0, 50.0)?;
                    }
                }
                Phase::GameOver => {
                    draw_text(ctx, "Game Over", w / 2.0, h / 2.0 - 80.0, 40, true)?;
                    let line = format!("Your Score: {}", snapshot.score);
                    draw_text(ctx, &line, w / 2.0, h / 2.0 - 20.0, 20, false)?;
                    draw_button(ctx, "Play Again", w / 2.0, h / 2.0 + 10.0)?;
                    draw_leaderboard(ctx, &snapshot, w / 2.0, h / 2.0 + 100.0)?;
                }
            }
            Ok(())
        }
    }

    fn draw_text(
        ctx: &CanvasRenderingContext2d,
        text: &str,
        x: f64,
        y: f64,
        size: u32,
        bold: bool,
    ) -> Result<(), JsValue> {
        ctx.set_fill_style_str("#333333");
        ctx.set_font(&format!("{}{}px Arial", if bold { "bold " } else { "" }, size));
        ctx.set_text_align("center");
        ctx.fill_text(text, x, y)
    }

    fn draw_button(ctx: &CanvasRenderingContext2d, label: &str, cx: f64, top: f64) -> Result<(), JsValue> {
        ctx.set_fill_style_str("#009600");
        ctx.fill_rect(cx - 100.0, top, 200.0, 50.0);
        ctx.set_fill_style_str("#FFFFFF");
        ctx.set_font("20px Arial");
        ctx.set_text_align("center");
        ctx.fill_text(label, cx, top + 30.0)
    }

    fn draw_leaderboard(
        ctx: &CanvasRenderingContext2d,
        snapshot: &Snapshot,
        cx: f64,
        top: f64,
    ) -> Result<(), JsValue> {
        draw_text(ctx, "Leaderboard", cx, top, 18, true)?;
        if snapshot.leaderboard.is_empty() {
            return draw_text(ctx, "No scores yet", cx, top + 20.0, 14, false);
        }
        for (i, entry) in snapshot.leaderboard.iter().enumerate() {
            let line = format!("{}. {} - {}", i + 1, entry.identifier, entry.score);
            draw_text(ctx, &line, cx, top + 20.0 + i as f64 * 20.0, 14, false)?;
        }
        Ok(())
    }

    fn draw_bed(ctx: &CanvasRenderingContext2d, snapshot: &Snapshot) {
        let bed = &snapshot.bed;
        let (left, top) = (bed.left() as f64, bed.y as f64);
        let (width, height) = (bed.width as f64, bed.height as f64);
        // Mattress
        ctx.set_fill_style_str("#6464FF");
        ctx.fill_rect(left, top, width, height);
        // Legs
        ctx.set_fill_style_str("#8B4513");
        ctx.fill_rect(left + 5.0, top + height, 10.0, 15.0);
        ctx.fill_rect(left + width - 15.0, top + height, 10.0, 15.0);
    }

    fn draw_monkey(
        ctx: &CanvasRenderingContext2d,
        snapshot: &Snapshot,
        settings: &Settings,
    ) -> Result<(), JsValue> {
        let monkey = &snapshot.monkey;
        let r = monkey.radius as f64;

        ctx.save();
        ctx.translate(monkey.pos.x as f64, monkey.pos.y as f64)?;
        ctx.rotate(settings.effective_rotation(monkey.rotation) as f64)?;

        fill_circle(ctx, 0.0, 0.0, r, "#966432")?; // Fur
        fill_circle(ctx, 0.0, -r / 2.0, r * 0.7, "#C8A064")?; // Face
        for side in [-1.0, 1.0] {
            fill_circle(ctx, side * r / 3.0, -r / 1.5, r / 4.0, "#FFFFFF")?;
            fill_circle(ctx, side * r / 3.0, -r / 1.5, r / 8.0, "#000000")?;
        }
        ctx.set_stroke_style_str("#000000");
        ctx.begin_path();
        ctx.arc(0.0, 0.0, r / 2.0, 0.0, PI)?; // Mouth
        ctx.stroke();

        ctx.restore();
        Ok(())
    }

    fn draw_banana(ctx: &CanvasRenderingContext2d, banana: &Particle) -> Result<(), JsValue> {
        let s = banana.size as f64;
        ctx.save();
        ctx.translate(banana.pos.x as f64, banana.pos.y as f64)?;
        ctx.rotate(PI / 4.0)?;
        ctx.set_fill_style_str("#FFFF00");
        ctx.begin_path();
        ctx.move_to(-s / 2.0, s / 4.0);
        ctx.quadratic_curve_to(0.0, -s / 2.0, s / 2.0, s / 4.0);
        ctx.quadratic_curve_to(0.0, s / 2.0, -s / 2.0, s / 4.0);
        ctx.fill();
        ctx.restore();
        Ok(())
    }

    fn draw_obstacle(ctx: &CanvasRenderingContext2d, obstacle: &Particle, spin: f64) -> Result<(), JsValue> {
        let s = obstacle.size as f64;
        ctx.save();
        ctx.translate(obstacle.pos.x as f64, obstacle.pos.y as f64)?;
        ctx.rotate(spin)?;
        ctx.set_fill_style_str("#FF0000");
        ctx.begin_path();
        ctx.move_to(0.0, -s / 2.0);
        ctx.line_to(-s / 2.0, s / 2.0);
        ctx.line_to(s / 2.0, s / 2.0);
        ctx.close_path();
        ctx.fill();
        ctx.restore();
        Ok(())
    }

    fn fill_circle(
        ctx: &CanvasRenderingContext2d,
        x: f64,
        y: f64,
        r: f64,
        color: &str,
    ) -> Result<(), JsValue> {
        ctx.set_fill_style_str(color);
        ctx.begin_path();
        ctx.arc(x, y, r, 0.0, TAU)?;
        ctx.fill();
        Ok(())
    }

    /// Ask for the player's email with `window.prompt`
    fn browser_prompt(settings: Rc<RefCell<Settings>>) -> IdentifierPrompt {
        Box::new(move |score| {
            let window = web_sys::window()?;
            let default = settings.borrow().prompt_default().to_string();
            let message = format!("You scored {score}! Enter your email to save your score:");
            let answer = window
                .prompt_with_message_and_default(&message, &default)
                .ok()
                .flatten()?;

            let mut settings = settings.borrow_mut();
            settings.remember(&answer);
            settings.save();
            Some(answer)
        })
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Monkey's Bed starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let tuning = Tuning::default();
        canvas.set_width(tuning.field_width as u32);
        canvas.set_height(tuning.field_height as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let settings = Rc::new(RefCell::new(Settings::load()));
        let seed = js_sys::Date::now() as u64;
        let session = Session::new(
            tuning,
            Rc::new(LocalStorageLeaderboard),
            Rc::new(WasmSpawner),
            browser_prompt(Rc::clone(&settings)),
            seed,
        );
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            ctx,
            canvas: canvas.clone(),
            settings,
            input: TickInput::default(),
            last_time: 0.0,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        setup_input_handlers(&canvas, Rc::clone(&game));
        request_animation_frame(game);

        log::info!("Monkey's Bed running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move - bed follows the pointer
        {
            let game = Rc::clone(&game);
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let x = g.client_to_field_x(event.offset_x() as f32);
                g.input.target_x = Some(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click - start / play again
        {
            let game = Rc::clone(&game);
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().session.start();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move / start
        for event_name in ["touchmove", "touchstart"] {
            let game = Rc::clone(&game);
            let canvas_clone = canvas.clone();
            let starts = event_name == "touchstart";
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let x = g.client_to_field_x(x);
                    g.input.target_x = Some(x);
                }
                if starts {
                    g.session.start();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            if let Err(e) = g.render(time) {
                log::warn!("Render error: {:?}", e);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native_demo {
    use std::rc::Rc;

    use monkey_bed::consts::{SIM_DT, SIM_HZ};
    use monkey_bed::sim::TickInput;
    use monkey_bed::tasks::TokioSpawner;
    use monkey_bed::{MemoryLeaderboard, Phase, Session, Tuning};

    /// Demo runs are cut off after this long (simulated)
    const MAX_RUN_SECS: u32 = 120;
    const DEMO_RUNS: u32 = 3;

    /// Play a few autopilot runs. Must run inside a tokio `LocalSet`.
    pub async fn run(tuning: Tuning) {
        let store = MemoryLeaderboard::new();
        let mut player = 0;
        let mut session = Session::new(
            tuning,
            Rc::new(store.clone()),
            Rc::new(TokioSpawner),
            Box::new(move |_score| {
                player += 1;
                Some(format!("autopilot{player}@example.com"))
            }),
            0x5EED,
        );

        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        for run in 1..=DEMO_RUNS {
            // Let the leaderboard tasks catch up between runs
            tokio::task::yield_now().await;
            session.start();

            let mut frames = 0;
            while session.phase() == Phase::Playing && frames < MAX_RUN_SECS * SIM_HZ {
                session.update(SIM_DT, &input);
                tokio::task::yield_now().await;
                frames += 1;
            }
            match session.last_loss() {
                Some(cause) => log::info!(
                    "Run {}: {:?} after {:.1}s, score {}",
                    run,
                    cause,
                    frames as f32 * SIM_DT,
                    session.score()
                ),
                None => log::info!(
                    "Run {}: still bouncing after {}s, score {}",
                    run,
                    MAX_RUN_SECS,
                    session.score()
                ),
            }
        }
        tokio::task::yield_now().await;

        let standings = session.standings();
        log::info!(
            "Leaderboard ({} of {} scores):",
            standings.entries.len(),
            store.entries().len()
        );
        for (i, entry) in standings.entries.iter().enumerate() {
            log::info!("{:>2}. {} - {}", i + 1, entry.identifier, entry.score);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use monkey_bed::Tuning;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Monkey's Bed (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - run with `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Bad tuning file {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    // Leaderboard tasks are !Send, so they run on a LocalSet
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Could not start runtime: {}", e);
            std::process::exit(1);
        }
    };
    tokio::task::LocalSet::new().block_on(&runtime, native_demo::run(tuning));
}
