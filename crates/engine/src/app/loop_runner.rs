use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::input::{PadState, RawInputFrame};

use super::gamepads::GamepadPoller;
use super::{Renderer, Screen, ScreenCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub gamepads_enabled: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Brawl".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
            gamepads_enabled: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `screen` at a fixed tick rate until it asks to exit
/// or the window closes.
pub fn run_app(config: LoopConfig, mut screen: Box<dyn Screen>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    let mut gamepads = if config.gamepads_enabled {
        GamepadPoller::new()
    } else {
        GamepadPoller::disabled()
    };

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let mut input_collector = InputCollector::default();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        gamepads_enabled = config.gamepads_enabled,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = LoopCounters::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut exiting = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input_collector.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    if exiting {
                        return;
                    }
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    let pads = if step_plan.ticks_to_run > 0 {
                        gamepads.poll()
                    } else {
                        Vec::new()
                    };
                    for _ in 0..step_plan.ticks_to_run {
                        let frame = input_collector.frame_for_tick(&pads);
                        metrics.record_tick();
                        if screen.update(&frame) == ScreenCommand::Exit {
                            info!(reason = "screen_exit", "shutdown_requested");
                            exiting = true;
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }
                    if exiting {
                        return;
                    }

                    if let Err(error) = renderer.render_screen(screen.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    let next_title = screen.debug_title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                    metrics.record_frame();
                    if let Some((fps, tps)) = metrics.maybe_rates(now) {
                        debug!(fps, tps, "loop_metrics");
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                screen.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Accumulates keyboard state between ticks. Escape is edge-triggered into a
/// per-tick cancel pulse, and a key tapped between two ticks still shows as
/// down for the next one.
#[derive(Debug, Default)]
struct InputCollector {
    keys_down: HashSet<KeyCode>,
    pressed_since_tick: HashSet<KeyCode>,
    quit_requested: bool,
    cancel_is_down: bool,
    cancel_pressed_edge: bool,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        self.handle_key_state(code, key_event.state);
    }

    fn handle_key_state(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.keys_down.insert(code);
                self.pressed_since_tick.insert(code);
            }
            ElementState::Released => {
                self.keys_down.remove(&code);
            }
        }
        if code == KeyCode::Escape {
            match state {
                ElementState::Pressed => {
                    if !self.cancel_is_down {
                        self.cancel_pressed_edge = true;
                    }
                    self.cancel_is_down = true;
                }
                ElementState::Released => self.cancel_is_down = false,
            }
        }
    }

    fn release_all(&mut self) {
        self.keys_down.clear();
        self.pressed_since_tick.clear();
        self.cancel_is_down = false;
    }

    fn frame_for_tick(&mut self, pads: &[PadState]) -> RawInputFrame {
        let keys_down = self
            .keys_down
            .union(&self.pressed_since_tick)
            .copied()
            .collect();
        self.pressed_since_tick.clear();
        let frame = RawInputFrame {
            keys_down,
            pads: pads.to_vec(),
            quit_requested: self.quit_requested,
            cancel_pressed: self.cancel_pressed_edge,
        };
        self.cancel_pressed_edge = false;
        frame
    }
}

#[derive(Debug)]
struct LoopCounters {
    interval: Duration,
    window_start: Instant,
    frames: u32,
    ticks: u32,
}

impl LoopCounters {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
            ticks: 0,
        }
    }

    fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    fn maybe_rates(&mut self, now: Instant) -> Option<(f32, f32)> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let rates = (self.frames as f32 / seconds, self.ticks as f32 / seconds);
        self.window_start = now;
        self.frames = 0;
        self.ticks = 0;
        Some(rates)
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
