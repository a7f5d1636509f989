//! Preview host: a window driving the installation with a simulated hand.
//!
//! ```text
//! glimmer [--config <path>] [--seed <n>] [--fixed-fps <n>]
//! ```
//!
//! Keys `1` (open hand), `2` (fist) and `0` (no hand) pick what the
//! simulated camera sees; the window title shows the status line, the
//! LIVE/PAUSED badge, the burst amount and the frame rate. `--fixed-fps`
//! steps the scene by a constant delta instead of wall time. Set `RUST_LOG`
//! to adjust logging.

use glimmer::input::{Input, KeyCode, PoseControls};
use glimmer::prelude::*;
use glimmer::RunError;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    seed: Option<u64>,
    fixed_fps: Option<f32>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, RunError> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    parsed.config = Some(
                        args.next()
                            .ok_or_else(|| RunError::Usage("--config needs a path".into()))?,
                    );
                }
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| RunError::Usage("--seed needs a number".into()))?;
                    let seed = value
                        .parse()
                        .map_err(|_| RunError::Usage(format!("invalid seed `{value}`")))?;
                    parsed.seed = Some(seed);
                }
                "--fixed-fps" => {
                    let value = args
                        .next()
                        .ok_or_else(|| RunError::Usage("--fixed-fps needs a number".into()))?;
                    let fps: f32 = value
                        .parse()
                        .map_err(|_| RunError::Usage(format!("invalid frame rate `{value}`")))?;
                    if !fps.is_finite() || fps <= 0.0 {
                        return Err(RunError::Usage(format!("invalid frame rate `{value}`")));
                    }
                    parsed.fixed_fps = Some(fps);
                }
                other => return Err(RunError::Usage(format!("unknown argument `{other}`"))),
            }
        }
        Ok(parsed)
    }

    fn load_config(&self) -> Result<InstallationConfig, RunError> {
        let mut config = match &self.config {
            Some(path) => {
                let config = InstallationConfig::load(path)?;
                info!(path = %path, "configuration loaded");
                config
            }
            None => InstallationConfig::default(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glimmer=info"));
    let stdout_layer = fmt::layer().with_target(true);
    // Fails only if a subscriber is already installed.
    let _ = Registry::default().with(env_filter).with(stdout_layer).try_init();
}

struct App {
    installation: Installation,
    hand: SimHandle,
    window: Option<Arc<Window>>,
    clock: FrameClock,
    input: Input,
    controls: PoseControls,
    title: String,
    error: Option<RunError>,
}

impl App {
    fn new(installation: Installation, hand: SimHandle, fixed_fps: Option<f32>) -> Self {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(fixed_fps.map(|fps| 1.0 / fps));
        Self {
            installation,
            controls: PoseControls::new(hand.pose()),
            hand,
            window: None,
            clock,
            input: Input::new(),
            title: String::new(),
            error: None,
        }
    }

    fn frame(&mut self) {
        if let Some(pose) = self.controls.apply(&self.input) {
            self.hand.set_pose(pose);
        }
        self.input.begin_frame();

        let dt = self.clock.update();
        self.hand.advance(dt);
        let snapshot = self.installation.tick(dt);

        let title = format!(
            "Glimmer | {} | {} | burst {:.2} | {:.0} fps",
            snapshot.status,
            snapshot.status.indicator().label(),
            snapshot.explosion,
            self.clock.fps()
        );
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.installation.stop();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.clock.resume();
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Glimmer")
            .with_inner_size(winit::dpi::LogicalSize::new(960, 540));
        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                window.request_redraw();
                self.window = Some(window);
                self.installation.start();
            }
            Err(e) => {
                self.error = Some(e.into());
                self.shutdown(event_loop);
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.clock.suspend();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput { .. } if self.input.key_pressed(KeyCode::Escape) => {
                self.shutdown(event_loop)
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn run() -> Result<(), RunError> {
    let args = Args::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;

    let backend = SimulatedBackend::new();
    let hand = backend.handle();
    let installation = Installation::new(config, Box::new(backend))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(installation, hand, args.fixed_fps);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "glimmer exited");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, RunError> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_fixed_fps() {
        let args = parse(&["--fixed-fps", "30", "--seed", "7"]).unwrap();
        assert_eq!(args.fixed_fps, Some(30.0));
        assert_eq!(args.seed, Some(7));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_frame_rate() {
        assert!(matches!(parse(&["--fixed-fps", "0"]), Err(RunError::Usage(_))));
        assert!(matches!(parse(&["--fixed-fps", "fast"]), Err(RunError::Usage(_))));
        assert!(matches!(parse(&["--fixed-fps"]), Err(RunError::Usage(_))));
    }

    #[test]
    fn test_fixed_fps_drives_clock() {
        let backend = SimulatedBackend::new();
        let hand = backend.handle();
        let installation =
            Installation::new(InstallationConfig::default(), Box::new(backend)).unwrap();
        let mut app = App::new(installation, hand, Some(50.0));
        assert!((app.clock.update() - 0.02).abs() < 1e-6);
    }
}
