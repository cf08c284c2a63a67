mod camera_controller;
mod frame_stats;
mod input_state;

use super::renderer::Renderer;
use color_eyre::{Report, Result};
use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};
use crate::app::camera_controller::CameraController;
use crate::app::frame_stats::FrameStats;
use crate::app::input_state::InputState;
use crate::renderer::config::RenderConfig;

const APP_NAME: &str = "boxdraw";
const INITIAL_WINDOW_SIZE: LogicalSize<u32> = LogicalSize::new(800, 600);

pub struct App {
    config: RenderConfig,
    // Dropped before the window it renders into
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    camera_controller: CameraController,

    // State
    input_state: InputState,
    frame_stats: FrameStats,
    start_time: Instant,
    prev_frame_time: Instant,
    error: Option<Report>,
}

impl App {
    pub fn new(config: RenderConfig) -> Self {
        let now = Instant::now();
        Self {
            config,
            renderer: None,
            window: None,
            camera_controller: CameraController::new(),

            input_state: InputState::default(),
            frame_stats: FrameStats::new(),
            start_time: now,
            prev_frame_time: now,
            error: None,
        }
    }

    /// Run the event loop until the window closes or a callback fails
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        // Tear down the renderer before reporting
        self.renderer = None;
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_none() {
            let attributes = Window::default_attributes()
                .with_title(APP_NAME)
                .with_inner_size(INITIAL_WINDOW_SIZE);
            self.window = Some(Arc::new(event_loop.create_window(attributes)?));
        }

        if self.renderer.is_none() {
            if let Some(window) = &self.window {
                self.renderer = Some(Renderer::new(window.clone(), &self.config)?);
            }
        }

        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) else {
            return Ok(());
        };

        let now = Instant::now();
        let elapsed = now.duration_since(self.start_time).as_secs_f32();
        renderer.update(self.camera_controller.get_eye_position(), elapsed)?;
        renderer.draw()?;

        if self.frame_stats.tick(now.duration_since(self.prev_frame_time)) {
            window.set_title(&self.frame_stats.window_title(APP_NAME));
            log::debug!(
                "{:.0} fps, {:.3} mspf",
                self.frame_stats.get_fps(),
                self.frame_stats.get_mspf(),
            );
        }
        self.prev_frame_time = now;

        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Report) {
        // Keep the first failure, later ones are usually consequences
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if matches!(cause, StartCause::Init) {
            self.start_time = Instant::now();
            self.prev_frame_time = self.start_time;
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent
    ) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {
            return;
        }

        self.input_state.process_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.request_resize();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left | MouseButton::Right,
                ..
            } => {
                let pos = self.input_state.mouse_curr_pos;
                match state {
                    ElementState::Pressed => self.camera_controller.on_pointer_down(pos),
                    ElementState::Released => self.camera_controller.on_pointer_up(pos),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                self.camera_controller.on_pointer_move(self.input_state.drag_mode(), pos);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                KeyEvent {
                    logical_key: Key::Named(NamedKey::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => {
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
