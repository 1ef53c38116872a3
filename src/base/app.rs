use crate::{
    overlay::{self, TextAlign, TextOverlay},
    settings::ExampleSettings,
    timer::FrameTimer,
    view::ViewState,
    vulkan::{ClearOnly, Renderer, TextOverlayRenderer, VulkanContext},
};
use ash::vk;
use log::{debug, error, info};
use nalgebra_glm as glm;
use std::{error::Error, mem, path::PathBuf, sync::Arc, time::Instant};
use winit::{
    dpi::PhysicalSize,
    event::{
        ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
        WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

pub type HookResult = Result<(), Box<dyn Error>>;

/// Hooks an example implements on top of the shared base.
pub trait Example {
    /// Device features to enable, picked from what the device offers.
    fn enabled_features(
        &self,
        _available: &vk::PhysicalDeviceFeatures,
    ) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
    }

    fn prepare(&mut self, _: &mut ExampleBase) -> HookResult {
        Ok(())
    }

    fn build_command_buffers(&mut self, base: &mut ExampleBase) -> HookResult {
        base.renderer.record_all_command_buffers(&mut ClearOnly)?;
        Ok(())
    }

    fn render(&mut self, base: &mut ExampleBase) -> HookResult {
        base.renderer.draw_frame(&[])?;
        Ok(())
    }

    fn view_changed(&mut self, _: &mut ExampleBase) -> HookResult {
        Ok(())
    }

    fn key_pressed(&mut self, _: &mut ExampleBase, _: VirtualKeyCode) -> HookResult {
        Ok(())
    }

    fn window_resized(&mut self, _: &mut ExampleBase) -> HookResult {
        Ok(())
    }

    fn overlay_text(&self, _: &ExampleBase, _: &mut TextOverlay) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaseAction {
    Quit,
    TogglePause,
    ToggleOverlay,
    None,
}

/// Keys the base reacts to before forwarding them to the example.
pub fn base_action(key: VirtualKeyCode, overlay_allowed: bool) -> BaseAction {
    match key {
        VirtualKeyCode::Escape => BaseAction::Quit,
        VirtualKeyCode::P => BaseAction::TogglePause,
        VirtualKeyCode::F1 if overlay_allowed => BaseAction::ToggleOverlay,
        _ => BaseAction::None,
    }
}

// Fields are dropped in declaration order, the window outlives its surface
pub struct ExampleBase {
    pub text_overlay: Option<TextOverlayRenderer>,
    pub renderer: Renderer,
    pub settings: ExampleSettings,
    pub timer: FrameTimer,
    pub view: ViewState,
    pub overlay: TextOverlay,
    pub prepared: bool,
    pub quit: bool,
    destination: [u32; 2],
    pub window: Window,
}

impl ExampleBase {
    fn new(
        window: Window,
        renderer: Renderer,
        text_overlay: Option<TextOverlayRenderer>,
        settings: ExampleSettings,
    ) -> Self {
        let size = window.inner_size();
        let view = ViewState {
            rotation: settings.rotation,
            camera_position: settings.camera_position,
            zoom: settings.zoom,
            rotation_speed: settings.rotation_speed,
            zoom_speed: settings.zoom_speed,
            ..ViewState::default()
        };

        Self {
            text_overlay,
            renderer,
            timer: FrameTimer::new(settings.timer_speed),
            view,
            overlay: TextOverlay::new(settings.enable_text_overlay),
            prepared: false,
            quit: false,
            destination: [size.width, size.height],
            window,
            settings,
        }
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        self.renderer.context()
    }

    pub fn device(&self) -> &ash::Device {
        self.renderer.device()
    }

    pub fn asset(&self, relative_path: &str) -> PathBuf {
        self.settings.asset(relative_path)
    }

    pub fn dimensions(&self) -> [u32; 2] {
        self.destination
    }

    pub fn window_title(&self) -> String {
        overlay::window_title(
            &self.settings.title,
            &self.context().physical_device().device_name(),
            self.timer.last_fps,
            self.overlay.visible,
        )
    }

    pub fn update_title(&self) {
        self.window.set_title(&self.window_title());
    }

    /// Records the draw command buffers again, reallocating them first if needed.
    pub fn rebuild_command_buffers<E: Example + ?Sized>(&mut self, example: &mut E) -> HookResult {
        if !self.renderer.command_buffers_valid() {
            self.renderer.destroy_command_buffers();
            self.renderer.create_command_buffers()?;
        }
        example.build_command_buffers(self)
    }

    /// Lays out the overlay lines and records the overlay pass drawn after the scene.
    pub fn update_overlay<E: Example + ?Sized>(&mut self, example: &E) -> HookResult {
        let mut text_overlay = match self.text_overlay.take() {
            Some(text_overlay) => text_overlay,
            None => return Ok(()),
        };
        if !self.overlay.visible {
            self.renderer.clear_overlay_command_buffers();
            self.text_overlay = Some(text_overlay);
            return Ok(());
        }

        let mut overlay = mem::take(&mut self.overlay);
        overlay.begin();
        overlay.add_text(self.settings.title.as_str(), 5.0, 5.0, TextAlign::Left);
        overlay.add_text(
            overlay::frame_statistics(self.timer.frame_time_ms(), self.timer.last_fps),
            5.0,
            25.0,
            TextAlign::Left,
        );
        overlay.add_text(
            self.context().physical_device().device_name(),
            5.0,
            45.0,
            TextAlign::Left,
        );
        example.overlay_text(self, &mut overlay);
        overlay.end();

        // The previous overlay may still be reading the vertex buffer
        self.context().logical_device().wait_idle();
        let result = text_overlay.update(&self.renderer, overlay.lines());
        if result.is_ok() {
            self.renderer
                .set_overlay_command_buffers(text_overlay.command_buffers());
        }
        self.overlay = overlay;
        self.text_overlay = Some(text_overlay);
        result?;
        Ok(())
    }

    fn window_resize<E: Example + ?Sized>(&mut self, example: &mut E) -> HookResult {
        if !self.prepared {
            return Ok(());
        }
        self.prepared = false;

        self.renderer.resize(self.destination)?;
        self.rebuild_command_buffers(example)?;
        example.window_resized(self)?;
        example.view_changed(self)?;
        self.update_overlay(&*example)?;

        self.prepared = true;
        Ok(())
    }

    fn minimized(&self) -> bool {
        self.destination[0] == 0 || self.destination[1] == 0
    }
}

// Fields are dropped in declaration order, the example goes before the base
struct Runner<E: Example> {
    example: E,
    base: ExampleBase,
}

impl<E: Example> Runner<E> {
    fn handle_event(&mut self, event: Event<()>, control_flow: &mut ControlFlow) -> HookResult {
        let Self { example, base } = self;
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => base.quit = true,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            virtual_keycode: Some(keycode),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    match base_action(keycode, base.settings.enable_text_overlay) {
                        BaseAction::Quit => base.quit = true,
                        BaseAction::TogglePause => base.timer.toggle_pause(),
                        BaseAction::ToggleOverlay => {
                            base.overlay.toggle();
                            base.update_title();
                            base.update_overlay(&*example)?;
                        }
                        BaseAction::None => {}
                    }
                    example.key_pressed(base, keycode)?;
                }
                WindowEvent::MouseInput { button, state, .. } => {
                    let pressed = state == ElementState::Pressed;
                    match button {
                        MouseButton::Left => base.view.buttons.left = pressed,
                        MouseButton::Right => base.view.buttons.right = pressed,
                        MouseButton::Middle => base.view.buttons.middle = pressed,
                        _ => {}
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    base.view
                        .cursor_moved(glm::vec2(position.x as _, position.y as _));
                }
                WindowEvent::MouseWheel { delta, .. } => match delta {
                    MouseScrollDelta::LineDelta(_, v_lines) => base.view.scrolled(v_lines),
                    MouseScrollDelta::PixelDelta(position) => {
                        base.view.scrolled_pixels(position.y as _)
                    }
                },
                WindowEvent::Resized(PhysicalSize { width, height }) => {
                    base.destination = [width, height];
                    if !base.minimized() {
                        base.window_resize(example)?;
                    }
                }
                WindowEvent::Focused(false) => debug!("Window lost focus"),
                _ => {}
            },
            Event::MainEventsCleared => base.window.request_redraw(),
            Event::RedrawRequested(_) => {
                if base.prepared && !base.minimized() {
                    let frame_start = Instant::now();
                    if base.view.take_updated() {
                        example.view_changed(base)?;
                    }
                    example.render(base)?;
                    if base.renderer.resize_requested() {
                        base.window_resize(example)?;
                    }
                    if base.timer.end_frame(frame_start.elapsed()) {
                        base.update_title();
                        base.update_overlay(&*example)?;
                    }
                }
            }
            _ => {}
        }

        if base.quit {
            *control_flow = ControlFlow::Exit;
        }
        Ok(())
    }
}

/// Creates the window and Vulkan objects, prepares the example and runs the event loop.
pub fn run_example<E: Example + 'static>(mut example: E, settings: ExampleSettings) -> HookResult {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(&settings.title)
        .with_inner_size(PhysicalSize::new(settings.width, settings.height))
        .build(&event_loop)?;

    let context = Arc::new(VulkanContext::new(&window, &settings, |available| {
        example.enabled_features(available)
    })?);
    info!(
        "Using device: {}",
        context.physical_device().device_name()
    );

    let size = window.inner_size();
    let mut renderer = Renderer::new(context, [size.width, size.height], &settings)?;

    let text_overlay = if settings.enable_text_overlay {
        Some(TextOverlayRenderer::new(
            &mut renderer,
            settings.asset("fonts/DejaVuSansMono.ttf"),
            settings.asset("shaders/base/textoverlay.vert.spv"),
            settings.asset("shaders/base/textoverlay.frag.spv"),
        )?)
    } else {
        None
    };

    let mut base = ExampleBase::new(window, renderer, text_overlay, settings);
    example.prepare(&mut base)?;
    example.build_command_buffers(&mut base)?;
    base.prepared = true;
    base.update_title();
    base.update_overlay(&example)?;

    let mut runner = Some(Runner { example, base });
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::LoopDestroyed = event {
            if let Some(runner) = runner.take() {
                runner.base.context().logical_device().wait_idle();
                let Runner { example, base } = runner;
                drop(example);
                drop(base);
            }
            return;
        }

        if let Some(runner) = runner.as_mut() {
            if let Err(error) = runner.handle_event(event, control_flow) {
                error!("{}", error);
                *control_flow = ControlFlow::Exit;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_and_pause_are_always_handled() {
        assert_eq!(base_action(VirtualKeyCode::Escape, false), BaseAction::Quit);
        assert_eq!(base_action(VirtualKeyCode::P, false), BaseAction::TogglePause);
        assert_eq!(base_action(VirtualKeyCode::W, true), BaseAction::None);
    }

    #[test]
    fn overlay_toggle_requires_an_enabled_overlay() {
        assert_eq!(base_action(VirtualKeyCode::F1, true), BaseAction::ToggleOverlay);
        assert_eq!(base_action(VirtualKeyCode::F1, false), BaseAction::None);
    }
}
