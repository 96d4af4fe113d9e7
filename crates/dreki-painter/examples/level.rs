//! A 100×100 grid of tinted quads with two spritesheet characters on either
//! side of it in depth. The front character walks back and forth, so only
//! its batch re-uploads each frame.
//!
//! Run with `cargo run --example level [config.json]`.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dreki_painter::prelude::*;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

const GRID: usize = 100;
const SHEET_FRAME: u32 = 32;
const SHEET_FRAMES: usize = 8;

struct Level {
    device: WgpuDevice,
    painter: Painter,
    camera: Camera2d,
    walker: Rc<RefCell<SpriteRenderer>>,
    frame: u64,
}

impl Level {
    fn new(gpu: GpuContext, config: &PainterConfig) -> Result<Self, RenderError> {
        let mut device = WgpuDevice::new(gpu);
        device.set_clear_color(config.clear_color);

        let mut resources = ResourceCache::new();
        let mut painter = Painter::with_resources(&mut device, &mut resources, config)?;

        let (width, height, pixels) = sheet_pixels();
        let texture = device.create_texture("characters", width, height, &pixels)?;
        resources.add_spritesheet(
            "characters",
            Spritesheet::from_device(&device, texture, SHEET_FRAME, SHEET_FRAME, SHEET_FRAMES, 0)?,
        );

        // Background grid, depth 0.
        let (offset, total_w, total_h) = (10.0, 580.0, 280.0);
        let tile = Vec2::new(total_w / GRID as f32, total_h / GRID as f32);
        for x in 0..GRID {
            for y in 0..GRID {
                let position = Vec2::new(offset + x as f32 * tile.x, offset + y as f32 * tile.y);
                let color = Color::rgb(position.x / total_w, position.y / total_h, 1.0);
                let quad = SpriteRenderer::colored(color, Transform::new(position, tile), 0);
                painter.add(&mut device, Rc::new(RefCell::new(quad)));
            }
        }

        let sheet = resources
            .spritesheet("characters")
            .ok_or_else(|| RenderError::ResourceCreation {
                kind: "spritesheet",
                label: "characters".into(),
                message: "not registered".into(),
            })?;

        // One character behind the grid, one in front.
        let behind = SpriteRenderer::new(
            sheet[3],
            Transform::from_xy(380.0, 100.0).with_scale(32.0, 32.0),
            -1,
        );
        painter.add(&mut device, Rc::new(RefCell::new(behind)));

        let walker = Rc::new(RefCell::new(SpriteRenderer::new(
            sheet[4],
            Transform::from_xy(400.0, 100.0).with_scale(32.0, 32.0),
            1,
        )));
        painter.add(&mut device, walker.clone());

        log::info!(
            "level ready: {} quads in {} batches",
            painter.quad_count(),
            painter.batches().len()
        );

        Ok(Self {
            device,
            painter,
            camera: Camera2d::new(Vec2::ZERO, config.viewport),
            walker,
            frame: 0,
        })
    }

    fn update(&mut self) {
        self.frame += 1;
        let mut walker = self.walker.borrow_mut();
        let t = self.frame as f32 / 60.0;
        walker.transform_mut().position.x = 400.0 + t.sin() * 150.0;
        walker.update();
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let stats = self.painter.render(&mut self.device, &self.camera);
        if self.frame % 300 == 0 {
            match serde_json::to_string(&stats) {
                Ok(json) => log::debug!("render stats: {json}"),
                Err(err) => log::warn!("could not serialize stats: {err}"),
            }
        }

        match self.device.present() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = self.device.gpu().surface_size();
                self.device.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory!");
                event_loop.exit();
            }
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
            }
        }
    }
}

/// Eight 32×32 frames in a row, each a different colour with a lighter
/// border so the slicing is visible.
fn sheet_pixels() -> (u32, u32, Vec<u8>) {
    let width = SHEET_FRAME * SHEET_FRAMES as u32;
    let height = SHEET_FRAME;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let frame = x / SHEET_FRAME;
            let (fx, fy) = (x % SHEET_FRAME, y);
            let border = fx < 2 || fy < 2 || fx >= SHEET_FRAME - 2 || fy >= SHEET_FRAME - 2;
            let base = [
                (frame * 37 % 255) as u8,
                (96 + frame * 53 % 160) as u8,
                (255 - frame * 29) as u8,
            ];
            let [r, g, b] = if border { [255, 255, 255] } else { base };
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }

    (width, height, pixels)
}

struct App {
    config: PainterConfig,
    window: Option<Arc<Window>>,
    level: Option<Level>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("dreki-painter level")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 672.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        match GpuContext::new(window.clone()).and_then(|gpu| Level::new(gpu, &self.config)) {
            Ok(level) => self.level = Some(level),
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(level) = &mut self.level {
                    level.device.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(level) = &mut self.level {
                    level.update();
                    level.render(event_loop);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => PainterConfig::from_json_file(path)?,
        None => PainterConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    let mut app = App {
        config,
        window: None,
        level: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
