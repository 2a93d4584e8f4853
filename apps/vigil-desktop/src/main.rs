mod config;

use anyhow::{Context as _, Result};
use clap::Parser;
use config::{Overrides, VigilConfig};
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vigil_audio::{AudioGate, GateState};
use vigil_fire::{FirePlan, FireSystem};
use vigil_render_wgpu::{RenderContext, WgpuRenderer};
use vigil_scene::{FrameDriver, FrameInput, MemorialScene, Viewport};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "vigil-desktop", about = "Procedural memorial scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Everything that only exists once a window and device are up.
struct Gpu {
    window: Arc<Window>,
    context: RenderContext,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

/// Smoothed frames-per-second from successive elapsed times.
#[derive(Default)]
struct FpsMeter {
    last_elapsed: Option<f32>,
    fps: f32,
}

impl FpsMeter {
    fn tick(&mut self, elapsed: f32) {
        if let Some(last) = self.last_elapsed {
            let dt = elapsed - last;
            if dt > 0.0 {
                let instant = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant
                } else {
                    self.fps * 0.9 + instant * 0.1
                };
            }
        }
        self.last_elapsed = Some(elapsed);
    }
}

struct VigilApp {
    scene: MemorialScene,
    fire: FireSystem,
    audio: AudioGate,
    driver: FrameDriver,
    fps: FpsMeter,
    show_overlay: bool,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
    fatal: Option<anyhow::Error>,
}

impl VigilApp {
    fn new(config: VigilConfig) -> Result<Self> {
        let scene = MemorialScene::build().context("building scene meshes")?;
        let fire = FireSystem::new(config.fire).context("building fire")?;
        config.audio.validate().context("audio settings")?;
        Ok(Self {
            scene,
            fire,
            audio: AudioGate::new(config.audio),
            driver: FrameDriver::new(),
            fps: FpsMeter::default(),
            show_overlay: false,
            egui_ctx: EguiContext::default(),
            gpu: None,
            fatal: None,
        })
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Vigil")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        let context = RenderContext::new(window.clone(), viewport)?;
        let renderer = WgpuRenderer::new(
            &context.device,
            context.format(),
            viewport,
            &self.scene,
            &self.fire,
        )?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&context.device, context.format(), None, 1, false);

        self.driver.mark_ready(viewport, Instant::now());
        window.request_redraw();
        self.gpu = Some(Gpu {
            window,
            context,
            renderer,
            egui_winit,
            egui_renderer,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let viewport = Viewport::from_physical(width, height, gpu.window.scale_factor());
        if self.driver.resize(viewport) {
            gpu.context.resize(viewport);
            gpu.renderer.resize(&gpu.context.device, viewport);
        }
    }

    fn gesture(&mut self) {
        if self.audio.state() == GateState::Idle {
            let state = self.audio.on_gesture();
            tracing::debug!(?state, "audio gate");
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::F1 => self.show_overlay = !self.show_overlay,
            KeyCode::KeyA => self.gesture(),
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let Some(frame) = self.driver.begin_frame(Instant::now()) else {
            return;
        };
        self.fps.tick(frame.elapsed);
        let plan = self.fire.plan(frame.elapsed);

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let output = match gpu.context.acquire() {
            Ok(Some(output)) => output,
            Ok(None) => {
                gpu.window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                gpu.window.request_redraw();
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.context.device, &gpu.context.queue, &view, &frame, &plan);

        if self.show_overlay {
            let stats = gpu.renderer.stats(&plan);
            let adapter = gpu.context.adapter_info().name.clone();
            let overlay = Overlay {
                fps: self.fps.fps,
                frame: &frame,
                plan: &plan,
                audio: self.audio.state(),
                objects: stats.objects,
                draw_calls: stats.draw_calls,
                adapter: &adapter,
            };
            paint_overlay(gpu, &self.egui_ctx, &view, &overlay);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

/// Values shown in the F1 overlay.
struct Overlay<'a> {
    fps: f32,
    frame: &'a FrameInput,
    plan: &'a FirePlan,
    audio: GateState,
    objects: usize,
    draw_calls: u32,
    adapter: &'a str,
}

impl Overlay<'_> {
    fn ui(&self, ctx: &EguiContext) {
        egui::Window::new("Vigil")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("{:.1} fps", self.fps));
                ui.label(format!(
                    "frame {}  t = {:.1}s",
                    self.frame.frame_index, self.frame.elapsed
                ));
                ui.label(format!(
                    "{} x {}",
                    self.frame.viewport.width, self.frame.viewport.height
                ));
                ui.separator();
                ui.label(format!("fire: {}", self.plan.style));
                ui.label(format!("instances: {}", self.plan.instance_count));
                ui.label(format!("objects: {}", self.objects));
                ui.label(format!("draw calls: {}", self.draw_calls));
                ui.label(format!("audio: {:?}", self.audio));
                ui.separator();
                ui.small(self.adapter);
                ui.small("F1: overlay | A / click: audio | Esc: quit");
            });
    }
}

fn paint_overlay(gpu: &mut Gpu, ctx: &EguiContext, view: &wgpu::TextureView, overlay: &Overlay) {
    let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
    let full_output = ctx.run(raw_input, |ctx| overlay.ui(ctx));
    gpu.egui_winit
        .handle_platform_output(&gpu.window, full_output.platform_output);

    let paint_jobs = ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
    let viewport = gpu.context.viewport();
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [viewport.width, viewport.height],
        pixels_per_point: full_output.pixels_per_point,
    };

    let device = &gpu.context.device;
    let queue = &gpu.context.queue;
    let egui_renderer = &mut gpu.egui_renderer;
    for (id, image_delta) in &full_output.textures_delta.set {
        egui_renderer.update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("egui_encoder"),
    });
    egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
    }
    queue.submit(std::iter::once(encoder.finish()));
    for id in &full_output.textures_delta.free {
        egui_renderer.free_texture(id);
    }
}

impl ApplicationHandler for VigilApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("setup failed: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            if self.show_overlay {
                let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => self.gesture(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key, event_loop),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = VigilConfig::load(cli.config.as_deref(), &cli.overrides)?;
    tracing::info!(
        fire = %config.fire.style,
        speed = config.fire.speed(),
        muted = config.audio.muted,
        "vigil-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = VigilApp::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
