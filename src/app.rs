use std::{sync::Arc, thread, time::Instant};

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{error::describe, AssetSource, FsAssetSource},
    config::AppConfig,
    gfx::{
        build_camera,
        scene::{build_scene, Scene},
        PerspectiveCamera, RenderEngine, Renderer, Viewport,
    },
    interaction::{
        on_pointer_click, on_pointer_move, on_resize, AnimationLoop, CanvasBounds, LightingState,
    },
    models::{scene_queue, ModelLoader, ModelSender, SceneQueue},
};

/// The windowed lamp scene
pub struct AtelierApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: AppConfig,
    source: Arc<dyn AssetSource>,

    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    camera: Option<PerspectiveCamera>,

    scene: Scene,
    lighting: LightingState,
    animation: AnimationLoop,
    queue: SceneQueue,
    sender: Option<ModelSender>,
    cursor: Option<PhysicalPosition<f64>>,
    started: Instant,
}

impl AtelierApp {
    /// Creates the application, serving assets from the configured directory
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let source = FsAssetSource::new(config.assets.root.clone(), config.assets.manifest.clone());
        log::info!("Serving assets from {}", source.root().display());
        Self::with_source(config, Arc::new(source))
    }

    /// Creates the application with a custom asset source
    pub fn with_source(config: AppConfig, source: Arc<dyn AssetSource>) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;
        let (sender, queue) = scene_queue();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                source,
                window: None,
                render_engine: None,
                camera: None,
                scene: build_scene(),
                lighting: LightingState::default(),
                animation: AnimationLoop::new(),
                queue,
                sender: Some(sender),
                cursor: None,
                started: Instant::now(),
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or_else(|| anyhow::anyhow!("event loop already consumed"))?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl AppState {
    fn viewport(&self) -> Option<Viewport> {
        let window = self.window.as_ref()?;
        let size = window.inner_size();
        Some(Viewport::new(size.width, size.height, window.scale_factor()))
    }

    /// Starts loading every model on a background thread
    ///
    /// Finished pivots come back through the scene queue and are inserted
    /// at the start of the next frame.
    fn spawn_loader(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let source = self.source.clone();
        let spawned = thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let loader = ModelLoader::new(source);
                match pollster::block_on(loader.load_all(&sender)) {
                    Ok(report) => log::info!(
                        "Model loading finished: {}/{} loaded, {} failed",
                        report.loaded,
                        report.attempted,
                        report.failed.len()
                    ),
                    Err(err) => log::error!("{}", describe(&err)),
                }
            });
        if let Err(err) = spawned {
            log::error!("Could not start the model loader: {}", err);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let inserted = self.queue.drain_into(&mut self.scene);
        if inserted > 0 {
            let stats = self.scene.get_statistics();
            log::debug!(
                "Inserted {} pivot(s): {} nodes, {} triangles, {} materials",
                inserted,
                stats.node_count,
                stats.total_triangles,
                stats.material_count
            );
        }

        let viewport = self.viewport();
        let (Some(render_engine), Some(camera)) = (self.render_engine.as_mut(), self.camera.as_ref())
        else {
            return;
        };

        let timestamp = self.started.elapsed().as_secs_f64();
        match self
            .animation
            .tick(timestamp, &mut self.scene, camera, render_engine)
        {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(viewport) = viewport {
                    render_engine.resize(viewport);
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Skipped frame: {}", err),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Could not create the window: {}", err);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let Some(viewport) = self.viewport() else {
            return;
        };
        match pollster::block_on(RenderEngine::new(window, viewport)) {
            Ok(renderer) => {
                log::info!(
                    "Renderer ready at pixel ratio {}, shadows {:?}",
                    renderer.pixel_ratio(),
                    renderer.shadow_settings()
                );
                self.render_engine = Some(renderer);
            }
            Err(err) => {
                log::error!("Could not initialise the renderer: {:#}", err);
                event_loop.exit();
                return;
            }
        }
        self.camera = Some(build_camera(&viewport));

        self.spawn_loader();
        self.animation.start();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                let Some(viewport) = self.viewport() else {
                    return;
                };
                if let Some(camera) = self.camera.as_mut() {
                    on_pointer_move(position, &CanvasBounds::from_viewport(&viewport), camera);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (Some(position), Some(viewport)) = (self.cursor, self.viewport()) else {
                    return;
                };
                if let Some(camera) = self.camera.as_ref() {
                    on_pointer_click(
                        position,
                        &CanvasBounds::from_viewport(&viewport),
                        camera,
                        &mut self.scene,
                        &mut self.lighting,
                    );
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let Some(viewport) = self.viewport() else {
                    return;
                };
                if let (Some(camera), Some(render_engine)) =
                    (self.camera.as_mut(), self.render_engine.as_mut())
                {
                    on_resize(camera, render_engine, viewport);
                    log::debug!(
                        "Resized to {}x{} at pixel ratio {}",
                        viewport.width,
                        viewport.height,
                        render_engine.pixel_ratio()
                    );
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
