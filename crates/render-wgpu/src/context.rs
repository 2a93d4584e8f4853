use crate::error::SetupError;
use vigil_scene::Viewport;

/// GPU device, queue and the configured window surface.
///
/// Created once per window; everything the renderer allocates hangs off the
/// device held here.
pub struct RenderContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    adapter_info: wgpu::AdapterInfo,
}

impl RenderContext {
    /// Bring up an adapter and device for `target` and configure its surface
    /// at `viewport` backing size.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> Result<Self, SetupError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(SetupError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vigil_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        // Errors outside setup's error scope are logged, never fatal.
        device.on_uncaptured_error(Box::new(log_gpu_error));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(SetupError::NoAdapter)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width,
            height: viewport.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let adapter_info = adapter.get_info();
        tracing::info!(
            adapter = %adapter_info.name,
            backend = adapter_info.backend.to_str(),
            ?format,
            width = viewport.width,
            height = viewport.height,
            "GPU initialized"
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
            adapter_info,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.config.width,
            height: self.config.height,
        }
    }

    /// Reconfigure the surface for a new backing size. No-op if unchanged.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport() {
            return;
        }
        self.config.width = viewport.width;
        self.config.height = viewport.height;
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(width = viewport.width, height = viewport.height, "surface resized");
    }

    /// Next swapchain texture. Lost or outdated surfaces are reconfigured and
    /// the frame is skipped by returning `Ok(None)`.
    pub fn acquire(&self) -> Result<Option<wgpu::SurfaceTexture>, wgpu::SurfaceError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn log_gpu_error(error: wgpu::Error) {
    tracing::error!("gpu error: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncaptured_errors_are_logged_not_raised() {
        let handler: Box<dyn wgpu::UncapturedErrorHandler> = Box::new(log_gpu_error);
        handler(wgpu::Error::OutOfMemory {
            source: Box::new(std::io::Error::other("device heap exhausted")),
        });
        handler(wgpu::Error::Validation {
            source: Box::new(std::io::Error::other("bad bind group")),
            description: "bad bind group".into(),
        });
    }
}
