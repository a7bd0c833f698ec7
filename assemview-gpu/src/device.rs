//! GPU device management

use std::sync::Arc;

use assemview_core::{Error, Result};
use winit::window::Window;

/// Depth buffer format used by every pass
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Multisample count requested for window rendering
pub const MSAA_SAMPLES: u32 = 4;

/// Highest count up to `requested` that every format can render with,
/// falling back to single-sampled
pub fn pick_sample_count(requested: u32, supported: &[&[u32]]) -> u32 {
    std::iter::successors(Some(requested.max(1)), |&count| (count > 1).then_some(count / 2))
        .find(|count| supported.iter().all(|counts| counts.contains(count)))
        .unwrap_or(1)
}

/// GPU context for managing rendering operations
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a context plus a surface that presents to `window`
    pub async fn for_window(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>)> {
        let instance = create_instance();
        let surface = instance
            .create_surface(window)
            .map_err(|e| Error::Gpu(format!("Failed to create surface: {}", e)))?;
        let context = Self::with_surface(instance, &surface).await?;
        Ok((context, surface))
    }

    async fn with_surface(
        instance: wgpu::Instance,
        surface: &wgpu::Surface<'_>,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| Error::Gpu("Failed to find suitable adapter".to_string()))?;

        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("assemview device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| Error::Gpu(format!("Failed to create device: {}", e)))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Surface configuration for a window of the given size, preferring an
    /// sRGB format
    pub fn surface_config(
        &self,
        surface: &wgpu::Surface<'_>,
        width: u32,
        height: u32,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let caps = surface.get_capabilities(&self.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no formats".to_string()))?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        })
    }

    /// Sample count to render `color_format` with, at most [`MSAA_SAMPLES`]
    pub fn sample_count(&self, color_format: wgpu::TextureFormat) -> u32 {
        let color = self
            .adapter
            .get_texture_format_features(color_format)
            .flags
            .supported_sample_counts();
        let depth = self
            .adapter
            .get_texture_format_features(DEPTH_FORMAT)
            .flags
            .supported_sample_counts();
        pick_sample_count(MSAA_SAMPLES, &[color.as_slice(), depth.as_slice()])
    }

    /// Multisampled color target that resolves into a surface texture
    pub fn create_msaa_view(
        &self,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> wgpu::TextureView {
        self.create_target("MSAA Color Texture", format, width, height, sample_count)
    }

    /// Create a depth texture view matching a surface size
    pub fn create_depth_view(
        &self,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> wgpu::TextureView {
        self.create_target("Depth Texture", DEPTH_FORMAT, width, height, sample_count)
    }

    fn create_target(
        &self,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        flags: wgpu::InstanceFlags::default(),
        ..Default::default()
    })
}
