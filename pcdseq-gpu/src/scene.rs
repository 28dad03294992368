use crate::device::GpuContext;
use crate::readback;
use crate::shaders::SCENE_SHADER;
use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix4;
use pcdseq_core::{Error, Result};
use std::sync::Arc;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Position + color, used both as a per-instance point and as a line vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl ColorVertex {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout descriptor
    pub fn desc<'a>(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Camera and viewport data shared by both scene pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub linearize: f32,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Edge length of a rendered point, in pixels
    pub point_size: f32,
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 4.0,
            background_color: [1.0, 1.0, 1.0, 1.0],
            enable_depth_test: true,
        }
    }
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GeometryBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

/// Renderer for one 3D window: a point cloud plus arbitrary line segments
pub struct SceneRenderer {
    gpu: Arc<GpuContext>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform: SceneUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth: DepthTarget,
    points: Option<GeometryBuffer>,
    lines: Option<GeometryBuffer>,
    config: RenderConfig,
}

impl SceneRenderer {
    /// Create a renderer presenting to `surface`
    pub fn new(
        gpu: Arc<GpuContext>,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        config: RenderConfig,
    ) -> Result<Self> {
        let surface_config = gpu.configure_surface(&surface, width, height)?;

        let uniform = SceneUniform {
            view_proj: Matrix4::<f32>::identity().into(),
            viewport: [surface_config.width as f32, surface_config.height as f32],
            point_size: config.point_size,
            linearize: if surface_config.format.is_srgb() { 1.0 } else { 0.0 },
        };
        let uniform_buffer = gpu.create_buffer_init(
            "Scene Uniform Buffer",
            &[uniform],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = gpu.create_shader_module("Scene Shader", SCENE_SHADER);
        let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let point_pipeline = create_pipeline(
            &gpu.device,
            &layout,
            &shader,
            "vs_point",
            wgpu::VertexStepMode::Instance,
            wgpu::PrimitiveTopology::TriangleList,
            surface_config.format,
            config.enable_depth_test,
        );
        let line_pipeline = create_pipeline(
            &gpu.device,
            &layout,
            &shader,
            "vs_line",
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::LineList,
            surface_config.format,
            config.enable_depth_test,
        );

        let depth = create_depth_target(&gpu.device, surface_config.width, surface_config.height);

        Ok(Self {
            gpu,
            surface,
            surface_config,
            point_pipeline,
            line_pipeline,
            uniform,
            uniform_buffer,
            bind_group,
            depth,
            points: None,
            lines: None,
            config,
        })
    }

    /// Current drawable size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Resize renderer surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gpu.device, &self.surface_config);
        self.depth = create_depth_target(&self.gpu.device, width, height);
        self.uniform.viewport = [width as f32, height as f32];
        self.write_uniform();
    }

    /// Update the combined view-projection matrix
    pub fn set_view_proj(&mut self, view_proj: Matrix4<f32>) {
        self.uniform.view_proj = view_proj.into();
        self.write_uniform();
    }

    /// Replace the points drawn, one square per vertex
    pub fn set_points(&mut self, vertices: &[ColorVertex]) {
        self.points = self.upload("Point Instance Buffer", vertices);
    }

    /// Replace the line segments drawn, two vertices per segment
    pub fn set_lines(&mut self, vertices: &[ColorVertex]) {
        self.lines = self.upload("Line Vertex Buffer", vertices);
    }

    /// Draw the scene to the window
    pub fn render(&mut self) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Render Encoder"),
        });
        self.encode_pass(&mut encoder, &view);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Render the scene offscreen and return `(width, height, rgba8 pixels)`
    pub fn capture(&self) -> Result<(u32, u32, Vec<u8>)> {
        let (width, height) = self.size();
        let format = self.surface_config.format;
        let swap_red_blue = match format {
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
            other => {
                return Err(Error::Unsupported(format!(
                    "cannot capture surface format {:?}",
                    other
                )))
            }
        };

        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Capture Encoder"),
        });
        self.encode_pass(&mut encoder, &view);

        let mut pixels = readback::read_texture(&self.gpu, encoder, &texture, width, height)?;
        if swap_red_blue {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        Ok((width, height, pixels))
    }

    fn encode_pass(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let bg = self.config.background_color;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: bg[0],
                        g: bg[1],
                        b: bg[2],
                        a: bg[3],
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: if self.config.enable_depth_test {
                Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                })
            } else {
                None
            },
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.bind_group, &[]);

        if let Some(points) = &self.points {
            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_vertex_buffer(0, points.buffer.slice(..));
            render_pass.draw(0..6, 0..points.count);
        }
        if let Some(lines) = &self.lines {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
            render_pass.draw(0..lines.count, 0..1);
        }
    }

    fn upload(&self, label: &str, vertices: &[ColorVertex]) -> Option<GeometryBuffer> {
        if vertices.is_empty() {
            return None;
        }
        Some(GeometryBuffer {
            buffer: self.gpu.create_buffer_init(label, vertices, wgpu::BufferUsages::VERTEX),
            count: vertices.len() as u32,
        })
    }

    fn write_uniform(&self) {
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
    }
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    vertex_entry: &str,
    step_mode: wgpu::VertexStepMode,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    depth_test: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(vertex_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: vertex_entry,
            buffers: &[ColorVertex::desc(step_mode)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: if depth_test {
            Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            })
        } else {
            None
        },
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> DepthTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthTarget {
        _texture: texture,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // mat4x4 (64) + vec2 (8) + f32 + f32
        assert_eq!(std::mem::size_of::<SceneUniform>(), 80);
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<ColorVertex>(), 24);
        let layout = ColorVertex::desc(wgpu::VertexStepMode::Instance);
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 12);
    }

    #[test]
    fn test_default_config_has_white_background() {
        let config = RenderConfig::default();
        assert_eq!(config.background_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(config.point_size, 4.0);
    }
}
