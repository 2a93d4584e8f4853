use crate::error::SetupError;
use crate::reflect::ProgramLayout;
use crate::shaders::{FIRE_POINT_PROGRAM, FIRE_SHELL_PROGRAM, ProgramSpec, SCENE_PROGRAM};
use crate::uniforms::{FirePointUniforms, FireShellUniforms, FrameUniforms, ObjectUniforms};
use bytemuck::{Pod, Zeroable};
use vigil_fire::{FireGeometry, FirePalette, FirePlan, FireSample, FireSystem, ShellParams};
use vigil_scene::{FrameInput, MemorialScene, Mesh, ModelTransform, Viewport};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

fn interleave(mesh: &Mesh) -> Vec<MeshVertex> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.uvs)
        .map(|((&position, &normal), &uv)| MeshVertex {
            position,
            normal,
            uv,
        })
        .collect()
}

/// Vertex and index buffers for one static mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(&interleave(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// One opaque renderable: mesh plus its own uniform buffer and bind group.
struct GpuObject {
    mesh: GpuMesh,
    bind_group: wgpu::BindGroup,
}

enum FirePass {
    Points {
        pipeline: wgpu::RenderPipeline,
        instances: wgpu::Buffer,
        palette: FirePalette,
    },
    Shell {
        pipeline: wgpu::RenderPipeline,
        mesh: GpuMesh,
        transform: ModelTransform,
        params: ShellParams,
    },
}

/// Counts reported to overlays and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub objects: usize,
    pub fire_instances: u32,
    pub draw_calls: u32,
}

/// wgpu renderer for the memorial scene.
///
/// All shaders, pipelines and buffers are created in [`WgpuRenderer::new`];
/// per frame only uniform buffers are written.
pub struct WgpuRenderer {
    scene: MemorialScene,
    scene_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    objects: Vec<GpuObject>,
    fire: FirePass,
    fire_buffer: wgpu::Buffer,
    fire_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_buffer<T: Pod>(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    contents: &T,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(contents),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (buffer, bind_group)
}

/// Reflect, check and compile one program.
fn shader_module(
    device: &wgpu::Device,
    program: &ProgramSpec,
) -> Result<(wgpu::ShaderModule, ProgramLayout), SetupError> {
    let layout = ProgramLayout::check(program)?;
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.label),
        source: wgpu::ShaderSource::Wgsl(program.source.into()),
    });
    Ok((module, layout))
}

/// Additive blending for fire: `src * src_alpha + dst`.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Depth state per pass. Fire tests against the opaque depth but never writes
/// it; opaque pipelines always write, so no state has to be restored.
fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        scene: &MemorialScene,
        fire: &FireSystem,
    ) -> Result<Self, SetupError> {
        let _span = tracing::info_span!("renderer_setup").entered();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let built = Self::build(device, surface_format, viewport, scene, fire);
        let gpu_error = pollster::block_on(device.pop_error_scope());
        let renderer = built?;
        if let Some(err) = gpu_error {
            return Err(SetupError::ShaderCompile {
                label: "pipelines".into(),
                log: err.to_string(),
            });
        }
        tracing::info!(
            objects = renderer.objects.len(),
            fire = %fire.style(),
            "renderer ready"
        );
        Ok(renderer)
    }

    fn build(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        scene: &MemorialScene,
        fire: &FireSystem,
    ) -> Result<Self, SetupError> {
        // Static scene
        let frame_layout = uniform_layout(device, "frame_layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let object_layout =
            uniform_layout(device, "object_layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let (frame_buffer, frame_bind_group) = uniform_buffer(
            device,
            &frame_layout,
            "frame_uniforms",
            &FrameUniforms::new(scene, viewport.aspect(), 0.0),
        );

        let (scene_shader, scene_program) = shader_module(device, &SCENE_PROGRAM)?;
        let position = scene_program.require_attribute("position")?;
        let normal = scene_program.require_attribute("normal")?;
        let scene_attributes = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: position,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: normal,
            },
        ];
        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &scene_attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let objects = scene
            .renderables
            .iter()
            .map(|r| {
                let (_, bind_group) =
                    uniform_buffer(device, &object_layout, r.name, &ObjectUniforms::new(r));
                tracing::debug!(name = r.name, indices = r.mesh.index_count(), "uploaded renderable");
                GpuObject {
                    mesh: GpuMesh::upload(device, r.name, &r.mesh),
                    bind_group,
                }
            })
            .collect();

        // Fire
        let fire_layout = uniform_layout(device, "fire_layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let fire_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fire_pipeline_layout"),
            bind_group_layouts: &[&fire_layout],
            push_constant_ranges: &[],
        });
        let fire_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(ADDITIVE),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let settings = fire.settings();

        let (fire_pass, fire_buffer, fire_bind_group) = match fire.geometry() {
            FireGeometry::Points(emitter) => {
                let (shader, program) = shader_module(device, &FIRE_POINT_PROGRAM)?;
                let attributes = [
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: program.require_attribute("position")?,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 12,
                        shader_location: program.require_attribute("size")?,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 16,
                        shader_location: program.require_attribute("seed")?,
                    },
                ];
                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("fire_point_pipeline"),
                    layout: Some(&fire_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_fire"),
                        compilation_options: Default::default(),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: FireSample::STRIDE as u64,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &attributes,
                        }],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_fire"),
                        compilation_options: Default::default(),
                        targets: &fire_target,
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleStrip,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(depth_state(false)),
                    multisample: Default::default(),
                    multiview: None,
                    cache: None,
                });
                // Uploaded once; only the time uniform changes per frame.
                let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("fire_instances"),
                    contents: emitter.as_bytes(),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let (buffer, bind_group) = uniform_buffer(
                    device,
                    &fire_layout,
                    "fire_point_uniforms",
                    &FirePointUniforms::new(&scene.camera, viewport, &settings.palette, 0.0),
                );
                tracing::debug!(samples = emitter.len(), "uploaded fire samples");
                let pass = FirePass::Points {
                    pipeline,
                    instances,
                    palette: settings.palette,
                };
                (pass, buffer, bind_group)
            }
            FireGeometry::Shell { mesh, transform } => {
                let (shader, program) = shader_module(device, &FIRE_SHELL_PROGRAM)?;
                let attributes = [
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: program.require_attribute("position")?,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 24,
                        shader_location: program.require_attribute("uv")?,
                    },
                ];
                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("fire_shell_pipeline"),
                    layout: Some(&fire_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_shell"),
                        compilation_options: Default::default(),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: size_of::<MeshVertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &attributes,
                        }],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_shell"),
                        compilation_options: Default::default(),
                        targets: &fire_target,
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(depth_state(false)),
                    multisample: Default::default(),
                    multiview: None,
                    cache: None,
                });
                let (buffer, bind_group) = uniform_buffer(
                    device,
                    &fire_layout,
                    "fire_shell_uniforms",
                    &FireShellUniforms::new(&scene.camera, viewport, transform, &settings.shell, 0.0),
                );
                let pass = FirePass::Shell {
                    pipeline,
                    mesh: GpuMesh::upload(device, "fire_shell", mesh),
                    transform: *transform,
                    params: settings.shell,
                };
                (pass, buffer, bind_group)
            }
        };

        Ok(Self {
            scene: scene.clone(),
            scene_pipeline,
            frame_buffer,
            frame_bind_group,
            objects,
            fire: fire_pass,
            fire_buffer,
            fire_bind_group,
            depth_texture: Self::create_depth_texture(device, viewport),
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.depth_texture = Self::create_depth_texture(device, viewport);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn stats(&self, plan: &FirePlan) -> RenderStats {
        RenderStats {
            objects: self.objects.len(),
            fire_instances: plan.instance_count,
            draw_calls: self.objects.len() as u32 + plan.draw_calls,
        }
    }

    /// Render one frame: opaque scene, then the additive fire on top.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameInput,
        plan: &FirePlan,
    ) {
        let viewport = frame.viewport;
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(&self.scene, viewport.aspect(), frame.elapsed)),
        );
        let camera = &self.scene.camera;
        match &self.fire {
            FirePass::Points { palette, .. } => queue.write_buffer(
                &self.fire_buffer,
                0,
                bytemuck::bytes_of(&FirePointUniforms::new(camera, viewport, palette, plan.time)),
            ),
            FirePass::Shell {
                transform, params, ..
            } => queue.write_buffer(
                &self.fire_buffer,
                0,
                bytemuck::bytes_of(&FireShellUniforms::new(
                    camera, viewport, transform, params, plan.time,
                )),
            ),
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b] = self.scene.lighting.clear_color().0;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for object in &self.objects {
                pass.set_bind_group(1, &object.bind_group, &[]);
                object.mesh.draw(&mut pass);
            }

            // One draw for the whole fire.
            match &self.fire {
                FirePass::Points {
                    pipeline,
                    instances,
                    ..
                } => {
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &self.fire_bind_group, &[]);
                    pass.set_vertex_buffer(0, instances.slice(..));
                    pass.draw(0..plan.element_count, 0..plan.instance_count);
                }
                FirePass::Shell { pipeline, mesh, .. } => {
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &self.fire_bind_group, &[]);
                    mesh.draw(&mut pass);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
