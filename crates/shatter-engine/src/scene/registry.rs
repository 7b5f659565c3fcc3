use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::picking::{PICK_ID_BIAS, ViewportMapping};

use super::layout::{CommonUniform, InstanceTransform, MeshVertex, PostUniform, min_binding_size};
use super::{MeshData, SceneConfig};

/// Procedural copies of the tube drawn by the primary pass.
pub const PRIMARY_INSTANCES: u32 = 2;

pub(super) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
pub(super) const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Sint;

/// Staging buffer for one picked texel; copies need 256-byte row alignment.
const PICK_STAGING_BYTES: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

const SHADING_WGSL: &str = include_str!("shaders/shading.wgsl");

/// Session-lifetime GPU resources of the scene.
///
/// Built once before the first frame; pipelines and allocations never change
/// afterwards. Only buffer contents vary per frame.
pub struct GpuScene {
    pub(super) mapping: ViewportMapping,

    pub(super) color_view: wgpu::TextureView,
    pub(super) depth_view: wgpu::TextureView,
    pub(super) pick_texture: wgpu::Texture,
    pub(super) pick_view: wgpu::TextureView,

    pub(super) tube_vbo: wgpu::Buffer,
    pub(super) tube_vertices: u32,
    pub(super) cube_vbo: wgpu::Buffer,
    pub(super) cube_vertices: u32,

    pub(super) common_ubo: wgpu::Buffer,
    pub(super) instance_vbo: wgpu::Buffer,
    pub(super) instance_capacity: usize,
    pub(super) post_ubo: wgpu::Buffer,
    pub(super) pick_staging: wgpu::Buffer,

    pub(super) common_bind_group: wgpu::BindGroup,
    pub(super) post_bind_group: wgpu::BindGroup,

    pub(super) primary_pipeline: wgpu::RenderPipeline,
    pub(super) instanced_pipeline: wgpu::RenderPipeline,
    pub(super) post_pipeline: wgpu::RenderPipeline,
}

impl GpuScene {
    /// Allocates targets and buffers and builds the three pipelines.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        config: &SceneConfig,
        tube: &MeshData,
        cube: &MeshData,
    ) -> Result<Self> {
        let mapping = config.mapping();
        let (tw, th) = mapping.target_size();
        let instance_capacity = config.instance_capacity();

        let max_dim = device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            tw <= max_dim && th <= max_dim,
            "render target {tw}x{th} exceeds the device limit of {max_dim}"
        );
        anyhow::ensure!(instance_capacity > 0, "instance buffer cannot hold a single transform");
        anyhow::ensure!(tube.vertex_count() > 0, "tube mesh has no vertices");
        anyhow::ensure!(cube.vertex_count() > 0, "cube mesh has no vertices");

        let target = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: tw,
                    height: th,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let color_texture = target(
            "shatter color target",
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth_texture = target(
            "shatter depth target",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let pick_texture = target(
            "shatter pick target",
            PICK_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );

        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let pick_view = pick_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let tube_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shatter tube vbo"),
            contents: tube.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shatter cube vbo"),
            contents: cube.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let common_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shatter common ubo"),
            size: size_of::<CommonUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let instance_vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shatter instance vbo"),
            size: config.instance_buffer_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let post_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shatter post ubo"),
            size: size_of::<PostUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let pick_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shatter pick staging"),
            size: PICK_STAGING_BYTES,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        // ── bindings ──────────────────────────────────────────────────────

        let common_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shatter common bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: min_binding_size::<CommonUniform>(),
                },
                count: None,
            }],
        });

        let post_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shatter post bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: min_binding_size::<PostUniform>(),
                    },
                    count: None,
                },
            ],
        });

        let common_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shatter common bind group"),
            layout: &common_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: common_ubo.as_entire_binding(),
            }],
        });

        let post_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shatter post bind group"),
            layout: &post_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: post_ubo.as_entire_binding(),
                },
            ],
        });

        // ── pipelines ─────────────────────────────────────────────────────

        let common_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shatter common pipeline layout"),
            bind_group_layouts: &[&common_bgl],
            immediate_size: 0,
        });
        let post_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shatter post pipeline layout"),
            bind_group_layouts: &[&post_bgl],
            immediate_size: 0,
        });

        let primary_shader =
            scene_shader(device, "shatter primary shader", include_str!("shaders/primary.wgsl"));
        let instanced_shader =
            scene_shader(device, "shatter instanced shader", include_str!("shaders/instanced.wgsl"));
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shatter post shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/post.wgsl").into()),
        });

        let color_target = Some(wgpu::ColorTargetState {
            format: COLOR_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        });
        let pick_target = Some(wgpu::ColorTargetState {
            format: PICK_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        });

        let primary_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shatter primary pipeline"),
            layout: Some(&common_layout),
            vertex: wgpu::VertexState {
                module: &primary_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &primary_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[color_target.clone()],
            }),
            primitive: mesh_primitive(),
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let instanced_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shatter instanced pipeline"),
            layout: Some(&common_layout),
            vertex: wgpu::VertexState {
                module: &instanced_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), InstanceTransform::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &instanced_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[color_target, pick_target],
            }),
            primitive: mesh_primitive(),
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shatter post pipeline"),
            layout: Some(&post_layout),
            vertex: wgpu::VertexState {
                module: &post_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!(
            "scene ready: targets {tw}x{th}, tube {} / cube {} vertices, {instance_capacity} instance slots",
            tube.vertex_count(),
            cube.vertex_count()
        );

        Ok(Self {
            mapping,
            color_view,
            depth_view,
            pick_texture,
            pick_view,
            tube_vbo,
            tube_vertices: tube.vertex_count(),
            cube_vbo,
            cube_vertices: cube.vertex_count(),
            common_ubo,
            instance_vbo,
            instance_capacity,
            post_ubo,
            pick_staging,
            common_bind_group,
            post_bind_group,
            primary_pipeline,
            instanced_pipeline,
            post_pipeline,
        })
    }
}

/// Prepends the pick bias and the shared shading helpers to a pass shader.
fn scene_shader_source(body: &str) -> String {
    format!("const PICK_ID_BIAS: i32 = {PICK_ID_BIAS};\n\n{SHADING_WGSL}\n{body}")
}

fn scene_shader(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(scene_shader_source(body).into()),
    })
}

fn mesh_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        // The tube is seen from inside, boxes from outside.
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
