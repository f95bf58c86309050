use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use tracing::{debug, error, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::assets::material::{Material, MaterialKind, MaterialUniform};
use crate::assets::mesh::{pbr_config, skybox_config, MeshData};
use crate::assets::texture::{Texture, TextureLoader};
use crate::config::SandboxSettings;
use crate::rendering::buffer::{GpuMesh, MeshResource, Topology, WgpuAllocator};
use crate::rendering::camera::{Camera, CameraController, CameraUniform};
use crate::rendering::light::{pack_lights, LightsUniform};
use crate::rendering::scene::{RenderResource, ResourceId, SceneRegistry};
use crate::utils::logging::{handle_wgpu_result, log_adapter_info, log_device_info};

/// Per-object block: model and normal matrices followed by the material.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ObjectUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    material: MaterialUniform,
}

impl ObjectUniform {
    fn new(resource: &RenderResource<GpuMesh>) -> Self {
        let model = resource.transform.matrix();
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            material: resource.material.uniform(),
        }
    }
}

/// GPU state kept alongside one live render resource.
struct ObjectGpuState {
    uniform_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    texture_key: Vec<Option<String>>,
}

enum SkyboxState {
    Unloaded,
    Ready(wgpu::BindGroup),
    Missing,
}

struct BindGroupLayouts {
    frame: wgpu::BindGroupLayout,
    object: wgpu::BindGroupLayout,
    pbr_textures: wgpu::BindGroupLayout,
    simple_textures: wgpu::BindGroupLayout,
    skybox: wgpu::BindGroupLayout,
}

/// Object pipelines exist for every material kind and mesh topology.
struct Pipelines {
    objects: HashMap<(MaterialKind, Topology), wgpu::RenderPipeline>,
    skybox: wgpu::RenderPipeline,
}

/// 1x1 stand-ins for texture channels that have no image.
struct FallbackTextures {
    white: Texture,
    flat_normal: Texture,
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    window: Arc<Window>,
    size: PhysicalSize<u32>,
    config: wgpu::SurfaceConfiguration,
    depth: Texture,
    pub camera: Camera,
    pub camera_controller: CameraController,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    layouts: BindGroupLayouts,
    pipelines: Pipelines,
    textures: TextureLoader,
    fallbacks: FallbackTextures,
    objects: HashMap<ResourceId, ObjectGpuState>,
    skybox: SkyboxState,
}

impl RenderEngine {
    pub async fn new(window: Arc<Window>, settings: &SandboxSettings) -> anyhow::Result<Self> {
        info!("Initializing WGPU render engine");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = handle_wgpu_result(instance.create_surface(Arc::clone(&window)), "create_surface")
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find an appropriate adapter")?;
        log_adapter_info(&adapter);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Sandbox Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("Failed to create device")?;
        log_device_info(&device);
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if settings.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        info!("Configuring WGPU surface with format: {:?}", config.format);
        surface.configure(&device, &config);

        let depth = Texture::depth(&device, config.width, config.height);

        let camera = Camera::new(config.width as f32 / config.height as f32);
        let camera_controller = CameraController::new(0.05);
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[LightsUniform::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layouts = create_layouts(&device);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: lights_buffer.as_entire_binding() },
            ],
            label: Some("frame_bind_group"),
        });

        let pipelines = create_pipelines(&device, &layouts, config.format)?;

        let fallbacks = FallbackTextures {
            white: Texture::solid(&device, &queue, [255, 255, 255, 255], "fallback_white"),
            flat_normal: Texture::solid(&device, &queue, [128, 128, 255, 255], "fallback_normal"),
        };

        info!("Render engine ready ({}x{})", config.width, config.height);
        Ok(Self {
            surface,
            device,
            queue,
            window,
            size,
            config,
            depth,
            camera,
            camera_controller,
            camera_uniform,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            layouts,
            pipelines,
            textures: TextureLoader::new(settings.assets.texture_dir.clone()),
            fallbacks,
            objects: HashMap::new(),
            skybox: SkyboxState::Unloaded,
        })
    }

    /// The mesh factory the scene registry allocates through.
    pub fn allocator(&self) -> WgpuAllocator {
        WgpuAllocator::new(Arc::clone(&self.device))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth = Texture::depth(&self.device, new_size.width, new_size.height);
            self.camera.aspect = new_size.width as f32 / new_size.height as f32;
            debug!("Resized surface to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Drops the per-object state of every resource, e.g. before the scene
    /// is torn down.
    pub fn release_scene_state(&mut self) {
        let released = self.objects.len();
        for (_, state) in self.objects.drain() {
            state.uniform_buffer.destroy();
        }
        self.skybox = SkyboxState::Unloaded;
        info!("Released GPU state of {} objects", released);
    }

    fn update_frame_uniforms(&mut self, scene: &SceneRegistry<WgpuAllocator>) {
        self.camera_controller.update_camera(&mut self.camera);
        self.camera_uniform.update_view_proj(&self.camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
        let lights = pack_lights(scene.lights());
        self.queue.write_buffer(&self.lights_buffer, 0, bytemuck::cast_slice(&[lights]));
    }

    /// Brings per-object GPU state in line with the live render resources:
    /// new resources get state, dead ones lose it.
    fn prepare_objects(&mut self, scene: &SceneRegistry<WgpuAllocator>) {
        let live: HashSet<ResourceId> = scene.renderables().map(|(id, _)| id).collect();
        let before = self.objects.len();
        self.objects.retain(|id, state| {
            let keep = live.contains(id);
            if !keep {
                state.uniform_buffer.destroy();
            }
            keep
        });
        let pruned = before - self.objects.len();
        if pruned > 0 {
            debug!("Pruned GPU state of {} dead resources", pruned);
        }

        for (id, resource) in scene.renderables() {
            let uniform = ObjectUniform::new(resource);
            let key = texture_key(&resource.material);
            let stale = self.objects.get(&id).map_or(true, |state| state.texture_key != key);
            if stale {
                let state = self.create_object_state(id, resource, &uniform, key);
                self.objects.insert(id, state);
            } else if let Some(state) = self.objects.get(&id) {
                self.queue
                    .write_buffer(&state.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
            }
        }
    }

    fn create_object_state(
        &mut self,
        id: ResourceId,
        resource: &RenderResource<GpuMesh>,
        uniform: &ObjectUniform,
        texture_key: Vec<Option<String>>,
    ) -> ObjectGpuState {
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let object_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.layouts.object,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() }],
            label: Some("object_bind_group"),
        });

        for path in texture_key.iter().flatten() {
            self.textures.load(&self.device, &self.queue, path);
        }
        let texture_bind_group = match &resource.material {
            Material::Pbr { textures, .. } => {
                let [albedo, normal, metallic, roughness, ao] = textures.channels();
                let white = &self.fallbacks.white;
                let views = [
                    channel_view(&self.textures, albedo, white),
                    channel_view(&self.textures, normal, &self.fallbacks.flat_normal),
                    channel_view(&self.textures, metallic, white),
                    channel_view(&self.textures, roughness, white),
                    channel_view(&self.textures, ao, white),
                ];
                let mut entries: Vec<wgpu::BindGroupEntry> = views
                    .into_iter()
                    .enumerate()
                    .map(|(binding, view)| wgpu::BindGroupEntry {
                        binding: binding as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
                    .collect();
                entries.push(wgpu::BindGroupEntry {
                    binding: entries.len() as u32,
                    resource: wgpu::BindingResource::Sampler(&white.sampler),
                });
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.layouts.pbr_textures,
                    entries: &entries,
                    label: Some("pbr_texture_bind_group"),
                })
            }
            Material::Simple { albedo, .. } => {
                let texture = albedo
                    .as_deref()
                    .and_then(|p| self.textures.get(p))
                    .unwrap_or(&self.fallbacks.white);
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.layouts.simple_textures,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                    label: Some("simple_texture_bind_group"),
                })
            }
        };
        debug!("Created GPU state for {}", id);

        ObjectGpuState { uniform_buffer, object_bind_group, texture_bind_group, texture_key }
    }

    fn prepare_skybox(&mut self, scene: &SceneRegistry<WgpuAllocator>) {
        let Some(skybox) = scene.skybox() else {
            self.skybox = SkyboxState::Unloaded;
            return;
        };
        if !matches!(self.skybox, SkyboxState::Unloaded) {
            return;
        }
        self.skybox = match self.textures.load_cube_map(&self.device, &self.queue, &skybox.texture_dir) {
            Ok(cube) => {
                info!("Loaded skybox from {:?}", self.textures.root().join(&skybox.texture_dir));
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.layouts.skybox,
                    entries: &[
                        wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&cube.view) },
                        wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&cube.sampler) },
                    ],
                    label: Some("skybox_bind_group"),
                });
                SkyboxState::Ready(bind_group)
            }
            Err(e) => {
                warn!("Skybox textures unavailable, drawing without it: {}", e);
                SkyboxState::Missing
            }
        };
    }

    pub fn render(&mut self, scene: &SceneRegistry<WgpuAllocator>) -> Result<(), wgpu::SurfaceError> {
        self.update_frame_uniforms(scene);
        self.prepare_objects(scene);
        self.prepare_skybox(scene);

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            if let (SkyboxState::Ready(bind_group), Some(skybox)) = (&self.skybox, scene.skybox()) {
                render_pass.set_pipeline(&self.pipelines.skybox);
                render_pass.set_bind_group(1, bind_group, &[]);
                skybox.mesh.bind(&mut render_pass);
                skybox.mesh.draw(&mut render_pass);
            }

            let mut drawn = 0;
            for (id, resource) in scene.renderables() {
                let Some(state) = self.objects.get(&id) else {
                    continue;
                };
                let key = (resource.material.kind(), resource.mesh.topology());
                let Some(pipeline) = self.pipelines.objects.get(&key) else {
                    warn!("No pipeline for {:?}, skipping {}", key, id);
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &state.object_bind_group, &[]);
                render_pass.set_bind_group(2, &state.texture_bind_group, &[]);
                resource.mesh.bind(&mut render_pass);
                resource.mesh.draw(&mut render_pass);
                drawn += 1;
            }
            debug!("Drew {} objects", drawn);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Renders one frame and recovers from the surface errors that allow it.
    /// Returns false when rendering cannot continue.
    pub fn render_frame(&mut self, scene: &SceneRegistry<WgpuAllocator>) -> bool {
        match self.render(scene) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.resize(self.size);
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Surface out of memory");
                false
            }
            Err(e) => {
                warn!("Surface error: {:?}, skipping frame", e);
                true
            }
        }
    }
}

fn channel_view<'a>(loader: &'a TextureLoader, path: Option<&str>, fallback: &'a Texture) -> &'a wgpu::TextureView {
    &path.and_then(|p| loader.get(p)).unwrap_or(fallback).view
}

fn texture_key(material: &Material) -> Vec<Option<String>> {
    match material {
        Material::Pbr { textures, .. } => textures.channels().iter().map(|c| c.map(str::to_string)).collect(),
        Material::Simple { albedo, .. } => vec![albedo.clone()],
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_layouts(device: &wgpu::Device) -> BindGroupLayouts {
    let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
    let d2 = wgpu::TextureViewDimension::D2;

    let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, both), uniform_entry(1, both)],
        label: Some("frame_bind_group_layout"),
    });
    let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, both)],
        label: Some("object_bind_group_layout"),
    });
    let pbr_textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0, d2),
            texture_entry(1, d2),
            texture_entry(2, d2),
            texture_entry(3, d2),
            texture_entry(4, d2),
            sampler_entry(5),
        ],
        label: Some("pbr_texture_bind_group_layout"),
    });
    let simple_textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture_entry(0, d2), sampler_entry(1)],
        label: Some("simple_texture_bind_group_layout"),
    });
    let skybox = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture_entry(0, wgpu::TextureViewDimension::Cube), sampler_entry(1)],
        label: Some("skybox_bind_group_layout"),
    });

    BindGroupLayouts { frame, object, pbr_textures, simple_textures, skybox }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex_layout: wgpu::VertexBufferLayout<'a>,
    topology: Topology,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    info!("Creating {} pipeline", desc.label);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[desc.vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology.into(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.topology.cull_mode(),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_pipelines(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    format: wgpu::TextureFormat,
) -> anyhow::Result<Pipelines> {
    let pbr_config = pbr_config(0);
    let pbr_attributes = pbr_config.vertex_attributes()?;
    let simple_config = MeshData::default().simple_config();
    let simple_attributes = simple_config.vertex_attributes()?;
    let skybox_config = skybox_config(0);
    let skybox_attributes = skybox_config.vertex_attributes()?;

    let mut objects = HashMap::new();
    for topology in Topology::ALL {
        let pbr = create_pipeline(device, format, PipelineDesc {
            label: &format!("PBR Pipeline ({:?})", topology),
            source: include_str!("shaders/pbr.wgsl"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.pbr_textures],
            vertex_layout: wgpu::VertexBufferLayout {
                array_stride: pbr_config.vertex_size,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &pbr_attributes,
            },
            topology,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
        });
        let simple = create_pipeline(device, format, PipelineDesc {
            label: &format!("Simple Pipeline ({:?})", topology),
            source: include_str!("shaders/simple.wgsl"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.simple_textures],
            vertex_layout: wgpu::VertexBufferLayout {
                array_stride: simple_config.vertex_size,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &simple_attributes,
            },
            topology,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
        });
        objects.insert((MaterialKind::Pbr, topology), pbr);
        objects.insert((MaterialKind::Simple, topology), simple);
    }
    let skybox = create_pipeline(device, format, PipelineDesc {
        label: "Skybox Pipeline",
        source: include_str!("shaders/skybox.wgsl"),
        bind_group_layouts: &[&layouts.frame, &layouts.skybox],
        vertex_layout: wgpu::VertexBufferLayout {
            array_stride: skybox_config.vertex_size,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &skybox_attributes,
        },
        topology: Topology::TriangleList,
        depth_write: false,
        depth_compare: wgpu::CompareFunction::LessEqual,
    });

    Ok(Pipelines { objects, skybox })
}
