use wgpu::{Device, Queue, TextureFormat};
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::cache::AssetCache;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("Failed to load image: {0}")]
    LoadFailed(#[from] image::ImageError),
    #[error("Cube map faces differ in size: {0:?} vs {1:?}")]
    MismatchedFaces((u32, u32), (u32, u32)),
}

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

    pub fn from_image(device: &Device, queue: &Queue, img: &image::DynamicImage, label: Option<&str>) -> Self {
        let rgba = img.to_rgba8();
        let dimensions = img.dimensions();
        Self::from_rgba(device, queue, &rgba, dimensions, label)
    }

    /// 1x1 texture used where a material channel has no image.
    pub fn solid(device: &Device, queue: &Queue, rgba: [u8; 4], label: &str) -> Self {
        Self::from_rgba(device, queue, &rgba, (1, 1), Some(label))
    }

    fn from_rgba(device: &Device, queue: &Queue, rgba: &[u8], dimensions: (u32, u32), label: Option<&str>) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(
            &wgpu::TextureDescriptor {
                label,
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            }
        );

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = repeat_sampler(device);

        Self { texture, view, sampler }
    }

    /// Six faces in +x, -x, +y, -y, +z, -z order.
    pub fn cube_map(device: &Device, queue: &Queue, faces: &[image::RgbaImage; 6], label: &str) -> Result<Self, TextureError> {
        let dimensions = faces[0].dimensions();
        if let Some(face) = faces.iter().find(|f| f.dimensions() != dimensions) {
            return Err(TextureError::MismatchedFaces(dimensions, face.dimensions()));
        }
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: 0, z: layer as u32 },
                    aspect: wgpu::TextureAspect::All,
                },
                face.as_raw(),
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * dimensions.0),
                    rows_per_image: Some(dimensions.1),
                },
                wgpu::Extent3d { depth_or_array_layers: 1, ..size },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Ok(Self { texture, view, sampler })
    }

    pub fn depth(device: &Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = repeat_sampler(device);
        Self { texture, view, sampler }
    }
}

fn repeat_sampler(device: &Device) -> wgpu::Sampler {
    device.create_sampler(
        &wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    )
}

/// Loads textures by path relative to a root directory, once each.
///
/// Paths that fail to load are remembered as misses so the renderer falls
/// back to a flat texture without retrying every frame.
pub struct TextureLoader {
    root: PathBuf,
    cache: AssetCache<String, Option<Texture>>,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: AssetCache::new(),
        }
    }

    /// Makes sure `key` has been attempted, returning whether it is usable.
    pub fn load(&mut self, device: &Device, queue: &Queue, key: &str) -> bool {
        let root = &self.root;
        self.cache
            .get_or_insert_with(key.to_string(), || {
                let path = root.join(key);
                match image::open(&path) {
                    Ok(img) => {
                        info!("Loaded texture: {:?}", path);
                        Some(Texture::from_image(device, queue, &img, Some(key)))
                    }
                    Err(e) => {
                        warn!("Failed to load texture: {:?}, error: {}", path, e);
                        None
                    }
                }
            })
            .is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.cache.get(&key.to_string()).and_then(Option::as_ref)
    }

    pub fn load_cube_map(&self, device: &Device, queue: &Queue, dir: &str) -> Result<Texture, TextureError> {
        let face = |name: &str| -> Result<image::RgbaImage, TextureError> {
            Ok(image::open(self.root.join(dir).join(name))?.to_rgba8())
        };
        let faces = [
            face("px.png")?,
            face("nx.png")?,
            face("py.png")?,
            face("ny.png")?,
            face("pz.png")?,
            face("nz.png")?,
        ];
        Texture::cube_map(device, queue, &faces, dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
