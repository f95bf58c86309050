use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("vertex layout has no attributes")]
    EmptyLayout,
    #[error("mesh has no vertices")]
    EmptyMesh,
    #[error("unsupported vertex attribute at slot {slot}: {components} x {component:?} (normalized: {normalized})")]
    UnsupportedLayout {
        slot: u32,
        components: u32,
        component: ComponentType,
        normalized: bool,
    },
    #[error("attribute at slot {slot} ends at byte {end}, past the {stride}-byte stride")]
    AttributeOutOfBounds { slot: u32, end: u64, stride: u64 },
    #[error("vertex data is {actual} bytes, expected {expected}")]
    VertexDataSize { expected: u64, actual: u64 },
    #[error("index data holds {actual} indices, expected {expected}")]
    IndexDataSize { expected: u32, actual: u32 },
    #[error("index {index} is past the {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Uint8,
    Uint16,
    Uint32,
    Sint32,
}

impl ComponentType {
    pub fn size(&self) -> u64 {
        match self {
            ComponentType::Uint8 => 1,
            ComponentType::Uint16 => 2,
            ComponentType::Float32 | ComponentType::Uint32 | ComponentType::Sint32 => 4,
        }
    }
}

/// One vertex attribute: where it binds and where it sits inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribInfo {
    pub slot: u32,
    pub components: u32,
    pub component: ComponentType,
    pub normalized: bool,
    pub stride: u64,
    pub offset: u64,
}

impl AttribInfo {
    pub const fn float(slot: u32, components: u32, stride: u64, offset: u64) -> Self {
        Self {
            slot,
            components,
            component: ComponentType::Float32,
            normalized: false,
            stride,
            offset,
        }
    }

    pub fn format(&self) -> Result<wgpu::VertexFormat, RenderError> {
        use wgpu::VertexFormat as F;
        use ComponentType as C;
        let format = match (self.component, self.components, self.normalized) {
            (C::Float32, 1, false) => F::Float32,
            (C::Float32, 2, false) => F::Float32x2,
            (C::Float32, 3, false) => F::Float32x3,
            (C::Float32, 4, false) => F::Float32x4,
            (C::Uint8, 2, false) => F::Uint8x2,
            (C::Uint8, 4, false) => F::Uint8x4,
            (C::Uint8, 2, true) => F::Unorm8x2,
            (C::Uint8, 4, true) => F::Unorm8x4,
            (C::Uint16, 2, false) => F::Uint16x2,
            (C::Uint16, 4, false) => F::Uint16x4,
            (C::Uint16, 2, true) => F::Unorm16x2,
            (C::Uint16, 4, true) => F::Unorm16x4,
            (C::Uint32, 1, false) => F::Uint32,
            (C::Uint32, 2, false) => F::Uint32x2,
            (C::Uint32, 3, false) => F::Uint32x3,
            (C::Uint32, 4, false) => F::Uint32x4,
            (C::Sint32, 1, false) => F::Sint32,
            (C::Sint32, 2, false) => F::Sint32x2,
            (C::Sint32, 3, false) => F::Sint32x3,
            (C::Sint32, 4, false) => F::Sint32x4,
            _ => {
                return Err(RenderError::UnsupportedLayout {
                    slot: self.slot,
                    components: self.components,
                    component: self.component,
                    normalized: self.normalized,
                })
            }
        };
        Ok(format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

impl Topology {
    pub const ALL: [Topology; 4] = [
        Topology::TriangleList,
        Topology::TriangleStrip,
        Topology::LineList,
        Topology::PointList,
    ];

    /// Lines and points have no facing, so only triangles are culled.
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Topology::TriangleList | Topology::TriangleStrip => Some(wgpu::Face::Back),
            Topology::LineList | Topology::PointList => None,
        }
    }
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
            Topology::PointList => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Everything the allocator needs to turn raw bytes into a mesh resource.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    pub attributes: Vec<AttribInfo>,
    pub vertex_size: u64,
    pub vertex_count: u32,
    /// `None` draws non-indexed over `vertex_count`.
    pub index_count: Option<u32>,
    pub topology: Topology,
}

impl MeshConfig {
    /// Checks the layout alone and converts it to wgpu attributes. Pipelines
    /// use this before any mesh exists.
    pub fn vertex_attributes(&self) -> Result<Vec<wgpu::VertexAttribute>, RenderError> {
        if self.attributes.is_empty() {
            return Err(RenderError::EmptyLayout);
        }
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for attrib in &self.attributes {
            let format = attrib.format()?;
            let end = attrib.offset + format.size();
            if end > attrib.stride || attrib.stride != self.vertex_size {
                return Err(RenderError::AttributeOutOfBounds {
                    slot: attrib.slot,
                    end,
                    stride: self.vertex_size,
                });
            }
            attributes.push(wgpu::VertexAttribute {
                format,
                offset: attrib.offset,
                shader_location: attrib.slot,
            });
        }
        Ok(attributes)
    }

    /// Checks the layout and the data sizes against each other, returning the
    /// wgpu attribute list on success.
    pub fn validate(
        &self,
        vertex_data: &[u8],
        index_data: Option<&[u32]>,
    ) -> Result<Vec<wgpu::VertexAttribute>, RenderError> {
        let attributes = self.vertex_attributes()?;
        if self.vertex_count == 0 {
            return Err(RenderError::EmptyMesh);
        }

        let expected = self.vertex_size * self.vertex_count as u64;
        if vertex_data.len() as u64 != expected {
            return Err(RenderError::VertexDataSize {
                expected,
                actual: vertex_data.len() as u64,
            });
        }

        match (self.index_count, index_data) {
            (Some(expected), Some(indices)) if indices.len() as u32 == expected => {
                if let Some(&index) = indices.iter().find(|&&i| i >= self.vertex_count) {
                    return Err(RenderError::IndexOutOfRange { index, vertex_count: self.vertex_count });
                }
            }
            (None, None) => {}
            (expected, indices) => {
                return Err(RenderError::IndexDataSize {
                    expected: expected.unwrap_or(0),
                    actual: indices.map_or(0, |i| i.len() as u32),
                })
            }
        }
        Ok(attributes)
    }
}

/// A mesh living on whatever device created it.
pub trait MeshResource {
    fn vertex_count(&self) -> u32;
    fn index_count(&self) -> Option<u32>;
    fn topology(&self) -> Topology;
    /// Frees the underlying buffers. Calling it twice is a no-op.
    fn cleanup(&mut self);
}

/// Builds mesh resources from a layout and raw bytes. Knows nothing about
/// physics or scene lifecycle.
pub trait MeshAllocator {
    type Mesh: MeshResource;

    fn create_mesh_buffer(
        &mut self,
        config: &MeshConfig,
        vertex_data: &[u8],
        index_data: Option<&[u32]>,
    ) -> Result<Self::Mesh, RenderError>;
}

// =============================================================================
// wgpu backend
// =============================================================================

pub struct GpuMesh {
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: Option<u32>,
    topology: Topology,
    pub layout: Arc<[wgpu::VertexAttribute]>,
    pub stride: u64,
}

impl GpuMesh {
    pub fn vertex_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.layout,
        }
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(vertex_buffer) = &self.vertex_buffer {
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        }
        if let Some(index_buffer) = &self.index_buffer {
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.vertex_buffer.is_none() {
            return;
        }
        match self.index_count {
            Some(count) => pass.draw_indexed(0..count, 0, 0..1),
            None => pass.draw(0..self.vertex_count, 0..1),
        }
    }
}

impl MeshResource for GpuMesh {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn index_count(&self) -> Option<u32> {
        self.index_count
    }

    fn topology(&self) -> Topology {
        self.topology
    }

    fn cleanup(&mut self) {
        if let Some(buffer) = self.vertex_buffer.take() {
            buffer.destroy();
        }
        if let Some(buffer) = self.index_buffer.take() {
            buffer.destroy();
        }
    }
}

pub struct WgpuAllocator {
    device: Arc<wgpu::Device>,
}

impl WgpuAllocator {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl MeshAllocator for WgpuAllocator {
    type Mesh = GpuMesh;

    fn create_mesh_buffer(
        &mut self,
        config: &MeshConfig,
        vertex_data: &[u8],
        index_data: Option<&[u32]>,
    ) -> Result<GpuMesh, RenderError> {
        let layout = config.validate(vertex_data, index_data)?;

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertex_data,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = index_data.map(|indices| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        debug!(
            "Created mesh buffer: {} vertices, {:?} indices",
            config.vertex_count, config.index_count
        );

        Ok(GpuMesh {
            vertex_buffer: Some(vertex_buffer),
            index_buffer,
            vertex_count: config.vertex_count,
            index_count: config.index_count,
            topology: config.topology,
            layout: layout.into(),
            stride: config.vertex_size,
        })
    }
}

// =============================================================================
// Headless backend
// =============================================================================

/// Allocator that keeps no GPU state, for simulation-only runs and tests.
/// It counts live meshes so callers can check that teardown frees them.
#[derive(Debug, Default)]
pub struct HeadlessAllocator {
    live: Arc<AtomicUsize>,
    created: usize,
}

impl HeadlessAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_meshes(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn created_meshes(&self) -> usize {
        self.created
    }
}

#[derive(Debug)]
pub struct HeadlessMesh {
    vertex_count: u32,
    index_count: Option<u32>,
    topology: Topology,
    live: Option<Arc<AtomicUsize>>,
}

impl MeshResource for HeadlessMesh {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn index_count(&self) -> Option<u32> {
        self.index_count
    }

    fn topology(&self) -> Topology {
        self.topology
    }

    fn cleanup(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl MeshAllocator for HeadlessAllocator {
    type Mesh = HeadlessMesh;

    fn create_mesh_buffer(
        &mut self,
        config: &MeshConfig,
        vertex_data: &[u8],
        index_data: Option<&[u32]>,
    ) -> Result<HeadlessMesh, RenderError> {
        config.validate(vertex_data, index_data)?;
        self.live.fetch_add(1, Ordering::Relaxed);
        self.created += 1;
        Ok(HeadlessMesh {
            vertex_count: config.vertex_count,
            index_count: config.index_count,
            topology: config.topology,
            live: Some(Arc::clone(&self.live)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_only(vertex_count: u32) -> MeshConfig {
        MeshConfig {
            attributes: vec![AttribInfo::float(0, 3, 12, 0)],
            vertex_size: 12,
            vertex_count,
            index_count: None,
            topology: Topology::TriangleList,
        }
    }

    #[test]
    fn validate_accepts_matching_data() {
        let config = position_only(3);
        let attributes = config.validate(&[0u8; 36], None).unwrap();
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn unsupported_component_count_is_rejected() {
        let mut config = position_only(1);
        config.attributes[0].components = 5;
        config.attributes[0].stride = 20;
        config.vertex_size = 20;
        assert!(matches!(
            config.validate(&[0u8; 20], None),
            Err(RenderError::UnsupportedLayout { slot: 0, components: 5, .. })
        ));
    }

    #[test]
    fn attribute_past_stride_is_rejected() {
        let mut config = position_only(1);
        config.attributes.push(AttribInfo::float(1, 3, 12, 4));
        assert!(matches!(
            config.validate(&[0u8; 12], None),
            Err(RenderError::AttributeOutOfBounds { slot: 1, .. })
        ));
    }

    #[test]
    fn size_mismatches_are_rejected() {
        let config = position_only(3);
        assert!(matches!(
            config.validate(&[0u8; 12], None),
            Err(RenderError::VertexDataSize { expected: 36, actual: 12 })
        ));

        let indexed = MeshConfig { index_count: Some(6), ..position_only(3) };
        assert!(matches!(
            indexed.validate(&[0u8; 36], Some(&[0, 1, 2])),
            Err(RenderError::IndexDataSize { expected: 6, actual: 3 })
        ));
        assert!(indexed.validate(&[0u8; 36], None).is_err());
    }

    #[test]
    fn empty_or_overrunning_meshes_are_rejected() {
        assert_eq!(position_only(0).validate(&[], None), Err(RenderError::EmptyMesh));

        let indexed = MeshConfig { index_count: Some(3), ..position_only(3) };
        assert_eq!(
            indexed.validate(&[0u8; 36], Some(&[0, 1, 3])),
            Err(RenderError::IndexOutOfRange { index: 3, vertex_count: 3 })
        );
    }

    #[test]
    fn only_triangle_topologies_are_culled() {
        let culled: Vec<_> = Topology::ALL.iter().filter(|t| t.cull_mode().is_some()).collect();
        assert_eq!(culled, vec![&Topology::TriangleList, &Topology::TriangleStrip]);
        assert_eq!(
            wgpu::PrimitiveTopology::from(Topology::LineList),
            wgpu::PrimitiveTopology::LineList
        );
    }

    #[test]
    fn headless_meshes_track_liveness() {
        let mut allocator = HeadlessAllocator::new();
        let mut a = allocator.create_mesh_buffer(&position_only(3), &[0u8; 36], None).unwrap();
        let _b = allocator.create_mesh_buffer(&position_only(3), &[0u8; 36], None).unwrap();
        assert_eq!(allocator.live_meshes(), 2);

        a.cleanup();
        a.cleanup();
        assert_eq!(allocator.live_meshes(), 1);
        assert_eq!(allocator.created_meshes(), 2);
        assert_eq!(a.index_count(), None);
    }
}
