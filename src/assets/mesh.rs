use std::f32::consts::PI;
use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::rendering::buffer::{AttribInfo, MeshConfig, RenderError, Topology};

/// Position / normal / texcoord, the layout of the simple-shaded pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const STRIDE: u64 = mem::size_of::<Vertex>() as u64;

    pub fn attributes() -> Vec<AttribInfo> {
        vec![
            AttribInfo::float(0, 3, Self::STRIDE, 0),
            AttribInfo::float(1, 3, Self::STRIDE, 12),
            AttribInfo::float(2, 2, Self::STRIDE, 24),
        ]
    }
}

/// [`Vertex`] plus a tangent basis, the layout of the PBR pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PbrVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl PbrVertex {
    const STRIDE: u64 = mem::size_of::<PbrVertex>() as u64;

    pub fn attributes() -> Vec<AttribInfo> {
        vec![
            AttribInfo::float(0, 3, Self::STRIDE, 0),
            AttribInfo::float(1, 3, Self::STRIDE, 12),
            AttribInfo::float(2, 2, Self::STRIDE, 24),
            AttribInfo::float(3, 3, Self::STRIDE, 32),
            AttribInfo::float(4, 3, Self::STRIDE, 44),
        ]
    }
}

/// CPU-side geometry before it is handed to an allocator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    /// Unit-radius UV sphere. Indexed.
    pub fn uv_sphere(stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let phi = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let theta = u * 2.0 * PI;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex {
                    position: normal.to_array(),
                    normal: normal.to_array(),
                    tex_coords: [u, v],
                });
            }
        }

        let ring = slices + 1;
        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * ring + slice;
                let b = a + ring;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Self { vertices, indices: Some(indices) }
    }

    /// Unit cube as 36 unshared vertices so every face keeps its own normal.
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u axis, v axis
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let mut vertices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in FACES {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u_axis), Vec3::from(v_axis));
            let corner = |su: f32, sv: f32| Vertex {
                position: ((n + u * su + v * sv) * 0.5).to_array(),
                normal,
                tex_coords: [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5],
            };
            let quad = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
            vertices.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
        }
        Self { vertices, indices: None }
    }

    /// Unrolls indices so every three vertices form one triangle.
    pub fn flattened(&self) -> Result<Vec<Vertex>, RenderError> {
        let Some(indices) = &self.indices else {
            return Ok(self.vertices.clone());
        };
        indices
            .iter()
            .map(|&index| {
                self.vertices.get(index as usize).copied().ok_or(RenderError::IndexOutOfRange {
                    index,
                    vertex_count: self.vertices.len() as u32,
                })
            })
            .collect()
    }

    pub fn simple_config(&self) -> MeshConfig {
        MeshConfig {
            attributes: Vertex::attributes(),
            vertex_size: Vertex::STRIDE,
            vertex_count: self.vertices.len() as u32,
            index_count: self.indices.as_ref().map(|i| i.len() as u32),
            topology: Topology::TriangleList,
        }
    }
}

/// Accumulates a per-triangle tangent basis onto each vertex of a
/// non-indexed triangle list, then normalizes it.
pub fn with_tangents(triangles: &[Vertex]) -> Vec<PbrVertex> {
    let mut out: Vec<PbrVertex> = triangles
        .iter()
        .map(|v| PbrVertex {
            position: v.position,
            normal: v.normal,
            tex_coords: v.tex_coords,
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect();

    for tri in out.chunks_exact_mut(3) {
        let p0 = Vec3::from(tri[0].position);
        let edge1 = Vec3::from(tri[1].position) - p0;
        let edge2 = Vec3::from(tri[2].position) - p0;
        let uv0 = Vec2::from(tri[0].tex_coords);
        let d1 = Vec2::from(tri[1].tex_coords) - uv0;
        let d2 = Vec2::from(tri[2].tex_coords) - uv0;

        let det = d1.x * d2.y - d2.x * d1.y;
        // Degenerate UVs (poles of a sphere) contribute nothing.
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let f = 1.0 / det;
        let tangent = (edge1 * d2.y - edge2 * d1.y) * f;
        let bitangent = (edge2 * d1.x - edge1 * d2.x) * f;

        for v in tri.iter_mut() {
            v.tangent = (Vec3::from(v.tangent) + tangent).to_array();
            v.bitangent = (Vec3::from(v.bitangent) + bitangent).to_array();
        }
    }

    for v in &mut out {
        v.tangent = Vec3::from(v.tangent).normalize_or_zero().to_array();
        v.bitangent = Vec3::from(v.bitangent).normalize_or_zero().to_array();
    }
    out
}

pub fn pbr_config(vertex_count: u32) -> MeshConfig {
    MeshConfig {
        attributes: PbrVertex::attributes(),
        vertex_size: PbrVertex::STRIDE,
        vertex_count,
        index_count: None,
        topology: Topology::TriangleList,
    }
}

/// Position-only cube, wound to be seen from the inside.
pub fn skybox_positions() -> Vec<[f32; 3]> {
    MeshData::cube()
        .vertices
        .chunks_exact(3)
        .flat_map(|tri| [tri[0].position, tri[2].position, tri[1].position])
        .map(|p| [p[0] * 2.0, p[1] * 2.0, p[2] * 2.0])
        .collect()
}

pub fn skybox_config(vertex_count: u32) -> MeshConfig {
    MeshConfig {
        attributes: vec![AttribInfo::float(0, 3, 12, 0)],
        vertex_size: 12,
        vertex_count,
        index_count: None,
        topology: Topology::TriangleList,
    }
}
