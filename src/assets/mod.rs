pub mod cache;
pub mod material;
pub mod mesh;
pub mod texture;

pub use material::{Material, MaterialKind, PbrParams, PbrTextures, SimpleParams, TextureFlags};
pub use mesh::{MeshData, PbrVertex, Vertex};
