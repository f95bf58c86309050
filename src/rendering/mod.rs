pub mod buffer;
pub mod camera;
pub mod engine;
pub mod light;
pub mod scene;
pub mod transform;

pub use buffer::{GpuMesh, HeadlessAllocator, MeshAllocator, MeshResource, RenderError, WgpuAllocator};
pub use engine::RenderEngine;
pub use scene::{ObjectKind, ObjectSpec, SceneError, SceneRegistry};
pub use transform::Transform;
