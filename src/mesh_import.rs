pub mod clip;
pub mod gltf_file;
mod types;

// Re-exports
pub use {
    clip::build_clip,
    types::{
        ImportError, ImportOptions, ImportedAnimation, ImportedBone,
        ImportedChannel, ImportedMesh, ImportedScene, Key, QuatKey, VectorKey,
        VertexWeight, FALLBACK_TICKS_PER_SECOND,
    },
};
