mod binding;
mod types;

// Re-exports
pub use {
    binding::{extract_bone_weights, VertexBinding},
    types::{BoneInfo, BoneRegistry, SceneNode, Skeleton, SkeletonNode},
};
