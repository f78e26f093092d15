// Layouts shared with the skin shader. Both are plain old data so they can be
// cast straight to bytes for upload.
use crate::{dualquat::SkinDualQuat, skeleton::VertexBinding, types::MAX_INFLUENCES};
use bytemuck::{Pod, Zeroable};

/// Per vertex skinning attributes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
pub struct SkinVertex {
    pub bone_ids: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl From<&VertexBinding> for SkinVertex {
    fn from(binding: &VertexBinding) -> Self {
        Self {
            bone_ids: binding.bone_ids,
            weights: binding.weights,
        }
    }
}

/// Dual quaternion palette entry as the shader's `mat2x4` plus `mat4`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
pub struct GpuSkinDualQuat {
    pub dq: [[f32; 4]; 2],
    pub scale: [[f32; 4]; 4],
}

impl From<&SkinDualQuat> for GpuSkinDualQuat {
    fn from(skin: &SkinDualQuat) -> Self {
        Self {
            dq: skin.dq.into(),
            scale: skin.scale.into(),
        }
    }
}
