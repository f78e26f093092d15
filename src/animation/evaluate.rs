use super::{
    interpolate::{sample_cubic, sample_frame, sample_linear},
    types::{AnimationClip, BoneTrack, Sqt},
};
use crate::{
    dualquat::SkinDualQuat,
    skeleton::{Skeleton, SkeletonNode},
    vertex::GpuSkinDualQuat,
};
use log::{debug, trace};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// What point of a clip to evaluate
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sampling {
    /// Authored sample index, no interpolation
    Frame(usize),
    /// Seconds from the start of the clip, interpolated
    Time(f64),
}

/// How continuous time is interpolated between samples
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum Interpolation {
    #[default]
    Linear,
    Cubic,
}

/// Output representation for the skin shader
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum SkinMode {
    /// One 4x4 matrix per bone for linear blend skinning
    #[default]
    Matrix,
    /// Dual quaternion plus scale matrix per bone
    DualQuat,
}

/// Owned copy of an evaluated palette, one entry per bone index
#[derive(Clone, Debug, PartialEq)]
pub enum BoneTransforms {
    Matrices(Vec<glm::Mat4>),
    DualQuats(Vec<SkinDualQuat>),
}

impl Default for BoneTransforms {
    fn default() -> Self {
        Self::Matrices(Vec::new())
    }
}

impl BoneTransforms {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Matrices(m) => m.len(),
            Self::DualQuats(d) => d.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bone matrix regardless of representation
    #[must_use]
    pub fn matrix(&self, bone: usize) -> Option<glm::Mat4> {
        match self {
            Self::Matrices(m) => m.get(bone).copied(),
            Self::DualQuats(d) => d.get(bone).map(SkinDualQuat::to_mat4),
        }
    }

    /// Bytes ready for upload to a uniform or storage buffer
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Matrices(m) => bytemuck::cast_slice(m).to_vec(),
            Self::DualQuats(d) => {
                let gpu: Vec<GpuSkinDualQuat> =
                    d.iter().map(GpuSkinDualQuat::from).collect();
                bytemuck::cast_slice(&gpu).to_vec()
            }
        }
    }
}

/// Samples one track. `None` for an empty track.
#[must_use]
pub fn sample_track(
    track: &BoneTrack,
    sampling: Sampling,
    interpolation: Interpolation,
) -> Option<Sqt> {
    match (sampling, interpolation) {
        (Sampling::Frame(frame), _) => sample_frame(&track.samples, frame),
        (Sampling::Time(time), Interpolation::Linear) => {
            sample_linear(&track.samples, time)
        }
        (Sampling::Time(time), Interpolation::Cubic) => {
            sample_cubic(&track.samples, time)
        }
    }
}

/// Local transform of a node: the sampled track if the clip animates it,
/// otherwise the bind transform
#[must_use]
pub fn local_transform(
    node: &SkeletonNode,
    clip: Option<&AnimationClip>,
    sampling: Sampling,
    interpolation: Interpolation,
) -> glm::Mat4 {
    clip.and_then(|c| c.track(&node.name))
        .and_then(|track| sample_track(track, sampling, interpolation))
        .map_or(node.local_bind, |sqt| sqt.to_mat4())
}

/// Evaluates clips against a skeleton. The evaluator owns the output buffers,
/// which are overwritten by every call to `evaluate`. Use `snapshot` to keep
/// a copy.
#[derive(Clone, Debug, Default)]
pub struct PoseEvaluator {
    interpolation: Interpolation,
    skin_mode: SkinMode,
    matrices: Vec<glm::Mat4>,
    dual_quats: Vec<SkinDualQuat>,
}

impl PoseEvaluator {
    #[must_use]
    pub const fn new(interpolation: Interpolation, skin_mode: SkinMode) -> Self {
        Self {
            interpolation,
            skin_mode,
            matrices: Vec::new(),
            dual_quats: Vec::new(),
        }
    }

    #[must_use]
    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    #[must_use]
    pub const fn skin_mode(&self) -> SkinMode {
        self.skin_mode
    }

    pub fn set_skin_mode(&mut self, skin_mode: SkinMode) {
        self.skin_mode = skin_mode;
    }

    /// Matrices from the last evaluation, indexed by bone id
    #[must_use]
    pub fn bone_matrices(&self) -> &[glm::Mat4] {
        &self.matrices
    }

    /// Dual quaternions from the last evaluation. Empty unless the skin mode
    /// is `SkinMode::DualQuat`.
    #[must_use]
    pub fn dual_quats(&self) -> &[SkinDualQuat] {
        &self.dual_quats
    }

    /// Copies the last evaluation out in the current skin mode
    #[must_use]
    pub fn snapshot(&self) -> BoneTransforms {
        match self.skin_mode {
            SkinMode::Matrix => BoneTransforms::Matrices(self.matrices.clone()),
            SkinMode::DualQuat => {
                BoneTransforms::DualQuats(self.dual_quats.clone())
            }
        }
    }

    /// Empties the output buffers
    pub fn clear(&mut self) {
        self.matrices.clear();
        self.dual_quats.clear();
    }

    /// Evaluates `clip` on `skeleton`. With no clip the skeleton is posed
    /// in its bind pose. Bones that never appear in the hierarchy keep the
    /// identity.
    pub fn evaluate(
        &mut self,
        skeleton: &Skeleton,
        clip: Option<&AnimationClip>,
        sampling: Sampling,
    ) {
        let bone_count = skeleton.bone_count();
        self.matrices.clear();
        self.matrices.resize(bone_count, glm::Mat4::identity());
        self.dual_quats.clear();
        if self.skin_mode == SkinMode::DualQuat {
            self.dual_quats.resize(bone_count, SkinDualQuat::default());
        }
        if skeleton.is_empty() {
            return;
        }
        trace!(
            "evaluate clip={:?} sampling={:?} bones={}",
            clip.map(AnimationClip::name),
            sampling,
            bone_count
        );
        self.traverse(skeleton, clip, sampling, 0, &glm::Mat4::identity());
    }

    // Call with the root node to recursively calculate node transforms,
    // parents before children
    fn traverse(
        &mut self,
        skeleton: &Skeleton,
        clip: Option<&AnimationClip>,
        sampling: Sampling,
        node_index: usize,
        parent: &glm::Mat4,
    ) {
        let Some(node) = skeleton.node(node_index) else {
            debug!("node_index={} not in skeleton", node_index);
            return;
        };

        let local = local_transform(node, clip, sampling, self.interpolation);
        let global = parent * local;

        if let Some(info) = node.bone.and_then(|b| skeleton.bones().get(b)) {
            let model = skeleton.root_inverse_bind() * global;
            self.matrices[info.id] = model * info.offset_matrix;
            if self.skin_mode == SkinMode::DualQuat {
                self.dual_quats[info.id] =
                    SkinDualQuat::from_parts(&model, &info.offset_matrix);
            }
        }

        for child_index in &node.children {
            self.traverse(skeleton, clip, sampling, *child_index, &global);
        }
    }
}

/// Returns the bone transforms for a clip at one moment
#[must_use]
pub fn animate(
    skeleton: &Skeleton,
    clip: Option<&AnimationClip>,
    sampling: Sampling,
    interpolation: Interpolation,
    skin_mode: SkinMode,
) -> BoneTransforms {
    let mut evaluator = PoseEvaluator::new(interpolation, skin_mode);
    evaluator.evaluate(skeleton, clip, sampling);
    evaluator.snapshot()
}
