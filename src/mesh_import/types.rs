use crate::skeleton::SceneNode;
use log::warn;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// One bone's influence on one vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    pub vertex: usize,
    pub weight: f32,
}

/// A bone as the mesh sees it: its name, its offset matrix and the vertices
/// it moves
#[derive(Clone, Debug)]
pub struct ImportedBone {
    pub name: String,
    pub offset_matrix: glm::Mat4,
    pub weights: Vec<VertexWeight>,
}

/// The skinning part of a mesh. Vertex data other than weights belongs to
/// the renderer and isn't kept.
#[derive(Clone, Debug, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub vertex_count: usize,
    pub bones: Vec<ImportedBone>,
}

/// Timed key. Times are in ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Key<T> {
    pub time: f64,
    pub value: T,
}

pub type VectorKey = Key<glm::Vec3>;
pub type QuatKey = Key<glm::Quat>;

/// Keys for one node. The three components are keyed independently and may
/// have different times and counts.
#[derive(Clone, Debug, Default)]
pub struct ImportedChannel {
    pub node_name: String,
    pub scale_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub translation_keys: Vec<VectorKey>,
}

impl ImportedChannel {
    #[must_use]
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scale_keys.is_empty()
            && self.rotation_keys.is_empty()
            && self.translation_keys.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImportedAnimation {
    pub name: String,
    /// Length in ticks. 0 if the file doesn't say.
    pub duration: f64,
    /// 0 if the file doesn't say
    pub ticks_per_second: f64,
    pub channels: Vec<ImportedChannel>,
}

/// Everything the animation core needs from a file
#[derive(Clone, Debug)]
pub struct ImportedScene {
    pub root: SceneNode,
    pub meshes: Vec<ImportedMesh>,
    pub animations: Vec<ImportedAnimation>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(default)]
pub struct ImportOptions {
    /// Used when a file doesn't give its animation tick rate
    pub default_ticks_per_second: f64,
}

/// Tick rate used when neither the file nor the options give a usable one
pub const FALLBACK_TICKS_PER_SECOND: f64 = 25.0;

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_ticks_per_second: FALLBACK_TICKS_PER_SECOND,
        }
    }
}

impl ImportOptions {
    /// The configured default tick rate. Zero, negative and non-finite
    /// values come from a bad settings file and are replaced by
    /// `FALLBACK_TICKS_PER_SECOND`.
    #[must_use]
    pub fn ticks_per_second(&self) -> f64 {
        let rate = self.default_ticks_per_second;
        if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            warn!(
                "default_ticks_per_second {} is not usable, using {}",
                rate, FALLBACK_TICKS_PER_SECOND
            );
            FALLBACK_TICKS_PER_SECOND
        }
    }
}

/// Errors specific to importing data. `RvError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoScene,
    NoPositions,
    SparseAnimation,
    NoSampler,
    CountMismatch(usize),
    BadJointIndex(usize),
    VertexOutOfRange(usize),
    TooManyBones(usize),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoScene => write!(f, "the file has no scene"),
            Self::NoPositions => {
                write!(f, "vertex positions are required")
            }
            Self::SparseAnimation => {
                write!(f, "sparse animation data is not supported")
            }
            Self::NoSampler => {
                write!(f, "a sampler is required for animation")
            }
            Self::CountMismatch(a) => {
                write!(f, "node {a} has mismatched key and value counts")
            }
            Self::BadJointIndex(a) => {
                write!(f, "joint index {a} is not in the skin")
            }
            Self::VertexOutOfRange(a) => {
                write!(f, "vertex {a} is out of range for its mesh")
            }
            Self::TooManyBones(a) => {
                write!(f, "bone {a} is beyond the supported bone count")
            }
        }
    }
}

impl std::error::Error for ImportError {}
