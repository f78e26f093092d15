use crate::{
    animation::AnimationClip,
    mesh_import::{build_clip, gltf_file, ImportOptions, ImportedScene},
    rv_error::RvError,
    skeleton::{extract_bone_weights, BoneRegistry, Skeleton, VertexBinding},
    types::MAX_BONES,
    vertex::SkinVertex,
};
use log::{info, warn};
use std::path::Path;

/// A rigged mesh asset: its skeleton, the bone bindings of every vertex and
/// the clips that can drive it. Immutable once built.
#[derive(Clone, Debug)]
pub struct SkinnedModel {
    name: String,
    skeleton: Skeleton,
    bindings: Vec<VertexBinding>,
    clips: Vec<AnimationClip>,
}

impl SkinnedModel {
    /// Builds a model from imported data. Bone ids are assigned across all
    /// meshes in the order the bones are first seen.
    ///
    /// # Errors
    /// May return `RvError`
    pub fn from_scene(
        name: impl Into<String>,
        scene: &ImportedScene,
        options: &ImportOptions,
    ) -> Result<Self, RvError> {
        let name = name.into();
        let mut registry = BoneRegistry::new();
        let mut bindings = Vec::new();
        for mesh in &scene.meshes {
            bindings.extend(extract_bone_weights(mesh, &mut registry)?);
        }
        if registry.len() > MAX_BONES {
            warn!(
                "model {} has {} bones, the skin shader holds {}",
                name,
                registry.len(),
                MAX_BONES
            );
        }

        let skeleton = Skeleton::new(&scene.root, registry);
        let clips: Vec<AnimationClip> = scene
            .animations
            .iter()
            .map(|a| build_clip(a, &skeleton, options))
            .collect();
        info!(
            "model {} vertices={} bones={} clips={}",
            name,
            bindings.len(),
            skeleton.bone_count(),
            clips.len()
        );

        Ok(Self {
            name,
            skeleton,
            bindings,
            clips,
        })
    }

    /// Loads a model from a file. Only glTF (`.gltf` and `.glb`) is
    /// supported.
    ///
    /// # Errors
    /// May return `RvError`
    pub fn load(path: &Path, options: &ImportOptions) -> Result<Self, RvError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let scene = match ext.as_deref() {
            Some("gltf" | "glb") => gltf_file::load(path)?,
            _ => {
                warn!("{:?} is not a supported file type", path);
                return Err(RvError::UnsupportedFormat);
            }
        };
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        Self::from_scene(name, &scene, options)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.skeleton.bone_count()
    }

    #[must_use]
    pub fn has_animations(&self) -> bool {
        !self.clips.is_empty()
    }

    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn animations(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Clip at `index`. An index past the end falls back to clip 0 with a
    /// warning. `None` only when the model has no clips.
    #[must_use]
    pub fn animation(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index).or_else(|| {
            if !self.clips.is_empty() {
                warn!(
                    "model {} has no animation {}, using 0",
                    self.name, index
                );
            }
            self.clips.first()
        })
    }

    /// Frame count of a clip, 0 if there is no clip
    #[must_use]
    pub fn animation_frame_num(&self, index: usize) -> usize {
        self.animation(index).map_or(0, AnimationClip::frame_count)
    }

    #[must_use]
    pub fn vertex_bindings(&self) -> &[VertexBinding] {
        &self.bindings
    }

    /// Bindings in the shader's vertex layout
    #[must_use]
    pub fn skin_vertices(&self) -> Vec<SkinVertex> {
        self.bindings.iter().map(SkinVertex::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh_import::{
            ImportedAnimation, ImportedBone, ImportedChannel, ImportedMesh,
            VectorKey, VertexWeight,
        },
        skeleton::SceneNode,
    };
    use nalgebra_glm as glm;

    fn granary() -> ImportedScene {
        ImportedScene {
            root: SceneNode {
                name: "root".to_string(),
                local_bind_transform: glm::Mat4::identity(),
                children: vec![SceneNode::new("bone", glm::Mat4::identity())],
            },
            meshes: vec![ImportedMesh {
                name: "cube".to_string(),
                vertex_count: 2,
                bones: vec![ImportedBone {
                    name: "bone".to_string(),
                    offset_matrix: glm::Mat4::identity(),
                    weights: vec![VertexWeight {
                        vertex: 1,
                        weight: 1.0,
                    }],
                }],
            }],
            animations: vec![ImportedAnimation {
                name: "slide".to_string(),
                duration: 1.0,
                ticks_per_second: 1.0,
                channels: vec![ImportedChannel {
                    translation_keys: vec![
                        VectorKey {
                            time: 0.0,
                            value: glm::vec3(0.0, 0.0, 0.0),
                        },
                        VectorKey {
                            time: 1.0,
                            value: glm::vec3(1.0, 0.0, 0.0),
                        },
                    ],
                    ..ImportedChannel::new("bone")
                }],
            }],
        }
    }

    #[test]
    fn from_scene() {
        let model = SkinnedModel::from_scene("cube", &granary(), &ImportOptions::default());
        assert!(model.is_ok());
        if let Ok(model) = model {
            assert_eq!(model.bone_count(), 1);
            assert!(model.has_animations());
            assert_eq!(model.animation_frame_num(0), 2);
            // Out of range falls back to the first clip
            assert_eq!(model.animation(7).map(AnimationClip::name), Some("slide"));
            let skin = model.skin_vertices();
            assert_eq!(skin.len(), 2);
            assert_eq!(skin[1].bone_ids, [0, -1, -1, -1]);
        }
    }

    #[test]
    fn no_animations() {
        let mut scene = granary();
        scene.animations.clear();
        let model = SkinnedModel::from_scene("cube", &scene, &ImportOptions::default());
        assert!(model.is_ok());
        if let Ok(model) = model {
            assert!(!model.has_animations());
            assert!(model.animation(0).is_none());
            assert_eq!(model.animation_frame_num(3), 0);
        }
    }

    #[test]
    fn unsupported_extension() {
        let result = SkinnedModel::load(Path::new("cube.fbx"), &ImportOptions::default());
        assert!(matches!(result, Err(RvError::UnsupportedFormat)));
    }
}
