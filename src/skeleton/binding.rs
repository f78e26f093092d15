use super::BoneRegistry;
use crate::{
    mesh_import::{ImportError, ImportedMesh},
    types::{MAX_INFLUENCES, NO_BONE},
};
use log::{error, trace, warn};
use smallvec::SmallVec;

/// Bone influences on one vertex. Unused slots have id `NO_BONE` and weight 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexBinding {
    pub bone_ids: [i32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl Default for VertexBinding {
    fn default() -> Self {
        Self {
            bone_ids: [NO_BONE; MAX_INFLUENCES],
            weights: [0.0; MAX_INFLUENCES],
        }
    }
}

impl VertexBinding {
    /// Used slots as `(bone id, weight)`
    pub fn influences(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.bone_ids
            .iter()
            .zip(self.weights)
            .filter_map(|(id, w)| usize::try_from(*id).ok().map(|id| (id, w)))
    }

    #[must_use]
    pub fn influence_count(&self) -> usize {
        self.bone_ids.iter().filter(|id| **id != NO_BONE).count()
    }

    /// Sum of the weights. Usually 1 but nothing enforces it.
    #[must_use]
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Reads the bone influences of a mesh into per vertex bindings, registering
/// any new bones on the way. Influences past the fourth on a vertex are
/// dropped. A weight naming a vertex the mesh doesn't have is an error.
pub fn extract_bone_weights(
    mesh: &ImportedMesh,
    registry: &mut BoneRegistry,
) -> Result<Vec<VertexBinding>, ImportError> {
    type Slots = SmallVec<[(i32, f32); MAX_INFLUENCES]>;
    let mut slots: Vec<Slots> = vec![Slots::new(); mesh.vertex_count];
    let mut dropped = 0_usize;

    for bone in &mesh.bones {
        let id = registry.register(&bone.name, &bone.offset_matrix);
        let Ok(id) = i32::try_from(id) else {
            error!("Too many bones in mesh {}", mesh.name);
            return Err(ImportError::TooManyBones(id));
        };
        for w in &bone.weights {
            let Some(vertex) = slots.get_mut(w.vertex) else {
                error!(
                    "mesh {} bone {} weights vertex {} of {}",
                    mesh.name, bone.name, w.vertex, mesh.vertex_count
                );
                return Err(ImportError::VertexOutOfRange(w.vertex));
            };
            if vertex.len() < MAX_INFLUENCES {
                vertex.push((id, w.weight));
            } else {
                trace!("vertex {} drops bone {}", w.vertex, bone.name);
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        warn!(
            "mesh {} dropped {} influences beyond {} per vertex",
            mesh.name, dropped, MAX_INFLUENCES
        );
    }

    Ok(slots
        .iter()
        .map(|vertex| {
            let mut binding = VertexBinding::default();
            for (i, (id, weight)) in vertex.iter().enumerate() {
                binding.bone_ids[i] = *id;
                binding.weights[i] = *weight;
            }
            binding
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_import::{ImportedBone, VertexWeight};
    use nalgebra_glm as glm;

    fn bone(name: &str, weights: &[(usize, f32)]) -> ImportedBone {
        ImportedBone {
            name: name.to_string(),
            offset_matrix: glm::Mat4::identity(),
            weights: weights
                .iter()
                .map(|(vertex, weight)| VertexWeight {
                    vertex: *vertex,
                    weight: *weight,
                })
                .collect(),
        }
    }

    #[test]
    fn fifth_influence_dropped() {
        let mesh = ImportedMesh {
            name: "blob".to_string(),
            vertex_count: 3,
            bones: vec![
                bone("a", &[(0, 0.2), (1, 1.0)]),
                bone("b", &[(0, 0.2)]),
                bone("c", &[(0, 0.2)]),
                bone("d", &[(0, 0.2)]),
                bone("e", &[(0, 0.2)]),
            ],
        };
        let mut registry = BoneRegistry::new();
        let bindings = extract_bone_weights(&mesh, &mut registry);
        assert!(bindings.is_ok());
        let bindings = bindings.unwrap_or_default();
        assert_eq!(registry.len(), 5);
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].bone_ids, [0, 1, 2, 3]);
        assert_eq!(bindings[0].influence_count(), 4);
        assert_eq!(bindings[1].bone_ids, [0, NO_BONE, NO_BONE, NO_BONE]);
        assert!((bindings[1].weight_sum() - 1.0).abs() < f32::EPSILON);
        assert_eq!(bindings[2], VertexBinding::default());
        assert_eq!(bindings[2].influences().count(), 0);
    }

    #[test]
    fn ids_shared_across_meshes() {
        let mut registry = BoneRegistry::new();
        let first = ImportedMesh {
            name: "body".to_string(),
            vertex_count: 1,
            bones: vec![bone("hip", &[(0, 1.0)])],
        };
        let second = ImportedMesh {
            name: "hat".to_string(),
            vertex_count: 1,
            bones: vec![bone("head", &[(0, 0.5)]), bone("hip", &[(0, 0.5)])],
        };
        assert!(extract_bone_weights(&first, &mut registry).is_ok());
        let bindings = extract_bone_weights(&second, &mut registry).unwrap_or_default();
        assert_eq!(bindings[0].bone_ids[..2], [1, 0]);
        let influences: Vec<(usize, f32)> = bindings[0].influences().collect();
        assert_eq!(influences, vec![(1, 0.5), (0, 0.5)]);
    }

    #[test]
    fn bad_vertex_index() {
        let mesh = ImportedMesh {
            name: "broken".to_string(),
            vertex_count: 2,
            bones: vec![bone("a", &[(2, 1.0)])],
        };
        let result = extract_bone_weights(&mesh, &mut BoneRegistry::new());
        assert!(matches!(result, Err(ImportError::VertexOutOfRange(2))));
    }
}
