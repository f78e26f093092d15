// Some code inspired by
// https://github.com/KhronosGroup/glTF-Tutorials/

use super::types::{
    ImportError, ImportedAnimation, ImportedBone, ImportedChannel,
    ImportedMesh, ImportedScene, Key, VertexWeight,
};
use crate::{rv_error::RvError, skeleton::SceneNode};
use ahash::{HashMap, HashMapExt};
use gltf::{
    animation::{util::ReadOutputs, Interpolation},
    buffer::{self, Data},
    Document, Gltf, Node, Semantic, Skin,
};
use log::{debug, error, info, trace, warn};
use nalgebra_glm as glm;
use std::{fs, io, path::Path};

/// glTF allows several sets of four joints per vertex
const JOINT_SETS: u32 = 2;

fn load_impl<P>(path: P) -> Result<(Document, Vec<buffer::Data>), RvError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path).map_err(RvError::StdIoError)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)?;

    // Some info
    let buffer_count = buffers.len();
    info!(
        "{:?}, base path={:?}, buffer count={}, first buffer length={} ",
        path,
        base,
        buffer_count,
        buffers.first().map_or(0, |b| b.len()),
    );

    Ok((gltf.document, buffers))
}

fn buffer_data(buffers: &[Data], index: usize) -> Option<&[u8]> {
    buffers.get(index).map(|d| d.0.as_slice())
}

/// Name used for a node everywhere in the import so skins and animation
/// targets agree
fn node_name(node: &Node) -> String {
    node.name()
        .map_or_else(|| format!("node.{}", node.index()), ToString::to_string)
}

/// Recursive node tree traversal
fn traverse_tree(node: &Node) -> SceneNode {
    SceneNode {
        name: node_name(node),
        local_bind_transform: node.transform().matrix().into(),
        children: node.children().map(|c| traverse_tree(&c)).collect(),
    }
}

/// The scene's nodes under one root. A scene with several top level nodes
/// gets a synthetic identity root named after the scene.
fn load_nodes(document: &Document) -> Result<SceneNode, RvError> {
    let Some(scene) = document
        .default_scene()
        .or_else(|| document.scenes().next())
    else {
        error!("No scene in document");
        return Err(ImportError::NoScene.into());
    };
    let mut roots: Vec<SceneNode> =
        scene.nodes().map(|n| traverse_tree(&n)).collect();
    if roots.len() == 1 {
        if let Some(root) = roots.pop() {
            return Ok(root);
        }
    }
    let name = scene.name().map_or_else(
        || format!("scene.{}", scene.index()),
        ToString::to_string,
    );
    debug!("scene {} has {} top level nodes", name, roots.len());
    Ok(SceneNode {
        name,
        local_bind_transform: glm::Mat4::identity(),
        children: roots,
    })
}

/// One bone per skin joint, in joint order, with no weights yet
fn skin_bones(skin: &Skin, buffers: &[Data]) -> Vec<ImportedBone> {
    let reader = skin.reader(|x| buffer_data(buffers, x.index()));
    let inverse_binds: Vec<glm::Mat4> = reader
        .read_inverse_bind_matrices()
        .map_or_else(
            || {
                warn!(
                    "skin {} has no inverse bind matrices, using identity",
                    skin.index()
                );
                vec![glm::Mat4::identity(); skin.joints().count()]
            },
            |iter| iter.map(Into::into).collect(),
        );
    skin.joints()
        .zip(inverse_binds)
        .map(|(node, offset_matrix)| ImportedBone {
            name: node_name(&node),
            offset_matrix,
            weights: Vec::new(),
        })
        .collect()
}

/// Reads the skinning part of a node's mesh. Vertices of all primitives are
/// numbered consecutively.
fn load_mesh(node: &Node, buffers: &[Data]) -> Result<Option<ImportedMesh>, RvError> {
    let Some(mesh) = node.mesh() else {
        return Ok(None);
    };
    let name = mesh.name().map_or_else(
        || format!("mesh.{}", mesh.index()),
        ToString::to_string,
    );
    let mut bones = node
        .skin()
        .map_or_else(Vec::new, |skin| skin_bones(&skin, buffers));

    let mut vertex_count = 0_usize;
    for p in mesh.primitives() {
        let Some(positions) = p.get(&Semantic::Positions) else {
            error!("mesh {} primitive {} has no positions", name, p.index());
            return Err(ImportError::NoPositions.into());
        };
        let reader = p.reader(|x| buffer_data(buffers, x.index()));
        for set in 0..JOINT_SETS {
            let (Some(joints), Some(weights)) =
                (reader.read_joints(set), reader.read_weights(set))
            else {
                continue;
            };
            for (v, (ids, ws)) in
                joints.into_u16().zip(weights.into_f32()).enumerate()
            {
                trace!("Joint ids={:?} weights={:?}", ids, ws);
                for (id, weight) in ids.iter().zip(ws) {
                    if weight <= 0.0 {
                        continue;
                    }
                    let joint = usize::from(*id);
                    let Some(bone) = bones.get_mut(joint) else {
                        error!("mesh {} uses joint {} outside its skin", name, joint);
                        return Err(ImportError::BadJointIndex(joint).into());
                    };
                    bone.weights.push(VertexWeight {
                        vertex: vertex_count + v,
                        weight,
                    });
                }
            }
        }
        vertex_count += positions.count();
    }
    info!(
        "mesh={} vertex count={} bones={}",
        name,
        vertex_count,
        bones.len()
    );

    Ok(Some(ImportedMesh {
        name,
        vertex_count,
        bones,
    }))
}

fn load_meshes(document: &Document, buffers: &[Data]) -> Result<Vec<ImportedMesh>, RvError> {
    let mut meshes = Vec::new();
    for node in document.nodes() {
        if let Some(mesh) = load_mesh(&node, buffers)? {
            meshes.push(mesh);
        }
    }
    Ok(meshes)
}

/// Pairs key times with values. Cubic spline outputs hold an in tangent,
/// value and out tangent per key; only the value is kept. Every time needs
/// exactly one value.
fn keys<T>(
    times: &[f64],
    values: impl Iterator<Item = T>,
    interpolation: Interpolation,
    node: usize,
) -> Result<Vec<Key<T>>, ImportError> {
    let values: Vec<T> = if interpolation == Interpolation::CubicSpline {
        values.skip(1).step_by(3).collect()
    } else {
        values.collect()
    };
    if values.len() != times.len() {
        error!(
            "node {} has {} times but {} values",
            node,
            times.len(),
            values.len()
        );
        return Err(ImportError::CountMismatch(node));
    }
    Ok(times
        .iter()
        .zip(values)
        .map(|(time, value)| Key { time: *time, value })
        .collect())
}

fn load_animations(
    document: &Document,
    buffers: &[Data],
) -> Result<Vec<ImportedAnimation>, RvError> {
    use gltf::accessor::Iter;

    let mut ret = Vec::new();
    for animation in document.animations() {
        debug!("animation name={:?}", animation.name());
        let mut channels: Vec<ImportedChannel> = Vec::new();
        let mut slots = HashMap::<usize, usize>::new();
        let mut max_time = 0.0_f64;

        for channel in animation.channels() {
            let node = channel.target().node();
            let interpolation = channel.sampler().interpolation();
            match interpolation {
                Interpolation::Linear => (),
                Interpolation::Step => warn!(
                    "animation {} node {} step keys treated as linear",
                    animation.index(),
                    node.index()
                ),
                Interpolation::CubicSpline => warn!(
                    "animation {} node {} cubic spline keys treated as linear",
                    animation.index(),
                    node.index()
                ),
            }
            let reader = channel.reader(|x| buffer_data(buffers, x.index()));
            let times: Vec<f64> = match reader.read_inputs() {
                Some(Iter::Standard(times)) => times.map(f64::from).collect(),
                Some(Iter::Sparse(_)) => {
                    error!("Unsupported sparse animation format");
                    return Err(ImportError::SparseAnimation.into());
                }
                None => {
                    error!("Animation does not contain a sampler");
                    return Err(ImportError::NoSampler.into());
                }
            };
            max_time = times.iter().copied().fold(max_time, f64::max);

            let Some(outputs) = reader.read_outputs() else {
                error!("Animation does not contain a sampler output");
                return Err(ImportError::NoSampler.into());
            };

            if matches!(outputs, ReadOutputs::MorphTargetWeights(_)) {
                warn!(
                    "animation {} node {} morph weights skipped",
                    animation.index(),
                    node.index()
                );
                continue;
            }

            let slot = *slots.entry(node.index()).or_insert_with(|| {
                channels.push(ImportedChannel::new(node_name(&node)));
                channels.len() - 1
            });
            let target = &mut channels[slot];
            let index = node.index();

            match outputs {
                ReadOutputs::Rotations(x) => {
                    target.rotation_keys = keys(
                        &times,
                        x.into_f32().map(|q| glm::quat(q[0], q[1], q[2], q[3])),
                        interpolation,
                        index,
                    )?;
                }
                ReadOutputs::Translations(x) => {
                    target.translation_keys =
                        keys(&times, x.map(Into::into), interpolation, index)?;
                }
                ReadOutputs::Scales(x) => {
                    target.scale_keys =
                        keys(&times, x.map(Into::into), interpolation, index)?;
                }
                ReadOutputs::MorphTargetWeights(_) => (),
            }
        }

        // Store
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );
        // glTF times are already in seconds
        ret.push(ImportedAnimation {
            name,
            duration: max_time,
            ticks_per_second: 1.0,
            channels,
        });
    } // animation
    Ok(ret)
}

/// Reads the hierarchy, skin weights and animations of an already parsed
/// document
fn import_document(
    document: &Document,
    buffers: &[Data],
) -> Result<ImportedScene, RvError> {
    Ok(ImportedScene {
        root: load_nodes(document)?,
        meshes: load_meshes(document, buffers)?,
        animations: load_animations(document, buffers)?,
    })
}

/// Loads the hierarchy, skin weights and animations from a glTF file. Tested
/// with files exported from Blender using both "glTF Separate" and binary
/// options.
///
/// # Errors
/// May return `RvError`
pub fn load(path: &Path) -> Result<ImportedScene, RvError> {
    let (document, buffers) = load_impl(path)?;
    let scene = import_document(&document, &buffers)?;
    info!(
        "{:?} nodes={} meshes={} animations={}",
        path,
        scene.root.count(),
        scene.meshes.len(),
        scene.animations.len()
    );
    Ok(scene)
}
