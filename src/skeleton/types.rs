use ahash::{HashMap, HashMapExt};
use log::{debug, warn};
use nalgebra_glm as glm;

/// Imported scene graph node. Children are owned so a whole tree can be
/// handed over in one piece.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub local_bind_transform: glm::Mat4,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Leaf node
    #[must_use]
    pub fn new(name: impl Into<String>, local_bind_transform: glm::Mat4) -> Self {
        Self {
            name: name.into(),
            local_bind_transform,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree including itself
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoneInfo {
    /// Dense index, also the position in the bone palette
    pub id: usize,
    /// Moves a vertex from model space into the bone's bind space
    pub offset_matrix: glm::Mat4,
}

/// Bones discovered while reading vertex weights, numbered in the order they
/// were first seen
#[derive(Clone, Debug, Default)]
pub struct BoneRegistry {
    bones: Vec<BoneInfo>,
    bone_map: HashMap<String, usize>,
}

impl BoneRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            bone_map: HashMap::new(),
        }
    }

    /// Returns the id for `name`, assigning the next one if it's new. The
    /// first offset matrix seen for a bone is the one kept.
    pub fn register(&mut self, name: &str, offset_matrix: &glm::Mat4) -> usize {
        if let Some(id) = self.bone_map.get(name) {
            return *id;
        }
        let id = self.bones.len();
        debug!("bone {} is id {}", name, id);
        self.bones.push(BoneInfo {
            id,
            offset_matrix: *offset_matrix,
        });
        self.bone_map.insert(name.to_string(), id);
        id
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<usize> {
        self.bone_map.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&BoneInfo> {
        self.bones.get(id)
    }

    #[must_use]
    pub fn bones(&self) -> &[BoneInfo] {
        &self.bones
    }

    /// Bone name to id
    #[must_use]
    pub const fn bone_map(&self) -> &HashMap<String, usize> {
        &self.bone_map
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// Flattened hierarchy node. Indices refer to `Skeleton::nodes`.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonNode {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub local_bind: glm::Mat4,
    /// Bone id if this node drives vertices
    pub bone: Option<usize>,
}

/// Node hierarchy plus the bones that live in it. Nodes are stored in
/// pre-order so index 0 is always the root and a parent always comes before
/// its children.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
    node_map: HashMap<String, usize>,
    root_inverse_bind: glm::Mat4,
    bones: BoneRegistry,
}

impl Skeleton {
    #[must_use]
    pub fn new(root: &SceneNode, bones: BoneRegistry) -> Self {
        let mut nodes = Vec::with_capacity(root.count());
        let mut node_map = HashMap::with_capacity(nodes.capacity());
        flatten(root, None, &bones, &mut nodes, &mut node_map);

        let root_inverse_bind = root
            .local_bind_transform
            .try_inverse()
            .unwrap_or_else(|| {
                warn!("root node {} can't be inverted, using identity", root.name);
                glm::Mat4::identity()
            });

        for name in bones.bone_map().keys() {
            if !node_map.contains_key(name) {
                warn!("bone {} has no node, it will stay in bind pose", name);
            }
        }
        debug!(
            "skeleton has {} nodes and {} bones",
            nodes.len(),
            bones.len()
        );

        Self {
            nodes,
            node_map,
            root_inverse_bind,
            bones,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[SkeletonNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&SkeletonNode> {
        self.nodes.get(index)
    }

    /// Node index by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.node_map.get(name).copied()
    }

    /// Inverse of the root node's bind transform
    #[must_use]
    pub const fn root_inverse_bind(&self) -> &glm::Mat4 {
        &self.root_inverse_bind
    }

    #[must_use]
    pub const fn bones(&self) -> &BoneRegistry {
        &self.bones
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// Recursive pre-order copy of the scene tree. Returns the index of `node`.
fn flatten(
    node: &SceneNode,
    parent: Option<usize>,
    bones: &BoneRegistry,
    nodes: &mut Vec<SkeletonNode>,
    node_map: &mut HashMap<String, usize>,
) -> usize {
    let index = nodes.len();
    let bone = if node_map.contains_key(&node.name) {
        warn!("duplicate node name {}, only the first drives its bone", node.name);
        None
    } else {
        node_map.insert(node.name.clone(), index);
        bones.index(&node.name)
    };
    nodes.push(SkeletonNode {
        name: node.name.clone(),
        parent,
        children: Vec::with_capacity(node.children.len()),
        local_bind: node.local_bind_transform,
        bone,
    });
    for child in &node.children {
        let child_index = flatten(child, Some(index), bones, nodes, node_map);
        nodes[index].children.push(child_index);
    }
    index
}
