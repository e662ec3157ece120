//! Scene graph and hierarchical transforms.
//!
//! A scene is a tree of [`SceneNode`]s. Each node owns its children, so
//! dropping a node drops its whole subtree and a node can never end up in two
//! parents (nor below one of its own descendants). The parent link kept on
//! every node is an id, not a pointer, and is only informational.
//!
//! World matrices are recomputed top-down on every
//! [`SceneNode::update_matrix_world`] call; there is no dirty tracking.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::data_structures::{geometry::Geometry, material::Material, matrix::Matrix4};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a scene node.
///
/// Ids are handed out at construction and never reused. The renderer keys its
/// GPU resource cache by them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Object3D,
    Mesh,
}

/// Transform and hierarchy data shared by every node type.
#[derive(Debug)]
pub struct Object3D {
    id: NodeId,
    parent: Option<NodeId>,
    pub position: cgmath::Vector3<f32>,
    /// Angles in radians, in application order: `[0]` around Y, `[1]` around
    /// X, `[2]` around Z.
    pub rotation: [f32; 3],
    matrix: Matrix4,
    matrix_world: Matrix4,
    children: Vec<Box<dyn SceneNode>>,
}

impl Object3D {
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            parent: None,
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: [0.0; 3],
            matrix: Matrix4::IDENTITY,
            matrix_world: Matrix4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Local transform as of the last [`Object3D::update_matrix`].
    pub fn matrix(&self) -> &Matrix4 {
        &self.matrix
    }

    /// World transform as of the last [`SceneNode::update_matrix_world`].
    pub fn matrix_world(&self) -> &Matrix4 {
        &self.matrix_world
    }

    /// Rebuild the local matrix from position and rotation.
    ///
    /// Rotations are applied around Y, then X, then Z, followed by a
    /// translation along the rotated axes. This fixed order is part of the
    /// node contract.
    pub fn update_matrix(&mut self) {
        let [y, x, z] = self.rotation;
        self.matrix
            .identity()
            .rotate(y, [0.0, 1.0, 0.0])
            .rotate(x, [1.0, 0.0, 0.0])
            .rotate(z, [0.0, 0.0, 1.0])
            .translate(self.position.into());
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self::new()
    }
}

/// A drawable node: transform data plus geometry and material.
#[derive(Debug)]
pub struct Mesh {
    object: Object3D,
    pub geometry: Geometry,
    pub material: Material,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            object: Object3D::new(),
            geometry,
            material,
        }
    }
}

/// A node in the scene graph.
///
/// Implementors only provide access to their [`Object3D`]; hierarchy handling
/// and matrix propagation are provided. Drawable nodes additionally return
/// themselves from [`SceneNode::as_mesh`].
pub trait SceneNode {
    fn object(&self) -> &Object3D;

    fn object_mut(&mut self) -> &mut Object3D;

    fn as_mesh(&self) -> Option<&Mesh> {
        None
    }

    fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        None
    }

    fn id(&self) -> NodeId {
        self.object().id
    }

    fn kind(&self) -> NodeKind {
        match self.as_mesh() {
            Some(_) => NodeKind::Mesh,
            None => NodeKind::Object3D,
        }
    }

    fn parent(&self) -> Option<NodeId> {
        self.object().parent
    }

    fn get_children(&self) -> &[Box<dyn SceneNode>] {
        &self.object().children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.object_mut().children
    }

    /// Append `child` and point its parent link at `self`.
    fn add_child(&mut self, mut child: Box<dyn SceneNode>) -> NodeId {
        debug_assert!(
            child.parent().is_none(),
            "{} is still attached to {:?}",
            child.id(),
            child.parent()
        );
        debug_assert!(
            child.id() != self.id() && child.find(self.id()).is_none(),
            "adding {} below {} would create a cycle",
            child.id(),
            self.id()
        );
        let id = child.id();
        child.object_mut().parent = Some(self.id());
        self.get_children_mut().push(child);
        id
    }

    /// Convenience wrapper around [`SceneNode::add_child`] for concrete nodes.
    fn add<N: SceneNode + 'static>(&mut self, node: N) -> NodeId
    where
        Self: Sized,
    {
        self.add_child(Box::new(node))
    }

    /// Detach the node `id` (searched anywhere below `self`) together with its
    /// subtree.
    fn remove_child(&mut self, id: NodeId) -> Option<Box<dyn SceneNode>> {
        let children = self.get_children_mut();
        if let Some(idx) = children.iter().position(|child| child.id() == id) {
            let mut child = children.remove(idx);
            child.object_mut().parent = None;
            return Some(child);
        }
        children
            .iter_mut()
            .find_map(|child| child.remove_child(id))
    }

    /// Find a descendant of `self` by id.
    fn find(&self, id: NodeId) -> Option<&dyn SceneNode> {
        for child in self.get_children() {
            if child.id() == id {
                return Some(child.as_ref());
            }
            if let Some(found) = child.find(id) {
                return Some(found);
            }
        }
        None
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode> {
        for child in self.get_children_mut().iter_mut() {
            if child.id() == id {
                return Some(child.as_mut());
            }
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }

    fn find_mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        self.find_mut(id).and_then(|node| node.as_mesh_mut())
    }

    /// Recompute the local matrix and compose it with `parent`, then recurse
    /// into every child.
    fn update_matrix_world(&mut self, parent: Option<&Matrix4>) {
        let object = self.object_mut();
        object.update_matrix();
        object.matrix_world = match parent {
            Some(parent) => parent * &object.matrix,
            None => object.matrix,
        };
        let world = object.matrix_world;
        for child in object.children.iter_mut() {
            child.update_matrix_world(Some(&world));
        }
    }
}

impl<'a> dyn SceneNode + 'a {
    /// Visit `self` and every descendant in pre-order, children in insertion
    /// order.
    pub fn traverse(&self, visit: &mut dyn FnMut(&dyn SceneNode)) {
        visit(self);
        for child in self.get_children() {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut dyn SceneNode)) {
        visit(self);
        for child in self.get_children_mut().iter_mut() {
            child.traverse_mut(visit);
        }
    }

    /// All mesh nodes (including `self`) in pre-order.
    pub fn meshes(&self) -> Vec<&Mesh> {
        fn collect<'n>(node: &'n dyn SceneNode, out: &mut Vec<&'n Mesh>) {
            if let Some(mesh) = node.as_mesh() {
                out.push(mesh);
            }
            for child in node.get_children() {
                collect(child.as_ref(), out);
            }
        }
        let mut meshes = Vec::new();
        collect(self, &mut meshes);
        meshes
    }

    /// Ids of all mesh nodes in pre-order.
    pub fn mesh_ids(&self) -> Vec<NodeId> {
        self.meshes().into_iter().map(|mesh| mesh.id()).collect()
    }
}

impl<'a> fmt::Debug for dyn SceneNode + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("children", &self.get_children())
            .finish()
    }
}

impl SceneNode for Object3D {
    fn object(&self) -> &Object3D {
        self
    }

    fn object_mut(&mut self) -> &mut Object3D {
        self
    }
}

impl SceneNode for Mesh {
    fn object(&self) -> &Object3D {
        &self.object
    }

    fn object_mut(&mut self) -> &mut Object3D {
        &mut self.object
    }

    fn as_mesh(&self) -> Option<&Mesh> {
        Some(self)
    }

    fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn triangle() -> Mesh {
        let geometry = Geometry::new().with_attribute("position", 3, vec![0.0; 9]);
        Mesh::new(geometry, Material::from_sources("vs", "fs"))
    }

    fn assert_point(actual: [f32; 3], expected: [f32; 3]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < EPS, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = Object3D::new();
        let b = Object3D::new();
        assert_ne!(a.id(), b.id());
        assert!(a.id().to_string().starts_with("node#"));
    }

    #[test]
    fn world_matrix_composes_parent_first() {
        let mut root = Object3D::new();
        root.position = [1.0, 0.0, 0.0].into();
        let mut a = Object3D::new();
        a.position = [0.0, 1.0, 0.0].into();
        let mut b = Object3D::new();
        b.position = [0.0, 0.0, 1.0].into();
        let b_id = b.id();

        a.add(b);
        root.add(a);
        root.update_matrix_world(None);

        let b = root.find(b_id).unwrap();
        assert_point(
            b.object().matrix_world().transform_point([0.0; 3]),
            [1.0, 1.0, 1.0],
        );
    }

    #[test]
    fn rotated_parent_carries_child_translation() {
        let mut root = Object3D::new();
        root.rotation = [0.0, 0.0, std::f32::consts::FRAC_PI_2];
        let mut child = Object3D::new();
        child.position = [1.0, 0.0, 0.0].into();
        let child_id = root.add(child);

        root.update_matrix_world(None);

        let child = root.find(child_id).unwrap();
        assert_point(
            child.object().matrix_world().transform_point([0.0; 3]),
            [0.0, 1.0, 0.0],
        );
    }

    #[test]
    fn local_matrix_rotates_y_then_x_then_z() {
        let mut node = Object3D::new();
        node.rotation = [0.3, -1.2, 0.8];
        node.position = [2.0, -1.0, 0.5].into();
        node.update_matrix();

        let expected = cgmath::Matrix4::from_angle_y(cgmath::Rad(0.3))
            * cgmath::Matrix4::from_angle_x(cgmath::Rad(-1.2))
            * cgmath::Matrix4::from_angle_z(cgmath::Rad(0.8))
            * cgmath::Matrix4::from_translation(cgmath::Vector3::new(2.0, -1.0, 0.5));
        assert!(node.matrix().approx_eq(&expected.into(), EPS));
    }

    #[test]
    fn add_child_sets_parent_link() {
        let mut root = Object3D::new();
        let mesh_id = root.add(triangle());

        assert_eq!(root.get_children().len(), 1);
        assert_eq!(root.get_children()[0].parent(), Some(root.id()));
        assert_eq!(root.find(mesh_id).unwrap().kind(), NodeKind::Mesh);
        assert_eq!(root.kind(), NodeKind::Object3D);
        assert!(root.parent().is_none());
    }

    #[test]
    fn remove_child_detaches_nested_subtree() {
        let mut root = Object3D::new();
        let mut group = Object3D::new();
        let mesh_id = group.add(triangle());
        let group_id = root.add(group);

        let removed = root.remove_child(mesh_id).unwrap();
        assert!(removed.parent().is_none());
        assert!(root.find(mesh_id).is_none());
        assert!(root.find(group_id).unwrap().get_children().is_empty());
        assert!(root.remove_child(mesh_id).is_none());
    }

    #[test]
    fn removed_node_can_be_reattached() {
        let mut root = Object3D::new();
        let mut left = Object3D::new();
        let mesh_id = left.add(triangle());
        let left_id = root.add(left);
        let right_id = root.add(Object3D::new());

        let mesh = root.remove_child(mesh_id).unwrap();
        let right = root.find_mut(right_id).unwrap();
        right.add_child(mesh);

        assert_eq!(root.find(mesh_id).unwrap().parent(), Some(right_id));
        assert!(root.find(left_id).unwrap().get_children().is_empty());
    }

    #[test]
    fn find_mesh_mut_gives_access_to_material() {
        let mut root = Object3D::new();
        let group_id = root.add(Object3D::new());
        let mesh_id = root.find_mut(group_id).unwrap().add_child(Box::new(triangle()));

        root.find_mesh_mut(mesh_id).unwrap().material.transparent = true;

        assert!(root.find(mesh_id).unwrap().as_mesh().unwrap().material.transparent);
        assert!(root.find_mesh_mut(group_id).is_none());
    }

    #[test]
    fn traverse_is_pre_order_in_insertion_order() {
        let mut root = Object3D::new();
        let mut group = Object3D::new();
        let nested = group.add(triangle());
        let first = root.add(triangle());
        let group_id = root.add(group);
        let last = root.add(triangle());

        let root: &dyn SceneNode = &root;
        let mut visited = Vec::new();
        root.traverse(&mut |node| visited.push(node.id()));

        assert_eq!(visited, vec![root.id(), first, group_id, nested, last]);
        assert_eq!(root.mesh_ids(), vec![first, nested, last]);
    }

    #[test]
    fn mesh_root_is_part_of_its_own_mesh_list() {
        let mut root = triangle();
        let child = root.add(triangle());
        let root_id = root.id();

        let root: &mut dyn SceneNode = &mut root;
        root.traverse_mut(&mut |node| {
            if let Some(mesh) = node.as_mesh_mut() {
                mesh.material.transparent = true;
            }
        });

        assert_eq!(root.mesh_ids(), vec![root_id, child]);
        assert!(root.meshes().iter().all(|mesh| mesh.material.transparent));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "still attached")]
    fn attached_node_cannot_be_added_twice() {
        let mut root = Object3D::new();
        let id = root.add(Object3D::new());
        let mut stolen = root.remove_child(id).unwrap();
        stolen.object_mut().parent = Some(root.id());
        root.add_child(stolen);
    }
}
