//! Validated runtime skeleton produced by [`crate::compile`].
//!
//! The tree is the sole owner of joints; the by-name and by-id indexes only hold
//! node handles into it. All of this is immutable once built and can be shared
//! across threads behind an `Arc`.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::definition::{ActionName, JointName, Keyframe, SkeletonName};
use crate::ids::JointId;
use crate::math::{Quaternion, Vector3};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledJoint {
    pub id: JointId,
    pub name: JointName,
    pub parent: Option<JointId>,
    pub translation: Vector3,
    pub orientation: Quaternion,
    pub scale: Vector3,
}

/// Keyframes of one curve, unique and ordered by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCurve<T> {
    pub keyframes: BTreeMap<u32, Keyframe<T>>,
}

impl<T: Clone> CompiledCurve<T> {
    pub fn new(keyframes: BTreeMap<u32, Keyframe<T>>) -> Self {
        Self { keyframes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    pub fn last_index(&self) -> Option<u32> {
        self.keyframes.keys().next_back().copied()
    }

    /// Re-time keyframes authored at `from_fps` to `to_fps`.
    ///
    /// Each index maps to `round_half_up(index * to_fps / from_fps)`. When two
    /// keyframes land on the same index the later one wins.
    pub fn rescale(&self, from_fps: u32, to_fps: u32) -> Self {
        if from_fps == to_fps {
            return self.clone();
        }
        let mut keyframes = BTreeMap::new();
        for (index, keyframe) in &self.keyframes {
            let rescaled = rescale_index(*index, from_fps, to_fps);
            let mut moved = keyframe.clone();
            moved.index = rescaled;
            if keyframes.insert(rescaled, moved).is_some() {
                log::trace!(
                    "keyframe {index} collides at rescaled index {rescaled} ({from_fps} -> {to_fps} fps)"
                );
            }
        }
        Self { keyframes }
    }
}

pub(crate) fn rescale_index(index: u32, from_fps: u32, to_fps: u32) -> u32 {
    assert!(from_fps > 0, "cannot rescale from zero frames per second");
    let from = u64::from(from_fps);
    let scaled = (u64::from(index) * u64::from(to_fps) + from / 2) / from;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// At most one curve of each kind for one joint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledJointCurves {
    pub translation: Option<CompiledCurve<Vector3>>,
    pub orientation: Option<CompiledCurve<Quaternion>>,
    pub scale: Option<CompiledCurve<Vector3>>,
}

impl CompiledJointCurves {
    /// Highest keyframe index across all three kinds.
    pub fn last_frame(&self) -> Option<u32> {
        [
            self.translation.as_ref().and_then(CompiledCurve::last_index),
            self.orientation.as_ref().and_then(CompiledCurve::last_index),
            self.scale.as_ref().and_then(CompiledCurve::last_index),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    pub fn rescale(&self, from_fps: u32, to_fps: u32) -> Self {
        Self {
            translation: self.translation.as_ref().map(|c| c.rescale(from_fps, to_fps)),
            orientation: self.orientation.as_ref().map(|c| c.rescale(from_fps, to_fps)),
            scale: self.scale.as_ref().map(|c| c.rescale(from_fps, to_fps)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledActionCurves {
    pub name: ActionName,
    pub frames_per_second: u32,
    pub joints: BTreeMap<JointName, CompiledJointCurves>,
}

/// Compiled action. Curve-driven actions are the only kind so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompiledAction {
    Curves(CompiledActionCurves),
}

impl CompiledAction {
    #[inline]
    pub fn name(&self) -> &ActionName {
        match self {
            Self::Curves(c) => &c.name,
        }
    }

    #[inline]
    pub fn frames_per_second(&self) -> u32 {
        match self {
            Self::Curves(c) => c.frames_per_second,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledSkeleton {
    name: SkeletonName,
    tree: Tree<CompiledJoint>,
    by_name: HashMap<JointName, NodeId>,
    by_id: Vec<NodeId>,
    actions: BTreeMap<ActionName, CompiledAction>,
}

impl CompiledSkeleton {
    /// Assemble from a tree whose joints already carry dense ids. Panics if the
    /// indexes cannot be built consistently; the compiler guarantees they can.
    pub(crate) fn from_tree(
        name: SkeletonName,
        tree: Tree<CompiledJoint>,
        root: NodeId,
        actions: BTreeMap<ActionName, CompiledAction>,
    ) -> Self {
        let (by_name, by_id) = build_indexes(&tree, root);
        Self {
            name,
            tree,
            by_name,
            by_id,
            actions,
        }
    }

    pub(crate) fn with_actions(mut self, actions: BTreeMap<ActionName, CompiledAction>) -> Self {
        self.actions = actions;
        self
    }

    #[inline]
    pub fn name(&self) -> &SkeletonName {
        &self.name
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn tree(&self) -> &Tree<CompiledJoint> {
        &self.tree
    }

    #[inline]
    pub fn root(&self) -> &CompiledJoint {
        self.joint(JointId::ROOT)
    }

    /// Panics on ids outside `[0, joint_count)`.
    #[inline]
    pub fn joint(&self, id: JointId) -> &CompiledJoint {
        self.tree.value(self.by_id[id.index()])
    }

    #[inline]
    pub fn get_joint(&self, id: JointId) -> Option<&CompiledJoint> {
        self.by_id.get(id.index()).map(|n| self.tree.value(*n))
    }

    #[inline]
    pub fn joint_by_name(&self, name: &str) -> Option<&CompiledJoint> {
        self.by_name.get(name).map(|n| self.tree.value(*n))
    }

    #[inline]
    pub fn node_of(&self, id: JointId) -> NodeId {
        self.by_id[id.index()]
    }

    /// Joints in id order, so parents always precede their children.
    pub fn joints(&self) -> impl Iterator<Item = &CompiledJoint> + '_ {
        self.by_id.iter().map(|n| self.tree.value(*n))
    }

    #[inline]
    pub fn parent_of(&self, id: JointId) -> Option<JointId> {
        self.joint(id).parent
    }

    pub fn children_of(&self, id: JointId) -> Vec<JointId> {
        self.tree
            .children(self.node_of(id))
            .iter()
            .map(|n| self.tree.value(*n).id)
            .collect()
    }

    #[inline]
    pub fn actions(&self) -> &BTreeMap<ActionName, CompiledAction> {
        &self.actions
    }

    #[inline]
    pub fn action(&self, name: &str) -> Option<&CompiledAction> {
        self.actions.get(name)
    }
}

/// Single depth-first pass over the tree filling both lookup views.
fn build_indexes(
    tree: &Tree<CompiledJoint>,
    root: NodeId,
) -> (HashMap<JointName, NodeId>, Vec<NodeId>) {
    let mut by_name = HashMap::with_capacity(tree.len());
    let mut by_id: Vec<Option<NodeId>> = vec![None; tree.len()];

    for node in tree.depth_first(root) {
        let joint = tree.value(node);
        if by_name.insert(joint.name.clone(), node).is_some() {
            panic!("joint name {} indexed twice", joint.name);
        }
        let slot = by_id
            .get_mut(joint.id.index())
            .unwrap_or_else(|| panic!("joint id {} out of range {}", joint.id, tree.len()));
        if slot.replace(node).is_some() {
            panic!("joint id {} indexed twice", joint.id);
        }
    }

    let by_id = by_id
        .into_iter()
        .enumerate()
        .map(|(i, n)| n.unwrap_or_else(|| panic!("joint id {i} not reachable from the root")))
        .collect();
    (by_name, by_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Keyframe;

    fn curve(indices: &[u32]) -> CompiledCurve<Vector3> {
        CompiledCurve::new(
            indices
                .iter()
                .map(|i| (*i, Keyframe::linear(*i, Vector3::repeat(f64::from(*i)))))
                .collect(),
        )
    }

    #[test]
    fn rescale_rounds_half_up() {
        assert_eq!(rescale_index(10, 30, 60), 20);
        assert_eq!(rescale_index(1, 60, 30), 1);
        assert_eq!(rescale_index(3, 60, 30), 2);
        assert_eq!(rescale_index(7, 24, 60), 18);
    }

    #[test]
    fn rescale_collisions_keep_later_keyframe() {
        // 1 -> 1 and 2 -> 1 at half rate
        let rescaled = curve(&[0, 1, 2]).rescale(60, 30);
        let indices: Vec<_> = rescaled.keyframes.keys().copied().collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(rescaled.keyframes[&1].value, Vector3::repeat(2.0));
        assert_eq!(rescaled.keyframes[&1].index, 1);
    }

    #[test]
    fn last_frame_spans_all_kinds() {
        let curves = CompiledJointCurves {
            translation: Some(curve(&[0, 5])),
            orientation: None,
            scale: Some(curve(&[0, 12])),
        };
        assert_eq!(curves.last_frame(), Some(12));
        assert_eq!(CompiledJointCurves::default().last_frame(), None);
    }
}
