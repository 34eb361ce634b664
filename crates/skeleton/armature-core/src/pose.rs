//! Mutable per-session pose: local TRS per joint plus lazily refreshed
//! absolute and deform matrices.
//!
//! Staleness is tracked with generations. Every refresh of a joint's absolute
//! transform bumps its generation; a child remembers the parent generation it
//! was computed against and refreshes when that no longer matches. Setting a
//! local value only flags the joint itself, descendants notice on their next read.

use std::sync::Arc;

use crate::compiled::CompiledSkeleton;
use crate::config::EvaluatorConfig;
use crate::ids::JointId;
use crate::math::{compose_trs_into, Matrix4, Quaternion, Vector3};
use crate::rest_pose::RestPose;
use crate::scratch::MatrixPool;

#[derive(Debug, Clone)]
pub struct EvaluatedJoint {
    id: JointId,
    parent: Option<JointId>,
    translation: Vector3,
    orientation: Quaternion,
    scale: Vector3,
    absolute: Matrix4,
    generation: u64,
    parent_generation: u64,
    local_changed: bool,
}

impl EvaluatedJoint {
    #[inline]
    pub fn id(&self) -> JointId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }

    #[inline]
    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    #[inline]
    pub fn orientation(&self) -> &Quaternion {
        &self.orientation
    }

    #[inline]
    pub fn scale(&self) -> &Vector3 {
        &self.scale
    }

    /// Number of times the absolute transform has been recomputed.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Evaluation state for one animated instance of a skeleton.
///
/// Not shareable between threads for writing; every instance owns its own.
/// Joint ids must come from the skeleton the rest pose was built for, other ids panic.
#[derive(Debug)]
pub struct EvaluatedSkeleton {
    rest: Arc<RestPose>,
    joints: Vec<EvaluatedJoint>,
    deform: Vec<Matrix4>,
    pool: MatrixPool,
    /// Reused root-to-joint path for single-joint refreshes.
    lineage: Vec<usize>,
}

impl EvaluatedSkeleton {
    pub fn new(rest: Arc<RestPose>) -> Self {
        Self::with_config(rest, &EvaluatorConfig::default())
    }

    /// Every joint starts at its rest local values, stale.
    pub fn with_config(rest: Arc<RestPose>, config: &EvaluatorConfig) -> Self {
        let joints = rest
            .skeleton()
            .joints()
            .map(|j| EvaluatedJoint {
                id: j.id,
                parent: j.parent,
                translation: j.translation,
                orientation: j.orientation,
                scale: j.scale,
                absolute: Matrix4::identity(),
                generation: 0,
                parent_generation: 0,
                local_changed: true,
            })
            .collect::<Vec<_>>();
        let deform = vec![Matrix4::identity(); joints.len()];
        Self {
            rest,
            joints,
            deform,
            pool: MatrixPool::with_capacity(config.scratch_matrices),
            lineage: Vec::new(),
        }
    }

    #[inline]
    pub fn skeleton(&self) -> &Arc<CompiledSkeleton> {
        self.rest.skeleton()
    }

    #[inline]
    pub fn rest_pose(&self) -> &Arc<RestPose> {
        &self.rest
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn joint(&self, id: JointId) -> &EvaluatedJoint {
        &self.joints[id.index()]
    }

    #[inline]
    pub fn scratch(&self) -> &MatrixPool {
        &self.pool
    }

    // Setters leave the joint current when the value is unchanged.

    pub fn set_translation(&mut self, id: JointId, translation: Vector3) {
        let joint = &mut self.joints[id.index()];
        if joint.translation != translation {
            joint.translation = translation;
            joint.local_changed = true;
        }
    }

    pub fn set_orientation(&mut self, id: JointId, orientation: Quaternion) {
        let joint = &mut self.joints[id.index()];
        if joint.orientation != orientation {
            joint.orientation = orientation;
            joint.local_changed = true;
        }
    }

    pub fn set_scale(&mut self, id: JointId, scale: Vector3) {
        let joint = &mut self.joints[id.index()];
        if joint.scale != scale {
            joint.scale = scale;
            joint.local_changed = true;
        }
    }

    /// Put every joint back at its rest local values.
    pub fn reset_to_rest(&mut self) {
        let skeleton = Arc::clone(self.rest.skeleton());
        for (joint, rest) in self.joints.iter_mut().zip(skeleton.joints()) {
            joint.translation = rest.translation;
            joint.orientation = rest.orientation;
            joint.scale = rest.scale;
            joint.local_changed = true;
        }
    }

    /// Joint → object transform, refreshed first if it or any ancestor changed.
    pub fn transform_absolute(&mut self, id: JointId) -> &Matrix4 {
        self.refresh(id);
        &self.joints[id.index()].absolute
    }

    /// Absolute transform times the inverse rest transform.
    pub fn transform_deform(&mut self, id: JointId) -> &Matrix4 {
        self.refresh(id);
        &self.deform[id.index()]
    }

    /// Bring every joint up to date in one parent-first pass.
    pub fn refresh_all(&mut self) {
        for index in 0..self.joints.len() {
            self.update_one(index);
        }
    }

    /// Deform matrices of every joint, in id order.
    pub fn deform_transforms(&mut self) -> &[Matrix4] {
        self.refresh_all();
        &self.deform
    }

    /// Refresh `id` and its ancestors, root first.
    fn refresh(&mut self, id: JointId) {
        let mut lineage = std::mem::take(&mut self.lineage);
        lineage.clear();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            lineage.push(current.index());
            cursor = self.joints[current.index()].parent;
        }
        for &index in lineage.iter().rev() {
            self.update_one(index);
        }
        self.lineage = lineage;
    }

    /// Recompute one joint if stale. Its parent must already be current.
    fn update_one(&mut self, index: usize) {
        let joint = &self.joints[index];
        let parent = joint.parent.map(|p| &self.joints[p.index()]);
        let parent_generation = parent.map_or(0, |p| p.generation);
        if !joint.local_changed && parent_generation == joint.parent_generation {
            return;
        }
        let parent_absolute = parent.map(|p| p.absolute);

        let mut local = self.pool.checkout();
        let mut tmp = self.pool.checkout();
        let joint = &mut self.joints[index];
        compose_trs_into(
            &joint.translation,
            &joint.orientation,
            &joint.scale,
            &mut *local,
            &mut *tmp,
        );
        match parent_absolute {
            Some(parent_absolute) => parent_absolute.mul_to(&*local, &mut joint.absolute),
            None => joint.absolute.copy_from(&*local),
        }
        joint
            .absolute
            .mul_to(&self.rest.inverse_binds()[index], &mut self.deform[index]);

        joint.generation += 1;
        joint.parent_generation = parent_generation;
        joint.local_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{JointDefinition, SkeletonDefinition};
    use crate::math::transform_point;
    use approx::assert_relative_eq;

    fn chain() -> EvaluatedSkeleton {
        let def = SkeletonDefinition::new("chain")
            .with_joint(JointDefinition::new("a"))
            .with_joint(
                JointDefinition::new("b")
                    .with_parent("a")
                    .with_translation(Vector3::new(1.0, 0.0, 0.0)),
            )
            .with_joint(
                JointDefinition::new("c")
                    .with_parent("b")
                    .with_translation(Vector3::new(1.0, 0.0, 0.0)),
            );
        let skeleton = Arc::new(crate::compile(&def).unwrap());
        EvaluatedSkeleton::new(Arc::new(RestPose::build(skeleton)))
    }

    fn origin(m: &Matrix4) -> Vector3 {
        transform_point(m, &Vector3::zeros())
    }

    #[test]
    fn rest_pose_deform_is_identity() {
        let mut pose = chain();
        for m in pose.deform_transforms() {
            assert_relative_eq!(*m, Matrix4::identity(), epsilon = 1e-12);
        }
        assert_relative_eq!(
            origin(pose.transform_absolute(JointId(2))),
            Vector3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn parent_change_reaches_grandchild_on_read() {
        let mut pose = chain();
        pose.refresh_all();
        let before = pose.joint(JointId(2)).generation();

        pose.set_translation(JointId::ROOT, Vector3::new(0.0, 5.0, 0.0));
        assert_eq!(pose.joint(JointId(2)).generation(), before);
        assert_relative_eq!(
            origin(pose.transform_absolute(JointId(2))),
            Vector3::new(2.0, 5.0, 0.0)
        );
        assert_eq!(pose.joint(JointId(2)).generation(), before + 1);
    }

    #[test]
    fn reads_without_changes_do_not_recompute() {
        let mut pose = chain();
        pose.transform_deform(JointId(2));
        let generations: Vec<_> = (0..3).map(|i| pose.joint(JointId(i)).generation()).collect();
        pose.refresh_all();
        pose.transform_absolute(JointId(1));
        let after: Vec<_> = (0..3).map(|i| pose.joint(JointId(i)).generation()).collect();
        assert_eq!(generations, after);
    }

    #[test]
    fn reset_to_rest_restores_identity_deform() {
        let mut pose = chain();
        pose.set_scale(JointId(1), Vector3::new(2.0, 2.0, 2.0));
        assert!((pose.transform_deform(JointId(2)) - Matrix4::identity()).norm() > 0.1);
        pose.reset_to_rest();
        assert_relative_eq!(
            *pose.transform_deform(JointId(2)),
            Matrix4::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn scratch_pool_is_reused_across_joints() {
        let mut pose = chain();
        pose.refresh_all();
        assert_eq!(pose.scratch().allocated(), 8);
        assert_eq!(pose.scratch().available(), 8);
    }
}
