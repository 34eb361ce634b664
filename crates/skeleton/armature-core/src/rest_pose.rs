//! Inverse bind matrices of a compiled skeleton.

use std::sync::Arc;

use crate::compiled::CompiledSkeleton;
use crate::error::EvalError;
use crate::ids::JointId;
use crate::math::{compose_trs_into, Matrix4};

/// Inverse absolute rest transform of every joint, indexed by joint id.
#[derive(Debug, Clone)]
pub struct RestPose {
    skeleton: Arc<CompiledSkeleton>,
    inverse_bind: Vec<Matrix4>,
}

impl RestPose {
    /// Compose each joint's rest TRS down from the root, then invert.
    ///
    /// Panics if any absolute rest transform is singular (e.g. a zero scale axis).
    pub fn build(skeleton: Arc<CompiledSkeleton>) -> Self {
        let tree = skeleton.tree();
        let mut absolute = vec![Matrix4::identity(); skeleton.joint_count()];
        let mut local = Matrix4::identity();
        let mut tmp = Matrix4::identity();

        let root = skeleton.node_of(JointId::ROOT);
        for (node, _) in tree.breadth_first(root) {
            let joint = tree.value(node);
            compose_trs_into(
                &joint.translation,
                &joint.orientation,
                &joint.scale,
                &mut local,
                &mut tmp,
            );
            absolute[joint.id.index()] = match joint.parent {
                Some(parent) => absolute[parent.index()] * local,
                None => local,
            };
        }

        for (index, matrix) in absolute.iter_mut().enumerate() {
            if !matrix.try_inverse_mut() {
                panic!(
                    "rest transform of joint {} ({}) is not invertible",
                    index,
                    skeleton.joint(JointId(index as u32)).name
                );
            }
        }

        log::debug!(
            "built rest pose for {} ({} joints)",
            skeleton.name(),
            absolute.len()
        );
        Self {
            skeleton,
            inverse_bind: absolute,
        }
    }

    pub fn inverse_bind(&self, id: JointId) -> Result<&Matrix4, EvalError> {
        self.inverse_bind
            .get(id.index())
            .ok_or(EvalError::NoSuchJoint { id })
    }

    /// Id-ordered inverse bind matrices.
    #[inline]
    pub fn inverse_binds(&self) -> &[Matrix4] {
        &self.inverse_bind
    }

    #[inline]
    pub fn skeleton(&self) -> &Arc<CompiledSkeleton> {
        &self.skeleton
    }
}
