//! Armature Core (engine-agnostic)
//!
//! Compiles hierarchical skeleton definitions (joints plus keyframed actions) into a
//! validated, id-indexed runtime skeleton, and evaluates per-frame joint poses from it.
//!
//! Pipeline: [`SkeletonDefinition`] → [`compile`] → [`CompiledSkeleton`] →
//! [`RestPose`] → [`ActionEvaluator`] writing into an [`EvaluatedSkeleton`], whose
//! absolute/deform transforms are handed to skinning or rendering code.

pub mod compiled;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod error;
pub mod evaluator;
pub mod ids;
pub mod interp;
pub mod math;
pub mod pose;
pub mod rest_pose;
pub mod scratch;
pub mod timeline;
pub mod tree;

// Re-exports for consumers (adapters)
pub use compiled::{
    CompiledAction, CompiledActionCurves, CompiledCurve, CompiledJoint, CompiledJointCurves,
    CompiledSkeleton,
};
pub use compiler::compile;
pub use config::EvaluatorConfig;
pub use definition::{
    ActionDefinition, ActionName, Curve, CurveDefinition, CurveKind, Easing, Interpolation,
    JointDefinition, JointName, Keyframe, SkeletonDefinition, SkeletonName,
};
pub use error::{CompileError, CompileErrorCode, CompileErrors, EvalError};
pub use evaluator::{ActionEvaluator, JointTracks};
pub use ids::JointId;
pub use interp::Interpolate;
pub use math::{Matrix4, Quaternion, Vector3};
pub use pose::{EvaluatedJoint, EvaluatedSkeleton};
pub use rest_pose::RestPose;
pub use scratch::{MatrixPool, PooledMatrix};
pub use timeline::{KeyframeCurrent, KeyframeTimeline};
pub use tree::{NodeId, Tree, TreeError};
