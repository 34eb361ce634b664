//! Error types for skeleton compilation and evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::definition::{ActionName, CurveKind, JointName};
use crate::ids::JointId;

/// Stable identifiers for compile failures, independent of message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompileErrorCode {
    JointNameMismatch,
    JointNoRoot,
    MultipleRootJoints,
    JointNonexistentParent,
    JointCycle,
    ActionInvalidBone,
    ActionMultipleCurvesSameType,
    ActionDuplicateKeyframe,
    ActionInvalidFps,
}

impl CompileErrorCode {
    /// The upper-snake identifier callers match on.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JointNameMismatch => "JOINT_NAME_MISMATCH",
            Self::JointNoRoot => "JOINT_NO_ROOT",
            Self::MultipleRootJoints => "MULTIPLE_ROOT_JOINTS",
            Self::JointNonexistentParent => "JOINT_NONEXISTENT_PARENT",
            Self::JointCycle => "JOINT_CYCLE",
            Self::ActionInvalidBone => "ACTION_INVALID_BONE",
            Self::ActionMultipleCurvesSameType => "ACTION_MULTIPLE_CURVES_SAME_TYPE",
            Self::ActionDuplicateKeyframe => "ACTION_DUPLICATE_KEYFRAME",
            Self::ActionInvalidFps => "ACTION_INVALID_FPS",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn join_names(names: &[JointName]) -> String {
    names
        .iter()
        .map(JointName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single validation failure in a skeleton definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CompileError {
    /// A joint is stored under a key other than its own name
    #[error("Joint {name} is stored under key {key}")]
    JointNameMismatch { key: JointName, name: JointName },

    /// Every joint declares a parent
    #[error("No root joint: every joint declares a parent")]
    JointNoRoot,

    /// More than one joint lacks a parent
    #[error("Multiple root joints: {}", join_names(.roots))]
    MultipleRootJoints { roots: Vec<JointName> },

    /// A joint names a parent that is not defined
    #[error("Joint {joint} names nonexistent parent {parent}")]
    JointNonexistentParent { joint: JointName, parent: JointName },

    /// Attaching a joint to its parent would create a cycle
    #[error("Attaching joint {joint} to parent {parent} would create a cycle")]
    JointCycle { joint: JointName, parent: JointName },

    /// An action animates a joint the skeleton does not have
    #[error("Action {action} refers to nonexistent joint {joint}")]
    ActionInvalidBone { action: ActionName, joint: JointName },

    /// A joint has more than one curve of a kind in one action
    #[error("Action {action} has multiple {kind} curves for joint {joint}")]
    ActionMultipleCurvesSameType {
        action: ActionName,
        joint: JointName,
        kind: CurveKind,
    },

    /// A keyframe index repeats within one curve
    #[error("Action {action} has duplicate keyframe {index} in the {kind} curve of joint {joint}")]
    ActionDuplicateKeyframe {
        action: ActionName,
        joint: JointName,
        kind: CurveKind,
        index: u32,
    },

    /// Frames per second must be positive
    #[error("Action {action} has invalid frames per second {fps}: must be positive")]
    ActionInvalidFps { action: ActionName, fps: u32 },
}

impl CompileError {
    #[inline]
    pub fn code(&self) -> CompileErrorCode {
        match self {
            Self::JointNameMismatch { .. } => CompileErrorCode::JointNameMismatch,
            Self::JointNoRoot => CompileErrorCode::JointNoRoot,
            Self::MultipleRootJoints { .. } => CompileErrorCode::MultipleRootJoints,
            Self::JointNonexistentParent { .. } => CompileErrorCode::JointNonexistentParent,
            Self::JointCycle { .. } => CompileErrorCode::JointCycle,
            Self::ActionInvalidBone { .. } => CompileErrorCode::ActionInvalidBone,
            Self::ActionMultipleCurvesSameType { .. } => {
                CompileErrorCode::ActionMultipleCurvesSameType
            }
            Self::ActionDuplicateKeyframe { .. } => CompileErrorCode::ActionDuplicateKeyframe,
            Self::ActionInvalidFps { .. } => CompileErrorCode::ActionInvalidFps,
        }
    }

    /// Human-readable message, same as `Display`.
    #[inline]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::JointNameMismatch { .. }
            | Self::JointNoRoot
            | Self::MultipleRootJoints { .. }
            | Self::JointNonexistentParent { .. }
            | Self::JointCycle { .. } => "joint",
            Self::ActionInvalidBone { .. }
            | Self::ActionMultipleCurvesSameType { .. }
            | Self::ActionDuplicateKeyframe { .. }
            | Self::ActionInvalidFps { .. } => "action",
        }
    }
}

/// Non-empty list of compile failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("skeleton compilation failed: {}", render(.0))]
pub struct CompileErrors(Vec<CompileError>);

fn render(errors: &[CompileError]) -> String {
    let listed = errors
        .iter()
        .map(|e| format!("[{}] {}", e.code(), e))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} error(s): {listed}", errors.len())
}

impl CompileErrors {
    /// Returns `None` for an empty list.
    pub fn new(errors: Vec<CompileError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn single(error: CompileError) -> Self {
        Self(vec![error])
    }

    #[inline]
    pub fn errors(&self) -> &[CompileError] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn codes(&self) -> Vec<CompileErrorCode> {
        self.0.iter().map(CompileError::code).collect()
    }

    pub fn contains(&self, code: CompileErrorCode) -> bool {
        self.0.iter().any(|e| e.code() == code)
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Recoverable failures on the evaluation side.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EvalError {
    /// Joint id outside the skeleton
    #[error("No joint with id {id}")]
    NoSuchJoint { id: JointId },

    /// Action name not present in the compiled skeleton
    #[error("No action named {action}")]
    NoSuchAction { action: ActionName },

    /// Global frames per second must be positive
    #[error("Invalid global frames per second {fps}: must be positive")]
    InvalidGlobalFps { fps: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_stable_names() {
        let err = CompileError::MultipleRootJoints {
            roots: vec![JointName::new("a"), JointName::new("b")],
        };
        assert_eq!(err.code().name(), "MULTIPLE_ROOT_JOINTS");
        assert_eq!(err.category(), "joint");
        assert!(err.message().contains("a, b"));
    }

    #[test]
    fn name_mismatch_names_key_and_joint() {
        let err = CompileError::JointNameMismatch {
            key: JointName::new("hand"),
            name: JointName::new("arm"),
        };
        assert_eq!(err.code().name(), "JOINT_NAME_MISMATCH");
        assert_eq!(err.category(), "joint");
        assert_eq!(err.to_string(), "Joint arm is stored under key hand");
    }

    #[test]
    fn empty_error_list_is_refused() {
        assert!(CompileErrors::new(Vec::new()).is_none());
        let errs = CompileErrors::new(vec![CompileError::JointNoRoot]).unwrap();
        assert_eq!(errs.codes(), vec![CompileErrorCode::JointNoRoot]);
        assert!(!errs.is_empty());
    }

    #[test]
    fn duplicate_keyframe_message_names_everything() {
        let err = CompileError::ActionDuplicateKeyframe {
            action: ActionName::new("walk"),
            joint: JointName::new("hip"),
            kind: CurveKind::Orientation,
            index: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("walk"));
        assert!(msg.contains("hip"));
        assert!(msg.contains("orientation"));
        assert!(msg.contains("12"));
        assert_eq!(err.category(), "action");
    }

    #[test]
    fn test_serialization() {
        let errs = CompileErrors::single(CompileError::ActionInvalidFps {
            action: ActionName::new("idle"),
            fps: 0,
        });
        let serialized = serde_json::to_string(&errs).unwrap();
        let deserialized: CompileErrors = serde_json::from_str(&serialized).unwrap();
        assert_eq!(errs, deserialized);
    }
}
