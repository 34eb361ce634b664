//! Authored (pre-compile) skeleton model.
//!
//! Nothing here is validated: parents may be missing, curves may repeat, keyframe
//! indices may collide. [`crate::compile`] turns a [`SkeletonDefinition`] into a
//! checked [`crate::CompiledSkeleton`] or a complete list of reasons it cannot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::math::{quaternion_identity, Quaternion, Vector3};

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(
    /// Unique joint name within a skeleton.
    JointName
);
name_type!(
    /// Unique action name within a skeleton.
    ActionName
);
name_type!(SkeletonName);

/// How a keyframe blends into the following one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Step to the next keyframe's value.
    Constant,
    Linear,
    /// Reserved; evaluating it panics.
    Quadratic,
    /// Reserved; evaluating it panics.
    Exponential,
}

impl Interpolation {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Exponential => "exponential",
        }
    }
}

/// Easing is carried through evaluation but does not yet change results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Translation,
    Orientation,
    Scale,
}

impl CurveKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Orientation => "orientation",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A keyframe: value at an integer frame index plus how to leave it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub index: u32,
    pub interpolation: Interpolation,
    pub easing: Easing,
    pub value: T,
}

impl<T> Keyframe<T> {
    #[inline]
    pub fn new(index: u32, interpolation: Interpolation, easing: Easing, value: T) -> Self {
        Self {
            index,
            interpolation,
            easing,
            value,
        }
    }

    /// Linear, ease-in-out keyframe.
    #[inline]
    pub fn linear(index: u32, value: T) -> Self {
        Self::new(index, Interpolation::Linear, Easing::InOut, value)
    }

    #[inline]
    pub fn constant(index: u32, value: T) -> Self {
        Self::new(index, Interpolation::Constant, Easing::InOut, value)
    }
}

/// Keyframes in authored order (indices may repeat before compilation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve<T> {
    pub keyframes: Vec<Keyframe<T>>,
}

impl<T> Curve<T> {
    pub fn new(keyframes: Vec<Keyframe<T>>) -> Self {
        Self { keyframes }
    }
}

/// One TRS component of one joint within an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveDefinition {
    Translation(Curve<Vector3>),
    Orientation(Curve<Quaternion>),
    Scale(Curve<Vector3>),
}

impl CurveDefinition {
    #[inline]
    pub fn kind(&self) -> CurveKind {
        match self {
            Self::Translation(_) => CurveKind::Translation,
            Self::Orientation(_) => CurveKind::Orientation,
            Self::Scale(_) => CurveKind::Scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDefinition {
    pub name: JointName,
    #[serde(default)]
    pub parent: Option<JointName>,
    pub translation: Vector3,
    pub orientation: Quaternion,
    pub scale: Vector3,
}

impl JointDefinition {
    /// Joint at the origin with identity orientation and unit scale.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: JointName::new(name),
            parent: None,
            translation: Vector3::zeros(),
            orientation: quaternion_identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(JointName::new(parent));
        self
    }

    pub fn with_translation(mut self, translation: Vector3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_orientation(mut self, orientation: Quaternion) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: ActionName,
    pub frames_per_second: u32,
    /// Curves per joint, in authored order.
    #[serde(default)]
    pub curves: BTreeMap<JointName, Vec<CurveDefinition>>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, frames_per_second: u32) -> Self {
        Self {
            name: ActionName::new(name),
            frames_per_second,
            curves: BTreeMap::new(),
        }
    }

    /// Append a curve for `joint`.
    pub fn with_curve(mut self, joint: impl Into<String>, curve: CurveDefinition) -> Self {
        self.curves
            .entry(JointName::new(joint))
            .or_default()
            .push(curve);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDefinition {
    pub name: SkeletonName,
    #[serde(default)]
    pub joints: BTreeMap<JointName, JointDefinition>,
    #[serde(default)]
    pub actions: BTreeMap<ActionName, ActionDefinition>,
}

impl SkeletonDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: SkeletonName::new(name),
            joints: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    /// Insert a joint keyed by its own name, replacing any joint of that name.
    pub fn with_joint(mut self, joint: JointDefinition) -> Self {
        self.joints.insert(joint.name.clone(), joint);
        self
    }

    /// Insert an action keyed by its own name, replacing any action of that name.
    pub fn with_action(mut self, action: ActionDefinition) -> Self {
        self.actions.insert(action.name.clone(), action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_key_by_name() {
        let def = SkeletonDefinition::new("rig")
            .with_joint(JointDefinition::new("root"))
            .with_joint(JointDefinition::new("arm").with_parent("root"))
            .with_action(ActionDefinition::new("wave", 30).with_curve(
                "arm",
                CurveDefinition::Scale(Curve::new(vec![Keyframe::linear(
                    0,
                    Vector3::new(1.0, 1.0, 1.0),
                )])),
            ));
        assert_eq!(def.joints.len(), 2);
        assert_eq!(
            def.joints["arm"].parent.as_ref().map(JointName::as_str),
            Some("root")
        );
        assert_eq!(def.actions["wave"].curves["arm"][0].kind(), CurveKind::Scale);
    }

    #[test]
    fn curve_json_shape() {
        let curve = CurveDefinition::Translation(Curve::new(vec![Keyframe::linear(
            4,
            Vector3::new(1.0, 2.0, 3.0),
        )]));
        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(json["kind"], "translation");
        assert_eq!(json["keyframes"][0]["index"], 4);
        assert_eq!(json["keyframes"][0]["interpolation"], "linear");
        let back: CurveDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, curve);
    }
}
