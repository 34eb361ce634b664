//! Per-action evaluation.
//!
//! An [`ActionEvaluator`] is built once per (skeleton, action, global fps). The
//! action's curves are re-timed to the global rate, then every joint gets a
//! [`JointTracks`] record with one timeline per curve kind that has keyframes.
//!
//! Sampling rules for one track:
//! - no keyframes: the joint's rest value
//! - between two keyframes: interpolated with the earlier keyframe's kind and easing
//! - before the first keyframe: linear lead-in from the rest value at frame 0
//! - after the last keyframe: the last value is held

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compiled::{CompiledAction, CompiledCurve, CompiledJointCurves, CompiledSkeleton};
use crate::config::EvaluatorConfig;
use crate::definition::{ActionName, Interpolation, Keyframe};
use crate::error::EvalError;
use crate::ids::JointId;
use crate::interp::{interpolate, Interpolate};
use crate::math::{Quaternion, Vector3};
use crate::pose::EvaluatedSkeleton;
use crate::timeline::KeyframeTimeline;

/// Keyframes of one curve kind for one joint, with their timeline.
#[derive(Debug, Clone)]
pub struct Track<T> {
    keyframes: BTreeMap<u32, Keyframe<T>>,
    timeline: Option<KeyframeTimeline>,
}

impl<T: Interpolate> Track<T> {
    fn new(curve: Option<CompiledCurve<T>>, last_frame: u32) -> Self {
        let keyframes = curve.map(|c| c.keyframes).unwrap_or_default();
        let timeline = (!keyframes.is_empty())
            .then(|| KeyframeTimeline::new(keyframes.keys().copied().collect(), last_frame));
        Self {
            keyframes,
            timeline,
        }
    }

    #[inline]
    pub fn keyframes(&self) -> &BTreeMap<u32, Keyframe<T>> {
        &self.keyframes
    }

    #[inline]
    pub fn timeline(&self) -> Option<&KeyframeTimeline> {
        self.timeline.as_ref()
    }

    pub fn sample(&self, rest: &T, frame_start: i64, frame_current: i64, time_scale: f64) -> T {
        let Some(timeline) = &self.timeline else {
            return *rest;
        };
        let current = timeline.keyframe_current_held(frame_start, frame_current, time_scale);
        let alpha = current.progress();
        match (current.previous, current.next) {
            (Some(previous), Some(next)) => {
                let lower = &self.keyframes[&previous];
                let upper = &self.keyframes[&next];
                interpolate(
                    lower.interpolation,
                    lower.easing,
                    &lower.value,
                    &upper.value,
                    alpha,
                )
            }
            (None, Some(next)) => {
                let upper = &self.keyframes[&next];
                interpolate(Interpolation::Linear, upper.easing, rest, &upper.value, alpha)
            }
            (Some(previous), None) => self.keyframes[&previous].value,
            (None, None) => *rest,
        }
    }
}

/// Tracks for every curve kind of one joint.
#[derive(Debug, Clone)]
pub struct JointTracks {
    pub joint: JointId,
    pub translation: Track<Vector3>,
    pub orientation: Track<Quaternion>,
    pub scale: Track<Vector3>,
}

impl JointTracks {
    fn new(joint: JointId, curves: Option<CompiledJointCurves>) -> Self {
        let curves = curves.unwrap_or_default();
        // one period for every kind of this joint
        let last_frame = curves.last_frame().unwrap_or(0);
        Self {
            joint,
            translation: Track::new(curves.translation, last_frame),
            orientation: Track::new(curves.orientation, last_frame),
            scale: Track::new(curves.scale, last_frame),
        }
    }

    /// True when no curve kind has keyframes.
    pub fn is_static(&self) -> bool {
        self.translation.timeline.is_none()
            && self.orientation.timeline.is_none()
            && self.scale.timeline.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ActionEvaluator {
    skeleton: Arc<CompiledSkeleton>,
    action: ActionName,
    global_fps: u32,
    tracks: Vec<JointTracks>,
}

impl ActionEvaluator {
    pub fn new(
        skeleton: Arc<CompiledSkeleton>,
        action: &ActionName,
        global_fps: u32,
    ) -> Result<Self, EvalError> {
        let config = EvaluatorConfig::default().with_global_fps(global_fps);
        Self::with_config(skeleton, action, &config)
    }

    pub fn with_config(
        skeleton: Arc<CompiledSkeleton>,
        action: &ActionName,
        config: &EvaluatorConfig,
    ) -> Result<Self, EvalError> {
        config.validate()?;
        let compiled = skeleton
            .action(action.as_str())
            .ok_or_else(|| EvalError::NoSuchAction {
                action: action.clone(),
            })?;

        let tracks = match compiled {
            CompiledAction::Curves(curves) => skeleton
                .joints()
                .map(|joint| {
                    let rescaled = curves
                        .joints
                        .get(&joint.name)
                        .map(|c| c.rescale(curves.frames_per_second, config.global_fps));
                    JointTracks::new(joint.id, rescaled)
                })
                .collect::<Vec<_>>(),
        };

        log::debug!(
            "evaluator for action {} on {}: {} fps -> {} fps, {} animated joints",
            action,
            skeleton.name(),
            compiled.frames_per_second(),
            config.global_fps,
            tracks.iter().filter(|t| !t.is_static()).count()
        );
        Ok(Self {
            skeleton,
            action: action.clone(),
            global_fps: config.global_fps,
            tracks,
        })
    }

    #[inline]
    pub fn skeleton(&self) -> &Arc<CompiledSkeleton> {
        &self.skeleton
    }

    #[inline]
    pub fn action(&self) -> &ActionName {
        &self.action
    }

    #[inline]
    pub fn global_fps(&self) -> u32 {
        self.global_fps
    }

    /// Tracks in joint id order.
    #[inline]
    pub fn tracks(&self) -> &[JointTracks] {
        &self.tracks
    }

    /// Panics on ids outside the skeleton.
    #[inline]
    pub fn joint_tracks(&self, joint: JointId) -> &JointTracks {
        &self.tracks[joint.index()]
    }

    pub fn evaluate_translation(
        &self,
        joint: JointId,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) -> Vector3 {
        let rest = &self.skeleton.joint(joint).translation;
        self.joint_tracks(joint)
            .translation
            .sample(rest, frame_start, frame_current, time_scale)
    }

    pub fn evaluate_orientation(
        &self,
        joint: JointId,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) -> Quaternion {
        let rest = &self.skeleton.joint(joint).orientation;
        self.joint_tracks(joint)
            .orientation
            .sample(rest, frame_start, frame_current, time_scale)
    }

    pub fn evaluate_scale(
        &self,
        joint: JointId,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) -> Vector3 {
        let rest = &self.skeleton.joint(joint).scale;
        self.joint_tracks(joint)
            .scale
            .sample(rest, frame_start, frame_current, time_scale)
    }

    /// Write every joint's local TRS for this frame into `pose`.
    ///
    /// Panics if `pose` was built for a skeleton with a different joint count.
    pub fn evaluate(
        &self,
        pose: &mut EvaluatedSkeleton,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) {
        assert_eq!(
            pose.joint_count(),
            self.tracks.len(),
            "pose and evaluator belong to different skeletons"
        );
        for tracks in &self.tracks {
            let id = tracks.joint;
            pose.set_translation(
                id,
                self.evaluate_translation(id, frame_start, frame_current, time_scale),
            );
            pose.set_orientation(
                id,
                self.evaluate_orientation(id, frame_start, frame_current, time_scale),
            );
            pose.set_scale(
                id,
                self.evaluate_scale(id, frame_start, frame_current, time_scale),
            );
        }
    }
}
