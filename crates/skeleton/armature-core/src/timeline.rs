//! Keyframe timeline lookup.
//!
//! Model:
//! - A timeline holds the sorted keyframe indices of one curve of one joint, and a
//!   period ("last frame") shared by every curve of that joint.
//! - A global frame is made local to the action start, multiplied by the time
//!   scale, then wrapped into `[0, period)` with a modulo that is never negative.
//! - The result brackets the wrapped frame between the keyframe at or before it
//!   and the first keyframe after it.

use std::collections::BTreeSet;

/// Bracketing keyframes for one lookup.
///
/// `previous` is absent when the frame lies before the first keyframe and `next`
/// is absent when it lies at or after the last one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeCurrent {
    pub previous: Option<u32>,
    pub next: Option<u32>,
    /// Wrapped frame, not floored.
    pub current: f64,
}

impl KeyframeCurrent {
    /// Fraction of the way from `previous` to `next`, in `[0, 1]`.
    ///
    /// - both present: `(current - previous) / (next - previous)`, 0 when they coincide
    /// - no previous: measured from frame 0, so a lead-in starts at 0
    /// - no next: 0, the previous value is held
    pub fn progress(&self) -> f64 {
        let (lo, hi) = match (self.previous, self.next) {
            (Some(p), Some(n)) => (f64::from(p), f64::from(n)),
            (None, Some(n)) => (0.0, f64::from(n)),
            (_, None) => return 0.0,
        };
        if hi <= lo {
            return 0.0;
        }
        ((self.current - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeTimeline {
    keyframes: Vec<u32>,
    last_frame: u32,
}

impl KeyframeTimeline {
    /// Panics if `keyframes` is empty.
    pub fn new(keyframes: BTreeSet<u32>, last_frame: u32) -> Self {
        assert!(
            !keyframes.is_empty(),
            "keyframe timeline needs at least one keyframe"
        );
        Self {
            keyframes: keyframes.into_iter().collect(),
            last_frame,
        }
    }

    #[inline]
    pub fn keyframes(&self) -> &[u32] {
        &self.keyframes
    }

    #[inline]
    pub fn last_frame(&self) -> u32 {
        self.last_frame
    }

    /// Resolve a global frame into its bracketing keyframes.
    pub fn keyframe_current(
        &self,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) -> KeyframeCurrent {
        if let Some(single) = self.single() {
            return single;
        }
        let scaled = scaled_local_frame(frame_start, frame_current, time_scale);
        self.bracket(wrap(scaled, f64::from(self.last_frame)))
    }

    /// Like [`Self::keyframe_current`], except that a forward frame landing exactly
    /// on the end of a cycle stays on the final keyframe instead of wrapping to 0.
    pub fn keyframe_current_held(
        &self,
        frame_start: i64,
        frame_current: i64,
        time_scale: f64,
    ) -> KeyframeCurrent {
        if let Some(single) = self.single() {
            return single;
        }
        let scaled = scaled_local_frame(frame_start, frame_current, time_scale);
        let period = f64::from(self.last_frame);
        let frame = wrap(scaled, period);
        if frame == 0.0 && scaled > 0.0 && period > 0.0 {
            return self.bracket(period);
        }
        self.bracket(frame)
    }

    fn single(&self) -> Option<KeyframeCurrent> {
        match self.keyframes.as_slice() {
            [only] => Some(KeyframeCurrent {
                previous: Some(*only),
                next: Some(*only),
                current: f64::from(*only),
            }),
            _ => None,
        }
    }

    fn bracket(&self, frame: f64) -> KeyframeCurrent {
        // frame is in [0, last_frame], which fits in u32
        let iframe = frame.floor() as u32;
        let after = self.keyframes.partition_point(|k| *k <= iframe);
        KeyframeCurrent {
            previous: after.checked_sub(1).map(|i| self.keyframes[i]),
            next: self.keyframes.get(after).copied(),
            current: frame,
        }
    }
}

fn scaled_local_frame(frame_start: i64, frame_current: i64, time_scale: f64) -> f64 {
    let local = i128::from(frame_current) - i128::from(frame_start);
    local as f64 * time_scale
}

/// Floating modulo with a result in `[0, period)`. Non-finite input and a zero
/// period map to 0.
fn wrap(frame: f64, period: f64) -> f64 {
    if period <= 0.0 || !frame.is_finite() {
        return 0.0;
    }
    let mut m = frame % period;
    if m < 0.0 {
        m += period;
    }
    // a tiny negative remainder can round up to the period itself
    if m >= period {
        0.0
    } else {
        m
    }
}
