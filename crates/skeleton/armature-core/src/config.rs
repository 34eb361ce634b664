//! Evaluation session configuration.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Settings shared by an action evaluator and the evaluated skeleton it writes into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Frame rate actions are re-timed to before evaluation.
    pub global_fps: u32,
    /// Matrices preallocated in the per-session scratch pool.
    pub scratch_matrices: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            global_fps: 60,
            scratch_matrices: 8,
        }
    }
}

impl EvaluatorConfig {
    pub fn with_global_fps(mut self, global_fps: u32) -> Self {
        self.global_fps = global_fps;
        self
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if self.global_fps == 0 {
            return Err(EvalError::InvalidGlobalFps {
                fps: self.global_fps,
            });
        }
        Ok(())
    }
}
