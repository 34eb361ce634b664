use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    skeletons: HashMap<String, SkeletonEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkeletonEntry {
    Path(String),
    /// Definitions that are expected to be rejected, with the codes they should produce.
    Invalid { path: String, errors: Vec<String> },
}

impl SkeletonEntry {
    fn as_path(&self) -> &str {
        match self {
            SkeletonEntry::Path(path) => path,
            SkeletonEntry::Invalid { path, .. } => path,
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod skeletons {
    use super::*;
    use armature_core::SkeletonDefinition;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<_> = MANIFEST.skeletons.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Fixtures that should compile.
    pub fn valid_keys() -> Vec<String> {
        keys()
            .into_iter()
            .filter(|k| matches!(MANIFEST.skeletons[k], SkeletonEntry::Path(_)))
            .collect()
    }

    /// Error code names the fixture is expected to produce, empty for valid ones.
    pub fn expected_errors(name: &str) -> Result<Vec<String>> {
        match lookup(&MANIFEST.skeletons, "skeleton", name)? {
            SkeletonEntry::Path(_) => Ok(Vec::new()),
            SkeletonEntry::Invalid { errors, .. } => Ok(errors.clone()),
        }
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        super::load_json(entry.as_path())
    }

    pub fn definition(name: &str) -> Result<SkeletonDefinition> {
        load(name)
    }
}

/// Programmatic definitions for tests and benches.
pub mod builders {
    use armature_core::{
        ActionDefinition, Curve, CurveDefinition, JointDefinition, Keyframe, SkeletonDefinition,
        Vector3,
    };

    /// Joint name at position `i` of a chain, zero-padded so name order matches depth.
    pub fn chain_joint(i: usize) -> String {
        format!("joint_{i:03}")
    }

    /// `len` joints, each one `spacing` along X from its parent.
    pub fn chain(len: usize, spacing: f64) -> SkeletonDefinition {
        (0..len).fold(SkeletonDefinition::new("chain"), |def, i| {
            let mut joint = JointDefinition::new(chain_joint(i));
            if i > 0 {
                joint = joint
                    .with_parent(chain_joint(i - 1))
                    .with_translation(Vector3::new(spacing, 0.0, 0.0));
            }
            def.with_joint(joint)
        })
    }

    /// Root joint plus `width` direct children, each with `depth` descendants.
    pub fn fan(width: usize, depth: usize) -> SkeletonDefinition {
        let mut def = SkeletonDefinition::new("fan").with_joint(JointDefinition::new("root"));
        for w in 0..width {
            let mut parent = "root".to_owned();
            for d in 0..depth.max(1) {
                let name = format!("b{w:02}_{d:02}");
                def = def.with_joint(
                    JointDefinition::new(name.clone())
                        .with_parent(parent)
                        .with_translation(Vector3::new(0.0, 1.0, 0.0)),
                );
                parent = name;
            }
        }
        def
    }

    /// Linear translation from `from` at frame 0 to `to` at `end_frame`.
    pub fn translation_ramp(end_frame: u32, from: Vector3, to: Vector3) -> CurveDefinition {
        CurveDefinition::Translation(Curve::new(vec![
            Keyframe::linear(0, from),
            Keyframe::linear(end_frame, to),
        ]))
    }

    /// Action translating every listed joint along X by `distance` over `end_frame` frames.
    pub fn slide_action<'a>(
        name: &str,
        fps: u32,
        end_frame: u32,
        distance: f64,
        joints: impl IntoIterator<Item = &'a str>,
    ) -> ActionDefinition {
        joints
            .into_iter()
            .fold(ActionDefinition::new(name, fps), |action, joint| {
                action.with_curve(
                    joint,
                    translation_ramp(end_frame, Vector3::zeros(), Vector3::new(distance, 0.0, 0.0)),
                )
            })
    }
}
