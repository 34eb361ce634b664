//! Skeleton compiler: definition → validated, id-indexed [`CompiledSkeleton`].
//!
//! Stages run in order and stop at the first stage that fails, because each
//! stage's output is what the next one walks:
//!
//! 1. key check (every joint stored under its own name)
//! 2. root finding
//! 3. tree building (parents resolved on demand, cycles rejected by the tree)
//! 4. id assignment (breadth-first, then by name within a depth)
//! 5. index building
//! 6. action compilation
//!
//! Within a stage, independent errors are collected rather than returned early.
//! No stage recurses per hierarchy level, so chain depth is bounded by memory only.

use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::compiled::{
    CompiledAction, CompiledActionCurves, CompiledCurve, CompiledJoint, CompiledJointCurves,
    CompiledSkeleton,
};
use crate::definition::{
    ActionDefinition, ActionName, Curve, CurveDefinition, CurveKind, JointDefinition, JointName,
    SkeletonDefinition,
};
use crate::error::{CompileError, CompileErrors};
use crate::ids::{IdAllocator, JointId};
use crate::tree::{NodeId, Tree, TreeError};

/// Compile a skeleton definition.
///
/// Total: every input yields either a compiled skeleton or a non-empty list of
/// every problem found in the first failing stage.
pub fn compile(definition: &SkeletonDefinition) -> Result<CompiledSkeleton, CompileErrors> {
    check_joint_keys(definition)?;
    let root = find_root(definition)?;
    let (tree, root_node) = build_tree(definition, root)?;
    let tree = assign_ids(tree, root_node);
    let skeleton =
        CompiledSkeleton::from_tree(definition.name.clone(), tree, root_node, BTreeMap::new());
    let actions = compile_actions(&skeleton, &definition.actions)?;

    log::debug!(
        "compiled skeleton {} ({} joints, {} actions)",
        skeleton.name(),
        skeleton.joint_count(),
        actions.len()
    );
    Ok(skeleton.with_actions(actions))
}

/// Parents are resolved by key and nodes remembered by name, so the two must agree.
fn check_joint_keys(definition: &SkeletonDefinition) -> Result<(), CompileErrors> {
    let mismatches = definition
        .joints
        .iter()
        .filter(|(key, joint)| **key != joint.name)
        .map(|(key, joint)| CompileError::JointNameMismatch {
            key: key.clone(),
            name: joint.name.clone(),
        })
        .collect();
    match CompileErrors::new(mismatches) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

fn find_root(definition: &SkeletonDefinition) -> Result<&JointDefinition, CompileErrors> {
    let roots: Vec<&JointDefinition> = definition
        .joints
        .values()
        .filter(|j| j.parent.is_none())
        .collect();

    match roots.as_slice() {
        [] => Err(CompileErrors::single(CompileError::JointNoRoot)),
        [root] => Ok(root),
        _ => Err(CompileErrors::single(CompileError::MultipleRootJoints {
            roots: roots.iter().map(|j| j.name.clone()).collect(),
        })),
    }
}

/// Tree node payload before ids exist.
struct PendingJoint<'a> {
    definition: &'a JointDefinition,
}

struct TreeBuilder<'a> {
    definition: &'a SkeletonDefinition,
    tree: Tree<PendingJoint<'a>>,
    nodes: HashMap<&'a JointName, NodeId>,
    errors: Vec<CompileError>,
}

impl<'a> TreeBuilder<'a> {
    /// Node for `joint`, creating it and every not-yet-seen ancestor on first use.
    ///
    /// Walks up the parent names until reaching a joint that already has a node,
    /// the root, or a missing parent, then attaches the new nodes top-down. Each
    /// new node is still a leaf when attached, so the tree's cycle check stays
    /// cheap except where a cycle actually closes.
    fn node_for(&mut self, joint: &'a JointDefinition) -> NodeId {
        if let Some(node) = self.nodes.get(&joint.name) {
            return *node;
        }

        let definition = self.definition;
        let mut created: Vec<(&'a JointDefinition, NodeId)> = Vec::new();
        let mut cursor = joint;
        loop {
            let node = self.tree.insert(PendingJoint { definition: cursor });
            self.nodes.insert(&cursor.name, node);
            created.push((cursor, node));

            let Some(parent_name) = cursor.parent.as_ref() else {
                break;
            };
            if self.nodes.contains_key(parent_name) {
                break;
            }
            match definition.joints.get(parent_name) {
                Some(parent) => cursor = parent,
                None => {
                    self.errors.push(CompileError::JointNonexistentParent {
                        joint: cursor.name.clone(),
                        parent: parent_name.clone(),
                    });
                    break;
                }
            }
        }

        for (child, node) in created.iter().rev() {
            let Some(parent_name) = child.parent.as_ref() else {
                continue;
            };
            // Missing parents were reported during the walk.
            let Some(&parent_node) = self.nodes.get(parent_name) else {
                continue;
            };
            match self.tree.attach(*node, parent_node) {
                Ok(()) => {}
                Err(TreeError::Cycle { .. }) => self.errors.push(CompileError::JointCycle {
                    joint: child.name.clone(),
                    parent: parent_name.clone(),
                }),
            }
        }

        created[0].1
    }
}

fn build_tree<'a>(
    definition: &'a SkeletonDefinition,
    root: &'a JointDefinition,
) -> Result<(Tree<PendingJoint<'a>>, NodeId), CompileErrors> {
    let mut builder = TreeBuilder {
        definition,
        tree: Tree::with_capacity(definition.joints.len()),
        nodes: HashMap::with_capacity(definition.joints.len()),
        errors: Vec::new(),
    };

    let root_node = builder.node_for(root);
    for joint in definition.joints.values() {
        builder.node_for(joint);
    }

    if let Some(errors) = CompileErrors::new(builder.errors) {
        return Err(errors);
    }

    assert_eq!(
        builder.tree.len(),
        definition.joints.len(),
        "tree node count does not match joint definition count"
    );
    Ok((builder.tree, root_node))
}

/// Breadth-first from the root, stable-sorted by (depth, name), ids handed out in
/// that order. The root gets 0 and every ancestor gets a lower id than its
/// descendants.
fn assign_ids(tree: Tree<PendingJoint<'_>>, root: NodeId) -> Tree<CompiledJoint> {
    let mut ordered: Vec<(NodeId, usize)> = tree.breadth_first(root).collect();
    assert_eq!(
        ordered.len(),
        tree.len(),
        "breadth-first traversal did not reach every joint"
    );
    ordered.sort_by(|(a, da), (b, db)| {
        da.cmp(db)
            .then_with(|| tree.value(*a).definition.name.cmp(&tree.value(*b).definition.name))
    });

    let mut ids = IdAllocator::new();
    let mut assigned: Vec<Option<JointId>> = vec![None; tree.len()];
    for (node, _) in &ordered {
        assigned[node.index()] = Some(ids.alloc_joint());
    }
    let id_of = |node: NodeId| -> JointId {
        assigned[node.index()]
            .unwrap_or_else(|| panic!("node {} was not assigned an id", node.index()))
    };

    let parents: Vec<Option<JointId>> = tree
        .ids()
        .map(|node| tree.parent(node).map(id_of))
        .collect();

    tree.map(|node, pending| {
        let def = pending.definition;
        CompiledJoint {
            id: id_of(node),
            name: def.name.clone(),
            parent: parents[node.index()],
            translation: def.translation,
            orientation: def.orientation,
            scale: def.scale,
        }
    })
}

fn compile_actions(
    skeleton: &CompiledSkeleton,
    actions: &BTreeMap<ActionName, ActionDefinition>,
) -> Result<BTreeMap<ActionName, CompiledAction>, CompileErrors> {
    let mut compiled = BTreeMap::new();
    let mut errors = Vec::new();

    for (name, action) in actions {
        match compile_action(skeleton, name, action) {
            Ok(action) => {
                compiled.insert(name.clone(), action);
            }
            Err(mut action_errors) => {
                log::debug!(
                    "action {name} rejected with {} error(s)",
                    action_errors.len()
                );
                errors.append(&mut action_errors);
            }
        }
    }

    match CompileErrors::new(errors) {
        Some(errors) => Err(errors),
        None => Ok(compiled),
    }
}

/// Validate and compile one action. Any error rejects the whole action.
fn compile_action(
    skeleton: &CompiledSkeleton,
    name: &ActionName,
    action: &ActionDefinition,
) -> Result<CompiledAction, Vec<CompileError>> {
    let mut errors = Vec::new();

    if action.frames_per_second == 0 {
        errors.push(CompileError::ActionInvalidFps {
            action: name.clone(),
            fps: action.frames_per_second,
        });
    }

    let mut joints = BTreeMap::new();
    for (joint_name, curves) in &action.curves {
        let known = skeleton.joint_by_name(joint_name.as_str()).is_some();
        if !known {
            errors.push(CompileError::ActionInvalidBone {
                action: name.clone(),
                joint: joint_name.clone(),
            });
        }
        // Curves of an unknown joint are still checked, then dropped.
        let mut ctx = CurveContext {
            action: name,
            joint: joint_name,
            errors: &mut errors,
        };
        let curves = ctx.joint_curves(curves);
        if known {
            joints.insert(joint_name.clone(), curves);
        }
    }

    if errors.is_empty() {
        Ok(CompiledAction::Curves(CompiledActionCurves {
            name: name.clone(),
            frames_per_second: action.frames_per_second,
            joints,
        }))
    } else {
        Err(errors)
    }
}

struct CurveContext<'a> {
    action: &'a ActionName,
    joint: &'a JointName,
    errors: &'a mut Vec<CompileError>,
}

impl CurveContext<'_> {
    fn joint_curves(&mut self, curves: &[CurveDefinition]) -> CompiledJointCurves {
        let mut out = CompiledJointCurves::default();
        let mut seen = BTreeSet::new();

        for curve in curves {
            let kind = curve.kind();
            if !seen.insert(kind) {
                self.errors.push(CompileError::ActionMultipleCurvesSameType {
                    action: self.action.clone(),
                    joint: self.joint.clone(),
                    kind,
                });
                continue;
            }
            match curve {
                CurveDefinition::Translation(c) => out.translation = Some(self.keyframes(kind, c)),
                CurveDefinition::Orientation(c) => out.orientation = Some(self.keyframes(kind, c)),
                CurveDefinition::Scale(c) => out.scale = Some(self.keyframes(kind, c)),
            }
        }
        out
    }

    fn keyframes<T: Clone>(&mut self, kind: CurveKind, curve: &Curve<T>) -> CompiledCurve<T> {
        let mut keyframes = BTreeMap::new();
        for keyframe in &curve.keyframes {
            if keyframes.insert(keyframe.index, keyframe.clone()).is_some() {
                self.errors.push(CompileError::ActionDuplicateKeyframe {
                    action: self.action.clone(),
                    joint: self.joint.clone(),
                    kind,
                    index: keyframe.index,
                });
            }
        }
        CompiledCurve::new(keyframes)
    }
}
