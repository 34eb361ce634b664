use std::sync::Arc;

use approx::assert_relative_eq;
use armature_core::{
    compile, ActionDefinition, ActionEvaluator, ActionName, CompiledSkeleton, Curve,
    CurveDefinition, EvaluatedSkeleton, EvaluatorConfig, JointDefinition, JointId, Keyframe,
    Quaternion, RestPose, SkeletonDefinition, Vector3,
};
use armature_core::math::{quaternion_identity, transform_point};
use armature_test_fixtures::{builders, skeletons};

fn ramp_skeleton() -> Arc<CompiledSkeleton> {
    let def = SkeletonDefinition::new("ramp")
        .with_joint(JointDefinition::new("root"))
        .with_action(ActionDefinition::new("ramp", 60).with_curve(
            "root",
            CurveDefinition::Translation(Curve::new(vec![
                Keyframe::linear(0, Vector3::zeros()),
                Keyframe::linear(10, Vector3::repeat(1.0)),
            ])),
        ));
    Arc::new(compile(&def).unwrap())
}

fn origin(pose: &mut EvaluatedSkeleton, id: JointId) -> Vector3 {
    transform_point(pose.transform_absolute(id), &Vector3::zeros())
}

#[test]
fn linear_ramp_scenario() {
    let ev = ActionEvaluator::new(ramp_skeleton(), &ActionName::new("ramp"), 60).unwrap();
    let at = |frame| ev.evaluate_translation(JointId::ROOT, 0, frame, 1.0);
    assert_relative_eq!(at(5), Vector3::repeat(0.5));
    assert_eq!(at(10), Vector3::repeat(1.0));
    assert_relative_eq!(at(15), Vector3::repeat(0.5));
    assert_eq!(at(0), Vector3::zeros());
    assert_eq!(at(20), Vector3::repeat(1.0));
}

#[test]
fn rest_values_at_the_start_without_a_frame_zero_keyframe() {
    let def = skeletons::definition("biped").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    // foot_l has no frame 0 keyframe in stomp
    let ev = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("stomp"), 60).unwrap();
    let foot = skel.joint_by_name("foot_l").unwrap();
    for start in [0i64, 1234, -99] {
        assert_eq!(
            ev.evaluate_translation(foot.id, start, start, 1.0),
            foot.translation
        );
        assert_eq!(ev.evaluate_orientation(foot.id, start, start, 1.0), foot.orientation);
        assert_eq!(ev.evaluate_scale(foot.id, start, start, 1.0), foot.scale);
    }
}

#[test]
fn single_keyframe_curve_is_constant() {
    let def = skeletons::definition("biped").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    let ev = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("stomp"), 60).unwrap();
    let hips = skel.joint_by_name("hips").unwrap().id;
    for frame in [0, 17, 59, 60, 1000] {
        assert_relative_eq!(
            ev.evaluate_scale(hips, 0, frame, 1.0),
            Vector3::new(1.1, 0.9, 1.1)
        );
    }
}

#[test]
fn authored_rate_is_rescaled_to_the_global_rate() {
    let def = skeletons::definition("biped").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    let head = skel.joint_by_name("head").unwrap().id;
    let at_30 = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("nod"), 30).unwrap();
    let at_60 = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("nod"), 60).unwrap();
    for frame in [0i64, 4, 15, 22] {
        let a = at_30.evaluate_orientation(head, 0, frame, 1.0);
        let b = at_60.evaluate_orientation(head, 0, frame * 2, 1.0);
        assert_relative_eq!(a.coords, b.coords, epsilon = 1e-12);
    }
    let peak = at_60.evaluate_orientation(head, 0, 30, 1.0);
    assert_relative_eq!(peak.i, 0.2588190451, epsilon = 1e-9);
}

#[test]
fn orientation_lerp_is_not_renormalised() {
    let def = skeletons::definition("biped").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    let head = skel.joint_by_name("head").unwrap().id;
    let ev = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("nod"), 30).unwrap();
    let half: Quaternion = ev.evaluate_orientation(head, 0, 7, 1.0);
    // between two unit quaternions, component-wise lerp falls inside the unit sphere
    assert!(half.norm() < 1.0);
    assert_eq!(ev.evaluate_orientation(head, 0, 0, 1.0), quaternion_identity());
}

#[test]
fn root_motion_moves_the_whole_chain() {
    let def = skeletons::definition("chain3").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    let rest = Arc::new(RestPose::build(Arc::clone(&skel)));
    let ev = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("slide"), 60).unwrap();
    let mut pose = EvaluatedSkeleton::new(rest);

    let ids: Vec<JointId> = skel.joints().map(|j| j.id).collect();
    let before: Vec<Vector3> = ids.iter().map(|id| origin(&mut pose, *id)).collect();

    ev.evaluate(&mut pose, 0, 10, 1.0);
    let delta = Vector3::new(3.0, 0.0, 0.0);
    for (id, start) in ids.iter().zip(&before) {
        assert_relative_eq!(origin(&mut pose, *id), start + delta, epsilon = 1e-12);
    }

    // deform moves rest-space points by the same delta
    let tip = skel.joint_by_name("tip").unwrap().id;
    let p = transform_point(pose.transform_deform(tip), &Vector3::new(2.0, 1.0, 0.0));
    assert_relative_eq!(p, Vector3::new(5.0, 1.0, 0.0), epsilon = 1e-12);
}

#[test]
fn sessions_share_compiled_data() {
    let skel = Arc::new(compile(&builders::chain(3, 1.0).with_action(builders::slide_action(
        "slide",
        30,
        30,
        2.0,
        [builders::chain_joint(0).as_str()],
    )))
    .unwrap());
    let rest = Arc::new(RestPose::build(Arc::clone(&skel)));
    let config = EvaluatorConfig {
        global_fps: 30,
        scratch_matrices: 2,
    };
    let ev = Arc::new(
        ActionEvaluator::with_config(Arc::clone(&skel), &ActionName::new("slide"), &config)
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rest = Arc::clone(&rest);
            let ev = Arc::clone(&ev);
            let config = config.clone();
            std::thread::spawn(move || {
                let mut pose = EvaluatedSkeleton::with_config(rest, &config);
                ev.evaluate(&mut pose, 0, 15 + i, 1.0);
                let tip = JointId(2);
                transform_point(pose.transform_absolute(tip), &Vector3::zeros())
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let tip = handle.join().unwrap();
        let expected = 2.0 + 2.0 * (15 + i) as f64 / 30.0;
        assert_relative_eq!(tip.x, expected, epsilon = 1e-12);
    }
}

#[test]
fn evaluate_leaves_untouched_joints_current() {
    let def = skeletons::definition("chain3").unwrap();
    let skel = Arc::new(compile(&def).unwrap());
    let rest = Arc::new(RestPose::build(Arc::clone(&skel)));
    let ev = ActionEvaluator::new(Arc::clone(&skel), &ActionName::new("slide"), 60).unwrap();
    let mut pose = EvaluatedSkeleton::new(rest);
    pose.refresh_all();

    let mid = skel.joint_by_name("mid").unwrap().id;
    let before = pose.joint(mid).generation();
    // frame 0 writes rest values everywhere, nothing changes
    ev.evaluate(&mut pose, 0, 0, 1.0);
    pose.refresh_all();
    assert_eq!(pose.joint(mid).generation(), before);

    ev.evaluate(&mut pose, 0, 5, 1.0);
    pose.refresh_all();
    assert_eq!(pose.joint(mid).generation(), before + 1);
}
