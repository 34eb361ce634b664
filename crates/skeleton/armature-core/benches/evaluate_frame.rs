use std::sync::Arc;

use armature_core::{compile, ActionEvaluator, ActionName, EvaluatedSkeleton, RestPose};
use armature_test_fixtures::builders;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const WIDTH: usize = 8;
const DEPTH: usize = 16;

fn rig() -> (ActionEvaluator, EvaluatedSkeleton) {
    let def = builders::fan(WIDTH, DEPTH);
    let animated: Vec<String> = def.joints.keys().map(|n| n.to_string()).collect();
    let def = def.with_action(builders::slide_action(
        "sway",
        30,
        48,
        0.25,
        animated.iter().map(String::as_str),
    ));
    let skeleton = Arc::new(compile(&def).expect("bench rig should compile"));
    let rest = Arc::new(RestPose::build(Arc::clone(&skeleton)));
    let evaluator = ActionEvaluator::new(skeleton, &ActionName::new("sway"), 60)
        .expect("bench action should exist");
    (evaluator, EvaluatedSkeleton::new(rest))
}

fn compile_fan(c: &mut Criterion) {
    let def = black_box(builders::fan(WIDTH, DEPTH));
    c.bench_function("compile_fan", |b| b.iter(|| compile(&def)));
}

fn evaluate_frame(c: &mut Criterion) {
    let (evaluator, mut pose) = rig();
    let mut frame = 0i64;
    c.bench_function("evaluate_and_deform", |b| {
        b.iter(|| {
            frame += 1;
            evaluator.evaluate(&mut pose, 0, black_box(frame), 1.0);
            pose.deform_transforms().len()
        })
    });
}

criterion_group!(benches, compile_fan, evaluate_frame);
criterion_main!(benches);
