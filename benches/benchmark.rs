//! Recommend using with
//! `RUSTFLAGS="-C target-cpu=x86-64-v2" cargo bench`
//!
//! Pose evaluation runs once per frame for every visible model, so the
//! evaluator benchmarks are the ones that matter. The dual quaternion
//! conversions run once per bone inside it in dual quaternion skin mode.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra_glm as glm;
use rigview::{
    animation::{
        AnimationClip, BoneTrack, Interpolation, PoseEvaluator, Sampling,
        SkinMode, Sqt,
    },
    dualquat::{self, DualQuat, SkinDualQuat},
    skeleton::{BoneRegistry, SceneNode, Skeleton},
};

const BONES: usize = 64;
const KEYS: usize = 30;
const STEPS: usize = 100;
#[allow(clippy::cast_precision_loss)]
const STEP: f64 = 1.0 / (STEPS as f64);

fn use_this_arr() -> [[f32; 4]; 4] {
    // This should be a valid rotation and translation matrix
    {
        [
            [1.0f32, 0.0f32, 0.0f32, 0.0f32], // column 0
            [0.0f32, 0.3584f32, -0.9336f32, 0.0f32], // column 1
            [0.0f32, 0.9336f32, 0.3584f32, 0.0f32], // column 2
            [5.0f32, 7.0f32, 9.0f32, 1.0f32], // column 3
        ]
    }
}

/// A single chain of `BONES` bones, each one unit along y from its parent,
/// with a one second clip that bends every bone
#[allow(clippy::cast_precision_loss)]
fn use_this_rig() -> (Skeleton, AnimationClip) {
    let mut node = SceneNode::new(
        format!("bone{}", BONES - 1),
        glm::translation(&glm::vec3(0.0, 1.0, 0.0)),
    );
    for i in (0..BONES - 1).rev() {
        node = SceneNode {
            name: format!("bone{i}"),
            local_bind_transform: glm::translation(&glm::vec3(0.0, 1.0, 0.0)),
            children: vec![node],
        };
    }
    let mut bones = BoneRegistry::new();
    for i in 0..BONES {
        bones.register(
            &format!("bone{i}"),
            &glm::translation(&glm::vec3(0.0, -(i as f32) - 1.0, 0.0)),
        );
    }
    let skeleton = Skeleton::new(&node, bones);

    let tracks = (0..BONES)
        .map(|b| {
            let samples = (0..KEYS)
                .map(|k| {
                    let t = k as f64 / (KEYS - 1) as f64;
                    Sqt {
                        translation: glm::vec3(0.0, 1.0, 0.0),
                        rotation: glm::quat_angle_axis(
                            (t as f32) * 0.05 * (b as f32),
                            &glm::vec3(0.0, 0.0, 1.0),
                        ),
                        ..Sqt::identity(t)
                    }
                })
                .collect();
            BoneTrack::new(format!("bone{b}"), samples)
        })
        .collect();
    (skeleton, AnimationClip::new("bend", 1.0, 30.0, tracks))
}

fn dq_to_mat4(c: &mut Criterion) {
    let q = glm::quat(0.36516f32, 0.54772f32, 0.73030f32, 0.18257f32);
    let v = glm::vec3(-0.7, 5.1, -21.0);
    let dq = black_box(DualQuat::new(&q, &v));

    c.bench_function(
        "dq_to_mat4", //
        |b| b.iter(|| dualquat::to_mat4(&dq)),
    );
}

fn mat4_to_dq(c: &mut Criterion) {
    let m: glm::Mat4 = use_this_arr().into();
    let m = black_box(m);

    c.bench_function(
        "mat4_to_dq", //
        |b| b.iter(|| dualquat::from_mat4(&m)),
    );
}

fn skin_dual_quat(c: &mut Criterion) {
    let m: glm::Mat4 = use_this_arr().into();
    let m = black_box(m * glm::scaling(&glm::vec3(1.0, 2.0, 0.5)));
    let offset = black_box(glm::translation(&glm::vec3(0.0, -3.0, 0.0)));

    c.bench_function(
        "skin_dual_quat", //
        |b| b.iter(|| SkinDualQuat::from_parts(&m, &offset)),
    );
}

fn dlb_interpolate(c: &mut Criterion) {
    let m: glm::Mat4 = use_this_arr().into();
    let dq1 = black_box(dualquat::from_mat4(&m));
    let dq2 = black_box(DualQuat::new(
        &glm::quat_angle_axis(0.512_f32, &glm::vec3(0.0_f32, 1.0_f32, 0.0_f32)),
        &glm::vec3(1.2_f32, 0.0_f32, -4.0_f32),
    ));
    c.bench_function(
        "dlb interpolate", //
        |b| {
            b.iter(|| {
                for i in 0..=STEPS {
                    #[allow(clippy::cast_possible_truncation)]
                    let t = (i as f64 * STEP) as f32;
                    let _ = dualquat::dlb(&dq1, &dq2, t);
                }
            });
        },
    );
}

fn evaluate(c: &mut Criterion, name: &str, interpolation: Interpolation, skin_mode: SkinMode) {
    let (skeleton, clip) = use_this_rig();
    let mut evaluator = PoseEvaluator::new(interpolation, skin_mode);
    c.bench_function(name, |b| {
        b.iter(|| {
            for i in 0..STEPS {
                #[allow(clippy::cast_precision_loss)]
                let time = i as f64 * STEP;
                evaluator.evaluate(&skeleton, Some(&clip), Sampling::Time(time));
            }
            black_box(evaluator.bone_matrices().len())
        });
    });
}

fn evaluate_linear(c: &mut Criterion) {
    evaluate(c, "evaluate linear", Interpolation::Linear, SkinMode::Matrix);
}

fn evaluate_cubic(c: &mut Criterion) {
    evaluate(c, "evaluate cubic", Interpolation::Cubic, SkinMode::Matrix);
}

fn evaluate_dual_quat(c: &mut Criterion) {
    evaluate(c, "evaluate dual quat", Interpolation::Linear, SkinMode::DualQuat);
}

criterion_group!(
    benches,
    dq_to_mat4,
    mat4_to_dq,
    skin_dual_quat,
    dlb_interpolate,
    evaluate_linear,
    evaluate_cubic,
    evaluate_dual_quat
);
criterion_main!(benches);
