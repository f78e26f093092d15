mod evaluate;
mod interpolate;
mod player;
mod types;

// Re-exports
pub use {
    evaluate::{
        animate, local_transform, sample_track, BoneTransforms, Interpolation,
        PoseEvaluator, Sampling, SkinMode,
    },
    interpolate::{lerp_sqt, sample_cubic, sample_frame, sample_linear, slerp},
    player::{AnimationPlayer, PlayState},
    types::{AnimationClip, BoneTrack, Sqt},
};

pub(crate) use interpolate::weight;
