use crate::animation::BoneTransforms;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    transforms: Arc<BoneTransforms>,
}

/// Latest evaluated pose, handed from the thread that evaluates to the
/// thread that renders. The lock is only held to swap an `Arc`, so readers
/// never wait on an evaluation.
#[derive(Debug, Default)]
pub struct SharedPose {
    latest: Mutex<Published>,
}

impl SharedPose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current pose and returns its generation number
    pub fn publish(&self, transforms: BoneTransforms) -> u64 {
        let mut latest = self.latest.lock();
        latest.generation += 1;
        latest.transforms = Arc::new(transforms);
        latest.generation
    }

    /// Most recently published pose. Empty before the first publish.
    #[must_use]
    pub fn latest(&self) -> Arc<BoneTransforms> {
        self.latest.lock().transforms.clone()
    }

    /// Increments on every publish so a reader can skip an unchanged pose
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.latest.lock().generation
    }
}
