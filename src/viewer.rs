use crate::{
    animation::{
        AnimationClip, AnimationPlayer, BoneTransforms, PoseEvaluator, Sampling,
    },
    frame_control::{FrameTimer, TimeData},
    model::SkinnedModel,
    rv_error::RvError,
    settings::{SamplingMode, ViewerSettings},
    shared_pose::SharedPose,
};
use log::{error, info, warn};
use std::{path::Path, sync::Arc};

/// Application state shared by the render loop and the control panel. The
/// viewer owns every loaded asset and drives one of them at a time.
pub struct Viewer {
    assets: Vec<SkinnedModel>,
    selected: usize,
    player: AnimationPlayer,
    evaluator: PoseEvaluator,
    settings: ViewerSettings,
    timer: FrameTimer,
    shared: Arc<SharedPose>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

impl Viewer {
    #[must_use]
    pub fn new(settings: ViewerSettings) -> Self {
        let evaluator = PoseEvaluator::new(
            settings.animation.interpolation,
            settings.animation.skin_mode,
        );
        Self {
            assets: Vec::new(),
            selected: 0,
            player: AnimationPlayer::default(),
            evaluator,
            settings,
            timer: FrameTimer::new(),
            shared: Arc::new(SharedPose::new()),
        }
    }

    /// Adds a model and returns its index. The first asset added becomes
    /// the selected one.
    pub fn add_asset(&mut self, model: SkinnedModel) -> usize {
        let index = self.assets.len();
        info!("asset {} is {}", index, model.name());
        self.assets.push(model);
        if index == 0 {
            self.select_asset(0);
        }
        index
    }

    /// Loads every file in `paths`, skipping the ones that fail. Returns how
    /// many were loaded.
    ///
    /// # Errors
    /// `RvError::NoAssets` if nothing could be loaded
    pub fn load_assets<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<usize, RvError> {
        let mut loaded = 0;
        for path in paths {
            let path = path.as_ref();
            match SkinnedModel::load(path, &self.settings.import) {
                Ok(model) => {
                    self.add_asset(model);
                    loaded += 1;
                }
                Err(e) => error!("Failed to load {:?}: {}", path, e),
            }
        }
        if loaded == 0 {
            return Err(RvError::NoAssets);
        }
        Ok(loaded)
    }

    #[must_use]
    pub fn assets(&self) -> &[SkinnedModel] {
        &self.assets
    }

    #[must_use]
    pub fn selected_asset(&self) -> Option<&SkinnedModel> {
        self.assets.get(self.selected)
    }

    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// Switches to another asset and its first clip
    pub fn select_asset(&mut self, index: usize) {
        let index = if index < self.assets.len() {
            index
        } else {
            warn!(
                "no asset {} in {} assets, using 0",
                index,
                self.assets.len()
            );
            0
        };
        self.selected = index;
        self.retarget(0);
    }

    /// Switches the clip on the selected asset
    pub fn select_animation(&mut self, index: usize) {
        let count = self.selected_asset().map_or(0, SkinnedModel::animation_count);
        let index = if index < count {
            index
        } else {
            warn!("no animation {} in {} animations, using 0", index, count);
            0
        };
        self.retarget(index);
    }

    fn retarget(&mut self, clip: usize) {
        let duration = self
            .selected_asset()
            .and_then(|m| m.animation(clip))
            .map_or(0.0, AnimationClip::duration);
        self.player.retarget(self.selected, clip, duration);
    }

    /// Advances playback by `delta_time` seconds, evaluates the selected
    /// asset and publishes the result
    pub fn update(&mut self, delta_time: f64) -> Arc<BoneTransforms> {
        let animation = &self.settings.animation;
        self.player.advance(delta_time, animation.speed);
        self.evaluator.set_interpolation(animation.interpolation);
        self.evaluator.set_skin_mode(animation.skin_mode);
        let sampling = match animation.sampling {
            SamplingMode::Continuous => Sampling::Time(self.player.time()),
            SamplingMode::Discrete => Sampling::Frame(self.player.frame_index()),
        };

        if let Some(model) = self.assets.get(self.selected) {
            let clip = model.animation(self.player.clip());
            self.evaluator.evaluate(model.skeleton(), clip, sampling);
        } else {
            self.evaluator.clear();
        }
        self.shared.publish(self.evaluator.snapshot());
        self.shared.latest()
    }

    /// Measures the time since the last frame and updates with it
    pub fn frame(&mut self) -> Arc<BoneTransforms> {
        let TimeData { delta_time, .. } = self.timer.tick();
        self.update(delta_time)
    }

    pub fn toggle_play(&mut self) {
        self.player.toggle_play();
    }

    pub fn reset(&mut self) {
        self.player.reset();
    }

    /// Steps the frame cursor used by discrete sampling
    pub fn next_frame(&mut self) -> usize {
        let count = self.current_frame_count();
        self.player.next_frame(count)
    }

    pub fn previous_frame(&mut self) -> usize {
        let count = self.current_frame_count();
        self.player.previous_frame(count)
    }

    fn current_frame_count(&self) -> usize {
        self.animation_frame_num(self.player.clip())
    }

    #[must_use]
    pub fn has_animations(&self) -> bool {
        self.selected_asset().is_some_and(SkinnedModel::has_animations)
    }

    /// Frame count of a clip on the selected asset
    #[must_use]
    pub fn animation_frame_num(&self, index: usize) -> usize {
        self.selected_asset()
            .map_or(0, |m| m.animation_frame_num(index))
    }

    /// Clip on the selected asset
    #[must_use]
    pub fn animation(&self, index: usize) -> Option<&AnimationClip> {
        self.selected_asset().and_then(|m| m.animation(index))
    }

    #[must_use]
    pub const fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    #[must_use]
    pub const fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Changes take effect on the next update
    pub fn settings_mut(&mut self) -> &mut ViewerSettings {
        &mut self.settings
    }

    #[must_use]
    pub const fn time_data(&self) -> TimeData {
        self.timer.data()
    }

    /// Handle for a render thread
    #[must_use]
    pub fn shared_pose(&self) -> Arc<SharedPose> {
        self.shared.clone()
    }
}
