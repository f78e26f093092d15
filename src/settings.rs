use crate::{
    animation::{Interpolation, SkinMode},
    mesh_import::ImportOptions,
    rv_error::RvError,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Whether the pose follows playback time or the frame cursor
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum SamplingMode {
    #[default]
    Continuous,
    Discrete,
}

/// Values the control panel edits. The core only stores them for the
/// renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub light_position: [f32; 3],
    pub light_colour: [f32; 3],
    pub base_colour: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub wireframe: bool,
    pub show_bones: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            light_position: [0.0, 5.0, 5.0],
            light_colour: [1.0, 1.0, 1.0],
            base_colour: [0.8, 0.8, 0.8],
            metallic: 0.0,
            roughness: 0.5,
            wireframe: false,
            show_bones: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub sampling: SamplingMode,
    pub interpolation: Interpolation,
    pub skin_mode: SkinMode,
    /// Playback speed multiplier
    pub speed: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            sampling: SamplingMode::default(),
            interpolation: Interpolation::default(),
            skin_mode: SkinMode::default(),
            speed: 1.0,
        }
    }
}

/// Everything configurable about the viewer. Missing fields in a settings
/// file take their default values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub scene: SceneSettings,
    pub animation: AnimationSettings,
    pub import: ImportOptions,
}

impl ViewerSettings {
    /// # Errors
    /// May return `RvError`
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RvError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// # Errors
    /// May return `RvError`
    pub fn from_file(path: &Path) -> Result<Self, RvError> {
        let file = fs::File::open(path)?;
        let settings = serde_yaml::from_reader(file)?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// # Errors
    /// May return `RvError`
    pub fn to_yaml(&self) -> Result<String, RvError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
