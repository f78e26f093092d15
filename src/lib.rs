//! Skeletal animation core for a real-time rigged mesh viewer.
//!
//! Rigged meshes are imported from glTF into a [`model::SkinnedModel`]: a
//! skeleton, per vertex bone bindings and a list of immutable animation
//! clips. A [`viewer::Viewer`] advances playback every frame and evaluates
//! the selected clip into a palette of bone matrices or dual quaternions
//! ready to upload to a skin shader. Windowing, GUI and the draw calls
//! themselves live outside this crate.

pub mod animation;
pub mod dualquat;
pub mod frame_control;
pub mod mesh_import;
pub mod model;
pub mod rv_error;
pub mod settings;
pub mod shared_pose;
pub mod skeleton;
pub mod types;
pub mod vertex;
pub mod viewer;
