/// Bone influence slots per vertex. The skin shader reads exactly this many
/// ids and weights.
pub const MAX_INFLUENCES: usize = 4;

/// Size of the bone palette the skin shader declares. Models with more bones
/// still evaluate but the extra bones can't be uploaded in one draw.
pub const MAX_BONES: usize = 128;

/// Bone id written to unused influence slots
pub const NO_BONE: i32 = -1;
