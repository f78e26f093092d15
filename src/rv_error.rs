use std::{error, fmt};

/// Unified error type
///
/// Only asset construction can fail. Everything that happens once an asset
/// is loaded (evaluation, playback, scrubbing) recovers locally and logs a
/// warning instead of returning an error.
///
/// Some foreign error types are very large so are boxed.
#[derive(Debug)]
pub enum RvError {
    UnsupportedFormat,
    NoAssets,
    StdIoError(std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
    GltfError(Box<gltf::Error>),
    ImportError(crate::mesh_import::ImportError),
}

impl error::Error for RvError {}

impl fmt::Display for RvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "format is not supported"),
            Self::NoAssets => write!(f, "no assets were loaded"),
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::GltfError(e) => {
                write!(f, "gltf Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<serde_yaml::Error> for RvError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for RvError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<gltf::Error> for RvError {
    fn from(e: gltf::Error) -> Self {
        Self::GltfError(Box::new(e))
    }
}

impl From<crate::mesh_import::ImportError> for RvError {
    fn from(e: crate::mesh_import::ImportError) -> Self {
        Self::ImportError(e)
    }
}
