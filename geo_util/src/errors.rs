use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoUtilError>;

#[derive(Error, Debug)]
pub enum GeoUtilError {
    /// Bad resolution, degenerate extent or box, invalid chunk size, existing outputs
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Usually the chunk size does not fit the raster, use smaller chunks
    #[error("resource error: {0}")]
    Resource(String),

    // pass through for errors in gdal crate
    #[error("gdal error {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

impl GeoUtilError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        GeoUtilError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn not_found(path: &Path) -> Self {
        GeoUtilError::io(path, io::Error::new(io::ErrorKind::NotFound, "file does not exist"))
    }
}

#[macro_export]
macro_rules! config_err {
    ($($arg:tt)+) => {
        $crate::errors::GeoUtilError::Configuration(format!($($arg)+))
    };
}

#[macro_export]
macro_rules! resource_err {
    ($($arg:tt)+) => {
        $crate::errors::GeoUtilError::Resource(format!($($arg)+))
    };
}
