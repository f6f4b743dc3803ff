//! Parameter file loading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::{fs::read_to_string, path::Path};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (TRAJ_CTRL_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `$TRAJ_CTRL_SW_ROOT/params` directory.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from_path<P, T>(path: T) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    T: AsRef<Path>,
{
    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    struct Dummy {
        period_s: f64,
        name: String,
    }

    #[test]
    fn test_from_str() {
        let d: Dummy = from_str("period_s = 0.2\nname = \"ctrl\"").unwrap();
        assert_eq!(d.period_s, 0.2);
        assert_eq!(d.name, "ctrl");

        match from_str::<Dummy>("period_s = \"oops\"") {
            Err(LoadError::DeserialiseError(_)) => (),
            r => panic!("Expected a deserialise error, got {:?}", r),
        }
    }

    #[test]
    fn test_load_missing_file() {
        match load_from_path::<Dummy, _>("/this/path/does/not/exist.toml") {
            Err(LoadError::FileLoadError(_)) => (),
            r => panic!("Expected a file load error, got {:?}", r),
        }
    }
}
