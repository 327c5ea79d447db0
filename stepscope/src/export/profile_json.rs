//! Profile files on disk.
//!
//! A profile is stored as pretty-printed JSON of [`Profile`]. Files written
//! by older tooling without `async`, `type`, `slow` or `hot` still load; the
//! missing fields take their defaults.

use crate::domain::{Profile, ProfileError};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Write `profile` to `path` as pretty JSON.
///
/// # Errors
/// Returns [`ProfileError::ProfileWriteFailed`] if the file cannot be
/// created or written.
pub fn write_profile(profile: &Profile, path: &Path) -> Result<(), ProfileError> {
    let write_failed = |source| ProfileError::ProfileWriteFailed { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(write_failed)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, profile)
        .map_err(|e| write_failed(std::io::Error::from(e)))?;
    writer.flush().map_err(write_failed)?;
    Ok(())
}

/// Load a profile file.
///
/// # Errors
/// Returns [`ProfileError::Io`] if the file cannot be opened and
/// [`ProfileError::BaselineParseFailed`] if it is not a valid profile.
pub fn read_profile(path: &Path) -> Result<Profile, ProfileError> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| ProfileError::BaselineParseFailed { path: path.to_path_buf(), source })
}

/// Load a baseline profile, treating a missing file as "no baseline".
///
/// # Errors
/// Any failure other than the file not existing.
pub fn read_baseline(path: &Path) -> Result<Option<Profile>, ProfileError> {
    match read_profile(path) {
        Ok(profile) => Ok(Some(profile)),
        Err(ProfileError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
