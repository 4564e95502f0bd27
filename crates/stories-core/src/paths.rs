use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the storage root.
pub const DATA_DIR_ENV: &str = "STORIES_DATA_DIR";

/// Variables searched, in order, for the home directory.
const HOME_VARS: [&str; 2] = ["HOME", "USERPROFILE"];

/// Home directory that anchors the default storage root.
///
/// HOME wins over USERPROFILE (Windows). Empty values count as unset.
pub fn get_home_dir() -> Result<String, String> {
    HOME_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
        .ok_or_else(|| {
            "cannot locate stories storage: neither HOME nor USERPROFILE is set".to_string()
        })
}

/// Default storage root: `$STORIES_DATA_DIR`, else `~/.local/share/stories`.
pub fn default_storage_root() -> Result<PathBuf, String> {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = get_home_dir()?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("stories"))
}
