//! Profile directory resolution — ported from the teacher's `session::mod`
//! (`get_app_dir`, `get_profile_dir`, `list_profiles`, `create_profile`,
//! `delete_profile`, `set_default_profile`), generalized only in name
//! (`agent-of-empires` → `agent-deck`).

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PROFILE: &str = crate::DEFAULT_PROFILE;

/// Root config directory: `$XDG_CONFIG_HOME/agent-deck` on Linux,
/// `~/.agent-deck` everywhere else (matches the teacher's split).
pub fn get_app_dir() -> Result<PathBuf> {
    get_app_dir_path().map(|p| {
        let _ = fs::create_dir_all(&p);
        p
    })
}

fn get_app_dir_path() -> Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = dirs::config_dir() {
            return Ok(config_dir.join("agent-deck"));
        }
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".agent-deck"));
    }
    bail!("could not resolve a home directory")
}

/// The directory holding a given profile's state. The default profile
/// lives directly under the app dir; named profiles live in `profiles/<name>`.
pub fn get_profile_dir(profile: &str) -> Result<PathBuf> {
    let app_dir = get_app_dir()?;
    let dir = if profile.is_empty() || profile == DEFAULT_PROFILE {
        app_dir
    } else {
        app_dir.join("profiles").join(profile)
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn list_profiles() -> Result<Vec<String>> {
    let mut profiles = vec![DEFAULT_PROFILE.to_string()];
    let profiles_dir = get_app_dir()?.join("profiles");
    if profiles_dir.exists() {
        for entry in fs::read_dir(&profiles_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    profiles.push(name.to_string());
                }
            }
        }
    }
    Ok(profiles)
}

pub fn create_profile(name: &str) -> Result<()> {
    if name.is_empty() || name == DEFAULT_PROFILE {
        bail!("profile name '{name}' is reserved");
    }
    get_profile_dir(name)?;
    Ok(())
}

pub fn delete_profile(name: &str) -> Result<()> {
    if name == DEFAULT_PROFILE {
        bail!("cannot delete the default profile");
    }
    let dir = get_app_dir()?.join("profiles").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

pub fn set_default_profile(name: &str) -> Result<()> {
    let profiles = list_profiles()?;
    if !profiles.iter().any(|p| p == name) {
        bail!("unknown profile: {name}");
    }
    let mut config = crate::config::get_config();
    config.default_profile = name.to_string();
    crate::config::save_config(&config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn setup_temp_home() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::env::set_var("HOME", dir.path());
        std::env::set_var("XDG_CONFIG_HOME", dir.path().join(".config"));
        dir
    }

    #[test]
    #[serial]
    fn default_profile_dir_is_the_app_dir() {
        let _home = setup_temp_home();
        let app_dir = get_app_dir().unwrap();
        let profile_dir = get_profile_dir(DEFAULT_PROFILE).unwrap();
        assert_eq!(app_dir, profile_dir);
    }

    #[test]
    #[serial]
    fn named_profile_dir_nests_under_profiles() {
        let _home = setup_temp_home();
        let dir = get_profile_dir("work").unwrap();
        assert!(dir.ends_with("profiles/work"));
        assert!(dir.exists());
    }

    #[test]
    #[serial]
    fn create_then_list_then_delete_profile() {
        let _home = setup_temp_home();
        create_profile("staging").unwrap();
        assert!(list_profiles().unwrap().contains(&"staging".to_string()));
        delete_profile("staging").unwrap();
        assert!(!list_profiles().unwrap().contains(&"staging".to_string()));
    }

    #[test]
    #[serial]
    fn cannot_create_or_delete_the_default_profile() {
        let _home = setup_temp_home();
        assert!(create_profile(DEFAULT_PROFILE).is_err());
        assert!(delete_profile(DEFAULT_PROFILE).is_err());
    }
}
