use std::env;
use std::path::{Path, PathBuf};

/// `.env` candidates tried after the working directory, most specific first:
/// beside the config file named by `SALT_CONFIG_PATH`, then `$SALT_HOME`,
/// then `~/.salt-catalog`.
fn fallback_dotenv_paths(
    config_path: Option<PathBuf>,
    salt_home: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(dir) = config_path
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
    {
        out.push(dir.join(".env"));
    }
    if let Some(base) = salt_home {
        out.push(base.join(".env"));
    } else if let Some(home) = home_dir {
        out.push(home.join(".salt-catalog/.env"));
    }
    out
}

/// Load the first `.env` found and return its path.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let candidates = fallback_dotenv_paths(
        env::var_os("SALT_CONFIG_PATH")
            .map(PathBuf::from)
            .filter(|p| !p.as_os_str().is_empty()),
        env::var_os("SALT_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );
    candidates
        .into_iter()
        .find(|path| path.is_file() && dotenvy::from_path(path).is_ok())
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_paths;
    use std::path::PathBuf;

    #[test]
    fn config_dir_is_tried_before_salt_home() {
        let got = fallback_dotenv_paths(
            Some(PathBuf::from("/etc/salt/config.toml")),
            Some(PathBuf::from("/data/salt")),
            Some(PathBuf::from("/home/obs")),
        );
        assert_eq!(
            got,
            vec![
                PathBuf::from("/etc/salt/.env"),
                PathBuf::from("/data/salt/.env")
            ]
        );
    }

    #[test]
    fn bare_config_file_name_adds_no_candidate() {
        let got = fallback_dotenv_paths(Some(PathBuf::from("config.toml")), None, None);
        assert!(got.is_empty());
    }

    #[test]
    fn home_is_used_when_salt_home_unset() {
        let got = fallback_dotenv_paths(None, None, Some(PathBuf::from("/home/obs")));
        assert_eq!(got, vec![PathBuf::from("/home/obs/.salt-catalog/.env")]);
    }
}
