use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/mindswitch`, or the platform's local data dir.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("mindswitch"),
            )
        } else {
            ProjectDirs::from("", "", "mindswitch").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("mindwander_log.csv"))
            .unwrap_or_else(|| PathBuf::from("mindwander_log.csv"))
    }

    pub fn noise_dir() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("noise"))
    }

    pub fn trace_dir() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("logs"))
    }
}
