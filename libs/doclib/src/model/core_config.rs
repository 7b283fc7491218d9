use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_API_LOCATION;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Base url of the document service, without a trailing slash.
    pub api_url: String,
    /// Where should doclib store data, including logs and downloaded archives?
    pub writeable_path: String,
    /// Should doclib refresh listings from a background observer?
    pub background_work: bool,

    /// Should we log at all?
    pub logs: bool,
    /// Should logs be printed to stdout?
    pub stdout_logs: bool,
    /// Should logs be colored?
    pub colored_logs: bool,

    /// How long a drag gesture may go without a terminal event before it is force-cleared.
    pub drag_timeout: Duration,
    /// How long an operation progress record stays visible.
    pub progress_timeout: Duration,
}

impl Config {
    /// Configures doclib for CLI use with no stdout logs and no background work.
    /// `writeable_path_subfolder` is generally a hardcoded client name like `"cli"`.
    pub fn cli_config(writeable_path_subfolder: &str) -> Config {
        Config {
            api_url: Self::api_url(),
            writeable_path: Self::writeable_path(writeable_path_subfolder),
            background_work: false,
            logs: true,
            stdout_logs: false,
            colored_logs: true,
            drag_timeout: DRAG_TIMEOUT,
            progress_timeout: PROGRESS_TIMEOUT,
        }
    }

    /// Configures doclib for UI use with stdout logs and the background listing observer.
    pub fn ui_config(writeable_path_subfolder: &str) -> Config {
        Config {
            api_url: Self::api_url(),
            writeable_path: Self::writeable_path(writeable_path_subfolder),
            background_work: true,
            logs: true,
            stdout_logs: true,
            colored_logs: true,
            drag_timeout: DRAG_TIMEOUT,
            progress_timeout: PROGRESS_TIMEOUT,
        }
    }

    /// Produces a full writable path based on environment variables and platform.
    pub fn writeable_path(writeable_path_subfolder: &str) -> String {
        let specified_path = env::var("DOCLIB_PATH");

        let default_path = env::var("HOME") // unix
            .or(env::var("HOMEPATH")) // windows
            .map(|home| format!("{home}/.doclib/{writeable_path_subfolder}"));

        specified_path
            .or(default_path)
            .unwrap_or_else(|_| format!("{}/doclib/{writeable_path_subfolder}", env::temp_dir().display()))
    }

    pub fn api_url() -> String {
        env::var("DOCLIB_API_URL").unwrap_or_else(|_| DEFAULT_API_LOCATION.to_string())
    }

    pub fn downloads_dir(&self) -> PathBuf {
        PathBuf::from(&self.writeable_path).join("downloads")
    }
}

pub const DRAG_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROGRESS_TIMEOUT: Duration = Duration::from_secs(5);
