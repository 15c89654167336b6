use std::{env, ffi::OsString, path::PathBuf};

/// Overrides the yt-dlp command, e.g. `python3 -m yt_dlp`
pub const YTDLP_ENV: &str = "MEDIA_DOWNLOADER_YTDLP";
/// Overrides the initial download folder
pub const DIR_ENV: &str = "MEDIA_DOWNLOADER_DIR";

/// How to invoke yt-dlp: a program plus leading arguments
#[derive(Clone, Debug, PartialEq)]
pub struct Launcher {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Default for Launcher {
    fn default() -> Self {
        let bin = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };
        Self {
            program: bin.into(),
            args: Vec::new(),
        }
    }
}

impl Launcher {
    /// Splits a command line on whitespace. Returns `None` when blank.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(OsString::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub ytdlp: Launcher,
    pub download_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let settings = Self::from_vars(env::var(YTDLP_ENV).ok(), env::var_os(DIR_ENV));
        info!(
            "using yt-dlp command {:?} {:?}, saving to {}",
            settings.ytdlp.program,
            settings.ytdlp.args,
            settings.download_dir.display()
        );
        settings
    }

    /// Builds settings from the raw override values; blank overrides are ignored
    pub fn from_vars(ytdlp: Option<String>, dir: Option<OsString>) -> Self {
        let ytdlp = ytdlp.and_then(|v| Launcher::parse(&v)).unwrap_or_default();
        let download_dir = dir
            .filter(|v| !v.to_string_lossy().trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_download_dir);
        Self { ytdlp, download_dir }
    }
}

/// `~/Downloads` as the platform reports it, or `.` when there is no home
pub fn default_download_dir() -> PathBuf {
    download_dir_from(dirs::download_dir(), dirs::home_dir())
}

fn download_dir_from(downloads: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    downloads
        .or_else(|| home.map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
