use std::path::{Path, PathBuf};

use crate::error::DownloadError;

/// Output container offered by the two download buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaFormat {
    /// Best MP4 video merged with M4A audio
    Mp4,
    /// Audio extracted and transcoded to MP3
    Mp3,
}

impl MediaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Mp3 => "mp3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "Video (MP4)",
            MediaFormat::Mp3 => "Audio (MP3)",
        }
    }

    /// Format-selection arguments passed to yt-dlp
    pub fn ytdlp_args(self) -> &'static [&'static str] {
        match self {
            MediaFormat::Mp4 => &["-f", "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"],
            MediaFormat::Mp3 => &["-x", "--audio-format", "mp3"],
        }
    }
}

/// One download submitted from the UI
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub url: String,
    pub folder: PathBuf,
    pub format: MediaFormat,
}

impl DownloadRequest {
    /// Builds a request, rejecting a blank URL
    pub fn new(url: &str, folder: impl Into<PathBuf>, format: MediaFormat) -> Result<Self, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::EmptyUrl);
        }
        Ok(Self {
            url: url.to_owned(),
            folder: folder.into(),
            format,
        })
    }

    /// yt-dlp naming template, `<folder>/%(title)s.%(ext)s`
    pub fn output_template(&self) -> String {
        template_in(&self.folder)
    }

    /// Full argument list: format selection, line-per-update progress,
    /// output template, then the URL
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.format.ytdlp_args().iter().map(|s| s.to_string()).collect();
        args.push("--newline".to_owned());
        args.push("-o".to_owned());
        args.push(self.output_template());
        args.push(self.url.clone());
        args
    }
}

fn template_in(folder: &Path) -> String {
    folder.join("%(title)s.%(ext)s").display().to_string()
}

/// Messages sent from a running download back to the UI
#[derive(Debug)]
pub enum DownloadEvent {
    /// Latest scraped percentage, 0 to 100
    Progress(u8),
    /// Final outcome; always the last event of a download
    Finished(Result<PathBuf, DownloadError>),
}
