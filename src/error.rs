use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("please enter a valid URL")]
    EmptyUrl,
    #[error("could not start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yt-dlp failed with exit code {}", .0.map_or_else(|| "unknown".to_owned(), |c| c.to_string()))]
    ExitStatus(Option<i32>),
    #[error("yt-dlp finished but no output file was found")]
    NoOutput,
    #[error("output file {0} does not exist")]
    Missing(PathBuf),
    #[error("download cancelled")]
    Cancelled,
}
