use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::SystemTime,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    runtime::Handle,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError},
        oneshot,
    },
};

use crate::{
    config::Launcher,
    error::DownloadError,
    model::{DownloadEvent, DownloadRequest},
    progress::Scraper,
};

/// Runs one download to completion and reports the outcome as the final event.
pub async fn spawn_download(
    launcher: Launcher,
    request: DownloadRequest,
    progress_tx: UnboundedSender<DownloadEvent>,
    cancel: oneshot::Receiver<()>,
) {
    info!("downloading {} as {}", request.url, request.format.extension());
    let result = run_download(&launcher, &request, &progress_tx, cancel).await;
    match &result {
        Ok(path) => info!("download finished: {}", path.display()),
        Err(DownloadError::Cancelled) => info!("download of {} cancelled", request.url),
        Err(e) => error!("download of {} failed: {}", request.url, e),
    }
    let _ = progress_tx.send(DownloadEvent::Finished(result));
}

/// Spawns yt-dlp, scrapes its merged stdout/stderr and resolves the produced file.
///
/// Resolving `cancel` (or dropping its sender) kills the child.
pub async fn run_download(
    launcher: &Launcher,
    request: &DownloadRequest,
    progress_tx: &UnboundedSender<DownloadEvent>,
    mut cancel: oneshot::Receiver<()>,
) -> Result<PathBuf, DownloadError> {
    let mut child = launcher
        .command()
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(DownloadError::Spawn)?;

    let (line_tx, mut lines) = mpsc::unbounded_channel();
    if let Some(out) = child.stdout.take() {
        tokio::spawn(forward_lines(out, line_tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        tokio::spawn(forward_lines(err, line_tx.clone()));
    }
    drop(line_tx);

    let mut scraper = Scraper::new();
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    debug!("yt-dlp> {}", line);
                    if let Some(pct) = scraper.feed(&line) {
                        let _ = progress_tx.send(DownloadEvent::Progress(pct));
                    }
                }
                None => break,
            },
            _ = &mut cancel => return Err(cancelled(&mut child).await),
        }
    }

    // Output streams are closed; the process may still be finalising.
    let status = tokio::select! {
        status = child.wait() => Some(status?),
        _ = &mut cancel => None,
    };
    let Some(status) = status else {
        return Err(cancelled(&mut child).await);
    };
    if !status.success() {
        return Err(DownloadError::ExitStatus(status.code()));
    }

    if let Some(dest) = scraper.destination() {
        debug!("scraped output path {}", dest.display());
    }
    let path = match scraper.into_destination() {
        Some(path) => path,
        None => {
            warn!("no destination in yt-dlp output, scanning {}", request.folder.display());
            newest_with_extension(&request.folder, request.format.extension())?
                .ok_or(DownloadError::NoOutput)?
        }
    };
    if !path.exists() {
        return Err(DownloadError::Missing(path));
    }
    Ok(path)
}

/// Forwards output lines, ending a line at `\n` or `\r` the way progress redraws do.
///
/// Invalid UTF-8 is replaced rather than rejected, and the stream is read to EOF
/// so yt-dlp never writes into a closed pipe.
async fn forward_lines<R>(mut reader: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("stopped reading yt-dlp output: {}", e);
                break;
            }
        };
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &tx);
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, &tx);
}

fn flush_line(pending: &mut Vec<u8>, tx: &UnboundedSender<String>) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    // Receiver gone means the download was cancelled; keep draining anyway.
    let _ = tx.send(line);
}

/// Kills the child after a cancel request. A failed kill is logged, not reported.
async fn cancelled(child: &mut Child) -> DownloadError {
    if let Err(e) = child.kill().await {
        warn!("could not kill yt-dlp: {}", e);
    }
    DownloadError::Cancelled
}

/// Most recently modified regular file in `dir` whose name ends in `.ext`
pub fn newest_with_extension(dir: &Path, ext: &str) -> std::io::Result<Option<PathBuf>> {
    let suffix = format!(".{}", ext);
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().ends_with(&suffix) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified()?;
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, entry.path()));
        }
    }
    Ok(newest.map(|(_, p)| p))
}

/// UI-side view of a running download.
///
/// Dropping the handle cancels the download.
pub struct DownloadHandle {
    events: UnboundedReceiver<DownloadEvent>,
    cancel: Option<oneshot::Sender<()>>,
    finished: bool,
}

impl DownloadHandle {
    pub fn start(runtime: &Handle, launcher: Launcher, request: DownloadRequest) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        runtime.spawn(spawn_download(launcher, request, tx, cancel_rx));
        Self {
            events,
            cancel: Some(cancel_tx),
            finished: false,
        }
    }

    /// Drains whatever arrived since the last call without blocking
    pub fn poll(&mut self) -> Vec<DownloadEvent> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(ev) => {
                    if matches!(ev, DownloadEvent::Finished(_)) {
                        self.finished = true;
                    }
                    out.push(ev);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.finished {
                        self.finished = true;
                        out.push(DownloadEvent::Finished(Err(DownloadError::Io(std::io::Error::other(
                            "download task ended unexpectedly",
                        )))));
                    }
                    break;
                }
            }
        }
        out
    }

    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
