//! Media Downloader: a small desktop front-end for yt-dlp

#[macro_use]
extern crate log;

// Environment-driven settings (yt-dlp command, download folder)
mod config;
// Notifications, window icon and file-manager integration
mod desktop;
// yt-dlp process supervision
mod downloader;
// Error type shared by the download path
mod error;
// Requests and events exchanged with the background task
mod model;
// Scraping of yt-dlp output lines
mod progress;
// Progress bar state machine
mod status;

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use config::Settings;
use desktop::Toast;
use downloader::DownloadHandle;
use eframe::{App, Frame, egui};
use egui::Visuals;
use error::DownloadError;
use model::{DownloadEvent, DownloadRequest, MediaFormat};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use status::{DRAIN_INTERVAL, StatusBar};
use tokio::runtime::Runtime;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: initializes logging and the runtime, then launches the GUI
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("media_downloader=info")).init();

    if let Err(e) = runtime() {
        error!("could not start the tokio runtime: {}", e);
        std::process::exit(1);
    }

    let settings = Settings::from_env();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Media Downloader")
            .with_inner_size([600.0, 220.0])
            .with_icon(desktop::app_icon()),
        ..Default::default()
    };
    eframe::run_native(
        "Media Downloader",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(Visuals::light());
            Box::new(MediaDownloaderApp::new(settings))
        }),
    )
}

/// Shared runtime for background downloads, created on first use
fn runtime() -> std::io::Result<&'static Arc<Runtime>> {
    RUNTIME.get_or_try_init(|| Runtime::new().map(Arc::new))
}

/// Application state for the GUI
struct MediaDownloaderApp {
    settings: Settings,
    /// Input field for the media URL
    url_input: String,
    /// Destination folder, only changed through the picker
    download_folder: String,
    bar: StatusBar,
    /// Running download, if any
    download: Option<DownloadHandle>,
    /// Format of the running or last download
    active_format: MediaFormat,
    /// When the next drain step of the bar is due
    next_drain: Option<Instant>,
    /// Message for the modal error dialog
    error: Option<String>,
    toast: Option<Toast>,
}

impl MediaDownloaderApp {
    fn new(settings: Settings) -> Self {
        let download_folder = settings.download_dir.display().to_string();
        Self {
            settings,
            url_input: String::new(),
            download_folder,
            bar: StatusBar::default(),
            download: None,
            active_format: MediaFormat::Mp4,
            next_drain: None,
            error: None,
            toast: None,
        }
    }

    fn browse(&mut self) {
        if let Some(folder) = FileDialog::new().set_directory(&self.download_folder).pick_folder() {
            self.download_folder = folder.display().to_string();
        }
    }

    fn start_download(&mut self, format: MediaFormat) {
        let request = match DownloadRequest::new(&self.url_input, &self.download_folder, format) {
            Ok(request) => request,
            Err(e) => {
                warn!("not starting download: {}", e);
                self.error = Some("Please enter a valid URL".to_owned());
                return;
            }
        };
        let rt = match runtime() {
            Ok(rt) => rt,
            Err(e) => {
                error!("could not start the tokio runtime: {}", e);
                self.error = Some(format!("Download failed: {}", e));
                return;
            }
        };

        self.bar.start();
        self.active_format = format;
        self.download = Some(DownloadHandle::start(rt.handle(), self.settings.ytdlp.clone(), request));
    }

    fn apply(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Progress(pct) => self.bar.progress(pct),
            DownloadEvent::Finished(result) => {
                match result {
                    Ok(path) => self.completed(path),
                    Err(DownloadError::Cancelled) => self.bar.fail(),
                    Err(e) => {
                        self.bar.fail();
                        self.error = Some(format!("Download failed: {}", e));
                    }
                }
                self.next_drain = Some(Instant::now() + DRAIN_INTERVAL);
            }
        }
    }

    fn completed(&mut self, path: PathBuf) {
        self.bar.succeed();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.toast = Some(Toast::new(
            "Download complete",
            format!("Media downloaded as {}: {}", self.active_format.extension(), name),
        ));
        if let Some(parent) = path.parent() {
            desktop::open_folder(parent);
        }
    }

    /// Steps the bar back to zero, one step per elapsed drain interval
    fn drain(&mut self, now: Instant) {
        let Some(mut next) = self.next_drain else {
            return;
        };
        while now >= next {
            if self.bar.tick() {
                self.next_drain = None;
                return;
            }
            next += DRAIN_INTERVAL;
        }
        self.next_drain = Some(next);
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for MediaDownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Poll the running download
        let events = self.download.as_mut().map(DownloadHandle::poll).unwrap_or_default();
        for event in events {
            self.apply(event);
        }
        if self.download.as_ref().is_some_and(DownloadHandle::is_finished) {
            self.download = None;
        }
        self.drain(Instant::now());
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }

        let busy = self.bar.busy();
        let mut clicked = None;
        let mut browse = false;
        let mut cancel = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Paste link:");
                ui.add_sized(
                    [ui.available_width(), 25.0],
                    egui::TextEdit::singleline(&mut self.url_input),
                );
            });
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label("Download path:");
                let width = (ui.available_width() - 38.0).max(0.0);
                ui.add_sized(
                    [width, 25.0],
                    egui::TextEdit::singleline(&mut self.download_folder).interactive(false),
                );
                browse = ui
                    .add_enabled(!busy, egui::Button::new("...").min_size(egui::vec2(30.0, 25.0)))
                    .clicked();
            });
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                for format in [MediaFormat::Mp4, MediaFormat::Mp3] {
                    if ui.add_enabled(!busy, egui::Button::new(format.label())).clicked() {
                        clicked = Some(format);
                    }
                }
                if self.download.is_some() && ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
            ui.add_space(10.0);

            ui.add(
                egui::ProgressBar::new(self.bar.value() / 100.0)
                    .text(self.bar.text().to_owned())
                    .fill(self.bar.fill()),
            );
        });

        if browse {
            self.browse();
        }
        if let Some(format) = clicked {
            self.start_download(format);
        }
        if cancel {
            if let Some(handle) = self.download.as_mut() {
                handle.cancel();
            }
        }

        if let Some(message) = self.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.error = None;
                    }
                });
        }

        if let Some(toast) = &self.toast {
            egui::Window::new(toast.title.clone())
                .id(egui::Id::new("completion_toast"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-10.0, -10.0))
                .show(ctx, |ui| {
                    ui.label(toast.message.clone());
                });
        }

        // Faster repaints while the bar drains
        let interval = if busy { DRAIN_INTERVAL } else { Duration::from_millis(100) };
        ctx.request_repaint_after(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Launcher;
    use crate::status::Phase;

    fn app() -> MediaDownloaderApp {
        MediaDownloaderApp::new(Settings {
            ytdlp: Launcher::default(),
            download_dir: PathBuf::from("/tmp"),
        })
    }

    #[test]
    fn runtime_is_created_once() {
        let first = runtime().unwrap();
        let second = runtime().unwrap();
        assert!(Arc::ptr_eq(first, second));
    }

    #[test]
    fn blank_url_opens_error_dialog() {
        let mut app = app();
        app.url_input = "   ".to_owned();
        app.start_download(MediaFormat::Mp3);
        assert_eq!(app.error.as_deref(), Some("Please enter a valid URL"));
        assert!(app.download.is_none());
        assert!(!app.bar.busy());
    }

    #[test]
    fn failure_reports_and_drains() {
        let mut app = app();
        app.bar.start();
        app.apply(DownloadEvent::Progress(30));
        app.apply(DownloadEvent::Finished(Err(DownloadError::ExitStatus(Some(1)))));
        assert_eq!(app.bar.phase(), Phase::Failed);
        assert_eq!(app.error.as_deref(), Some("Download failed: yt-dlp failed with exit code 1"));

        let due = app.next_drain.unwrap();
        app.drain(due);
        assert!(!app.bar.busy());
        assert!(app.next_drain.is_none());
    }

    #[test]
    fn cancellation_is_silent() {
        let mut app = app();
        app.bar.start();
        app.apply(DownloadEvent::Finished(Err(DownloadError::Cancelled)));
        assert!(app.error.is_none());
        assert_eq!(app.bar.phase(), Phase::Failed);
    }

    #[test]
    fn drain_catches_up_on_slow_frames() {
        let mut app = app();
        app.bar.start();
        app.bar.succeed();
        let start = Instant::now();
        app.next_drain = Some(start);
        app.drain(start + DRAIN_INTERVAL * 9);
        assert_eq!(app.bar.value(), 80.0);
        app.drain(start + Duration::from_secs(10));
        assert!(!app.bar.busy());
    }
}
