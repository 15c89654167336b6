use std::{
    path::Path,
    time::{Duration, Instant},
};

use eframe::egui::IconData;

/// How long a completion notice stays on screen
pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

/// Opens `folder` in the platform file manager without blocking the UI
pub fn open_folder(folder: &Path) {
    let folder = folder.to_path_buf();
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            warn!("could not open {}: {}", folder.display(), e);
        }
    });
}

/// Short-lived notice drawn inside the window
#[derive(Clone, Debug)]
pub struct Toast {
    pub title: String,
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_LIFETIME
    }

    pub fn expired(&self) -> bool {
        self.expired_at(Instant::now())
    }
}

/// 16x16 window icon: blue square with a white outline inset by two pixels
pub fn app_icon() -> IconData {
    const SIZE: u32 = 16;
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    let (lo, hi) = (2, SIZE - 2);
    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let on_edge = ((x == lo || x == hi) && (lo..=hi).contains(&y))
                || ((y == lo || y == hi) && (lo..=hi).contains(&x));
            rgba.extend_from_slice(if on_edge { &WHITE } else { &BLUE });
        }
    }
    IconData {
        rgba,
        width: SIZE,
        height: SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_expires_after_lifetime() {
        let toast = Toast::new("Download complete", "x.mp4");
        assert!(!toast.expired_at(toast.shown_at + Duration::from_secs(4)));
        assert!(toast.expired_at(toast.shown_at + TOAST_LIFETIME));
    }

    #[test]
    fn icon_outline() {
        let icon = app_icon();
        assert_eq!(icon.rgba.len(), 16 * 16 * 4);
        let px = |x: usize, y: usize| &icon.rgba[(y * 16 + x) * 4..(y * 16 + x) * 4 + 4];
        assert_eq!(px(0, 0), &[0, 0, 255, 255]);
        assert_eq!(px(2, 2), &[255, 255, 255, 255]);
        assert_eq!(px(14, 8), &[255, 255, 255, 255]);
        assert_eq!(px(8, 8), &[0, 0, 255, 255]);
        assert_eq!(px(15, 15), &[0, 0, 255, 255]);
    }
}
