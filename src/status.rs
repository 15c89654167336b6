use std::time::Duration;

use eframe::egui::Color32;

/// Delay between two drain steps
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(50);
/// Percentage removed per drain step
const DRAIN_STEP: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Downloading,
    Done,
    Failed,
    /// Bar is shrinking back to zero after a finished run
    Draining,
}

/// State behind the progress bar: value, caption and colour
#[derive(Clone, Debug)]
pub struct StatusBar {
    phase: Phase,
    value: f32,
    text: String,
    fill: Color32,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            value: 0.0,
            text: "Ready".to_owned(),
            fill: Color32::TRANSPARENT,
        }
    }
}

impl StatusBar {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Value in percent, 0 to 100
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fill(&self) -> Color32 {
        self.fill
    }

    /// Buttons stay disabled until the bar is back to idle
    pub fn busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn start(&mut self) {
        self.phase = Phase::Downloading;
        self.value = 0.0;
        self.text = "Preparing download...".to_owned();
        self.fill = Color32::GREEN;
    }

    pub fn progress(&mut self, pct: u8) {
        if self.phase != Phase::Downloading {
            return;
        }
        let pct = pct.min(100);
        self.value = f32::from(pct);
        self.text = if pct < 100 {
            format!("Downloading: {}%", pct)
        } else {
            "Converting format...".to_owned()
        };
    }

    pub fn succeed(&mut self) {
        self.phase = Phase::Done;
        self.value = 100.0;
        self.text = "Download complete!".to_owned();
        self.fill = Color32::BLUE;
    }

    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
        self.value = 0.0;
        self.text = "Download failed".to_owned();
        self.fill = Color32::RED;
    }

    /// One drain step. Returns true once the bar is idle again.
    pub fn tick(&mut self) -> bool {
        match self.phase {
            Phase::Idle => true,
            Phase::Downloading => false,
            Phase::Done | Phase::Failed | Phase::Draining => {
                self.phase = Phase::Draining;
                self.value -= DRAIN_STEP;
                if self.value <= 0.0 {
                    *self = Self::default();
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captions_follow_progress() {
        let mut bar = StatusBar::default();
        assert!(!bar.busy());
        bar.start();
        assert!(bar.busy());
        assert_eq!(bar.text(), "Preparing download...");
        bar.progress(42);
        assert_eq!(bar.text(), "Downloading: 42%");
        assert_eq!(bar.value(), 42.0);
        bar.progress(100);
        assert_eq!(bar.text(), "Converting format...");
    }

    #[test]
    fn progress_ignored_outside_download() {
        let mut bar = StatusBar::default();
        bar.progress(50);
        assert_eq!(bar.value(), 0.0);
        assert_eq!(bar.text(), "Ready");
    }

    #[test]
    fn success_drains_in_fifty_steps() {
        let mut bar = StatusBar::default();
        bar.start();
        bar.succeed();
        assert_eq!(bar.fill(), Color32::BLUE);
        let mut steps = 0;
        while !bar.tick() {
            steps += 1;
            assert!(bar.busy());
        }
        assert_eq!(steps, 49);
        assert_eq!(bar.phase(), Phase::Idle);
        assert_eq!(bar.fill(), Color32::TRANSPARENT);
        assert_eq!(bar.text(), "Ready");
    }

    #[test]
    fn failure_resets_on_first_tick() {
        let mut bar = StatusBar::default();
        bar.start();
        bar.progress(70);
        bar.fail();
        assert_eq!(bar.value(), 0.0);
        assert!(bar.busy());
        assert!(bar.tick());
        assert!(!bar.busy());
    }

    #[test]
    fn downloading_does_not_drain() {
        let mut bar = StatusBar::default();
        bar.start();
        assert!(!bar.tick());
        assert_eq!(bar.phase(), Phase::Downloading);
    }
}
