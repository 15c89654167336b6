//! Scraping of yt-dlp's human-readable output.
//!
//! yt-dlp has no stable progress format, so every rule here is best effort:
//! a line that matches nothing is simply ignored.

use std::path::PathBuf;

const DOWNLOAD_DEST: &str = "[download] Destination:";
const MERGER: &str = "[Merger] Merging formats into";
const EXTRACT_AUDIO_DEST: &str = "[ExtractAudio] Destination:";

/// What a single output line told us
#[derive(Debug, Default, PartialEq)]
pub struct LineEvent {
    pub destination: Option<PathBuf>,
    pub percent: Option<u8>,
}

pub fn parse_line(line: &str) -> LineEvent {
    LineEvent {
        destination: parse_destination(line),
        percent: parse_progress_from_line(line),
    }
}

fn parse_destination(line: &str) -> Option<PathBuf> {
    if line.contains(DOWNLOAD_DEST) || line.contains(EXTRACT_AUDIO_DEST) {
        let (_, rest) = line.split_once(':')?;
        let path = rest.trim();
        return (!path.is_empty()).then(|| PathBuf::from(path));
    }
    if line.contains(MERGER) {
        let start = line.find('"')?;
        let end = line.rfind('"')?;
        if end <= start + 1 {
            return None;
        }
        return Some(PathBuf::from(&line[start + 1..end]));
    }
    None
}

/// Reads the number directly in front of the first `%`, e.g. `[download]  45.2% of 3MiB`.
/// Fractions are truncated and the result clamped to 0..=100.
pub fn parse_progress_from_line(line: &str) -> Option<u8> {
    let idx = line.find('%')?;
    let head = &line[..idx];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    let value: f32 = head[start..].parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 100.0) as u8)
}

/// Folds the output stream of one yt-dlp run
#[derive(Debug, Default)]
pub struct Scraper {
    destination: Option<PathBuf>,
}

impl Scraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line; returns a percentage worth publishing
    pub fn feed(&mut self, line: &str) -> Option<u8> {
        let event = parse_line(line);
        if let Some(dest) = event.destination {
            debug!("output path now {}", dest.display());
            self.destination = Some(dest);
        }
        event.percent
    }

    /// Last file yt-dlp announced writing to
    pub fn destination(&self) -> Option<&PathBuf> {
        self.destination.as_ref()
    }

    pub fn into_destination(self) -> Option<PathBuf> {
        self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_progress_line() {
        let line = "[download]  45.2% of   10.00MiB at  500.00KiB/s ETA 00:10";
        assert_eq!(parse_progress_from_line(line), Some(45));
    }

    #[test]
    fn full_hundred_with_fraction() {
        assert_eq!(parse_progress_from_line("[download] 100.0% of 3.2MiB"), Some(100));
        assert_eq!(parse_progress_from_line("[download] 100% of 3.2MiB in 00:01"), Some(100));
    }

    #[test]
    fn single_digit_percent() {
        assert_eq!(parse_progress_from_line("[download]   5.0% of 1GiB"), Some(5));
    }

    #[test]
    fn percent_without_number_is_ignored() {
        assert_eq!(parse_progress_from_line("%(title)s.%(ext)s"), None);
        assert_eq!(parse_progress_from_line("progress: n/a%"), None);
        assert_eq!(parse_progress_from_line("no percent here"), None);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(parse_progress_from_line("weird 250%"), Some(100));
    }

    #[test]
    fn lone_dot_is_not_a_number() {
        assert_eq!(parse_progress_from_line("ratio .%"), None);
    }

    #[test]
    fn download_destination() {
        let ev = parse_line("[download] Destination: /home/me/Downloads/Clip.f137.mp4");
        assert_eq!(ev.destination, Some(PathBuf::from("/home/me/Downloads/Clip.f137.mp4")));
        assert_eq!(ev.percent, None);
    }

    #[test]
    fn merger_destination_between_quotes() {
        let ev = parse_line(r#"[Merger] Merging formats into "/tmp/My "quoted" title.mp4""#);
        assert_eq!(ev.destination, Some(PathBuf::from(r#"/tmp/My "quoted" title.mp4"#)));
    }

    #[test]
    fn merger_without_quotes_is_ignored() {
        assert_eq!(parse_line("[Merger] Merging formats into /tmp/x.mp4").destination, None);
    }

    #[test]
    fn extract_audio_destination() {
        let ev = parse_line("[ExtractAudio] Destination: /tmp/Song.mp3");
        assert_eq!(ev.destination, Some(PathBuf::from("/tmp/Song.mp3")));
    }

    #[test]
    fn scraper_keeps_latest_destination() {
        let transcript = [
            "[youtube] abc: Downloading webpage",
            "[download] Destination: /tmp/Clip.f137.mp4",
            "[download]  10.0% of 5.00MiB at 1.00MiB/s ETA 00:04",
            "[download] 100% of 5.00MiB in 00:05",
            "[download] Destination: /tmp/Clip.f140.m4a",
            "[download]  50.0% of 1.00MiB at 1.00MiB/s ETA 00:01",
            "[download] 100% of 1.00MiB in 00:01",
            "[Merger] Merging formats into \"/tmp/Clip.mp4\"",
            "Deleting original file /tmp/Clip.f137.mp4 (pass -k to keep)",
        ];
        let mut scraper = Scraper::new();
        let percents: Vec<u8> = transcript.iter().filter_map(|l| scraper.feed(l)).collect();
        assert_eq!(percents, vec![10, 100, 50, 100]);
        assert_eq!(scraper.destination(), Some(&PathBuf::from("/tmp/Clip.mp4")));
    }
}
