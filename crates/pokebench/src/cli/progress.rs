//! Terminal rendering of batch run events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pokebench_core::RunEvent;

/// Renders [`RunEvent`]s as a progress bar on stderr, or nothing when disabled.
pub struct RunProgress {
    bar: ProgressBar,
}

impl RunProgress {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb.set_message("starting...");
            pb
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn observe(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { total } => self.bar.set_length(total as u64),
            RunEvent::Classified {
                index,
                image_id,
                eta,
                ..
            } => {
                self.bar.set_position(index as u64);
                self.bar
                    .set_message(format!("{image_id} ✓ ETA {}", format_eta(eta)));
            }
            RunEvent::Failed {
                index,
                total,
                image_id,
                error,
            } => {
                self.bar.println(format!("[{index}/{total}] {image_id} ✗ {error}"));
                self.bar.abandon_with_message(format!("stopped at {image_id}"));
            }
        }
    }

    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// `mm:ss`, with hours folded into the minutes.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(Duration::ZERO), "00:00");
        assert_eq!(format_eta(Duration::from_millis(65_900)), "01:05");
        assert_eq!(format_eta(Duration::from_secs(3_725)), "62:05");
    }

    #[test]
    fn test_hidden_progress_accepts_events() {
        let progress = RunProgress::new(false);
        progress.observe(RunEvent::Started { total: 2 });
        progress.observe(RunEvent::Classified {
            index: 1,
            total: 2,
            image_id: "1.png",
            eta: Duration::from_secs(3),
        });
        progress.finish();
    }
}
