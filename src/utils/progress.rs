use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal progress for a multi-year aggregation, drawn on stderr
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// A bar with one step per year in the lookback window
    pub fn for_years(total_years: u64, silent: bool) -> Self {
        if silent {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new(total_years);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} years {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    /// Advance by one finished year
    pub fn year_finished(&self, year: i32, samples: usize) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
            pb.set_message(format!("({} done, {} samples)", year, samples));
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_has_no_bar() {
        let reporter = ProgressReporter::for_years(3, true);
        reporter.year_finished(2020, 4);
        reporter.finish_with_message("Done");
        assert!(reporter.progress_bar.is_none());
    }

    #[test]
    fn test_year_finished_advances_bar() {
        let reporter = ProgressReporter::for_years(3, false);
        reporter.year_finished(2020, 4);
        reporter.year_finished(2021, 0);

        let pb = reporter.progress_bar.as_ref().unwrap();
        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 2);
    }
}
