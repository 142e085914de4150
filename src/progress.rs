// Progress bar management using indicatif.
// We keep all bars under one MultiProgress so they render on separate lines.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProgressManager {
    multi: Option<Arc<MultiProgress>>,
}

impl ProgressManager {
    // Create a new manager. If enabled=false, no bars are created.
    pub fn new(enabled: bool) -> Self {
        let multi = if enabled {
            Some(Arc::new(MultiProgress::new()))
        } else {
            None
        };
        Self { multi }
    }

    // Bar for reading a file, sized in bytes.
    pub fn new_file_bar(&self, path: &Path, label: &str) -> Option<ProgressBar> {
        let mp = self.multi.as_ref()?;
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let bar = mp.add(ProgressBar::new(size));
        bar.set_style(file_style());
        bar.set_prefix(label.to_string());
        Some(bar)
    }

    // Bar counting bulk-insert batches for one table.
    pub fn new_batch_bar(&self, total: u64, label: &str) -> Option<ProgressBar> {
        let mp = self.multi.as_ref()?;
        let bar = mp.add(ProgressBar::new(total));
        bar.set_style(batch_style());
        bar.set_prefix(label.to_string());
        Some(bar)
    }
}

fn file_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:20} {bytes:>10}/{total_bytes:<10} [{bar:50}] {percent:>3}%",
    )
    .expect("valid progress template")
    .progress_chars("█ ")
}

fn batch_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:20} {pos:>5}/{len:<5} [{bar:50}] {percent:>3}% {msg}")
        .expect("valid progress template")
        .progress_chars("█ ")
}

#[cfg(test)]
mod tests {
    use super::ProgressManager;
    use std::path::Path;

    #[test]
    fn test_disabled_manager_makes_no_bars() {
        let progress = ProgressManager::new(false);
        assert!(progress.new_batch_bar(3, "Events").is_none());
        assert!(progress.new_file_bar(Path::new("dump.sql"), "Reading").is_none());
    }
}
