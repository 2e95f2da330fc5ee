use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
];
const PROGRESS_TEMPLATE: &str =
    "{spinner:.blue} {msg} [{bar:30.green/bright_black}] {pos}/{len} probes ({eta})";

/// The process-wide scan progress bar. Hidden until a scan starts drawing.
static PROGRESS: OnceLock<ProgressBar> = OnceLock::new();

fn progress_bar() -> &'static ProgressBar {
    PROGRESS.get_or_init(|| ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()))
}

fn is_drawing(pb: &ProgressBar) -> bool {
    !pb.is_hidden() && !pb.is_finished()
}

/// Shows the progress bar for a scan of `total` probes. Nothing is drawn when quiet.
pub fn start_scan_progress(total: u64, quiet: u8) {
    if quiet > 1 {
        return;
    }
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICK_STRINGS)
        .progress_chars("━╸ ");

    let pb = progress_bar();
    pb.set_style(style);
    pb.set_length(total);
    pb.set_position(0);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("{}", "Scanning".bold()));
}

pub fn report_scan_progress(port: u16) {
    let pb = progress_bar();
    pb.inc(1);
    if pb.position() % 64 == 0 {
        pb.set_message(format!("{} {}", "Scanning".bold(), port.to_string().cyan()));
    }
}

pub fn finish_scan_progress() {
    progress_bar().finish_and_clear();
}

/// Routes log lines above the progress bar so they do not tear it.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pb = progress_bar();
        if is_drawing(pb) {
            pb.println(String::from_utf8_lossy(buf).trim_end());
            Ok(buf.len())
        } else {
            io::stderr().write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
