//! Spinners for calculations that take a noticeable moment.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(80);

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(TICK);
    pb
}

/// Await `fut` while a spinner with `message` runs; the spinner is cleared afterwards.
pub async fn with_spinner<T>(message: impl Into<String>, fut: impl Future<Output = T>) -> T {
    let pb = spinner(message);
    let out = fut.await;
    pb.finish_and_clear();
    out
}
