use std::time::{Duration, Instant};
use log::info;

pub fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    let hours = secs / 3600;
    secs %= 3600;
    let minutes = secs / 60;
    secs %= 60;

    let ms = d.as_millis() % 1000;

    format!("{}h {}m {}s {}ms", hours, minutes, secs, ms )
}

/// Logs how far a block loop got and the estimated time left
pub fn log_remaining_time(start: &Instant, num_processed: usize, num_total: usize, msg: &str) {
    let elapsed = start.elapsed();
    let time_per_step = if num_processed == 0 {
        elapsed
    } else {
        elapsed / num_processed as u32
    };
    let est_remaining_time = time_per_step * num_total.saturating_sub(num_processed) as u32;

    info!("{}: through {} of {}, elapsed {}, est. remaining {}",
             msg,
             num_processed, num_total,
             format_duration(elapsed),
             format_duration(est_remaining_time) );
}

/// Throttles progress output to once every few seconds
pub struct ProgressTicker {
    start: Instant,
    last_output: Instant,
    every_secs: u64,
}

impl ProgressTicker {
    pub fn new(every_secs: u64) -> Self {
        let now = Instant::now();
        ProgressTicker {
            start: now,
            last_output: now,
            every_secs,
        }
    }

    pub fn tick(&mut self, num_processed: usize, num_total: usize, msg: &str) {
        if self.last_output.elapsed().as_secs() >= self.every_secs {
            self.last_output = Instant::now();
            log_remaining_time(&self.start, num_processed, num_total, msg);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!("0h 0m 0s 250ms", format_duration(Duration::from_millis(250)));
        assert_eq!("1h 1m 5s 7ms", format_duration(Duration::from_millis(3_665_007)));
    }
}
