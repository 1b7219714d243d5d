//! RecordingSleeper - records delays instead of waiting.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{ManualClock, Sleeper};

/// Returns immediately and remembers every requested delay. When built with a
/// `ManualClock`, each sleep advances that clock by the requested amount.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    clock: Option<ManualClock>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            clock: Some(clock),
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
        // keep select!-based callers from starving other tasks
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Clock;
    use chrono::TimeZone;

    #[tokio::test]
    async fn advances_the_attached_clock() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let sleeper = RecordingSleeper::with_clock(clock.clone());

        sleeper.sleep(Duration::from_millis(300)).await;
        sleeper.sleep(Duration::from_millis(200)).await;

        assert_eq!(sleeper.total(), Duration::from_millis(500));
        assert_eq!(clock.now(), start + chrono::Duration::milliseconds(500));
    }
}
