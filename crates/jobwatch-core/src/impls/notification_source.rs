//! ScriptedNotificationSource - replays receive batches.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Notification, ServiceError, Subscription};
use crate::ports::NotificationSource;

#[derive(Debug, Default)]
struct State {
    batches: VecDeque<Result<Vec<Notification>, ServiceError>>,
    seen: Vec<Subscription>,
}

/// Each receive call takes the next scripted batch; once the script is
/// exhausted every call returns an empty batch.
#[derive(Debug, Default)]
pub struct ScriptedNotificationSource {
    state: Mutex<State>,
}

impl ScriptedNotificationSource {
    pub fn new(batches: Vec<Result<Vec<Notification>, ServiceError>>) -> Self {
        Self {
            state: Mutex::new(State {
                batches: batches.into(),
                seen: Vec::new(),
            }),
        }
    }

    pub fn receive_calls(&self) -> usize {
        self.state().seen.len()
    }

    /// Subscription passed to every receive call, in order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.state().seen.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl NotificationSource for ScriptedNotificationSource {
    async fn receive(&self, subscription: &Subscription) -> Result<Vec<Notification>, ServiceError> {
        let mut state = self.state();
        state.seen.push(subscription.clone());
        state.batches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
