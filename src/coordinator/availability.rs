use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seen {
    /// First frame from this logger since startup.
    New,
    /// Logger was marked offline and is back.
    CameOnline,
    StillOnline,
}

#[derive(Clone, Copy, Debug)]
struct LoggerState {
    last_seen: Instant,
    online: bool,
}

/// Online/offline tracking per logger id, driven by decoded frames.
#[derive(Debug)]
pub struct Availability {
    timeout: Duration,
    max_loggers: usize,
    loggers: HashMap<String, LoggerState>,
}

impl Availability {
    pub fn new(timeout: Duration, max_loggers: usize) -> Self {
        Self {
            timeout,
            max_loggers,
            loggers: HashMap::new(),
        }
    }

    /// True for a logger already tracked, or a new one while there is room.
    pub fn admits(&self, logger_id: &str) -> bool {
        self.loggers.contains_key(logger_id) || self.loggers.len() < self.max_loggers
    }

    pub fn seen(&mut self, logger_id: &str, now: Instant) -> Seen {
        match self.loggers.get_mut(logger_id) {
            Some(state) => {
                state.last_seen = now;
                if state.online {
                    Seen::StillOnline
                } else {
                    state.online = true;
                    Seen::CameOnline
                }
            }
            None => {
                self.loggers.insert(
                    logger_id.to_owned(),
                    LoggerState {
                        last_seen: now,
                        online: true,
                    },
                );
                Seen::New
            }
        }
    }

    /// Marks every logger silent for longer than the timeout as offline and
    /// returns those that changed state, sorted.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.timeout;
        let mut expired: Vec<String> = self
            .loggers
            .iter_mut()
            .filter(|(_, state)| state.online && now.saturating_duration_since(state.last_seen) > timeout)
            .map(|(logger_id, state)| {
                state.online = false;
                logger_id.clone()
            })
            .collect();

        expired.sort();
        expired
    }

    pub fn is_online(&self, logger_id: &str) -> bool {
        self.loggers.get(logger_id).map(|s| s.online).unwrap_or(false)
    }
}
