use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Channels {
    pub from_logger: broadcast::Sender<omnik::logger::ChannelData>,
    pub to_logger: broadcast::Sender<omnik::logger::ChannelData>,
    pub to_coordinator: broadcast::Sender<coordinator::ChannelData>,
    pub to_mqtt: broadcast::Sender<mqtt::ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            from_logger: Self::channel(),
            to_logger: Self::channel(),
            to_coordinator: Self::channel(),
            to_mqtt: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
