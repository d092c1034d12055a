pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};
pub use std::io::Write;
pub use tokio::sync::broadcast;

pub use crate::channels::Channels;
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::coordinator::{self, Coordinator, FrameStats};
pub use crate::error::RejectReason;
pub use crate::home_assistant;
pub use crate::mqtt::{self, Mqtt};
pub use crate::omnik::{self, logger::Listener};
pub use crate::options::Options;
pub use crate::utils::Utils;
