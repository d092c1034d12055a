use crate::prelude::*;

pub mod availability;

use availability::{Availability, Seen};
use crate::omnik::payload::{self, TelemetryRecord};
use crate::omnik::{frame, logger};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const AVAILABILITY_CHECK_SECS: u64 = 10;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChannelData {
    Shutdown,
}

#[derive(Default, Debug)]
pub struct FrameStats {
    pub frames_received: u64,
    pub frames_decoded: u64,
    pub frames_rejected: u64,
    pub rejections: HashMap<&'static str, u64>,
    pub loggers_refused: u64,
    pub logger_connections: u64,
    pub logger_disconnections: u64,
    pub mqtt_messages_sent: u64,
    pub mqtt_errors: u64,
    // logger id -> local time of its last decoded frame
    pub last_frames: HashMap<String, String>,
}

impl FrameStats {
    pub fn print_summary(&self) {
        info!("Frame Statistics:");
        info!("  Total frames received: {}", self.frames_received);
        info!("  Frames decoded: {}", self.frames_decoded);
        info!("  Frames rejected: {}", self.frames_rejected);
        let mut rejections: Vec<_> = self.rejections.iter().collect();
        rejections.sort();
        for (kind, count) in rejections {
            info!("    {}: {}", kind, count);
        }
        info!("  Frames from refused loggers: {}", self.loggers_refused);
        info!("  Logger connections: {}", self.logger_connections);
        info!("  Logger disconnections: {}", self.logger_disconnections);
        info!("  MQTT:");
        info!("    Messages sent: {}", self.mqtt_messages_sent);
        info!("    Errors: {}", self.mqtt_errors);
        for (logger_id, at) in &self.last_frames {
            info!("  Logger {} last decoded frame at {}", logger_id, at);
        }
    }

    fn reject(&mut self, reason: &RejectReason) {
        self.frames_rejected += 1;
        *self.rejections.entry(reason.kind()).or_default() += 1;
    }
}

#[derive(Clone)]
pub struct Coordinator {
    config: ConfigWrapper,
    channels: Channels,
    pub shared_stats: Arc<Mutex<FrameStats>>,
    availability: Arc<Mutex<Availability>>,
}

impl Coordinator {
    pub fn new(config: ConfigWrapper, channels: Channels) -> Self {
        let availability = Availability::new(config.availability_timeout(), config.max_loggers());

        Self {
            config,
            channels,
            shared_stats: Arc::new(Mutex::new(FrameStats::default())),
            availability: Arc::new(Mutex::new(availability)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut from_logger = self.channels.from_logger.subscribe();
        let mut shutdown_rx = self.channels.to_coordinator.subscribe();
        let mut ticker = tokio::time::interval(Duration::from_secs(AVAILABILITY_CHECK_SECS));

        loop {
            tokio::select! {
                msg = shutdown_rx.recv() => {
                    match msg {
                        Ok(ChannelData::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
                msg = from_logger.recv() => {
                    match msg {
                        Ok(logger::ChannelData::Frame(frame)) => {
                            match self.process_frame(&frame.bytes, Instant::now()) {
                                Ok(messages) => self.publish(messages),
                                Err(e) => warn!("frame from {} not published: {}", frame.peer, e),
                            }
                        }
                        Ok(logger::ChannelData::Connected(_)) => {
                            self.with_stats(|stats| stats.logger_connections += 1);
                        }
                        Ok(logger::ChannelData::Disconnected(_)) => {
                            self.with_stats(|stats| stats.logger_disconnections += 1);
                        }
                        Ok(logger::ChannelData::Shutdown) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("coordinator lagged, {} frames dropped", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = ticker.tick() => {
                    let messages = self.expire(Instant::now());
                    self.publish(messages);
                }
            }
        }

        info!("coordinator exiting");
        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.to_coordinator.send(ChannelData::Shutdown);
    }

    /// Runs one candidate buffer through validation and decoding and returns the
    /// messages to publish. Rejections are logged and counted, not returned as
    /// errors; an `Err` means a message could not be built.
    pub fn process_frame(&self, buffer: &[u8], now: Instant) -> Result<Vec<mqtt::ChannelData>> {
        self.with_stats(|stats| stats.frames_received += 1);

        let validated = match frame::validate_with(buffer, self.config.strict_frame_check()) {
            Ok(validated) => validated,
            Err(reason) => {
                self.rejected(&reason, buffer);
                return Ok(Vec::new());
            }
        };

        let logger_id = validated.logger_id().to_string();

        if !self.with_availability(|availability| availability.admits(&logger_id)) {
            warn!(
                "ignoring logger {}, already tracking {} loggers",
                logger_id,
                self.config.max_loggers()
            );
            self.with_stats(|stats| stats.loggers_refused += 1);
            return Ok(Vec::new());
        }

        // the logger id and raw frame go out even when the payload turns out to
        // be something other than inverter telemetry (acks, heartbeats)
        let mut r: Vec<mqtt::ChannelData> = mqtt::Message::for_logger(&logger_id, validated.raw())?
            .into_iter()
            .map(mqtt::ChannelData::Message)
            .collect();

        let readings = match payload::decode(validated.payload()) {
            Ok(readings) => readings,
            Err(reason) => {
                self.rejected(&reason, buffer);
                return Ok(r);
            }
        };

        let record = TelemetryRecord {
            logger_id: logger_id.clone(),
            readings,
        };

        let seen = self.with_availability(|availability| availability.seen(&logger_id, now));
        if seen == Seen::New && self.config.homeassistant_enabled() {
            info!("announcing logger {} to home assistant", logger_id);
            let ha = home_assistant::Config::new(&logger_id, &self.config.mqtt());
            r.extend(ha.all()?.into_iter().map(mqtt::ChannelData::Discovery));
        }

        r.extend(
            mqtt::Message::for_record(&record)?
                .into_iter()
                .map(mqtt::ChannelData::Message),
        );

        if seen != Seen::StillOnline {
            info!("logger {} is online", logger_id);
            r.push(mqtt::ChannelData::Message(mqtt::Message::for_online(&logger_id)));
        }

        self.with_stats(|stats| {
            stats.frames_decoded += 1;
            stats.last_frames.insert(
                logger_id.clone(),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
        });

        info!(
            "logger {}: inverter {} {}W {}°C",
            logger_id, record.readings.inverter_id, record.readings.power, record.readings.temperature
        );

        Ok(r)
    }

    /// Messages for every logger that has been silent past the availability timeout.
    pub fn expire(&self, now: Instant) -> Vec<mqtt::ChannelData> {
        self.with_availability(|availability| availability.expire(now))
            .into_iter()
            .flat_map(|logger_id| {
                info!("logger {} is offline", logger_id);
                mqtt::Message::for_offline(&logger_id)
            })
            .map(mqtt::ChannelData::Message)
            .collect()
    }

    fn publish(&self, messages: Vec<mqtt::ChannelData>) {
        if !self.config.mqtt().enabled() {
            return;
        }

        for message in messages {
            if self.channels.to_mqtt.send(message).is_err() {
                warn!("send(to_mqtt) failed - channel closed?");
                return;
            }
        }
    }

    fn rejected(&self, reason: &RejectReason, buffer: &[u8]) {
        use RejectReason::*;

        match reason {
            // stray bytes and non-telemetry frames are routine
            TooShortForHeader { .. } | PayloadTooShortForRecord { .. } => {
                debug!("ignoring frame: {}", reason)
            }
            _ => warn!("rejecting frame: {} - {}", reason, Utils::hex(buffer)),
        }

        self.with_stats(|stats| stats.reject(reason));
    }

    fn with_stats<T>(&self, f: impl FnOnce(&mut FrameStats) -> T) -> T {
        let mut stats = self.shared_stats.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut stats)
    }

    fn with_availability<T>(&self, f: impl FnOnce(&mut Availability) -> T) -> T {
        let mut availability = self.availability.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut availability)
    }
}
