use crate::prelude::*;
use crate::home_assistant::Sensor;
use crate::omnik::payload::{ExtendedAttributes, TelemetryRecord};

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, QoS};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PUBLISH_ATTEMPTS: u32 = 3;
const PUBLISH_RETRY_SECS: u64 = 10;

/// Temperature published when a logger goes offline.
pub const ROOM_TEMPERATURE: f64 = 20.0;

// Message {{{
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Message {
    pub topic: String,
    pub retain: bool,
    pub payload: String,
}

#[derive(Serialize)]
struct RawMessage<'a> {
    rawmsg: &'a str,
}

impl Message {
    pub fn state_topic(logger_id: &str, sensor: Sensor) -> String {
        format!("{}/{}", logger_id, sensor.key())
    }

    pub fn availability_topic(logger_id: &str) -> String {
        format!("{}/availability", logger_id)
    }

    /// Logger id and the raw frame, published for every structurally valid frame.
    pub fn for_logger(logger_id: &str, raw: &[u8]) -> Result<Vec<Message>> {
        let topic = Self::state_topic(logger_id, Sensor::LoggerId);
        let rawmsg = Utils::hex(raw);

        Ok(vec![
            Message {
                topic: topic.clone(),
                retain: false,
                payload: logger_id.to_owned(),
            },
            Message {
                topic: format!("{}/attributes", topic),
                retain: false,
                payload: serde_json::to_string(&RawMessage { rawmsg: &rawmsg })?,
            },
        ])
    }

    pub fn for_record(record: &TelemetryRecord) -> Result<Vec<Message>> {
        let logger_id = record.logger_id.as_str();
        let readings = &record.readings;

        let mut r = vec![
            Message {
                topic: Self::state_topic(logger_id, Sensor::InverterId),
                retain: false,
                payload: readings.inverter_id.clone(),
            },
            Self::for_attributes(logger_id, &readings.attributes)?,
        ];

        for (sensor, value) in [
            (Sensor::Temperature, readings.temperature),
            (Sensor::Power, readings.power),
            (Sensor::EnergyToday, readings.energy_today),
            (Sensor::EnergyTotal, readings.energy_total),
            (Sensor::OperatingHours, readings.operating_hours),
        ] {
            r.push(Self::for_sensor(logger_id, sensor, value));
        }

        r.push(Message {
            topic: format!("{}/telemetry", logger_id),
            retain: false,
            payload: serde_json::to_string(record)?,
        });

        Ok(r)
    }

    fn for_attributes(logger_id: &str, attributes: &ExtendedAttributes) -> Result<Message> {
        Ok(Message {
            topic: format!("{}/attributes", Self::state_topic(logger_id, Sensor::InverterId)),
            retain: false,
            payload: serde_json::to_string(attributes)?,
        })
    }

    fn for_sensor(logger_id: &str, sensor: Sensor, value: f64) -> Message {
        Message {
            topic: Self::state_topic(logger_id, sensor),
            retain: false,
            payload: sensor.format(value),
        }
    }

    pub fn for_online(logger_id: &str) -> Message {
        Message {
            topic: Self::availability_topic(logger_id),
            retain: true,
            payload: "online".to_owned(),
        }
    }

    /// Resets temperature to room temperature, then marks the logger offline.
    pub fn for_offline(logger_id: &str) -> Vec<Message> {
        vec![
            Self::for_sensor(logger_id, Sensor::Temperature, ROOM_TEMPERATURE),
            Message {
                topic: Self::availability_topic(logger_id),
                retain: true,
                payload: "offline".to_owned(),
            },
        ]
    }
} // }}}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChannelData {
    /// Topic relative to the configured namespace.
    Message(Message),
    /// Topic used verbatim (Home Assistant discovery lives outside the namespace).
    Discovery(Message),
    Shutdown,
}

impl ChannelData {
    /// The broker topic and message to publish; `None` for control messages.
    pub fn routed(&self, namespace: &str) -> Option<(String, &Message)> {
        match self {
            ChannelData::Message(message) => Some((format!("{}/{}", namespace, message.topic), message)),
            ChannelData::Discovery(message) => Some((message.topic.clone(), message)),
            ChannelData::Shutdown => None,
        }
    }
}

#[derive(Clone)]
pub struct Mqtt {
    config: ConfigWrapper,
    channels: Channels,
    shared_stats: Arc<Mutex<FrameStats>>,
}

impl Mqtt {
    pub fn new(config: ConfigWrapper, channels: Channels, shared_stats: Arc<Mutex<FrameStats>>) -> Self {
        Self {
            config,
            channels,
            shared_stats,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let c = &self.config;

        if !c.mqtt().enabled() {
            info!("mqtt disabled, skipping");
            return Ok(());
        }

        let mut options = MqttOptions::new("omnik-bridge", c.mqtt().host(), c.mqtt().port());

        let will = LastWill {
            topic: self.lwt_topic(),
            message: bytes::Bytes::from("offline"),
            qos: QoS::AtLeastOnce,
            retain: true,
        };
        options.set_last_will(will);

        options.set_keep_alive(Duration::from_secs(60));
        if let (Some(u), Some(p)) = (c.mqtt().username(), c.mqtt().password()) {
            options.set_credentials(u, p);
        }

        info!("initializing mqtt at {}:{}", c.mqtt().host(), c.mqtt().port());

        let (client, eventloop) = AsyncClient::new(options, 10);

        futures::try_join!(
            self.setup(client.clone()),
            self.receiver(eventloop),
            self.sender(client)
        )?;

        Ok(())
    }

    pub fn stop(&self) {
        info!("Stopping MQTT client...");
        let _ = self.channels.to_mqtt.send(ChannelData::Shutdown);
    }

    async fn setup(&self, client: AsyncClient) -> Result<()> {
        client
            .publish(self.lwt_topic(), QoS::AtLeastOnce, true, "online")
            .await?;

        Ok(())
    }

    // drives the connection; nothing is subscribed so incoming publishes are unexpected
    async fn receiver(&self, mut eventloop: EventLoop) -> Result<()> {
        let mut shutdown_rx = self.channels.to_mqtt.subscribe();

        loop {
            tokio::select! {
                msg = shutdown_rx.recv() => {
                    match msg {
                        Ok(ChannelData::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                        _ => continue,
                    }
                }
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Incoming::Publish(publish))) => {
                            debug!("ignoring publish on {}", publish.topic);
                        }
                        Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                            info!("mqtt connected");
                        }
                        Err(e) => {
                            error!("{}", e);
                            info!("reconnecting in 5s");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                        _ => {} // keepalives etc
                    }
                }
            }
        }

        info!("MQTT receiver loop exiting");
        Ok(())
    }

    // coordinator -> mqtt
    async fn sender(&self, client: AsyncClient) -> Result<()> {
        let mut receiver = self.channels.to_mqtt.subscribe();

        let namespace = self.config.mqtt().namespace().to_owned();

        loop {
            let data = match receiver.recv().await {
                Ok(data) => data,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("MQTT sender lagged, {} messages dropped", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => ChannelData::Shutdown,
            };

            match data.routed(&namespace) {
                Some((topic, message)) => self.publish(&client, &topic, message).await,
                None => {
                    info!("MQTT sender received shutdown signal");
                    // the event loop may already be gone, so don't wait on the request queue
                    let _ = client.try_publish(self.lwt_topic(), QoS::AtLeastOnce, true, "offline");
                    let _ = client.try_disconnect();
                    break;
                }
            }
        }

        info!("MQTT sender loop exiting");
        Ok(())
    }

    async fn publish(&self, client: &AsyncClient, topic: &str, message: &Message) {
        debug!("publishing: {} = {}", topic, message.payload);

        for attempt in 1..=PUBLISH_ATTEMPTS {
            match client
                .publish(topic, QoS::AtLeastOnce, message.retain, message.payload.as_bytes())
                .await
            {
                Ok(_) => {
                    if let Ok(mut stats) = self.shared_stats.lock() {
                        stats.mqtt_messages_sent += 1;
                    }
                    return;
                }
                Err(err) => {
                    error!(
                        "MQTT publish failed: {:?} (attempt {}/{})",
                        err, attempt, PUBLISH_ATTEMPTS
                    );
                    if let Ok(mut stats) = self.shared_stats.lock() {
                        stats.mqtt_errors += 1;
                    }
                    if let Some(delay) = retry_delay(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!("giving up on {} after {} attempts", topic, PUBLISH_ATTEMPTS);
    }

    fn lwt_topic(&self) -> String {
        format!("{}/LWT", self.config.mqtt().namespace())
    }
}

// no wait after the last attempt
fn retry_delay(attempt: u32) -> Option<Duration> {
    (attempt < PUBLISH_ATTEMPTS).then(|| Duration::from_secs(PUBLISH_RETRY_SECS))
}
