//! Tag state publishing for Home Assistant.
//!
//! Payloads follow the Home Assistant MQTT discovery conventions: a retained
//! discovery document on `<prefix>/config` describing a sensor, and a
//! retained JSON state on `<prefix>/state` whose `tag_id` is the sensor
//! value.

#![allow(async_fn_in_trait)]

use crate::config::ServiceConfig;
use crate::mqtt::MqttPublisher;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tagbridge_core::TagId;
use tokio::io::{AsyncWriteExt, Stdout};
use tracing::{debug, info};

/// Errors that can occur while publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Transport failed to deliver the message.
    #[error("Publish to '{topic}' failed: {message}")]
    Transport { topic: String, message: String },

    /// Transport could not be shut down cleanly.
    #[error("Closing transport failed: {message}")]
    Close { message: String },
}

/// Message sink for tag state.
///
/// Implementations deliver a payload to a topic, optionally retained.
pub trait StatePublisher {
    async fn publish(&mut self, topic: &str, payload: &str, retain: bool)
    -> Result<(), PublishError>;

    /// Flush and release the transport.
    async fn close(&mut self) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Transport chosen at startup.
pub enum Transport {
    Stdout(StdoutPublisher),
    Mqtt(MqttPublisher),
}

impl StatePublisher for Transport {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retain: bool,
    ) -> Result<(), PublishError> {
        match self {
            Self::Stdout(p) => p.publish(topic, payload, retain).await,
            Self::Mqtt(p) => p.publish(topic, payload, retain).await,
        }
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        match self {
            Self::Stdout(p) => p.close().await,
            Self::Mqtt(p) => p.close().await,
        }
    }
}

/// Publisher writing one line per message to stdout.
///
/// Lines have the form `<topic> <payload>`, with `(retained)` after the
/// topic for retained messages.
pub struct StdoutPublisher {
    out: Stdout,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePublisher for StdoutPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retain: bool,
    ) -> Result<(), PublishError> {
        let marker = if retain { " (retained)" } else { "" };
        let line = format!("{topic}{marker} {payload}\n");

        let transport = |e: std::io::Error| PublishError::Transport {
            topic: topic.to_string(),
            message: e.to_string(),
        };
        self.out.write_all(line.as_bytes()).await.map_err(transport)?;
        self.out.flush().await.map_err(transport)?;

        debug!(topic, retain, "Published message");
        Ok(())
    }
}

/// State payload published on every tag change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagState {
    pub tag_id: Option<TagId>,
    pub present: bool,
    /// Seconds since the Unix epoch
    #[serde(serialize_with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl TagState {
    pub fn new(tag_id: Option<TagId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            present: tag_id.is_some(),
            tag_id,
            timestamp,
        }
    }
}

fn epoch_seconds<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    let seconds = ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1e6;
    serializer.serialize_f64(seconds)
}

/// Home Assistant MQTT discovery document for the current-tag sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryConfig {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub value_template: String,
    pub json_attributes_topic: String,
    pub device: DeviceDescriptor,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub identifiers: Vec<String>,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
}

impl DiscoveryConfig {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            name: "NFC Reader Current Tag".to_string(),
            unique_id: "nfc_reader_current_tag".to_string(),
            state_topic: config.state_topic.clone(),
            value_template: "{{ value_json.tag_id }}".to_string(),
            json_attributes_topic: config.state_topic.clone(),
            device: DeviceDescriptor {
                identifiers: vec![config.client_id.clone()],
                name: "NFC Tag Reader".to_string(),
                model: format!("tagbridge {}", tagbridge_core::VERSION),
                manufacturer: "Custom".to_string(),
            },
            icon: "mdi:nfc-variant".to_string(),
        }
    }
}

/// Publishes discovery and tag state through a [`StatePublisher`].
pub struct TagPublisher<P> {
    publisher: P,
    discovery: DiscoveryConfig,
    config_topic: String,
    state_topic: String,
    current: Option<TagId>,
}

impl<P: StatePublisher> TagPublisher<P> {
    pub fn new(publisher: P, config: &ServiceConfig) -> Self {
        Self {
            publisher,
            discovery: DiscoveryConfig::new(config),
            config_topic: config.config_topic.clone(),
            state_topic: config.state_topic.clone(),
            current: None,
        }
    }

    /// Publish the discovery document followed by the current state.
    ///
    /// Called at startup and again whenever the broker connection is
    /// (re)established; the state is absent until a tag has been published.
    pub async fn announce(&mut self) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&self.discovery)?;
        self.publisher
            .publish(&self.config_topic, &payload, true)
            .await?;
        info!(topic = %self.config_topic, "Published Home Assistant discovery configuration");

        self.publish_state(self.current.clone()).await
    }

    /// Publish the state for `tag_id` (`None` = no tag present).
    pub async fn publish_state(&mut self, tag_id: Option<TagId>) -> Result<(), PublishError> {
        let state = TagState::new(tag_id, Utc::now());
        let payload = serde_json::to_string(&state)?;
        self.publisher
            .publish(&self.state_topic, &payload, true)
            .await?;

        match &state.tag_id {
            Some(id) => info!(tag_id = %id, "Published tag state: present"),
            None => info!("Published tag state: absent"),
        }
        self.current = state.tag_id;
        Ok(())
    }

    /// Last published tag identifier.
    pub fn current(&self) -> Option<&TagId> {
        self.current.as_ref()
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<(), PublishError> {
        self.publisher.close().await
    }

    #[cfg(test)]
    pub fn inner(&self) -> &P {
        &self.publisher
    }
}

/// Publisher that records messages in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    pub messages: Vec<(String, String, bool)>,
    pub closed: bool,
}

#[cfg(test)]
impl StatePublisher for MemoryPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retain: bool,
    ) -> Result<(), PublishError> {
        self.messages
            .push((topic.to_string(), payload.to_string(), retain));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceArgs;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn config() -> ServiceConfig {
        ServiceConfig::try_from(ServiceArgs::default()).unwrap()
    }

    #[test]
    fn test_tag_state_json() {
        let ts = Utc.timestamp_opt(1_700_000_000, 250_000_000).unwrap();

        let present = TagState::new(Some(TagId::new("abc").unwrap()), ts);
        assert_eq!(
            serde_json::to_value(&present).unwrap(),
            json!({"tag_id": "abc", "present": true, "timestamp": 1_700_000_000.25})
        );

        let absent = TagState::new(None, ts);
        assert_eq!(
            serde_json::to_value(&absent).unwrap(),
            json!({"tag_id": null, "present": false, "timestamp": 1_700_000_000.25})
        );
    }

    #[test]
    fn test_discovery_json() {
        let value = serde_json::to_value(DiscoveryConfig::new(&config())).unwrap();

        assert_eq!(value["name"], "NFC Reader Current Tag");
        assert_eq!(value["unique_id"], "nfc_reader_current_tag");
        assert_eq!(value["state_topic"], "homeassistant/sensor/nfc_reader/state");
        assert_eq!(value["json_attributes_topic"], value["state_topic"]);
        assert_eq!(value["value_template"], "{{ value_json.tag_id }}");
        assert_eq!(value["device"]["identifiers"], json!(["nfc_tag_reader"]));
        assert_eq!(value["device"]["manufacturer"], "Custom");
        assert_eq!(value["icon"], "mdi:nfc-variant");
    }

    #[tokio::test]
    async fn test_announce_publishes_discovery_then_absent() {
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());
        publisher.announce().await.unwrap();

        let messages = &publisher.inner().messages;
        assert_eq!(messages.len(), 2);

        let (topic, _, retain) = &messages[0];
        assert_eq!(topic, "homeassistant/sensor/nfc_reader/config");
        assert!(retain);

        let (topic, payload, retain) = &messages[1];
        assert_eq!(topic, "homeassistant/sensor/nfc_reader/state");
        assert!(retain);
        let state: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(state["tag_id"], Value::Null);
        assert_eq!(state["present"], false);
    }

    #[tokio::test]
    async fn test_publish_state_tracks_current_tag() {
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());

        publisher
            .publish_state(Some(TagId::new("front-door").unwrap()))
            .await
            .unwrap();
        assert_eq!(publisher.current().unwrap().as_str(), "front-door");

        let state: Value = serde_json::from_str(&publisher.inner().messages[0].1).unwrap();
        assert_eq!(state["tag_id"], "front-door");
        assert_eq!(state["present"], true);
        assert!(state["timestamp"].as_f64().unwrap() > 0.0);

        publisher.publish_state(None).await.unwrap();
        assert!(publisher.current().is_none());
    }

    #[tokio::test]
    async fn test_announce_republishes_current_tag() {
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());
        publisher
            .publish_state(Some(TagId::new("desk").unwrap()))
            .await
            .unwrap();

        // Broker reconnected while the tag is still in the field
        publisher.announce().await.unwrap();

        let messages = &publisher.inner().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].0, "homeassistant/sensor/nfc_reader/config");
        let state: Value = serde_json::from_str(&messages[2].1).unwrap();
        assert_eq!(state["tag_id"], "desk");
        assert_eq!(state["present"], true);
    }

    #[tokio::test]
    async fn test_close_reaches_transport() {
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());
        publisher.close().await.unwrap();
        assert!(publisher.inner().closed);
    }
}
