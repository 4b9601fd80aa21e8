//! MQTT transport.
//!
//! [`connect`] splits a broker session in two: an [`MqttPublisher`] that
//! queues messages on the client, and an [`MqttConnection`] whose background
//! task drives the rumqttc event loop. The event loop reconnects on its own;
//! each accepted connection is reported on a channel so the caller can
//! publish discovery and state again.

use crate::config::BrokerConfig;
use crate::publish::{PublishError, StatePublisher};
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::time::Duration;
use tagbridge_core::constants::MQTT_KEEP_ALIVE_SECS;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Requests buffered on the client before publishing fails.
const REQUEST_CAPACITY: usize = 64;

/// How long to wait for the disconnect to go out on shutdown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Broker connection options for `client_id`.
pub fn mqtt_options(broker: &BrokerConfig, client_id: &str) -> MqttOptions {
    let mut options = MqttOptions::new(client_id, broker.host.clone(), broker.port);
    options.set_keep_alive(Duration::from_secs(MQTT_KEEP_ALIVE_SECS));
    if let Some(credentials) = &broker.credentials {
        options.set_credentials(credentials.username.clone(), credentials.password.clone());
    }
    options
}

/// Start a broker session.
///
/// Must be called inside a tokio runtime. Nothing is sent until the
/// background task has connected; messages published before that are
/// queued.
pub fn connect(
    broker: &BrokerConfig,
    client_id: &str,
    retry_delay: Duration,
) -> (MqttPublisher, MqttConnection) {
    let (client, eventloop) = AsyncClient::new(mqtt_options(broker, client_id), REQUEST_CAPACITY);
    let (connected_tx, connected_rx) = mpsc::channel(1);

    info!(host = %broker.host, port = broker.port, "Connecting to MQTT broker");
    let task = tokio::spawn(drive(eventloop, connected_tx, retry_delay));

    (
        MqttPublisher { client },
        MqttConnection {
            connected: connected_rx,
            task,
        },
    )
}

/// Poll the event loop until the client disconnects or is dropped.
async fn drive(mut eventloop: EventLoop, connected: mpsc::Sender<()>, retry_delay: Duration) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(session_present = ack.session_present, "Connected to MQTT broker");
                // A full channel already holds a pending notification
                let _ = connected.try_send(());
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("MQTT client disconnected");
                break;
            }
            Ok(event) => trace!(?event, "MQTT event"),
            Err(ConnectionError::RequestsDone) => {
                debug!("MQTT client dropped");
                break;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retry_in_ms = retry_delay.as_millis() as u64,
                    "MQTT connection error"
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

/// Publisher queuing messages on an MQTT client.
///
/// Messages go out with QoS 1. Publishing never waits for the broker: when
/// the request queue is full or the session has ended the message is
/// rejected with [`PublishError::Transport`].
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    #[cfg(test)]
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl StatePublisher for MqttPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        retain: bool,
    ) -> Result<(), PublishError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes().to_vec())
            .map_err(|e| PublishError::Transport {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;
        debug!(topic, retain, "Queued MQTT message");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        self.client
            .try_disconnect()
            .map_err(|e| PublishError::Close {
                message: e.to_string(),
            })
    }
}

/// Background side of a broker session.
pub struct MqttConnection {
    connected: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl MqttConnection {
    /// Notifications of accepted connections, one per ConnAck.
    pub fn connected(&mut self) -> &mut mpsc::Receiver<()> {
        &mut self.connected
    }

    /// Wait for the event loop to flush the disconnect, then stop it.
    pub async fn finish(mut self) {
        match tokio::time::timeout(CLOSE_TIMEOUT, &mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "MQTT task failed"),
            Err(_) => {
                warn!("MQTT disconnect timed out");
                self.task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn broker(credentials: Option<Credentials>) -> BrokerConfig {
        BrokerConfig {
            host: "mqtt.local".to_string(),
            port: 1884,
            credentials,
        }
    }

    #[test]
    fn test_mqtt_options() {
        let options = mqtt_options(&broker(None), "nfc_tag_reader");
        assert_eq!(options.broker_address(), ("mqtt.local".to_string(), 1884));
        assert_eq!(options.client_id(), "nfc_tag_reader");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_publish_is_queued_on_client() {
        let (client, _eventloop) = AsyncClient::new(mqtt_options(&broker(None), "t"), 2);
        let mut publisher = MqttPublisher::new(client);

        publisher.publish("nfc/state", "{}", true).await.unwrap();
        publisher.publish("nfc/state", "{}", true).await.unwrap();

        // Queue of two is now full
        let err = publisher.publish("nfc/state", "{}", true).await.unwrap_err();
        assert!(matches!(err, PublishError::Transport { ref topic, .. } if topic == "nfc/state"));
    }

    #[tokio::test]
    async fn test_publish_after_session_ended_fails() {
        let (client, eventloop) = AsyncClient::new(mqtt_options(&broker(None), "t"), 2);
        drop(eventloop);
        let mut publisher = MqttPublisher::new(client);

        assert!(publisher.publish("nfc/state", "{}", true).await.is_err());
        assert!(matches!(
            publisher.close().await,
            Err(PublishError::Close { .. })
        ));
    }
}
