//! # Broker Channel
//!
//! MQTT publish adapter (`rumqttc`). The broker itself is an external
//! collaborator: messages are fire-and-forget, published at most once
//! per interval by the broker dispatch task, and a broker outage is a
//! logged [`DispatchError`], never a loop failure.
//!
//! The `rumqttc` event loop runs on its own tokio task so connection
//! management and reconnects never touch the dispatch loop.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::error::DispatchError;

/// Outstanding-request capacity for the rumqttc client
const REQUEST_CAP: usize = 10;

/// Handle used by the broker dispatch task to publish telemetry.
#[derive(Clone)]
pub struct MqttChannel {
    client: AsyncClient,
    topic: String,
}

impl MqttChannel {
    /// Connect to the broker and spawn its event loop task.
    ///
    /// Subscribes to the publish topic as well, so operator messages
    /// sent back over the feed show up in the logs.
    pub fn start(config: &BrokerConfig, client_id: &str) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(client_id.to_string(), config.host.clone(), config.port);
        options.set_keep_alive(std::time::Duration::from_secs(30));
        if !config.username.is_empty() {
            options.set_credentials(config.username.clone(), config.password.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAP);

        if let Err(e) = client.try_subscribe(config.topic.clone(), QoS::AtMostOnce) {
            warn!("MQTT subscribe failed: {}", e);
        }

        let driver = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connected");
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        // Inbound feed traffic is informational only
                        info!(
                            topic = %publish.topic,
                            payload = %String::from_utf8_lossy(&publish.payload),
                            "MQTT message received"
                        );
                    }
                    Ok(event) => debug!(?event, "MQTT event"),
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        });

        (
            Self {
                client,
                topic: config.topic.clone(),
            },
            driver,
        )
    }

    /// Publish one message without blocking the dispatch loop.
    pub fn try_publish(&self, message: &str) -> Result<(), DispatchError> {
        self.client
            .try_publish(self.topic.clone(), QoS::AtMostOnce, false, message)
            .map_err(|e| DispatchError::ChannelUnavailable(format!("MQTT: {}", e)))
    }

    /// Topic this channel publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;

    fn config() -> BrokerConfig {
        BrokerConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 1883,
            username: String::new(),
            password: String::new(),
            topic: "loratracker/feed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_channel_carries_configured_topic() {
        let (channel, driver) = MqttChannel::start(&config(), "BSE1");
        assert_eq!(channel.topic(), "loratracker/feed");
        driver.abort();
    }

    #[tokio::test]
    async fn test_try_publish_queues_without_broker() {
        // No broker is listening; try_publish only queues the request,
        // so the dispatch task never blocks or errors on a cold queue.
        let (channel, driver) = MqttChannel::start(&config(), "BSE1");
        let result = channel.try_publish("RMT1,true,-33.5,151.2,x,-87,,");
        assert!(result.is_ok());
        driver.abort();
    }
}
