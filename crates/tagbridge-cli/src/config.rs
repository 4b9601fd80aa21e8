//! Service configuration.
//!
//! Options come from the command line with environment variable fallbacks,
//! so the binary can be configured the same way inside a container.

use clap::Args;
use std::fmt;
use std::time::Duration;
use tagbridge_core::constants::{
    DEFAULT_CLIENT_ID, DEFAULT_MQTT_PORT, DEFAULT_PRESENCE_POLL_MS, DEFAULT_RECONNECT_DELAY_MS,
    DEFAULT_TOPIC_PREFIX,
};
use tagbridge_core::{Error, Result};

/// Options shared by the commands that publish tag state.
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// MQTT broker host; without one, messages are written to stdout
    #[arg(long, env = "MQTT_BROKER")]
    pub mqtt_broker: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    pub mqtt_port: u16,

    /// MQTT username, used together with the password
    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    /// MQTT password
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    /// Topic prefix; discovery goes to `<prefix>/config`, state to `<prefix>/state`
    #[arg(long, env = "MQTT_TOPIC_PREFIX", default_value = DEFAULT_TOPIC_PREFIX)]
    pub topic_prefix: String,

    /// Client identifier, also used as the Home Assistant device identifier
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,

    /// Use the first reader whose name contains this text
    #[arg(long, env = "TAGBRIDGE_READER")]
    pub reader: Option<String>,

    /// Card presence poll interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_PRESENCE_POLL_MS)]
    pub poll_ms: u64,

    /// Delay before reconnecting to a failed reader or broker in milliseconds
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY_MS)]
    pub reconnect_ms: u64,
}

impl Default for ServiceArgs {
    fn default() -> Self {
        Self {
            mqtt_broker: None,
            mqtt_port: DEFAULT_MQTT_PORT,
            mqtt_username: None,
            mqtt_password: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            reader: None,
            poll_ms: DEFAULT_PRESENCE_POLL_MS,
            reconnect_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

/// Validated service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub client_id: String,
    pub reader: Option<String>,
    pub broker: Option<BrokerConfig>,
    pub config_topic: String,
    pub state_topic: String,
    pub monitor: MonitorSettings,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

/// Broker login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Timing of the presence monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_PRESENCE_POLL_MS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

impl TryFrom<ServiceArgs> for ServiceConfig {
    type Error = Error;

    fn try_from(args: ServiceArgs) -> Result<Self> {
        let prefix = args.topic_prefix.trim().trim_end_matches('/');
        if prefix.is_empty() {
            return Err(Error::Config("topic prefix cannot be empty".to_string()));
        }
        if prefix.contains(['#', '+']) {
            return Err(Error::Config(format!(
                "topic prefix must not contain wildcards: '{prefix}'"
            )));
        }

        let client_id = args.client_id.trim();
        if client_id.is_empty() {
            return Err(Error::Config("client id cannot be empty".to_string()));
        }

        if args.poll_ms == 0 {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }

        let broker = broker_config(
            args.mqtt_broker,
            args.mqtt_port,
            args.mqtt_username,
            args.mqtt_password,
        )?;

        Ok(Self {
            client_id: client_id.to_string(),
            reader: args.reader.filter(|r| !r.trim().is_empty()),
            broker,
            config_topic: format!("{prefix}/config"),
            state_topic: format!("{prefix}/state"),
            monitor: MonitorSettings {
                poll_interval: Duration::from_millis(args.poll_ms),
                reconnect_delay: Duration::from_millis(args.reconnect_ms),
            },
        })
    }
}

fn broker_config(
    host: Option<String>,
    port: u16,
    username: Option<String>,
    password: Option<String>,
) -> Result<Option<BrokerConfig>> {
    let Some(host) = host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    if port == 0 {
        return Err(Error::Config("MQTT port must be positive".to_string()));
    }

    let username = username.filter(|u| !u.is_empty());
    let password = password.filter(|p| !p.is_empty());
    let credentials = match (username, password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        (None, None) => None,
        _ => {
            return Err(Error::Config(
                "MQTT username and password must be set together".to_string(),
            ));
        }
    };

    Ok(Some(BrokerConfig {
        host,
        port,
        credentials,
    }))
}
