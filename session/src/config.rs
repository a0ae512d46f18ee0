//! Broker connection configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Paths to the PEM material for mutual-TLS broker authentication.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    /// Root trust anchor (e.g. the AWS IoT root CA).
    pub ca_path: PathBuf,
    /// Client certificate.
    pub cert_path: PathBuf,
    /// Client private key.
    pub key_path: PathBuf,
}

/// Everything the session needs to reach the broker.
///
/// Validity of the values is the caller's responsibility; the session
/// only fails loudly if the connection cannot be established.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Broker hostname.
    pub endpoint: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic the device publishes heartbeats to (subscribe side).
    pub heartbeat_topic: String,
    /// Topic operator commands are published to (publish side).
    pub command_topic: String,
    /// TLS material; `None` connects over plain TCP.
    pub tls: Option<TlsFiles>,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// How long `start()` waits for the initial connect attempt.
    pub connect_timeout: Duration,
}

impl SessionConfig {
    /// Plain-TCP configuration with defaults, mainly for local brokers
    /// and tests.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            port: 1883,
            client_id: "esp32_varal_backend".to_string(),
            heartbeat_topic: "casa/varal1/heartbeat".to_string(),
            command_topic: "casa/varal1/cmd".to_string(),
            tls: None,
            keep_alive: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Load the configuration from environment variables.
    ///
    /// `VARAL_MQTT_ENDPOINT` is required; everything else has a default:
    /// `VARAL_MQTT_PORT` (8883), `VARAL_MQTT_CLIENT_ID`,
    /// `VARAL_TOPIC_HEARTBEAT`, `VARAL_TOPIC_CMD`, `VARAL_CA_PATH`,
    /// `VARAL_CERT_PATH` and `VARAL_KEY_PATH`.
    pub fn from_env() -> Result<Self> {
        let endpoint = env::var("VARAL_MQTT_ENDPOINT")
            .map_err(|_| Error::Config("VARAL_MQTT_ENDPOINT is not set".to_string()))?;

        let port = match env::var("VARAL_MQTT_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("invalid VARAL_MQTT_PORT: {raw:?}")))?,
            Err(_) => 8883,
        };

        let tls = TlsFiles {
            ca_path: env_or("VARAL_CA_PATH", "certs/AmazonRootCA1.pem").into(),
            cert_path: env_or("VARAL_CERT_PATH", "certs/certificate.crt").into(),
            key_path: env_or("VARAL_KEY_PATH", "certs/private.key").into(),
        };

        Ok(Self {
            endpoint,
            port,
            client_id: env_or("VARAL_MQTT_CLIENT_ID", "esp32_varal_backend"),
            heartbeat_topic: env_or("VARAL_TOPIC_HEARTBEAT", "casa/varal1/heartbeat"),
            command_topic: env_or("VARAL_TOPIC_CMD", "casa/varal1/cmd"),
            tls: Some(tls),
            keep_alive: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_config_defaults() {
        let config = SessionConfig::new("127.0.0.1");
        assert_eq!(config.port, 1883);
        assert_eq!(config.heartbeat_topic, "casa/varal1/heartbeat");
        assert_eq!(config.command_topic, "casa/varal1/cmd");
        assert!(config.tls.is_none());
    }
}
