use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use crate::{
    dir::DataDirectory,
    services::{
        identity::CognitoClient, profile::ProfileClient, pubsub::PubSubClient,
        reservation::ReservationClient, rooms::RoomsClient,
    },
};

pub const DEFAULT_FILE_NAME: &str = "dalvacation.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// log level, can be "info", "debug", "trace".
    pub log_level: Option<String>,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Identity provider user pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub region: Option<String>,
    pub user_pool_id: Option<String>,
    pub client_id: Option<String>,
    /// Overrides the regional endpoint derived from `region`.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoints {
    pub security_question_url: Option<String>,
    pub confirm_user_url: Option<String>,
    pub fetch_all_rooms_url: Option<String>,
    pub fetch_room_details_url: Option<String>,
    pub create_reservation_url: Option<String>,
    pub fetch_reservations_by_room_url: Option<String>,
    pub pubsub_url: Option<String>,
}

impl Config {
    pub fn path(datadir: &DataDirectory) -> PathBuf {
        datadir.file(DEFAULT_FILE_NAME)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ConfigError::NotFound,
                _ => ConfigError::ReadingFile(format!("Reading configuration file: {}", e)),
            })
            .and_then(|file_content| {
                toml::from_str::<Config>(&file_content).map_err(|e| {
                    ConfigError::ReadingFile(format!("Parsing configuration file: {}", e))
                })
            })?;

        // check if log_level field is valid
        config.log_level()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string(&self)
            .map_err(|e| ConfigError::WritingFile(format!("Failed to serialize config: {}", e)))?;

        let mut config_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| ConfigError::WritingFile(e.to_string()))?;

        config_file.write_all(content.as_bytes()).map_err(|e| {
            tracing::warn!("failed to write to file: {:?}", e);
            ConfigError::WritingFile(e.to_string())
        })?;

        tracing::info!("Done writing configuration file");
        Ok(())
    }

    /// Environment variables take precedence over the configuration file.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        let overrides: [(&str, &mut Option<String>); 11] = [
            ("AWS_COGNITO_REGION", &mut self.identity.region),
            ("AWS_USER_POOLS_ID", &mut self.identity.user_pool_id),
            ("AWS_USER_POOLS_WEB_CLIENT_ID", &mut self.identity.client_id),
            ("COGNITO_ENDPOINT", &mut self.identity.endpoint),
            (
                "POST_SECURITY_QUESTION_URL",
                &mut self.endpoints.security_question_url,
            ),
            ("COGNITO_CONFIRM_USER_URL", &mut self.endpoints.confirm_user_url),
            ("FETCH_ALL_ROOMS_URL", &mut self.endpoints.fetch_all_rooms_url),
            (
                "FETCH_ROOM_DETAILS_URL",
                &mut self.endpoints.fetch_room_details_url,
            ),
            (
                "CREATE_RESERVATION_URL",
                &mut self.endpoints.create_reservation_url,
            ),
            (
                "FETCH_RESERVATION_BY_ROOM_ID_URL",
                &mut self.endpoints.fetch_reservations_by_room_url,
            ),
            ("PUBSUB_API_URL", &mut self.endpoints.pubsub_url),
        ];
        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = Some(value);
            }
        }
        self
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        if let Some(level) = &self.log_level {
            match level.as_ref() {
                "error" => Ok(LevelFilter::ERROR),
                "warn" => Ok(LevelFilter::WARN),
                "info" => Ok(LevelFilter::INFO),
                "debug" => Ok(LevelFilter::DEBUG),
                "trace" => Ok(LevelFilter::TRACE),
                _ => Err(ConfigError::InvalidField(
                    "log_level",
                    format!("Unknown value '{}'", level),
                )),
            }
        } else {
            Ok(LevelFilter::INFO)
        }
    }

    pub fn user_pool_id(&self) -> Result<&str, ConfigError> {
        required("identity.user_pool_id", &self.identity.user_pool_id)
    }

    pub fn identity_client(&self) -> Result<CognitoClient, ConfigError> {
        let client_id = required("identity.client_id", &self.identity.client_id)?.to_string();
        if let Some(endpoint) = &self.identity.endpoint {
            return Ok(CognitoClient::with_endpoint(endpoint.clone(), client_id));
        }
        let region = required("identity.region", &self.identity.region)?;
        Ok(CognitoClient::new(region, client_id))
    }

    pub fn profile_client(&self) -> Result<ProfileClient, ConfigError> {
        Ok(ProfileClient::new(
            required(
                "endpoints.security_question_url",
                &self.endpoints.security_question_url,
            )?
            .to_string(),
            required("endpoints.confirm_user_url", &self.endpoints.confirm_user_url)?
                .to_string(),
        ))
    }

    pub fn rooms_client(&self) -> Result<RoomsClient, ConfigError> {
        Ok(RoomsClient::new(
            required(
                "endpoints.fetch_all_rooms_url",
                &self.endpoints.fetch_all_rooms_url,
            )?
            .to_string(),
            required(
                "endpoints.fetch_room_details_url",
                &self.endpoints.fetch_room_details_url,
            )?
            .to_string(),
        ))
    }

    pub fn reservation_client(&self) -> Result<ReservationClient, ConfigError> {
        Ok(ReservationClient::new(
            required(
                "endpoints.create_reservation_url",
                &self.endpoints.create_reservation_url,
            )?
            .to_string(),
            required(
                "endpoints.fetch_reservations_by_room_url",
                &self.endpoints.fetch_reservations_by_room_url,
            )?
            .to_string(),
        ))
    }

    pub fn pubsub_client(&self) -> Result<PubSubClient, ConfigError> {
        Ok(PubSubClient::new(
            required("endpoints.pubsub_url", &self.endpoints.pubsub_url)?.to_string(),
        ))
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(field))
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ConfigError {
    InvalidField(&'static str, String),
    Missing(&'static str),
    NotFound,
    ReadingFile(String),
    WritingFile(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Config file not found"),
            Self::InvalidField(field, message) => {
                write!(f, "Config field {} is invalid: {}", field, message)
            }
            Self::Missing(field) => write!(f, "Config field {} is missing", field),
            Self::ReadingFile(e) => write!(f, "Error while reading file: {}", e),
            Self::WritingFile(e) => write!(f, "Error while writing file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
