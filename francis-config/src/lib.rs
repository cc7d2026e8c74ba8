// Copyright 2024-2025 Tree xie.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snafu::Snafu;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const LOG_CATEGORY: &str = "config";

// Error enum for all possible configuration-related errors
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Invalid error {message}"))]
    Invalid { message: String },
    #[snafu(display("Io error {source}, {file}"))]
    Io {
        source: std::io::Error,
        file: String,
    },
    #[snafu(display("Toml de error {source}"))]
    De { source: toml::de::Error },
    #[snafu(display("Url parse error {source}, {url}"))]
    UrlParse {
        source: url::ParseError,
        url: String,
    },
}
type Result<T, E = Error> = std::result::Result<T, E>;

/// Sentry configuration
#[derive(Debug, Default, Deserialize, Clone, Serialize)]
pub struct SentryConf {
    /// Sentry DSN, reporting is disabled if it's empty
    pub dsn: Option<String>,
    /// Release name to tag events with
    pub release: Option<String>,
    /// Host this service is running on(default: hostname)
    pub host_id: Option<String>,
    /// Environment name, e.g. production
    pub environment: Option<String>,
    /// Time to wait for pending events when the client is closed
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Option<Duration>,
    /// Any additional client options
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl SentryConf {
    /// Returns the host id, the hostname is used if it's not configured.
    pub fn get_host_id(&self) -> String {
        if let Some(host_id) = &self.host_id {
            return host_id.clone();
        }
        hostname::get()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Returns the pass-through options, including the environment and
    /// shutdown timeout set in the sentry section.
    pub fn pass_through_options(&self) -> Map<String, Value> {
        let mut options = self.options.clone();
        if let Some(environment) = &self.environment {
            options.insert(
                "environment".to_string(),
                Value::String(environment.clone()),
            );
        }
        if let Some(timeout) = self.shutdown_timeout {
            options.insert(
                "shutdown_timeout".to_string(),
                Value::String(
                    humantime::format_duration(timeout).to_string(),
                ),
            );
        }
        options
    }

    fn validate(&self) -> Result<()> {
        let dsn = self.dsn.clone().unwrap_or_default();
        if !dsn.is_empty() {
            url::Url::parse(&dsn).map_err(|e| Error::UrlParse {
                source: e,
                url: dsn.clone(),
            })?;
        }
        for key in ["sample_rate", "traces_sample_rate"] {
            let Some(value) = self.options.get(key) else {
                continue;
            };
            let valid = value
                .as_f64()
                .is_some_and(|rate| (0.0..=1.0).contains(&rate));
            if !valid {
                return Err(Error::Invalid {
                    message: format!(
                        "{key} should be a number between 0.0 and 1.0"
                    ),
                });
            }
        }
        if let Some(value) = self.options.get("shutdown_timeout") {
            let valid = match value {
                Value::String(s) => humantime::parse_duration(s).is_ok(),
                Value::Number(n) => n.as_f64().is_some_and(|secs| {
                    secs >= 0.0 && Duration::try_from_secs_f64(secs).is_ok()
                }),
                _ => false,
            };
            if !valid {
                return Err(Error::Invalid {
                    message: "shutdown_timeout should be a duration or a non-negative number of seconds".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Log configuration
#[derive(Debug, Default, Deserialize, Clone, Serialize)]
pub struct LogConf {
    /// Log level, comma separated directives are supported(default: info)
    pub level: Option<String>,
    /// Whether to format logs as JSON
    pub json: Option<bool>,
    /// Path of the log file, logs are written to stderr if it's empty
    pub file: Option<String>,
    /// Rolling of the log file(default: daily)
    pub rolling: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone, Serialize)]
pub struct FrancisConf {
    #[serde(default)]
    pub sentry: SentryConf,
    #[serde(default)]
    pub log: LogConf,
}

impl FrancisConf {
    /// Parses the toml config and validates it.
    pub fn from_toml(data: &str) -> Result<Self> {
        let conf: FrancisConf =
            toml::from_str(data).map_err(|e| Error::De { source: e })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Validates the config, the dsn should be a valid url,
    /// the sample rates should be between 0.0 and 1.0 and the
    /// shutdown timeout should fit in a duration.
    pub fn validate(&self) -> Result<()> {
        self.sentry.validate()
    }
}

/// Loads the config from the toml file.
pub fn load_config(path: impl AsRef<Path>) -> Result<FrancisConf> {
    let path = path.as_ref();
    let file = path.to_string_lossy().to_string();
    let data = std::fs::read_to_string(path).map_err(|e| Error::Io {
        source: e,
        file: file.clone(),
    })?;
    let conf = FrancisConf::from_toml(&data)?;
    debug!(category = LOG_CATEGORY, file, "load config success");
    Ok(conf)
}
