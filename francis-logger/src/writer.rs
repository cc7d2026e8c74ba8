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

use super::{new_env_filter, Error, Result};
use sentry_tracing::SentryLayer;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

const LOG_CATEGORY: &str = "logger";

/// Parameters for logger configuration
///
/// # Fields
/// * `log` - Path of the log file or directory, logs are written to stderr if it's empty
/// * `rolling` - Rolling of the log file: minutely, hourly, never or daily(default)
/// * `level` - Comma separated directives, `RUST_LOG` or info is used if it's empty
/// * `json` - Whether to format logs as JSON
#[derive(Default, Debug, Clone)]
pub struct LoggerParams {
    pub log: String,
    pub rolling: String,
    pub level: String,
    pub json: bool,
}

fn new_file_writer(log: &str, rolling: &str) -> Result<BoxMakeWriter> {
    let filepath = Path::new(log);
    let dir = if filepath.is_dir() {
        filepath
    } else {
        filepath.parent().ok_or_else(|| Error::Invalid {
            message: "parent of file log is invalid".to_string(),
        })?
    };
    fs::create_dir_all(dir).map_err(|e| Error::Io { source: e })?;

    let filename = if filepath.is_dir() {
        "".to_string()
    } else {
        filepath
            .file_name()
            .ok_or_else(|| Error::Invalid {
                message: "file log is invalid".to_string(),
            })?
            .to_string_lossy()
            .to_string()
    };
    let file_appender = match rolling {
        "minutely" => tracing_appender::rolling::minutely(dir, filename),
        "hourly" => tracing_appender::rolling::hourly(dir, filename),
        "never" => tracing_appender::rolling::never(dir, filename),
        _ => tracing_appender::rolling::daily(dir, filename),
    };
    Ok(BoxMakeWriter::new(file_appender))
}

/// Initializes the global tracing subscriber with the specified configuration.
///
/// The sentry layer is installed first, so it receives the logs
/// allowed by the env filter and applies its own event filter.
///
/// # Arguments
/// * `params` - Logger configuration parameters
/// * `sentry_layer` - Optional sentry tracing layer
pub fn logger_try_init(
    params: LoggerParams,
    sentry_layer: Option<SentryLayer<Registry>>,
) -> Result<()> {
    let level = if params.level.is_empty() {
        std::env::var("RUST_LOG").unwrap_or("info".to_string())
    } else {
        params.level.clone()
    };

    let seconds = chrono::Local::now().offset().local_minus_utc();
    let hours = (seconds / 3600) as i8;
    let minutes = ((seconds % 3600) / 60) as i8;
    let offset =
        time::UtcOffset::from_hms(hours, minutes, 0).map_err(|e| {
            Error::Invalid {
                message: e.to_string(),
            }
        })?;
    let is_dev = cfg!(debug_assertions);

    let (writer, log_type) = if params.log.is_empty() {
        (BoxMakeWriter::new(std::io::stderr), "stdio")
    } else {
        (new_file_writer(&params.log, &params.rolling)?, "file")
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(is_dev && params.log.is_empty())
        .with_timer(OffsetTime::new(
            offset,
            time::format_description::well_known::Rfc3339,
        ))
        .with_target(is_dev)
        .with_writer(writer);
    let fmt_layer = if params.json {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };
    let with_sentry = sentry_layer.is_some();

    tracing_subscriber::registry()
        .with(sentry_layer)
        .with(new_env_filter(&level))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Invalid {
            message: e.to_string(),
        })?;

    info!(
        category = LOG_CATEGORY,
        log_type,
        level,
        json_format = params.json,
        sentry = with_sentry,
        utc_offset = chrono::Local::now().offset().to_string(),
        "init tracing subscriber success",
    );

    Ok(())
}
