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

use sentry::protocol::Event;
use sentry::{BeforeCallback, Integration};
use snafu::Snafu;
use std::sync::Arc;
use tracing::info;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use francis_config::{load_config, FrancisConf, LogConf, SentryConf};
pub use francis_logger::{logger_try_init, new_env_filter, LoggerParams};
pub use francis_sentry::{
    apply_options, get_sentry_base_url, set_up_sentry, ReportingState,
    SentryGuard, SentryParams, SentryParamsBuilder, FIXED_OPTIONS,
    SCRUBBER_LOGGER_TARGET,
};
pub use sentry;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Config error {source}"))]
    Config { source: francis_config::Error },
    #[snafu(display("Logger error {source}"))]
    Logger { source: francis_logger::Error },
    #[snafu(display("Sentry error {source}"))]
    Sentry { source: francis_sentry::Error },
}

impl From<francis_config::Error> for Error {
    fn from(err: francis_config::Error) -> Self {
        Error::Config { source: err }
    }
}

impl From<francis_logger::Error> for Error {
    fn from(err: francis_logger::Error) -> Self {
        Error::Logger { source: err }
    }
}

impl From<francis_sentry::Error> for Error {
    fn from(err: francis_sentry::Error) -> Self {
        Error::Sentry { source: err }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Converts the sentry config to the sentry params.
///
/// # Arguments
/// * `conf` - The sentry config
/// * `integrations` - The integrations to enable, the default ones are never enabled
/// * `before_send` - The before send hook, e.g. a scrubber
pub fn new_sentry_params(
    conf: &SentryConf,
    integrations: Vec<Arc<dyn Integration>>,
    before_send: Option<BeforeCallback<Event<'static>>>,
) -> SentryParams {
    SentryParams::builder()
        .release(&conf.release.clone().unwrap_or_default())
        .host_id(&conf.get_host_id())
        .dsn(&conf.dsn.clone().unwrap_or_default())
        .integrations(integrations)
        .before_send_callback(before_send)
        .options(conf.pass_through_options())
        .build()
}

/// Sets up sentry and the global logger from the config.
///
/// Sentry is set up first, so the logger is installed with its tracing layer.
/// The returned guard should be kept alive for the lifetime of the application.
pub fn init(
    conf: &FrancisConf,
    integrations: Vec<Arc<dyn Integration>>,
    before_send: Option<BeforeCallback<Event<'static>>>,
) -> Result<SentryGuard> {
    conf.validate()?;
    let params = new_sentry_params(&conf.sentry, integrations, before_send);
    let guard = set_up_sentry(params)?;

    logger_try_init(
        LoggerParams {
            log: conf.log.file.clone().unwrap_or_default(),
            rolling: conf.log.rolling.clone().unwrap_or_default(),
            level: conf.log.level.clone().unwrap_or_default(),
            json: conf.log.json.unwrap_or_default(),
        },
        guard.layer(),
    )?;
    info!(
        category = "francis",
        sentry_enabled = guard.is_enabled(),
        "init francis success"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_sentry_params() {
        let conf = FrancisConf::from_toml(
            r#"
[sentry]
dsn = "https://abc123@o1.ingest.example.com/456"
release = "myapp@1.2.3"
host_id = "web-1"
environment = "staging"
"#,
        )
        .unwrap();
        let params = new_sentry_params(&conf.sentry, vec![], None);
        assert_eq!("https://abc123@o1.ingest.example.com/456", params.dsn());
        assert_eq!(
            "https://o1.ingest.example.com/",
            get_sentry_base_url(params.dsn()).unwrap()
        );

        let ReportingState::Enabled(opts) = params.client_options().unwrap()
        else {
            panic!("reporting should be enabled");
        };
        assert_eq!(Some("myapp@1.2.3"), opts.release.as_deref());
        assert_eq!(Some("web-1"), opts.server_name.as_deref());
        assert_eq!(Some("staging"), opts.environment.as_deref());
        assert_eq!(false, opts.send_default_pii);
        assert_eq!(true, opts.default_integrations);
    }

    #[test]
    fn test_init_without_dsn() {
        let conf = FrancisConf::from_toml(
            r#"
[log]
level = "warn"
"#,
        )
        .unwrap();
        let guard = init(&conf, vec![], None).unwrap();
        assert_eq!(false, guard.is_enabled());
        assert_eq!(true, guard.client().is_none());
    }
}
