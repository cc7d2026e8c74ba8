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

use super::{
    apply_options, Error, Result, LOG_CATEGORY, SCRUBBER_LOGGER_TARGET,
};
use arc_swap::ArcSwap;
use sentry::protocol::Event;
use sentry::types::Dsn;
use sentry::{
    BeforeCallback, Client, ClientInitGuard, ClientOptions, Integration,
    TransportFactory,
};
use sentry_tracing::{EventFilter, SentryLayer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level, Metadata, Subscriber};
use tracing_subscriber::registry::LookupSpan;

/// Parameters of the sentry setup
///
/// # Fields
/// * `release` - The release name to tag events with
/// * `host_id` - The host this service is running on, used as server name
/// * `dsn` - The sentry dsn, reporting is disabled if it's empty
/// * `integrations` - The only integrations that will be enabled
/// * `before_send` - Callback to handle events before they are sent, e.g. scrubbing
/// * `transport` - Transport factory, the sdk default is used if not set
/// * `options` - Any additional client options, see [`apply_options`]
#[derive(Default, Clone)]
pub struct SentryParams {
    release: String,
    host_id: String,
    dsn: String,
    integrations: Vec<Arc<dyn Integration>>,
    before_send: Option<BeforeCallback<Event<'static>>>,
    transport: Option<Arc<dyn TransportFactory>>,
    options: Map<String, Value>,
}

/// The reporting state derived from the params.
pub enum ReportingState {
    /// The dsn is empty, nothing will be initialized.
    Disabled,
    Enabled(Box<ClientOptions>),
}

impl ReportingState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ReportingState::Enabled(_))
    }
}

fn to_cow(value: &str) -> Option<Cow<'static, str>> {
    if value.is_empty() {
        return None;
    }
    Some(Cow::Owned(value.to_string()))
}

impl SentryParams {
    /// Creates a new SentryParams builder
    pub fn builder() -> SentryParamsBuilder {
        SentryParamsBuilder::default()
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Builds the client options, personally identifying information is never
    /// sent whatever the other options are. The sdk default integrations
    /// (panic, contexts, backtrace) are kept unless disabled by the options.
    pub fn client_options(&self) -> Result<ReportingState> {
        if self.dsn.is_empty() {
            return Ok(ReportingState::Disabled);
        }
        let dsn =
            Dsn::from_str(&self.dsn).map_err(|e| Error::Dsn { source: e })?;
        let mut opts = ClientOptions {
            dsn: Some(dsn),
            release: to_cow(&self.release),
            server_name: to_cow(&self.host_id),
            integrations: self.integrations.clone(),
            before_send: self.before_send.clone(),
            transport: self.transport.clone(),
            ..Default::default()
        };
        apply_options(&mut opts, &self.options)?;
        opts.send_default_pii = false;

        Ok(ReportingState::Enabled(Box::new(opts)))
    }
}

/// Builder for SentryParams
#[derive(Default)]
pub struct SentryParamsBuilder {
    params: SentryParams,
}

impl SentryParamsBuilder {
    pub fn release(mut self, release: &str) -> Self {
        self.params.release = release.to_string();
        self
    }
    pub fn host_id(mut self, host_id: &str) -> Self {
        self.params.host_id = host_id.to_string();
        self
    }
    pub fn dsn(mut self, dsn: &str) -> Self {
        self.params.dsn = dsn.to_string();
        self
    }
    /// Adds an integration, only the added integrations are enabled.
    pub fn integration<I: Integration>(mut self, integration: I) -> Self {
        self.params.integrations.push(Arc::new(integration));
        self
    }
    pub fn integrations(
        mut self,
        integrations: Vec<Arc<dyn Integration>>,
    ) -> Self {
        self.params.integrations.extend(integrations);
        self
    }
    /// Sets the before send hook, for scrubbing events.
    pub fn before_send<F>(mut self, before_send: F) -> Self
    where
        F: Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync + 'static,
    {
        self.params.before_send = Some(Arc::new(before_send));
        self
    }
    pub fn before_send_callback(
        mut self,
        before_send: Option<BeforeCallback<Event<'static>>>,
    ) -> Self {
        self.params.before_send = before_send;
        self
    }
    pub fn transport(mut self, transport: Arc<dyn TransportFactory>) -> Self {
        self.params.transport = Some(transport);
        self
    }
    /// Sets an additional client option, the last value wins.
    pub fn option(mut self, name: &str, value: Value) -> Self {
        self.params.options.insert(name.to_string(), value);
        self
    }
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.params.options.extend(options);
        self
    }
    pub fn build(self) -> SentryParams {
        self.params
    }
}

fn is_ignored(ignored_loggers: &[String], target: &str) -> bool {
    ignored_loggers.iter().any(|name| {
        target
            .strip_prefix(name.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Errors are captured as events, warnings and infos are kept as breadcrumbs.
fn level_event_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR => EventFilter::Event,
        Level::WARN | Level::INFO => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// Guard of the sentry client, the client is closed when it's dropped.
pub struct SentryGuard {
    client: Option<ClientInitGuard>,
    ignored_loggers: Arc<ArcSwap<Vec<String>>>,
}

impl SentryGuard {
    fn disabled() -> Self {
        Self {
            client: None,
            ignored_loggers: Arc::new(ArcSwap::from_pointee(vec![])),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client
            .as_ref()
            .map(|client| client.is_enabled())
            .unwrap_or_default()
    }

    /// Gets the bound client, it's none if reporting is disabled.
    pub fn client(&self) -> Option<&Client> {
        self.client.as_deref()
    }

    /// Ignores the logs of the target and its children,
    /// they will be neither captured as events nor breadcrumbs.
    pub fn ignore_logger(&self, target: &str) {
        self.ignored_loggers.rcu(|current| {
            let mut loggers = current.as_ref().clone();
            if !loggers.iter().any(|item| item == target) {
                loggers.push(target.to_string());
            }
            loggers
        });
    }

    pub fn is_logger_ignored(&self, target: &str) -> bool {
        is_ignored(&self.ignored_loggers.load(), target)
    }

    /// Creates the tracing layer for sentry, logs of the ignored targets are
    /// dropped and the others are filtered by level.
    /// Returns none if reporting is disabled.
    pub fn layer<S>(&self) -> Option<SentryLayer<S>>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        self.client.as_ref()?;
        let ignored_loggers = self.ignored_loggers.clone();
        let layer = sentry_tracing::layer().event_filter(
            move |metadata: &Metadata<'_>| {
                if is_ignored(&ignored_loggers.load(), metadata.target()) {
                    return EventFilter::Ignore;
                }
                level_event_filter(metadata)
            },
        );
        Some(layer)
    }

    /// Flushes the pending events, returns false if it is timeout or disabled.
    pub fn flush(&self, timeout: Option<Duration>) -> bool {
        self.client
            .as_ref()
            .map(|client| client.flush(timeout))
            .unwrap_or_default()
    }
}

/// Sets up sentry for the process.
///
/// If the dsn is empty, nothing is initialized and a disabled guard is returned.
/// Otherwise the sentry client is bound to the main hub until the guard is dropped,
/// and the scrubber logs are ignored.
///
/// # Arguments
/// * `params` - The sentry params
///
/// # Returns
/// The guard which should be kept alive for the lifetime of the application
pub fn set_up_sentry(params: SentryParams) -> Result<SentryGuard> {
    let mut guard = SentryGuard::disabled();
    let opts = match params.client_options()? {
        ReportingState::Disabled => {
            info!(
                category = LOG_CATEGORY,
                "sentry dsn is empty, reporting is disabled"
            );
            return Ok(guard);
        },
        ReportingState::Enabled(opts) => opts,
    };
    let client = sentry::init(*opts);
    info!(
        category = LOG_CATEGORY,
        release = params.release.as_str(),
        host_id = params.host_id.as_str(),
        enabled = client.is_enabled(),
        "init sentry success"
    );
    guard.client = Some(client);
    guard.ignore_logger(SCRUBBER_LOGGER_TARGET);

    Ok(guard)
}
