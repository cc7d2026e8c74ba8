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

use super::{Error, Result};
use sentry::ClientOptions;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::time::Duration;

/// Options that are always set by the setup and can't be passed through.
pub const FIXED_OPTIONS: [&str; 9] = [
    "dsn",
    "release",
    "server_name",
    "host_id",
    "send_default_pii",
    "auto_enabling_integrations",
    "integrations",
    "before_send",
    "transport",
];

fn invalid(name: &str, message: &str) -> Error {
    Error::InvalidOption {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn as_bool(name: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| invalid(name, "expected a bool"))
}

fn as_string(name: &str, value: &Value) -> Result<Cow<'static, str>> {
    value
        .as_str()
        .map(|s| Cow::Owned(s.to_string()))
        .ok_or_else(|| invalid(name, "expected a string"))
}

fn as_rate(name: &str, value: &Value) -> Result<f32> {
    let rate = value
        .as_f64()
        .ok_or_else(|| invalid(name, "expected a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(invalid(name, "expected a number between 0.0 and 1.0"));
    }
    Ok(rate as f32)
}

fn as_duration(name: &str, value: &Value) -> Result<Duration> {
    match value {
        Value::String(s) => humantime::parse_duration(s)
            .map_err(|e| invalid(name, &e.to_string())),
        Value::Number(n) => n
            .as_f64()
            .filter(|secs| *secs >= 0.0)
            .ok_or_else(|| invalid(name, "expected a non-negative number"))
            .and_then(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| invalid(name, &e.to_string()))
            }),
        _ => Err(invalid(name, "expected a duration")),
    }
}

/// Applies a single pass-through option on the client options.
fn apply_option(
    opts: &mut ClientOptions,
    name: &str,
    value: &Value,
) -> Result<()> {
    if FIXED_OPTIONS.contains(&name) {
        return Err(Error::FixedOption {
            name: name.to_string(),
        });
    }
    match name {
        "environment" => opts.environment = Some(as_string(name, value)?),
        "debug" => opts.debug = as_bool(name, value)?,
        "default_integrations" => {
            opts.default_integrations = as_bool(name, value)?
        },
        "sample_rate" => opts.sample_rate = as_rate(name, value)?,
        "traces_sample_rate" => {
            opts.traces_sample_rate = as_rate(name, value)?
        },
        "max_breadcrumbs" => {
            opts.max_breadcrumbs = value
                .as_u64()
                .ok_or_else(|| {
                    invalid(name, "expected a non-negative integer")
                })?
                .try_into()
                .map_err(|_| invalid(name, "value is too large"))?;
        },
        "attach_stacktrace" => {
            opts.attach_stacktrace = as_bool(name, value)?
        },
        "auto_session_tracking" => {
            opts.auto_session_tracking = as_bool(name, value)?
        },
        "accept_invalid_certs" => {
            opts.accept_invalid_certs = as_bool(name, value)?
        },
        "http_proxy" => opts.http_proxy = Some(as_string(name, value)?),
        "https_proxy" => opts.https_proxy = Some(as_string(name, value)?),
        "shutdown_timeout" => {
            opts.shutdown_timeout = as_duration(name, value)?
        },
        _ => {
            return Err(Error::UnknownOption {
                name: name.to_string(),
            })
        },
    }
    Ok(())
}

/// Merges the pass-through options into the client options.
/// A fixed option, an unknown option or a value of the wrong type
/// is rejected and nothing after it is applied.
pub fn apply_options(
    opts: &mut ClientOptions,
    options: &Map<String, Value>,
) -> Result<()> {
    for (name, value) in options {
        apply_option(opts, name, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn to_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_apply_options() {
        let mut opts = ClientOptions::default();
        apply_options(
            &mut opts,
            &to_map(json!({
                "environment": "production",
                "debug": true,
                "sample_rate": 0.5,
                "traces_sample_rate": 0.1,
                "max_breadcrumbs": 20,
                "attach_stacktrace": true,
                "auto_session_tracking": true,
                "accept_invalid_certs": true,
                "http_proxy": "http://proxy:3128",
                "https_proxy": "http://proxy:3129",
                "shutdown_timeout": "3s",
            })),
        )
        .unwrap();

        assert_eq!(Some("production"), opts.environment.as_deref());
        assert_eq!(true, opts.debug);
        assert_eq!(0.5, opts.sample_rate);
        assert_eq!(0.1, opts.traces_sample_rate);
        assert_eq!(20, opts.max_breadcrumbs);
        assert_eq!(true, opts.attach_stacktrace);
        assert_eq!(true, opts.auto_session_tracking);
        assert_eq!(true, opts.accept_invalid_certs);
        assert_eq!(Some("http://proxy:3128"), opts.http_proxy.as_deref());
        assert_eq!(Some("http://proxy:3129"), opts.https_proxy.as_deref());
        assert_eq!(Duration::from_secs(3), opts.shutdown_timeout);
    }

    #[test]
    fn test_shutdown_timeout_seconds() {
        let mut opts = ClientOptions::default();
        apply_options(&mut opts, &to_map(json!({"shutdown_timeout": 1.5})))
            .unwrap();
        assert_eq!(Duration::from_millis(1500), opts.shutdown_timeout);

        let err =
            apply_options(&mut opts, &to_map(json!({"shutdown_timeout": 1e30})))
                .unwrap_err();
        assert_eq!(
            true,
            err.to_string().starts_with("Invalid option shutdown_timeout, ")
        );
        assert_eq!(Duration::from_millis(1500), opts.shutdown_timeout);

        let err =
            apply_options(&mut opts, &to_map(json!({"shutdown_timeout": -1})))
                .unwrap_err();
        assert_eq!(
            "Invalid option shutdown_timeout, expected a non-negative number",
            err.to_string()
        );
    }

    #[test]
    fn test_default_integrations() {
        let mut opts = ClientOptions::default();
        assert_eq!(true, opts.default_integrations);
        apply_options(
            &mut opts,
            &to_map(json!({"default_integrations": false})),
        )
        .unwrap();
        assert_eq!(false, opts.default_integrations);

        let err = apply_options(
            &mut opts,
            &to_map(json!({"default_integrations": "no"})),
        )
        .unwrap_err();
        assert_eq!(
            "Invalid option default_integrations, expected a bool",
            err.to_string()
        );
    }

    #[test]
    fn test_fixed_options() {
        for name in FIXED_OPTIONS {
            let mut opts = ClientOptions::default();
            let options =
                Map::from_iter([(name.to_string(), Value::Bool(true))]);
            let err = apply_options(&mut opts, &options).unwrap_err();
            assert_eq!(
                format!("Option {name} is fixed and can't be overridden"),
                err.to_string()
            );
        }
    }

    #[test]
    fn test_invalid_options() {
        let mut opts = ClientOptions::default();
        let err = apply_options(&mut opts, &to_map(json!({"foo": 1})))
            .unwrap_err();
        assert_eq!("Unknown option foo", err.to_string());

        let err = apply_options(
            &mut opts,
            &to_map(json!({"traces_sample_rate": 1.5})),
        )
        .unwrap_err();
        assert_eq!(
            "Invalid option traces_sample_rate, expected a number between 0.0 and 1.0",
            err.to_string()
        );

        let err =
            apply_options(&mut opts, &to_map(json!({"debug": "yes"})))
                .unwrap_err();
        assert_eq!(
            "Invalid option debug, expected a bool",
            err.to_string()
        );

        let err = apply_options(
            &mut opts,
            &to_map(json!({"shutdown_timeout": "soon"})),
        )
        .unwrap_err();
        assert_eq!(true, matches!(err, Error::InvalidOption { .. }));
    }
}
