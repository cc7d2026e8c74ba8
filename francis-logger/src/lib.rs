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

use snafu::Snafu;
use tracing::error;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

mod writer;

const LOG_TARGET: &str = "francis::logger";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("IO error {source}"))]
    Io { source: std::io::Error },
    #[snafu(display("Invalid {message}"))]
    Invalid { message: String },
}
type Result<T, E = Error> = std::result::Result<T, E>;

fn add_directives(mut filter: EnvFilter, level: &str) -> EnvFilter {
    for item in level.split(',').filter(|item| !item.trim().is_empty()) {
        match item.trim().parse::<Directive>() {
            Ok(directive) => {
                filter = filter.add_directive(directive);
            },
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    error = e.to_string(),
                    directive = item,
                    "parse directive fail"
                );
            },
        };
    }
    filter
}

/// Creates the env filter from `RUST_LOG` and the comma separated directives,
/// invalid directives are skipped.
pub fn new_env_filter(level: &str) -> EnvFilter {
    add_directives(EnvFilter::from_default_env(), level)
}

pub use writer::*;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_add_directives() {
        let filter = add_directives(EnvFilter::default(), "error");
        assert_eq!(Some(LevelFilter::ERROR), filter.max_level_hint());

        let filter =
            add_directives(EnvFilter::default(), "info, francis=debug");
        assert_eq!(Some(LevelFilter::DEBUG), filter.max_level_hint());

        let filter =
            add_directives(EnvFilter::default(), "error,francis=nope,,");
        assert_eq!(Some(LevelFilter::ERROR), filter.max_level_hint());
    }
}
