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

use sentry::types::ParseDsnError;
use snafu::Snafu;

mod base_url;
mod options;
mod setup;

pub use base_url::get_sentry_base_url;
pub use options::{apply_options, FIXED_OPTIONS};
pub use setup::*;

const LOG_CATEGORY: &str = "sentry";

/// Target of the scrubber logs, they are never reported to sentry.
pub const SCRUBBER_LOGGER_TARGET: &str = "francis::scrubber";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Invalid argument {message}"))]
    InvalidArgument { message: String },
    #[snafu(display("Parse dsn error {source}"))]
    Dsn { source: ParseDsnError },
    #[snafu(display("Option {name} is fixed and can't be overridden"))]
    FixedOption { name: String },
    #[snafu(display("Unknown option {name}"))]
    UnknownOption { name: String },
    #[snafu(display("Invalid option {name}, {message}"))]
    InvalidOption { name: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
