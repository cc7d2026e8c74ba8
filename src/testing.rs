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
use sentry::test::TestTransport;
use sentry::types::Dsn;
use sentry::{Client, ClientOptions, Hub, Scope, TransportFactory};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

const TEST_DSN: &str = "https://public@sentry.invalid/1";

/// Helper for capturing sentry events in tests.
///
/// Events are captured in memory by the transport of the helper,
/// nothing is sent over the network.
pub struct SentryTestHelper {
    transport: Arc<TestTransport>,
    events: Mutex<Vec<Event<'static>>>,
}

impl Default for SentryTestHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl SentryTestHelper {
    pub fn new() -> Self {
        Self {
            transport: TestTransport::new(),
            events: Mutex::new(vec![]),
        }
    }

    /// Gets the transport factory which captures the events of this helper.
    pub fn transport(&self) -> Arc<dyn TransportFactory> {
        Arc::new(self.transport.clone())
    }

    /// Runs the function in an isolated hub, the client is created from the
    /// options with the capturing transport. The captured events are cleared
    /// before it runs.
    pub fn session_context<F, R>(&self, options: ClientOptions, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        self.clear();
        let mut options = options;
        if options.dsn.is_none() {
            options.dsn = Dsn::from_str(TEST_DSN).ok();
        }
        options.transport = Some(self.transport());
        let client = Arc::new(Client::from(options));
        let hub = Arc::new(Hub::new(Some(client), Arc::new(Scope::default())));
        Hub::run(hub, || f(self))
    }

    /// Gets the events captured in the current session.
    pub fn events(&self) -> Vec<Event<'static>> {
        let captured = self.transport.fetch_and_clear_events();
        let mut events =
            self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.extend(captured);
        events.clone()
    }

    fn clear(&self) {
        let _ = self.transport.fetch_and_clear_envelopes();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
