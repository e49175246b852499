//! Shared test helpers for in-memory registry integration tests.

use armature::config::RegistryConfig;
use armature::resource::{ResourceRegistry, adapters::memory::StaticResourceFactory};
use armature::tool::{ToolRegistry, adapters::memory::StaticToolFactory};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex};

/// Clock that only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock fixed at a known instant.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start time");
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock");
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Registries sharing one manual clock.
pub struct TestContext {
    pub clock: Arc<ManualClock>,
    pub tools: ToolRegistry<ManualClock>,
    pub resources: ResourceRegistry<ManualClock>,
}

impl TestContext {
    /// Creates stopped registries with `config`.
    pub fn with_config(config: &RegistryConfig) -> Self {
        let clock = Arc::new(ManualClock::new());
        Self {
            tools: ToolRegistry::new(config.clone(), clock.clone()),
            resources: ResourceRegistry::new(config.clone(), clock.clone()),
            clock,
        }
    }

    /// Starts both registries.
    pub fn start(&self) {
        self.tools.start().expect("tool registry should start");
        self.resources
            .registry()
            .start()
            .expect("resource registry should start");
    }
}

/// Provides running registries with default configuration.
#[fixture]
pub fn context() -> TestContext {
    let test_context = TestContext::with_config(&RegistryConfig::default());
    test_context.start();
    test_context
}

/// Provides registries that have not been started.
#[fixture]
pub fn stopped_context() -> TestContext {
    TestContext::with_config(&RegistryConfig::default())
}

/// Creates an echo tool factory named `name`.
pub fn echo_tool(name: &str) -> Arc<StaticToolFactory> {
    Arc::new(StaticToolFactory::echo(
        name,
        format!("Echoes arguments for {name}"),
    ))
}

/// Creates a plain-text resource factory.
pub fn text_resource(uri: &str, name: &str, text: &str) -> Arc<StaticResourceFactory> {
    Arc::new(StaticResourceFactory::text(uri, name, "text/plain", text))
}
