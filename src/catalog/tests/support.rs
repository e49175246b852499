//! Shared fixtures for catalog unit tests.

use crate::config::RegistryConfig;
use crate::tool::{ToolRegistry, adapters::memory::StaticToolFactory};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid start time");
        Self {
            now: Mutex::new(start),
        }
    }

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

pub type TestToolRegistry = ToolRegistry<ManualClock>;

pub fn tool_registry(config: RegistryConfig) -> (TestToolRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (ToolRegistry::new(config, clock.clone()), clock)
}

pub fn running_tool_registry() -> (TestToolRegistry, Arc<ManualClock>) {
    let (registry, clock) = tool_registry(RegistryConfig::default());
    registry.start().expect("fresh registry starts");
    (registry, clock)
}

pub fn echo_factory(name: &str) -> Arc<StaticToolFactory> {
    Arc::new(StaticToolFactory::echo(name, format!("Echo tool {name}")))
}
