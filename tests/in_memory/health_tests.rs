//! Aggregated health snapshots.

use super::helpers::{TestContext, context, echo_tool, stopped_context, text_resource};
use armature::catalog::domain::{CircuitState, HealthStatus, ProviderStatus};
use armature::catalog::ports::CreateContext;
use armature::config::{CacheConfig, RegistryConfig, ThresholdBreakerConfig};
use rstest::rstest;

#[rstest]
fn stopped_registry_reports_stopped(stopped_context: TestContext) {
    let health = stopped_context.tools.health().expect("health snapshot");

    assert_eq!(health.status, HealthStatus::Stopped);
    assert!(!health.running);
    assert_eq!(health.kind, "tool");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_counts_entries_per_status(context: TestContext) {
    for name in ["alpha", "beta", "gamma"] {
        context
            .tools
            .register(name, echo_tool(name))
            .expect("registration should succeed");
    }
    context.tools.get("alpha").await.expect("build alpha");
    context
        .tools
        .transition_status("gamma", ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable gamma");

    let health = context.tools.health().expect("health snapshot");

    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.total, 3);
    assert_eq!(health.count(ProviderStatus::Loaded), 1);
    assert_eq!(health.count(ProviderStatus::Registered), 1);
    assert_eq!(health.count(ProviderStatus::Disabled), 1);
    assert_eq!(health.count(ProviderStatus::Error), 0);
    assert_eq!(health.providers.get("alpha"), Some(&ProviderStatus::Loaded));
    assert!(health.errors.is_empty());
    assert!(health.cache.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_entry_degrades_health_and_reports_reason(context: TestContext) {
    let broken = echo_tool("broken");
    broken.faults().fail_next(1).expect("inject failure");
    context
        .tools
        .register("broken", broken)
        .expect("registration should succeed");
    assert!(
        context
            .tools
            .load_all(&CreateContext::new())
            .await
            .is_err()
    );

    let health = context.tools.health().expect("health snapshot");

    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(
        health
            .errors
            .get("broken")
            .is_some_and(|reason| reason.contains("injected"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_breaker_without_failed_entries_stays_healthy() {
    let config = RegistryConfig {
        resource_breaker: ThresholdBreakerConfig {
            max_failures: 1,
            retry_timeout_secs: 60,
        },
        ..RegistryConfig::default()
    };
    let test_context = TestContext::with_config(&config);
    test_context.start();
    let uri = "config:app/flags";
    let flaky = text_resource(uri, "flags", "{}");
    flaky.faults().fail_next(10).expect("inject failures");
    test_context
        .resources
        .registry()
        .register(uri, flaky)
        .expect("registration should succeed");
    assert!(test_context.resources.registry().get(uri).await.is_err());

    let health = test_context.resources.health().expect("health snapshot");

    assert_eq!(health.breakers.get(uri), Some(&CircuitState::Open));
    assert_eq!(health.providers.get(uri), Some(&ProviderStatus::Registered));
    assert_eq!(health.status, HealthStatus::Healthy);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resource_health_includes_cache_figures(context: TestContext) {
    let uri = "config:app/flags";
    context
        .resources
        .registry()
        .register(uri, text_resource(uri, "flags", "{}"))
        .expect("registration should succeed");
    context.resources.read(uri).await.expect("first read");
    context.resources.read(uri).await.expect("cached read");

    let health = context.resources.health().expect("health snapshot");

    let cache = health.cache.expect("resource health carries cache figures");
    assert_eq!(cache.size, 1);
    assert_eq!((cache.hits, cache.misses), (1, 1));
    assert_eq!(health.status, HealthStatus::Healthy);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn low_hit_rate_degrades_resource_health() {
    let config = RegistryConfig {
        cache: CacheConfig {
            degraded_hit_rate: Some(0.9),
            degraded_min_lookups: 2,
            ..CacheConfig::default()
        },
        ..RegistryConfig::default()
    };
    let test_context = TestContext::with_config(&config);
    test_context.start();
    let uri = "config:app/flags";
    test_context
        .resources
        .registry()
        .register(uri, text_resource(uri, "flags", "{}"))
        .expect("registration should succeed");
    test_context
        .resources
        .refresh(uri)
        .await
        .expect("first refresh");
    test_context
        .resources
        .refresh(uri)
        .await
        .expect("second refresh");

    let health = test_context.resources.health().expect("health snapshot");

    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(health.cache.is_some_and(|figures| figures.degraded));
}

#[rstest]
fn health_snapshot_serializes_with_stable_field_names(context: TestContext) {
    let health = context.tools.health().expect("health snapshot");

    let json = serde_json::to_value(&health).expect("health should serialize");

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["kind"], "tool");
    assert_eq!(json["running"], true);
    assert!(json.get("status_counts").is_some());
    assert!(json.get("cache").is_none());
}
