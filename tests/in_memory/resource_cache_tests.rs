//! Resource reads through the content cache.

use super::helpers::{TestContext, context, text_resource};
use armature::catalog::domain::{ProviderDescriptor, ProviderStatus};
use armature::catalog::ports::{CreateContext, ProviderError};
use armature::catalog::services::RegistryError;
use armature::resource::ResourceBody;
use armature::resource::adapters::memory::StaticResourceFactory;
use chrono::TimeDelta;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

const URI: &str = "file:///srv/motd.txt";

fn motd(context: &TestContext) -> Arc<StaticResourceFactory> {
    let factory = text_resource(URI, "motd", "hello");
    context
        .resources
        .registry()
        .register(URI, factory.clone())
        .expect("registration should succeed");
    factory
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_read_is_served_from_cache(context: TestContext) {
    let factory = motd(&context);

    let first = context.resources.read(URI).await.expect("first read");
    factory
        .set_body(ResourceBody::Text("changed".to_owned()))
        .expect("replace body");
    let second = context.resources.read(URI).await.expect("second read");

    assert_eq!(first.as_text(), Some("hello"));
    assert_eq!(second, first);
    assert_eq!(factory.read_count().expect("read count"), 1);
    let figures = context.resources.cache().health();
    assert_eq!((figures.hits, figures.misses), (1, 1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_content_is_fetched_again(context: TestContext) {
    let factory = motd(&context);
    context.resources.read(URI).await.expect("first read");
    factory
        .set_body(ResourceBody::Text("changed".to_owned()))
        .expect("replace body");

    context.clock.advance(TimeDelta::seconds(301));
    let refreshed = context.resources.read(URI).await.expect("read after expiry");

    assert_eq!(refreshed.as_text(), Some("changed"));
    assert_eq!(factory.read_count().expect("read count"), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resource_ttl_overrides_configured_ttl(context: TestContext) {
    let factory = Arc::new(
        StaticResourceFactory::text(URI, "motd", "text/plain", "hello")
            .with_cache_ttl(Duration::from_secs(5)),
    );
    context
        .resources
        .registry()
        .register(URI, factory.clone())
        .expect("registration should succeed");
    context.resources.read(URI).await.expect("first read");

    context.clock.advance(TimeDelta::seconds(6));
    context.resources.read(URI).await.expect("read after expiry");

    assert_eq!(factory.read_count().expect("read count"), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refresh_bypasses_fresh_content(context: TestContext) {
    let factory = motd(&context);
    context.resources.read(URI).await.expect("first read");
    factory
        .set_body(ResourceBody::Text("changed".to_owned()))
        .expect("replace body");

    let refreshed = context.resources.refresh(URI).await.expect("refresh");

    assert_eq!(refreshed.as_text(), Some("changed"));
    assert_eq!(
        context
            .resources
            .read(URI)
            .await
            .expect("cached read")
            .as_text(),
        Some("changed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabling_a_resource_drops_its_cached_content(context: TestContext) {
    motd(&context);
    context.resources.read(URI).await.expect("first read");
    assert_eq!(context.resources.cache().len(), 1);

    context
        .resources
        .registry()
        .transition_status(URI, ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable should succeed");

    assert!(context.resources.cache().is_empty());
    assert!(matches!(
        context.resources.read(URI).await,
        Err(RegistryError::InvalidTransition { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_clears_the_cache(context: TestContext) {
    motd(&context);
    context.resources.read(URI).await.expect("first read");

    context.resources.registry().stop().expect("stop should succeed");

    assert!(context.resources.cache().is_empty());
    assert!(matches!(
        context.resources.read(URI).await,
        Err(RegistryError::RegistryNotRunning { kind: "resource" })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_read_is_not_cached(context: TestContext) {
    let factory = motd(&context);
    context.resources.registry().get(URI).await.expect("build");
    factory
        .faults()
        .set_unhealthy("permission denied")
        .expect("inject unhealthy");

    let result = context.resources.read(URI).await;

    assert!(matches!(
        result,
        Err(RegistryError::Provider {
            source: ProviderError::Unavailable(_),
            ..
        })
    ));
    assert!(context.resources.cache().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn instance_serving_another_uri_fails_validation(context: TestContext) {
    let factory = Arc::new(
        StaticResourceFactory::text(URI, "motd", "text/plain", "hello")
            .with_reported_uri("file:///srv/other.txt"),
    );
    context
        .resources
        .registry()
        .register(URI, factory)
        .expect("registration should succeed");

    let result = context.resources.read(URI).await;

    match result {
        Err(RegistryError::ValidationFailed { violations, .. }) => {
            assert!(violations.has_field("instance.uri"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn content_labelled_with_another_uri_is_rejected_and_not_cached(context: TestContext) {
    let mislabelled = "file:///srv/a.txt";
    let neighbour = "file:///srv/b.txt";
    let factory = Arc::new(
        StaticResourceFactory::text(mislabelled, "a", "text/plain", "from a")
            .with_content_uri(neighbour),
    );
    context
        .resources
        .registry()
        .register(mislabelled, factory.clone())
        .expect("registration should succeed");
    context
        .resources
        .registry()
        .register(neighbour, text_resource(neighbour, "b", "from b"))
        .expect("registration should succeed");
    context.resources.read(neighbour).await.expect("read b");
    context
        .resources
        .registry()
        .transition_status(neighbour, ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable b");

    for _ in 0..2 {
        match context.resources.read(mislabelled).await {
            Err(RegistryError::ValidationFailed { violations, .. }) => {
                assert!(violations.has_field("content.uri"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    assert_eq!(factory.read_count().expect("read count"), 2);
    assert!(context.resources.cache().is_empty());
    assert!(matches!(
        context.resources.read(neighbour).await,
        Err(RegistryError::InvalidTransition { .. })
    ));
    context
        .resources
        .registry()
        .unregister(mislabelled)
        .expect("unregister a");
    assert!(context.resources.cache().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn binary_content_round_trips_through_the_cache(context: TestContext) {
    let uri = "custom:assets/logo";
    let factory = Arc::new(StaticResourceFactory::new(
        ProviderDescriptor::resource(uri, "logo", "Company logo", "image/png"),
        ResourceBody::Blob(vec![0x89, b'P', b'N', b'G']),
    ));
    context
        .resources
        .registry()
        .register(uri, factory)
        .expect("registration should succeed");

    context.resources.read(uri).await.expect("first read");
    let cached = context.resources.read(uri).await.expect("cached read");

    assert_eq!(cached.mime_type, "image/png");
    assert_eq!(cached.body, ResourceBody::Blob(vec![0x89, b'P', b'N', b'G']));
    assert!(cached.as_text().is_none());
}
