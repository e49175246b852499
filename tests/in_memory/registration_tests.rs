//! Registration, identifier checks and catalog listing.

use super::helpers::{TestContext, context, echo_tool, text_resource};
use armature::catalog::domain::{ProviderDescriptor, ProviderStatus};
use armature::catalog::ports::ProviderFactory;
use armature::catalog::services::RegistryError;
use armature::resource::ResourceBody;
use armature::resource::adapters::memory::StaticResourceFactory;
use armature::tool::adapters::memory::StaticToolFactory;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
fn valid_tool_registers_as_registered(context: TestContext) {
    let entry = context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");

    assert_eq!(entry.status(), ProviderStatus::Registered);
    assert_eq!(entry.kind(), "tool");
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Registered
    );
    assert!(
        context
            .tools
            .instance("echo")
            .expect("instance lookup")
            .is_none()
    );
}

#[rstest]
fn malformed_tool_name_is_rejected_without_catalog_change(context: TestContext) {
    let result = context.tools.register("1bad", echo_tool("1bad"));

    match result {
        Err(RegistryError::InvalidIdentifier { key, violations, .. }) => {
            assert_eq!(key, "1bad");
            assert!(violations.has_field("name"));
        }
        other => panic!("expected invalid identifier, got {other:?}"),
    }
    assert!(context.tools.list().expect("list entries").is_empty());
}

#[rstest]
fn duplicate_registration_is_rejected(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("first registration should succeed");
    let before = context.tools.list().expect("list entries");

    let result = context.tools.register("echo", echo_tool("echo"));

    assert!(matches!(
        result,
        Err(RegistryError::AlreadyExists { kind: "tool", .. })
    ));
    assert_eq!(context.tools.list().expect("list entries"), before);
}

#[rstest]
fn key_must_match_declared_name(context: TestContext) {
    let result = context.tools.register("search", echo_tool("echo"));

    assert!(matches!(
        result,
        Err(RegistryError::InvalidIdentifier { .. })
    ));
    assert_eq!(
        context.tools.status("search").expect("status lookup"),
        ProviderStatus::Unknown
    );
}

#[rstest]
fn invalid_tool_metadata_fails_validation(context: TestContext) {
    let factory = Arc::new(StaticToolFactory::new(
        ProviderDescriptor::tool("echo", "").with_version(""),
    ));

    let result = context.tools.register("echo", factory);

    match result {
        Err(RegistryError::ValidationFailed { violations, .. }) => {
            assert!(violations.has_field("description"));
            assert!(violations.has_field("version"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[rstest]
#[case("ftp://example.com/report", "report")]
#[case("file:///srv/../etc/passwd", "passwd")]
#[case("config:settings", "1settings")]
fn unacceptable_resources_are_rejected(
    context: TestContext,
    #[case] uri: &str,
    #[case] name: &str,
) {
    let result = context
        .resources
        .registry()
        .register(uri, text_resource(uri, name, "body"));

    assert!(matches!(
        result,
        Err(RegistryError::InvalidIdentifier { kind: "resource", .. })
    ));
}

#[rstest]
fn resource_without_known_mime_type_fails_validation(context: TestContext) {
    let factory = Arc::new(StaticResourceFactory::new(
        ProviderDescriptor::resource("config:settings", "settings", "Settings", "settings"),
        ResourceBody::Text("{}".to_owned()),
    ));

    let result = context.resources.registry().register("config:settings", factory);

    assert!(matches!(
        result,
        Err(RegistryError::ValidationFailed { kind: "resource", .. })
    ));
}

#[rstest]
fn list_is_ordered_by_key_and_unregister_forgets_entry(context: TestContext) {
    for name in ["zeta", "alpha", "mid"] {
        context
            .tools
            .register(name, echo_tool(name))
            .expect("registration should succeed");
    }

    let keys: Vec<String> = context
        .tools
        .list()
        .expect("list entries")
        .iter()
        .map(|entry| entry.key().to_owned())
        .collect();
    assert_eq!(keys, ["alpha", "mid", "zeta"]);

    let removed = context.tools.unregister("mid").expect("unregister");
    assert_eq!(removed.key(), "mid");
    assert!(matches!(
        context.tools.unregister("mid"),
        Err(RegistryError::NotFound { .. })
    ));
    assert!(matches!(
        context.tools.get_factory("mid"),
        Err(RegistryError::NotFound { .. })
    ));
}

#[rstest]
fn registered_factory_is_returned_unchanged(context: TestContext) {
    let factory = echo_tool("echo");
    context
        .tools
        .register("echo", factory.clone())
        .expect("registration should succeed");

    let stored = context.tools.get_factory("echo").expect("factory lookup");

    assert_eq!(stored.descriptor(), factory.descriptor());
}
