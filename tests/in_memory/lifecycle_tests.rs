//! Lazy builds, explicit transitions, restart and the running toggle.

use super::helpers::{TestContext, context, echo_tool, stopped_context};
use armature::catalog::domain::ProviderStatus;
use armature::catalog::ports::{CreateContext, ProviderError};
use armature::catalog::services::RegistryError;
use armature::tool::adapters::memory::StaticToolFactory;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_get_returns_the_same_instance(context: TestContext) {
    let factory = echo_tool("echo");
    context
        .tools
        .register("echo", factory.clone())
        .expect("registration should succeed");

    let first = context.tools.get("echo").await.expect("first get");
    let second = context.tools.get("echo").await.expect("second get");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.faults().create_count().expect("create count"), 1);
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Loaded
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlapping_first_gets_both_build_and_last_install_wins(context: TestContext) {
    let factory = echo_tool("echo");
    factory
        .faults()
        .set_delay(Some(Duration::from_millis(50)))
        .expect("inject delay");
    context
        .tools
        .register("echo", factory.clone())
        .expect("registration should succeed");

    let (first_result, second_result) =
        tokio::join!(context.tools.get("echo"), context.tools.get("echo"));
    let first = first_result.expect("first overlapping get");
    let second = second_result.expect("second overlapping get");

    assert_eq!(factory.faults().create_count().expect("create count"), 2);
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Loaded
    );
    let installed = context
        .tools
        .instance("echo")
        .expect("instance lookup")
        .expect("an instance is installed");
    assert!(Arc::ptr_eq(&installed, &first) || Arc::ptr_eq(&installed, &second));
    let third = context.tools.get("echo").await.expect("third get");
    assert!(Arc::ptr_eq(&third, &installed));
    assert_eq!(factory.faults().create_count().expect("create count"), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_requires_a_running_registry(stopped_context: TestContext) {
    stopped_context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration works while stopped");

    let result = stopped_context.tools.get("echo").await;

    assert!(matches!(
        result,
        Err(RegistryError::RegistryNotRunning { kind: "tool" })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_after_stop_is_rejected(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    context.tools.get("echo").await.expect("build while running");

    context.tools.stop().expect("stop should succeed");

    assert!(matches!(
        context.tools.get("echo").await,
        Err(RegistryError::RegistryNotRunning { .. })
    ));
    assert!(!context.tools.is_running().expect("running flag"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_key_is_not_found(context: TestContext) {
    assert!(matches!(
        context.tools.get("missing").await,
        Err(RegistryError::NotFound { .. })
    ));
    assert!(matches!(
        context
            .tools
            .transition_status("missing", ProviderStatus::Disabled, &CreateContext::new())
            .await,
        Err(RegistryError::NotFound { .. })
    ));
}

#[rstest]
#[case(ProviderStatus::Active)]
#[case(ProviderStatus::Unknown)]
#[tokio::test(flavor = "multi_thread")]
async fn illegal_transition_from_registered_leaves_entry_unchanged(
    context: TestContext,
    #[case] target: ProviderStatus,
) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    let before = context.tools.entry("echo").expect("entry lookup");

    let result = context
        .tools
        .transition_status("echo", target, &CreateContext::new())
        .await;

    assert!(matches!(
        result,
        Err(RegistryError::InvalidTransition {
            from: ProviderStatus::Registered,
            ..
        })
    ));
    assert_eq!(context.tools.entry("echo").expect("entry lookup"), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_to_current_status_is_a_no_op(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    let before = context.tools.entry("echo").expect("entry lookup");

    context
        .tools
        .transition_status("echo", ProviderStatus::Registered, &CreateContext::new())
        .await
        .expect("same-status transition should succeed");

    assert_eq!(context.tools.entry("echo").expect("entry lookup"), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_entries_refuse_lazy_builds(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    context
        .tools
        .transition_status("echo", ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable should succeed");

    let result = context.tools.get("echo").await;

    assert!(matches!(
        result,
        Err(RegistryError::InvalidTransition {
            from: ProviderStatus::Disabled,
            to: ProviderStatus::Loaded,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validated_entry_becomes_active_and_can_step_back(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    let instance = context.tools.get("echo").await.expect("build");

    let activated = context
        .tools
        .validate_all(&CreateContext::new())
        .await
        .expect("validation should succeed");
    assert_eq!(activated, ["echo"]);
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Active
    );

    context
        .tools
        .transition_status("echo", ProviderStatus::Loaded, &CreateContext::new())
        .await
        .expect("active -> loaded should succeed");
    let same = context.tools.get("echo").await.expect("cached instance");
    assert!(Arc::ptr_eq(&instance, &same));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_is_refused_for_healthy_entries(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");
    context.tools.get("echo").await.expect("build");
    context
        .tools
        .validate_all(&CreateContext::new())
        .await
        .expect("validation should succeed");

    let result = context.tools.restart("echo", &CreateContext::new()).await;

    assert!(matches!(
        result,
        Err(RegistryError::RestartNotAllowed {
            status: ProviderStatus::Active,
            ..
        })
    ));
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Active
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_rebuilds_failed_entry(context: TestContext) {
    let factory = echo_tool("echo");
    context
        .tools
        .register("echo", factory.clone())
        .expect("registration should succeed");
    let original = context.tools.get("echo").await.expect("build");
    factory
        .faults()
        .set_unhealthy("backend offline")
        .expect("inject unhealthy");
    assert!(
        context
            .tools
            .validate_all(&CreateContext::new())
            .await
            .is_err()
    );
    assert_eq!(
        context.tools.status("echo").expect("status lookup"),
        ProviderStatus::Error
    );
    factory.faults().set_healthy().expect("clear unhealthy");

    let rebuilt = context
        .tools
        .restart("echo", &CreateContext::new())
        .await
        .expect("restart should succeed");

    assert!(!Arc::ptr_eq(&original, &rebuilt));
    let entry = context.tools.entry("echo").expect("entry lookup");
    assert_eq!(entry.status(), ProviderStatus::Loaded);
    assert!(entry.last_error().is_none());
    assert_eq!(factory.faults().create_count().expect("create count"), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_restart_lands_in_error(context: TestContext) {
    let factory = echo_tool("echo");
    context
        .tools
        .register("echo", factory.clone())
        .expect("registration should succeed");
    context
        .tools
        .transition_status("echo", ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable should succeed");
    factory.faults().fail_next(1).expect("inject failure");

    let result = context.tools.restart("echo", &CreateContext::new()).await;

    assert!(matches!(result, Err(RegistryError::CreationFailed { .. })));
    let entry = context.tools.entry("echo").expect("entry lookup");
    assert_eq!(entry.status(), ProviderStatus::Error);
    assert!(entry.last_error().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn instance_reporting_another_name_fails_validation(context: TestContext) {
    let factory = Arc::new(StaticToolFactory::echo("echo", "Echoes input").with_reported_name("other"));
    context
        .tools
        .register("echo", factory)
        .expect("registration should succeed");

    let result = context.tools.get("echo").await;

    match result {
        Err(RegistryError::ValidationFailed { violations, .. }) => {
            assert!(violations.has_field("definition.name"));
        }
        Err(other) => panic!("expected validation failure, got {other}"),
        Ok(_) => panic!("mismatched instance should not be installed"),
    }
    assert!(context.tools.instance("echo").expect("instance lookup").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invoke_runs_the_tool_and_maps_tool_errors(context: TestContext) {
    context
        .tools
        .register("echo", echo_tool("echo"))
        .expect("registration should succeed");

    let output = context
        .tools
        .invoke("echo", json!({"text": "hello"}))
        .await
        .expect("invocation should succeed");
    assert_eq!(output["tool"], "echo");
    assert_eq!(output["echo"]["text"], "hello");

    let rejected = context.tools.invoke("echo", json!("not an object")).await;
    assert!(matches!(
        rejected,
        Err(RegistryError::Provider {
            source: ProviderError::InvalidArguments(_),
            ..
        })
    ));
}
