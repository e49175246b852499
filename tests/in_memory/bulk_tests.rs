//! Bulk load and validation with partial failures.

use super::helpers::{TestContext, context, echo_tool, stopped_context, text_resource};
use armature::catalog::domain::ProviderStatus;
use armature::catalog::ports::CreateContext;
use armature::catalog::services::RegistryError;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_all_builds_every_registered_entry(context: TestContext) {
    for name in ["alpha", "beta", "gamma"] {
        context
            .tools
            .register(name, echo_tool(name))
            .expect("registration should succeed");
    }

    let loaded = context
        .tools
        .load_all(&CreateContext::new())
        .await
        .expect("bulk load should succeed");

    assert_eq!(loaded, ["alpha", "beta", "gamma"]);
    for entry in context.tools.list().expect("list entries") {
        assert_eq!(entry.status(), ProviderStatus::Loaded);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_all_reports_each_failure_and_keeps_going(context: TestContext) {
    let broken = echo_tool("beta");
    broken.faults().fail_next(1).expect("inject failure");
    context
        .tools
        .register("alpha", echo_tool("alpha"))
        .expect("registration should succeed");
    context
        .tools
        .register("beta", broken.clone())
        .expect("registration should succeed");
    context
        .tools
        .register("gamma", echo_tool("gamma"))
        .expect("registration should succeed");

    let err = context
        .tools
        .load_all(&CreateContext::new())
        .await
        .expect_err("one factory fails");

    assert!(matches!(err, RegistryError::Aggregate { kind: "tool", .. }));
    let failed: Vec<&str> = err
        .failures()
        .iter()
        .map(|failure| failure.key.as_str())
        .collect();
    assert_eq!(failed, ["beta"]);

    let beta = context.tools.entry("beta").expect("entry lookup");
    assert_eq!(beta.status(), ProviderStatus::Error);
    assert!(beta.last_error().is_some_and(|reason| reason.contains("injected")));
    for healthy in ["alpha", "gamma"] {
        assert_eq!(
            context.tools.status(healthy).expect("status lookup"),
            ProviderStatus::Loaded
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_all_skips_entries_that_are_not_registered(context: TestContext) {
    let alpha = echo_tool("alpha");
    context
        .tools
        .register("alpha", alpha.clone())
        .expect("registration should succeed");
    context
        .tools
        .register("beta", echo_tool("beta"))
        .expect("registration should succeed");
    context.tools.get("alpha").await.expect("build alpha");
    context
        .tools
        .transition_status("beta", ProviderStatus::Disabled, &CreateContext::new())
        .await
        .expect("disable beta");

    let loaded = context
        .tools
        .load_all(&CreateContext::new())
        .await
        .expect("nothing left to load");

    assert!(loaded.is_empty());
    assert_eq!(alpha.faults().create_count().expect("create count"), 1);
    assert_eq!(
        context.tools.status("beta").expect("status lookup"),
        ProviderStatus::Disabled
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_operations_require_a_running_registry(stopped_context: TestContext) {
    let context = CreateContext::new();

    assert!(matches!(
        stopped_context.tools.load_all(&context).await,
        Err(RegistryError::RegistryNotRunning { .. })
    ));
    assert!(matches!(
        stopped_context.resources.registry().validate_all(&context).await,
        Err(RegistryError::RegistryNotRunning { kind: "resource" })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validate_all_marks_unhealthy_instances_as_error(context: TestContext) {
    let notes = text_resource("file:///srv/notes.txt", "notes", "remember");
    let todo = text_resource("file:///srv/todo.txt", "todo", "ship it");
    context
        .resources
        .registry()
        .register("file:///srv/notes.txt", notes.clone())
        .expect("registration should succeed");
    context
        .resources
        .registry()
        .register("file:///srv/todo.txt", todo)
        .expect("registration should succeed");
    context
        .resources
        .registry()
        .load_all(&CreateContext::new())
        .await
        .expect("bulk load should succeed");
    notes
        .faults()
        .set_unhealthy("disk unmounted")
        .expect("inject unhealthy");

    let err = context
        .resources
        .registry()
        .validate_all(&CreateContext::new())
        .await
        .expect_err("one resource is unhealthy");

    assert_eq!(err.failures().len(), 1);
    assert_eq!(
        err.failures().first().map(|failure| failure.key.as_str()),
        Some("file:///srv/notes.txt")
    );
    assert_eq!(
        context
            .resources
            .registry()
            .status("file:///srv/notes.txt")
            .expect("status lookup"),
        ProviderStatus::Error
    );
    assert_eq!(
        context
            .resources
            .registry()
            .status("file:///srv/todo.txt")
            .expect("status lookup"),
        ProviderStatus::Active
    );
}
