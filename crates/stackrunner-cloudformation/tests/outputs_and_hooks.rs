mod common;

use common::{Call, FakeControlPlane, FakeStack, STACK, TEMPLATE, reconciler};
use stackrunner_cloudformation::{
    write_outputs, ChangeSetHooks, DeployOutcome, StackError, StackOutput, StackStatus,
};

#[tokio::test]
async fn outputs_are_written_with_control_plane_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outputs.json");
    let mut url = StackOutput::new("ServiceUrl", "https://demo.example.com");
    url.export_name = Some("demo-url".to_string());
    let cp = FakeControlPlane::with_stack(
        FakeStack::new(StackStatus::CreateComplete)
            .with_outputs(vec![url, StackOutput::new("QueueArn", "arn:aws:sqs:demo")]),
    );

    let outputs = write_outputs(cp.as_ref(), STACK, &path).await.unwrap();

    assert_eq!(outputs.len(), 2);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json[0]["OutputKey"], "ServiceUrl");
    assert_eq!(json[0]["OutputValue"], "https://demo.example.com");
    assert_eq!(json[0]["ExportName"], "demo-url");
    assert!(json[1].get("Description").is_none());
}

#[tokio::test]
async fn outputs_of_a_missing_stack_are_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cp = FakeControlPlane::empty();

    let err = write_outputs(cp.as_ref(), STACK, &dir.path().join("outputs.json"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn dry_run_writes_inputs_and_never_executes() {
    let hooks_dir = tempfile::tempdir().unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    let cp = FakeControlPlane::with_stack(
        FakeStack::new(StackStatus::UpdateComplete).with_template("Resources: {}"),
    );
    let reconciler = reconciler(&cp)
        .with_dry_run(true)
        .with_hooks(ChangeSetHooks::new(hooks_dir.path(), work_dir.path()));

    let outcome = reconciler.deploy(STACK, TEMPLATE).await.unwrap();

    assert!(matches!(outcome, DeployOutcome::DryRun { .. }));
    assert_eq!(cp.count(&Call::ExecuteChangeSet), 0);
    assert_eq!(
        std::fs::read_to_string(work_dir.path().join("current-template.yaml")).unwrap(),
        "Resources: {}"
    );
    assert_eq!(
        std::fs::read_to_string(work_dir.path().join("cfn.yaml")).unwrap(),
        TEMPLATE
    );
    let change_set: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(work_dir.path().join("change-set.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(change_set["Status"], "CREATE_COMPLETE");
}

#[tokio::test]
async fn dry_run_without_hooks_still_never_executes() {
    let cp = FakeControlPlane::with_stack(
        FakeStack::new(StackStatus::UpdateComplete).with_template("Resources: {}"),
    );
    let reconciler = reconciler(&cp).with_dry_run(true);

    let outcome = reconciler.deploy(STACK, TEMPLATE).await.unwrap();

    match outcome {
        DeployOutcome::DryRun { change_set } => assert_eq!(change_set.changes.len(), 1),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(cp.change_sets_created(), 1);
    assert_eq!(cp.count(&Call::ExecuteChangeSet), 0);
    assert_eq!(cp.count(&Call::GetTemplate), 0);
    assert_eq!(cp.stack().unwrap().template, "Resources: {}");
}

#[cfg(unix)]
mod executable_hooks {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use super::*;

    fn install_hook(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn pre_apply_hook_receives_the_three_inputs() {
        let hooks_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let record = work_dir.path().join("args.txt");
        install_hook(
            hooks_dir.path(),
            "pre-change-set-apply",
            &format!("echo \"$1 $2 $3\" > {}", record.display()),
        );
        let cp = FakeControlPlane::empty();
        let reconciler = reconciler(&cp)
            .with_hooks(ChangeSetHooks::new(hooks_dir.path(), work_dir.path()));

        let outcome = reconciler.deploy(STACK, TEMPLATE).await.unwrap();

        assert!(outcome.is_applied());
        let args = std::fs::read_to_string(&record).unwrap();
        assert!(args.contains("current-template.yaml"));
        assert!(args.contains("cfn.yaml"));
        assert!(args.contains("change-set.json"));
    }

    #[tokio::test]
    async fn failing_hook_aborts_before_execution() {
        let hooks_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        install_hook(
            hooks_dir.path(),
            "pre-change-set-apply",
            "echo 'replacement of Database is not allowed' >&2; exit 3",
        );
        let cp = FakeControlPlane::empty();
        let reconciler = reconciler(&cp)
            .with_hooks(ChangeSetHooks::new(hooks_dir.path(), work_dir.path()));

        let err = reconciler.deploy(STACK, TEMPLATE).await.unwrap_err();

        match err {
            StackError::Hook { hook, message } => {
                assert_eq!(hook, "pre-change-set-apply");
                assert!(message.contains("replacement of Database is not allowed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cp.count(&Call::ExecuteChangeSet), 0);
    }

    #[tokio::test]
    async fn non_executable_hook_is_skipped() {
        let hooks_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let path = hooks_dir.path().join("pre-change-set-apply");
        std::fs::write(&path, "#!/bin/sh\nexit 1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let cp = FakeControlPlane::empty();
        let reconciler = reconciler(&cp)
            .with_hooks(ChangeSetHooks::new(hooks_dir.path(), work_dir.path()));

        let outcome = reconciler.deploy(STACK, TEMPLATE).await.unwrap();

        assert!(outcome.is_applied());
    }
}

#[cfg(unix)]
mod dry_run_hooks {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[tokio::test]
    async fn only_the_dry_run_hook_runs() {
        let hooks_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let ran = work_dir.path().join("ran.txt");
        for name in ["pre-change-set-apply", "dry-run"] {
            let path = hooks_dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\necho {name} >> {}\n", ran.display()))
                .unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let cp = FakeControlPlane::empty();
        let reconciler = reconciler(&cp)
            .with_dry_run(true)
            .with_hooks(ChangeSetHooks::new(hooks_dir.path(), work_dir.path()));

        let outcome = reconciler.deploy(STACK, TEMPLATE).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::DryRun { .. }));
        assert_eq!(std::fs::read_to_string(&ran).unwrap(), "dry-run\n");
        assert_eq!(cp.count(&Call::ExecuteChangeSet), 0);
    }
}
