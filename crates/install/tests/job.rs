//! Install job wrapper and batch planning

mod common;

use bpi_errors::{Error, InstallError};
use bpi_events::{AppEvent, EventMessage, EventReceiver, InstallEvent};
use bpi_install::{BatchPlanner, InstallJob, InstallOutcome, InstallRequest, PlanSet, JOB_NAME};
use bpi_types::{InstallAction, InstallOptions};
use common::Harness;

fn drain(rx: &mut EventReceiver) -> Vec<EventMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

fn install_events(messages: &[EventMessage]) -> Vec<&InstallEvent> {
    messages
        .iter()
        .filter_map(|m| match &m.event {
            AppEvent::Install(event) => Some(event),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_job_reports_progress_events() {
    let h = Harness::new().await;
    let (tx, mut rx) = bpi_events::channel();
    let artifact = h.artifact("ruby.zip", Some("cflinuxfs4"), "ruby");
    let plan = h
        .planner()
        .plan("ruby", &artifact, InstallOptions::default(), &PlanSet::new())
        .await
        .unwrap();

    let job = InstallJob::new(plan, h.executor().with_event_sender(tx));
    assert_eq!(job.job_name(), JOB_NAME);
    assert_eq!(job.job_name(), "buildpack_installer");
    assert_eq!(job.max_attempts(), 1);

    let outcome = job.perform().await.unwrap();
    let messages = drain(&mut rx);
    let events = install_events(&messages);

    assert!(matches!(
        events.first(),
        Some(InstallEvent::Started { name, action: InstallAction::Create }) if name == "ruby"
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, InstallEvent::Created { name, .. } if name == "ruby")));
    assert!(events.iter().any(|e| matches!(
        e,
        InstallEvent::Uploaded { stack: Some(stack), changed: true, .. } if stack == "cflinuxfs4"
    )));
    assert!(matches!(
        events.last(),
        Some(InstallEvent::Completed { guid, created: true, .. }) if guid == outcome.guid()
    ));

    let install_messages = messages
        .iter()
        .filter(|m| matches!(m.event, AppEvent::Install(_)));
    for message in install_messages {
        assert_eq!(message.meta.correlation_id.as_deref(), Some("ruby"));
    }
}

#[tokio::test]
async fn test_job_reports_locked_skip() {
    let h = Harness::new().await;
    let seeded = h.seed("go", None).await;
    h.lock(&seeded).await;
    let (tx, mut rx) = bpi_events::channel();
    let artifact = h.artifact("go.zip", None, "go");
    let plan = h
        .planner()
        .plan("go", &artifact, InstallOptions::default(), &PlanSet::new())
        .await
        .unwrap();

    let outcome = InstallJob::new(plan, h.executor().with_event_sender(tx))
        .perform()
        .await
        .unwrap();
    assert!(matches!(outcome, InstallOutcome::LockedSkip { .. }));

    let messages = drain(&mut rx);
    assert!(matches!(
        install_events(&messages).last(),
        Some(InstallEvent::Skipped { guid, .. }) if *guid == seeded.guid
    ));
}

#[tokio::test]
async fn test_job_reports_failure_and_propagates() {
    let h = Harness::new().await;
    h.seed("node", None).await;
    h.seed("node", None).await;
    let (tx, mut rx) = bpi_events::channel();
    let artifact = h.artifact("node.zip", Some("cflinuxfs4"), "node");
    let plan = h
        .planner()
        .plan("node", &artifact, InstallOptions::default(), &PlanSet::new())
        .await
        .unwrap();

    let err = InstallJob::new(plan, h.executor().with_event_sender(tx))
        .with_max_attempts(3)
        .perform()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::AmbiguousTarget { count: 2, .. })
    ));

    let messages = drain(&mut rx);
    let failed = install_events(&messages)
        .into_iter()
        .find_map(|e| match e {
            InstallEvent::Failed { failure, .. } => Some(failure.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(failed.code.as_deref(), Some("install.ambiguous_target"));
    assert!(!failed.retryable);
}

#[tokio::test]
async fn test_batch_claims_upgrade_targets() {
    let h = Harness::new().await;
    let stackless = h.seed("java", None).await;
    let requests = vec![
        InstallRequest::new("java", h.artifact("java-fs3.zip", Some("cflinuxfs3"), "java")),
        InstallRequest::new("java", h.artifact("java-fs4.zip", Some("cflinuxfs4"), "java"))
            .with_options(InstallOptions::default().with_enabled(false)),
    ];

    let planner = h.planner();
    let mut batch = BatchPlanner::new(&planner);
    let plans = batch.plan_all(&requests).await.unwrap();

    assert_eq!(plans[0].action, InstallAction::Upgrade);
    assert_eq!(plans[1].action, InstallAction::Create);
    assert_eq!(plans[1].options.enabled, Some(false));
    assert_eq!(batch.plan_set().len(), 1);
    assert!(batch.plan_set().contains(&stackless));

    let executor = h.executor();
    for plan in &plans {
        executor.execute(plan).await.unwrap();
    }
    let stacks: Vec<_> = h
        .state
        .find_by_name("java")
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.stack)
        .collect();
    assert_eq!(
        stacks,
        vec![Some("cflinuxfs3".to_string()), Some("cflinuxfs4".to_string())]
    );
}

#[tokio::test]
async fn test_batch_stops_at_duplicate() {
    let h = Harness::new().await;
    h.seed("php", None).await;
    let artifact = h.artifact("php.zip", None, "php");
    let requests = vec![
        InstallRequest::new("php", artifact.clone()),
        InstallRequest::new("php", artifact),
    ];

    let planner = h.planner();
    let err = BatchPlanner::new(&planner)
        .plan_all(&requests)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_install(),
        Some(&InstallError::DuplicateInstall {
            name: "php".to_string(),
            stack: None,
        })
    );
}
