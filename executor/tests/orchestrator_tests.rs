use std::sync::Arc;
use std::time::Duration;

use corelib::{ClaimStatus, FailureKind, UserStatus};
use executor::{BatchReport, Orchestrator, RunError};
use registry::UserRegistry;
use tracing_test::traced_test;

mod mock_api;
use mock_api::{MockCouponApi, users};

fn registry_with(ids: &[&str]) -> anyhow::Result<Arc<UserRegistry>> {
    let reg = Arc::new(UserRegistry::new());
    reg.replace_all(users(ids))?;
    Ok(reg)
}

#[tokio::test]
async fn empty_registry_fails_without_network_calls() {
    let reg = Arc::new(UserRegistry::new());
    let api = Arc::new(MockCouponApi::granting(10));
    let orch = Orchestrator::new(api.clone(), reg);

    let err = orch.run("WELCOME").await.unwrap_err();

    assert!(matches!(err, RunError::PreconditionFailed(_)), "got {err:?}");
    assert_eq!(api.claims(), 0);
    assert!(!orch.is_running());
}

#[tokio::test]
async fn blank_coupon_id_fails_without_network_calls() -> anyhow::Result<()> {
    let reg = registry_with(&["a"])?;
    let api = Arc::new(MockCouponApi::granting(10));
    let orch = Orchestrator::new(api.clone(), reg.clone());

    let err = orch.run("   ").await.unwrap_err();

    assert!(matches!(err, RunError::PreconditionFailed(_)));
    assert_eq!(api.claims(), 0);
    assert_eq!(reg.status_of("a"), Some(UserStatus::Ready));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn limit_of_two_grants_two_of_three() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b", "c"])?;
    let api = Arc::new(
        MockCouponApi::granting(2)
            .with_delay("a", Duration::from_millis(10))
            .with_delay("b", Duration::from_millis(20))
            .with_delay("c", Duration::from_millis(30)),
    );
    let orch = Orchestrator::new(api.clone(), reg.clone());

    let summary = orch.run("WELCOME").await?;

    assert_eq!(summary.total_requests, 3);
    assert_eq!(summary.successful_requests, 2);
    assert_eq!(summary.failed_requests, 1);
    assert!(summary.is_consistent());

    let rejected = &summary.outcomes[2];
    assert_eq!(rejected.user_id, "c");
    assert_eq!(rejected.status, ClaimStatus::Failed);
    assert_eq!(rejected.error.as_deref(), Some("coupon sold out"));
    assert_eq!(rejected.failure_kind, Some(FailureKind::Server));
    assert!(rejected.response.is_none());

    assert!(BatchReport::new(&summary, 2).limit_respected);

    assert_eq!(reg.status_of("a"), Some(UserStatus::Success));
    assert_eq!(reg.status_of("b"), Some(UserStatus::Success));
    assert_eq!(reg.status_of("c"), Some(UserStatus::Failed));
    assert_eq!(api.claims(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn outcomes_follow_snapshot_order_not_settlement_order() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b", "c"])?;
    let api = Arc::new(
        MockCouponApi::granting(3)
            .with_delay("a", Duration::from_millis(300))
            .with_delay("b", Duration::from_millis(10))
            .with_delay("c", Duration::from_millis(100)),
    );
    let orch = Orchestrator::new(api, reg);

    let summary = orch.run("WELCOME").await?;

    let ids: Vec<&str> = summary.outcomes.iter().map(|o| o.user_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert!(summary.outcomes.iter().all(|o| o.is_success()));
    // all claims run side by side: the batch lasts as long as the slowest one
    assert!(summary.duration_ms >= 300 && summary.duration_ms < 600, "{}", summary.duration_ms);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn users_are_testing_when_their_claim_is_sent() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b", "c", "d"])?;
    let api = Arc::new(
        MockCouponApi::granting(4)
            .with_default_delay(Duration::from_millis(5))
            .observing(reg.clone()),
    );
    let orch = Orchestrator::new(api.clone(), reg.clone());

    orch.run("WELCOME").await?;

    let seen = api.status_at_call.lock().unwrap().clone();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|(_, s)| *s == Some(UserStatus::Testing)), "{seen:?}");
    assert_eq!(reg.status_counts().success, 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelling_reverts_users_and_yields_no_summary() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b", "c"])?;
    let api = Arc::new(
        MockCouponApi::granting(3)
            .with_default_delay(Duration::from_secs(10))
            .with_delay("a", Duration::from_millis(10)),
    );
    let orch = Arc::new(Orchestrator::new(api, reg.clone()));

    let runner = tokio::spawn({
        let orch = orch.clone();
        async move { orch.run("WELCOME").await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(orch.is_running());
    assert_eq!(reg.status_of("a"), Some(UserStatus::Success));
    assert_eq!(reg.status_counts().testing, 2);

    assert!(orch.cancel());
    assert!(!orch.cancel(), "second cancel is a no-op");

    let res = runner.await?;
    assert!(matches!(res, Err(RunError::Cancelled)), "got {res:?}");

    assert_eq!(reg.status_counts().ready, 3);
    assert!(!orch.is_running());
    assert!(!orch.cancel());
    Ok(())
}

#[tokio::test]
async fn cancel_without_a_run_is_a_noop() -> anyhow::Result<()> {
    let reg = registry_with(&["a"])?;
    let orch = Orchestrator::new(Arc::new(MockCouponApi::granting(1)), reg.clone());

    assert!(!orch.cancel());
    assert_eq!(reg.status_of("a"), Some(UserStatus::Ready));

    // a later run is unaffected
    let summary = orch.run("WELCOME").await?;
    assert_eq!(summary.successful_requests, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timed_out_claim_is_a_failed_outcome() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b"])?;
    let api = Arc::new(MockCouponApi::granting(2).timing_out("b"));
    let orch = Orchestrator::new(api, reg.clone());

    let summary = orch.run("WELCOME").await?;

    assert_eq!(summary.failed_requests, 1);
    let b = &summary.outcomes[1];
    assert_eq!(b.failure_kind, Some(FailureKind::Timeout));
    assert_eq!(b.error.as_deref(), Some("timeout of 10000ms exceeded"));
    assert_eq!(reg.status_of("b"), Some(UserStatus::Failed));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dead_claim_task_aborts_the_run_and_resets_users() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b", "c"])?;
    let api = Arc::new(
        MockCouponApi::granting(3)
            .with_default_delay(Duration::from_millis(20))
            .panicking_for("b"),
    );
    let orch = Orchestrator::new(api, reg.clone());

    let err = orch.run("WELCOME").await.unwrap_err();

    match err {
        RunError::Orchestration(msg) => assert!(msg.contains("user b"), "{msg}"),
        other => panic!("expected orchestration error, got {other:?}"),
    }
    assert_eq!(reg.status_counts().ready, 3);
    assert!(!orch.is_running());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn second_run_while_one_is_in_flight_is_rejected() -> anyhow::Result<()> {
    let reg = registry_with(&["a"])?;
    let api = Arc::new(MockCouponApi::granting(1).with_default_delay(Duration::from_secs(1)));
    let orch = Arc::new(Orchestrator::new(api.clone(), reg));

    let runner = tokio::spawn({
        let orch = orch.clone();
        async move { orch.run("WELCOME").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = orch.run("WELCOME").await.unwrap_err();
    assert!(matches!(err, RunError::AlreadyRunning));

    let summary = runner.await??;
    assert_eq!(summary.total_requests, 1);
    assert_eq!(api.claims(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn finished_batch_is_logged_with_counts() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b"])?;
    let orch = Orchestrator::new(Arc::new(MockCouponApi::granting(1)), reg);

    orch.run("WELCOME").await?;

    assert!(logs_contain("coupon claim batch finished"));
    assert!(logs_contain("successful=1"));
    Ok(())
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn slow_batch_is_flagged_on_the_performance_target() -> anyhow::Result<()> {
    let reg = registry_with(&["a", "b"])?;
    let api = Arc::new(MockCouponApi::granting(2).with_default_delay(Duration::from_secs(31)));
    let orch = Orchestrator::new(api, reg);

    let summary = orch.run("WELCOME").await?;

    assert_eq!(summary.duration_ms, 31_000);
    assert!(logs_contain("slow operation detected"));
    assert!(logs_contain("label=\"coupon_batch\""));
    Ok(())
}
