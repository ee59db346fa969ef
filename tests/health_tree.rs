//! End-to-end behavior of composed check trees.

use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::{self, Instant};

use service_health::config::parse_config;
use service_health::health::build_tree;
use service_health::{
    AsyncCheck, Check, Context, DelayedErrorCheck, GroupedCheck, HealthError, HealthResult,
    StaticCheck, Status,
};

mod common;
use common::{ScriptedCheck, Step};

#[tokio::test]
async fn test_degraded_scenario_renders_as_expected() {
    let root = GroupedCheck::new("root")
        .with_check(StaticCheck::degraded("A", "bees are tired"))
        .with_check(StaticCheck::healthy("B"));

    let result = root.check(&Context::background()).await.expect("no error for degraded");
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "status": "degraded",
            "services": {
                "A": { "status": "degraded", "message": "bees are tired" },
                "B": { "status": "healthy" }
            }
        })
    );
}

#[tokio::test]
async fn test_debounced_child_keeps_group_stable() {
    let flaky = ScriptedCheck::new(
        "queue",
        vec![Step::Healthy, Step::Fail("timeout"), Step::Fail("timeout"), Step::Fail("timeout")],
    );
    let root = GroupedCheck::new("root")
        .with_check(DelayedErrorCheck::new(flaky, 2))
        .with_check(StaticCheck::healthy("api"));
    let ctx = Context::background();

    for _ in 0..3 {
        let result = root.check(&ctx).await.unwrap();
        assert_eq!(result.status, Some(Status::Healthy));
    }

    let failure = root.check(&ctx).await.unwrap_err();
    assert_eq!(failure.result.status, Some(Status::PartiallyUnhealthy));
    assert_eq!(failure.result.services["queue"].message, "timeout");
    assert_eq!(failure.result.services["api"].status, Some(Status::Healthy));
}

#[tokio::test(start_paused = true)]
async fn test_async_children_answer_from_cache() {
    let slow_db = ScriptedCheck::new("db", vec![Step::Healthy]).with_delay(Duration::from_secs(2));
    let db_calls = slow_db.calls();
    let db = AsyncCheck::new(slow_db, Duration::from_secs(10));

    let ctx = Context::background();
    db.start(&ctx).await;
    assert_eq!(db_calls.load(Ordering::SeqCst), 1);

    let root = GroupedCheck::new("root")
        .with_check(db.clone())
        .with_check(StaticCheck::healthy("api"));

    let start = Instant::now();
    let result = root.check(&ctx).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(100));
    assert_eq!(result.status, Some(Status::Healthy));
    assert_eq!(db_calls.load(Ordering::SeqCst), 1);

    db.stop();
}

#[tokio::test(start_paused = true)]
async fn test_cached_check_ignores_caller_cancellation() {
    let inner = GroupedCheck::new("deps")
        .with_check(ScriptedCheck::new("db", vec![Step::Degraded("replica lag")]));
    let cached = AsyncCheck::new(inner, Duration::from_secs(30));
    cached.start(&Context::background()).await;

    let caller = Context::background();
    caller.cancel();
    let result = cached.check(&caller).await.unwrap();
    assert_eq!(result.status, Some(Status::Degraded));
    assert_eq!(result.services["db"].message, "replica lag");

    cached.stop();
}

#[tokio::test(start_paused = true)]
async fn test_background_failure_is_served_until_recovery() {
    let probe = ScriptedCheck::new(
        "cache",
        vec![Step::Healthy, Step::Fail("evicted"), Step::Healthy],
    );
    let check = AsyncCheck::new(probe, Duration::from_secs(1));
    let ctx = Context::background();

    check.start(&ctx).await;
    assert_eq!(check.check(&ctx).await, Ok(HealthResult::healthy()));

    let err = check.force_update_status(&ctx).await.unwrap_err();
    assert_eq!(err, HealthError::probe("evicted"));
    for _ in 0..3 {
        let failure = check.check(&ctx).await.unwrap_err();
        assert_eq!(failure.error, HealthError::probe("evicted"));
    }

    check.force_update_status(&ctx).await.unwrap();
    assert_eq!(check.check(&ctx).await, Ok(HealthResult::healthy()));
    ctx.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_deadline_propagates_through_nested_groups() {
    let stuck =
        ScriptedCheck::new("stuck", vec![Step::Healthy]).with_delay(Duration::from_secs(600));
    let stuck_calls = stuck.calls();
    let inner = GroupedCheck::new("inner")
        .with_check(stuck)
        .with_check(StaticCheck::healthy("ok"));
    let root = GroupedCheck::new("root")
        .with_check(inner)
        .with_check(StaticCheck::healthy("api"));

    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let start = Instant::now();
    let failure = root.check(&ctx).await.unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(failure.error.is_cancellation());
    assert_eq!(failure.result.services["api"].status, Some(Status::Healthy));
    assert!(matches!(
        failure.result.services["inner"].status,
        Some(Status::PartiallyUnhealthy) | Some(Status::Unhealthy)
    ));

    time::sleep(Duration::from_secs(900)).await;
    assert_eq!(stuck_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_config_built_tree() {
    let config = parse_config(
        r#"
        [tree]
        kind = "group"
        name = "root"

        [[tree.checks]]
        kind = "async"
        interval_ms = 500
        check = { kind = "static", name = "db", status = "healthy" }

        [[tree.checks]]
        kind = "delayed"
        max_ignored_errors = 1
        check = { kind = "static", name = "search", status = "unhealthy", message = "index missing" }
        "#,
    )
    .unwrap();

    let tree = build_tree(&config.tree);
    let ctx = Context::background();
    tree.start(&ctx).await;

    let failure = tree.root.check(&ctx).await.unwrap_err();
    assert_eq!(failure.result.status, Some(Status::PartiallyUnhealthy));
    assert_eq!(failure.result.services["db"].status, Some(Status::Healthy));
    assert_eq!(failure.result.services["search"].message, "index missing");

    tree.stop();
}
