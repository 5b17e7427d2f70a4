// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counter balance, TTL ordering, order ids, and report idempotence.

use fq_core::QueueTtl;
use proptest::prelude::*;

use crate::prelude::*;

const AGENTS: [&str; 3] = ["a1", "a2", "a3"];

#[derive(Debug, Clone)]
enum Step {
    Checkin(usize),
    Report(usize, bool),
    ReportApp(usize, bool),
    Advance(u64),
    Sweep,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..AGENTS.len()).prop_map(Step::Checkin),
        (0..AGENTS.len(), any::<bool>()).prop_map(|(a, ok)| Step::Report(a, ok)),
        (0..2usize, any::<bool>()).prop_map(|(app, ok)| Step::ReportApp(app, ok)),
        (1..8u64).prop_map(Step::Advance),
        Just(Step::Sweep),
    ]
}

fn success(ok: bool) -> &'static str {
    if ok {
        "true"
    } else {
        "false"
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counters_stay_balanced_under_any_event_order(steps in proptest::collection::vec(step(), 1..40)) {
        runtime().block_on(async {
            let ctx = setup();
            let simple = ctx.create(request(Action::Reboot, &AGENTS)).await;
            let install = ctx
                .create(request(Action::InstallOsApps, &["a1"]).apps_for("a1", apps(&["vim", "git"])))
                .await;
            assert_all_balanced(&ctx);

            for step in steps {
                match step {
                    Step::Checkin(a) => {
                        ctx.checkin(AGENTS[a]).await;
                    }
                    Step::Report(a, ok) => {
                        ctx.engine.report_result(result(&simple, AGENTS[a], success(ok))).unwrap();
                    }
                    Step::ReportApp(app, ok) => {
                        let app = ["vim", "git"][app];
                        ctx.engine.report_app_result(app_result(&install, "a1", app, success(ok))).await.unwrap();
                    }
                    Step::Advance(minutes) => ctx.clock.advance(Duration::from_secs(minutes * 60)),
                    Step::Sweep => {
                        ctx.engine.sweep().await;
                    }
                }
                assert_all_balanced(&ctx);
            }
        });
    }

    #[test]
    fn agent_deadline_never_precedes_server_deadline(
        now in 0u64..4_000_000_000_000,
        server in 0u64..10_000,
        agent in 0u64..10_000,
        deadline in proptest::option::of(0u64..4_000_000_000_000),
    ) {
        let ttl = QueueTtl::compute(now, server, agent, deadline);
        prop_assert!(ttl.agent_queue_ttl_ms >= ttl.server_queue_ttl_ms);
    }
}

#[tokio::test]
async fn early_agent_deadline_is_raised_to_server_deadline() {
    let ctx = setup();
    let req = request(Action::Reboot, &["a1"]).agent_deadline_ms(1u64);
    ctx.create(req).await;

    let entry = &ctx.engine.queue(&agent("a1"))[0];
    assert!(entry.ttl.agent_queue_ttl_ms >= entry.ttl.server_queue_ttl_ms);
}

#[tokio::test]
async fn order_ids_increase_and_are_not_reused() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.create(request(Action::Reboot, &["a1", "a2"])).await;
    }

    let delivered = ctx.checkin("a1").await;
    let first: Vec<u64> = delivered.iter().map(|e| e.order_id).collect();
    assert!(first.windows(2).all(|w| w[0] < w[1]), "{first:?}");

    let ids: Vec<_> = delivered.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ctx.engine.ack(&agent("a1"), &ids), 3);

    ctx.create(request(Action::Shutdown, &["a1"])).await;
    let later = ctx.engine.queue(&agent("a1"));
    assert_eq!(later.len(), 1);
    assert!(later[0].order_id > *first.iter().max().unwrap());
}

#[tokio::test]
async fn repeated_reports_change_counters_once() {
    let ctx = setup();
    let simple = ctx.create(request(Action::Reboot, &["a1", "a2"])).await;
    let install = ctx
        .create(request(Action::InstallOsApps, &["a1"]).apps_for("a1", apps(&["vim", "git"])))
        .await;

    let first = ctx.engine.report_result(result(&simple, "a1", "true")).unwrap();
    assert!(!first.duplicate);
    let after_first = ctx.store.operations.get(&simple).unwrap();
    let again = ctx.engine.report_result(result(&simple, "a1", "true")).unwrap();
    assert!(again.duplicate);
    assert_eq!(ctx.store.operations.get(&simple).unwrap().agents, after_first.agents);

    ctx.engine.report_app_result(app_result(&install, "a1", "vim", "true")).await.unwrap();
    let tracker = ctx.store.agents.get(&(install.clone(), agent("a1"))).unwrap();
    let app_again = ctx.engine.report_app_result(app_result(&install, "a1", "vim", "true")).await.unwrap();
    assert!(app_again.duplicate);
    assert_eq!(ctx.store.agents.get(&(install, agent("a1"))).unwrap().apps, tracker.apps);
}
