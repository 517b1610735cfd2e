use notchy::{DismissPolicy, DisplayMode, SurfaceCall};
use std::time::Duration;
use tokio::time::sleep;

mod test_utils;
use test_utils::{EventBuilder, id, priorities, queue_ids, spawn_monitor};

/// Worked scenarios for queue ordering, timers and compaction
mod scenarios {
    use super::*;

    #[tokio::test]
    async fn higher_priority_post_takes_the_head() {
        let (monitor, _surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).priority(50).build()).await;
        monitor.post_event(EventBuilder::new(2).priority(80).build()).await;

        assert_eq!(queue_ids(&monitor), vec![id(2), id(1)]);
        assert_eq!(
            DisplayMode::from_events(&monitor.active_events()),
            DisplayMode::Event(id(2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_empties_queue_and_compacts_once() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor
            .post_event(EventBuilder::new(1).priority(50).auto_dismiss_after(4.0).build())
            .await;

        sleep(Duration::from_millis(3900)).await;
        assert!(monitor.has_events());

        sleep(Duration::from_millis(200)).await;
        assert!(!monitor.has_events());
        assert_eq!(
            DisplayMode::from_events(&monitor.active_events()),
            DisplayMode::Context
        );
        assert_eq!(surface.compact_count(), 1);
    }

    #[tokio::test]
    async fn dismissing_one_of_equal_priority_leaves_the_other() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).priority(50).build()).await;
        monitor.post_event(EventBuilder::new(2).priority(50).build()).await;
        assert_eq!(queue_ids(&monitor), vec![id(1), id(2)]);

        monitor.dismiss_event(id(1)).await;

        assert_eq!(queue_ids(&monitor), vec![id(2)]);
        assert_eq!(
            DisplayMode::from_events(&monitor.active_events()),
            DisplayMode::Event(id(2))
        );
        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test]
    async fn dismiss_all_compacts_exactly_once() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).priority(90).build()).await;
        monitor.dismiss_all().await;

        assert!(!monitor.has_events());
        assert_eq!(surface.compact_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn preemption_then_lower_event_expires_underneath() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor
            .post_event(EventBuilder::new(1).priority(60).auto_dismiss_after(3.0).build())
            .await;
        sleep(Duration::from_secs(1)).await;

        monitor.post_event(EventBuilder::new(2).priority(95).build()).await;
        assert_eq!(
            DisplayMode::from_events(&monitor.active_events()),
            DisplayMode::Event(id(2))
        );

        sleep(Duration::from_millis(2100)).await;

        assert_eq!(queue_ids(&monitor), vec![id(2)]);
        assert_eq!(
            DisplayMode::from_events(&monitor.active_events()),
            DisplayMode::Event(id(2))
        );
        assert_eq!(surface.compact_count(), 0);
    }
}

/// Invariants that hold for any sequence of operations
mod properties {
    use super::*;

    #[tokio::test]
    async fn queue_stays_sorted_with_stable_ties() {
        let (monitor, _surface) = spawn_monitor(DismissPolicy::CompactFirst);

        let posts = [(1, 30), (2, 90), (3, 50), (4, 90), (5, 10), (6, 70), (7, 50)];
        for (n, priority) in posts {
            monitor
                .post_event(EventBuilder::new(n).priority(priority).build())
                .await;

            let current = priorities(&monitor);
            assert!(
                current.windows(2).all(|pair| pair[0] >= pair[1]),
                "queue out of order: {current:?}"
            );
        }

        assert_eq!(
            queue_ids(&monitor),
            vec![id(2), id(4), id(6), id(3), id(7), id(1), id(5)]
        );
    }

    #[tokio::test]
    async fn dismiss_is_idempotent() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).priority(40).build()).await;
        monitor.post_event(EventBuilder::new(2).priority(60).build()).await;

        monitor.dismiss_event(id(1)).await;
        let once = queue_ids(&monitor);
        monitor.dismiss_event(id(1)).await;

        assert_eq!(queue_ids(&monitor), once);
        assert_eq!(once, vec![id(2)]);
        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dismiss_cancels_the_timer() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor
            .post_event(EventBuilder::new(1).auto_dismiss_after(4.0).build())
            .await;
        sleep(Duration::from_secs(2)).await;
        monitor.dismiss_event(id(1)).await;

        let after_dismiss = surface.calls();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(surface.calls(), after_dismiss);
        assert_eq!(
            after_dismiss,
            vec![
                SurfaceCall::Expand,
                SurfaceCall::CompactStarted,
                SurfaceCall::CompactFinished
            ]
        );
    }

    #[tokio::test]
    async fn last_event_stays_visible_while_compacting() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor.post_event(EventBuilder::new(1).build()).await;

        surface.hold_compact();
        let dismissing = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.dismiss_event(id(1)).await })
        };

        surface.compact_started().await;
        assert_eq!(monitor.current_event().map(|e| e.id()), Some(id(1)));

        surface.release_compact();
        dismissing.await.unwrap();

        assert!(monitor.current_event().is_none());
        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::Expand,
                SurfaceCall::CompactStarted,
                SurfaceCall::CompactFinished
            ]
        );
    }
}

mod edge_cases {
    use super::*;

    #[tokio::test]
    async fn dismiss_all_on_empty_queue_does_not_compact() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.dismiss_all().await;

        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test]
    async fn dismiss_all_with_many_events_compacts_once() {
        for policy in [DismissPolicy::CompactFirst, DismissPolicy::Immediate] {
            let (monitor, surface) = spawn_monitor(policy);
            for n in 1..=3 {
                monitor
                    .post_event(EventBuilder::new(n).priority(n as u8 * 10).build())
                    .await;
            }

            monitor.dismiss_all().await;

            assert!(!monitor.has_events());
            assert_eq!(surface.compact_count(), 1, "policy {policy:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_all_cancels_pending_timers() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor
            .post_event(EventBuilder::new(1).auto_dismiss_after(2.0).build())
            .await;
        monitor
            .post_event(EventBuilder::new(2).auto_dismiss_after(3.0).build())
            .await;

        monitor.dismiss_all().await;
        monitor.post_event(EventBuilder::new(3).build()).await;
        sleep(Duration::from_secs(5)).await;

        assert_eq!(queue_ids(&monitor), vec![id(3)]);
        assert_eq!(surface.compact_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_without_delay_arms_nothing() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor
            .post_event(EventBuilder::new(1).auto_dismiss_without_delay().build())
            .await;
        sleep(Duration::from_secs(600)).await;

        assert_eq!(queue_ids(&monitor), vec![id(1)]);
        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test]
    async fn expand_fires_on_every_post() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).priority(90).build()).await;
        monitor.post_event(EventBuilder::new(2).priority(10).build()).await;

        assert_eq!(surface.expand_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_id_is_appended() {
        let (monitor, _surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.post_event(EventBuilder::new(1).build()).await;
        monitor.post_event(EventBuilder::new(1).build()).await;

        assert_eq!(queue_ids(&monitor), vec![id(1), id(1)]);
    }

    #[tokio::test]
    async fn post_during_compaction_is_applied_after_it() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor.post_event(EventBuilder::new(1).build()).await;

        surface.hold_compact();
        let dismissing = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.dismiss_event(id(1)).await })
        };
        surface.compact_started().await;

        let posting = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.post_event(EventBuilder::new(2).build()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(queue_ids(&monitor), vec![id(1)]);

        surface.release_compact();
        dismissing.await.unwrap();
        posting.await.unwrap();

        assert_eq!(queue_ids(&monitor), vec![id(2)]);
        assert_eq!(surface.expand_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_silent_after_shutdown() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor
            .post_event(EventBuilder::new(1).auto_dismiss_after(1.0).build())
            .await;

        monitor.shutdown().await;
        sleep(Duration::from_secs(2)).await;

        assert_eq!(surface.compact_count(), 0);
        monitor.dismiss_event(id(1)).await;
        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_silent_after_all_handles_drop() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor
            .post_event(EventBuilder::new(1).auto_dismiss_after(1.0).build())
            .await;

        drop(monitor);
        sleep(Duration::from_secs(2)).await;

        assert_eq!(surface.compact_count(), 0);
    }
}
