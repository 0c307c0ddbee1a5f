//! Dashboard read path: caching, invalidation fan-out, and degraded reads.

mod helpers;

use helpers::world::World;
use taskboard::domain::models::{NewTask, Role, Section, TaskStatus};
use taskboard::domain::ports::{KeyValueStore, TaskRepository, TaskScope};
use taskboard::services::CacheKeyDeriver;

#[tokio::test]
async fn test_repeated_reads_within_tier_compute_once() {
    let world = World::new().await;
    let admin = world.user(Role::Admin).await;
    let member = world.user(Role::Member).await;
    world
        .tasks_service
        .create(member.id, NewTask::with_title("Draft budget").assigned_to(member.id))
        .await
        .unwrap();

    let first = world.dashboard.get_aggregate(admin.subject()).await.unwrap();
    let second = world.dashboard.get_aggregate(admin.subject()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(world.computes_for(TaskScope::All), 1);
}

#[tokio::test]
async fn test_privileged_cohort_sees_mutation_on_next_read() {
    let world = World::new().await;
    let admin = world.user(Role::Admin).await;
    let manager = world.user(Role::Manager).await;
    let member = world.user(Role::Member).await;

    let before = world.dashboard.get_aggregate(manager.subject()).await.unwrap();
    assert_eq!(before.count_for(TaskStatus::Pending), 0);

    world
        .tasks_service
        .create(member.id, NewTask::with_title("Ship release"))
        .await
        .unwrap();

    let manager_view = world.dashboard.get_aggregate(manager.subject()).await.unwrap();
    let admin_view = world.dashboard.get_aggregate(admin.subject()).await.unwrap();
    assert_eq!(manager_view.count_for(TaskStatus::Pending), 1);
    assert_eq!(admin_view.count_for(TaskStatus::Pending), 1);
    assert_eq!(manager_view.recent_activity.len(), 1);
}

#[tokio::test]
async fn test_mutation_leaves_unrelated_member_cache_alone() {
    let world = World::new().await;
    let alice = world.user(Role::Member).await;
    let bob = world.user(Role::Member).await;

    world.dashboard.get_aggregate(alice.subject()).await.unwrap();
    world.dashboard.get_aggregate(bob.subject()).await.unwrap();

    let bob_key = CacheKeyDeriver::personal_key(Role::Member, bob.id, 0).section(Section::Aggregates);
    let alice_key = CacheKeyDeriver::personal_key(Role::Member, alice.id, 0).section(Section::Aggregates);
    assert!(world.store.contains_key(&bob_key));
    assert!(world.store.contains_key(&alice_key));

    world
        .tasks_service
        .create(alice.id, NewTask::with_title("Alice's errand"))
        .await
        .unwrap();

    assert!(world.store.contains_key(&bob_key));
    assert!(!world.store.contains_key(&alice_key));

    let alice_view = world.dashboard.get_aggregate(alice.subject()).await.unwrap();
    let bob_view = world.dashboard.get_aggregate(bob.subject()).await.unwrap();
    assert_eq!(alice_view.count_for(TaskStatus::Pending), 1);
    assert_eq!(bob_view.count_for(TaskStatus::Pending), 0);
    assert_eq!(world.computes_for(TaskScope::Participant(alice.id)), 2);
    assert_eq!(world.computes_for(TaskScope::Participant(bob.id)), 1);
}

#[tokio::test]
async fn test_assignee_sees_new_assignment() {
    let world = World::new().await;
    let manager = world.user(Role::Manager).await;
    let member = world.user(Role::Member).await;

    let before = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert!(before.assigned_incomplete.is_empty());

    world
        .tasks_service
        .create(manager.id, NewTask::with_title("Review contract").assigned_to(member.id))
        .await
        .unwrap();

    let after = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(after.assigned_incomplete.len(), 1);
    assert_eq!(after.assigned_incomplete[0].title, "Review contract");
    assert_eq!(after.assigned_incomplete[0].creator.id, manager.id);
}

#[tokio::test]
async fn test_member_completion_moves_counts() {
    let world = World::new().await;
    let member = world.user_with_id(7, Role::Member).await;

    let mut open = Vec::new();
    for i in 0..3 {
        let task = world
            .tasks_service
            .create(member.id, NewTask::with_title(format!("Open {i}")))
            .await
            .unwrap();
        open.push(task.id);
    }
    for i in 0..2 {
        world
            .tasks_service
            .create(member.id, NewTask::with_title(format!("Done {i}")).with_status(TaskStatus::Completed))
            .await
            .unwrap();
    }

    let before = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(before.count_for(TaskStatus::Pending), 3);
    assert_eq!(before.count_for(TaskStatus::Completed), 2);

    world.tasks_service.complete(open[0], member.id).await.unwrap();

    let after = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(after.count_for(TaskStatus::Pending), 2);
    assert_eq!(after.count_for(TaskStatus::Completed), 3);
}

#[tokio::test]
async fn test_dashboard_served_while_store_down() {
    let world = World::new().await;
    let admin = world.user(Role::Admin).await;
    world
        .tasks_service
        .create(admin.id, NewTask::with_title("Patch servers"))
        .await
        .unwrap();

    world.store.set_available(false);
    let first = world.dashboard.get_aggregate(admin.subject()).await.unwrap();
    let second = world.dashboard.get_aggregate(admin.subject()).await.unwrap();

    assert_eq!(first.count_for(TaskStatus::Pending), 1);
    assert_eq!(first, second);
    assert_eq!(world.computes_for(TaskScope::All), 2);
    world.store.set_available(true);
    let shared = CacheKeyDeriver::shared_key(Role::Admin).section(Section::Aggregates);
    assert!(!world.store.contains_key(&shared));
}

#[tokio::test]
async fn test_cohort_invalidation_retires_member_keys() {
    let world = World::new().await;
    let member = world.user(Role::Member).await;

    world.dashboard.get_aggregate(member.subject()).await.unwrap();
    world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(world.computes_for(TaskScope::Participant(member.id)), 1);

    let report = world.invalidation.invalidate(Role::Member, None).await;
    assert!(report.is_clean());

    world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(world.computes_for(TaskScope::Participant(member.id)), 2);
    let retired = CacheKeyDeriver::personal_key(Role::Member, member.id, 0).section(Section::Aggregates);
    let current = CacheKeyDeriver::personal_key(Role::Member, member.id, 1).section(Section::Aggregates);
    assert!(world.store.contains_key(&retired));
    assert!(world.store.contains_key(&current));
}

#[tokio::test]
async fn test_cohort_invalidation_recovers_from_corrupt_version_token() {
    let world = World::new().await;
    let member = world.user(Role::Member).await;
    world.store.set("version/member", "corrupt", None).await.unwrap();

    let before = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(before.count_for(TaskStatus::Pending), 0);

    // Written straight to the repository, so no mutation-driven eviction runs.
    world.tasks.create(member.id, &NewTask::with_title("Backfilled")).await.unwrap();

    let report = world.invalidation.invalidate(Role::Member, None).await;
    assert!(report.is_clean());
    assert_eq!(report.advanced.len(), 1);

    let after = world.dashboard.get_aggregate(member.subject()).await.unwrap();
    assert_eq!(after.count_for(TaskStatus::Pending), 1);

    let again = world.invalidation.invalidate(Role::Member, None).await;
    assert!(again.is_clean());
    assert_eq!(again.advanced[0].value, report.advanced[0].value + 1);
}
