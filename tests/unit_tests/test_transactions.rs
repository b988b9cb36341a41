// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use oxidrop::{
    error::ServerError,
    models::{
        transaction::{FileInfo, TargetStatus},
        user::MinimalUser,
    },
    transactions::manager::TransactionManager,
};

fn peer(name: &str) -> MinimalUser {
    MinimalUser {
        username: name.to_string(),
        public_key: format!("pk-{name}"),
    }
}

fn file(name: &str) -> FileInfo {
    FileInfo {
        name: name.to_string(),
        size: 100,
        mime: "application/octet-stream".to_string(),
    }
}

#[tokio::test]
async fn test_create_starts_empty() {
    let manager = TransactionManager::new();

    let created = manager.create(peer("alice")).await;
    assert!(!created.id.is_empty());
    assert_eq!(created.sender, peer("alice"));
    assert!(created.targets.is_empty());
    assert!(created.files.is_empty());
    assert!(!created.started);

    let fetched = manager.get(&created.id).await.expect("present after create");
    assert_eq!(fetched.id, created.id);
    assert!(manager.get("no-such-id").await.is_none());
}

#[tokio::test]
async fn test_only_the_sender_mutates() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;

    let err = manager
        .set_targets(&t.id, "pk-mallory", vec![peer("bob")])
        .await
        .expect_err("non-sender target update");
    assert!(matches!(err, ServerError::Unauthorized));

    let err = manager
        .set_files(&t.id, "pk-mallory", vec![file("a.bin")])
        .await
        .expect_err("non-sender file update");
    assert!(matches!(err, ServerError::Unauthorized));

    let err = manager
        .start(&t.id, "pk-mallory")
        .await
        .expect_err("non-sender start");
    assert!(matches!(err, ServerError::Unauthorized));

    let err = manager
        .delete(&t.id, "pk-mallory")
        .await
        .expect_err("non-sender delete");
    assert!(matches!(err, ServerError::Unauthorized));

    let err = manager
        .targets(&t.id, "pk-mallory")
        .await
        .expect_err("non-sender target view");
    assert!(matches!(err, ServerError::Unauthorized));

    // Nothing moved.
    let unchanged = manager.get(&t.id).await.expect("still present");
    assert!(unchanged.targets.is_empty());
    assert!(unchanged.files.is_empty());
    assert!(!unchanged.started);
}

#[tokio::test]
async fn test_set_targets_resets_to_pending() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;

    let updated = manager
        .set_targets(&t.id, "pk-alice", vec![peer("bob"), peer("carol")])
        .await
        .expect("sender sets targets");
    assert_eq!(updated.targets.len(), 2);
    assert!(
        updated
            .targets
            .iter()
            .all(|target| target.status == TargetStatus::Pending)
    );
    assert_eq!(updated.targets[0].user, peer("bob"));
    assert_eq!(updated.targets[1].user, peer("carol"));

    let err = manager
        .set_targets(&t.id, "pk-alice", vec![])
        .await
        .expect_err("empty target list");
    assert!(matches!(err, ServerError::MalformedInput));
}

#[tokio::test]
async fn test_set_files_rejects_empty_sets() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;

    let err = manager
        .set_files(&t.id, "pk-alice", vec![])
        .await
        .expect_err("empty file list");
    assert!(matches!(err, ServerError::MalformedInput));

    let updated = manager
        .set_files(&t.id, "pk-alice", vec![file("a.bin"), file("b.bin")])
        .await
        .expect("sender sets files");
    assert_eq!(updated.files.len(), 2);
}

#[tokio::test]
async fn test_target_answers_at_most_once() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;
    manager
        .set_targets(&t.id, "pk-alice", vec![peer("bob"), peer("carol")])
        .await
        .expect("targets set");

    let outcome = manager
        .respond(&t.id, "pk-bob", true)
        .await
        .expect("first answer recorded");
    assert!(outcome.accepted);
    assert_eq!(outcome.transaction.targets[0].status, TargetStatus::Accepted);

    let err = manager
        .respond(&t.id, "pk-bob", false)
        .await
        .expect_err("second answer refused");
    assert!(matches!(err, ServerError::DuplicateResponse));

    let outcome = manager
        .respond(&t.id, "pk-carol", false)
        .await
        .expect("decline recorded");
    assert!(!outcome.accepted);
    assert_eq!(outcome.transaction.targets[1].status, TargetStatus::Declined);

    let err = manager
        .respond(&t.id, "pk-mallory", true)
        .await
        .expect_err("non-target refused");
    assert!(matches!(err, ServerError::Unauthorized));

    let err = manager
        .respond("no-such-id", "pk-bob", true)
        .await
        .expect_err("absent transaction");
    assert!(matches!(err, ServerError::NotFound("transaction")));
}

#[tokio::test]
async fn test_start_keeps_accepted_targets_in_order() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;
    manager
        .set_targets(
            &t.id,
            "pk-alice",
            vec![peer("bob"), peer("carol"), peer("dave"), peer("erin")],
        )
        .await
        .expect("targets set");

    manager.respond(&t.id, "pk-bob", true).await.expect("bob accepts");
    manager
        .respond(&t.id, "pk-carol", false)
        .await
        .expect("carol declines");
    manager
        .respond(&t.id, "pk-erin", true)
        .await
        .expect("erin accepts");
    // dave never answers.

    let started = manager.start(&t.id, "pk-alice").await.expect("start succeeds");
    assert!(started.started);
    let kept: Vec<&str> = started
        .targets
        .iter()
        .map(|target| target.user.username.as_str())
        .collect();
    assert_eq!(kept, ["bob", "erin"], "accepted targets only, original order");
}

#[tokio::test]
async fn test_no_transitions_after_start() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;
    manager
        .set_targets(&t.id, "pk-alice", vec![peer("bob"), peer("carol")])
        .await
        .expect("targets set");
    manager.respond(&t.id, "pk-bob", true).await.expect("bob accepts");
    manager.start(&t.id, "pk-alice").await.expect("start succeeds");

    let err = manager
        .respond(&t.id, "pk-carol", true)
        .await
        .expect_err("late answer refused");
    assert!(matches!(err, ServerError::AlreadyStarted));

    let err = manager
        .start(&t.id, "pk-alice")
        .await
        .expect_err("second start refused");
    assert!(matches!(err, ServerError::AlreadyStarted));

    let err = manager
        .set_targets(&t.id, "pk-alice", vec![peer("dave")])
        .await
        .expect_err("target set is frozen");
    assert!(matches!(err, ServerError::AlreadyStarted));

    let err = manager
        .set_files(&t.id, "pk-alice", vec![file("late.bin")])
        .await
        .expect_err("file set is frozen");
    assert!(matches!(err, ServerError::AlreadyStarted));
}

#[tokio::test]
async fn test_delete_returns_the_final_snapshot() {
    let manager = TransactionManager::new();
    let t = manager.create(peer("alice")).await;
    manager
        .set_targets(&t.id, "pk-alice", vec![peer("bob")])
        .await
        .expect("targets set");

    let removed = manager.delete(&t.id, "pk-alice").await.expect("delete succeeds");
    assert_eq!(removed.targets.len(), 1, "snapshot keeps the target list");
    assert!(manager.get(&t.id).await.is_none());

    let err = manager
        .delete(&t.id, "pk-alice")
        .await
        .expect_err("second delete");
    assert!(matches!(err, ServerError::NotFound("transaction")));
}

#[tokio::test]
async fn test_remove_by_sender_scopes_to_one_owner() {
    let manager = TransactionManager::new();
    let a1 = manager.create(peer("alice")).await;
    let a2 = manager.create(peer("alice")).await;
    let b1 = manager.create(peer("bob")).await;

    let removed = manager.remove_by_sender("pk-alice").await;
    let mut ids: Vec<&str> = removed.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    let mut expected = [a1.id.as_str(), a2.id.as_str()];
    expected.sort_unstable();
    assert_eq!(ids, expected);

    assert!(manager.get(&b1.id).await.is_some(), "other senders untouched");
    assert_eq!(manager.len().await, 1);
}
