/*!
 * User Registry Integration Tests
 *
 * Covers allow-list gating, lazy user creation, delivery address updates and
 * the mapping of store outcomes to access errors.
 */

mod common;

use common::*;
use expense_bot::error::{AccessError, DenyReason};
use expense_bot::store::UserStore;
use expense_bot::users::UserRegistry;
use std::collections::HashSet;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn creates_user_on_first_contact() {
    let (store, _temp_dir) = setup_test_environment().await;

    let id = assert_ok!(
        test_registry()
            .authorize_and_resolve(&store, ALLOWED_USER, CHAT_ID)
            .await
    );

    let user = store
        .find_user(ALLOWED_USER)
        .await
        .expect("Failed to read user")
        .expect("User row should exist");
    assert_eq!(user.id, id);
    assert_eq!(user.delivery_address, CHAT_ID);
    assert_eq!(count_rows(&store, "users").await, 1);
}

#[tokio::test]
async fn returns_same_id_and_updates_delivery_address() {
    let (store, _temp_dir) = setup_test_environment().await;
    let registry = test_registry();

    let first = assert_ok!(registry.authorize_and_resolve(&store, ALLOWED_USER, CHAT_ID).await);
    let second = assert_ok!(registry.authorize_and_resolve(&store, ALLOWED_USER, 7777).await);

    assert_eq!(first, second);
    assert_eq!(count_rows(&store, "users").await, 1);
    let user = store.find_user(ALLOWED_USER).await.unwrap().unwrap();
    assert_eq!(user.delivery_address, 7777);
}

#[tokio::test]
async fn stranger_is_denied_without_touching_the_store() {
    let (store, _temp_dir) = setup_test_environment().await;
    let failing = FailingStore::new(store);
    failing.fail(Op::FindUser);
    failing.fail(Op::InsertUser);

    let err = assert_err!(
        test_registry()
            .authorize_and_resolve(&failing, STRANGER, CHAT_ID)
            .await
    );

    assert!(matches!(err, AccessError::Denied(DenyReason::NotAllowed)));
    assert_eq!(count_rows(&failing.inner, "users").await, 0);
}

#[tokio::test]
async fn rejected_creation_means_not_provisioned() {
    let (store, _temp_dir) = setup_test_environment().await;

    let err = assert_err!(
        test_registry()
            .authorize_and_resolve(&store, UNPROVISIONED_USER, CHAT_ID)
            .await
    );

    assert!(matches!(err, AccessError::Denied(DenyReason::NotProvisioned)));
    assert_eq!(count_rows(&store, "users").await, 0);
}

#[tokio::test]
async fn removal_from_allow_list_denies_existing_user() {
    let (store, _temp_dir) = setup_test_environment().await;
    create_test_user(&store).await;

    let narrowed = UserRegistry::new(HashSet::from([UNPROVISIONED_USER]));
    let err = assert_err!(
        narrowed
            .authorize_and_resolve(&store, ALLOWED_USER, CHAT_ID)
            .await
    );

    assert!(matches!(err, AccessError::Denied(DenyReason::NotAllowed)));
    assert_eq!(count_rows(&store, "users").await, 1);
}

#[tokio::test]
async fn store_failures_are_not_denials() {
    let (store, _temp_dir) = setup_test_environment().await;
    let failing = FailingStore::new(store);

    failing.fail(Op::FindUser);
    let err = assert_err!(
        test_registry()
            .authorize_and_resolve(&failing, ALLOWED_USER, CHAT_ID)
            .await
    );
    assert!(matches!(err, AccessError::Store(_)));

    failing.recover();
    failing.fail(Op::InsertUser);
    let err = assert_err!(
        test_registry()
            .authorize_and_resolve(&failing, ALLOWED_USER, CHAT_ID)
            .await
    );
    assert!(matches!(err, AccessError::Store(_)));
    assert_eq!(count_rows(&failing.inner, "users").await, 0);
}

#[tokio::test]
async fn concurrent_first_contacts_resolve_to_one_user() {
    let (store, _temp_dir) = setup_test_environment().await;
    let slow = FailingStore::new(store);
    slow.delay_lookups(Duration::from_millis(20));
    let registry = test_registry();

    let (first, second) = tokio::join!(
        registry.authorize_and_resolve(&slow, ALLOWED_USER, CHAT_ID),
        registry.authorize_and_resolve(&slow, ALLOWED_USER, CHAT_ID),
    );

    let first = assert_ok!(first);
    let second = assert_ok!(second);
    assert_eq!(first, second);
    assert_eq!(count_rows(&slow.inner, "users").await, 1);
}

#[tokio::test]
async fn concurrent_contacts_from_unprovisioned_identity_stay_denied() {
    let (store, _temp_dir) = setup_test_environment().await;
    let slow = FailingStore::new(store);
    slow.delay_lookups(Duration::from_millis(20));
    let registry = test_registry();

    let (first, second) = tokio::join!(
        registry.authorize_and_resolve(&slow, UNPROVISIONED_USER, CHAT_ID),
        registry.authorize_and_resolve(&slow, UNPROVISIONED_USER, CHAT_ID),
    );

    for result in [first, second] {
        let err = assert_err!(result);
        assert!(matches!(err, AccessError::Denied(DenyReason::NotProvisioned)));
    }
    assert_eq!(count_rows(&slow.inner, "users").await, 0);
}
