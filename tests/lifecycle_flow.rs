//! Protocol-level reconciliation flows against a stateful fake engine.

mod common;

use std::sync::Arc;

use common::{seeded_store, FakeInstance};
use rolesmith::engine::PrivilegeSet;
use rolesmith::lifecycle::{
    LifecycleHandler, LifecycleRequest, ReconcileStatus, RequestType, ResourceProperties,
};
use rolesmith::secrets::{InMemorySecretStore, PasswordSpec, SecretStore};

fn request(request_type: RequestType) -> LifecycleRequest {
    LifecycleRequest {
        request_type,
        resource_properties: ResourceProperties {
            forcing_token: Some("2024-06-01T10:00:00Z".to_string()),
        },
    }
}

async fn handler_for(
    store: Arc<InMemorySecretStore>,
    instance: &FakeInstance,
    privileges: PrivilegeSet,
) -> LifecycleHandler {
    LifecycleHandler::new(store, instance.connector(), "RootSecret", "SvcADbUser", privileges)
}

#[tokio::test]
async fn create_provisions_database_user_and_grants() {
    let instance = FakeInstance::new();
    let handler = handler_for(
        seeded_store().await,
        &instance,
        PrivilegeSet::only(["SELECT", "INSERT", "UPDATE"]).unwrap(),
    )
    .await;

    let response = handler.handle(request(RequestType::Create)).await;
    assert_eq!(response.status, ReconcileStatus::Success);

    let state = instance.state();
    assert!(state.databases.contains("svc_a_db"));
    assert!(instance.can_authenticate("svc_a", "initial-pw"));
    assert_eq!(state.grants["svc_a@svc_a_db"], "SELECT, INSERT, UPDATE");
    assert_eq!(state.flushes, 1);
}

#[tokio::test]
async fn create_twice_reaches_the_same_state_without_error() {
    let instance = FakeInstance::new();
    let handler = handler_for(seeded_store().await, &instance, PrivilegeSet::All).await;

    let first = handler.handle(request(RequestType::Create)).await;
    assert_eq!(first.status, ReconcileStatus::Success);
    let mut after_first = instance.state();

    let second = handler.handle(request(RequestType::Create)).await;
    assert_eq!(second.status, ReconcileStatus::Success);

    // The privilege flush count is the only thing that may differ between
    // runs; everything observable about users/databases/grants must not.
    let mut after_second = instance.state();
    after_first.flushes = 0;
    after_second.flushes = 0;
    assert_eq!(after_first, after_second);

    // No duplicate objects: exactly one database, one user, one grant.
    let state = instance.state();
    assert_eq!(state.databases.len(), 1);
    assert_eq!(state.users.len(), 1);
    assert_eq!(state.grants.len(), 1);
}

#[tokio::test]
async fn update_behaves_exactly_like_create() {
    let created = FakeInstance::new();
    let updated = FakeInstance::new();

    handler_for(seeded_store().await, &created, PrivilegeSet::All)
        .await
        .handle(request(RequestType::Create))
        .await;
    handler_for(seeded_store().await, &updated, PrivilegeSet::All)
        .await
        .handle(request(RequestType::Update))
        .await;

    assert_eq!(created.state(), updated.state());
}

#[tokio::test]
async fn rotation_lands_on_the_next_update() {
    let instance = FakeInstance::new();
    let store = seeded_store().await;
    let handler = handler_for(store.clone(), &instance, PrivilegeSet::All).await;

    handler.handle(request(RequestType::Create)).await;
    assert!(instance.can_authenticate("svc_a", "initial-pw"));

    let rotated = store
        .rotate_field("SvcADbUser", "password", &PasswordSpec::default())
        .await
        .unwrap();
    let response = handler.handle(request(RequestType::Update)).await;
    assert_eq!(response.status, ReconcileStatus::Success);

    assert!(!instance.can_authenticate("svc_a", "initial-pw"));
    assert!(instance.can_authenticate("svc_a", &rotated));
}

#[tokio::test]
async fn delete_on_a_clean_instance_succeeds() {
    let instance = FakeInstance::new();
    let handler = handler_for(seeded_store().await, &instance, PrivilegeSet::All).await;

    // Nothing was ever created; the user and database do not exist.
    let response = handler.handle(request(RequestType::Delete)).await;
    assert_eq!(response.status, ReconcileStatus::Success);
    assert!(response.error.is_none());
}

#[tokio::test]
async fn delete_removes_user_and_grants_but_not_database() {
    let instance = FakeInstance::new();
    let handler = handler_for(seeded_store().await, &instance, PrivilegeSet::All).await;

    handler.handle(request(RequestType::Create)).await;
    let response = handler.handle(request(RequestType::Delete)).await;
    assert_eq!(response.status, ReconcileStatus::Success);

    let state = instance.state();
    assert!(!instance.can_authenticate("svc_a", "initial-pw"));
    assert!(state.users.is_empty());
    assert!(state.grants.is_empty());
    // The service database is decommissioned with the stack, not here.
    assert!(state.databases.contains("svc_a_db"));
}

#[tokio::test]
async fn unreachable_instance_maps_to_failed_status() {
    let instance = FakeInstance::new();
    instance.refuse_connections();
    let handler = handler_for(seeded_store().await, &instance, PrivilegeSet::All).await;

    let response = handler.handle(request(RequestType::Create)).await;
    assert_eq!(response.status, ReconcileStatus::Failed);
    assert!(response.error.unwrap().contains("connection refused"));
    assert_eq!(instance.state(), Default::default());
}

#[tokio::test]
async fn failed_invocation_is_redriveable_after_recovery() {
    let instance = FakeInstance::new();
    instance.refuse_connections();
    let store = seeded_store().await;
    let handler = handler_for(store.clone(), &instance, PrivilegeSet::All).await;

    let failed = handler.handle(request(RequestType::Create)).await;
    assert_eq!(failed.status, ReconcileStatus::Failed);

    // The controller retries with a fresh invocation once the instance is
    // reachable again; the handler itself holds no state between the two.
    let recovered = FakeInstance::new();
    let handler = handler_for(store, &recovered, PrivilegeSet::All).await;
    let retried = handler.handle(request(RequestType::Create)).await;
    assert_eq!(retried.status, ReconcileStatus::Success);
    assert!(recovered.can_authenticate("svc_a", "initial-pw"));
}

#[tokio::test]
async fn forcing_token_changes_do_not_change_the_outcome() {
    let instance = FakeInstance::new();
    let handler = handler_for(seeded_store().await, &instance, PrivilegeSet::All).await;

    for token in [Some("2024-06-01T10:00:00Z".to_string()), Some("later".to_string()), None] {
        let response = handler
            .handle(LifecycleRequest {
                request_type: RequestType::Update,
                resource_properties: ResourceProperties { forcing_token: token },
            })
            .await;
        assert_eq!(response.status, ReconcileStatus::Success);
    }
}
