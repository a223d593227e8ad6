//! Topic create, update, clear and delete against the simulated ledger.

mod common;

use chrono::Utc;
use std::time::Duration;

use common::{harness, harness_with, OPERATOR_ACCOUNT};
use topic_ledger::keys::PrivateKey;
use topic_ledger::ledger::{SimulatedLedgerConfig, Status, TopicId};
use topic_ledger::topics::{SubmitOptions, TopicError};
use topic_ledger::transaction::{TopicCreateOptions, TopicUpdate};

const DAY: u64 = 24 * 3600;

fn is_entity_id(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[tokio::test]
async fn test_default_create_uses_operator_identity() {
    let h = harness();
    let envelope = h.service.create_topic().await.unwrap();
    assert_eq!(envelope.status(), Status::Success);

    let info = h.service.get_topic_info(*envelope.result()).await.unwrap();
    let operator_key = h.operator_key.public_key();
    assert_eq!(info.admin_key, Some(operator_key));
    assert_eq!(info.submit_key, Some(operator_key));
    assert_eq!(info.auto_renew_account_id, Some(OPERATOR_ACCOUNT));
    assert_eq!(info.auto_renew_period, Duration::from_secs(92 * DAY));
    assert_eq!(info.memo, "");
}

#[tokio::test]
async fn test_create_with_memo_returns_entity_id() {
    let h = harness();
    let envelope = h.service.create_topic_with_memo("My First Topic").await.unwrap();

    assert_eq!(envelope.status().to_string(), "SUCCESS");
    let topic_id = envelope.result().to_string();
    assert!(!topic_id.is_empty());
    assert!(is_entity_id(&topic_id), "unexpected topic id {}", topic_id);
    assert!(envelope.transaction_id().starts_with("0.0.2@"));

    let info = h.service.get_topic_info(*envelope.result()).await.unwrap();
    assert_eq!(info.memo, "My First Topic");
    assert_eq!(info.admin_key, Some(h.operator_key.public_key()));
}

#[tokio::test]
async fn test_blank_create_memo_is_omitted() {
    let h = harness();
    let topic_id = h.service.create_topic_with_memo("   ").await.unwrap().into_result();
    assert_eq!(h.service.get_topic_info(topic_id).await.unwrap().memo, "");
}

#[tokio::test]
async fn test_memo_round_trip() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();

    let envelope = h
        .service
        .update_topic_memo(topic_id, &h.operator_key, "hello")
        .await
        .unwrap();
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.result(), "hello");

    let info = h.service.get_topic_info(topic_id).await.unwrap();
    assert_eq!(info.memo, "hello");
    assert_eq!(info.submit_key, Some(h.operator_key.public_key()));
}

#[tokio::test]
async fn test_delete_without_admin_key_fails() {
    let h = harness();
    let topic_id = h
        .service
        .create_topic_with(TopicCreateOptions {
            memo: Some("immutable".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_result();

    let err = h.service.delete_topic(topic_id, &h.operator_key).await.unwrap_err();
    assert!(matches!(
        err,
        TopicError::TransactionFailed {
            operation: "delete_topic",
            status: Status::Unauthorized
        }
    ));

    let err = h
        .service
        .update_topic_memo(topic_id, &h.operator_key, "changed")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::Unauthorized));
    assert_eq!(h.service.get_topic_info(topic_id).await.unwrap().memo, "immutable");
}

#[tokio::test]
async fn test_update_signed_with_wrong_key_fails() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();
    let stranger = PrivateKey::generate();

    let err = h
        .service
        .update_topic_memo(topic_id, &stranger, "hijacked")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TopicError::TransactionFailed {
            status: Status::InvalidSignature,
            ..
        }
    ));
}

#[tokio::test]
async fn test_key_rotation() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();
    let new_admin = PrivateKey::generate();
    let new_submit = PrivateKey::generate();

    let envelope = h
        .service
        .update_admin_key(topic_id, &h.operator_key, new_admin.public_key())
        .await
        .unwrap();
    assert_eq!(*envelope.result(), new_admin.public_key());

    h.service
        .update_submit_key(topic_id, &new_admin, new_submit.public_key())
        .await
        .unwrap();

    let info = h.service.get_topic_info(topic_id).await.unwrap();
    assert_eq!(info.admin_key, Some(new_admin.public_key()));
    assert_eq!(info.submit_key, Some(new_submit.public_key()));

    // The old admin key no longer authorizes anything.
    let err = h.service.delete_topic(topic_id, &h.operator_key).await.unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidSignature));

    // Submissions now need the new submit key.
    let err = h
        .service
        .submit_message(topic_id, b"no key", SubmitOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidSignature));
    h.service
        .submit_message(
            topic_id,
            b"signed",
            SubmitOptions {
                submit_key: Some(new_submit.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_clear_operations() {
    let h = harness();
    let topic_id = h.service.create_topic_with_memo("to be cleared").await.unwrap().into_result();

    for envelope in [
        h.service.clear_topic_memo(topic_id, &h.operator_key).await.unwrap(),
        h.service.clear_submit_key(topic_id, &h.operator_key).await.unwrap(),
        h.service.clear_auto_renew_account_id(topic_id, &h.operator_key).await.unwrap(),
    ] {
        assert_eq!(envelope.status(), Status::Success);
        assert_eq!(*envelope.result(), topic_id);
    }

    let info = h.service.get_topic_info(topic_id).await.unwrap();
    assert_eq!(info.memo, "");
    assert_eq!(info.submit_key, None);
    assert_eq!(info.auto_renew_account_id, None);
    assert_eq!(info.admin_key, Some(h.operator_key.public_key()));

    h.service.clear_admin_key(topic_id, &h.operator_key).await.unwrap();
    let err = h.service.delete_topic(topic_id, &h.operator_key).await.unwrap_err();
    assert_eq!(err.status(), Some(Status::Unauthorized));
}

#[tokio::test]
async fn test_auto_renew_updates() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();
    let account = h.ledger.create_account();

    let envelope = h
        .service
        .update_auto_renew_account(topic_id, &h.operator_key, account)
        .await
        .unwrap();
    assert_eq!(*envelope.result(), account);

    h.service
        .update_auto_renew_period(topic_id, &h.operator_key, Duration::from_secs(30 * DAY))
        .await
        .unwrap();

    let info = h.service.get_topic_info(topic_id).await.unwrap();
    assert_eq!(info.auto_renew_account_id, Some(account));
    assert_eq!(info.auto_renew_period, Duration::from_secs(30 * DAY));

    let err = h
        .service
        .update_auto_renew_period(topic_id, &h.operator_key, Duration::from_secs(10 * DAY))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::AutorenewDurationNotInRange));

    let err = h
        .service
        .update_auto_renew_account(topic_id, &h.operator_key, "0.0.987654".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidAutoRenewAccount));
}

#[tokio::test]
async fn test_expiration_only_moves_forward() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();
    let current = h.service.get_topic_info(topic_id).await.unwrap().expiration_time;

    let later = current + chrono::Duration::days(10);
    let envelope = h
        .service
        .update_expiration_time(topic_id, &h.operator_key, later)
        .await
        .unwrap();
    assert_eq!(*envelope.result(), later);
    assert_eq!(h.service.get_topic_info(topic_id).await.unwrap().expiration_time, later);

    let err = h
        .service
        .update_expiration_time(topic_id, &h.operator_key, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::ExpirationReductionNotAllowed));
}

#[tokio::test]
async fn test_update_topic_applies_several_fields() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();

    h.service
        .update_topic(
            topic_id,
            &h.operator_key,
            TopicUpdate::new()
                .set_memo("batched")
                .clear_submit_key()
                .set_auto_renew_period(Duration::from_secs(60 * DAY)),
        )
        .await
        .unwrap();

    let info = h.service.get_topic_info(topic_id).await.unwrap();
    assert_eq!(info.memo, "batched");
    assert_eq!(info.submit_key, None);
    assert_eq!(info.auto_renew_period, Duration::from_secs(60 * DAY));
    assert_eq!(info.admin_key, Some(h.operator_key.public_key()));
}

#[tokio::test]
async fn test_deleted_topic_rejects_mutations() {
    let h = harness();
    let topic_id = h.service.create_topic().await.unwrap().into_result();

    let envelope = h.service.delete_topic(topic_id, &h.operator_key).await.unwrap();
    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(*envelope.result(), topic_id);

    let err = h
        .service
        .submit_message(topic_id, b"too late", SubmitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TopicError::TransactionFailed {
            operation: "submit_message",
            status: Status::InvalidTopicId
        }
    ));

    let err = h
        .service
        .update_topic_memo(topic_id, &h.operator_key, "again")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidTopicId));

    let err = h.service.get_topic_info(topic_id).await.unwrap_err();
    assert!(matches!(err, TopicError::Precheck { status: Status::InvalidTopicId, .. }));
}

#[tokio::test]
async fn test_unknown_topic() {
    let h = harness();
    let err = h
        .service
        .delete_topic(TopicId::new(0, 0, 55_555), &h.operator_key)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidTopicId));
}

#[tokio::test]
async fn test_long_memo_fails_precheck() {
    let h = harness();
    let err = h
        .service
        .create_topic_with_memo(&"m".repeat(101))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TopicError::Precheck {
            operation: "create_topic",
            status: Status::MemoTooLong
        }
    ));
}

#[tokio::test]
async fn test_receipt_timeout_is_distinct() {
    let h = harness_with(SimulatedLedgerConfig {
        consensus_delay: Duration::from_millis(300),
        receipt_timeout: Duration::from_millis(20),
        ..Default::default()
    });

    let err = h.service.create_topic().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_submit_timeout_is_distinct() {
    let h = harness_with(SimulatedLedgerConfig {
        ack_delay: Duration::from_millis(300),
        submit_timeout: Duration::from_millis(20),
        ..Default::default()
    });

    let err = h.service.create_topic().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert!(matches!(err, TopicError::Timeout { operation: "create_topic", .. }));
    assert_eq!(err.status(), None);
}
