//! Translation of topic mutation intents into transaction bodies.
//!
//! # Rules
//! - A parameter the caller did not supply is omitted, never sent as empty
//! - Blank memo strings count as "not supplied"
//! - Clearing is an explicit instruction, distinct from omission

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::keys::PublicKey;
use crate::ledger::{AccountId, TopicId};
use crate::transaction::chunking::ChunkPolicy;
use crate::transaction::types::{
    FieldUpdate, MessageSubmitBody, TopicCreateBody, TopicDeleteBody, TopicUpdateBody, TransactionBody,
};

/// Parameters for creating a topic. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicCreateOptions {
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub memo: Option<String>,
    pub auto_renew_account_id: Option<AccountId>,
    pub auto_renew_period: Option<Duration>,
}

/// Sparse set of changes to one topic.
///
/// Each clearable field is `Keep`, `Set` or `Clear`; expiration time and
/// auto-renew period can only be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicUpdate {
    pub admin_key: FieldUpdate<PublicKey>,
    pub submit_key: FieldUpdate<PublicKey>,
    pub memo: FieldUpdate<String>,
    pub auto_renew_account_id: FieldUpdate<AccountId>,
    pub auto_renew_period: Option<Duration>,
    pub expiration_time: Option<DateTime<Utc>>,
}

impl TopicUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_admin_key(mut self, key: PublicKey) -> Self {
        self.admin_key = FieldUpdate::Set(key);
        self
    }

    pub fn clear_admin_key(mut self) -> Self {
        self.admin_key = FieldUpdate::Clear;
        self
    }

    pub fn set_submit_key(mut self, key: PublicKey) -> Self {
        self.submit_key = FieldUpdate::Set(key);
        self
    }

    pub fn clear_submit_key(mut self) -> Self {
        self.submit_key = FieldUpdate::Clear;
        self
    }

    pub fn set_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = FieldUpdate::Set(memo.into());
        self
    }

    pub fn clear_memo(mut self) -> Self {
        self.memo = FieldUpdate::Clear;
        self
    }

    pub fn set_auto_renew_account_id(mut self, account_id: AccountId) -> Self {
        self.auto_renew_account_id = FieldUpdate::Set(account_id);
        self
    }

    pub fn clear_auto_renew_account_id(mut self) -> Self {
        self.auto_renew_account_id = FieldUpdate::Clear;
        self
    }

    pub fn set_auto_renew_period(mut self, period: Duration) -> Self {
        self.auto_renew_period = Some(period);
        self
    }

    pub fn set_expiration_time(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration_time = Some(expiration);
        self
    }

    /// True when the request would change nothing once blank values are dropped.
    pub fn is_empty(&self) -> bool {
        self.admin_key.is_keep()
            && self.submit_key.is_keep()
            && normalize_memo(self.memo.clone()).is_keep()
            && self.auto_renew_account_id.is_keep()
            && self.auto_renew_period.is_none()
            && self.expiration_time.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn normalize_memo(memo: FieldUpdate<String>) -> FieldUpdate<String> {
    match memo {
        FieldUpdate::Set(value) if value.trim().is_empty() => FieldUpdate::Keep,
        other => other,
    }
}

/// Body for a topic create.
pub fn create_topic(options: &TopicCreateOptions) -> TransactionBody {
    TransactionBody::TopicCreate(TopicCreateBody {
        admin_key: options.admin_key,
        submit_key: options.submit_key,
        memo: non_blank(options.memo.as_deref()),
        auto_renew_account_id: options.auto_renew_account_id,
        auto_renew_period: options.auto_renew_period,
    })
}

/// Body for a topic update.
pub fn update_topic(topic_id: TopicId, update: TopicUpdate) -> TransactionBody {
    TransactionBody::TopicUpdate(TopicUpdateBody {
        topic_id,
        admin_key: update.admin_key,
        submit_key: update.submit_key,
        memo: normalize_memo(update.memo),
        auto_renew_account_id: update.auto_renew_account_id,
        auto_renew_period: update.auto_renew_period,
        expiration_time: update.expiration_time,
    })
}

/// Body for a topic delete.
pub fn delete_topic(topic_id: TopicId) -> TransactionBody {
    TransactionBody::TopicDelete(TopicDeleteBody { topic_id })
}

/// Body for a message submit. Segmentation happens when the body is sent.
pub fn submit_message(topic_id: TopicId, message: &[u8], chunking: ChunkPolicy) -> TransactionBody {
    TransactionBody::MessageSubmit(MessageSubmitBody {
        topic_id,
        message: message.to_vec(),
        chunking,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;

    fn topic() -> TopicId {
        TopicId::new(0, 0, 42)
    }

    #[test]
    fn test_create_omits_unsupplied_fields() {
        let body = create_topic(&TopicCreateOptions::default());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "topic_create" }));
    }

    #[test]
    fn test_create_blank_memo_is_omitted() {
        for memo in ["", "   ", "\t"] {
            let body = create_topic(&TopicCreateOptions {
                memo: Some(memo.to_string()),
                ..Default::default()
            });
            match body {
                TransactionBody::TopicCreate(create) => assert_eq!(create.memo, None),
                other => panic!("unexpected body {other:?}"),
            }
        }
    }

    #[test]
    fn test_create_carries_supplied_fields() {
        let key = PrivateKey::generate().public_key();
        let body = create_topic(&TopicCreateOptions {
            admin_key: Some(key),
            memo: Some("My First Topic".to_string()),
            auto_renew_period: Some(Duration::from_secs(30 * 86_400)),
            ..Default::default()
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["memo"], "My First Topic");
        assert_eq!(json["admin_key"], key.to_string());
        assert_eq!(json["auto_renew_period"], 2_592_000);
        assert!(json.get("submit_key").is_none());
        assert!(json.get("auto_renew_account_id").is_none());
    }

    #[test]
    fn test_update_only_targeted_field_present() {
        let body = update_topic(topic(), TopicUpdate::new().set_memo("hello"));
        let json = serde_json::to_value(&body).unwrap();
        let object = json.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["kind", "memo", "topic_id"]);
        assert_eq!(json["memo"]["set"], "hello");
    }

    #[test]
    fn test_update_clear_is_explicit() {
        let body = update_topic(topic(), TopicUpdate::new().clear_submit_key());
        match body {
            TransactionBody::TopicUpdate(update) => {
                assert_eq!(update.submit_key, FieldUpdate::Clear);
                assert!(update.admin_key.is_keep());
                assert!(update.memo.is_keep());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_update_blank_memo_dropped() {
        let update = TopicUpdate::new().set_memo("  ");
        assert!(update.is_empty());
        match update_topic(topic(), update) {
            TransactionBody::TopicUpdate(body) => assert!(body.memo.is_keep()),
            other => panic!("unexpected body {other:?}"),
        }
        assert!(!TopicUpdate::new().clear_memo().is_empty());
    }

    #[test]
    fn test_submit_body_carries_policy() {
        let policy = ChunkPolicy { chunk_size: 10, max_chunks: 3 };
        match submit_message(topic(), b"hello", policy) {
            TransactionBody::MessageSubmit(body) => {
                assert_eq!(body.message, b"hello");
                assert_eq!(body.chunking, policy);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::keys::PrivateKey;
    use proptest::prelude::*;
    use serde_json::Value;
    use std::collections::BTreeSet;

    fn arb_field<T: Clone + std::fmt::Debug + 'static>(
        value: impl Strategy<Value = T> + 'static,
    ) -> impl Strategy<Value = FieldUpdate<T>> {
        prop_oneof![
            Just(FieldUpdate::Keep),
            value.prop_map(FieldUpdate::Set),
            Just(FieldUpdate::Clear),
        ]
    }

    fn arb_key() -> impl Strategy<Value = PublicKey> {
        any::<[u8; 32]>().prop_map(|bytes| PrivateKey::from_bytes(bytes).public_key())
    }

    fn arb_account() -> impl Strategy<Value = AccountId> {
        (0u64..3, 0u64..3, 1u64..100_000).prop_map(|(shard, realm, num)| AccountId::new(shard, realm, num))
    }

    fn arb_memo() -> impl Strategy<Value = String> {
        prop_oneof!["[a-z][a-z0-9 ]{0,20}", " {0,3}"]
    }

    fn arb_update() -> impl Strategy<Value = TopicUpdate> {
        (
            arb_field(arb_key()),
            arb_field(arb_key()),
            arb_field(arb_memo()),
            arb_field(arb_account()),
            proptest::option::of((1u64..10_000_000).prop_map(Duration::from_secs)),
            proptest::option::of((0i64..4_000_000_000).prop_map(|secs| {
                DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
            })),
        )
            .prop_map(
                |(admin_key, submit_key, memo, auto_renew_account_id, auto_renew_period, expiration_time)| TopicUpdate {
                    admin_key,
                    submit_key,
                    memo,
                    auto_renew_account_id,
                    auto_renew_period,
                    expiration_time,
                },
            )
    }

    /// JSON field name for each clearable field that should reach the wire.
    fn expected_fields(update: &TopicUpdate) -> BTreeSet<&'static str> {
        let mut fields: BTreeSet<&'static str> = ["kind", "topic_id"].into_iter().collect();
        let memo_sent = match &update.memo {
            FieldUpdate::Set(memo) => !memo.trim().is_empty(),
            FieldUpdate::Clear => true,
            FieldUpdate::Keep => false,
        };
        for (name, sent) in [
            ("admin_key", !update.admin_key.is_keep()),
            ("submit_key", !update.submit_key.is_keep()),
            ("memo", memo_sent),
            ("auto_renew_account_id", !update.auto_renew_account_id.is_keep()),
            ("auto_renew_period", update.auto_renew_period.is_some()),
            ("expiration_time", update.expiration_time.is_some()),
        ] {
            if sent {
                fields.insert(name);
            }
        }
        fields
    }

    fn assert_encoding<T>(json: &Value, name: &str, field: &FieldUpdate<T>) -> Result<(), TestCaseError> {
        match field {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(_) => {
                if let Some(value) = json.get(name) {
                    prop_assert!(value.get("set").is_some(), "{} not encoded as set: {}", name, value);
                }
            }
            FieldUpdate::Clear => prop_assert_eq!(&json[name], &Value::from("clear")),
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_update_body_carries_exactly_supplied_fields(update in arb_update()) {
            let expected = expected_fields(&update);
            let json = serde_json::to_value(update_topic(TopicId::new(0, 0, 42), update.clone())).unwrap();
            let object = json.as_object().unwrap();
            let actual: BTreeSet<&str> = object.keys().map(String::as_str).collect();

            prop_assert_eq!(actual, expected);
            prop_assert_eq!(&json["kind"], &Value::from("topic_update"));
            assert_encoding(&json, "admin_key", &update.admin_key)?;
            assert_encoding(&json, "submit_key", &update.submit_key)?;
            assert_encoding(&json, "memo", &update.memo)?;
            assert_encoding(&json, "auto_renew_account_id", &update.auto_renew_account_id)?;
        }

        #[test]
        fn prop_empty_update_sends_nothing(update in arb_update()) {
            prop_assert_eq!(update.is_empty(), expected_fields(&update).len() == 2);
        }
    }
}
