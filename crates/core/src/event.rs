//! Event-creation payload rules.
//!
//! The rule table is built once per process. [`event_rules`] returns the
//! default table; hosts that need a different media origin build their own
//! with [`build_event_rules`] at startup and share it read-only.

use std::sync::LazyLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Timestamp;
use crate::validation::{
    coerce_and_validate, Constraint, FieldKind, FieldRule, NormalizedRecord, RuleTable,
    ValidationResult,
};

/// Field names as they appear in the request body.
pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const IMG_URL: &str = "imgURL";
    pub const PRICE: &str = "price";
    pub const AGE: &str = "age";
    pub const DATE_TIME: &str = "dateTime";
    pub const LOCATION: &str = "location";
    pub const QUANTITY: &str = "quantity";
    pub const IS_DIGITAL: &str = "isDigital";
    pub const ACTIVE: &str = "active";
}

pub const NAME_MIN_CHARS: usize = 4;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 20;
pub const DESCRIPTION_MAX_CHARS: usize = 5000;
pub const LOCATION_MAX_CHARS: usize = 200;
/// Inclusive ceiling on ticket price.
pub const PRICE_CEILING: f64 = 5000.0;
pub const MAX_AGE_GATE: i64 = 150;

/// Firebase Storage download host; the default approved media origin.
pub const FIREBASE_STORAGE_HOST: &str = "firebasestorage.googleapis.com";

/// Startup-time knobs for the event rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRuleSettings {
    /// Hosts `imgURL` may point at. Matched exactly, case-insensitively.
    pub approved_media_hosts: Vec<String>,
}

impl Default for EventRuleSettings {
    fn default() -> Self {
        Self {
            approved_media_hosts: vec![FIREBASE_STORAGE_HOST.to_string()],
        }
    }
}

/// Build the event-creation rule table.
///
/// Declaration order is the order failures are reported in.
pub fn build_event_rules(settings: &EventRuleSettings) -> Result<RuleTable, CoreError> {
    RuleTable::new(vec![
        FieldRule::required(fields::NAME, FieldKind::Text).constrain(Constraint::Length {
            min: Some(NAME_MIN_CHARS),
            max: Some(NAME_MAX_CHARS),
        }),
        FieldRule::required(fields::DESCRIPTION, FieldKind::Text).constrain(Constraint::Length {
            min: Some(DESCRIPTION_MIN_CHARS),
            max: Some(DESCRIPTION_MAX_CHARS),
        }),
        FieldRule::required(fields::IMG_URL, FieldKind::Url)
            .constrain(Constraint::allowed_hosts(&settings.approved_media_hosts)),
        FieldRule::required(fields::PRICE, FieldKind::Number).constrain(Constraint::Range {
            min: Some(0.0),
            max: Some(PRICE_CEILING),
        }),
        FieldRule::optional(fields::AGE, FieldKind::Integer)
            .with_default(0)
            .constrain(Constraint::Range {
                min: Some(0.0),
                max: Some(MAX_AGE_GATE as f64),
            }),
        FieldRule::required(fields::DATE_TIME, FieldKind::Timestamp)
            .constrain(Constraint::InFuture),
        FieldRule::required(fields::LOCATION, FieldKind::Text).constrain(Constraint::Length {
            min: Some(1),
            max: Some(LOCATION_MAX_CHARS),
        }),
        FieldRule::required(fields::QUANTITY, FieldKind::Integer).constrain(Constraint::Range {
            min: Some(1.0),
            max: None,
        }),
        FieldRule::optional(fields::IS_DIGITAL, FieldKind::Boolean).with_default(false),
        FieldRule::optional(fields::ACTIVE, FieldKind::Boolean).with_default(true),
    ])
}

static EVENT_RULES: LazyLock<RuleTable> = LazyLock::new(|| {
    build_event_rules(&EventRuleSettings::default()).expect("default event rule table is well-formed")
});

/// The process-wide event table with default settings.
pub fn event_rules() -> &'static RuleTable {
    &EVENT_RULES
}

/// Validate an event-creation candidate against the default table, using the
/// current time for the future-date check.
pub fn validate_new_event(candidate: &Value) -> ValidationResult {
    validate_new_event_at(candidate, Utc::now())
}

/// Like [`validate_new_event`] with an explicit evaluation instant.
pub fn validate_new_event_at(candidate: &Value, now: Timestamp) -> ValidationResult {
    coerce_and_validate(event_rules(), candidate, now)
}

/// A validated event in Rust types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    pub price: f64,
    pub age: u32,
    pub date_time: Timestamp,
    pub location: String,
    pub quantity: u64,
    pub is_digital: bool,
    pub active: bool,
}

impl TryFrom<NormalizedRecord> for NewEvent {
    type Error = CoreError;

    /// Fails only if the record was produced by a table other than the event
    /// table (missing or differently-typed fields).
    fn try_from(record: NormalizedRecord) -> Result<Self, Self::Error> {
        serde_json::from_value(record.into_value())
            .map_err(|e| CoreError::Validation(format!("record is not a valid event: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FailureReason;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "name": "Sample Event",
            "description": "Live music and food trucks",
            "imgURL": "https://firebasestorage.googleapis.com/v0/b/test/o/hero.png?alt=media",
            "price": 10,
            "age": 18,
            "dateTime": (now() + Duration::seconds(60)).to_rfc3339(),
            "location": "Test Venue",
            "quantity": 50,
            "isDigital": true,
            "active": true,
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut payload = valid_payload();
        payload[field] = value;
        payload
    }

    fn without(field: &str) -> Value {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove(field);
        payload
    }

    fn code_for(candidate: &Value) -> String {
        validate_new_event_at(candidate, now()).unwrap_err().code
    }

    #[test]
    fn description_fixture_is_26_chars() {
        assert_eq!(valid_payload()["description"].as_str().unwrap().chars().count(), 26);
    }

    #[test]
    fn valid_payload_normalizes_every_field() {
        let record = validate_new_event_at(&valid_payload(), now()).unwrap();

        assert_eq!(record.len(), 10);
        assert_eq!(record.get("name"), Some(&json!("Sample Event")));
        assert_eq!(record.get("price"), Some(&json!(10)));
        assert_eq!(record.get("dateTime"), Some(&json!("2026-03-14T12:01:00.000Z")));
        assert_eq!(record.get("isDigital"), Some(&json!(true)));
    }

    #[test]
    fn short_name_is_rejected() {
        assert_eq!(code_for(&with("name", json!("abc"))), "NAME_INVALID");
        assert_eq!(code_for(&with("name", json!("x".repeat(101)))), "NAME_INVALID");
    }

    #[test]
    fn short_description_is_rejected() {
        assert_eq!(
            code_for(&with("description", json!("short desc"))),
            "DESCRIPTION_INVALID"
        );
    }

    #[test]
    fn image_must_come_from_approved_origin() {
        assert_eq!(
            code_for(&with("imgURL", json!("https://example.com/hero.png"))),
            "IMG_URL_INVALID"
        );
        assert_eq!(
            code_for(&with("imgURL", json!("hero.png"))),
            "IMG_URL_INVALID"
        );
    }

    #[test]
    fn price_ceiling_is_inclusive() {
        assert!(validate_new_event_at(&with("price", json!(5000)), now()).is_ok());
        assert_eq!(code_for(&with("price", json!(5001))), "PRICE_INVALID");
        assert_eq!(code_for(&with("price", json!(-1))), "PRICE_INVALID");
        assert!(validate_new_event_at(&with("price", json!(0)), now()).is_ok());
    }

    #[test]
    fn numeric_price_string_is_coerced() {
        let record = validate_new_event_at(&with("price", json!("10")), now()).unwrap();
        assert_eq!(record.get("price"), Some(&json!(10)));
    }

    #[test]
    fn age_defaults_to_zero_and_must_be_whole() {
        let record = validate_new_event_at(&without("age"), now()).unwrap();
        assert_eq!(record.get("age"), Some(&json!(0)));
        assert_eq!(code_for(&with("age", json!(-1))), "AGE_INVALID");
        assert_eq!(code_for(&with("age", json!(17.5))), "AGE_INVALID");
    }

    #[test]
    fn date_time_must_be_in_the_future() {
        assert_eq!(
            code_for(&with("dateTime", json!(now().to_rfc3339()))),
            "DATE_TIME_INVALID"
        );
        assert_eq!(
            code_for(&with("dateTime", json!("2020-01-01T00:00:00Z"))),
            "DATE_TIME_INVALID"
        );
        assert_eq!(
            code_for(&with("dateTime", json!("not a date"))),
            "DATE_TIME_INVALID"
        );
    }

    #[test]
    fn blank_location_is_missing() {
        let err = validate_new_event_at(&with("location", json!("   ")), now()).unwrap_err();
        assert_eq!(err.code, "LOCATION_INVALID");
        assert_eq!(err.reason, FailureReason::Missing);
    }

    #[test]
    fn missing_quantity_is_quantity_invalid() {
        let err = validate_new_event_at(&without("quantity"), now()).unwrap_err();
        assert_eq!(err.code, "QUANTITY_INVALID");
        assert_eq!(err.field, "quantity");
        assert_eq!(err.reason, FailureReason::Missing);
    }

    #[test]
    fn quantity_must_be_positive() {
        assert_eq!(code_for(&with("quantity", json!(0))), "QUANTITY_INVALID");
        assert!(validate_new_event_at(&with("quantity", json!(1)), now()).is_ok());
    }

    #[test]
    fn flags_default_and_coerce() {
        let mut payload = without("isDigital");
        payload.as_object_mut().unwrap().remove("active");
        let record = validate_new_event_at(&payload, now()).unwrap();
        assert_eq!(record.get("isDigital"), Some(&json!(false)));
        assert_eq!(record.get("active"), Some(&json!(true)));

        let record = validate_new_event_at(&with("active", json!("false")), now()).unwrap();
        assert_eq!(record.get("active"), Some(&json!(false)));

        assert_eq!(code_for(&with("isDigital", json!("sometimes"))), "IS_DIGITAL_INVALID");
    }

    #[test]
    fn earlier_field_failure_masks_later_ones() {
        let mut payload = with("name", json!("abc"));
        payload["price"] = json!(9999);
        payload.as_object_mut().unwrap().remove("quantity");
        assert_eq!(code_for(&payload), "NAME_INVALID");
    }

    #[test]
    fn unrecognized_fields_are_dropped() {
        let record = validate_new_event_at(&with("ownerId", json!("u_123")), now()).unwrap();
        assert!(!record.contains("ownerId"));
    }

    #[test]
    fn revalidating_a_normalized_record_is_idempotent() {
        let payload = with("price", json!("12.50"));
        let first = validate_new_event_at(&payload, now()).unwrap();
        let second = validate_new_event_at(&first.clone().into_value(), now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sub_millisecond_date_time_is_judged_as_emitted() {
        // Half a millisecond past `now` truncates to `now` itself.
        let payload = with("dateTime", json!("2026-03-14T12:00:00.000500Z"));
        assert_eq!(code_for(&payload), "DATE_TIME_INVALID");

        let payload = with("dateTime", json!("2026-03-14T12:00:00.001500Z"));
        let first = validate_new_event_at(&payload, now()).unwrap();
        assert_eq!(first.get("dateTime"), Some(&json!("2026-03-14T12:00:00.001Z")));
        let second = validate_new_event_at(&first.clone().into_value(), now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn large_quantity_string_is_kept_exact() {
        let record =
            validate_new_event_at(&with("quantity", json!("9007199254740993")), now()).unwrap();
        assert_eq!(record.get("quantity"), Some(&json!(9_007_199_254_740_993_i64)));
    }

    #[test]
    fn normalized_record_converts_to_new_event() {
        let record = validate_new_event_at(&with("price", json!("10")), now()).unwrap();
        let event = NewEvent::try_from(record).unwrap();

        assert_eq!(event.name, "Sample Event");
        assert_eq!(event.price, 10.0);
        assert_eq!(event.age, 18);
        assert_eq!(event.date_time, now() + Duration::seconds(60));
        assert_eq!(event.quantity, 50);
        assert!(event.is_digital);
    }

    #[test]
    fn foreign_record_does_not_convert() {
        let record = NormalizedRecord::from(serde_json::Map::new());
        assert_matches!(NewEvent::try_from(record), Err(CoreError::Validation(_)));
    }

    #[test]
    fn custom_media_hosts() {
        let table = build_event_rules(&EventRuleSettings {
            approved_media_hosts: vec!["media.marquee.test".to_string()],
        })
        .unwrap();
        let payload = with("imgURL", json!("https://media.marquee.test/hero.png"));

        assert!(coerce_and_validate(&table, &payload, now()).is_ok());
        assert!(validate_new_event_at(&payload, now()).is_err());
    }

    #[test]
    fn empty_media_host_list_fails_at_construction() {
        let result = build_event_rules(&EventRuleSettings {
            approved_media_hosts: Vec::new(),
        });
        assert_matches!(result, Err(CoreError::InvalidRuleTable(_)));
    }

    #[test]
    fn default_table_has_every_event_field_in_order() {
        let names: Vec<_> = event_rules().rules().iter().map(FieldRule::name).collect();
        assert_eq!(
            names,
            [
                "name",
                "description",
                "imgURL",
                "price",
                "age",
                "dateTime",
                "location",
                "quantity",
                "isDigital",
                "active",
            ]
        );
    }

    #[test]
    fn validate_new_event_uses_current_time() {
        let mut payload = valid_payload();
        payload["dateTime"] = json!((Utc::now() + Duration::days(30)).to_rfc3339());
        assert!(validate_new_event(&payload).is_ok());
    }
}
