//! Stream frame format
//!
//! Every frame is one JSON envelope `{"topic": "...", "payload": ...}`. The
//! payload of the animal topic is either a single record (incremental update)
//! or an array of records (bulk refresh). Records are decoded one by one so a
//! malformed record never takes its batch down with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Result, TrackerError};
use crate::registry::EntityUpdate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: Value,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Encode a bulk refresh frame
    pub fn batch(topic: &str, updates: &[EntityUpdate]) -> Result<String> {
        let envelope = Self::new(topic, serde_json::to_value(updates)?);
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Encode an incremental single-record frame
    pub fn single(topic: &str, update: &EntityUpdate) -> Result<String> {
        let envelope = Self::new(topic, serde_json::to_value(update)?);
        Ok(serde_json::to_string(&envelope)?)
    }
}

/// Records decoded from one payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub updates: Vec<EntityUpdate>,
    /// One reason per rejected record
    pub rejected: Vec<String>,
    /// True when the payload was an array (bulk refresh)
    pub bulk: bool,
}

impl DecodedBatch {
    pub fn from_updates(updates: Vec<EntityUpdate>) -> Self {
        Self {
            updates,
            rejected: Vec::new(),
            bulk: true,
        }
    }
}

/// Decode a payload into individual updates, rejecting bad records alone
pub fn decode_payload(payload: Value) -> DecodedBatch {
    let (records, bulk) = match payload {
        Value::Array(records) => (records, true),
        record => (vec![record], false),
    };

    let mut batch = DecodedBatch {
        updates: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
        bulk,
    };

    for (index, record) in records.into_iter().enumerate() {
        match decode_record(record) {
            Ok(update) => batch.updates.push(update),
            Err(e) => {
                tracing::warn!("Rejected record #{}: {}", index, e);
                batch.rejected.push(e.to_string());
            }
        }
    }

    batch
}

fn decode_record(record: Value) -> Result<EntityUpdate> {
    let update: EntityUpdate = serde_json::from_value(record)
        .map_err(|e| TrackerError::MalformedUpdate(e.to_string()))?;
    update.validate()?;
    Ok(update)
}

/// Decode one raw frame. Frames for other topics yield `Ok(None)`.
pub fn decode_frame(frame: &str, topic: &str) -> Result<Option<DecodedBatch>> {
    let envelope: Envelope = serde_json::from_str(frame)
        .map_err(|e| TrackerError::MalformedUpdate(format!("bad envelope: {}", e)))?;

    if envelope.topic != topic {
        return Ok(None);
    }

    Ok(Some(decode_payload(envelope.payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EntityId, Position};
    use serde_json::json;

    #[test]
    fn test_single_record_is_incremental() {
        let batch = decode_payload(json!({"_id": "a", "speed": 3.0}));
        assert!(!batch.bulk);
        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].speed, Some(3.0));
    }

    #[test]
    fn test_malformed_record_rejected_alone() {
        let batch = decode_payload(json!([
            {"_id": "a", "species": "lion", "speed": 3.0},
            {"species": "ghost"},
            {"_id": "c", "latitude": "north"},
            {"_id": "d", "distance_traveled": 7.0}
        ]));
        assert!(batch.bulk);
        let ids: Vec<&str> = batch.updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(batch.rejected.len(), 2);
    }

    #[test]
    fn test_non_object_record_rejected() {
        let batch = decode_payload(json!([42, "zebra"]));
        assert!(batch.updates.is_empty());
        assert_eq!(batch.rejected.len(), 2);
    }

    #[test]
    fn test_frame_topic_filtering() {
        let chat = r#"{"topic": "chatMessage", "payload": {"text": "hi"}}"#;
        assert!(decode_frame(chat, "animalData").unwrap().is_none());

        let animals = r#"{"topic": "animalData", "payload": [{"_id": "a"}]}"#;
        let batch = decode_frame(animals, "animalData").unwrap().unwrap();
        assert_eq!(batch.updates.len(), 1);
    }

    #[test]
    fn test_garbage_frame_is_error() {
        assert!(matches!(
            decode_frame("not json", "animalData"),
            Err(TrackerError::MalformedUpdate(_))
        ));
    }

    #[test]
    fn test_encoded_batch_decodes() {
        let updates = vec![
            EntityUpdate::new(EntityId::new("a"))
                .with_species("zebra")
                .with_position(Position::new(-1.4, 35.0)),
            EntityUpdate::new(EntityId::new("b")).with_speed(2.5),
        ];
        let frame = Envelope::batch("animalData", &updates).unwrap();
        let batch = decode_frame(&frame, "animalData").unwrap().unwrap();
        assert_eq!(batch.updates, updates);
        assert!(batch.bulk);

        let frame = Envelope::single("animalData", &updates[1]).unwrap();
        let batch = decode_frame(&frame, "animalData").unwrap().unwrap();
        assert!(!batch.bulk);
    }
}
