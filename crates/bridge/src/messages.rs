use serde::{Deserialize, Serialize};
use serde_json::Value;

use seatlens_core_types::SeatStats;

/// Discriminator of the spy's inner message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SpySubType {
    #[serde(rename = "KONVA_STATS")]
    KonvaStats,
}

/// Every message shape carried across a document boundary. Tags are part
/// of the wire contract and must not change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Inner hop: raw stats the page spy broadcast, JSON-encoded payload.
    #[serde(rename = "BMS_SPY_DATA")]
    SpyData {
        #[serde(rename = "subType")]
        sub_type: SpySubType,
        payload: String,
    },
    /// Outer hop: stats successfully extracted for `url`.
    #[serde(rename = "SEAT_DATA_RESULT")]
    SeatDataResult { url: String, stats: SeatStats },
    /// Outer hop: extraction failed for `url`.
    #[serde(rename = "SEAT_DATA_ERROR")]
    SeatDataError { url: String, reason: String },
}

/// Decode a raw message body; unknown shapes yield `None` and are ignored
/// by every receiver.
pub fn decode(data: &Value) -> Option<BridgeMessage> {
    serde_json::from_value(data.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_tags_match_the_contract() {
        let spy = BridgeMessage::SpyData {
            sub_type: SpySubType::KonvaStats,
            payload: r#"{"available":3,"total":9}"#.into(),
        };
        let encoded = serde_json::to_value(&spy).unwrap();
        assert_eq!(encoded["type"], "BMS_SPY_DATA");
        assert_eq!(encoded["subType"], "KONVA_STATS");

        let result = BridgeMessage::SeatDataResult {
            url: "https://x/seat-layout".into(),
            stats: SeatStats::new(3, 9),
        };
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded["type"], "SEAT_DATA_RESULT");
        assert_eq!(encoded["stats"]["available"], 3);

        let error = BridgeMessage::SeatDataError {
            url: "https://x/seat-layout".into(),
            reason: "Parse Error".into(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap()["type"],
            "SEAT_DATA_ERROR"
        );
    }

    #[test]
    fn unknown_shapes_decode_to_none() {
        assert_eq!(decode(&json!({"type": "SOMETHING_ELSE"})), None);
        assert_eq!(decode(&json!({"hello": "world"})), None);
        assert_eq!(decode(&json!(42)), None);
        // Right tag, wrong subtype: still ignored.
        assert_eq!(
            decode(&json!({"type": "BMS_SPY_DATA", "subType": "OTHER", "payload": ""})),
            None
        );
    }

    #[test]
    fn round_trips_a_result_message() {
        let message = BridgeMessage::SeatDataResult {
            url: "https://host/movies/bang/seat-layout/ET1/PVOO/1/20251225".into(),
            stats: SeatStats::new(12, 80),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(decode(&value), Some(message));
    }
}
