use chrono::{DateTime, Utc};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The sales executive typing into the chat.
    User,
    /// The assistant, including directory and fallback turns.
    #[serde(alias = "bot")]
    Assistant,
}

impl Role {
    /// Wire name used in exports and model prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle state of an escalation record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    /// Waiting for a human to pick it up.
    #[default]
    Pending,
    /// Closed by the support workflow.
    Resolved,
}

// =============================================================================
// Conversation
// =============================================================================

/// One message in a conversation.
///
/// Turns are immutable once recorded. The reasoning segment stays on the
/// in-memory turn but is never exported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub reasoning: Option<String>,
}

impl Turn {
    /// A user turn stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            reasoning: None,
        }
    }

    /// An assistant turn stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            reasoning: None,
        }
    }

    /// Attach an extracted reasoning segment.
    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        self.reasoning = reasoning;
        self
    }
}

// =============================================================================
// Shop directory
// =============================================================================

/// A physical shop as listed in the directory file.
///
/// Field names follow the spreadsheet export the directory is generated
/// from; snake_case aliases are accepted as well.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopRecord {
    #[serde(rename = "SHOP NAME", alias = "name", default)]
    pub name: Option<String>,
    #[serde(rename = "PHYSICAL LOCATION", alias = "physical_location", default)]
    pub physical_location: Option<String>,
    #[serde(
        rename = "Latitude",
        alias = "latitude",
        default,
        deserialize_with = "lenient_coordinate"
    )]
    pub latitude: Option<Coordinate>,
    #[serde(
        rename = "Longitude",
        alias = "longitude",
        default,
        deserialize_with = "lenient_coordinate"
    )]
    pub longitude: Option<Coordinate>,
    #[serde(rename = "Business Hours", alias = "business_hours", default)]
    pub business_hours: Option<String>,
}

impl ShopRecord {
    /// Both coordinates, if the record carries them.
    pub fn coordinates(&self) -> Option<(&Coordinate, &Coordinate)> {
        match (&self.latitude, &self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// One latitude or longitude value.
///
/// Text read from the directory is kept as written, so `"36.860"` renders as
/// `36.860`; values built from a number use its shortest decimal form.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinate {
    value: f64,
    text: String,
}

impl Coordinate {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Accept a number, a numeric string, an empty string, or null.
fn lenient_coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(Coordinate::from(n))),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let value = trimmed
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid coordinate: {s:?}")))?;
            Ok(Some(Coordinate {
                value,
                text: trimmed.to_string(),
            }))
        }
    }
}

// =============================================================================
// Escalation
// =============================================================================

/// A turn flagged for human follow-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub id: Uuid,
    /// The user utterance that produced the flagged response.
    pub query: String,
    /// The visible assistant response that matched the heuristic.
    pub response: String,
    pub status: EscalationStatus,
    pub created_at: DateTime<Utc>,
}

impl EscalationRecord {
    /// A new pending record.
    pub fn pending(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            response: response.into(),
            status: EscalationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        let legacy: Role = serde_json::from_str("\"bot\"").unwrap();
        assert_eq!(legacy, Role::Assistant);
    }

    #[test]
    fn test_turn_reasoning_not_serialized() {
        let turn = Turn::assistant("Approved.").with_reasoning(Some("thinking".into()));
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("reasoning").is_none());
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Approved.");
    }

    #[test]
    fn test_shop_record_spreadsheet_keys() {
        let json = r#"{
            "SHOP NAME": "Mathare",
            "PHYSICAL LOCATION": "Juja Road",
            "Latitude": -1.26,
            "Longitude": "36.86",
            "Business Hours": "8am-6pm"
        }"#;
        let shop: ShopRecord = serde_json::from_str(json).unwrap();
        assert_eq!(shop.name.as_deref(), Some("Mathare"));
        let (lat, lon) = shop.coordinates().unwrap();
        assert_eq!(lat.value(), -1.26);
        assert_eq!(lon.value(), 36.86);
        assert_eq!(shop.business_hours.as_deref(), Some("8am-6pm"));
    }

    #[test]
    fn test_coordinate_text_kept_as_written() {
        let shop: ShopRecord =
            serde_json::from_str(r#"{"Latitude": " -1.2600 ", "Longitude": "36.860"}"#).unwrap();
        let (lat, lon) = shop.coordinates().unwrap();
        assert_eq!(lat.as_str(), "-1.2600");
        assert_eq!(lon.to_string(), "36.860");
        assert_eq!(lon.value(), 36.86);

        let json = serde_json::to_value(&shop).unwrap();
        assert_eq!(json["Longitude"], "36.860");
        let back: ShopRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, shop);
    }

    #[test]
    fn test_shop_record_missing_or_blank_coordinates() {
        let shop: ShopRecord =
            serde_json::from_str(r#"{"name": "Kibera", "latitude": null, "longitude": ""}"#)
                .unwrap();
        assert_eq!(shop.latitude, None);
        assert_eq!(shop.longitude, None);
        assert_eq!(shop.coordinates(), None);

        let shop: ShopRecord = serde_json::from_str(r#"{"name": "Kibera"}"#).unwrap();
        assert_eq!(shop.coordinates(), None);
    }

    #[test]
    fn test_shop_record_rejects_garbage_coordinate() {
        let result = serde_json::from_str::<ShopRecord>(r#"{"Latitude": "north"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_escalation_record_pending() {
        let record = EscalationRecord::pending("float?", "Sorry, I am unable");
        assert_eq!(record.status, EscalationStatus::Pending);
        assert_eq!(record.query, "float?");
    }
}
