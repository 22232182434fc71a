//! Wire payloads for auto moderation rules (underscore naming).
//!
//! Nothing here validates semantics: unknown enum values are carried as
//! `Unknown(n)` and unknown keys inside metadata objects are kept verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw metadata object as received.
pub type RawMetadata = Map<String, Value>;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "i64", into = "i64")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Value this client does not know yet.
            Unknown(i64),
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                match v {
                    $($value => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(v: $name) -> i64 {
                match v {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

wire_enum! {
    /// When a rule is checked.
    pub enum EventType {
        /// A member sends or edits a message.
        MessageSend = 1,
        /// A member edits their profile.
        MemberUpdate = 2,
    }
}

wire_enum! {
    /// What a rule looks for.
    pub enum TriggerType {
        Keyword = 1,
        Spam = 3,
        KeywordPreset = 4,
        MentionSpam = 5,
        MemberProfile = 6,
    }
}

wire_enum! {
    /// What happens when a rule matches.
    pub enum ActionType {
        BlockMessage = 1,
        SendAlertMessage = 2,
        Timeout = 3,
        BlockMemberInteraction = 4,
    }
}

/// One action entry of a rule payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RawMetadata>,
}

/// Auto moderation rule as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub id: String,
    pub guild_id: String,
    pub creator_id: String,
    pub name: String,
    pub enabled: bool,
    pub event_type: EventType,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub exempt_roles: Vec<String>,
    #[serde(default)]
    pub exempt_channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_metadata: Option<RawMetadata>,
    #[serde(default)]
    pub actions: Vec<ActionPayload>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_enum_values_survive() {
        let t: TriggerType = serde_json::from_value(json!(99)).unwrap();
        assert_eq!(t, TriggerType::Unknown(99));
        assert_eq!(serde_json::to_value(t).unwrap(), json!(99));
        assert_eq!(TriggerType::from(4), TriggerType::KeywordPreset);
        assert_eq!(i64::from(ActionType::Timeout), 3);
    }

    #[test]
    fn wide_enum_values_do_not_reject_payload() {
        let raw = json!({
            "id": "1",
            "guild_id": "2",
            "creator_id": "3",
            "name": "r",
            "enabled": true,
            "event_type": 300,
            "trigger_type": 70000,
            "actions": [{"type": 4096}]
        });
        let p: RulePayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(p.event_type, EventType::Unknown(300));
        assert_eq!(p.trigger_type, TriggerType::Unknown(70000));
        assert_eq!(p.actions[0].action_type, ActionType::Unknown(4096));

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["event_type"], json!(300));
        assert_eq!(back["trigger_type"], json!(70000));
        assert_eq!(back["actions"], json!([{"type": 4096}]));
    }

    #[test]
    fn missing_optional_fields_default() {
        let p: RulePayload = serde_json::from_value(json!({
            "id": "1",
            "guild_id": "2",
            "creator_id": "3",
            "name": "r",
            "enabled": false,
            "event_type": 1,
            "trigger_type": 3
        }))
        .unwrap();
        assert!(p.trigger_metadata.is_none());
        assert!(p.actions.is_empty());
        assert!(p.exempt_roles.is_empty());
    }

    #[test]
    fn action_type_uses_wire_key() {
        let a: ActionPayload =
            serde_json::from_value(json!({"type": 2, "metadata": {"channel_id": "9"}})).unwrap();
        assert_eq!(a.action_type, ActionType::SendAlertMessage);
        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back, json!({"type": 2, "metadata": {"channel_id": "9"}}));
    }
}
