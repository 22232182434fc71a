//! Resource views built from wire payloads.
//!
//! - `wire`: serde payloads in the server's underscore naming.
//! - `metadata`: raw-key views with legacy camelCase aliases.
//! - `rule`: the auto moderation rule snapshot and its collaborator.

pub mod metadata;
pub mod rule;
pub mod wire;

pub use metadata::{ActionMetadata, MetadataView, TriggerMetadata};
pub use rule::{AutoModerationAction, AutoModerationRule, EditRuleOptions, RuleManager};
pub use wire::{ActionPayload, ActionType, EventType, RawMetadata, RulePayload, TriggerType};
