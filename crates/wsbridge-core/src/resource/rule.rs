//! Auto moderation rule view.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::deprecation::Deprecations;
use crate::error::{RemoteOperationError, Result, WsBridgeError};
use crate::inspect::{self, Fields, Inspect};
use crate::resource::metadata::{ActionMetadata, TriggerMetadata};
use crate::resource::wire::{
    ActionPayload, ActionType, EventType, RawMetadata, RulePayload, TriggerType,
};
use crate::snowflake;

/// Rule-management collaborator (usually the REST client).
///
/// Errors are returned to callers of [`AutoModerationRule::delete`] and
/// [`AutoModerationRule::edit`] unchanged.
#[async_trait]
pub trait RuleManager: Send + Sync {
    async fn delete_auto_moderation_rule(
        &self,
        guild_id: &str,
        rule_id: &str,
    ) -> std::result::Result<(), RemoteOperationError>;

    /// Apply `options` and return the server's view of the rule.
    async fn edit_auto_moderation_rule(
        &self,
        guild_id: &str,
        rule_id: &str,
        options: EditRuleOptions,
    ) -> std::result::Result<RulePayload, RemoteOperationError>;
}

/// Fields to change on a rule. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditRuleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exempt_channels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exempt_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_metadata: Option<RawMetadata>,
    /// Audit log reason. Sent as a header by the collaborator, not in the body.
    #[serde(skip)]
    pub reason: Option<String>,
}

impl EditRuleOptions {
    /// JSON request body in wire naming.
    pub fn to_body(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| WsBridgeError::Internal(format!("encode edit options failed: {e}")))
    }
}

/// One action of a rule.
#[derive(Clone, PartialEq, Serialize)]
pub struct AutoModerationAction {
    #[serde(rename = "type")]
    action_type: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ActionMetadata>,
}

impl AutoModerationAction {
    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn metadata(&self) -> Option<&ActionMetadata> {
        self.metadata.as_ref()
    }
}

impl fmt::Debug for AutoModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoModerationAction")
            .field("type", &self.action_type)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Immutable snapshot of an auto moderation rule.
///
/// `edit` returns a new snapshot; an existing one never changes.
#[derive(Clone)]
pub struct AutoModerationRule {
    id: String,
    guild_id: String,
    creator_id: String,
    name: String,
    enabled: bool,
    event_type: EventType,
    trigger_type: TriggerType,
    exempt_roles: Vec<String>,
    exempt_channels: Vec<String>,
    trigger_metadata: Option<TriggerMetadata>,
    actions: Vec<AutoModerationAction>,
    manager: Arc<dyn RuleManager>,
    deprecations: Arc<Deprecations>,
}

impl AutoModerationRule {
    /// Build a view reporting legacy reads to [`Deprecations::global`].
    pub fn new(payload: RulePayload, manager: Arc<dyn RuleManager>) -> Self {
        Self::with_deprecations(payload, manager, Deprecations::global())
    }

    pub fn with_deprecations(
        payload: RulePayload,
        manager: Arc<dyn RuleManager>,
        deprecations: Arc<Deprecations>,
    ) -> Self {
        let actions = payload
            .actions
            .into_iter()
            .map(|a| AutoModerationAction {
                action_type: a.action_type,
                metadata: a
                    .metadata
                    .map(|m| ActionMetadata::new(m, deprecations.clone())),
            })
            .collect();

        let trigger_metadata = payload
            .trigger_metadata
            .map(|m| TriggerMetadata::new(m, deprecations.clone()));

        Self {
            id: payload.id,
            guild_id: payload.guild_id,
            creator_id: payload.creator_id,
            name: payload.name,
            enabled: payload.enabled,
            event_type: payload.event_type,
            trigger_type: payload.trigger_type,
            exempt_roles: payload.exempt_roles,
            exempt_channels: payload.exempt_channels,
            trigger_metadata,
            actions,
            manager,
            deprecations,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }

    pub fn exempt_roles(&self) -> &[String] {
        &self.exempt_roles
    }

    pub fn exempt_channels(&self) -> &[String] {
        &self.exempt_channels
    }

    pub fn trigger_metadata(&self) -> Option<&TriggerMetadata> {
        self.trigger_metadata.as_ref()
    }

    pub fn actions(&self) -> &[AutoModerationAction] {
        &self.actions
    }

    /// Creation time (unix ms) from the rule id, if the id is a snowflake.
    pub fn created_at(&self) -> Option<u64> {
        snowflake::timestamp_ms(&self.id)
    }

    /// Delete this rule.
    pub async fn delete(&self) -> std::result::Result<(), RemoteOperationError> {
        self.manager
            .delete_auto_moderation_rule(&self.guild_id, &self.id)
            .await
    }

    /// Edit this rule, returning a new view of the server's result.
    pub async fn edit(
        &self,
        options: EditRuleOptions,
    ) -> std::result::Result<AutoModerationRule, RemoteOperationError> {
        let payload = self
            .manager
            .edit_auto_moderation_rule(&self.guild_id, &self.id, options)
            .await?;
        Ok(Self::with_deprecations(
            payload,
            self.manager.clone(),
            self.deprecations.clone(),
        ))
    }

    /// Re-emit the rule in wire naming.
    pub fn to_payload(&self) -> RulePayload {
        RulePayload {
            id: self.id.clone(),
            guild_id: self.guild_id.clone(),
            creator_id: self.creator_id.clone(),
            name: self.name.clone(),
            enabled: self.enabled,
            event_type: self.event_type,
            trigger_type: self.trigger_type,
            exempt_roles: self.exempt_roles.clone(),
            exempt_channels: self.exempt_channels.clone(),
            trigger_metadata: self.trigger_metadata.as_ref().map(|m| m.raw().clone()),
            actions: self
                .actions
                .iter()
                .map(|a| ActionPayload {
                    action_type: a.action_type,
                    metadata: a.metadata.as_ref().map(|m| m.raw().clone()),
                })
                .collect(),
        }
    }
}

impl Serialize for AutoModerationRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_payload().serialize(serializer)
    }
}

impl Inspect for AutoModerationRule {
    const NAME: &'static str = "AutoModerationRule";

    fn inspect_fields(&self, fields: &mut Fields<'_, '_>) {
        fields
            .field("id", &self.id)
            .field("guild_id", &self.guild_id)
            .field("creator_id", &self.creator_id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("event_type", &self.event_type)
            .field("trigger_type", &self.trigger_type)
            .field("exempt_roles", &self.exempt_roles)
            .field("exempt_channels", &self.exempt_channels)
            .field("trigger_metadata", &self.trigger_metadata)
            .field("actions", &self.actions);
    }
}

impl fmt::Debug for AutoModerationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        inspect::fmt(self, f)
    }
}
