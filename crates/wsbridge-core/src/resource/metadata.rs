//! Metadata views with legacy camelCase aliases.
//!
//! A view owns the raw metadata map and exposes every key verbatim. A fixed
//! table of legacy aliases resolves to raw keys at read time, so an alias and
//! its raw key can never disagree. Each alias read reports
//! [`AUTOMOD_CAMEL_CASE_META`] to the injected deprecation port.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::deprecation::{Deprecations, AUTOMOD_CAMEL_CASE_META};
use crate::resource::wire::RawMetadata;

/// Legacy alias -> raw key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyAlias {
    pub legacy: &'static str,
    pub raw: &'static str,
}

pub const TRIGGER_ALIASES: &[LegacyAlias] = &[
    LegacyAlias {
        legacy: "allowList",
        raw: "allow_list",
    },
    LegacyAlias {
        legacy: "keywordFilter",
        raw: "keyword_filter",
    },
    LegacyAlias {
        legacy: "mentionTotalLimit",
        raw: "mention_total_limit",
    },
    LegacyAlias {
        legacy: "regexPatterns",
        raw: "regex_patterns",
    },
];

pub const ACTION_ALIASES: &[LegacyAlias] = &[
    LegacyAlias {
        legacy: "channelID",
        raw: "channel_id",
    },
    LegacyAlias {
        legacy: "durationSeconds",
        raw: "duration_seconds",
    },
];

/// Read-only view over one raw metadata object.
#[derive(Clone)]
pub struct MetadataView {
    raw: RawMetadata,
    aliases: &'static [LegacyAlias],
    deprecations: Arc<Deprecations>,
}

impl MetadataView {
    fn new(
        raw: RawMetadata,
        aliases: &'static [LegacyAlias],
        deprecations: Arc<Deprecations>,
    ) -> Self {
        Self {
            raw,
            aliases,
            deprecations,
        }
    }

    /// Look up `key`. Raw keys win; a legacy alias resolves to its raw key
    /// and reports a deprecation.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(v) = self.raw.get(key) {
            return Some(v);
        }
        let alias = self.aliases.iter().find(|a| a.legacy == key)?;
        self.legacy(alias.raw)
    }

    /// Look up a raw key without alias resolution.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Raw entries, in wire naming.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.raw.iter()
    }

    pub fn keys(&self) -> serde_json::map::Keys<'_> {
        self.raw.keys()
    }

    /// Legacy alias names this view answers to.
    pub fn legacy_names(&self) -> impl Iterator<Item = &'static str> {
        self.aliases.iter().map(|a| a.legacy)
    }

    pub fn raw(&self) -> &RawMetadata {
        &self.raw
    }

    pub fn into_raw(self) -> RawMetadata {
        self.raw
    }

    fn legacy(&self, raw_key: &str) -> Option<&Value> {
        self.deprecations.emit(&AUTOMOD_CAMEL_CASE_META);
        self.raw.get(raw_key)
    }
}

impl fmt::Debug for MetadataView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.raw.iter()).finish()
    }
}

impl PartialEq for MetadataView {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

// Aliases are read paths only; serialization emits raw keys.
impl Serialize for MetadataView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a MetadataView {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.raw.iter()
    }
}

/// `trigger_metadata` of a rule.
#[derive(Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TriggerMetadata(MetadataView);

impl TriggerMetadata {
    pub fn new(raw: RawMetadata, deprecations: Arc<Deprecations>) -> Self {
        Self(MetadataView::new(raw, TRIGGER_ALIASES, deprecations))
    }

    /// Legacy `allowList` alias of `allow_list`.
    #[deprecated(note = "read `get(\"allow_list\")` instead")]
    pub fn allow_list(&self) -> Option<&Value> {
        self.0.legacy("allow_list")
    }

    /// Legacy `keywordFilter` alias of `keyword_filter`.
    #[deprecated(note = "read `get(\"keyword_filter\")` instead")]
    pub fn keyword_filter(&self) -> Option<&Value> {
        self.0.legacy("keyword_filter")
    }

    /// Legacy `mentionTotalLimit` alias of `mention_total_limit`.
    #[deprecated(note = "read `get(\"mention_total_limit\")` instead")]
    pub fn mention_total_limit(&self) -> Option<&Value> {
        self.0.legacy("mention_total_limit")
    }

    /// Legacy `regexPatterns` alias of `regex_patterns`.
    #[deprecated(note = "read `get(\"regex_patterns\")` instead")]
    pub fn regex_patterns(&self) -> Option<&Value> {
        self.0.legacy("regex_patterns")
    }
}

impl Deref for TriggerMetadata {
    type Target = MetadataView;

    fn deref(&self) -> &MetadataView {
        &self.0
    }
}

impl fmt::Debug for TriggerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `metadata` of one rule action.
#[derive(Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionMetadata(MetadataView);

impl ActionMetadata {
    pub fn new(raw: RawMetadata, deprecations: Arc<Deprecations>) -> Self {
        Self(MetadataView::new(raw, ACTION_ALIASES, deprecations))
    }

    /// Legacy `channelID` alias of `channel_id`.
    #[deprecated(note = "read `get(\"channel_id\")` instead")]
    pub fn channel_id(&self) -> Option<&Value> {
        self.0.legacy("channel_id")
    }

    /// Legacy `durationSeconds` alias of `duration_seconds`.
    #[deprecated(note = "read `get(\"duration_seconds\")` instead")]
    pub fn duration_seconds(&self) -> Option<&Value> {
        self.0.legacy("duration_seconds")
    }
}

impl Deref for ActionMetadata {
    type Target = MetadataView;

    fn deref(&self) -> &MetadataView {
        &self.0
    }
}

impl fmt::Debug for ActionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
