//! Core data shapes for the on-chain document graph.
//!
//! These mirror the rows of the contract's `documents` and `edges` tables
//! and the action payloads the contract accepts. Nothing here talks to the
//! chain; the types are pure data plus a few read-only accessors.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Label of the content item that names a content group.
pub const CONTENT_GROUP_LABEL: &str = "content_group_label";

/// Permission level used to authorize every action this client submits.
pub const ACTIVE_PERMISSION: &str = "active";

// ── Checksum256 ───────────────────────────────────────────────────

/// A 256-bit content hash. Document identity on chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum256(pub [u8; 32]);

impl Checksum256 {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, the form the table API expects for bounds.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Checksum256 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidChecksum {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CoreError::InvalidChecksum {
                input: s.to_string(),
                reason: format!("expected 32 bytes, got {}", b.len()),
            })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum256({})", self.to_hex())
    }
}

impl Serialize for Checksum256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ── Name ──────────────────────────────────────────────────────────

/// A short symbolic identifier: account, action, permission, or edge name.
///
/// Construction never validates; the contract is the arbiter of what is
/// acceptable. [`Name::is_valid_symbol`] is available for callers that
/// want to pre-check input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

/// Account names share the symbol encoding.
pub type AccountName = Name;

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name fits the chain's 64-bit symbol encoding:
    /// up to 12 chars of `.12345a-z`, an optional 13th char of `.12345a-j`,
    /// and no trailing dot.
    pub fn is_valid_symbol(&self) -> bool {
        const CHARSET: &str = ".12345abcdefghijklmnopqrstuvwxyz";
        const LAST_CHARSET: &str = ".12345abcdefghij";

        let s = self.0.as_str();
        if s.is_empty() || s.len() > 13 || s.ends_with('.') {
            return false;
        }
        s.chars().enumerate().all(|(i, c)| {
            if i == 12 {
                LAST_CHARSET.contains(c)
            } else {
                CHARSET.contains(c)
            }
        })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

// ── Content ───────────────────────────────────────────────────────

/// A typed content value.
///
/// On the wire this is the contract's variant encoding: a two-element
/// array `["<type>", <value>]`.
#[derive(Debug, Clone, PartialEq)]
pub enum FlexValue {
    Name(Name),
    String(String),
    /// Quantity plus symbol, e.g. `"1.00 HUSD"`. Kept verbatim.
    Asset(String),
    /// Chain time point, e.g. `"2020-08-15T00:00:00.000"`. Kept verbatim.
    TimePoint(String),
    Int64(i64),
    Checksum256(Checksum256),
}

impl FlexValue {
    /// The variant tag used on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            FlexValue::Name(_) => "name",
            FlexValue::String(_) => "string",
            FlexValue::Asset(_) => "asset",
            FlexValue::TimePoint(_) => "time_point",
            FlexValue::Int64(_) => "int64",
            FlexValue::Checksum256(_) => "checksum256",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlexValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FlexValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.type_name())?;
        match self {
            FlexValue::Name(n) => tuple.serialize_element(n)?,
            FlexValue::String(s) | FlexValue::Asset(s) | FlexValue::TimePoint(s) => {
                tuple.serialize_element(s)?
            }
            FlexValue::Int64(i) => tuple.serialize_element(i)?,
            FlexValue::Checksum256(c) => tuple.serialize_element(c)?,
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for FlexValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (kind, raw): (String, serde_json::Value) = Deserialize::deserialize(deserializer)?;
        let value = match kind.as_str() {
            "name" => FlexValue::Name(serde_json::from_value(raw).map_err(de::Error::custom)?),
            "string" => FlexValue::String(serde_json::from_value(raw).map_err(de::Error::custom)?),
            "asset" => FlexValue::Asset(serde_json::from_value(raw).map_err(de::Error::custom)?),
            "time_point" => {
                FlexValue::TimePoint(serde_json::from_value(raw).map_err(de::Error::custom)?)
            }
            "int64" => FlexValue::Int64(numeric::i64_from_value(raw).map_err(de::Error::custom)?),
            "checksum256" => {
                FlexValue::Checksum256(serde_json::from_value(raw).map_err(de::Error::custom)?)
            }
            other => {
                return Err(de::Error::unknown_variant(
                    other,
                    &["name", "string", "asset", "time_point", "int64", "checksum256"],
                ))
            }
        };
        Ok(value)
    }
}

/// A labelled value inside a content group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub label: String,
    pub value: FlexValue,
}

impl Content {
    pub fn new(label: impl Into<String>, value: FlexValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// An ordered bundle of content items. Order is significant.
pub type ContentGroup = Vec<Content>;

// ── Document ──────────────────────────────────────────────────────

/// A certification attached to a document by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub certifier: Name,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub certification_date: Option<NaiveDateTime>,
}

/// A node in the graph, as stored in the contract's `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "numeric::u64_from_any")]
    pub id: u64,
    pub hash: Checksum256,
    pub creator: AccountName,
    pub content_groups: Vec<ContentGroup>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub created_date: Option<NaiveDateTime>,
}

impl Document {
    /// Find the content group whose `content_group_label` item equals `label`.
    pub fn group(&self, label: &str) -> Option<&ContentGroup> {
        self.content_groups.iter().find(|group| {
            group.iter().any(|c| {
                c.label == CONTENT_GROUP_LABEL && c.value.as_str() == Some(label)
            })
        })
    }

    /// Find a content item by group label and content label.
    pub fn content(&self, group_label: &str, content_label: &str) -> Option<&Content> {
        self.group(group_label)?
            .iter()
            .find(|c| c.label == content_label)
    }

    pub fn content_exists(&self, group_label: &str, content_label: &str) -> bool {
        self.content(group_label, content_label).is_some()
    }
}

// ── Edge ──────────────────────────────────────────────────────────

/// A named, directed relation between two documents.
///
/// Rows carry additional composite-index columns; they are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, deserialize_with = "numeric::u64_from_any")]
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<AccountName>,
    pub from_node: Checksum256,
    pub to_node: Checksum256,
    pub edge_name: Name,
    #[serde(default)]
    pub created_date: Option<NaiveDateTime>,
}

// ── Actions ───────────────────────────────────────────────────────

/// An (actor, permission) pair authorizing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: Name,
}

impl PermissionLevel {
    pub fn active(actor: AccountName) -> Self {
        Self {
            actor,
            permission: Name::from(ACTIVE_PERMISSION),
        }
    }
}

/// A single contract action with its binary-encoded arguments (hex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: AccountName,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    pub data: String,
}

impl Action {
    /// An action authorized by `actor@active` alone.
    pub fn single_signer(account: AccountName, name: Name, actor: AccountName, data: String) -> Self {
        Self {
            account,
            name,
            authorization: vec![PermissionLevel::active(actor)],
            data,
        }
    }
}

// ── Numeric helpers ───────────────────────────────────────────────

/// The chain's JSON encoder quotes 64-bit integers above 32 bits, so
/// integer columns may arrive as either numbers or strings.
mod numeric {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString<T> {
        Num(T),
        Str(String),
    }

    pub fn u64_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumOrString::<u64>::deserialize(deserializer)? {
            NumOrString::Num(n) => Ok(n),
            NumOrString::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }

    pub fn i64_from_value(raw: serde_json::Value) -> Result<i64, String> {
        match serde_json::from_value::<NumOrString<i64>>(raw).map_err(|e| e.to_string())? {
            NumOrString::Num(n) => Ok(n),
            NumOrString::Str(s) => s.parse().map_err(|e| format!("invalid int64 {s:?}: {e}")),
        }
    }
}
