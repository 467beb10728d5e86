//! Structural cache keys for compiled projectors.
//!
//! A [`Fingerprint`] holds the full structural description of what a
//! projector does: result type identity, every rule's alias, its condition
//! and processors in order (each by key and closure type), the
//! strict-columns flag, and the owning command. A 128-bit digest of that
//! description (first 16 bytes of SHA-256) is used for hashing and display;
//! equality always compares the full structure, so a digest collision cannot
//! produce a false cache hit.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use rowmap_model::ValueKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::rule_set::MappingRuleSet;

/// Opaque identity of the command that owns a mapping.
///
/// Supplied by the command-construction layer; never interpreted here.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identity for mappings not tied to any command.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller key plus the concrete closure type behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClosureIdentity {
    key: String,
    type_id: TypeId,
}

impl ClosureIdentity {
    fn write(&self, hasher: &mut Sha256) {
        write_str(hasher, &self.key);
        // TypeId has no stable byte form; its Debug output is fixed for one build.
        write_str(hasher, &format!("{:?}", self.type_id));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleSignature {
    property: String,
    kind: ValueKind,
    alias: String,
    condition: Option<ClosureIdentity>,
    processors: Vec<ClosureIdentity>,
}

/// Structural key identifying one (result type, rule set, command) combination.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    type_id: TypeId,
    type_name: String,
    rules: Vec<RuleSignature>,
    strict_columns: bool,
    command: CommandId,
    digest: [u8; 16],
}

impl Fingerprint {
    /// Derives the fingerprint of `rules` owned by `command`.
    ///
    /// Rules keep their declaration order: the order fields are applied in
    /// is part of what a projector does.
    pub fn of<T>(rules: &MappingRuleSet<T>, command: &CommandId) -> Self {
        let signatures: Vec<RuleSignature> = rules
            .rules()
            .iter()
            .map(|rule| RuleSignature {
                property: rule.property_name().to_string(),
                kind: rule.property().kind(),
                alias: rule.active_alias().to_string(),
                condition: rule.condition().map(|c| ClosureIdentity {
                    key: c.key().to_string(),
                    type_id: c.type_id(),
                }),
                processors: rule
                    .processors()
                    .iter()
                    .map(|p| ClosureIdentity {
                        key: p.key().to_string(),
                        type_id: p.type_id(),
                    })
                    .collect(),
            })
            .collect();
        let digest = digest(
            rules.type_name(),
            &signatures,
            rules.strict_columns(),
            command,
        );
        Self {
            type_id: rules.type_id(),
            type_name: rules.type_name().to_string(),
            rules: signatures,
            strict_columns: rules.strict_columns(),
            command: command.clone(),
            digest,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn command(&self) -> &CommandId {
        &self.command
    }

    pub fn digest(&self) -> &[u8; 16] {
        &self.digest
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && self.type_id == other.type_id
            && self.type_name == other.type_name
            && self.strict_columns == other.strict_columns
            && self.command == other.command
            && self.rules == other.rules
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn digest(
    type_name: &str,
    rules: &[RuleSignature],
    strict_columns: bool,
    command: &CommandId,
) -> [u8; 16] {
    let mut hasher = Sha256::new();
    write_str(&mut hasher, type_name);
    write_str(&mut hasher, command.as_str());
    hasher.update([u8::from(strict_columns)]);
    write_len(&mut hasher, rules.len());
    for rule in rules {
        write_str(&mut hasher, &rule.property);
        write_str(&mut hasher, rule.kind.as_str());
        write_str(&mut hasher, &rule.alias);
        match &rule.condition {
            Some(condition) => {
                hasher.update([1]);
                condition.write(&mut hasher);
            }
            None => hasher.update([0]),
        }
        write_len(&mut hasher, rule.processors.len());
        for processor in &rule.processors {
            processor.write(&mut hasher);
        }
    }
    let full = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&full[..16]);
    out
}

// Length prefixes keep ("ab", "c") and ("a", "bc") apart.
fn write_str(hasher: &mut Sha256, value: &str) {
    write_len(hasher, value.len());
    hasher.update(value.as_bytes());
}

fn write_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_le_bytes());
}
