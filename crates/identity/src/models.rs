use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::IdentityError;

/// Stable target id used as `hadPrimarySource` by the very first primary source.
pub const BOOTSTRAP_PRIMARY_SOURCE_ID: &str = "00000000000000";

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const GENERATED_LEN: usize = 22;
const MIN_LEN: usize = 14;

/// Alphanumeric identifier of 14 to 22 characters.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validates an identifier received from a caller or a file.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        let valid_len = (MIN_LEN..=GENERATED_LEN).contains(&value.len());
        if valid_len && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(value))
        } else {
            Err(IdentityError::InvalidIdentifier(value))
        }
    }

    /// Generates a fresh identifier: 128 random bits rendered as 22 base62 characters.
    ///
    /// The bits come from `rng`, so a seeded generator yields a reproducible sequence.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let uuid = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();
        Self(encode_base62(uuid))
    }

    /// The placeholder referenced by the first primary source of a run.
    pub fn bootstrap() -> Self {
        Self(BOOTSTRAP_PRIMARY_SOURCE_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode_base62(uuid: Uuid) -> String {
    let mut n = uuid.as_u128();
    let mut digits = [b'0'; GENERATED_LEN];
    for slot in digits.iter_mut().rev() {
        *slot = BASE62[(n % 62) as usize];
        n /= 62;
    }
    digits.iter().map(|&b| b as char).collect()
}

impl TryFrom<String> for Identifier {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Links one extracted record to the canonical id of the entity it describes.
///
/// `(had_primary_source, identifier_in_primary_source)` determines the other two fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub identifier: Identifier,
    pub had_primary_source: Identifier,
    pub identifier_in_primary_source: String,
    pub stable_target_id: Identifier,
}

/// Lookup key accepted by [`crate::IdentityProvider::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFilter {
    StableTargetId(Identifier),
    PrimarySource {
        had_primary_source: Identifier,
        identifier_in_primary_source: String,
    },
}

impl IdentityFilter {
    pub fn primary_source(
        had_primary_source: &Identifier,
        identifier_in_primary_source: impl Into<String>,
    ) -> Self {
        Self::PrimarySource {
            had_primary_source: had_primary_source.clone(),
            identifier_in_primary_source: identifier_in_primary_source.into(),
        }
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        match self {
            Self::StableTargetId(id) => &identity.stable_target_id == id,
            Self::PrimarySource {
                had_primary_source,
                identifier_in_primary_source,
            } => {
                &identity.had_primary_source == had_primary_source
                    && &identity.identifier_in_primary_source == identifier_in_primary_source
            }
        }
    }
}

/// Body of `POST /v0/identity`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub had_primary_source: Identifier,
    pub identifier_in_primary_source: String,
}

/// One page of `GET /v0/identity`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityPage {
    pub items: Vec<Identity>,
    pub total: usize,
}
