//! Transport structure for provider state across process boundaries.
//!
//! An [`IdentityMap`] is never authoritative: it is produced by
//! [`IdentityProvider::snapshot`](crate::IdentityProvider::snapshot) or by the graph
//! builder, written out between pipeline stages, and handed to
//! [`IdentityProvider::restore`](crate::IdentityProvider::restore) on the other side.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Entity type name → identities of that type, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMap(BTreeMap<String, Vec<Identity>>);

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups identities by the entity type encoded in `identifierInPrimarySource`.
    pub fn from_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let mut map = Self::new();
        for identity in identities {
            let entity_type = entity_type_of(&identity.identifier_in_primary_source).to_string();
            map.push(entity_type, identity);
        }
        map
    }

    pub fn push(&mut self, entity_type: impl Into<String>, identity: Identity) {
        self.0.entry(entity_type.into()).or_default().push(identity);
    }

    /// Identities of one type; empty when the type was never planned.
    pub fn get(&self, entity_type: &str) -> &[Identity] {
        self.0.get(entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Identity])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.0.values().flatten()
    }

    /// Total number of identities across all types.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(std::io::Error::from)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(path, json)
    }
}

/// Entity type prefix of an `<EntityType>-<digits>` identifier, or `""` for anything else.
pub fn entity_type_of(identifier_in_primary_source: &str) -> &str {
    match identifier_in_primary_source.rsplit_once('-') {
        Some((prefix, seed))
            if !prefix.is_empty()
                && !seed.is_empty()
                && seed.bytes().all(|b| b.is_ascii_digit()) =>
        {
            prefix
        }
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifier;

    fn identity(iips: &str, n: u8) -> Identity {
        Identity {
            identifier: Identifier::parse(format!("identifier{n:08}")).unwrap(),
            had_primary_source: Identifier::bootstrap(),
            identifier_in_primary_source: iips.to_string(),
            stable_target_id: Identifier::parse(format!("stabletarget{n:08}")).unwrap(),
        }
    }

    #[test]
    fn test_entity_type_of() {
        assert_eq!(entity_type_of("Person-12345"), "Person");
        assert_eq!(entity_type_of("Organizational-Unit-7"), "Organizational-Unit");
        assert_eq!(entity_type_of("Person-"), "");
        assert_eq!(entity_type_of("-42"), "");
        assert_eq!(entity_type_of("free-text"), "");
        assert_eq!(entity_type_of("plain"), "");
    }

    #[test]
    fn test_grouping_keeps_order() {
        let map = IdentityMap::from_identities(vec![
            identity("Person-2", 0),
            identity("Resource-9", 1),
            identity("Person-1", 2),
            identity("legacy", 3),
        ]);

        let people: Vec<_> = map
            .get("Person")
            .iter()
            .map(|i| i.identifier_in_primary_source.as_str())
            .collect();
        assert_eq!(people, vec!["Person-2", "Person-1"]);
        assert_eq!(map.get("").len(), 1);
        assert_eq!(map.len(), 4);
        assert!(map.get("Missing").is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");

        let map = IdentityMap::from_identities(vec![identity("Person-2", 0)]);
        map.save(&path).unwrap();
        assert_eq!(IdentityMap::load(&path).unwrap(), map);
    }
}
