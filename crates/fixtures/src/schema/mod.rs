//! Entity schemas: declared field types and their resolution into synthesis specs.

pub mod builtin;
pub mod introspect;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

pub use introspect::{EntityTypeSpec, FieldSpec, InnerType, SchemaIntrospector};

/// A field type as declared by a schema, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclaredType {
    String,
    /// A named identifier type such as `MergedPersonIdentifier`.
    Identifier { name: String },
    Link,
    Email,
    Text,
    Temporal,
    Enumeration { name: String, variants: Vec<String> },
    List {
        items: Box<DeclaredType>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
    Optional { inner: Box<DeclaredType> },
    Union { variants: Vec<DeclaredType> },
    /// Anything the synthesizer has no rule for.
    Opaque { name: String },
}

impl DeclaredType {
    pub fn list(items: DeclaredType) -> Self {
        Self::List {
            items: Box::new(items),
            min_length: None,
            max_length: None,
        }
    }

    pub fn list_between(items: DeclaredType, min: usize, max: Option<usize>) -> Self {
        Self::List {
            items: Box::new(items),
            min_length: Some(min),
            max_length: max,
        }
    }

    pub fn optional(inner: DeclaredType) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    /// Identifier type pointing at records of `entity_type`.
    pub fn reference(entity_type: &str) -> Self {
        Self::Identifier {
            name: format!("Merged{entity_type}Identifier"),
        }
    }

    pub fn enumeration(name: &str, variants: &[&str]) -> Self {
        Self::Enumeration {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
    #[serde(default)]
    pub required: bool,
    /// Key into the pattern catalog.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl DeclaredField {
    pub fn new(name: &str, ty: DeclaredType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            pattern: None,
        }
    }

    pub fn required(name: &str, ty: DeclaredType) -> Self {
        Self {
            required: true,
            ..Self::new(name, ty)
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

/// The declared shape of one entity type.
///
/// The four identity fields are implicit and not listed in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DeclaredField>,
}

impl EntitySchema {
    pub fn new(name: &str, fields: Vec<DeclaredField>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }
}

/// All entity schemas known to a run, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schemas: Vec<EntitySchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<EntitySchema>) -> Result<Self, GenerationError> {
        for (i, schema) in schemas.iter().enumerate() {
            if schemas[..i].iter().any(|s| s.name == schema.name) {
                return Err(GenerationError::InvalidConfig(format!(
                    "entity type {} is declared twice",
                    schema.name
                )));
            }
        }
        Ok(Self { schemas })
    }

    /// The catalog schemas shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            schemas: builtin::schemas(),
        }
    }

    /// Reads a registry from a JSON file of the form `{"schemas": [...]}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path)?;
        let parsed: SchemaRegistry = serde_json::from_slice(&bytes)?;
        Self::new(parsed.schemas)
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.iter().find(|s| s.name == entity_type)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    pub fn schemas(&self) -> &[EntitySchema] {
        &self.schemas
    }

    /// Build order for the given types: the primary source type first, then
    /// the rest in declaration order. Types not in the registry are dropped.
    pub fn build_order<'a>(
        &self,
        primary_source_type: &str,
        entity_types: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        let wanted: Vec<&str> = entity_types.into_iter().collect();
        let mut order = Vec::with_capacity(wanted.len());
        if wanted.contains(&primary_source_type) && self.get(primary_source_type).is_some() {
            order.push(primary_source_type.to_string());
        }
        order.extend(
            self.names()
                .filter(|name| *name != primary_source_type && wanted.contains(name))
                .map(str::to_string),
        );
        order
    }
}
