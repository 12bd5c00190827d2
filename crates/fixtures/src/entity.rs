//! Synthetic entities and their validation.

use catalog_identity::{Identifier, Identity};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::GenerationError;
use crate::patterns::PatternCatalog;
use crate::schema::{EntityTypeSpec, FieldSpec, InnerType};

/// One produced value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    /// `stableTargetId` of another entity.
    Reference(Identifier),
    Text {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Link {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

/// The values of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldData {
    Scalar(Option<FieldValue>),
    List(Vec<FieldValue>),
}

impl FieldData {
    pub fn values(&self) -> &[FieldValue] {
        match self {
            Self::Scalar(Some(value)) => std::slice::from_ref(value),
            Self::Scalar(None) => &[],
            Self::List(values) => values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

/// A generated record: identity plus every schema field in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEntity {
    pub entity_type: String,
    pub identity: Identity,
    pub fields: Vec<(String, FieldData)>,
}

impl SyntheticEntity {
    pub fn field(&self, name: &str) -> Option<&FieldData> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, data)| data)
    }

    /// Checks the entity against the spec it was built from.
    ///
    /// Reference fields may fall short of their minimum when no candidate
    /// existed; every other field must meet its cardinality bounds.
    pub fn validate(
        &self,
        spec: &EntityTypeSpec,
        catalog: &PatternCatalog,
    ) -> Result<(), GenerationError> {
        if self.fields.len() != spec.fields.len() {
            return Err(self.invalid(
                "*",
                format!(
                    "has {} fields, schema declares {}",
                    self.fields.len(),
                    spec.fields.len()
                ),
            ));
        }

        for ((name, data), field) in self.fields.iter().zip(&spec.fields) {
            if *name != field.name {
                return Err(self.invalid(name, format!("expected field {}", field.name)));
            }
            self.validate_field(field, data, catalog)?;
        }
        Ok(())
    }

    fn validate_field(
        &self,
        field: &FieldSpec,
        data: &FieldData,
        catalog: &PatternCatalog,
    ) -> Result<(), GenerationError> {
        let is_reference = matches!(field.inner_type, InnerType::Reference { .. });
        let values = data.values();

        match data {
            FieldData::List(_) if !field.is_list => {
                return Err(self.invalid(&field.name, "list given for a scalar field"));
            }
            FieldData::Scalar(_) if field.is_list => {
                return Err(self.invalid(&field.name, "scalar given for a list field"));
            }
            _ => {}
        }

        if values.len() > field.max_items {
            return Err(self.invalid(
                &field.name,
                format!("{} values, at most {} allowed", values.len(), field.max_items),
            ));
        }
        if values.len() < field.min_items && !is_reference {
            return Err(self.invalid(
                &field.name,
                format!("{} values, at least {} required", values.len(), field.min_items),
            ));
        }

        for value in values {
            match value {
                FieldValue::Reference(target) if *target == self.identity.stable_target_id => {
                    return Err(self.invalid(&field.name, "references its own entity"));
                }
                FieldValue::String(text) => {
                    if let Some(pattern) = &field.pattern {
                        if !catalog.matches(pattern, text)? {
                            return Err(self.invalid(
                                &field.name,
                                format!("{text:?} does not match {pattern}"),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> GenerationError {
        GenerationError::InvalidEntity {
            entity_type: self.entity_type.clone(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl Serialize for SyntheticEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("entityType", &self.entity_type)?;
        map.serialize_entry("identifier", &self.identity.identifier)?;
        map.serialize_entry("hadPrimarySource", &self.identity.had_primary_source)?;
        map.serialize_entry(
            "identifierInPrimarySource",
            &self.identity.identifier_in_primary_source,
        )?;
        map.serialize_entry("stableTargetId", &self.identity.stable_target_id)?;
        for (name, data) in &self.fields {
            match data {
                FieldData::Scalar(Some(value)) => map.serialize_entry(name, value)?,
                FieldData::Scalar(None) => {}
                FieldData::List(values) => map.serialize_entry(name, values)?,
            }
        }
        map.end()
    }
}
