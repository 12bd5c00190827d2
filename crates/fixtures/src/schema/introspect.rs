//! Resolution of declared schemas into field specs.

use std::collections::BTreeMap;

use rand::Rng;

use super::{DeclaredField, DeclaredType, EntitySchema, SchemaRegistry};

/// The closed set of value kinds the synthesizer knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerType {
    Reference { target: String },
    Link,
    Email,
    Text,
    Temporal,
    Enumeration { name: String, variants: Vec<String> },
    String,
    Unsupported { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    pub is_list: bool,
    pub min_items: usize,
    pub max_items: usize,
    pub inner_type: InnerType,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTypeSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl EntityTypeSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Entity type referenced by an identifier type name.
///
/// `MergedPersonIdentifier` and `ExtractedPersonIdentifier` both point at `Person`.
pub fn referenced_entity_type(identifier_type: &str) -> Option<&str> {
    let stem = identifier_type.strip_suffix("Identifier")?;
    let target = stem
        .strip_prefix("Merged")
        .or_else(|| stem.strip_prefix("Extracted"))?;
    (!target.is_empty()).then_some(target)
}

/// Names of every leaf in `ty` that has no synthesizer, across all union branches.
pub fn unsupported_leaves(ty: &DeclaredType) -> Vec<String> {
    match ty {
        DeclaredType::List { items, .. } => unsupported_leaves(items),
        DeclaredType::Optional { inner } => unsupported_leaves(inner),
        DeclaredType::Union { variants } if variants.is_empty() => vec!["Union[]".to_string()],
        DeclaredType::Union { variants } => variants.iter().flat_map(unsupported_leaves).collect(),
        DeclaredType::Identifier { name } if referenced_entity_type(name).is_none() => {
            vec![name.clone()]
        }
        DeclaredType::Opaque { name } => vec![name.clone()],
        _ => Vec::new(),
    }
}

pub struct SchemaIntrospector;

impl SchemaIntrospector {
    pub fn introspect(schema: &EntitySchema, rng: &mut impl Rng) -> EntityTypeSpec {
        EntityTypeSpec {
            name: schema.name.clone(),
            fields: schema
                .fields
                .iter()
                .map(|field| Self::field_spec(field, rng))
                .collect(),
        }
    }

    /// Specs for `entity_types`, in the given order. Unknown names are skipped.
    pub fn introspect_all(
        registry: &SchemaRegistry,
        entity_types: &[String],
        rng: &mut impl Rng,
    ) -> BTreeMap<String, EntityTypeSpec> {
        entity_types
            .iter()
            .filter_map(|name| registry.get(name))
            .map(|schema| (schema.name.clone(), Self::introspect(schema, rng)))
            .collect()
    }

    pub fn field_spec(field: &DeclaredField, rng: &mut impl Rng) -> FieldSpec {
        let (is_list, min_items, max_items) = match strip_optional(&field.ty) {
            DeclaredType::List {
                min_length,
                max_length,
                ..
            } => {
                let min = min_length.unwrap_or(0);
                let max = match max_length {
                    Some(max) => (*max).max(min),
                    None => rng.gen_range(min + 1..=min + 3),
                };
                (true, min, max)
            }
            _ if field.required => (false, 1, 1),
            _ => (false, 0, 1),
        };

        FieldSpec {
            name: field.name.clone(),
            required: field.required,
            is_list,
            min_items,
            max_items,
            inner_type: resolve_inner(&field.ty, rng),
            pattern: field.pattern.clone(),
        }
    }
}

fn strip_optional(ty: &DeclaredType) -> &DeclaredType {
    match ty {
        DeclaredType::Optional { inner } => strip_optional(inner),
        other => other,
    }
}

fn resolve_inner(ty: &DeclaredType, rng: &mut impl Rng) -> InnerType {
    match ty {
        DeclaredType::List { items, .. } => resolve_inner(items, rng),
        DeclaredType::Optional { inner } => resolve_inner(inner, rng),
        DeclaredType::Union { variants } => {
            if variants.is_empty() {
                return InnerType::Unsupported {
                    name: "Union[]".to_string(),
                };
            }
            let branch = &variants[rng.gen_range(0..variants.len())];
            resolve_inner(branch, rng)
        }
        DeclaredType::Identifier { name } => match referenced_entity_type(name) {
            Some(target) => InnerType::Reference {
                target: target.to_string(),
            },
            None => InnerType::Unsupported { name: name.clone() },
        },
        DeclaredType::Link => InnerType::Link,
        DeclaredType::Email => InnerType::Email,
        DeclaredType::Text => InnerType::Text,
        DeclaredType::Temporal => InnerType::Temporal,
        DeclaredType::Enumeration { name, variants } => InnerType::Enumeration {
            name: name.clone(),
            variants: variants.clone(),
        },
        DeclaredType::String => InnerType::String,
        DeclaredType::Opaque { name } => InnerType::Unsupported { name: name.clone() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_reference_names() {
        assert_eq!(referenced_entity_type("MergedPersonIdentifier"), Some("Person"));
        assert_eq!(
            referenced_entity_type("ExtractedOrganizationalUnitIdentifier"),
            Some("OrganizationalUnit")
        );
        assert_eq!(referenced_entity_type("MergedIdentifier"), None);
        assert_eq!(referenced_entity_type("Identifier"), None);
        assert_eq!(referenced_entity_type("PersonId"), None);
    }

    #[test]
    fn test_scalar_cardinality() {
        let mut rng = StdRng::seed_from_u64(0);
        let required = DeclaredField::required("title", DeclaredType::String);
        let optional = DeclaredField::new("version", DeclaredType::optional(DeclaredType::String));

        let spec = SchemaIntrospector::field_spec(&required, &mut rng);
        assert_eq!((spec.is_list, spec.min_items, spec.max_items), (false, 1, 1));

        let spec = SchemaIntrospector::field_spec(&optional, &mut rng);
        assert_eq!((spec.is_list, spec.min_items, spec.max_items), (false, 0, 1));
        assert_eq!(spec.inner_type, InnerType::String);
    }

    #[test]
    fn test_list_cardinality() {
        let mut rng = StdRng::seed_from_u64(0);
        let bounded = DeclaredField::new(
            "email",
            DeclaredType::List {
                items: Box::new(DeclaredType::Email),
                min_length: Some(1),
                max_length: Some(4),
            },
        );
        let spec = SchemaIntrospector::field_spec(&bounded, &mut rng);
        assert_eq!((spec.is_list, spec.min_items, spec.max_items), (true, 1, 4));

        for _ in 0..50 {
            let open = DeclaredField::new("keyword", DeclaredType::list(DeclaredType::Text));
            let spec = SchemaIntrospector::field_spec(&open, &mut rng);
            assert_eq!(spec.min_items, 0);
            assert!((1..=3).contains(&spec.max_items));
        }
    }

    #[test]
    fn test_union_picks_a_branch() {
        let ty = DeclaredType::list(DeclaredType::Union {
            variants: vec![DeclaredType::reference("Person"), DeclaredType::reference("Organization")],
        });
        let field = DeclaredField::new("contact", ty);
        let mut seen = std::collections::BTreeSet::new();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..40 {
            match SchemaIntrospector::field_spec(&field, &mut rng).inner_type {
                InnerType::Reference { target } => {
                    seen.insert(target);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_unsupported_leaves() {
        let ty = DeclaredType::optional(DeclaredType::Union {
            variants: vec![
                DeclaredType::Text,
                DeclaredType::Opaque {
                    name: "GeoShape".to_string(),
                },
                DeclaredType::Identifier {
                    name: "SomethingElse".to_string(),
                },
            ],
        });
        assert_eq!(unsupported_leaves(&ty), vec!["GeoShape", "SomethingElse"]);
        assert!(unsupported_leaves(&DeclaredType::reference("Person")).is_empty());
    }

    #[test]
    fn test_builtin_schemas_are_supported() {
        let registry = SchemaRegistry::builtin();
        for schema in registry.schemas() {
            for field in &schema.fields {
                assert!(
                    unsupported_leaves(&field.ty).is_empty(),
                    "{}.{}",
                    schema.name,
                    field.name
                );
            }
        }
    }
}
