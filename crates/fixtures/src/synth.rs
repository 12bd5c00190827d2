//! Field value synthesis.

use catalog_identity::{Identifier, Identity, IdentityMap};
use fake::Fake;
use fake::faker::internet::raw::{DomainSuffix, SafeEmail};
use fake::faker::lorem::raw::{Sentence, Word, Words};
use fake::locales::{DE_DE, EN, FR_FR, JA_JP, PT_BR, ZH_CN};
use rand::Rng;
use rand::seq::SliceRandom;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::Locale;
use crate::entity::{FieldData, FieldValue};
use crate::error::GenerationError;
use crate::patterns::PatternCatalog;
use crate::schema::{FieldSpec, InnerType};

/// 2030-01-01T00:00:00Z
const LATEST_TIMESTAMP: i64 = 1_893_456_000;

/// Runs a `fake` raw faker in the given locale.
macro_rules! localized {
    ($locale:expr, $rng:expr, $faker:ident ( $($arg:expr),* )) => {
        match $locale {
            Locale::De => $faker(DE_DE $(, $arg)*).fake_with_rng($rng),
            Locale::En => $faker(EN $(, $arg)*).fake_with_rng($rng),
            Locale::Fr => $faker(FR_FR $(, $arg)*).fake_with_rng($rng),
            Locale::PtBr => $faker(PT_BR $(, $arg)*).fake_with_rng($rng),
            Locale::ZhCn => $faker(ZH_CN $(, $arg)*).fake_with_rng($rng),
            Locale::JaJp => $faker(JA_JP $(, $arg)*).fake_with_rng($rng),
        }
    };
}

#[derive(Debug, Clone, Copy)]
enum Precision {
    Year,
    Month,
    Day,
    Minute,
    Second,
}

const PRECISIONS: [Precision; 5] = [
    Precision::Year,
    Precision::Month,
    Precision::Day,
    Precision::Minute,
    Precision::Second,
];

/// Produces field values for entities of one run.
///
/// References resolve against `graph`, the identities built before synthesis.
pub struct ValueSynthesizer<'a> {
    catalog: &'a PatternCatalog,
    graph: &'a IdentityMap,
    locales: &'a [Locale],
    chattiness: usize,
}

impl<'a> ValueSynthesizer<'a> {
    pub fn new(
        catalog: &'a PatternCatalog,
        graph: &'a IdentityMap,
        locales: &'a [Locale],
        chattiness: usize,
    ) -> Self {
        Self {
            catalog,
            graph,
            locales,
            chattiness: chattiness.max(1),
        }
    }

    /// Between `min_items` and `max_items` values for `field` of `owner`.
    pub fn synthesize_field(
        &self,
        entity_type: &str,
        field: &FieldSpec,
        owner: &Identity,
        rng: &mut impl Rng,
    ) -> Result<FieldData, GenerationError> {
        if let (None, InnerType::Unsupported { name }) = (&field.pattern, &field.inner_type) {
            return Err(GenerationError::UnsupportedFieldType {
                entity_type: entity_type.to_string(),
                field: field.name.clone(),
                type_name: name.clone(),
            });
        }

        let count = rng.gen_range(field.min_items..=field.max_items);
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(value) = self.synthesize_value(entity_type, field, owner, rng)? {
                values.push(value);
            }
        }

        Ok(if field.is_list {
            FieldData::List(values)
        } else {
            FieldData::Scalar(values.pop())
        })
    }

    /// A single value, or `None` when a reference has no candidates.
    pub fn synthesize_value(
        &self,
        entity_type: &str,
        field: &FieldSpec,
        owner: &Identity,
        rng: &mut impl Rng,
    ) -> Result<Option<FieldValue>, GenerationError> {
        if let Some(pattern) = &field.pattern {
            return Ok(Some(FieldValue::String(self.catalog.generate(pattern, rng)?)));
        }

        let value = match &field.inner_type {
            InnerType::Reference { target } => {
                return Ok(self.reference(target, owner, rng).map(FieldValue::Reference));
            }
            InnerType::Link => self.link(rng),
            InnerType::Email => FieldValue::String(SafeEmail(EN).fake_with_rng(rng)),
            InnerType::Text => {
                let locale = self.locale(rng);
                FieldValue::Text {
                    value: self.words(locale, rng),
                    language: Some(locale.language().to_string()),
                }
            }
            InnerType::Temporal => FieldValue::String(temporal(rng)?),
            InnerType::Enumeration { variants, .. } => match variants.choose(rng) {
                Some(variant) => FieldValue::String(variant.clone()),
                None => return Ok(None),
            },
            InnerType::String => {
                let locale = self.locale(rng);
                FieldValue::String(self.words(locale, rng))
            }
            InnerType::Unsupported { name } => {
                return Err(GenerationError::UnsupportedFieldType {
                    entity_type: entity_type.to_string(),
                    field: field.name.clone(),
                    type_name: name.clone(),
                });
            }
        };
        Ok(Some(value))
    }

    /// A random `stableTargetId` of `target`, never the owner's own.
    fn reference(&self, target: &str, owner: &Identity, rng: &mut impl Rng) -> Option<Identifier> {
        let candidates: Vec<&Identifier> = self
            .graph
            .get(target)
            .iter()
            .map(|identity| &identity.stable_target_id)
            .filter(|id| **id != owner.stable_target_id)
            .collect();
        candidates.choose(rng).map(|id| (*id).clone())
    }

    fn locale(&self, rng: &mut impl Rng) -> Locale {
        self.locales.choose(rng).copied().unwrap_or(Locale::En)
    }

    fn words(&self, locale: Locale, rng: &mut impl Rng) -> String {
        let words: Vec<String> = localized!(locale, rng, Words(1..self.chattiness + 1));
        words.join(" ")
    }

    fn link(&self, rng: &mut impl Rng) -> FieldValue {
        let host: String = Word(EN).fake_with_rng(rng);
        let suffix: String = DomainSuffix(EN).fake_with_rng(rng);
        let path: String = Word(EN).fake_with_rng(rng);
        let url = format!("https://{}.{suffix}/{}", host.to_lowercase(), path.to_lowercase());

        if rng.gen_bool(0.5) {
            let locale = self.locale(rng);
            let title: String = localized!(locale, rng, Sentence(1..self.chattiness + 1));
            FieldValue::Link {
                url,
                title: Some(title),
                language: Some(locale.language().to_string()),
            }
        } else {
            FieldValue::Link {
                url,
                title: None,
                language: None,
            }
        }
    }
}

/// An instant between 1970 and 2030 at a random precision.
fn temporal(rng: &mut impl Rng) -> Result<String, GenerationError> {
    let timestamp = rng.gen_range(0..LATEST_TIMESTAMP);
    let instant = OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| GenerationError::Temporal(e.to_string()))?;
    let (year, month, day) = (instant.year(), u8::from(instant.month()), instant.day());

    let rendered = match PRECISIONS[rng.gen_range(0..PRECISIONS.len())] {
        Precision::Year => format!("{year:04}"),
        Precision::Month => format!("{year:04}-{month:02}"),
        Precision::Day => format!("{year:04}-{month:02}-{day:02}"),
        Precision::Minute => format!(
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}",
            instant.hour(),
            instant.minute()
        ),
        Precision::Second => instant
            .format(&Rfc3339)
            .map_err(|e| GenerationError::Temporal(e.to_string()))?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn identity(n: u32, stable: &str) -> Identity {
        Identity {
            identifier: Identifier::parse(format!("identifier{n:06}")).unwrap(),
            had_primary_source: Identifier::bootstrap(),
            identifier_in_primary_source: format!("Person-{n}"),
            stable_target_id: Identifier::parse(stable).unwrap(),
        }
    }

    fn field(inner_type: InnerType, is_list: bool, min: usize, max: usize) -> FieldSpec {
        FieldSpec {
            name: "field".to_string(),
            required: min > 0,
            is_list,
            min_items: min,
            max_items: max,
            inner_type,
            pattern: None,
        }
    }

    fn person_reference() -> InnerType {
        InnerType::Reference {
            target: "Person".to_string(),
        }
    }

    #[test]
    fn test_unsupported_type_is_fatal() {
        let catalog = PatternCatalog::new().unwrap();
        let graph = IdentityMap::new();
        let synth = ValueSynthesizer::new(&catalog, &graph, &[Locale::En], 4);
        let spec = field(
            InnerType::Unsupported {
                name: "GeoShape".to_string(),
            },
            false,
            0,
            1,
        );

        let err = synth
            .synthesize_field("Place", &spec, &identity(1, "stableperson0001"), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        match err {
            GenerationError::UnsupportedFieldType {
                entity_type,
                type_name,
                ..
            } => {
                assert_eq!(entity_type, "Place");
                assert_eq!(type_name, "GeoShape");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reference_without_candidates_is_empty() {
        let catalog = PatternCatalog::new().unwrap();
        let graph = IdentityMap::new();
        let synth = ValueSynthesizer::new(&catalog, &graph, &[Locale::En], 4);
        let owner = identity(1, "stableperson0001");
        let mut rng = StdRng::seed_from_u64(0);

        let list = synth
            .synthesize_field("Person", &field(person_reference(), true, 1, 3), &owner, &mut rng)
            .unwrap();
        assert_eq!(list, FieldData::List(vec![]));

        let scalar = synth
            .synthesize_field("Person", &field(person_reference(), false, 1, 1), &owner, &mut rng)
            .unwrap();
        assert_eq!(scalar, FieldData::Scalar(None));
    }

    #[test]
    fn test_reference_never_points_at_owner() {
        let catalog = PatternCatalog::new().unwrap();
        let owner = identity(1, "stableperson0001");
        let other = identity(2, "stableperson0002");
        let mut graph = IdentityMap::new();
        graph.push("Person", owner.clone());
        graph.push("Person", other.clone());

        let synth = ValueSynthesizer::new(&catalog, &graph, &[Locale::En], 4);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let data = synth
                .synthesize_field("Person", &field(person_reference(), true, 1, 3), &owner, &mut rng)
                .unwrap();
            assert!(!data.is_empty());
            for value in data.values() {
                assert_eq!(*value, FieldValue::Reference(other.stable_target_id.clone()));
            }
        }
    }

    #[test]
    fn test_text_and_string_respect_chattiness() {
        let catalog = PatternCatalog::new().unwrap();
        let graph = IdentityMap::new();
        let locales = [Locale::De, Locale::En, Locale::Fr];
        let synth = ValueSynthesizer::new(&catalog, &graph, &locales, 3);
        let owner = identity(1, "stableperson0001");
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..30 {
            let value = synth
                .synthesize_value("Person", &field(InnerType::Text, false, 1, 1), &owner, &mut rng)
                .unwrap()
                .unwrap();
            match value {
                FieldValue::Text { value, language } => {
                    assert!(!value.is_empty());
                    assert!(["de", "en", "fr"].contains(&language.as_deref().unwrap()));
                }
                other => panic!("unexpected {other:?}"),
            }

            let value = synth
                .synthesize_value("Person", &field(InnerType::String, false, 1, 1), &owner, &mut rng)
                .unwrap()
                .unwrap();
            match value {
                FieldValue::String(words) => assert!(words.split(' ').count() <= 3),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_pattern_takes_precedence() {
        let catalog = PatternCatalog::new().unwrap();
        let graph = IdentityMap::new();
        let synth = ValueSynthesizer::new(&catalog, &graph, &[Locale::En], 4);
        let mut spec = field(InnerType::Text, false, 1, 1);
        spec.pattern = Some(crate::patterns::ISSN.to_string());

        let value = synth
            .synthesize_value("Journal", &spec, &identity(1, "stableperson0001"), &mut StdRng::seed_from_u64(2))
            .unwrap()
            .unwrap();
        match value {
            FieldValue::String(issn) => {
                assert!(catalog.matches(crate::patterns::ISSN, &issn).unwrap())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_temporal_values_are_in_range() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let value = temporal(&mut rng).unwrap();
            let year: i32 = value[..4].parse().unwrap();
            assert!((1970..2030).contains(&year));
            assert!([4, 7, 10, 16, 20].contains(&value.len()), "{value}");
        }
    }

    #[test]
    fn test_enumeration_and_links() {
        let catalog = PatternCatalog::new().unwrap();
        let graph = IdentityMap::new();
        let synth = ValueSynthesizer::new(&catalog, &graph, &[Locale::En], 4);
        let owner = identity(1, "stableperson0001");
        let mut rng = StdRng::seed_from_u64(6);
        let variants = vec!["open".to_string(), "restricted".to_string()];
        let spec = field(
            InnerType::Enumeration {
                name: "AccessRestriction".to_string(),
                variants: variants.clone(),
            },
            false,
            1,
            1,
        );

        for _ in 0..20 {
            match synth.synthesize_value("Resource", &spec, &owner, &mut rng).unwrap() {
                Some(FieldValue::String(v)) => assert!(variants.contains(&v)),
                other => panic!("unexpected {other:?}"),
            }
            match synth
                .synthesize_value("Resource", &field(InnerType::Link, false, 1, 1), &owner, &mut rng)
                .unwrap()
            {
                Some(FieldValue::Link { url, title, language }) => {
                    assert!(url.starts_with("https://"));
                    assert_eq!(title.is_some(), language.is_some());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
