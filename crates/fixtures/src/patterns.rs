//! Values for pattern-constrained string fields.
//!
//! Each known regex maps either to a template or to a lookup in an external
//! vocabulary. Template characters: `#` digit, `%` non-zero digit, `?`
//! uppercase letter, `*` lowercase letter or digit. Everything else is literal.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::info;

use crate::error::GenerationError;

pub const ORCID: &str = r"^https://orcid\.org/[0-9]{4}-[0-9]{4}-[0-9]{4}-[0-9]{3}[0-9X]$";
pub const ISNI: &str = r"^https://isni\.org/isni/[X0-9]{16}$";
pub const ROR: &str = r"^https://ror\.org/[a-z0-9]{9}$";
pub const GND: &str = r"^https://d-nb\.info/gnd/[-X0-9]{3,10}$";
pub const WIKIDATA: &str = r"^https://www\.wikidata\.org/entity/[PQ0-9]{2,64}$";
pub const VIAF: &str = r"^https://viaf\.org/viaf/[0-9]{2,22}$";
pub const GEPRIS: &str = r"^https://gepris\.dfg\.de/gepris/projekt/[0-9]{1,64}$";
pub const DOI: &str = r"^https://doi\.org/10\.[0-9]{4,9}/[-._;()/:A-Z0-9]+$";
pub const ISSN: &str = r"^[0-9]{4}-[0-9]{3}[0-9X]$";
pub const MESH: &str = r"^https://id\.nlm\.nih\.gov/mesh/[A-Z0-9]{2,64}$";

/// Marker preceding each code in a vocabulary file.
pub const VOCABULARY_MARKER: &str = "UI = ";

const TEMPLATES: &[(&str, &str)] = &[
    (ORCID, "https://orcid.org/####-####-####-####"),
    (ISNI, "https://isni.org/isni/################"),
    (ROR, "https://ror.org/0********"),
    (GND, "https://d-nb.info/gnd/%########"),
    (WIKIDATA, "https://www.wikidata.org/entity/Q%#####"),
    (VIAF, "https://viaf.org/viaf/%#########"),
    (GEPRIS, "https://gepris.dfg.de/gepris/projekt/%#######"),
    (DOI, "https://doi.org/10.%###/????.####"),
    (ISSN, "####-####"),
];

const VOCABULARY_PREFIXES: &[(&str, &str)] = &[(MESH, "https://id.nlm.nih.gov/mesh/")];

const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Expands a template character by character.
pub fn bothify(template: &str, rng: &mut impl Rng) -> String {
    template
        .chars()
        .map(|c| match c {
            '#' => char::from(b'0' + rng.gen_range(0..10)),
            '%' => char::from(b'0' + rng.gen_range(1..10)),
            '?' => char::from(b'A' + rng.gen_range(0..26)),
            '*' => char::from(LOWER_ALPHANUMERIC[rng.gen_range(0..LOWER_ALPHANUMERIC.len())]),
            other => other,
        })
        .collect()
}

/// Codes loaded from a vocabulary file, in file order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    path: PathBuf,
    codes: Vec<String>,
}

impl Vocabulary {
    /// Reads every line containing [`VOCABULARY_MARKER`] and keeps the
    /// alphanumeric code that follows it. The file may contain non-UTF-8 bytes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|e| GenerationError::VocabularyLoadFailure {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let text = String::from_utf8_lossy(&bytes);
        let codes: Vec<String> = text
            .lines()
            .filter_map(|line| {
                let start = line.find(VOCABULARY_MARKER)? + VOCABULARY_MARKER.len();
                let code: String = line[start..]
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect();
                (!code.is_empty()).then_some(code)
            })
            .collect();

        if codes.is_empty() {
            return Err(GenerationError::VocabularyLoadFailure {
                path,
                reason: format!("no lines contain {VOCABULARY_MARKER:?}"),
            });
        }

        info!("Loaded {} vocabulary codes from {}", codes.len(), path.display());
        Ok(Self { path, codes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum ValueSource {
    Template(&'static str),
    Vocabulary { prefix: &'static str },
}

#[derive(Debug, Clone)]
struct PatternRule {
    regex: Regex,
    source: ValueSource,
}

/// The fixed table of known patterns.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<(&'static str, PatternRule)>,
    vocabulary: Option<Vocabulary>,
}

impl PatternCatalog {
    pub fn new() -> Result<Self, GenerationError> {
        let templates = TEMPLATES
            .iter()
            .map(|(pattern, template)| (*pattern, ValueSource::Template(*template)));
        let vocabularies = VOCABULARY_PREFIXES
            .iter()
            .map(|(pattern, prefix)| (*pattern, ValueSource::Vocabulary { prefix: *prefix }));

        let rules = templates
            .chain(vocabularies)
            .map(|(pattern, source)| {
                let regex = Regex::new(pattern).map_err(|e| GenerationError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source: e,
                })?;
                Ok((pattern, PatternRule { regex, source }))
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;

        Ok(Self {
            rules,
            vocabulary: None,
        })
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(pattern, _)| *pattern)
    }

    fn rule(&self, pattern: &str) -> Result<&PatternRule, GenerationError> {
        self.rules
            .iter()
            .find(|(known, _)| *known == pattern)
            .map(|(_, rule)| rule)
            .ok_or_else(|| GenerationError::UnknownPattern(pattern.to_string()))
    }

    /// Fails when `pattern` is unknown or needs a vocabulary that is not loaded.
    pub fn check(&self, pattern: &str) -> Result<(), GenerationError> {
        match self.rule(pattern)?.source {
            ValueSource::Vocabulary { .. } if self.vocabulary.is_none() => {
                Err(GenerationError::VocabularyMissing(pattern.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn generate(&self, pattern: &str, rng: &mut impl Rng) -> Result<String, GenerationError> {
        match self.rule(pattern)?.source {
            ValueSource::Template(template) => Ok(bothify(template, rng)),
            ValueSource::Vocabulary { prefix } => {
                let code = self
                    .vocabulary
                    .as_ref()
                    .and_then(|v| v.codes.choose(rng))
                    .ok_or_else(|| GenerationError::VocabularyMissing(pattern.to_string()))?;
                Ok(format!("{prefix}{code}"))
            }
        }
    }

    pub fn matches(&self, pattern: &str, value: &str) -> Result<bool, GenerationError> {
        Ok(self.rule(pattern)?.regex.is_match(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::io::Write;

    fn vocabulary_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"*NEWRECORD\nRECTYPE = D\nMH = Calcimycin\nUI = D000001\n\n").unwrap();
        file.write_all(b"*NEWRECORD\nMH = Temefos\nUI = D000002\n\xff\xfe\n").unwrap();
        file.write_all(b"*NEWRECORD\nUI = C012345\n").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_templates_satisfy_their_regex() {
        let catalog = PatternCatalog::new().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for (pattern, _) in TEMPLATES {
            for _ in 0..50 {
                let value = catalog.generate(pattern, &mut rng).unwrap();
                assert!(catalog.matches(pattern, &value).unwrap(), "{value} !~ {pattern}");
            }
        }
    }

    #[test]
    fn test_bothify() {
        let mut rng = StdRng::seed_from_u64(0);
        let value = bothify("x-%#?*", &mut rng);
        let chars: Vec<char> = value.chars().collect();

        assert_eq!(&value[..2], "x-");
        assert!(('1'..='9').contains(&chars[2]));
        assert!(chars[3].is_ascii_digit());
        assert!(chars[4].is_ascii_uppercase());
        assert!(chars[5].is_ascii_lowercase() || chars[5].is_ascii_digit());
    }

    #[test]
    fn test_vocabulary_load() {
        let file = vocabulary_file();
        let vocabulary = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocabulary.codes(), &["D000001", "D000002", "C012345"]);
    }

    #[test]
    fn test_vocabulary_pattern_draws_known_codes() {
        let file = vocabulary_file();
        let catalog = PatternCatalog::new()
            .unwrap()
            .with_vocabulary(Vocabulary::load(file.path()).unwrap());
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..20 {
            let value = catalog.generate(MESH, &mut rng).unwrap();
            assert!(catalog.matches(MESH, &value).unwrap());
            let code = value.rsplit('/').next().unwrap();
            assert!(["D000001", "D000002", "C012345"].contains(&code));
        }
    }

    #[test]
    fn test_missing_vocabulary_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Vocabulary::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, GenerationError::VocabularyLoadFailure { .. }));
    }

    #[test]
    fn test_vocabulary_pattern_without_vocabulary() {
        let catalog = PatternCatalog::new().unwrap();
        assert!(catalog.check(ORCID).is_ok());
        assert!(matches!(
            catalog.check(MESH),
            Err(GenerationError::VocabularyMissing(_))
        ));
    }

    #[test]
    fn test_unknown_pattern() {
        let catalog = PatternCatalog::new().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            catalog.generate("^[a-z]+$", &mut rng),
            Err(GenerationError::UnknownPattern(_))
        ));
    }
}
