//! Built-in catalog entity schemas.
//!
//! Declaration order doubles as build order after the primary source type.

use super::{DeclaredField as F, DeclaredType as T, EntitySchema};
use crate::patterns;

const ACCESS_RESTRICTION: &[&str] = &["open", "restricted"];
const ACTIVITY_TYPE: &[&str] = &[
    "funded-project",
    "internal-project",
    "third-party-funded-project",
    "other",
];
const API_TYPE: &[&str] = &["rest", "soap", "sparql", "other"];
const BIBLIOGRAPHIC_RESOURCE_TYPE: &[&str] = &["article", "book", "report", "thesis"];
const CONSENT_STATUS: &[&str] = &["valid-for-processing", "invalid-for-processing"];
const CONSENT_TYPE: &[&str] = &["expressed", "implied"];
const DATA_TYPE: &[&str] = &["integer", "string", "date", "boolean", "float"];
const FREQUENCY: &[&str] = &["daily", "weekly", "monthly", "annually", "irregular"];
const LANGUAGE: &[&str] = &["de", "en"];
const LICENSE: &[&str] = &["cc-by-4.0", "cc-by-sa-4.0", "cc0-1.0"];
const MIME_TYPE: &[&str] = &["application/json", "application/pdf", "text/csv", "text/plain"];
const RESOURCE_TYPE_GENERAL: &[&str] = &["dataset", "software", "text", "image", "other"];
const TECHNICAL_ACCESSIBILITY: &[&str] = &["internal", "external"];
const THEME: &[&str] = &[
    "infectious-diseases",
    "public-health",
    "environment-and-health",
    "digital-health",
    "statistics",
];

fn list(items: T) -> T {
    T::list(items)
}

fn at_least_one(items: T) -> T {
    T::list_between(items, 1, None)
}

fn opt(inner: T) -> T {
    T::optional(inner)
}

fn id(entity_type: &str) -> T {
    T::reference(entity_type)
}

fn contact() -> T {
    T::Union {
        variants: vec![id("OrganizationalUnit"), id("Person"), id("ContactPoint")],
    }
}

fn pattern_list(name: &str, pattern: &str) -> F {
    F::new(name, list(T::String)).with_pattern(pattern)
}

pub fn schemas() -> Vec<EntitySchema> {
    vec![
        EntitySchema::new(
            "PrimarySource",
            vec![
                F::new("alternativeTitle", list(T::Text)),
                F::new("contact", list(contact())),
                F::new("description", list(T::Text)),
                F::new("documentation", list(T::Link)),
                F::new("locatedAt", list(T::Link)),
                F::new("title", list(T::Text)),
                F::new("unitInCharge", list(id("OrganizationalUnit"))),
                F::new("version", opt(T::String)),
            ],
        ),
        EntitySchema::new(
            "Organization",
            vec![
                F::required("officialName", at_least_one(T::Text)),
                F::new("alternativeName", list(T::Text)),
                pattern_list("gndId", patterns::GND),
                pattern_list("isniId", patterns::ISNI),
                pattern_list("rorId", patterns::ROR),
                F::new("shortName", list(T::Text)),
                pattern_list("viafId", patterns::VIAF),
                pattern_list("wikidataId", patterns::WIKIDATA),
            ],
        ),
        EntitySchema::new(
            "OrganizationalUnit",
            vec![
                F::required("name", at_least_one(T::Text)),
                F::new("alternativeName", list(T::Text)),
                F::new("email", list(T::Email)),
                F::new("parentUnit", opt(id("OrganizationalUnit"))),
                F::new("shortName", list(T::Text)),
                F::new("unitOf", list(id("Organization"))),
                F::new("website", list(T::Link)),
            ],
        ),
        EntitySchema::new(
            "Person",
            vec![
                F::new("affiliation", list(id("Organization"))),
                F::new("email", list(T::Email)),
                F::new("familyName", list(T::String)),
                F::new("fullName", list(T::String)),
                F::new("givenName", list(T::String)),
                pattern_list("isniId", patterns::ISNI),
                F::new("memberOf", list(id("OrganizationalUnit"))),
                pattern_list("orcidId", patterns::ORCID),
            ],
        ),
        EntitySchema::new(
            "ContactPoint",
            vec![F::required("email", at_least_one(T::Email))],
        ),
        EntitySchema::new(
            "AccessPlatform",
            vec![
                F::new("alternativeTitle", list(T::Text)),
                F::new("contact", list(contact())),
                F::new("description", list(T::Text)),
                F::new("endpointDescription", opt(T::Link)),
                F::new("endpointType", opt(T::enumeration("APIType", API_TYPE))),
                F::new("endpointURL", opt(T::Link)),
                F::new("landingPage", list(T::Link)),
                F::required(
                    "technicalAccessibility",
                    T::enumeration("TechnicalAccessibility", TECHNICAL_ACCESSIBILITY),
                ),
                F::new("title", list(T::Text)),
                F::new("unitInCharge", list(id("OrganizationalUnit"))),
            ],
        ),
        EntitySchema::new(
            "Activity",
            vec![
                F::new("abstract", list(T::Text)),
                F::new(
                    "activityType",
                    list(T::enumeration("ActivityType", ACTIVITY_TYPE)),
                ),
                F::new("alternativeTitle", list(T::Text)),
                F::required("contact", at_least_one(contact())),
                F::new("documentation", list(T::Link)),
                F::new("end", list(T::Temporal)),
                F::new(
                    "externalAssociate",
                    list(T::Union {
                        variants: vec![id("Organization"), id("Person")],
                    }),
                ),
                F::new("funderOrCommissioner", list(id("Organization"))),
                F::new("fundingProgram", list(T::String)),
                pattern_list("geprisId", patterns::GEPRIS),
                F::new("involvedPerson", list(id("Person"))),
                F::new("involvedUnit", list(id("OrganizationalUnit"))),
                F::new("isPartOfActivity", list(id("Activity"))),
                F::new("publication", list(id("BibliographicResource"))),
                F::required("responsibleUnit", at_least_one(id("OrganizationalUnit"))),
                F::new("shortName", list(T::Text)),
                F::new("start", list(T::Temporal)),
                F::new("succeeds", list(id("Activity"))),
                F::new("theme", list(T::enumeration("Theme", THEME))),
                F::required("title", at_least_one(T::Text)),
                F::new("website", list(T::Link)),
            ],
        ),
        EntitySchema::new(
            "Distribution",
            vec![
                F::new("accessService", opt(id("AccessPlatform"))),
                F::required(
                    "accessRestriction",
                    T::enumeration("AccessRestriction", ACCESS_RESTRICTION),
                ),
                F::new("accessURL", opt(T::Link)),
                F::new("downloadURL", opt(T::Link)),
                F::required("issued", T::Temporal),
                F::new("license", opt(T::enumeration("License", LICENSE))),
                F::new("mediaType", opt(T::enumeration("MIMEType", MIME_TYPE))),
                F::new("modified", opt(T::Temporal)),
                F::required("title", T::String),
            ],
        ),
        EntitySchema::new(
            "Resource",
            vec![
                F::required(
                    "accessRestriction",
                    T::enumeration("AccessRestriction", ACCESS_RESTRICTION),
                ),
                F::new(
                    "accrualPeriodicity",
                    opt(T::enumeration("Frequency", FREQUENCY)),
                ),
                F::new("alternativeTitle", list(T::Text)),
                F::required("contact", at_least_one(contact())),
                F::new("contributingUnit", list(id("OrganizationalUnit"))),
                F::new("contributor", list(id("Person"))),
                F::new("created", opt(T::Temporal)),
                F::new("creator", list(id("Person"))),
                F::new("description", list(T::Text)),
                F::new("distribution", list(id("Distribution"))),
                F::new("documentation", list(T::Link)),
                F::new("isPartOf", list(id("Resource"))),
                F::new("keyword", list(T::Text)),
                F::new("language", list(T::enumeration("Language", LANGUAGE))),
                F::new("license", opt(T::enumeration("License", LICENSE))),
                pattern_list("meshId", patterns::MESH),
                F::new("publication", list(id("BibliographicResource"))),
                F::new("publisher", list(id("Organization"))),
                F::new(
                    "resourceTypeGeneral",
                    list(T::enumeration("ResourceTypeGeneral", RESOURCE_TYPE_GENERAL)),
                ),
                F::required("theme", at_least_one(T::enumeration("Theme", THEME))),
                F::required("title", at_least_one(T::Text)),
                F::required("unitInCharge", at_least_one(id("OrganizationalUnit"))),
                F::new("wasGeneratedBy", opt(id("Activity"))),
            ],
        ),
        EntitySchema::new(
            "VariableGroup",
            vec![
                F::required("containedBy", at_least_one(id("Resource"))),
                F::required("label", at_least_one(T::Text)),
            ],
        ),
        EntitySchema::new(
            "Variable",
            vec![
                F::new("belongsTo", list(id("VariableGroup"))),
                F::new("codingSystem", opt(T::String)),
                F::new("dataType", opt(T::enumeration("DataType", DATA_TYPE))),
                F::new("description", list(T::Text)),
                F::required("label", at_least_one(T::Text)),
                F::required("usedIn", at_least_one(id("Resource"))),
                F::new("valueSet", list(T::String)),
            ],
        ),
        EntitySchema::new(
            "BibliographicResource",
            vec![
                F::required(
                    "accessRestriction",
                    T::enumeration("AccessRestriction", ACCESS_RESTRICTION),
                ),
                F::new(
                    "bibliographicResourceType",
                    list(T::enumeration(
                        "BibliographicResourceType",
                        BIBLIOGRAPHIC_RESOURCE_TYPE,
                    )),
                ),
                F::required("creator", at_least_one(id("Person"))),
                F::new("doi", opt(T::String)).with_pattern(patterns::DOI),
                pattern_list("issn", patterns::ISSN),
                F::new("keyword", list(T::Text)),
                F::new("language", list(T::enumeration("Language", LANGUAGE))),
                F::new("publicationYear", opt(T::Temporal)),
                F::new("publisher", list(id("Organization"))),
                F::required("title", at_least_one(T::Text)),
            ],
        ),
        EntitySchema::new(
            "Consent",
            vec![
                F::required(
                    "hasConsentStatus",
                    T::enumeration("ConsentStatus", CONSENT_STATUS),
                ),
                F::required("hasDataSubject", id("Person")),
                F::new("hasConsentType", opt(T::enumeration("ConsentType", CONSENT_TYPE))),
                F::required("isIndicatedAtTime", T::Temporal),
            ],
        ),
    ]
}
