//! GLEIF API response types
//!
//! Mapping of the lei-records search payload, trimmed to the fields the
//! resolution core consumes.
//!
//! Reference: https://api.gleif.org/api/v1/lei-records

use serde::{Deserialize, Serialize};

/// Top-level API response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct GleifResponse<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMeta {
    pub pagination: Option<PaginationInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationInfo {
    #[serde(rename = "currentPage")]
    pub current_page: i32,
    #[serde(rename = "perPage")]
    pub per_page: i32,
    pub total: i32,
    #[serde(rename = "lastPage")]
    pub last_page: i32,
}

/// LEI Record as returned by the search endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeiRecord {
    pub id: String, // The LEI
    #[serde(rename = "type")]
    pub record_type: String,
    pub attributes: LeiAttributes,
    #[serde(default)]
    pub relationships: Option<LeiRelationships>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeiAttributes {
    pub lei: String,
    pub entity: EntityInfo,
    pub registration: RegistrationInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityInfo {
    #[serde(rename = "legalName")]
    pub legal_name: NameValue,

    #[serde(rename = "otherNames", default)]
    pub other_names: Vec<OtherName>,

    #[serde(rename = "legalAddress")]
    pub legal_address: Option<Address>,

    #[serde(rename = "headquartersAddress")]
    pub headquarters_address: Option<Address>,

    pub jurisdiction: Option<String>,
    pub category: Option<String>,

    #[serde(rename = "legalForm")]
    pub legal_form: Option<LegalForm>,

    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NameValue {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtherName {
    pub name: String,
    #[serde(rename = "type")]
    pub name_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Address {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegalForm {
    pub id: Option<String>,
    pub other: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationInfo {
    pub status: Option<String>,
    #[serde(rename = "initialRegistrationDate")]
    pub initial_registration_date: Option<String>,
    #[serde(rename = "lastUpdateDate")]
    pub last_update_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeiRelationships {
    #[serde(rename = "direct-parent")]
    pub direct_parent: Option<RelationshipLink>,
    #[serde(rename = "ultimate-parent")]
    pub ultimate_parent: Option<RelationshipLink>,
    #[serde(rename = "direct-children")]
    pub direct_children: Option<RelationshipLink>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationshipLink {
    pub links: RelationshipLinkData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationshipLinkData {
    pub related: Option<String>,
    #[serde(rename = "relationship-record")]
    pub relationship_record: Option<String>,
}

/// Flattened registry hit handed to the normalizer.
///
/// The nested wire shape stays at the client boundary; everything
/// downstream works with this record. Conversion is lenient; missing
/// optional sections become `None`, they never fail the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntityRecord {
    pub lei: String,
    pub legal_name: String,
    pub other_names: Vec<String>,
    pub jurisdiction: Option<String>,
    pub entity_status: Option<String>,
    pub legal_form: Option<String>,
    pub entity_category: Option<String>,
    pub registration_status: Option<String>,
    pub headquarters_country: Option<String>,
    pub headquarters_city: Option<String>,
    pub direct_parent_lei: Option<String>,
}

impl From<LeiRecord> for RawEntityRecord {
    fn from(record: LeiRecord) -> Self {
        let direct_parent_lei = record
            .relationships
            .as_ref()
            .and_then(|r| r.direct_parent.as_ref())
            .and_then(|dp| dp.links.related.as_deref())
            .and_then(extract_lei_from_url);

        let entity = record.attributes.entity;
        let hq = entity.headquarters_address.or(entity.legal_address);

        Self {
            lei: record.attributes.lei,
            legal_name: entity.legal_name.name,
            other_names: entity.other_names.into_iter().map(|n| n.name).collect(),
            jurisdiction: entity.jurisdiction,
            entity_status: entity.status,
            legal_form: entity.legal_form.and_then(|lf| lf.id.or(lf.other)),
            entity_category: entity.category,
            registration_status: record.attributes.registration.status,
            headquarters_country: hq.as_ref().and_then(|a| a.country.clone()),
            headquarters_city: hq.and_then(|a| a.city),
            direct_parent_lei,
        }
    }
}

/// Extract an LEI from a GLEIF API URL like
/// "/api/v1/lei-records/5493001KJTIIGC8Y1R12"
pub fn extract_lei_from_url(url: &str) -> Option<String> {
    url.split('/')
        .next_back()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
