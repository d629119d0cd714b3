//! Agent service wire types that differ from the domain types.
//!
//! Profiles, slugs, and chat requests share their shape with
//! `murmur-types`; only the metadata lookup wraps its payload.

use serde::Deserialize;

use murmur_types::message::MetaCard;

/// Response body of `GET /agent/meta?id={id}`.
#[derive(Debug, Deserialize)]
pub struct MetaEnvelope {
    pub data: MetaRecord,
}

/// Card fields as sent by the service. The reference id is not echoed back.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, alias = "url")]
    pub target_url: Option<String>,
}

impl MetaRecord {
    pub fn into_card(self, reference_id: &str) -> MetaCard {
        MetaCard {
            reference_id: reference_id.to_string(),
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            favicon_url: self.favicon_url,
            brand: self.brand,
            target_url: self.target_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_envelope_camel_case() {
        let json = r#"{"data": {"title": "Dune", "imageUrl": "https://img/1.png", "targetUrl": "https://shop/1"}}"#;
        let card = serde_json::from_str::<MetaEnvelope>(json)
            .unwrap()
            .data
            .into_card("42");
        assert_eq!(card.reference_id, "42");
        assert_eq!(card.title.as_deref(), Some("Dune"));
        assert_eq!(card.image_url.as_deref(), Some("https://img/1.png"));
        assert_eq!(card.target_url.as_deref(), Some("https://shop/1"));
    }

    #[test]
    fn test_meta_envelope_url_alias() {
        let json = r#"{"data": {"brand": "Acme", "url": "https://acme.example"}}"#;
        let card = serde_json::from_str::<MetaEnvelope>(json)
            .unwrap()
            .data
            .into_card("7");
        assert_eq!(card.brand.as_deref(), Some("Acme"));
        assert_eq!(card.target_url.as_deref(), Some("https://acme.example"));
        assert!(card.title.is_none());
    }

    #[test]
    fn test_meta_envelope_requires_data() {
        assert!(serde_json::from_str::<MetaEnvelope>(r#"{"title": "x"}"#).is_err());
        assert!(serde_json::from_str::<MetaEnvelope>(r#"{"data": null}"#).is_err());
    }
}
