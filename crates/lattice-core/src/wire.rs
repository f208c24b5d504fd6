//! Serde models for the resource document wire format.

use crate::HydrationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type Attributes = Map<String, Value>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, Relationship>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ResourceLinks>,
}

impl WireResource {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.resource_type, &self.id)
    }

    pub fn matches(&self, resource_type: &str, id: &str) -> bool {
        self.resource_type == resource_type && self.id == id
    }

    pub fn relationship(&self, key: &str) -> Option<&Relationship> {
        self.relationships.as_ref()?.get(key)
    }

    pub fn attribute_value(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|value| !value.is_null())
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Typed attribute read; `null` and absent both map to `None`.
    pub fn attribute<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, HydrationError> {
        let Some(value) = self.attribute_value(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone()).map(Some).map_err(|error| {
            HydrationError::malformed(format!(
                "{}/{} attribute '{key}': {error}",
                self.resource_type, self.id
            ))
        })
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.as_ref()?.get(key).and_then(Value::as_str)
    }

    pub fn self_link(&self) -> Option<&str> {
        self.links.as_ref()?.self_link.as_ref().map(Link::href)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Attributes>,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Attributes) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceIdentifier>),
    One(ResourceIdentifier),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl Relationship {
    pub fn to_one(identifier: ResourceIdentifier) -> Self {
        Self {
            data: Some(Linkage::One(identifier)),
            ..Self::default()
        }
    }

    pub fn to_many(identifiers: Vec<ResourceIdentifier>) -> Self {
        Self {
            data: Some(Linkage::Many(identifiers)),
            ..Self::default()
        }
    }
}

/// Links may be bare strings or `{ "href": ... }` objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Href(String),
    Object {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Attributes>,
    },
}

impl Link {
    pub fn href(&self) -> &str {
        match self {
            Self::Href(href) | Self::Object { href, .. } => href,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(default, alias = "previous", skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<WireResource>),
    One(Box<WireResource>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireDocument {
    #[serde(default)]
    pub data: Option<PrimaryData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<WireResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<DocumentLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WireErrorObject>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl WireErrorObject {
    pub fn message(&self) -> Option<&str> {
        self.detail.as_deref().or(self.title.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relationship_linkage_array_expected_many_variant() {
        let relationship: Relationship = serde_json::from_value(json!({
            "data": [{"type": "people", "id": "1"}, {"type": "people", "id": "2", "meta": {"role": "lead"}}]
        }))
        .expect("relationship should decode");

        let Some(Linkage::Many(items)) = relationship.data else {
            panic!("expected to-many linkage");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].meta.as_ref().and_then(|meta| meta.get("role")),
            Some(&json!("lead"))
        );
    }

    #[test]
    fn relationship_null_linkage_expected_no_data() {
        let relationship: Relationship =
            serde_json::from_value(json!({"data": null})).expect("relationship should decode");
        assert!(relationship.data.is_none());
    }

    #[test]
    fn document_links_object_and_previous_alias_expected_hrefs() {
        let links: DocumentLinks = serde_json::from_value(json!({
            "self": {"href": "https://api.test/projects?page=2"},
            "previous": "https://api.test/projects?page=1"
        }))
        .expect("links should decode");

        assert_eq!(
            links.self_link.as_ref().map(Link::href),
            Some("https://api.test/projects?page=2")
        );
        assert_eq!(
            links.prev.as_ref().map(Link::href),
            Some("https://api.test/projects?page=1")
        );
    }

    #[test]
    fn document_collection_expected_many_primary_data_and_errors_absent() {
        let document: WireDocument = serde_json::from_value(json!({
            "data": [{"type": "people", "id": "1", "attributes": {"name": "Ada"}}],
            "included": [{"type": "teams", "id": "t1"}],
            "links": {"next": "https://api.test/people?page=2"},
            "jsonapi": {"version": "1.1"}
        }))
        .expect("document should decode");

        let Some(PrimaryData::Many(items)) = document.data else {
            panic!("expected collection primary data");
        };
        assert_eq!(items[0].attribute_str("name"), Some("Ada"));
        assert_eq!(document.included.len(), 1);
        assert!(document.included[0].attributes.is_empty());
        assert_eq!(
            document.links.and_then(|links| links.next).as_ref().map(Link::href),
            Some("https://api.test/people?page=2")
        );
        assert!(document.errors.is_empty());
    }

    #[test]
    fn document_null_data_expected_none() {
        let document: WireDocument =
            serde_json::from_value(json!({"data": null})).expect("document should decode");
        assert!(document.data.is_none());
    }

    #[test]
    fn resource_attribute_wrong_type_expected_malformed_error() {
        let resource: WireResource = serde_json::from_value(json!({
            "type": "projects",
            "id": "7",
            "attributes": {"budget": "lots"}
        }))
        .expect("resource should decode");

        let error = resource
            .attribute::<u64>("budget")
            .expect_err("string budget should not decode as u64");
        assert!(matches!(error, HydrationError::Malformed(_)));
        assert_eq!(resource.attribute::<u64>("missing").expect("absent is ok"), None);
    }
}
