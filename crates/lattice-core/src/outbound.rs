//! Write payloads: `{ data: { type, id?, attributes, relationships? } }`.
//!
//! Optional inputs that are `None` are omitted, never written as `null`;
//! omission leaves the server-side field unchanged on partial updates.

use crate::{Attributes, LatticeError, Relationship, ResourceIdentifier, TypeKey};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutboundDocument {
    pub data: OutboundResource,
}

impl OutboundDocument {
    pub fn to_value(&self) -> Result<Value, LatticeError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutboundResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

#[derive(Clone, Debug)]
pub struct WirePayload {
    resource: OutboundResource,
}

impl WirePayload {
    pub fn new(type_key: &TypeKey) -> Self {
        Self {
            resource: OutboundResource {
                resource_type: type_key.wire_type().to_string(),
                id: None,
                attributes: Attributes::new(),
                relationships: BTreeMap::new(),
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.resource.id = Some(id.into());
        self
    }

    pub fn optional_id(mut self, id: Option<impl Into<String>>) -> Self {
        if let Some(id) = id {
            self.resource.id = Some(id.into());
        }
        self
    }

    /// Always written, including an explicit `null`.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource.attributes.insert(key.into(), value.into());
        self
    }

    pub fn optional_attribute(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.attribute(key, value),
            None => self,
        }
    }

    /// Merge the members of a serializable input object. Members the input
    /// skips during serialization are left out.
    pub fn attributes_from(mut self, input: &impl Serialize) -> Result<Self, LatticeError> {
        match serde_json::to_value(input)? {
            Value::Object(members) => {
                for (key, value) in members {
                    self.resource.attributes.insert(key, value);
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(LatticeError::Serialization(format!(
                "attributes input must serialize to an object, got {other}"
            ))),
        }
    }

    pub fn to_one(mut self, key: impl Into<String>, identifier: ResourceIdentifier) -> Self {
        self.resource
            .relationships
            .insert(key.into(), Relationship::to_one(identifier));
        self
    }

    /// To-one linkage with relationship-level `meta`.
    pub fn to_one_with_meta(
        mut self,
        key: impl Into<String>,
        identifier: ResourceIdentifier,
        meta: Attributes,
    ) -> Self {
        let mut relationship = Relationship::to_one(identifier);
        relationship.meta = Some(meta);
        self.resource.relationships.insert(key.into(), relationship);
        self
    }

    pub fn optional_to_one(
        self,
        key: impl Into<String>,
        identifier: Option<ResourceIdentifier>,
    ) -> Self {
        match identifier {
            Some(identifier) => self.to_one(key, identifier),
            None => self,
        }
    }

    pub fn to_many(
        mut self,
        key: impl Into<String>,
        identifiers: impl IntoIterator<Item = ResourceIdentifier>,
    ) -> Self {
        self.resource.relationships.insert(
            key.into(),
            Relationship::to_many(identifiers.into_iter().collect()),
        );
        self
    }

    pub fn optional_to_many(
        self,
        key: impl Into<String>,
        identifiers: Option<Vec<ResourceIdentifier>>,
    ) -> Self {
        match identifiers {
            Some(identifiers) => self.to_many(key, identifiers),
            None => self,
        }
    }

    pub fn build(self) -> OutboundDocument {
        OutboundDocument {
            data: self.resource,
        }
    }
}
