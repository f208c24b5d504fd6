//! Entity base behavior shared by every hydrated type.

use crate::{
    Attributes, EntityError, HydrationEnvelope, HydrationError, LatticeError, OutboundDocument,
    Relationship, Resolver, TypeRegistry,
};
use serde_json::Value;
use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;

/// Identity, timestamps, self link, and the property bag that receives
/// relationship edge metadata.
#[derive(Clone, Debug, Default)]
pub struct EntityBase {
    identity: Option<(String, String)>,
    created_at: Option<String>,
    updated_at: Option<String>,
    self_link: Option<String>,
    properties: Attributes,
    source: Option<HydrationEnvelope>,
}

impl EntityBase {
    pub fn type_name(&self) -> Result<&str, EntityError> {
        self.identity
            .as_ref()
            .map(|(resource_type, _)| resource_type.as_str())
            .ok_or(EntityError::NotHydrated { field: "type" })
    }

    pub fn id(&self) -> Result<&str, EntityError> {
        self.identity
            .as_ref()
            .map(|(_, id)| id.as_str())
            .ok_or(EntityError::NotHydrated { field: "id" })
    }

    pub fn is_hydrated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn self_link(&self) -> Option<&str> {
        self.self_link.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &Attributes {
        &self.properties
    }

    /// Later keys overwrite earlier ones.
    pub fn merge_properties(&mut self, values: &Attributes) {
        for (key, value) in values {
            self.properties.insert(key.clone(), value.clone());
        }
    }

    fn hydrate(&mut self, envelope: &HydrationEnvelope) -> Result<(), HydrationError> {
        if let Some((resource_type, id)) = &self.identity {
            return Err(EntityError::AlreadyHydrated {
                type_name: resource_type.clone(),
                id: id.clone(),
            }
            .into());
        }

        let resource = &envelope.json_api;
        if resource.resource_type.is_empty() || resource.id.is_empty() {
            return Err(HydrationError::malformed(format!(
                "resource identity incomplete (type '{}', id '{}')",
                resource.resource_type, resource.id
            )));
        }

        self.identity = Some((resource.resource_type.clone(), resource.id.clone()));
        self.created_at = meta_timestamp(envelope, "createdAt", "created_at");
        self.updated_at = meta_timestamp(envelope, "updatedAt", "updated_at");
        self.self_link = resource.self_link().map(str::to_string);
        self.source = Some(HydrationEnvelope::new(
            resource.clone(),
            envelope.included.clone(),
        ));
        Ok(())
    }
}

fn meta_timestamp(envelope: &HydrationEnvelope, key: &str, fallback: &str) -> Option<String> {
    envelope
        .json_api
        .meta_str(key)
        .or_else(|| envelope.json_api.meta_str(fallback))
        .map(str::to_string)
}

/// A typed, relationship-aware in-memory resource.
pub trait Entity: Any + Send + Sync + fmt::Debug {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Type-specific hydration. Runs after the base step, so `self.id()`
    /// is readable here.
    fn hydrate_fields(
        &mut self,
        envelope: &HydrationEnvelope,
        related: &Resolver<'_>,
    ) -> Result<(), HydrationError>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn merge_edge_meta(&mut self, meta: &Attributes) {
        self.base_mut().merge_properties(meta);
    }

    fn type_name(&self) -> Result<&str, EntityError> {
        self.base().type_name()
    }

    fn id(&self) -> Result<&str, EntityError> {
        self.base().id()
    }

    /// Envelope that rehydrates into an entity with the same identity and
    /// attributes.
    fn dehydrate(&self) -> Result<HydrationEnvelope, EntityError> {
        self.base()
            .source
            .clone()
            .ok_or(EntityError::NotHydrated { field: "envelope" })
    }
}

/// `rehydrate` for every entity; not overridable, so the base step always
/// runs first.
pub trait Hydrate {
    fn rehydrate(
        &mut self,
        envelope: &HydrationEnvelope,
        registry: &TypeRegistry,
    ) -> Result<(), HydrationError>;
}

impl<E: Entity + ?Sized> Hydrate for E {
    fn rehydrate(
        &mut self,
        envelope: &HydrationEnvelope,
        registry: &TypeRegistry,
    ) -> Result<(), HydrationError> {
        let resolver = Resolver::new(envelope, registry);
        hydrate_with(self, envelope, &resolver)
    }
}

pub(crate) fn hydrate_with<E: Entity + ?Sized>(
    entity: &mut E,
    envelope: &HydrationEnvelope,
    resolver: &Resolver<'_>,
) -> Result<(), HydrationError> {
    entity.base_mut().hydrate(envelope)?;
    entity.hydrate_fields(envelope, resolver)
}

/// Move a boxed entity out as its concrete type.
pub fn downcast_entity<T: Entity>(entity: Box<dyn Entity>) -> Result<T, HydrationError> {
    let found = entity
        .type_name()
        .unwrap_or("<unhydrated>")
        .to_string();
    entity
        .into_any()
        .downcast::<T>()
        .map(|entity| *entity)
        .map_err(|_| HydrationError::TypeMismatch {
            expected: type_name::<T>(),
            found,
        })
}

pub fn downcast_entity_ref<T: Entity>(entity: &dyn Entity) -> Option<&T> {
    entity.as_any().downcast_ref::<T>()
}

/// Builds the outbound document for writes of this entity type.
pub trait CreateWireRepresentation {
    type Input;

    fn create_wire_representation(input: &Self::Input) -> Result<OutboundDocument, LatticeError>;
}

/// Untyped entity that keeps attributes and linkage verbatim.
#[derive(Clone, Debug, Default)]
pub struct ResourceObject {
    base: EntityBase,
    attributes: Attributes,
    relationships: BTreeMap<String, Relationship>,
}

impl ResourceObject {
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn relationships(&self) -> &BTreeMap<String, Relationship> {
        &self.relationships
    }
}

impl Entity for ResourceObject {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn hydrate_fields(
        &mut self,
        envelope: &HydrationEnvelope,
        _related: &Resolver<'_>,
    ) -> Result<(), HydrationError> {
        self.attributes = envelope.json_api.attributes.clone();
        self.relationships = envelope.json_api.relationships.clone().unwrap_or_default();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
