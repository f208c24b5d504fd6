//! Relationship resolution against the included side-channel.
//!
//! Three strategies are offered to `Entity::hydrate_fields`:
//! simple (`read_related`), polymorphic (`read_related_polymorphic`) and
//! edge-metadata (`read_related_with_meta`). Each consults `included`
//! first; to-one linkage additionally falls back to the sibling page
//! (`all_data`). Missing targets are a resolution gap, never an error.
//!
//! Within one top-level hydration each resource is expanded at most once.
//! Later references to it, and back edges into the current chain, are
//! hydrated as leaves whose own relationships resolve as absent. This keeps
//! dense and cyclic included graphs linear in the number of edges.

use crate::entity::hydrate_with;
use crate::{
    Entity, HydrationEnvelope, HydrationError, Linkage, ResourceIdentifier, TypeKey,
    TypeRegistry, WireResource, downcast_entity,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// Resolved relationship, keeping the arity of the linkage.
#[derive(Debug)]
pub enum Related {
    One(Box<dyn Entity>),
    Many(Vec<Box<dyn Entity>>),
}

impl Related {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<Box<dyn Entity>> {
        match self {
            Self::One(entity) => vec![entity],
            Self::Many(items) => items,
        }
    }

    pub fn downcast_one<T: Entity>(self) -> Result<T, HydrationError> {
        match self {
            Self::One(entity) => downcast_entity(entity),
            Self::Many(_) => Err(HydrationError::malformed(
                "expected to-one relationship, found to-many linkage",
            )),
        }
    }

    pub fn downcast_many<T: Entity>(self) -> Result<Vec<T>, HydrationError> {
        self.into_vec().into_iter().map(downcast_entity).collect()
    }
}

/// Chain of resources currently being hydrated, innermost first.
#[derive(Clone, Copy)]
struct Frame<'a> {
    resource_type: &'a str,
    id: &'a str,
    parent: Option<&'a Frame<'a>>,
}

impl Frame<'_> {
    fn contains(&self, resource_type: &str, id: &str) -> bool {
        let mut cursor = Some(self);
        while let Some(frame) = cursor {
            if frame.resource_type == resource_type && frame.id == id {
                return true;
            }
            cursor = frame.parent;
        }
        false
    }
}

pub struct Resolver<'a> {
    envelope: &'a HydrationEnvelope,
    registry: &'a TypeRegistry,
    frame: Frame<'a>,
    leaf: bool,
    expanded: Rc<RefCell<HashSet<(String, String)>>>,
}

impl<'a> Resolver<'a> {
    pub fn new(envelope: &'a HydrationEnvelope, registry: &'a TypeRegistry) -> Self {
        let root = (
            envelope.json_api.resource_type.clone(),
            envelope.json_api.id.clone(),
        );
        Self {
            envelope,
            registry,
            frame: Frame {
                resource_type: &envelope.json_api.resource_type,
                id: &envelope.json_api.id,
                parent: None,
            },
            leaf: false,
            expanded: Rc::new(RefCell::new(HashSet::from([root]))),
        }
    }

    pub fn envelope(&self) -> &'a HydrationEnvelope {
        self.envelope
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// True when this resource closes a cycle or was already expanded
    /// elsewhere in the graph; its relationships resolve as absent.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn read_related(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<Related>, HydrationError> {
        let Some(linkage) = self.linkage(key) else {
            return Ok(None);
        };

        match linkage {
            Linkage::Many(identifiers) => {
                let mut resolved = Vec::with_capacity(identifiers.len());
                for identifier in identifiers {
                    if let Some(resource) = self.find_included(identifier) {
                        resolved.push(self.hydrate_related(resource, type_key)?);
                    }
                }
                Ok(Some(Related::Many(resolved)))
            }
            Linkage::One(identifier) => match self.find_with_fallback(identifier) {
                Some(resource) => Ok(Some(Related::One(
                    self.hydrate_related(resource, type_key)?,
                ))),
                None => Ok(None),
            },
        }
    }

    /// The related resource's own wire type picks the candidate. Unknown
    /// wire types are skipped; an empty result is `None`.
    pub fn read_related_polymorphic(
        &self,
        key: &str,
        candidates: &[&TypeKey],
    ) -> Result<Option<Related>, HydrationError> {
        let Some(linkage) = self.linkage(key) else {
            return Ok(None);
        };

        let mut by_wire_type: HashMap<&str, &TypeKey> = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            by_wire_type
                .entry(candidate.wire_type())
                .or_insert(*candidate);
        }

        match linkage {
            Linkage::Many(identifiers) => {
                let mut resolved = Vec::with_capacity(identifiers.len());
                for identifier in identifiers {
                    let Some(resource) = self.find_included(identifier) else {
                        continue;
                    };
                    let Some(type_key) = by_wire_type.get(resource.resource_type.as_str()) else {
                        debug!(
                            relationship = key,
                            wire_type = %resource.resource_type,
                            "skipping related resource with no candidate type"
                        );
                        continue;
                    };
                    resolved.push(self.hydrate_related(resource, type_key)?);
                }
                if resolved.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Related::Many(resolved)))
                }
            }
            Linkage::One(identifier) => {
                let Some(resource) = self.find_with_fallback(identifier) else {
                    return Ok(None);
                };
                match by_wire_type.get(resource.resource_type.as_str()) {
                    Some(type_key) => Ok(Some(Related::One(
                        self.hydrate_related(resource, type_key)?,
                    ))),
                    None => Ok(None),
                }
            }
        }
    }

    /// Simple resolution plus edge metadata: per-item `meta` for to-many,
    /// relationship-level `meta` for to-one.
    pub fn read_related_with_meta(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<Related>, HydrationError> {
        let Some(relationship) = self.relationship_if_resolvable(key) else {
            return Ok(None);
        };
        let Some(linkage) = relationship.data.as_ref() else {
            return Ok(None);
        };

        match linkage {
            Linkage::Many(identifiers) => {
                let mut resolved = Vec::with_capacity(identifiers.len());
                for identifier in identifiers {
                    let Some(resource) = self.find_included(identifier) else {
                        continue;
                    };
                    let mut entity = self.hydrate_related(resource, type_key)?;
                    if let Some(meta) = &identifier.meta {
                        entity.merge_edge_meta(meta);
                    }
                    resolved.push(entity);
                }
                Ok(Some(Related::Many(resolved)))
            }
            Linkage::One(identifier) => {
                let Some(resource) = self.find_with_fallback(identifier) else {
                    return Ok(None);
                };
                let mut entity = self.hydrate_related(resource, type_key)?;
                if let Some(meta) = &relationship.meta {
                    entity.merge_edge_meta(meta);
                }
                Ok(Some(Related::One(entity)))
            }
        }
    }

    pub fn read_one<T: Entity>(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<T>, HydrationError> {
        self.read_related(key, type_key)?
            .map(Related::downcast_one)
            .transpose()
    }

    pub fn read_many<T: Entity>(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<Vec<T>>, HydrationError> {
        self.read_related(key, type_key)?
            .map(Related::downcast_many)
            .transpose()
    }

    pub fn read_one_with_meta<T: Entity>(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<T>, HydrationError> {
        self.read_related_with_meta(key, type_key)?
            .map(Related::downcast_one)
            .transpose()
    }

    pub fn read_many_with_meta<T: Entity>(
        &self,
        key: &str,
        type_key: &TypeKey,
    ) -> Result<Option<Vec<T>>, HydrationError> {
        self.read_related_with_meta(key, type_key)?
            .map(Related::downcast_many)
            .transpose()
    }

    fn relationship_if_resolvable(&self, key: &str) -> Option<&'a crate::Relationship> {
        if self.leaf {
            return None;
        }
        self.envelope.relationship(key)
    }

    fn linkage(&self, key: &str) -> Option<&'a Linkage> {
        self.relationship_if_resolvable(key)?.data.as_ref()
    }

    fn find_included(&self, identifier: &ResourceIdentifier) -> Option<&'a WireResource> {
        self.envelope
            .find_included(&identifier.resource_type, &identifier.id)
    }

    fn find_with_fallback(&self, identifier: &ResourceIdentifier) -> Option<&'a WireResource> {
        self.find_included(identifier).or_else(|| {
            self.envelope
                .find_sibling(&identifier.resource_type, &identifier.id)
        })
    }

    fn hydrate_related(
        &self,
        resource: &WireResource,
        type_key: &TypeKey,
    ) -> Result<Box<dyn Entity>, HydrationError> {
        let factory = self.registry.get(type_key)?;
        let mut entity = factory();
        let leaf = self.frame.contains(&resource.resource_type, &resource.id)
            || !self
                .expanded
                .borrow_mut()
                .insert((resource.resource_type.clone(), resource.id.clone()));
        let envelope = HydrationEnvelope::new(resource.clone(), self.envelope.included.clone());
        let nested = Resolver {
            envelope: &envelope,
            registry: self.registry,
            frame: Frame {
                resource_type: &resource.resource_type,
                id: &resource.id,
                parent: Some(&self.frame),
            },
            leaf,
            expanded: Rc::clone(&self.expanded),
        };
        hydrate_with(&mut *entity, &envelope, &nested)?;
        Ok(entity)
    }
}
