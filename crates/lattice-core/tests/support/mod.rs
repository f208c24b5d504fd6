#![allow(dead_code)]

use lattice_core::{
    Attributes, CreateWireRepresentation, Entity, EntityBase, HydrationEnvelope, HydrationError,
    LatticeError, OutboundDocument, Related, ResourceIdentifier, Resolver, TypeKey, TypeRegistry,
    WirePayload, downcast_entity,
};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, LazyLock};

pub static PEOPLE: LazyLock<TypeKey> = LazyLock::new(|| TypeKey::of::<Person>("people"));
pub static PROJECTS: LazyLock<TypeKey> =
    LazyLock::new(|| TypeKey::of::<Project>("projects").with_fields(["name", "owner"]));
pub static TAXONOMIES: LazyLock<TypeKey> =
    LazyLock::new(|| TypeKey::of::<Taxonomy>("taxonomies"));
pub static LEAF_TAXONOMIES: LazyLock<TypeKey> = LazyLock::new(|| {
    TypeKey::of::<LeafTaxonomy>("leaf-taxonomies").with_registry_key("LeafTaxonomy")
});

pub fn registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::standalone();
    for key in [&*PEOPLE, &*PROJECTS, &*TAXONOMIES, &*LEAF_TAXONOMIES] {
        registry.register(key);
    }
    Arc::new(registry)
}

#[derive(Debug, Default)]
pub struct Person {
    base: EntityBase,
    pub name: String,
    pub manager: Option<Box<Person>>,
}

impl Person {
    pub fn role(&self) -> Option<&str> {
        self.base.property("role").and_then(Value::as_str)
    }
}

impl Entity for Person {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn hydrate_fields(
        &mut self,
        envelope: &HydrationEnvelope,
        related: &Resolver<'_>,
    ) -> Result<(), HydrationError> {
        self.name = envelope.json_api.attribute("name")?.unwrap_or_default();
        self.manager = related
            .read_one::<Person>("manager", &PEOPLE)?
            .map(Box::new);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[derive(Debug)]
pub enum TaxonomyNode {
    Branch(Taxonomy),
    Leaf(LeafTaxonomy),
}

impl TaxonomyNode {
    fn from_entity(entity: Box<dyn Entity>) -> Result<Self, HydrationError> {
        if entity.as_any().is::<Taxonomy>() {
            downcast_entity(entity).map(Self::Branch)
        } else {
            downcast_entity(entity).map(Self::Leaf)
        }
    }

    pub fn id(&self) -> &str {
        let id = match self {
            Self::Branch(taxonomy) => taxonomy.id(),
            Self::Leaf(leaf) => leaf.id(),
        };
        id.unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct Project {
    base: EntityBase,
    pub name: String,
    pub owner: Option<Person>,
    pub members: Option<Vec<Person>>,
    pub lead: Option<Person>,
    pub team: Option<Vec<Person>>,
    pub categories: Option<Vec<TaxonomyNode>>,
    pub relationship_prefix: String,
}

impl Entity for Project {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn hydrate_fields(
        &mut self,
        envelope: &HydrationEnvelope,
        related: &Resolver<'_>,
    ) -> Result<(), HydrationError> {
        self.relationship_prefix = format!("projects/{}", self.id()?);
        self.name = envelope.json_api.attribute("name")?.unwrap_or_default();
        self.owner = related.read_one("owner", &PEOPLE)?;
        self.members = related.read_many("members", &PEOPLE)?;
        self.lead = related.read_one_with_meta("lead", &PEOPLE)?;
        self.team = related.read_many_with_meta("team", &PEOPLE)?;
        self.categories = related
            .read_related_polymorphic("categories", &[&*TAXONOMIES, &*LEAF_TAXONOMIES])?
            .map(|resolved| {
                resolved
                    .into_vec()
                    .into_iter()
                    .map(TaxonomyNode::from_entity)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Write-side input; `None` fields are left out of the payload.
#[derive(Debug, Default, Serialize)]
pub struct ProjectInput {
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    #[serde(skip)]
    pub owner_id: Option<String>,
    #[serde(skip)]
    pub member_ids: Option<Vec<String>>,
    /// Person id and the role they lead with.
    #[serde(skip)]
    pub lead: Option<(String, String)>,
}

impl CreateWireRepresentation for Project {
    type Input = ProjectInput;

    fn create_wire_representation(input: &ProjectInput) -> Result<OutboundDocument, LatticeError> {
        let person = |id: &String| ResourceIdentifier::new(PEOPLE.wire_type(), id.clone());
        let mut payload = WirePayload::new(&PROJECTS)
            .optional_id(input.id.clone())
            .attributes_from(input)?
            .optional_to_one("owner", input.owner_id.as_ref().map(person))
            .optional_to_many(
                "members",
                input
                    .member_ids
                    .as_ref()
                    .map(|ids| ids.iter().map(person).collect()),
            );
        if let Some((id, role)) = &input.lead {
            let mut meta = Attributes::new();
            meta.insert("role".to_string(), Value::from(role.as_str()));
            payload = payload.to_one_with_meta("lead", person(id), meta);
        }
        Ok(payload.build())
    }
}

#[derive(Debug, Default)]
pub struct Taxonomy {
    base: EntityBase,
    pub label: String,
    pub parent: Option<Box<Taxonomy>>,
    pub children: Option<Vec<Taxonomy>>,
}

impl Entity for Taxonomy {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn hydrate_fields(
        &mut self,
        envelope: &HydrationEnvelope,
        related: &Resolver<'_>,
    ) -> Result<(), HydrationError> {
        self.label = envelope.json_api.attribute("label")?.unwrap_or_default();
        self.parent = related
            .read_one::<Taxonomy>("parent", &TAXONOMIES)?
            .map(Box::new);
        self.children = related.read_many("children", &TAXONOMIES)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[derive(Debug, Default)]
pub struct LeafTaxonomy {
    base: EntityBase,
    pub label: String,
}

impl Entity for LeafTaxonomy {
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
        self.label = envelope.json_api.attribute("label")?.unwrap_or_default();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

pub fn related_ids(related: Option<Related>) -> Option<Vec<String>> {
    related.map(|related| {
        related
            .into_vec()
            .iter()
            .map(|entity| entity.id().unwrap_or_default().to_string())
            .collect()
    })
}
