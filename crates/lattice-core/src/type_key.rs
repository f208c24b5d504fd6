use crate::Entity;
use std::fmt;
use std::sync::Arc;

pub type EntityFactory = Arc<dyn Fn() -> Box<dyn Entity> + Send + Sync>;

/// Identifies a resource family.
///
/// The registry key and the wire type usually match but are allowed to
/// differ; lookups by one never consult the other.
#[derive(Clone)]
pub struct TypeKey {
    registry_key: String,
    wire_type: String,
    cache_policy: Option<String>,
    fields: Vec<String>,
    factory: EntityFactory,
}

impl TypeKey {
    pub fn new(wire_type: impl Into<String>, factory: EntityFactory) -> Self {
        let wire_type = wire_type.into();
        Self {
            registry_key: wire_type.clone(),
            wire_type,
            cache_policy: None,
            fields: Vec::new(),
            factory,
        }
    }

    /// Key whose factory builds `E::default()`.
    pub fn of<E: Entity + Default>(wire_type: impl Into<String>) -> Self {
        Self::new(wire_type, Arc::new(|| Box::new(E::default())))
    }

    pub fn with_registry_key(mut self, registry_key: impl Into<String>) -> Self {
        self.registry_key = registry_key.into();
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: impl Into<String>) -> Self {
        self.cache_policy = Some(cache_policy.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }

    pub fn wire_type(&self) -> &str {
        &self.wire_type
    }

    pub fn cache_policy(&self) -> Option<&str> {
        self.cache_policy.as_deref()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    /// Sparse fieldset query pair, e.g. `("fields[projects]", "name,owner")`.
    pub fn fieldset_query(&self) -> Option<(String, String)> {
        if self.fields.is_empty() {
            return None;
        }
        Some((
            format!("fields[{}]", self.wire_type),
            self.fields.join(","),
        ))
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeKey")
            .field("registry_key", &self.registry_key)
            .field("wire_type", &self.wire_type)
            .field("cache_policy", &self.cache_policy)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
