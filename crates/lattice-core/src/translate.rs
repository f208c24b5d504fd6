//! Envelope translation: wire document in, `ApiResponse` out.
//!
//! Only configuration errors (unregistered types) escape `translate`.
//! Malformed documents and resources are logged and skipped, and non-2xx
//! replies become `ok == false` responses.

use crate::{
    ApiResponse, DocumentLinks, Entity, Hydrate, HydrationEnvelope, HydrationError, Link,
    PaginationHandler, RegistryError, ResponseData, TypeKey, TypeRegistry, WireErrorObject,
    WireResource,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// What the transport handed back: success flag, status, decoded body.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportReply {
    pub ok: bool,
    pub status: u16,
    pub data: Value,
}

impl TransportReply {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            status: 200,
            data,
        }
    }

    pub fn from_status(status: u16, data: Value) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
            data,
        }
    }
}

#[derive(Clone)]
pub struct Translator {
    registry: Arc<TypeRegistry>,
}

impl Translator {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn global() -> Self {
        Self::new(TypeRegistry::global())
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn translate(
        &self,
        type_key: &TypeKey,
        document: Value,
        pagination: Option<PaginationHandler>,
    ) -> Result<ApiResponse, RegistryError> {
        self.translate_reply(type_key, TransportReply::success(document), pagination)
    }

    pub fn translate_reply(
        &self,
        type_key: &TypeKey,
        reply: TransportReply,
        pagination: Option<PaginationHandler>,
    ) -> Result<ApiResponse, RegistryError> {
        if !reply.ok {
            let message = failure_message(&reply);
            return Ok(ApiResponse::failure(reply.status, message, Some(reply.data)));
        }

        let mut response = ApiResponse::new(true, reply.status);
        let body = reply.data;

        match body.as_object().filter(|object| object.contains_key("data")) {
            Some(document) => self.translate_document(type_key, document, &mut response)?,
            None if body.is_null() => response.data = ResponseData::Empty,
            None => {
                debug!(
                    type_key = type_key.registry_key(),
                    "passing through body that is not a resource document"
                );
                response.data = ResponseData::Raw(body.clone());
            }
        }

        response.raw = Some(body);
        response.set_pagination(pagination);
        Ok(response)
    }

    /// Construct and rehydrate one entity through the registry.
    pub fn hydrate(
        &self,
        type_key: &TypeKey,
        envelope: &HydrationEnvelope,
    ) -> Result<Box<dyn Entity>, HydrationError> {
        let factory = self.registry.get(type_key)?;
        let mut entity = factory();
        entity.rehydrate(envelope, &self.registry)?;
        Ok(entity)
    }

    fn translate_document(
        &self,
        type_key: &TypeKey,
        document: &Map<String, Value>,
        response: &mut ApiResponse,
    ) -> Result<(), RegistryError> {
        let included: Arc<[WireResource]> =
            parse_resources(type_key, "included", document.get("included")).into();

        match document.get("data") {
            Some(Value::Array(_)) => {
                let page: Arc<[WireResource]> =
                    parse_resources(type_key, "data", document.get("data")).into();
                let mut entities = Vec::with_capacity(page.len());
                for resource in page.iter() {
                    let envelope = HydrationEnvelope::with_siblings(
                        resource.clone(),
                        included.clone(),
                        page.clone(),
                    );
                    if let Some(entity) = self.hydrate_logged(type_key, &envelope, response)? {
                        entities.push(entity);
                    }
                }
                response.data = ResponseData::Many(entities);
            }
            Some(Value::Null) | None => response.data = ResponseData::Empty,
            Some(value) => match serde_json::from_value::<WireResource>(value.clone()) {
                Ok(resource) => {
                    let envelope = HydrationEnvelope::new(resource, included);
                    if let Some(entity) = self.hydrate_logged(type_key, &envelope, response)? {
                        response.data = ResponseData::One(entity);
                    }
                }
                Err(error) => {
                    warn!(
                        type_key = type_key.registry_key(),
                        error = %error,
                        "primary data is not a resource; leaving response empty"
                    );
                    response.error = Some(format!("malformed primary data: {error}"));
                }
            },
        }

        if let Some(links) = parse_links(type_key, document.get("links")) {
            response.self_link = links.self_link.as_ref().map(href);
            response.next = links.next.as_ref().map(href);
            response.prev = links.prev.as_ref().map(href);
        }
        response.meta = document.get("meta").and_then(Value::as_object).cloned();
        Ok(())
    }

    fn hydrate_logged(
        &self,
        type_key: &TypeKey,
        envelope: &HydrationEnvelope,
        response: &mut ApiResponse,
    ) -> Result<Option<Box<dyn Entity>>, RegistryError> {
        match self.hydrate(type_key, envelope) {
            Ok(entity) => Ok(Some(entity)),
            Err(HydrationError::Registry(error)) => Err(error),
            Err(error) => {
                warn!(
                    type_key = type_key.registry_key(),
                    resource_type = %envelope.json_api.resource_type,
                    id = %envelope.json_api.id,
                    error = %error,
                    "skipping resource that failed to hydrate"
                );
                response.error.get_or_insert_with(|| error.to_string());
                Ok(None)
            }
        }
    }
}

fn parse_resources(type_key: &TypeKey, member: &str, value: Option<&Value>) -> Vec<WireResource> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(resource) => Some(resource),
                Err(error) => {
                    warn!(
                        type_key = type_key.registry_key(),
                        member,
                        error = %error,
                        "skipping malformed resource"
                    );
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!(
                type_key = type_key.registry_key(),
                member, "expected an array of resources"
            );
            Vec::new()
        }
    }
}

fn parse_links(type_key: &TypeKey, value: Option<&Value>) -> Option<DocumentLinks> {
    let value = value.filter(|value| !value.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(links) => Some(links),
        Err(error) => {
            warn!(
                type_key = type_key.registry_key(),
                error = %error,
                "ignoring malformed document links"
            );
            None
        }
    }
}

fn href(link: &Link) -> String {
    link.href().to_string()
}

fn failure_message(reply: &TransportReply) -> String {
    let from_errors = reply
        .data
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| serde_json::from_value::<WireErrorObject>(first.clone()).ok())
        .and_then(|error| error.message().map(str::to_string));

    from_errors
        .or_else(|| {
            reply
                .data
                .as_str()
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}", reply.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceObject;
    use serde_json::json;

    fn translator_with(key: &TypeKey) -> Translator {
        let registry = TypeRegistry::standalone();
        registry.register(key);
        Translator::new(Arc::new(registry))
    }

    #[test]
    fn translate_reply_not_ok_expected_failure_with_error_detail() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);
        let reply = TransportReply::from_status(
            404,
            json!({"errors": [{"status": "404", "title": "Not Found", "detail": "no project 9"}]}),
        );

        let response = translator
            .translate_reply(&key, reply, None)
            .expect("failed replies never raise");

        assert!(!response.ok);
        assert_eq!(response.status, 404);
        assert_eq!(response.error.as_deref(), Some("no project 9"));
        assert!(matches!(response.data, ResponseData::Empty));
    }

    #[test]
    fn translate_reply_not_ok_without_errors_expected_status_message() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);

        let response = translator
            .translate_reply(&key, TransportReply::from_status(502, Value::Null), None)
            .expect("failed replies never raise");

        assert_eq!(response.error.as_deref(), Some("HTTP 502"));
    }

    #[test]
    fn translate_null_data_expected_empty() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);

        let response = translator
            .translate(&key, json!({"data": null}), None)
            .expect("translate should succeed");

        assert!(response.ok);
        assert!(matches!(response.data, ResponseData::Empty));
    }

    #[test]
    fn translate_reply_no_content_expected_empty_not_raw() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);

        let response = translator
            .translate_reply(&key, TransportReply::from_status(204, Value::Null), None)
            .expect("translate should succeed");

        assert!(response.ok);
        assert_eq!(response.status, 204);
        assert!(matches!(response.data, ResponseData::Empty));
        assert!(response.raw_data().is_none());
    }

    #[test]
    fn translate_malformed_primary_resource_expected_logged_not_raised() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);

        let response = translator
            .translate(&key, json!({"data": {"type": "projects"}}), None)
            .expect("malformed documents never raise");

        assert!(matches!(response.data, ResponseData::Empty));
        assert!(response.error.is_some());
    }

    #[test]
    fn translate_collection_with_malformed_member_expected_member_skipped() {
        let key = TypeKey::of::<ResourceObject>("projects");
        let translator = translator_with(&key);

        let response = translator
            .translate(
                &key,
                json!({"data": [
                    {"type": "projects", "id": "1"},
                    {"type": "projects"},
                    {"type": "projects", "id": "3"}
                ]}),
                None,
            )
            .expect("translate should succeed");

        let ids: Vec<&str> = response
            .entities()
            .into_iter()
            .map(|entity| entity.id().expect("hydrated"))
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
