use crate::{Relationship, WireResource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Carrier handed to `rehydrate`.
///
/// `all_data` is only set when the resource came from a collection page; it
/// holds the whole page so single relationships can fall back to siblings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationEnvelope {
    pub json_api: WireResource,
    #[serde(default)]
    pub included: Arc<[WireResource]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_data: Option<Arc<[WireResource]>>,
}

impl HydrationEnvelope {
    pub fn new(json_api: WireResource, included: Arc<[WireResource]>) -> Self {
        Self {
            json_api,
            included,
            all_data: None,
        }
    }

    pub fn standalone(json_api: WireResource) -> Self {
        Self::new(json_api, Arc::from(Vec::new()))
    }

    pub fn with_siblings(
        json_api: WireResource,
        included: Arc<[WireResource]>,
        all_data: Arc<[WireResource]>,
    ) -> Self {
        Self {
            json_api,
            included,
            all_data: Some(all_data),
        }
    }

    pub fn relationship(&self, key: &str) -> Option<&Relationship> {
        self.json_api.relationship(key)
    }

    pub fn find_included(&self, resource_type: &str, id: &str) -> Option<&WireResource> {
        self.included
            .iter()
            .find(|resource| resource.matches(resource_type, id))
    }

    pub fn find_sibling(&self, resource_type: &str, id: &str) -> Option<&WireResource> {
        self.all_data
            .as_deref()?
            .iter()
            .find(|resource| resource.matches(resource_type, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serde_expected_camel_case_keys_and_no_all_data() {
        let envelope = HydrationEnvelope::new(
            WireResource::new("projects", "1"),
            Arc::from(vec![WireResource::new("people", "9")]),
        );

        let encoded = serde_json::to_value(&envelope).expect("envelope should serialize");
        assert_eq!(encoded["jsonApi"]["id"], json!("1"));
        assert_eq!(encoded["included"][0]["type"], json!("people"));
        assert!(encoded.get("allData").is_none());

        let decoded: HydrationEnvelope =
            serde_json::from_value(encoded).expect("envelope should deserialize");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn find_sibling_without_all_data_expected_none() {
        let envelope = HydrationEnvelope::standalone(WireResource::new("projects", "1"));
        assert!(envelope.find_sibling("projects", "1").is_none());
    }
}
