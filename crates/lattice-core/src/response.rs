use crate::{Attributes, Entity, HydrationError, LatticeError, downcast_entity, downcast_entity_ref};
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type PageFuture = BoxFuture<'static, Result<ApiResponse, LatticeError>>;

/// Re-runs fetch-then-translate for a continuation link.
pub type PaginationHandler = Arc<dyn Fn(String) -> PageFuture + Send + Sync>;

#[derive(Debug, Default)]
pub enum ResponseData {
    #[default]
    Empty,
    One(Box<dyn Entity>),
    Many(Vec<Box<dyn Entity>>),
    /// Body that was not shaped like a resource document.
    Raw(Value),
}

pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub data: ResponseData,
    pub error: Option<String>,
    pub raw: Option<Value>,
    pub meta: Option<Attributes>,
    pub self_link: Option<String>,
    pub next: Option<String>,
    pub prev: Option<String>,
    pagination: Option<PaginationHandler>,
}

impl ApiResponse {
    pub fn new(ok: bool, status: u16) -> Self {
        Self {
            ok,
            status,
            data: ResponseData::Empty,
            error: None,
            raw: None,
            meta: None,
            self_link: None,
            next: None,
            prev: None,
            pagination: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>, raw: Option<Value>) -> Self {
        Self {
            error: Some(error.into()),
            raw,
            ..Self::new(false, status)
        }
    }

    pub(crate) fn set_pagination(&mut self, handler: Option<PaginationHandler>) {
        self.pagination = handler;
    }

    pub fn has_next_page(&self) -> bool {
        self.next.is_some() && self.pagination.is_some()
    }

    pub fn has_prev_page(&self) -> bool {
        self.prev.is_some() && self.pagination.is_some()
    }

    /// Present only when the document carried `links.next` and a handler
    /// was supplied.
    pub fn next_page(&self) -> Option<PageFuture> {
        let handler = self.pagination.as_ref()?;
        let url = self.next.clone()?;
        Some(handler(url))
    }

    pub fn prev_page(&self) -> Option<PageFuture> {
        let handler = self.pagination.as_ref()?;
        let url = self.prev.clone()?;
        Some(handler(url))
    }

    pub fn entities(&self) -> Vec<&dyn Entity> {
        match &self.data {
            ResponseData::One(entity) => vec![&**entity],
            ResponseData::Many(items) => items.iter().map(|entity| &**entity).collect(),
            ResponseData::Empty | ResponseData::Raw(_) => Vec::new(),
        }
    }

    pub fn one<T: Entity>(&self) -> Option<&T> {
        match &self.data {
            ResponseData::One(entity) => downcast_entity_ref(&**entity),
            _ => None,
        }
    }

    pub fn many<T: Entity>(&self) -> Vec<&T> {
        self.entities()
            .into_iter()
            .filter_map(|entity| downcast_entity_ref::<T>(entity))
            .collect()
    }

    pub fn raw_data(&self) -> Option<&Value> {
        match &self.data {
            ResponseData::Raw(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_one<T: Entity>(self) -> Result<Option<T>, HydrationError> {
        match self.data {
            ResponseData::One(entity) => downcast_entity(entity).map(Some),
            _ => Ok(None),
        }
    }

    pub fn into_many<T: Entity>(self) -> Result<Vec<T>, HydrationError> {
        match self.data {
            ResponseData::One(entity) => Ok(vec![downcast_entity(entity)?]),
            ResponseData::Many(items) => items.into_iter().map(downcast_entity).collect(),
            ResponseData::Empty | ResponseData::Raw(_) => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("ok", &self.ok)
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .field("meta", &self.meta)
            .field("self_link", &self.self_link)
            .field("next", &self.next)
            .field("prev", &self.prev)
            .field("paginated", &self.pagination.is_some())
            .finish_non_exhaustive()
    }
}
