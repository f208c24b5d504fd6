use crate::{
    ClientConfig, FetchRequest, Method, NoToken, ReqwestTransport, StaticToken, TokenSource,
    Transport, TransportError,
};
use futures::FutureExt;
use futures::future;
use lattice_core::{
    ApiResponse, Bootstrapper, LatticeError, OutboundDocument, PageFuture, PaginationHandler,
    Translator, TypeKey, TypeRegistry,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetch-then-translate client bound to one registry.
///
/// Every response it returns carries a pagination handler that re-enters
/// the same pipeline, so `next_page()` yields fully hydrated entities.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenSource>,
    translator: Translator,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenSource>,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens,
                translator: Translator::new(registry),
            }),
        }
    }

    /// Builds a reqwest-backed client; the token comes from the config.
    pub fn with_reqwest(
        config: ClientConfig,
        registry: Arc<TypeRegistry>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let tokens = token_source_for(&config);
        Ok(Self::new(config, transport, tokens, registry))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.inner.translator.registry()
    }

    pub async fn get(&self, type_key: &TypeKey, id: &str) -> Result<ApiResponse, LatticeError> {
        let path = format!("{}/{}", type_key.wire_type(), id);
        self.get_path(type_key, &path).await
    }

    pub async fn list(&self, type_key: &TypeKey) -> Result<ApiResponse, LatticeError> {
        self.get_path(type_key, type_key.wire_type()).await
    }

    /// GET an arbitrary path (or absolute URL) and hydrate it as `type_key`.
    pub async fn get_path(
        &self,
        type_key: &TypeKey,
        path: &str,
    ) -> Result<ApiResponse, LatticeError> {
        let url = with_fieldset(self.inner.config.endpoint(path), type_key);
        self.execute(type_key.clone(), Method::Get, url, None).await
    }

    pub async fn create(
        &self,
        type_key: &TypeKey,
        document: &OutboundDocument,
    ) -> Result<ApiResponse, LatticeError> {
        let url = self.inner.config.endpoint(type_key.wire_type());
        let body = document.to_value()?;
        self.execute(type_key.clone(), Method::Post, url, Some(body))
            .await
    }

    pub async fn update(
        &self,
        type_key: &TypeKey,
        document: &OutboundDocument,
    ) -> Result<ApiResponse, LatticeError> {
        let id = document.data.id.as_deref().ok_or_else(|| {
            LatticeError::Serialization("update payload is missing a resource id".to_string())
        })?;
        let url = self
            .inner
            .config
            .endpoint(&format!("{}/{}", type_key.wire_type(), id));
        let body = document.to_value()?;
        self.execute(type_key.clone(), Method::Patch, url, Some(body))
            .await
    }

    pub async fn delete(&self, type_key: &TypeKey, id: &str) -> Result<ApiResponse, LatticeError> {
        let url = self
            .inner
            .config
            .endpoint(&format!("{}/{}", type_key.wire_type(), id));
        self.execute(type_key.clone(), Method::Delete, url, None)
            .await
    }

    fn execute(
        &self,
        type_key: TypeKey,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> PageFuture {
        let client = self.clone();
        async move {
            let inner = &client.inner;
            let request = FetchRequest {
                method,
                url: url.clone(),
                token: inner.tokens.token().await,
                body,
                cache_policy: type_key.cache_policy().map(str::to_string),
            };
            debug!(
                method = method.as_str(),
                url = %request.url,
                type_key = type_key.registry_key(),
                "dispatching request"
            );
            let reply = inner.transport.fetch(request).await?;
            let pagination = client.pagination_handler(type_key.clone(), url);
            let response = inner
                .translator
                .translate_reply(&type_key, reply, Some(pagination))?;
            Ok::<_, LatticeError>(response)
        }
        .boxed()
    }

    /// Continuation links may be relative; they resolve against the URL of
    /// the request that produced them.
    fn pagination_handler(&self, type_key: TypeKey, request_url: String) -> PaginationHandler {
        let client = self.clone();
        Arc::new(move |link: String| match resolve_link(&request_url, &link) {
            Ok(url) => client.execute(type_key.clone(), Method::Get, url, None),
            Err(error) => future::ready(Err::<ApiResponse, LatticeError>(error.into())).boxed(),
        })
    }
}

/// Installs `bootstrapper` as the global one, runs it, and returns a
/// reqwest-backed client over the global registry.
pub fn configure(
    bootstrapper: Bootstrapper,
    config: ClientConfig,
) -> Result<ApiClient, TransportError> {
    let registry = TypeRegistry::global();
    install_bootstrapper(&registry, bootstrapper);
    ApiClient::with_reqwest(config, registry)
}

/// Registers `bootstrapper` with the registry's store and runs it eagerly.
pub fn install_bootstrapper(registry: &TypeRegistry, bootstrapper: Bootstrapper) -> bool {
    let store = registry.bootstrap_store();
    store.set_bootstrapper(bootstrapper);
    let ran = store.try_bootstrap(registry);
    info!(types = registry.len(), "type registry bootstrapped");
    ran
}

pub fn token_source_for(config: &ClientConfig) -> Arc<dyn TokenSource> {
    match &config.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(NoToken),
    }
}

fn resolve_link(request_url: &str, link: &str) -> Result<String, TransportError> {
    let base = reqwest::Url::parse(request_url).map_err(|error| {
        TransportError::Request(format!("invalid request url '{request_url}': {error}"))
    })?;
    base.join(link)
        .map(String::from)
        .map_err(|error| TransportError::Request(format!("invalid link '{link}': {error}")))
}

fn with_fieldset(url: String, type_key: &TypeKey) -> String {
    let Some((name, value)) = type_key.fieldset_query() else {
        return url;
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{name}={value}")
}
