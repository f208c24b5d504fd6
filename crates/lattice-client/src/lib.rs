#![doc = r#"
HTTP client for resource-document APIs, built on `lattice-core`.

| Client method | HTTP | Body |
| --- | --- | --- |
| `ApiClient::get` | `GET /{type}/{id}` | none |
| `ApiClient::list` | `GET /{type}` | none |
| `ApiClient::get_path` | `GET {path}` | none |
| `ApiClient::create` | `POST /{type}` | `OutboundDocument` |
| `ApiClient::update` | `PATCH /{type}/{id}` | `OutboundDocument` |
| `ApiClient::delete` | `DELETE /{type}/{id}` | none |

Implementation notes:
- Sparse fieldsets from `TypeKey::with_fields` are appended as `fields[type]=a,b` on reads.
- `TypeKey::with_cache_policy` is forwarded as a `Cache-Control` request header.
- Pagination continuations reuse the originating client, token source and type key.
"#]

pub mod client;
pub mod config;
pub mod errors;
pub mod testing;
pub mod token;
pub mod transport;

pub use client::{ApiClient, configure, install_bootstrapper, token_source_for};
pub use config::{
    BASE_URL_ENV, ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, TIMEOUT_ENV,
    TOKEN_ENV,
};
pub use errors::TransportError;
pub use token::{NoToken, StaticToken, TokenSource};
pub use transport::{FetchRequest, JSON_API_MEDIA_TYPE, Method, ReqwestTransport, Transport};
