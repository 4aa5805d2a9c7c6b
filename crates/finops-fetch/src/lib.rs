//! finops-fetch: retrieves billing and usage payloads from remote APIs.
//!
//! # Flow of one fetch
//!
//! ```text
//! Fetcher::fetch
//!   loop
//!   ├── EndpointResolver::resolve(endpointRef)   (secret or static)
//!   ├── substitute <vars> in server URL, path, headers, payload
//!   ├── Endpoint::client(timeout) + authorize()   (CA, insecure, identity, bearer/basic)
//!   ├── send
//!   │   ├── 200 ─▶ Payload { body, content_type }
//!   │   ├── 202 ─▶ sleep Retry-After ─▶ GET Location ─▶ GET downloadUrl ─▶ Payload
//!   │   └── else ─▶ error
//!   └── on error: RetryPolicy::backoff (5s), unlimited
//! ```
//!
//! Every request is bounded by a timeout. Sleeps and in-flight requests
//! race the shutdown channel; shutdown ends the loop with
//! [`FetchError::Cancelled`].

pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod retry;

pub use endpoint::{AuthMethod, Endpoint};
pub use error::{FetchError, FetchResult};
pub use fetcher::{DEFAULT_REQUEST_TIMEOUT, Fetcher, Payload};
pub use resolver::{EndpointResolver, SecretResolver, StaticResolver, UnavailableResolver};
pub use retry::{DEFAULT_RETRY_DELAY, RetryPolicy, pause};
