//! Retrieval policies for URIs missing from a registry.

use crate::error::RetrieveError;
use crate::resource::Resource;

#[cfg(feature = "remote")]
use std::time::Duration;

#[cfg(feature = "remote")]
use crate::specification::Specification;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fallback invoked when a requested URI has no registered resource.
///
/// Implementations produce the document for `uri` and pair it with its
/// specification. The engine calls this at most once per missing URI
/// within a single resolution step and never retries; a failure
/// surfaces to the caller as `Unretrievable`. Implementations invoked
/// concurrently for the same URI must do their own deduplication.
pub trait Retrieve: Send + Sync {
    /// Produce the resource identified by `uri`.
    ///
    /// # Errors
    ///
    /// Any error aborts the resolution step that needed the resource.
    fn retrieve(&self, uri: &str) -> Result<Resource, RetrieveError>;
}

impl<F> Retrieve for F
where
    F: Fn(&str) -> Result<Resource, RetrieveError> + Send + Sync,
{
    fn retrieve(&self, uri: &str) -> Result<Resource, RetrieveError> {
        self(uri)
    }
}

/// Retrieval policy that fetches documents over HTTP/HTTPS.
///
/// Requires the `remote` feature (enabled by default). Fetched bodies
/// are decoded as JSON and paired with the dialect they declare; a
/// default specification can be configured for documents that declare
/// none.
#[cfg(feature = "remote")]
#[derive(Debug, Clone, Default)]
pub struct HttpRetrieve {
    default_specification: Option<Specification>,
}

#[cfg(feature = "remote")]
impl HttpRetrieve {
    /// A retriever that requires fetched documents to declare their
    /// dialect.
    pub fn new() -> Self {
        Self::default()
    }

    /// A retriever that falls back to `default` for documents declaring
    /// no dialect (or an unknown one).
    pub fn with_default(default: Specification) -> Self {
        Self {
            default_specification: Some(default),
        }
    }
}

#[cfg(feature = "remote")]
impl Retrieve for HttpRetrieve {
    fn retrieve(&self, uri: &str) -> Result<Resource, RetrieveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let response = client.get(uri).send()?.error_for_status()?;
        let contents: serde_json::Value = response.json()?;
        let resource = match self.default_specification {
            Some(default) => Resource::from_contents_with_default(contents, default),
            None => Resource::from_contents(contents)?,
        };
        Ok(resource)
    }
}
