//! Verification of incoming callback requests against stored tokens

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::token::{TOKEN_PARAMETER, Token};
use crate::storage::Storage;
use crate::{Error, Result};

/// The parts of an incoming HTTP request verification looks at
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: String,
    /// Full request URL
    pub url: Url,
    /// Decoded form body parameters
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// Request with `method` on `url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Url` if `url` is not an absolute URL.
    pub fn new(method: impl Into<String>, url: &str) -> Result<Self> {
        Ok(Self {
            method: method.into(),
            url: Url::parse(url)?,
            form: Vec::new(),
        })
    }

    /// `GET` request on `url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Url` if `url` is not an absolute URL.
    pub fn get(url: &str) -> Result<Self> {
        Self::new("GET", url)
    }

    /// Add a form body parameter
    #[must_use]
    pub fn with_form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    /// Parameter from the form body, falling back to the query string
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .or_else(|| {
                self.url
                    .query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
            })
    }
}

/// Checks that a request carries a valid token.
#[async_trait]
pub trait HttpRequestVerifier: Send + Sync + 'static {
    /// Token the request is authorized by.
    ///
    /// # Errors
    ///
    /// Returns `Error::Verification` with the HTTP status to answer with.
    async fn verify(&self, request: &HttpRequest) -> Result<Token>;

    /// Make `token` unusable.
    async fn invalidate(&self, token: &Token) -> Result<()>;
}

/// Verifier looking tokens up in token storage by hash
pub struct PlainHttpRequestVerifier {
    token_storage: Arc<dyn Storage>,
}

impl PlainHttpRequestVerifier {
    /// Verifier over `token_storage`
    #[must_use]
    pub fn new(token_storage: Arc<dyn Storage>) -> Self {
        Self { token_storage }
    }
}

#[async_trait]
impl HttpRequestVerifier for PlainHttpRequestVerifier {
    async fn verify(&self, request: &HttpRequest) -> Result<Token> {
        let Some(hash) = request.param(TOKEN_PARAMETER) else {
            return Err(Error::verification(400, "Token parameter not set in request"));
        };

        let Some(record) = self.token_storage.find(&hash).await? else {
            return Err(Error::verification(
                404,
                format!("A token with hash `{hash}` could not be found."),
            ));
        };
        let token = Token::from_record(record)?;

        let target = Url::parse(&token.target_url)?;
        if target.path() != request.url.path() {
            return Err(Error::verification(
                400,
                format!(
                    "The current url {} not match target url {} set in the token.",
                    request.url, token.target_url
                ),
            ));
        }

        debug!(gateway = %token.gateway_name, "Token verified");
        Ok(token)
    }

    async fn invalidate(&self, token: &Token) -> Result<()> {
        self.token_storage.delete(&token.hash).await?;
        debug!(gateway = %token.gateway_name, "Token invalidated");
        Ok(())
    }
}
