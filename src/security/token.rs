//! Security tokens and the factory that issues them

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::model::{self, Identity, ModelId, Record};
use crate::registry::StorageRegistry;
use crate::storage::Storage;
use crate::Result;

/// Query parameter carrying the token hash
pub const TOKEN_PARAMETER: &str = "payum_token";

/// Record field identifying tokens in token storage
pub const TOKEN_ID_FIELD: &str = "hash";

/// One-time handle a callback URL carries back into the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Random, unguessable identifier
    pub hash: String,
    /// Gateway the token was issued for
    pub gateway_name: String,
    /// Model the token refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Identity>,
    /// URL the token is valid for, including the token parameter
    pub target_url: String,
    /// Where to send the payer once the target is done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_url: Option<String>,
}

impl Token {
    /// Model id of tokens in token storage
    #[must_use]
    pub fn model_id() -> ModelId {
        ModelId::of::<Self>()
    }

    /// Fresh random hash: hex encoded SHA-256 of a v4 UUID
    #[must_use]
    pub fn generate_hash() -> String {
        let mut hasher = Sha256::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Storage record of this token
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if serialization fails.
    pub fn to_record(&self) -> Result<Record> {
        model::to_record(self)
    }

    /// Token from its storage record
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` on a malformed record.
    pub fn from_record(record: Record) -> Result<Self> {
        model::from_record(record)
    }
}

/// What a token points at
#[derive(Debug, Clone, Default)]
pub enum TokenDetails {
    /// Nothing, e.g. generic notify URLs
    #[default]
    None,
    /// An already saved record
    Identity(Identity),
    /// A saved record, identified through its model's storage
    Record {
        /// Model of the record
        model: ModelId,
        /// The record itself
        record: Record,
    },
}

impl From<Identity> for TokenDetails {
    fn from(identity: Identity) -> Self {
        Self::Identity(identity)
    }
}

/// Issues tokens and persists them in token storage.
#[async_trait]
pub trait TokenFactory: Send + Sync + 'static {
    /// Create and store a token for `gateway_name`.
    ///
    /// `target` and `after` are paths relative to the factory's base URL or
    /// absolute URLs. The token parameter is appended to the target only.
    ///
    /// # Errors
    ///
    /// Returns an error if the details cannot be identified, a URL cannot be
    /// built, or token storage fails.
    async fn create_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        target: &str,
        after: Option<&str>,
    ) -> Result<Token>;
}

/// Token factory resolving paths against a base URL
pub struct DefaultTokenFactory {
    token_storage: Arc<dyn Storage>,
    storages: Arc<dyn StorageRegistry>,
    base_url: Url,
}

impl DefaultTokenFactory {
    /// Factory storing into `token_storage`, identifying record details
    /// through `storages`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Url` if `base_url` is not an absolute URL.
    pub fn new(
        token_storage: Arc<dyn Storage>,
        storages: Arc<dyn StorageRegistry>,
        base_url: &str,
    ) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        Ok(Self {
            token_storage,
            storages,
            base_url,
        })
    }

    /// Base URL relative paths resolve against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn identify(&self, details: TokenDetails) -> Result<Option<Identity>> {
        match details {
            TokenDetails::None => Ok(None),
            TokenDetails::Identity(identity) => Ok(Some(identity)),
            TokenDetails::Record { model, record } => self
                .storages
                .storage(model.as_str())?
                .identify(&record)
                .map(Some),
        }
    }
}

#[async_trait]
impl TokenFactory for DefaultTokenFactory {
    async fn create_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        target: &str,
        after: Option<&str>,
    ) -> Result<Token> {
        let hash = Token::generate_hash();

        let mut target_url = self.resolve(target)?;
        target_url
            .query_pairs_mut()
            .append_pair(TOKEN_PARAMETER, &hash);
        let after_url = after
            .map(|a| self.resolve(a).map(String::from))
            .transpose()?;

        let token = Token {
            hash,
            gateway_name: gateway_name.to_string(),
            details: self.identify(details)?,
            target_url: target_url.into(),
            after_url,
        };
        self.token_storage.update(&mut token.to_record()?).await?;
        debug!(gateway = %gateway_name, target = %token.target_url, "Token created");
        Ok(token)
    }
}
