//! Generic token factory: tokens for the standard payment actions

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::token::{Token, TokenDetails, TokenFactory};
use crate::Result;

/// Action names with a relative endpoint path
pub const TOKEN_ACTIONS: [&str; 5] = ["capture", "notify", "authorize", "refund", "payout"];

/// Action name → relative endpoint path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPaths(IndexMap<String, String>);

impl TokenPaths {
    /// Path table with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    /// Path for `action`
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&str> {
        self.0.get(action).map(String::as_str)
    }

    /// Set the path for `action`
    #[must_use]
    pub fn with(mut self, action: impl Into<String>, path: impl Into<String>) -> Self {
        self.0.insert(action.into(), path.into());
        self
    }

    /// Replace entries present in `overrides`, keep the rest
    pub fn extend(&mut self, overrides: IndexMap<String, String>) {
        self.0.extend(overrides);
    }

    /// Entries in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The underlying mapping
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.0
    }
}

impl Default for TokenPaths {
    fn default() -> Self {
        Self(
            TOKEN_ACTIONS
                .iter()
                .map(|a| ((*a).to_string(), (*a).to_string()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, String>> for TokenPaths {
    fn from(paths: IndexMap<String, String>) -> Self {
        Self(paths)
    }
}

/// Token factory with helpers for the standard actions.
///
/// Capture, authorize, refund and payout tokens carry an after URL taken
/// from a second token issued for `after_path`; the payer returns through
/// that token once the action is done.
#[async_trait]
pub trait GenericTokenFactory: TokenFactory {
    /// Path table used for the action helpers
    fn paths(&self) -> &TokenPaths;

    /// Capture token returning to `after_path`
    async fn create_capture_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token>;

    /// Authorize token returning to `after_path`
    async fn create_authorize_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token>;

    /// Refund token, optionally returning to `after_path`
    async fn create_refund_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: Option<&str>,
    ) -> Result<Token>;

    /// Payout token returning to `after_path`
    async fn create_payout_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token>;

    /// Notify token, details optional
    async fn create_notify_token(&self, gateway_name: &str, details: TokenDetails)
    -> Result<Token>;
}

/// Generic token factory over any [`TokenFactory`] and a path table
pub struct PathTokenFactory {
    tokens: Arc<dyn TokenFactory>,
    paths: TokenPaths,
}

impl PathTokenFactory {
    /// Factory issuing through `tokens` with endpoints from `paths`
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenFactory>, paths: TokenPaths) -> Self {
        Self { tokens, paths }
    }

    fn path<'a>(&'a self, action: &'a str) -> &'a str {
        self.paths.get(action).unwrap_or(action)
    }

    async fn with_after(
        &self,
        action: &str,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token> {
        let after = self
            .tokens
            .create_token(gateway_name, details.clone(), after_path, None)
            .await?;
        self.tokens
            .create_token(
                gateway_name,
                details,
                self.path(action),
                Some(&after.target_url),
            )
            .await
    }
}

#[async_trait]
impl TokenFactory for PathTokenFactory {
    async fn create_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        target: &str,
        after: Option<&str>,
    ) -> Result<Token> {
        self.tokens
            .create_token(gateway_name, details, target, after)
            .await
    }
}

#[async_trait]
impl GenericTokenFactory for PathTokenFactory {
    fn paths(&self) -> &TokenPaths {
        &self.paths
    }

    async fn create_capture_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token> {
        self.with_after("capture", gateway_name, details, after_path)
            .await
    }

    async fn create_authorize_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token> {
        self.with_after("authorize", gateway_name, details, after_path)
            .await
    }

    async fn create_refund_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: Option<&str>,
    ) -> Result<Token> {
        match after_path {
            Some(after_path) => {
                self.with_after("refund", gateway_name, details, after_path)
                    .await
            }
            None => {
                self.tokens
                    .create_token(gateway_name, details, self.path("refund"), None)
                    .await
            }
        }
    }

    async fn create_payout_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
        after_path: &str,
    ) -> Result<Token> {
        self.with_after("payout", gateway_name, details, after_path)
            .await
    }

    async fn create_notify_token(
        &self,
        gateway_name: &str,
        details: TokenDetails,
    ) -> Result<Token> {
        self.tokens
            .create_token(gateway_name, details, self.path("notify"), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, ModelId, Payment};
    use crate::registry::SimpleRegistry;
    use crate::security::{DefaultTokenFactory, TOKEN_ID_FIELD};
    use crate::storage::{MemoryStorage, Storage};
    use pretty_assertions::assert_eq;

    fn factory(paths: TokenPaths) -> PathTokenFactory {
        let storage: Arc<dyn Storage> =
            Arc::new(MemoryStorage::with_id_field(Token::model_id(), TOKEN_ID_FIELD));
        let tokens = DefaultTokenFactory::new(
            storage,
            Arc::new(SimpleRegistry::default()),
            "https://shop.example",
        )
        .unwrap();
        PathTokenFactory::new(Arc::new(tokens), paths)
    }

    fn details() -> TokenDetails {
        Identity::new(ModelId::of::<Payment>(), "1").into()
    }

    #[test]
    fn default_paths_are_action_names() {
        let paths = TokenPaths::default();
        let actions: Vec<_> = paths.iter().collect();
        assert_eq!(
            actions,
            vec![
                ("capture", "capture"),
                ("notify", "notify"),
                ("authorize", "authorize"),
                ("refund", "refund"),
                ("payout", "payout"),
            ]
        );
    }

    #[test]
    fn overrides_replace_per_key() {
        let mut paths = TokenPaths::default();
        let mut overrides = IndexMap::new();
        overrides.insert("capture".to_string(), "pay/capture".to_string());
        paths.extend(overrides);

        assert_eq!(paths.get("capture"), Some("pay/capture"));
        assert_eq!(paths.get("notify"), Some("notify"));
    }

    #[tokio::test]
    async fn capture_token_returns_through_after_token() {
        let factory = factory(TokenPaths::default().with("capture", "pay/capture"));

        let token = factory
            .create_capture_token("offline", details(), "done")
            .await
            .unwrap();

        assert!(token
            .target_url
            .starts_with("https://shop.example/pay/capture?payum_token="));
        let after = token.after_url.unwrap();
        assert!(after.starts_with("https://shop.example/done?payum_token="));
    }

    #[tokio::test]
    async fn notify_and_refund_without_after() {
        let factory = factory(TokenPaths::default());

        let notify = factory
            .create_notify_token("offline", TokenDetails::None)
            .await
            .unwrap();
        assert!(notify.target_url.starts_with("https://shop.example/notify?"));
        assert!(notify.details.is_none());

        let refund = factory
            .create_refund_token("offline", details(), None)
            .await
            .unwrap();
        assert!(refund.after_url.is_none());
    }

    #[tokio::test]
    async fn unmapped_action_uses_its_own_name_as_path() {
        let factory = factory(TokenPaths::empty());
        assert_eq!(factory.path("payout"), "payout");

        let token = factory
            .create_payout_token("offline", details(), "done")
            .await
            .unwrap();
        assert!(token
            .target_url
            .starts_with("https://shop.example/payout?payum_token="));
    }
}
