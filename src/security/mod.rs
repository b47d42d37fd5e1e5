//! Security services: tokens, token factories and request verification
//!
//! Tokens are persisted in the token storage. The token factory issues them,
//! the generic token factory adds helpers for the standard actions, and the
//! request verifier checks callback requests against them.

mod generic;
mod token;
mod verifier;

pub use generic::{GenericTokenFactory, PathTokenFactory, TOKEN_ACTIONS, TokenPaths};
pub use token::{
    DefaultTokenFactory, TOKEN_ID_FIELD, TOKEN_PARAMETER, Token, TokenDetails, TokenFactory,
};
pub use verifier::{HttpRequest, HttpRequestVerifier, PlainHttpRequestVerifier};
