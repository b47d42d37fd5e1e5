//! Requests executed by gateways

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Identity, ModelId, Record};
use crate::security::Token;

/// What the caller wants the gateway to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Take the money
    Capture,
    /// Reserve the money
    Authorize,
    /// Provider callback
    Notify,
    /// Give the money back
    Refund,
    /// Abort an authorized payment
    Cancel,
    /// Send money to a recipient
    Payout,
    /// Compute the payment status
    GetStatus,
    /// Pull the latest state from the provider
    Sync,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Capture => "capture",
            Self::Authorize => "authorize",
            Self::Notify => "notify",
            Self::Refund => "refund",
            Self::Cancel => "cancel",
            Self::Payout => "payout",
            Self::GetStatus => "get_status",
            Self::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// Payment status as computed by a `GetStatus` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing happened yet
    New,
    /// Waiting for the payer or the provider
    Pending,
    /// Money taken
    Captured,
    /// Money reserved
    Authorized,
    /// Money returned
    Refunded,
    /// Aborted
    Canceled,
    /// Money sent to a recipient
    Payedout,
    /// Provider rejected the payment
    Failed,
    /// Status could not be computed
    Unknown,
}

impl PaymentStatus {
    /// Parse the `status` field of a details record
    #[must_use]
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            None => Self::New,
            Some("pending") => Self::Pending,
            Some("captured") => Self::Captured,
            Some("authorized") => Self::Authorized,
            Some("refunded") => Self::Refunded,
            Some("canceled") => Self::Canceled,
            Some("payedout") => Self::Payedout,
            Some("failed") => Self::Failed,
            Some(_) => Self::Unknown,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Pending => "pending",
            Self::Captured => "captured",
            Self::Authorized => "authorized",
            Self::Refunded => "refunded",
            Self::Canceled => "canceled",
            Self::Payedout => "payedout",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The model a request operates on
#[derive(Debug, Clone, PartialEq)]
pub enum RequestModel {
    /// No model attached
    Empty,
    /// Reference to a stored record, resolved by storage extensions
    Identity(Identity),
    /// Loaded record of a model
    Record {
        /// Model the record belongs to
        model: ModelId,
        /// Record content
        record: Record,
    },
}

/// A request handed to [`Gateway::execute`](crate::gateway::Gateway::execute)
#[derive(Debug, Clone)]
pub struct Request {
    /// Requested operation
    pub kind: RequestKind,
    /// Model operated on
    pub model: RequestModel,
    /// Security token the request arrived with
    pub token: Option<Token>,
    /// Status, filled by `GetStatus` actions
    pub status: Option<PaymentStatus>,
}

impl Request {
    /// Request without a model
    #[must_use]
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            model: RequestModel::Empty,
            token: None,
            status: None,
        }
    }

    /// Request on a stored record
    #[must_use]
    pub fn for_identity(kind: RequestKind, identity: Identity) -> Self {
        Self {
            model: RequestModel::Identity(identity),
            ..Self::new(kind)
        }
    }

    /// Request on an in-memory record
    #[must_use]
    pub fn for_record(kind: RequestKind, model: ModelId, record: Record) -> Self {
        Self {
            model: RequestModel::Record { model, record },
            ..Self::new(kind)
        }
    }

    /// Request built from a verified token (model = token details)
    #[must_use]
    pub fn for_token(kind: RequestKind, token: Token) -> Self {
        let model = token
            .details
            .clone()
            .map_or(RequestModel::Empty, RequestModel::Identity);
        Self {
            kind,
            model,
            token: Some(token),
            status: None,
        }
    }

    /// Loaded record, if any
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match &self.model {
            RequestModel::Record { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Mutable loaded record, if any
    pub fn record_mut(&mut self) -> Option<&mut Record> {
        match &mut self.model {
            RequestModel::Record { record, .. } => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            RequestModel::Empty => write!(f, "{}", self.kind),
            RequestModel::Identity(identity) => write!(f, "{} on {identity}", self.kind),
            RequestModel::Record { model, .. } => write!(f, "{} on {model} record", self.kind),
        }
    }
}
