//! Offline provider: payments settled outside any external system
//!
//! The record's `paid` flag says whether money was received; actions move
//! the `status` field accordingly.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::action::Action;
use crate::gateway::GatewayConfig;
use crate::model::Record;
use crate::request::{PaymentStatus, Request, RequestKind};

/// Record field: money was received
pub const FIELD_PAID: &str = "paid";
/// Record field: current status
pub const FIELD_STATUS: &str = "status";

const STATUS_PENDING: &str = "pending";
const STATUS_CAPTURED: &str = "captured";
const STATUS_AUTHORIZED: &str = "authorized";
const STATUS_REFUNDED: &str = "refunded";
const STATUS_CANCELED: &str = "canceled";
const STATUS_PAYEDOUT: &str = "payedout";

fn is_paid(record: &Record) -> bool {
    record.get(FIELD_PAID).and_then(Value::as_bool).unwrap_or(false)
}

fn status(record: &Record) -> Option<&str> {
    record.get(FIELD_STATUS).and_then(Value::as_str)
}

fn set_status(record: &mut Record, status: &str) {
    record.insert(FIELD_STATUS.to_string(), Value::String(status.to_string()));
}

/// One offline action per request kind
struct OfflineAction {
    kind: RequestKind,
}

#[async_trait]
impl Action for OfflineAction {
    fn supports(&self, request: &Request) -> bool {
        request.kind == self.kind && request.record().is_some()
    }

    async fn execute(&self, request: &mut Request) -> Result<()> {
        if self.kind == RequestKind::GetStatus {
            let computed = PaymentStatus::from_field(request.record().and_then(status));
            request.status = Some(computed);
            return Ok(());
        }

        let Some(record) = request.record_mut() else {
            return Ok(());
        };
        let paid = is_paid(record);
        let next = match self.kind {
            RequestKind::Capture => Some(if paid { STATUS_CAPTURED } else { STATUS_PENDING }),
            RequestKind::Authorize => Some(if paid {
                STATUS_AUTHORIZED
            } else {
                STATUS_PENDING
            }),
            RequestKind::Payout => Some(if paid { STATUS_PAYEDOUT } else { STATUS_PENDING }),
            RequestKind::Refund => {
                (status(record) == Some(STATUS_CAPTURED)).then_some(STATUS_REFUNDED)
            }
            RequestKind::Cancel => matches!(
                status(record),
                None | Some(STATUS_PENDING | STATUS_AUTHORIZED)
            )
            .then_some(STATUS_CANCELED),
            _ => None,
        };
        if let Some(next) = next {
            set_status(record, next);
        }
        Ok(())
    }
}

/// Install the offline actions into a provider config
pub(super) fn install(config: &mut GatewayConfig) {
    for (name, kind) in [
        ("capture", RequestKind::Capture),
        ("authorize", RequestKind::Authorize),
        ("refund", RequestKind::Refund),
        ("cancel", RequestKind::Cancel),
        ("payout", RequestKind::Payout),
        ("status", RequestKind::GetStatus),
    ] {
        config.insert(
            format!("payum.action.{name}"),
            Arc::new(OfflineAction { kind }) as Arc<dyn Action>,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{CoreGatewayFactory, GatewayFactory};
    use crate::gateway::CoreGateway;
    use crate::model::ModelId;
    use serde_json::json;

    fn gateway() -> CoreGateway {
        let mut config = GatewayConfig::new();
        install(&mut config);
        let config = CoreGatewayFactory::default().create_config(config).unwrap();
        CoreGateway::from_config(config)
    }

    fn request(kind: RequestKind, record: serde_json::Value) -> Request {
        let serde_json::Value::Object(record) = record else {
            unreachable!()
        };
        Request::for_record(kind, ModelId::new("test::Details"), record)
    }

    async fn run(gateway: &CoreGateway, request: &mut Request) {
        use crate::gateway::Gateway;
        gateway.execute(request).await.unwrap();
    }

    #[tokio::test]
    async fn capture_depends_on_paid_flag() {
        let gateway = gateway();

        let mut paid = request(RequestKind::Capture, json!({"paid": true}));
        run(&gateway, &mut paid).await;
        assert_eq!(paid.record().unwrap()[FIELD_STATUS], "captured");

        let mut unpaid = request(RequestKind::Capture, json!({}));
        run(&gateway, &mut unpaid).await;
        assert_eq!(unpaid.record().unwrap()[FIELD_STATUS], "pending");
    }

    #[tokio::test]
    async fn refund_only_after_capture() {
        let gateway = gateway();

        let mut captured = request(RequestKind::Refund, json!({"status": "captured"}));
        run(&gateway, &mut captured).await;
        assert_eq!(captured.record().unwrap()[FIELD_STATUS], "refunded");

        let mut pending = request(RequestKind::Refund, json!({"status": "pending"}));
        run(&gateway, &mut pending).await;
        assert_eq!(pending.record().unwrap()[FIELD_STATUS], "pending");
    }

    #[tokio::test]
    async fn cancel_keeps_captured_payments() {
        let gateway = gateway();

        let mut captured = request(RequestKind::Cancel, json!({"status": "captured"}));
        run(&gateway, &mut captured).await;
        assert_eq!(captured.record().unwrap()[FIELD_STATUS], "captured");

        let mut authorized = request(RequestKind::Cancel, json!({"status": "authorized"}));
        run(&gateway, &mut authorized).await;
        assert_eq!(authorized.record().unwrap()[FIELD_STATUS], "canceled");
    }

    #[tokio::test]
    async fn status_reads_status_field() {
        let gateway = gateway();

        let mut fresh = request(RequestKind::GetStatus, json!({}));
        run(&gateway, &mut fresh).await;
        assert_eq!(fresh.status, Some(PaymentStatus::New));

        let mut payout = request(RequestKind::GetStatus, json!({"status": "payedout"}));
        run(&gateway, &mut payout).await;
        assert_eq!(payout.status, Some(PaymentStatus::Payedout));
    }

    #[tokio::test]
    async fn notify_is_not_supported() {
        use crate::gateway::Gateway;
        let gateway = gateway();
        let mut notify = request(RequestKind::Notify, json!({}));
        assert!(gateway.execute(&mut notify).await.is_err());
    }
}
