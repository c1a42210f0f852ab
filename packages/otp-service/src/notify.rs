use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Delivery seam for issued codes.
///
/// The service has no opinion on transport (email, SMS, push); it only needs
/// this one call with a success/failure outcome. Production wires in an email
/// client, tests a recording double.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, identity: &str, code: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: NotificationSender + ?Sized> NotificationSender for Arc<T> {
    async fn send(&self, identity: &str, code: &str) -> Result<(), DeliveryError> {
        (**self).send(identity, code).await
    }
}
