//! Stand-in stablecoin processor.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::domain::{PaymentError, PaymentProcessor, PaymentReceipt};

/// Waits `delay` and reports success. Nothing is charged.
pub struct PlaceholderPaymentProcessor {
    delay: Duration,
}

impl PlaceholderPaymentProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PaymentProcessor for PlaceholderPaymentProcessor {
    #[instrument(skip(self))]
    async fn pay(&self, name: &str, amount: u64) -> Result<PaymentReceipt, PaymentError> {
        tokio::time::sleep(self.delay).await;
        warn!(name = %name, amount, "Placeholder processor: stablecoin payment not actually collected");
        Ok(PaymentReceipt {
            reference: format!("placeholder-{}", Uuid::new_v4()),
        })
    }
}
