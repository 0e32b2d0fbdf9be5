use crate::domain::coin::Cents;
use crate::domain::ports::CardHandler;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Card handler for machines without a card reader.
///
/// Every charge is declined, so a card event can never lead to brewing, and a
/// refund has nothing to undo.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCardReader;

#[async_trait]
impl CardHandler for NoCardReader {
    async fn try_charge_amount(&self, amount: Cents) -> bool {
        debug!(amount, "card reader disabled, declining charge");
        false
    }

    async fn refund(&self, _amount: Cents) -> Result<()> {
        Ok(())
    }
}
