use crate::config::{MachineConfig, ShortfallPolicy};
use crate::domain::change;
use crate::domain::coin::{Cents, Denomination, total_value};
use crate::domain::inventory::{CoinSet, Inventory, InventoryDelta};
use crate::domain::outcome::{Refund, Rejection, SettlementOutcome};
use crate::domain::payment::{PaymentEvent, PaymentMethod};
use crate::domain::ports::{BrewerBox, CardHandlerBox, CashDropBox, CoinStoreBox};
use crate::domain::state::SettlementState;
use crate::error::{Result, SettlementError};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// The hardware the engine drives.
pub struct Collaborators {
    pub brewer: BrewerBox,
    pub cash_drop: CashDropBox,
    pub card_handler: CardHandlerBox,
}

/// Settles payment events against the machine's hardware and coin stock.
///
/// A settlement reads a stock snapshot, brews, then commits, with the brewer
/// call in between. The engine holds its transaction lock for that whole span,
/// so concurrent callers are settled one after another and never plan change
/// from the same coins.
pub struct SettlementEngine {
    collaborators: Collaborators,
    coin_store: CoinStoreBox,
    config: MachineConfig,
    transaction_lock: Mutex<()>,
}

impl SettlementEngine {
    /// Creates a new `SettlementEngine`.
    ///
    /// # Arguments
    ///
    /// * `collaborators` - The brewer, change dispenser and card terminal.
    /// * `coin_store` - The coin stock the engine commits to.
    /// * `config` - Price, hopper capacity and shortfall policy.
    pub fn new(collaborators: Collaborators, coin_store: CoinStoreBox, config: MachineConfig) -> Self {
        Self {
            collaborators,
            coin_store,
            config,
            transaction_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Current coin stock.
    pub async fn stock(&self) -> Result<Inventory> {
        self.coin_store.stock().await
    }

    /// Settles one payment event from start to `Done`.
    ///
    /// Customer-facing refusals are reported in the outcome. An `Err` means the
    /// settlement could not be completed consistently: a stock invariant was
    /// broken, or a collaborator could not confirm a refund or a coin drop.
    pub async fn execute(&self, event: PaymentEvent) -> Result<SettlementOutcome> {
        let _guard = self.transaction_lock.lock().await;

        let result = match event {
            PaymentEvent::Coins(coins) => self.settle_coins(coins).await,
            PaymentEvent::CardCharge(requested) => self.settle_card(requested).await,
        };

        match &result {
            Ok(outcome) => match outcome.rejection {
                Some(rejection) => warn!(
                    method = ?outcome.method,
                    brewed = outcome.brewed,
                    refund = ?outcome.refund,
                    %rejection,
                    "settlement refused"
                ),
                None => info!(
                    method = ?outcome.method,
                    paid = outcome.paid,
                    change = outcome.change.total_value(),
                    shortfall = ?outcome.change_shortfall,
                    "settlement completed"
                ),
            },
            Err(e) => error!(error = %e, "settlement aborted"),
        }
        result
    }

    async fn settle_coins(&self, coins: Vec<Denomination>) -> Result<SettlementOutcome> {
        let price = self.config.price;
        let mut outcome = SettlementOutcome::new(PaymentMethod::Coins, 0);
        outcome.states.advance(SettlementState::Evaluating)?;

        // Capacity comes first: an overfull hopper is refused whatever its value.
        if coins.len() > self.config.hopper_capacity {
            let rejection = Rejection::HopperOverflow {
                inserted: coins.len(),
                capacity: self.config.hopper_capacity,
            };
            outcome.paid = total_value(&coins);
            return self.refuse_coins(outcome, rejection).await;
        }

        let paid = total_value(&coins);
        outcome.paid = paid;

        if coins.is_empty() {
            // Nothing in the hopper, nothing to give back.
            outcome.rejection = Some(Rejection::InsufficientPayment { paid: 0, price });
            outcome.states.advance(SettlementState::Refusing)?;
            outcome.states.advance(SettlementState::Done)?;
            return Ok(outcome);
        }

        if paid < price {
            return self
                .refuse_coins(outcome, Rejection::InsufficientPayment { paid, price })
                .await;
        }

        let change_due = paid - price;
        let change = self.plan_change(change_due).await?;
        if change.is_none() && self.config.shortfall == ShortfallPolicy::Refuse {
            return self
                .refuse_coins(outcome, Rejection::ChangeUnavailable { change: change_due })
                .await;
        }

        outcome.states.advance(SettlementState::Brewing)?;
        if !self.collaborators.brewer.make_a_coffee().await {
            outcome.states.advance(SettlementState::RefundingCoins)?;
            outcome.rejection = Some(Rejection::BrewFailure);
            self.collaborators.cash_drop.flush_stored_money().await?;
            outcome.refund = Refund::Coins(paid);
            outcome.states.advance(SettlementState::Done)?;
            return Ok(outcome);
        }
        outcome.brewed = true;

        outcome.states.advance(SettlementState::Committing)?;
        let mut delta = InventoryDelta::new();
        match &change {
            Some(change) => {
                delta.deposit(&coins);
                delta.withdraw(change);
            }
            None => {
                outcome.change_shortfall = Some(change_due);
                if self.config.credit_coins_on_shortfall {
                    delta.deposit(&coins);
                }
            }
        }
        self.coin_store.apply(&delta).await?;
        outcome.delta = delta;

        if let Some(change) = change {
            self.dispense(&change).await?;
            outcome.change = change;
        }

        outcome.states.advance(SettlementState::Done)?;
        Ok(outcome)
    }

    async fn settle_card(&self, requested: Cents) -> Result<SettlementOutcome> {
        let price = self.config.price;
        let mut outcome = SettlementOutcome::new(PaymentMethod::Card, 0);
        outcome.states.advance(SettlementState::Evaluating)?;

        if requested != price {
            info!(requested, price, "card event amount differs from price, charging price");
        }

        if !self.collaborators.card_handler.try_charge_amount(price).await {
            outcome.states.advance(SettlementState::Refusing)?;
            outcome.rejection = Some(Rejection::ChargeDeclined);
            outcome.states.advance(SettlementState::Done)?;
            return Ok(outcome);
        }
        outcome.paid = price;

        outcome.states.advance(SettlementState::Brewing)?;
        if self.collaborators.brewer.make_a_coffee().await {
            outcome.brewed = true;
        } else {
            outcome.states.advance(SettlementState::RefundingCard)?;
            outcome.rejection = Some(Rejection::BrewFailure);
            self.collaborators.card_handler.refund(price).await?;
            outcome.refund = Refund::Card(price);
        }

        outcome.states.advance(SettlementState::Done)?;
        Ok(outcome)
    }

    /// Plans change from the stock as it is now, before this payment's coins are added.
    async fn plan_change(&self, change_due: Cents) -> Result<Option<CoinSet>> {
        if change_due == 0 {
            return Ok(Some(CoinSet::new()));
        }
        let snapshot = self.coin_store.stock().await?;
        change::compute_change(i64::from(change_due), &snapshot)
    }

    async fn refuse_coins(
        &self,
        mut outcome: SettlementOutcome,
        rejection: Rejection,
    ) -> Result<SettlementOutcome> {
        outcome.states.advance(SettlementState::Refusing)?;
        outcome.rejection = Some(rejection);
        outcome.states.advance(SettlementState::RefundingCoins)?;
        self.collaborators.cash_drop.flush_stored_money().await?;
        outcome.refund = Refund::Coins(outcome.paid);
        outcome.states.advance(SettlementState::Done)?;
        Ok(outcome)
    }

    async fn dispense(&self, change: &CoinSet) -> Result<()> {
        let mut dispensed = Vec::new();
        for coin in change.coins() {
            if !self.collaborators.cash_drop.drop_cashback(coin).await {
                return Err(SettlementError::CashDropFailed { coin, dispensed });
            }
            dispensed.push(coin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coin::Denomination::*;
    use crate::domain::ports::{Brewer, CoinStore};
    use crate::infrastructure::in_memory::InMemoryCoinStore;
    use crate::infrastructure::noop::NoCardReader;
    use crate::infrastructure::simulated::{RecordingCashDrop, ScriptedBrewer, ScriptedCardHandler};

    struct Rig {
        engine: SettlementEngine,
        brewer: ScriptedBrewer,
        cash_drop: RecordingCashDrop,
        card: ScriptedCardHandler,
        store: InMemoryCoinStore,
    }

    fn rig(stock: Inventory, config: MachineConfig) -> Rig {
        let brewer = ScriptedBrewer::new();
        let cash_drop = RecordingCashDrop::new();
        let card = ScriptedCardHandler::approving();
        let store = InMemoryCoinStore::with_stock(stock);
        let engine = SettlementEngine::new(
            Collaborators {
                brewer: Box::new(brewer.clone()),
                cash_drop: Box::new(cash_drop.clone()),
                card_handler: Box::new(card.clone()),
            },
            Box::new(store.clone()),
            config,
        );
        Rig {
            engine,
            brewer,
            cash_drop,
            card,
            store,
        }
    }

    #[tokio::test]
    async fn test_exact_payment_brews_without_change() {
        let rig = rig(Inventory::new(), MachineConfig::default());

        let outcome = rig.engine.execute(vec![FiftyCents].into()).await.unwrap();

        assert!(outcome.brewed);
        assert!(outcome.change.is_empty());
        assert_eq!(outcome.rejection, None);
        assert_eq!(rig.store.stock().await.unwrap(), Inventory::from_counts([(FiftyCents, 1)]));
        assert_eq!(rig.cash_drop.flushes().await, 0);
        assert!(rig.cash_drop.dropped().await.is_empty());
    }

    #[tokio::test]
    async fn test_change_is_dispensed_largest_first() {
        let rig = rig(
            Inventory::from_counts([(TwentyCents, 5), (TenCents, 10)]),
            MachineConfig::default(),
        );

        let outcome = rig.engine.execute(vec![OneEuro].into()).await.unwrap();

        assert!(outcome.brewed);
        assert_eq!(rig.cash_drop.dropped().await, vec![TwentyCents, TwentyCents, TenCents]);
        assert_eq!(
            rig.store.stock().await.unwrap(),
            Inventory::from_counts([(TwentyCents, 3), (TenCents, 9), (OneEuro, 1)])
        );
        assert_eq!(
            outcome.states.states(),
            &[
                SettlementState::Idle,
                SettlementState::Evaluating,
                SettlementState::Brewing,
                SettlementState::Committing,
                SettlementState::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_inserted_coins_are_not_used_for_their_own_change() {
        // Paying 100 with two 50s: change is planned before the 50s are deposited.
        let rig = rig(Inventory::new(), MachineConfig::default());

        let outcome = rig.engine.execute(vec![FiftyCents, FiftyCents].into()).await.unwrap();

        assert!(outcome.brewed);
        assert_eq!(outcome.change_shortfall, Some(50));
        assert!(rig.cash_drop.dropped().await.is_empty());
        assert_eq!(rig.store.stock().await.unwrap(), Inventory::from_counts([(FiftyCents, 2)]));
    }

    #[tokio::test]
    async fn test_shortfall_without_crediting() {
        let config = MachineConfig {
            credit_coins_on_shortfall: false,
            ..MachineConfig::default()
        };
        let rig = rig(Inventory::from_counts([(TenCents, 5)]), config);

        let outcome = rig.engine.execute(vec![TwoEuros].into()).await.unwrap();

        assert!(outcome.brewed);
        assert_eq!(outcome.change_shortfall, Some(150));
        assert!(outcome.delta.is_empty());
        assert_eq!(rig.store.stock().await.unwrap(), Inventory::from_counts([(TenCents, 5)]));
    }

    #[tokio::test]
    async fn test_refuse_policy_does_not_brew() {
        let config = MachineConfig {
            shortfall: ShortfallPolicy::Refuse,
            ..MachineConfig::default()
        };
        let rig = rig(Inventory::from_counts([(TenCents, 5)]), config);

        let outcome = rig.engine.execute(vec![TwoEuros].into()).await.unwrap();

        assert!(!outcome.brewed);
        assert_eq!(outcome.rejection, Some(Rejection::ChangeUnavailable { change: 150 }));
        assert_eq!(outcome.refund, Refund::Coins(200));
        assert_eq!(rig.brewer.calls().await, 0);
        assert_eq!(rig.cash_drop.flushes().await, 1);
        assert_eq!(rig.store.stock().await.unwrap(), Inventory::from_counts([(TenCents, 5)]));
    }

    #[tokio::test]
    async fn test_empty_coin_list_does_nothing() {
        let rig = rig(Inventory::new(), MachineConfig::default());

        let outcome = rig.engine.execute(PaymentEvent::Coins(vec![])).await.unwrap();

        assert_eq!(
            outcome.rejection,
            Some(Rejection::InsufficientPayment { paid: 0, price: 50 })
        );
        assert_eq!(outcome.refund, Refund::None);
        assert_eq!(rig.brewer.calls().await, 0);
        assert_eq!(rig.cash_drop.flushes().await, 0);
    }

    #[tokio::test]
    async fn test_brew_failure_flushes_and_keeps_stock() {
        let rig = rig(Inventory::from_counts([(TwentyCents, 5)]), MachineConfig::default());
        rig.brewer.push_outcome(false).await;

        let outcome = rig.engine.execute(vec![OneEuro].into()).await.unwrap();

        assert!(!outcome.brewed);
        assert_eq!(outcome.rejection, Some(Rejection::BrewFailure));
        assert_eq!(outcome.refund, Refund::Coins(100));
        assert_eq!(outcome.final_state(), SettlementState::Done);
        assert_eq!(rig.cash_drop.flushes().await, 1);
        assert!(rig.cash_drop.dropped().await.is_empty());
        assert_eq!(rig.store.stock().await.unwrap(), Inventory::from_counts([(TwentyCents, 5)]));
    }

    #[tokio::test]
    async fn test_failed_flush_is_surfaced() {
        let rig = rig(Inventory::new(), MachineConfig::default());
        rig.cash_drop.fail_flushes().await;

        let result = rig.engine.execute(vec![TenCents].into()).await;

        assert!(matches!(result, Err(SettlementError::CollaboratorError(_))));
    }

    #[tokio::test]
    async fn test_jammed_dispenser_is_surfaced() {
        let rig = rig(Inventory::from_counts([(FiftyCents, 1)]), MachineConfig::default());
        rig.cash_drop.jam().await;

        let result = rig.engine.execute(vec![OneEuro].into()).await;

        assert!(matches!(
            result,
            Err(SettlementError::CashDropFailed { coin: FiftyCents, ref dispensed }) if dispensed.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_partial_dispense_reports_dropped_coins() {
        let rig = rig(
            Inventory::from_counts([(TwentyCents, 5), (TenCents, 10)]),
            MachineConfig::default(),
        );
        rig.cash_drop.jam_after(2).await;

        let result = rig.engine.execute(vec![OneEuro].into()).await;

        match result {
            Err(SettlementError::CashDropFailed { coin, dispensed }) => {
                assert_eq!(coin, TenCents);
                assert_eq!(dispensed, vec![TwentyCents, TwentyCents]);
            }
            other => panic!("expected CashDropFailed, got {other:?}"),
        }
        assert_eq!(rig.cash_drop.dropped().await, vec![TwentyCents, TwentyCents]);
        // The commit happened before dispensing and is not rolled back.
        assert_eq!(
            rig.store.stock().await.unwrap(),
            Inventory::from_counts([(TwentyCents, 3), (TenCents, 9), (OneEuro, 1)])
        );
    }

    /// Brews, but takes every coin out of the stock while doing so.
    struct DrainingBrewer {
        store: InMemoryCoinStore,
    }

    #[async_trait::async_trait]
    impl Brewer for DrainingBrewer {
        async fn make_a_coffee(&self) -> bool {
            let stock = self.store.stock().await.unwrap();
            let mut delta = InventoryDelta::new();
            for (denomination, count) in stock.iter() {
                delta.adjust(denomination, -i64::from(count));
            }
            self.store.apply(&delta).await.unwrap();
            true
        }
    }

    #[tokio::test]
    async fn test_negative_stock_aborts_commit() {
        let store = InMemoryCoinStore::with_stock(Inventory::from_counts([(FiftyCents, 1)]));
        let cash_drop = RecordingCashDrop::new();
        let engine = SettlementEngine::new(
            Collaborators {
                brewer: Box::new(DrainingBrewer { store: store.clone() }),
                cash_drop: Box::new(cash_drop.clone()),
                card_handler: Box::new(NoCardReader),
            },
            Box::new(store.clone()),
            MachineConfig::default(),
        );

        let result = engine.execute(vec![OneEuro].into()).await;

        assert!(matches!(
            result,
            Err(SettlementError::NegativeStock {
                denomination: FiftyCents,
                available: 0,
                delta: -1
            })
        ));
        // The inserted euro was not deposited and no change left the machine.
        assert_eq!(store.stock().await.unwrap(), Inventory::new());
        assert!(cash_drop.dropped().await.is_empty());
    }

    #[tokio::test]
    async fn test_card_charges_price_not_requested_amount() {
        let rig = rig(Inventory::new(), MachineConfig::default());

        let outcome = rig.engine.execute(PaymentEvent::CardCharge(80)).await.unwrap();

        assert!(outcome.brewed);
        assert_eq!(outcome.paid, 50);
        assert_eq!(rig.card.charges().await, vec![50]);
        assert!(rig.card.refunds().await.is_empty());
    }

    #[tokio::test]
    async fn test_card_refund_failure_is_surfaced() {
        let rig = rig(Inventory::new(), MachineConfig::default());
        rig.brewer.push_outcome(false).await;
        rig.card.fail_refunds().await;

        let result = rig.engine.execute(PaymentEvent::CardCharge(50)).await;

        assert!(matches!(result, Err(SettlementError::CollaboratorError(_))));
    }

    #[tokio::test]
    async fn test_disabled_card_reader_never_brews() {
        let brewer = ScriptedBrewer::new();
        let engine = SettlementEngine::new(
            Collaborators {
                brewer: Box::new(brewer.clone()),
                cash_drop: Box::new(RecordingCashDrop::new()),
                card_handler: Box::new(NoCardReader),
            },
            Box::new(InMemoryCoinStore::new()),
            MachineConfig::default(),
        );

        let outcome = engine.execute(PaymentEvent::CardCharge(50)).await.unwrap();

        assert_eq!(outcome.rejection, Some(Rejection::ChargeDeclined));
        assert_eq!(outcome.paid, 0);
        assert_eq!(brewer.calls().await, 0);
    }
}
