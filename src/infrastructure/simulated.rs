//! Software stand-ins for the machine's hardware.
//!
//! Each collaborator records every call it receives and can be scripted to
//! fail, which makes them usable both by the simulator binary and as test
//! doubles. Clones share state, so a caller can hand one clone to the engine
//! and keep another to inspect what happened.

use crate::domain::coin::{Cents, Denomination};
use crate::domain::ports::{Brewer, CardHandler, CashDrop};
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn hardware_fault(message: &str) -> SettlementError {
    SettlementError::CollaboratorError(Box::new(std::io::Error::other(message.to_string())))
}

#[derive(Debug)]
struct BrewerState {
    scripted: VecDeque<bool>,
    fallback: bool,
    calls: usize,
}

/// A brewer that plays back queued results, then falls back to a fixed one.
#[derive(Clone)]
pub struct ScriptedBrewer {
    state: Arc<Mutex<BrewerState>>,
    delay: Option<Duration>,
}

impl Default for ScriptedBrewer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBrewer {
    /// A brewer that always succeeds.
    pub fn new() -> Self {
        Self::with_fallback(true)
    }

    /// A brewer that always fails.
    pub fn failing() -> Self {
        Self::with_fallback(false)
    }

    fn with_fallback(fallback: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(BrewerState {
                scripted: VecDeque::new(),
                fallback,
                calls: 0,
            })),
            delay: None,
        }
    }

    /// Makes every brew take `delay`, so concurrent callers interleave.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues the result of an upcoming brew.
    pub async fn push_outcome(&self, success: bool) {
        self.state.lock().await.scripted.push_back(success);
    }

    /// Drops queued results that were never consumed.
    pub async fn clear_script(&self) {
        self.state.lock().await.scripted.clear();
    }

    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }
}

#[async_trait]
impl Brewer for ScriptedBrewer {
    async fn make_a_coffee(&self) -> bool {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().await;
        state.calls += 1;
        let fallback = state.fallback;
        state.scripted.pop_front().unwrap_or(fallback)
    }
}

#[derive(Debug, Default)]
struct CashDropState {
    dropped: Vec<Denomination>,
    flushes: usize,
    drops_before_jam: Option<usize>,
    failing_flush: bool,
}

/// A change dispenser that records dropped coins and hopper flushes.
#[derive(Clone, Default)]
pub struct RecordingCashDrop {
    state: Arc<Mutex<CashDropState>>,
}

impl RecordingCashDrop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `drop_cashback` reports the coin as unavailable.
    pub async fn jam(&self) {
        self.jam_after(0).await;
    }

    /// The next `coins` drops succeed, every later one fails.
    pub async fn jam_after(&self, coins: usize) {
        self.state.lock().await.drops_before_jam = Some(coins);
    }

    /// Every `flush_stored_money` fails with a collaborator error.
    pub async fn fail_flushes(&self) {
        self.state.lock().await.failing_flush = true;
    }

    /// Coins dropped so far, in drop order.
    pub async fn dropped(&self) -> Vec<Denomination> {
        self.state.lock().await.dropped.clone()
    }

    pub async fn flushes(&self) -> usize {
        self.state.lock().await.flushes
    }
}

#[async_trait]
impl CashDrop for RecordingCashDrop {
    async fn drop_cashback(&self, coin: Denomination) -> bool {
        let mut state = self.state.lock().await;
        match state.drops_before_jam.as_mut() {
            Some(0) => return false,
            Some(left) => *left -= 1,
            None => {}
        }
        state.dropped.push(coin);
        true
    }

    async fn flush_stored_money(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing_flush {
            return Err(hardware_fault("hopper flush not confirmed"));
        }
        state.flushes += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct CardState {
    scripted: VecDeque<bool>,
    approve_by_default: bool,
    charges: Vec<Cents>,
    refunds: Vec<Cents>,
    failing_refund: bool,
}

/// A card terminal that plays back queued authorisation results.
#[derive(Clone)]
pub struct ScriptedCardHandler {
    state: Arc<Mutex<CardState>>,
}

impl Default for ScriptedCardHandler {
    fn default() -> Self {
        Self::approving()
    }
}

impl ScriptedCardHandler {
    pub fn approving() -> Self {
        Self::with_default(true)
    }

    pub fn declining() -> Self {
        Self::with_default(false)
    }

    fn with_default(approve_by_default: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(CardState {
                scripted: VecDeque::new(),
                approve_by_default,
                charges: Vec::new(),
                refunds: Vec::new(),
                failing_refund: false,
            })),
        }
    }

    pub async fn push_outcome(&self, approved: bool) {
        self.state.lock().await.scripted.push_back(approved);
    }

    pub async fn clear_script(&self) {
        self.state.lock().await.scripted.clear();
    }

    pub async fn fail_refunds(&self) {
        self.state.lock().await.failing_refund = true;
    }

    /// Amounts of every charge attempt, approved or not.
    pub async fn charges(&self) -> Vec<Cents> {
        self.state.lock().await.charges.clone()
    }

    pub async fn refunds(&self) -> Vec<Cents> {
        self.state.lock().await.refunds.clone()
    }
}

#[async_trait]
impl CardHandler for ScriptedCardHandler {
    async fn try_charge_amount(&self, amount: Cents) -> bool {
        let mut state = self.state.lock().await;
        state.charges.push(amount);
        let approve = state.approve_by_default;
        state.scripted.pop_front().unwrap_or(approve)
    }

    async fn refund(&self, amount: Cents) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing_refund {
            return Err(hardware_fault("card refund not confirmed"));
        }
        state.refunds.push(amount);
        Ok(())
    }
}
