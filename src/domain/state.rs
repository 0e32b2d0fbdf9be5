use crate::error::{Result, SettlementError};
use serde::Serialize;
use tracing::debug;

/// Lifecycle of one settlement. Every transaction starts at `Idle` and ends at
/// `Done`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlementState {
    Idle,
    Evaluating,
    Brewing,
    Refusing,
    Committing,
    RefundingCoins,
    RefundingCard,
    Done,
}

impl SettlementState {
    pub fn can_transition_to(self, next: SettlementState) -> bool {
        use SettlementState::*;
        matches!(
            (self, next),
            (Idle, Evaluating)
                | (Evaluating, Brewing | Refusing)
                | (Brewing, Committing | RefundingCoins | RefundingCard | Done)
                | (Refusing, RefundingCoins | Done)
                | (Committing | RefundingCoins | RefundingCard, Done)
        )
    }
}

/// Ordered record of the states a settlement went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateTrail {
    states: Vec<SettlementState>,
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            states: vec![SettlementState::Idle],
        }
    }

    pub fn current(&self) -> SettlementState {
        // never empty: starts with Idle
        self.states[self.states.len() - 1]
    }

    pub fn advance(&mut self, next: SettlementState) -> Result<()> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(SettlementError::InvalidTransition { from, to: next });
        }
        debug!(?from, to = ?next, "settlement transition");
        self.states.push(next);
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.current() == SettlementState::Done
    }

    pub fn states(&self) -> &[SettlementState] {
        &self.states
    }
}
