//! Two-step governance.

use alloy_primitives::Address;

use crate::error::TransformerError;

/// Two-step governor handoff: the current governor proposes a successor, and
/// only the proposed successor can accept. Control never moves in one step,
/// and never to the zero address.
#[derive(Debug, Clone)]
pub struct Governance {
    governor: Address,
    pending_governor: Option<Address>,
}

impl Governance {
    pub fn new(governor: Address) -> Result<Self, TransformerError> {
        if governor == Address::ZERO {
            return Err(TransformerError::GovernorIsZeroAddress);
        }
        Ok(Self {
            governor,
            pending_governor: None,
        })
    }

    pub fn governor(&self) -> Address {
        self.governor
    }

    pub fn pending_governor(&self) -> Option<Address> {
        self.pending_governor
    }

    pub fn is_governor(&self, account: Address) -> bool {
        self.governor == account
    }

    pub fn is_pending_governor(&self, account: Address) -> bool {
        self.pending_governor == Some(account)
    }

    /// Gate for governor-only operations.
    pub fn ensure_governor(&self, caller: Address) -> Result<(), TransformerError> {
        if !self.is_governor(caller) {
            return Err(TransformerError::OnlyGovernor);
        }
        Ok(())
    }

    /// Propose a successor. Replaces any handoff already in flight.
    pub fn set_pending_governor(
        &mut self,
        caller: Address,
        pending: Address,
    ) -> Result<(), TransformerError> {
        self.ensure_governor(caller)?;
        if pending == Address::ZERO {
            return Err(TransformerError::GovernorIsZeroAddress);
        }
        self.pending_governor = Some(pending);
        tracing::info!("Pending governor set to {}", pending);
        Ok(())
    }

    /// Complete the handoff. Only the proposed successor may call.
    pub fn accept_pending_governor(&mut self, caller: Address) -> Result<(), TransformerError> {
        if !self.is_pending_governor(caller) {
            return Err(TransformerError::OnlyPendingGovernor);
        }
        self.governor = caller;
        self.pending_governor = None;
        tracing::info!("Governor handoff accepted by {}", caller);
        Ok(())
    }
}
