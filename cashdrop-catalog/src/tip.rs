use cashdrop_shared::TipSelection;

use crate::pricing::{PricingError, TipPolicy};

/// Single-choice delivery tip state.
///
/// Selecting any option replaces the previous one; `clear` goes back to no tip.
/// Every successful mutation bumps `revision`, so a consumer holding a breakdown computed
/// at an older revision knows it is stale and must re-price.
#[derive(Debug, Clone)]
pub struct TipSelector {
    policy: TipPolicy,
    current: TipSelection,
    revision: u64,
}

impl TipSelector {
    pub fn new(policy: TipPolicy) -> Self {
        Self {
            policy,
            current: TipSelection::None,
            revision: 0,
        }
    }

    pub fn current(&self) -> TipSelection {
        self.current
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn presets(&self) -> &[u64] {
        &self.policy.presets
    }

    /// Pick a ladder value. Unknown values leave the current selection untouched.
    pub fn select_preset(&mut self, value: u64) -> Result<TipSelection, PricingError> {
        self.policy.check_preset(value)?;
        Ok(self.replace(TipSelection::Preset(value)))
    }

    /// Apply a typed tip. Zero is not a tip: callers wanting none use `clear`.
    pub fn select_custom(&mut self, value: i64) -> Result<TipSelection, PricingError> {
        self.policy.check_custom(value, None)?;
        Ok(self.replace(TipSelection::Custom(value)))
    }

    /// The explicit "remove tip" action. Idempotent.
    pub fn clear(&mut self) -> TipSelection {
        self.replace(TipSelection::None)
    }

    fn replace(&mut self, next: TipSelection) -> TipSelection {
        self.current = next;
        self.revision += 1;
        next
    }
}
