use serde::{Deserialize, Serialize};
use super::amount::Amount;

/// Which delivery tip the customer picked. Exactly one variant is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipSelection {
    #[default]
    None,
    /// One of the configured ladder values, in minor units
    Preset(u64),
    /// User-typed value in minor units; signed so bad input can be rejected rather than wrapped
    Custom(i64),
}

impl TipSelection {
    pub fn is_none(&self) -> bool {
        matches!(self, TipSelection::None)
    }
}

/// A single itemised fee (delivery fee, platform fee, tax...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub label: String,
    pub amount: Amount,
}

impl FeeLine {
    pub fn new(label: impl Into<String>, amount: Amount) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Payable breakdown derived from amount, fee schedule and tip.
///
/// Fields are read-only: `fee` and `total` are always recomputed from their parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    base_amount: Amount,
    fee: Amount,
    fee_lines: Vec<FeeLine>,
    tip: Amount,
    total: Amount,
}

impl PriceBreakdown {
    pub fn new(base_amount: Amount, fee_lines: Vec<FeeLine>, tip: Amount) -> Self {
        let fee: Amount = fee_lines.iter().map(|line| line.amount).sum();
        Self {
            base_amount,
            fee,
            fee_lines,
            tip,
            total: base_amount + fee + tip,
        }
    }

    pub fn base_amount(&self) -> Amount {
        self.base_amount
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn fee_lines(&self) -> &[FeeLine] {
        &self.fee_lines
    }

    pub fn tip(&self) -> Amount {
        self.tip
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    /// True when the stored totals match their parts (e.g. after deserializing a record).
    pub fn is_consistent(&self) -> bool {
        let fee: Amount = self.fee_lines.iter().map(|line| line.amount).sum();
        fee == self.fee && self.total == self.base_amount + self.fee + self.tip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_totals() {
        let breakdown = PriceBreakdown::new(
            Amount::from_major(500),
            vec![
                FeeLine::new("Delivery Fee", Amount::from_major(30)),
                FeeLine::new("Platform Fee", Amount::from_minor(660)),
            ],
            Amount::from_major(20),
        );

        assert_eq!(breakdown.fee(), Amount::from_minor(3_660));
        assert_eq!(breakdown.total(), Amount::from_minor(50_000 + 3_660 + 2_000));
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn test_tip_selection_serialization() {
        let json = serde_json::to_value(TipSelection::Preset(2_000)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "PRESET", "value": 2000 }));

        let none: TipSelection = serde_json::from_value(serde_json::json!({ "kind": "NONE" })).unwrap();
        assert!(none.is_none());
    }
}
