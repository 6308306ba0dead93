use serde::{Deserialize, Serialize};
use cashdrop_shared::{Amount, FeeLine, PriceBreakdown, TipSelection};
use tracing::debug;

/// Which tier owns an amount sitting exactly on a tier boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierEdge {
    #[default]
    HigherTier,
    LowerTier,
}

/// Amount range starting at `from` (minor units) and running up to the next tier's `from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub from: u64,
    #[serde(default)]
    pub flat: u64,
    #[serde(default)]
    pub rate_bps: u32,
}

impl FeeTier {
    pub fn new(from: u64, flat: u64, rate_bps: u32) -> Self {
        Self { from, flat, rate_bps }
    }
}

/// Tiered fee rule. Supplied as configuration, never hard-coded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default = "default_fee_label")]
    pub label: String,
    pub tiers: Vec<FeeTier>,
    #[serde(default)]
    pub edge: TierEdge,
}

fn default_fee_label() -> String {
    "Service Fee".to_string()
}

impl FeeSchedule {
    pub fn new(tiers: Vec<FeeTier>) -> Self {
        Self {
            label: default_fee_label(),
            tiers,
            edge: TierEdge::HigherTier,
        }
    }

    /// Single zero-fee tier
    pub fn free() -> Self {
        Self::new(vec![FeeTier::new(0, 0, 0)])
    }

    pub fn with_edge(mut self, edge: TierEdge) -> Self {
        self.edge = edge;
        self
    }

    /// Tiers must start at 0, ascend strictly, and never get cheaper. That keeps the fee
    /// monotonic non-decreasing in the amount.
    pub fn validate(&self) -> Result<(), PricingError> {
        let first = self.tiers.first()
            .ok_or_else(|| PricingError::InvalidSchedule("fee schedule has no tiers".to_string()))?;
        if first.from != 0 {
            return Err(PricingError::InvalidSchedule(format!(
                "first tier must start at 0, starts at {}",
                first.from
            )));
        }

        for pair in self.tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.from <= lower.from {
                return Err(PricingError::InvalidSchedule(format!(
                    "tier boundaries must ascend: {} after {}",
                    upper.from, lower.from
                )));
            }
            if upper.flat < lower.flat || upper.rate_bps < lower.rate_bps {
                return Err(PricingError::InvalidSchedule(format!(
                    "tier starting at {} is cheaper than the tier below it",
                    upper.from
                )));
            }
        }

        Ok(())
    }

    /// Tier owning `amount`, honouring the edge tie-break
    pub fn tier_for(&self, amount: Amount) -> Option<&FeeTier> {
        let amount = amount.minor();
        self.tiers.iter().rev().find(|tier| match self.edge {
            TierEdge::HigherTier => tier.from <= amount,
            TierEdge::LowerTier => tier.from < amount || tier.from == 0,
        })
    }

    pub fn fee_for(&self, amount: Amount) -> Amount {
        self.tier_for(amount)
            .map(|tier| Amount::from_minor(tier.flat) + amount.apply_bps(tier.rate_bps))
            .unwrap_or(Amount::ZERO)
    }
}

/// Per-order fee line applied on top of the tier fee (delivery fee, platform fee, tax)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surcharge {
    pub label: String,
    #[serde(default)]
    pub flat: u64,
    #[serde(default)]
    pub rate_bps: u32,
}

impl Surcharge {
    pub fn flat(label: &str, flat: u64) -> Self {
        Self { label: label.to_string(), flat, rate_bps: 0 }
    }

    pub fn rate(label: &str, rate_bps: u32) -> Self {
        Self { label: label.to_string(), flat: 0, rate_bps }
    }

    fn amount_for(&self, base: Amount) -> Amount {
        Amount::from_minor(self.flat) + base.apply_bps(self.rate_bps)
    }
}

/// Preset ladder and bounds for delivery tips
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipPolicy {
    /// Ascending preset values in minor units
    pub presets: Vec<u64>,
    pub custom_ceiling: u64,
    /// Also reject custom tips larger than the requested amount
    #[serde(default)]
    pub cap_at_amount: bool,
}

impl TipPolicy {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.presets.iter().any(|&p| p == 0) {
            return Err(PricingError::InvalidTipPolicy("preset tips must be non-zero".to_string()));
        }
        if self.presets.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PricingError::InvalidTipPolicy("preset tips must be strictly ascending".to_string()));
        }
        if self.custom_ceiling == 0 {
            return Err(PricingError::InvalidTipPolicy("custom tip ceiling must be positive".to_string()));
        }
        Ok(())
    }

    pub fn check_preset(&self, value: u64) -> Result<Amount, PricingError> {
        if self.presets.contains(&value) {
            Ok(Amount::from_minor(value))
        } else {
            Err(PricingError::UnknownPreset(value))
        }
    }

    /// Bounds check for a typed tip. `base` enables the cap-at-amount rule when known.
    pub fn check_custom(&self, value: i64, base: Option<Amount>) -> Result<Amount, PricingError> {
        if value <= 0 {
            return Err(PricingError::InvalidTip(format!(
                "custom tip must be positive (got {}); choose no tip instead",
                value
            )));
        }

        let value = value as u64;
        if value > self.custom_ceiling {
            return Err(PricingError::InvalidTip(format!(
                "custom tip {} exceeds ceiling {}",
                Amount::from_minor(value),
                Amount::from_minor(self.custom_ceiling)
            )));
        }

        if let Some(base) = base.filter(|_| self.cap_at_amount) {
            if value > base.minor() {
                return Err(PricingError::InvalidTip(format!(
                    "custom tip {} exceeds requested amount {}",
                    Amount::from_minor(value),
                    base
                )));
            }
        }

        Ok(Amount::from_minor(value))
    }

    pub fn tip_amount(&self, tip: &TipSelection, base: Amount) -> Result<Amount, PricingError> {
        match *tip {
            TipSelection::None => Ok(Amount::ZERO),
            TipSelection::Preset(value) => self.check_preset(value),
            TipSelection::Custom(value) => self.check_custom(value, Some(base)),
        }
    }
}

/// Business constants for cash orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub currency: String,
    /// Largest orderable amount in minor units
    pub max_amount: u64,
    pub fee_schedule: FeeSchedule,
    #[serde(default)]
    pub surcharges: Vec<Surcharge>,
    pub tips: TipPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            max_amount: Amount::from_major(100_000).minor(),
            fee_schedule: FeeSchedule::free(),
            surcharges: vec![
                Surcharge::flat("Delivery Fee", Amount::from_major(30).minor()),
                Surcharge::rate("GST", 1_800),
                Surcharge::flat("Platform Fee", 660),
            ],
            tips: TipPolicy {
                presets: vec![1_000, 2_000, 3_000],
                custom_ceiling: Amount::from_major(500).minor(),
                cap_at_amount: false,
            },
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.max_amount == 0 {
            return Err(PricingError::InvalidSchedule("max_amount must be positive".to_string()));
        }
        self.fee_schedule.validate()?;
        self.tips.validate()
    }
}

/// Pure pricing: amount + tip + configuration -> payable breakdown
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn tips(&self) -> &TipPolicy {
        &self.config.tips
    }

    pub fn validate_amount(&self, base: Amount) -> Result<(), PricingError> {
        if base.is_zero() || base.minor() > self.config.max_amount {
            return Err(PricingError::InvalidAmount {
                amount: base.minor(),
                max: self.config.max_amount,
            });
        }
        Ok(())
    }

    /// Itemised fees for `base`; zero-valued lines are left out
    pub fn fee_lines(&self, base: Amount) -> Vec<FeeLine> {
        let schedule = &self.config.fee_schedule;
        std::iter::once(FeeLine::new(schedule.label.clone(), schedule.fee_for(base)))
            .chain(self.config.surcharges.iter().map(|s| FeeLine::new(s.label.clone(), s.amount_for(base))))
            .filter(|line| !line.amount.is_zero())
            .collect()
    }

    pub fn fee(&self, base: Amount) -> Amount {
        self.fee_lines(base).iter().map(|line| line.amount).sum()
    }

    pub fn compute_breakdown(&self, base: Amount, tip: &TipSelection) -> Result<PriceBreakdown, PricingError> {
        self.validate_amount(base)?;
        let tip_amount = self.config.tips.tip_amount(tip, base)?;
        let breakdown = PriceBreakdown::new(base, self.fee_lines(base), tip_amount);

        debug!(
            "Quoted {} {}: fee {} tip {} total {}",
            breakdown.base_amount(),
            self.config.currency,
            breakdown.fee(),
            breakdown.tip(),
            breakdown.total()
        );
        Ok(breakdown)
    }
}

/// One-shot form of [`PricingEngine::compute_breakdown`]
pub fn compute_breakdown(
    base: Amount,
    tip: &TipSelection,
    config: &PricingConfig,
) -> Result<PriceBreakdown, PricingError> {
    PricingEngine::new(config.clone())?.compute_breakdown(base, tip)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid amount {amount}: must be between 1 and {max} minor units")]
    InvalidAmount {
        amount: u64,
        max: u64,
    },

    #[error("Enter an amount greater than zero")]
    AmountRequired,

    #[error("Invalid tip: {0}")]
    InvalidTip(String),

    #[error("Unknown preset tip: {0}")]
    UnknownPreset(u64),

    #[error("Invalid fee schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid tip policy: {0}")]
    InvalidTipPolicy(String),

    #[error("Invalid keypad input: {0}")]
    InvalidKeypadInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_config() -> PricingConfig {
        PricingConfig {
            currency: "INR".to_string(),
            max_amount: 999,
            fee_schedule: FeeSchedule::free(),
            surcharges: vec![],
            tips: TipPolicy {
                presets: vec![10, 20, 50],
                custom_ceiling: 200,
                cap_at_amount: false,
            },
        }
    }

    fn tiered_schedule() -> FeeSchedule {
        FeeSchedule::new(vec![
            FeeTier::new(0, 0, 0),
            FeeTier::new(1_000, 1_000, 0),
            FeeTier::new(5_000, 2_000, 100),
        ])
    }

    #[test]
    fn test_plain_order_breakdown() {
        let engine = PricingEngine::new(flat_config()).unwrap();
        let breakdown = engine.compute_breakdown(Amount::from_minor(500), &TipSelection::None).unwrap();

        assert_eq!(breakdown.base_amount(), Amount::from_minor(500));
        assert_eq!(breakdown.fee(), Amount::ZERO);
        assert_eq!(breakdown.tip(), Amount::ZERO);
        assert_eq!(breakdown.total(), Amount::from_minor(500));
        assert!(breakdown.fee_lines().is_empty());
    }

    #[test]
    fn test_preset_tip_added_to_total() {
        let engine = PricingEngine::new(flat_config()).unwrap();
        let breakdown = engine.compute_breakdown(Amount::from_minor(500), &TipSelection::Preset(20)).unwrap();

        assert_eq!(breakdown.tip(), Amount::from_minor(20));
        assert_eq!(breakdown.total(), Amount::from_minor(520));
    }

    #[test]
    fn test_invalid_amounts() {
        let engine = PricingEngine::new(flat_config()).unwrap();

        let zero = engine.compute_breakdown(Amount::ZERO, &TipSelection::None);
        assert!(matches!(zero, Err(PricingError::InvalidAmount { amount: 0, .. })));

        let too_big = engine.compute_breakdown(Amount::from_minor(1_000), &TipSelection::None);
        assert!(matches!(too_big, Err(PricingError::InvalidAmount { amount: 1_000, max: 999 })));
    }

    #[test]
    fn test_invalid_tips() {
        let engine = PricingEngine::new(flat_config()).unwrap();
        let base = Amount::from_minor(500);

        assert!(matches!(
            engine.compute_breakdown(base, &TipSelection::Custom(0)),
            Err(PricingError::InvalidTip(_))
        ));
        assert!(matches!(
            engine.compute_breakdown(base, &TipSelection::Custom(-5)),
            Err(PricingError::InvalidTip(_))
        ));
        assert!(matches!(
            engine.compute_breakdown(base, &TipSelection::Custom(201)),
            Err(PricingError::InvalidTip(_))
        ));
        assert_eq!(
            engine.compute_breakdown(base, &TipSelection::Preset(30)),
            Err(PricingError::UnknownPreset(30))
        );
    }

    #[test]
    fn test_custom_tip_capped_at_amount() {
        let mut config = flat_config();
        config.tips.cap_at_amount = true;
        let engine = PricingEngine::new(config).unwrap();

        assert!(engine.compute_breakdown(Amount::from_minor(100), &TipSelection::Custom(150)).is_err());
        assert!(engine.compute_breakdown(Amount::from_minor(200), &TipSelection::Custom(150)).is_ok());
    }

    #[test]
    fn test_tier_edge_belongs_to_higher_tier() {
        let schedule = tiered_schedule();

        assert_eq!(schedule.fee_for(Amount::from_minor(999)), Amount::ZERO);
        assert_eq!(schedule.fee_for(Amount::from_minor(1_000)), Amount::from_minor(1_000));
        // 2000 flat + 1% of 5000
        assert_eq!(schedule.fee_for(Amount::from_minor(5_000)), Amount::from_minor(2_050));
    }

    #[test]
    fn test_tier_edge_lower_tier_override() {
        let schedule = tiered_schedule().with_edge(TierEdge::LowerTier);

        assert_eq!(schedule.fee_for(Amount::from_minor(1_000)), Amount::ZERO);
        assert_eq!(schedule.fee_for(Amount::from_minor(1_001)), Amount::from_minor(1_000));
        assert_eq!(schedule.fee_for(Amount::from_minor(5_000)), Amount::from_minor(1_000));
    }

    #[test]
    fn test_schedule_validation() {
        assert!(tiered_schedule().validate().is_ok());

        let gap_at_zero = FeeSchedule::new(vec![FeeTier::new(100, 0, 0)]);
        assert!(matches!(gap_at_zero.validate(), Err(PricingError::InvalidSchedule(_))));

        let cheaper_upper = FeeSchedule::new(vec![FeeTier::new(0, 500, 0), FeeTier::new(1_000, 100, 0)]);
        assert!(cheaper_upper.validate().is_err());

        let unsorted = FeeSchedule::new(vec![FeeTier::new(0, 0, 0), FeeTier::new(0, 10, 0)]);
        assert!(unsorted.validate().is_err());

        assert!(FeeSchedule::new(vec![]).validate().is_err());
    }

    #[test]
    fn test_default_config_matches_app_economics() {
        let engine = PricingEngine::new(PricingConfig::default()).unwrap();
        let breakdown = engine
            .compute_breakdown(Amount::from_major(500), &TipSelection::Preset(2_000))
            .unwrap();

        // 30 delivery + 90 GST + 6.60 platform
        assert_eq!(breakdown.fee(), Amount::from_minor(3_000 + 9_000 + 660));
        assert_eq!(breakdown.fee_lines().len(), 3);
        assert_eq!(breakdown.total(), Amount::from_minor(50_000 + 12_660 + 2_000));
    }

    #[test]
    fn test_compute_breakdown_is_deterministic() {
        let config = PricingConfig::default();
        let a = compute_breakdown(Amount::from_minor(12_345), &TipSelection::Custom(777), &config).unwrap();
        let b = compute_breakdown(Amount::from_minor(12_345), &TipSelection::Custom(777), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_config_from_json() {
        let config: PricingConfig = serde_json::from_value(serde_json::json!({
            "currency": "INR",
            "max_amount": 10000,
            "fee_schedule": { "tiers": [ { "from": 0 }, { "from": 5000, "flat": 100 } ], "edge": "lower_tier" },
            "tips": { "presets": [1000, 2000], "custom_ceiling": 50000 }
        }))
        .unwrap();

        assert_eq!(config.fee_schedule.label, "Service Fee");
        assert_eq!(config.fee_schedule.edge, TierEdge::LowerTier);
        assert!(config.surcharges.is_empty());
        assert!(config.validate().is_ok());
    }
}
