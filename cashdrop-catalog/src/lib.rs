pub mod pricing;
pub mod tip;
pub mod keypad;
pub mod draft;

pub use pricing::{
    compute_breakdown, FeeSchedule, FeeTier, PricingConfig, PricingEngine, PricingError, Surcharge, TierEdge,
    TipPolicy,
};
pub use tip::TipSelector;
pub use keypad::AmountKeypad;
pub use draft::OrderDraft;
