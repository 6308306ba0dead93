use cashdrop_shared::{AddressRef, Amount, PaymentMode, PriceBreakdown, TipSelection};

use crate::keypad::AmountKeypad;
use crate::pricing::{PricingEngine, PricingError};
use crate::tip::TipSelector;

/// Everything the customer has chosen before tapping "slide to pay"
#[derive(Debug, Clone)]
pub struct OrderDraft {
    keypad: AmountKeypad,
    tips: TipSelector,
    address: Option<AddressRef>,
    payment_mode: PaymentMode,
    revision: u64,
}

impl OrderDraft {
    pub fn new(engine: &PricingEngine) -> Self {
        Self {
            keypad: AmountKeypad::new(),
            tips: TipSelector::new(engine.tips().clone()),
            address: None,
            payment_mode: PaymentMode::default(),
            revision: 0,
        }
    }

    pub fn keypad(&self) -> &AmountKeypad {
        &self.keypad
    }

    pub fn tip(&self) -> TipSelection {
        self.tips.current()
    }

    pub fn address(&self) -> Option<&AddressRef> {
        self.address.as_ref()
    }

    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    /// Bumped by every mutation; a quote taken at an older revision is stale
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn amount(&self) -> Amount {
        self.keypad.amount()
    }

    pub fn press_key(&mut self, key: char) -> Result<(), PricingError> {
        self.keypad.press(key)?;
        self.touch();
        Ok(())
    }

    pub fn enter_amount(&mut self, keys: &str) -> Result<(), PricingError> {
        self.keypad.reset();
        let typed = self.keypad.type_str(keys);
        self.touch();
        typed
    }

    pub fn backspace(&mut self) {
        self.keypad.backspace();
        self.touch();
    }

    pub fn select_preset_tip(&mut self, value: u64) -> Result<(), PricingError> {
        self.tips.select_preset(value)?;
        self.touch();
        Ok(())
    }

    pub fn select_custom_tip(&mut self, value: i64) -> Result<(), PricingError> {
        self.tips.select_custom(value)?;
        self.touch();
        Ok(())
    }

    pub fn clear_tip(&mut self) {
        self.tips.clear();
        self.touch();
    }

    pub fn set_address(&mut self, address: AddressRef) {
        self.address = Some(address);
        self.touch();
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = mode;
        self.touch();
    }

    /// Fresh breakdown for the current draft. Never cached.
    pub fn quote(&self, engine: &PricingEngine) -> Result<PriceBreakdown, PricingError> {
        engine.compute_breakdown(self.keypad.entered_amount()?, &self.tips.current())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
