use cashdrop_shared::Amount;

use crate::pricing::PricingError;

const INITIAL_DISPLAY: &str = "0.00";
const MAX_WHOLE_DIGITS: usize = 9;
const MAX_FRACTION_DIGITS: usize = 2;

/// Digit-by-digit amount entry, as on the order-cash screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountKeypad {
    display: String,
}

impl AmountKeypad {
    pub fn new() -> Self {
        Self {
            display: INITIAL_DISPLAY.to_string(),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_initial(&self) -> bool {
        self.display == INITIAL_DISPLAY
    }

    /// Press a digit or the decimal point. Keys that would break the format are swallowed.
    pub fn press(&mut self, key: char) -> Result<(), PricingError> {
        if !key.is_ascii_digit() && key != '.' {
            return Err(PricingError::InvalidKeypadInput(format!("unsupported key {:?}", key)));
        }

        if self.is_initial() || self.display == "0" {
            self.display = if key == '.' { "0.".to_string() } else { key.to_string() };
            return Ok(());
        }

        match self.display.split_once('.') {
            Some(_) if key == '.' => {}
            Some((_, fraction)) if fraction.len() >= MAX_FRACTION_DIGITS => {}
            None if key != '.' && self.display.len() >= MAX_WHOLE_DIGITS => {}
            _ => self.display.push(key),
        }
        Ok(())
    }

    /// Feed a whole string of keys, stopping at the first unsupported one
    pub fn type_str(&mut self, keys: &str) -> Result<(), PricingError> {
        keys.chars().try_for_each(|key| self.press(key))
    }

    pub fn backspace(&mut self) {
        if self.display.len() <= 1 || self.is_initial() {
            self.display = INITIAL_DISPLAY.to_string();
        } else {
            self.display.pop();
        }
    }

    /// Quick-pick pill (e.g. 500, 1000)
    pub fn set_preset(&mut self, amount: Amount) {
        self.display = amount.to_compact_string();
    }

    pub fn reset(&mut self) {
        self.display = INITIAL_DISPLAY.to_string();
    }

    /// Exact minor-unit value of the display; zero while nothing has been typed
    pub fn amount(&self) -> Amount {
        let (whole, fraction) = self.display.split_once('.').unwrap_or((self.display.as_str(), ""));
        let whole = digits_value(whole);
        let fraction = match fraction.len() {
            0 => 0,
            1 => digits_value(fraction) * 10,
            _ => digits_value(&fraction[..MAX_FRACTION_DIGITS]),
        };
        Amount::from_minor(whole * 100 + fraction)
    }

    /// Amount ready for pricing; zero is rejected here so the pay button can stay disabled
    pub fn entered_amount(&self) -> Result<Amount, PricingError> {
        let amount = self.amount();
        if amount.is_zero() {
            return Err(PricingError::AmountRequired);
        }
        Ok(amount)
    }
}

impl Default for AmountKeypad {
    fn default() -> Self {
        Self::new()
    }
}

fn digits_value(digits: &str) -> u64 {
    digits
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_key_replaces_initial_display() {
        let mut keypad = AmountKeypad::new();
        keypad.press('5').unwrap();
        assert_eq!(keypad.display(), "5");

        let mut keypad = AmountKeypad::new();
        keypad.press('.').unwrap();
        assert_eq!(keypad.display(), "0.");
    }

    #[test]
    fn test_decimal_rules() {
        let mut keypad = AmountKeypad::new();
        keypad.type_str("12.3.45").unwrap();
        assert_eq!(keypad.display(), "12.34");
        assert_eq!(keypad.amount(), Amount::from_minor(1_234));

        let mut keypad = AmountKeypad::new();
        keypad.type_str("12.5").unwrap();
        assert_eq!(keypad.amount(), Amount::from_minor(1_250));
    }

    #[test]
    fn test_whole_digit_limit() {
        let mut keypad = AmountKeypad::new();
        keypad.type_str("12345678901").unwrap();
        assert_eq!(keypad.display(), "123456789");
    }

    #[test]
    fn test_backspace_resets_to_initial() {
        let mut keypad = AmountKeypad::new();
        keypad.type_str("50").unwrap();
        keypad.backspace();
        assert_eq!(keypad.display(), "5");
        keypad.backspace();
        assert!(keypad.is_initial());
        keypad.backspace();
        assert!(keypad.is_initial());
    }

    #[test]
    fn test_rejects_unknown_keys_and_zero() {
        let mut keypad = AmountKeypad::new();
        assert!(matches!(keypad.press('x'), Err(PricingError::InvalidKeypadInput(_))));
        assert_eq!(keypad.entered_amount(), Err(PricingError::AmountRequired));
        assert_eq!(PricingError::AmountRequired.to_string(), "Enter an amount greater than zero");

        keypad.set_preset(Amount::from_major(500));
        assert_eq!(keypad.display(), "500");
        assert_eq!(keypad.entered_amount().unwrap(), Amount::from_major(500));
    }
}
