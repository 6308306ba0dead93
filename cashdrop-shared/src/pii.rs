use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps a sensitive value (address handle, session token) so `{:?}` and `{}` in log
/// macros never print it. Serialization still writes the real value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value_in_logs() {
        let token = Masked("secret-token".to_string());
        assert_eq!(format!("{:?}", token), "********");
        assert_eq!(format!("{}", token), "********");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"secret-token\"");
        assert_eq!(token.expose(), "secret-token");
    }
}
