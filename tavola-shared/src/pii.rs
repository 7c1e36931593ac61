use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer contact data (phone, email) so it never shows up in
/// `Debug`/`Display` output, e.g. `tracing::info!(phone = %Masked(&phone))`.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(&self.0.to_string()))
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(&self.0.to_string()))
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // API responses carry the real value; masking only applies to formatting.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Keeps the last two characters so staff can still tell numbers apart.
fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len <= 2 {
        return "*".repeat(len.max(1));
    }
    let tail: String = value.chars().skip(len - 2).collect();
    format!("{}{}", "*".repeat(len - 2), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_is_masked_in_logs() {
        let phone = Masked("9876543210".to_string());
        assert_eq!(format!("{}", phone), "********10");
        assert_eq!(format!("{:?}", phone), "********10");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let phone = Masked("9876543210".to_string());
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"9876543210\"");
    }

    #[test]
    fn test_short_values() {
        assert_eq!(format!("{}", Masked("")), "*");
        assert_eq!(format!("{}", Masked("ab")), "**");
    }
}
