//! Identity keying for shopping items.
//!
//! Two items are "the same grocery need" when their normalized name and
//! unit match, regardless of casing, surrounding whitespace, quantity or
//! checked state. The key is the sole matching mechanism between otherwise
//! unrelated item batches (two generator runs, a re-fetch, ...).

/// Normalized `(name, unit)` identity of a shopping item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseKey(String);

impl BaseKey {
    /// The normalized key string, `"<name>|<unit>"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the [`BaseKey`] for a name/unit pair.
///
/// A pure function of `name` and `unit` only; never of quantity or checked
/// state.
pub fn base_key(name: &str, unit: &str) -> BaseKey {
    BaseKey(format!(
        "{}|{}",
        name.trim().to_lowercase(),
        unit.trim().to_lowercase()
    ))
}
