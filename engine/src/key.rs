//! Record keys and the comparator that orders them.

use std::cmp::Ordering;
use std::fmt;

/// An opaque printable identifier of the form `@XNN@`, e.g. `@I1@` or `@F23@`.
///
/// Keys are compared by [`RecordKey::cmp`], which orders by sigil character first and then by
/// the numeric suffix as an integer, so `@I2@` sorts before `@I10@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// Wraps a raw key string (e.g. `"@I1@"`) without validating its shape.
    ///
    /// Ingestion is expected to hand us well-formed keys straight from the parser; this is not a
    /// parser-facing validation point.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sigil character (e.g. `'I'` for `@I1@`), if the key has the expected shape.
    fn sigil(&self) -> Option<char> {
        self.0.strip_prefix('@')?.chars().next()
    }

    /// The numeric suffix (e.g. `1` for `@I1@`), if the key has the expected shape.
    fn numeric_suffix(&self) -> Option<u64> {
        let inner = self.0.strip_prefix('@')?.strip_suffix('@')?;
        let digits: String = inner.chars().skip(1).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sigil(), other.sigil()) {
            (Some(a), Some(b)) if a != b => return a.cmp(&b),
            _ => {}
        }
        match (self.numeric_suffix(), other.numeric_suffix()) {
            (Some(a), Some(b)) => a.cmp(&b),
            // Keys that don't fit the `@XNN@` shape fall back to a textual comparison so the
            // comparator stays total even on malformed data.
            _ => self.0.cmp(&other.0),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The type of a record root, derived once at ingestion from its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Person,
    Family,
    Source,
    Event,
    Other,
}

impl RecordType {
    /// Classifies a root tag (`INDI`, `FAM`, `SOUR`, ...) into a [`RecordType`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "INDI" => RecordType::Person,
            "FAM" => RecordType::Family,
            "SOUR" => RecordType::Source,
            "EVEN" => RecordType::Event,
            _ => RecordType::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn numeric_suffix_not_lexicographic() {
        let small = RecordKey::new("@I2@");
        let big = RecordKey::new("@I10@");
        assert!(small < big, "@I2@ should sort before @I10@");
    }

    #[test]
    fn sigil_takes_priority() {
        let fam = RecordKey::new("@F1@");
        let indi = RecordKey::new("@I1@");
        assert!(fam < indi, "'F' < 'I' byte-wise");
    }

    #[test]
    fn comparator_is_a_total_order() {
        let keys = ["@I2@", "@I10@", "@F1@", "@F20@", "@I1@"].map(RecordKey::new);
        for a in &keys {
            for b in &keys {
                for c in &keys {
                    let ab = a.cmp(b);
                    let bc = b.cmp(c);
                    if ab == Ordering::Less && bc == Ordering::Less {
                        assert_eq!(a.cmp(c), Ordering::Less, "transitivity failed for {a} {b} {c}");
                    }
                }
            }
        }
    }

    #[rstest]
    #[case("INDI", RecordType::Person)]
    #[case("FAM", RecordType::Family)]
    #[case("SOUR", RecordType::Source)]
    #[case("EVEN", RecordType::Event)]
    #[case("SUBM", RecordType::Other)]
    #[case("NOTE", RecordType::Other)]
    fn classify_known_tags(#[case] tag: &str, #[case] expected: RecordType) {
        assert_eq!(RecordType::from_tag(tag), expected);
    }
}
