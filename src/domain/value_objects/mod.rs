//! Value Objects for the catalog

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Physical condition of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition { Sealed, SemiNew, UsedExcellent, UsedVeryGood }

/// Accepted condition labels, Spanish sheet labels first, then canonical codes.
pub const CONDITION_LABELS: &[(&str, Condition)] = &[
    ("sellado", Condition::Sealed),
    ("semi nuevo", Condition::SemiNew),
    ("usado excelente", Condition::UsedExcellent),
    ("usado muy bueno", Condition::UsedVeryGood),
    ("sealed", Condition::Sealed),
    ("semi-new", Condition::SemiNew),
    ("used-excellent", Condition::UsedExcellent),
    ("used-very-good", Condition::UsedVeryGood),
];

impl Condition {
    /// Maps a free-form label through [`CONDITION_LABELS`], ignoring case and
    /// surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let key = label.trim().to_lowercase();
        CONDITION_LABELS.iter().find(|(l, _)| *l == key).map(|(_, c)| *c)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sealed => "sealed",
            Self::SemiNew => "semi-new",
            Self::UsedExcellent => "used-excellent",
            Self::UsedVeryGood => "used-very-good",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Catalog category. The four storefront slugs are recognised; any other
/// value is carried through as written.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category { Iphone, Macbook, Airpods, Accesorios, Other(String) }

impl Category {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "iphone" => Some(Self::Iphone),
            "macbook" => Some(Self::Macbook),
            "airpods" => Some(Self::Airpods),
            "accesorios" => Some(Self::Accesorios),
            _ => None,
        }
    }

    /// Known slugs match after trimming and lowercasing; anything else is kept verbatim.
    pub fn from_cell(cell: &str) -> Self {
        Self::from_slug(&cell.trim().to_lowercase()).unwrap_or_else(|| Self::Other(cell.to_string()))
    }

    pub fn is_known(&self) -> bool { !matches!(self, Self::Other(_)) }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Iphone => "iphone",
            Self::Macbook => "macbook",
            Self::Airpods => "airpods",
            Self::Accesorios => "accesorios",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self::from_cell(&s))
    }
}

/// Spreadsheet checkbox cells export as `TRUE`/`FALSE`; anything else is false.
pub fn parse_boolean_cell(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().to_uppercase() == "TRUE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_labels() {
        assert_eq!(Condition::from_label("Sellado"), Some(Condition::Sealed));
        assert_eq!(Condition::from_label("  SEMI NUEVO "), Some(Condition::SemiNew));
        assert_eq!(Condition::from_label("Usado Excelente"), Some(Condition::UsedExcellent));
        assert_eq!(Condition::from_label("usado muy bueno"), Some(Condition::UsedVeryGood));
        assert_eq!(Condition::from_label("Used-Very-Good"), Some(Condition::UsedVeryGood));
        assert_eq!(Condition::from_label("mint"), None);
        assert_eq!(Condition::from_label(""), None);
    }

    #[test]
    fn test_condition_serializes_as_code() {
        for (_, c) in CONDITION_LABELS {
            assert_eq!(serde_json::to_value(c).unwrap(), serde_json::json!(c.as_str()));
        }
    }

    #[test]
    fn test_boolean_cell() {
        assert!(parse_boolean_cell(Some("TRUE")));
        assert!(parse_boolean_cell(Some(" true ")));
        assert!(!parse_boolean_cell(Some("yes")));
        assert!(!parse_boolean_cell(Some("FALSE")));
        assert!(!parse_boolean_cell(Some("")));
        assert!(!parse_boolean_cell(None));
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(Category::from_slug("macbook"), Some(Category::Macbook));
        assert_eq!(Category::from_slug("MacBook"), None);
        assert_eq!(Category::Accesorios.to_string(), "accesorios");
    }

    #[test]
    fn test_category_cell_passthrough() {
        assert_eq!(Category::from_cell(" MacBook "), Category::Macbook);
        let ipad = Category::from_cell("iPad");
        assert_eq!(ipad, Category::Other("iPad".into()));
        assert!(!ipad.is_known());
        assert_eq!(serde_json::to_value(&ipad).unwrap(), serde_json::json!("iPad"));
        assert_eq!(serde_json::from_value::<Category>(serde_json::json!("airpods")).unwrap(), Category::Airpods);
    }
}
