//! Activity records
//!
//! [`ExtractedRow`] is what the model produces for each potentially
//! contaminating activity it finds. Model output is loosely typed, so the
//! record deserializes leniently: string fields accept `null` and scalars,
//! `pca_number` keeps whatever value the model wrote, and unknown keys are
//! carried along untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// PCA number as written by the model
///
/// Valid catalog entries are integers. Anything else (strings, floats,
/// objects) is kept so the raw artifacts show exactly what the model said,
/// and is removed when final rows are filtered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PcaNumber {
    /// A JSON integer
    Integer(i64),
    /// Any other non-null JSON value
    Other(Value),
}

impl PcaNumber {
    /// The integer value, if this is one
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Other(_) => None,
        }
    }
}

impl Serialize for PcaNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Other(v) => v.serialize(serializer),
        }
    }
}

impl std::fmt::Display for PcaNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Other(Value::String(s)) => f.write_str(s),
            Self::Other(v) => write!(f, "{}", v),
        }
    }
}

/// One activity record extracted from the document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Street address of the activity
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,

    /// `On-Site` or `Off-Site` after compilation; free text before
    #[serde(default, deserialize_with = "lenient_string")]
    pub location_relation_to_site: String,

    /// Catalog number (1-59 for valid rows)
    #[serde(default)]
    pub pca_number: Option<PcaNumber>,

    /// Catalog name or free-text activity description
    #[serde(default, deserialize_with = "lenient_string")]
    pub pca_name: String,

    /// Evidence and dates supporting the record
    #[serde(default, deserialize_with = "lenient_string")]
    pub description_timeline: String,

    /// Page range the record came from, e.g. `"12-18"`
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub source_pages: Option<String>,

    /// Sequential identifier assigned after final filtering
    #[serde(
        default,
        deserialize_with = "lenient_identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub pca_identifier: Option<u32>,

    /// Keys the model emitted that are not part of the record schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtractedRow {
    /// Create a row with the core fields populated
    pub fn new(address: impl Into<String>, pca_number: Option<i64>) -> Self {
        Self {
            address: address.into(),
            pca_number: pca_number.map(PcaNumber::Integer),
            ..Self::default()
        }
    }

    /// Decode a row from a JSON value.
    ///
    /// Returns `None` when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Integer PCA number, if present and well typed
    pub fn pca_integer(&self) -> Option<i64> {
        self.pca_number.as_ref().and_then(PcaNumber::as_integer)
    }

    /// Fill `source_pages` when the model left it out or wrote `null`
    pub fn default_source_pages(&mut self, start: u32, end: u32) {
        if self.source_pages.as_deref().is_none_or(str::is_empty) {
            self.source_pages = Some(format!("{}-{}", start, end));
        }
    }
}

/// One human-labelled activity from the ground truth file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthRow {
    /// Street address
    pub address: String,

    /// PCA column text, e.g. `"#28 Gasoline and Associated Products Storage"`
    pub pca_text: String,

    /// Where the labeller found the record (e.g. `"ERIS"`)
    pub source: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_identifier<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| u32::try_from(n).ok()))
}
