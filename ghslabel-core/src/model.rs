//! Chemical Records - the shape the search API returns

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalWord {
    Danger,
    Warning,
}

impl SignalWord {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Danger => "Danger",
            Self::Warning => "Warning",
        }
    }

    pub fn as_zh(&self) -> &'static str {
        match self {
            Self::Danger => "危险",
            Self::Warning => "警告",
        }
    }

    /// Ordering weight used when sorting by severity
    pub fn severity(signal: Option<SignalWord>) -> u8 {
        match signal {
            Some(Self::Danger) => 2,
            Some(Self::Warning) => 1,
            None => 0,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "danger" | "危险" => Some(Self::Danger),
            "warning" | "警告" => Some(Self::Warning),
            _ => None,
        }
    }
}

/// The API sends `null`, `""` or an unknown word when no signal word applies.
fn lenient_signal_word<'de, D>(deserializer: D) -> Result<Option<SignalWord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SignalWord::parse))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardStatement {
    pub code: String,
    #[serde(default)]
    pub text: String,
}

/// One self-consistent set of pictograms, hazard statements and signal word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationBundle {
    #[serde(default, alias = "ghs_pictograms")]
    pub pictograms: Vec<String>,
    #[serde(default)]
    pub hazard_statements: Vec<HazardStatement>,
    #[serde(default, deserialize_with = "lenient_signal_word")]
    pub signal_word: Option<SignalWord>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemicalRecord {
    pub cas_number: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_zh: Option<String>,
    #[serde(default)]
    pub cid: Option<u64>,
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub ghs_pictograms: Vec<String>,
    #[serde(default)]
    pub hazard_statements: Vec<HazardStatement>,
    #[serde(default, deserialize_with = "lenient_signal_word")]
    pub signal_word: Option<SignalWord>,
    #[serde(default)]
    pub other_classifications: Vec<ClassificationBundle>,
}

impl ChemicalRecord {
    /// Bundle built from the record's top-level fields (candidate index 0).
    pub fn primary_bundle(&self) -> ClassificationBundle {
        ClassificationBundle {
            pictograms: self.ghs_pictograms.clone(),
            hazard_statements: self.hazard_statements.clone(),
            signal_word: self.signal_word,
            source: None,
        }
    }

    pub fn has_multiple_classifications(&self) -> bool {
        !self.other_classifications.is_empty()
    }

    /// Number of classification candidates, primary included.
    pub fn candidate_count(&self) -> usize {
        1 + self.other_classifications.len()
    }

    pub fn english_name(&self) -> &str {
        non_blank(self.name_en.as_deref()).unwrap_or("")
    }

    pub fn chinese_name(&self) -> Option<&str> {
        non_blank(self.name_zh.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Records file accepted by the CLI: either a bare array (batch search)
/// or the `{results: [...]}` envelope of the name search.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordSet {
    Batch(Vec<ChemicalRecord>),
    Envelope { results: Vec<ChemicalRecord> },
    Single(Box<ChemicalRecord>),
}

impl RecordSet {
    pub fn into_records(self) -> Vec<ChemicalRecord> {
        match self {
            Self::Batch(records) => records,
            Self::Envelope { results } => results,
            Self::Single(record) => vec![*record],
        }
    }
}
