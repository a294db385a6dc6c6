//! Classification Resolver
//!
//! Picks the effective classification bundle for a record: the user's
//! override when it still points at an existing candidate, otherwise the
//! primary bundle. Never fails.

use serde::{Deserialize, Serialize};

use crate::model::{ChemicalRecord, ClassificationBundle, HazardStatement, SignalWord};
use crate::overrides::CustomOverride;

/// Which candidate bundle is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum ClassificationChoice {
    Default,
    Custom(usize),
}

impl ClassificationChoice {
    /// Stale overrides (index past the candidate list) collapse to `Default`.
    pub fn from_override(custom: Option<&CustomOverride>, candidate_count: usize) -> Self {
        match custom {
            Some(c) if c.selected_index < candidate_count => Self::Custom(c.selected_index),
            Some(c) => {
                tracing::debug!(
                    selected_index = c.selected_index,
                    candidate_count,
                    "ignoring out-of-range classification override"
                );
                Self::Default
            }
            None => Self::Default,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Default => 0,
            Self::Custom(index) => *index,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveClassification {
    pub pictograms: Vec<String>,
    pub hazard_statements: Vec<HazardStatement>,
    pub signal_word: Option<SignalWord>,
    pub signal_word_zh: Option<String>,
    pub is_custom: bool,
    pub custom_index: usize,
    pub note: Option<String>,
    pub source: Option<String>,
}

/// A selectable classification with its position in the candidate list.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub index: usize,
    pub is_primary: bool,
    pub bundle: ClassificationBundle,
}

/// Lists `[primary, ...other_classifications]` in candidate order.
pub fn candidates(record: &ChemicalRecord) -> Vec<Candidate> {
    std::iter::once(record.primary_bundle())
        .chain(record.other_classifications.iter().cloned())
        .enumerate()
        .map(|(index, bundle)| Candidate {
            index,
            is_primary: index == 0,
            bundle,
        })
        .collect()
}

/// Resolve the effective classification for a record.
///
/// Returns `None` when there is no record or the lookup did not find it.
pub fn resolve(
    record: Option<&ChemicalRecord>,
    custom: Option<&CustomOverride>,
) -> Option<EffectiveClassification> {
    let record = record.filter(|r| r.found)?;
    let choice = ClassificationChoice::from_override(custom, record.candidate_count());

    let bundle = match choice {
        ClassificationChoice::Default | ClassificationChoice::Custom(0) => record.primary_bundle(),
        ClassificationChoice::Custom(index) => record
            .other_classifications
            .get(index - 1)
            .cloned()
            .unwrap_or_else(|| record.primary_bundle()),
    };

    Some(EffectiveClassification {
        signal_word_zh: bundle.signal_word.map(|w| w.as_zh().to_string()),
        pictograms: bundle.pictograms,
        hazard_statements: bundle.hazard_statements,
        signal_word: bundle.signal_word,
        is_custom: choice.is_custom(),
        custom_index: choice.index(),
        note: match choice {
            ClassificationChoice::Custom(_) => custom.map(|c| c.note.clone()).filter(|n| !n.is_empty()),
            ClassificationChoice::Default => None,
        },
        source: bundle.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ethanol() -> ChemicalRecord {
        ChemicalRecord {
            cas_number: "64-17-5".into(),
            name_en: Some("Ethanol".into()),
            found: true,
            ghs_pictograms: vec!["GHS02".into(), "GHS07".into()],
            signal_word: Some(SignalWord::Danger),
            other_classifications: vec![ClassificationBundle {
                pictograms: vec!["GHS07".into()],
                signal_word: Some(SignalWord::Warning),
                source: Some("ECHA C&L".into()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn pick(index: usize) -> CustomOverride {
        CustomOverride {
            selected_index: index,
            note: "lab policy".into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_not_found_resolves_to_nothing() {
        let mut record = ethanol();
        record.found = false;
        assert!(resolve(Some(&record), Some(&pick(1))).is_none());
        assert!(resolve(None, None).is_none());
    }

    #[test]
    fn test_default_is_primary() {
        let effective = resolve(Some(&ethanol()), None).unwrap();
        assert!(!effective.is_custom);
        assert_eq!(effective.custom_index, 0);
        assert_eq!(effective.signal_word_zh.as_deref(), Some("危险"));
        assert_eq!(effective.note, None);
    }

    #[test]
    fn test_override_selects_alternate() {
        let effective = resolve(Some(&ethanol()), Some(&pick(1))).unwrap();
        assert!(effective.is_custom);
        assert_eq!(effective.custom_index, 1);
        assert_eq!(effective.pictograms, vec!["GHS07".to_string()]);
        assert_eq!(effective.signal_word, Some(SignalWord::Warning));
        assert_eq!(effective.note.as_deref(), Some("lab policy"));
        assert_eq!(effective.source.as_deref(), Some("ECHA C&L"));
    }

    #[test]
    fn test_override_of_primary_is_still_custom() {
        let effective = resolve(Some(&ethanol()), Some(&pick(0))).unwrap();
        assert!(effective.is_custom);
        assert_eq!(effective.custom_index, 0);
        assert_eq!(effective.pictograms.len(), 2);
    }

    #[test]
    fn test_stale_override_falls_back() {
        assert_eq!(
            ClassificationChoice::from_override(Some(&pick(5)), 2),
            ClassificationChoice::Default
        );
        let effective = resolve(Some(&ethanol()), Some(&pick(5))).unwrap();
        assert!(!effective.is_custom);
        assert_eq!(effective.pictograms, vec!["GHS02".to_string(), "GHS07".to_string()]);
    }

    #[test]
    fn test_candidates_order() {
        let record = ethanol();
        let listed = candidates(&record);
        assert_eq!(listed.len(), 2);
        assert!(listed[0].is_primary);
        assert_eq!(listed[1].bundle.source.as_deref(), Some("ECHA C&L"));
    }
}
