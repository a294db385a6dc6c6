//! Result filtering and sorting over lookup results.
//!
//! Filters look at the effective classification, so an override changes
//! which results a signal-word or pictogram filter matches.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{ChemicalRecord, SignalWord};
use crate::overrides::OverrideMap;
use crate::pictograms::normalize_code;
use crate::resolver::{resolve, EffectiveClassification};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Input,
    Cas,
    Name,
    HazardCount,
    Severity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultQuery {
    pub text: Option<String>,
    pub found: Option<bool>,
    pub signal_word: Option<SignalWord>,
    pub pictogram: Option<String>,
    pub multiple_only: bool,
    pub sort: SortKey,
    pub descending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultRow<'a> {
    pub record: &'a ChemicalRecord,
    pub effective: Option<EffectiveClassification>,
}

impl ResultRow<'_> {
    fn hazard_count(&self) -> usize {
        self.effective.as_ref().map_or(0, |e| e.hazard_statements.len())
    }

    fn severity(&self) -> u8 {
        SignalWord::severity(self.effective.as_ref().and_then(|e| e.signal_word))
    }
}

impl ResultQuery {
    fn matches(&self, row: &ResultRow<'_>) -> bool {
        let record = row.record;

        if let Some(found) = self.found {
            if record.found != found {
                return false;
            }
        }

        if self.multiple_only && !record.has_multiple_classifications() {
            return false;
        }

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let hit = [
                Some(record.cas_number.as_str()),
                record.name_en.as_deref(),
                record.name_zh.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|hay| hay.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(word) = self.signal_word {
            if row.effective.as_ref().and_then(|e| e.signal_word) != Some(word) {
                return false;
            }
        }

        if let Some(code) = self.pictogram.as_deref() {
            let code = normalize_code(code);
            let has = row
                .effective
                .as_ref()
                .is_some_and(|e| e.pictograms.iter().any(|p| normalize_code(p) == code));
            if !has {
                return false;
            }
        }

        true
    }

    fn compare(&self, a: &ResultRow<'_>, b: &ResultRow<'_>) -> Ordering {
        match self.sort {
            SortKey::Input => Ordering::Equal,
            SortKey::Cas => cas_sort_key(&a.record.cas_number).cmp(&cas_sort_key(&b.record.cas_number)),
            SortKey::Name => a
                .record
                .english_name()
                .to_lowercase()
                .cmp(&b.record.english_name().to_lowercase()),
            SortKey::HazardCount => a.hazard_count().cmp(&b.hazard_count()),
            SortKey::Severity => a.severity().cmp(&b.severity()),
        }
    }

    /// Filter then sort. Sorting is stable in both directions, so ties keep
    /// input order; `Input` with `descending` reverses the input.
    pub fn apply<'a>(&self, records: &'a [ChemicalRecord], overrides: &OverrideMap) -> Vec<ResultRow<'a>> {
        let mut rows: Vec<ResultRow<'a>> = records
            .iter()
            .map(|record| ResultRow {
                record,
                effective: resolve(Some(record), overrides.get(record.cas_number.trim())),
            })
            .filter(|row| self.matches(row))
            .collect();

        if self.sort == SortKey::Input {
            if self.descending {
                rows.reverse();
            }
            return rows;
        }

        rows.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            if self.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        rows
    }
}

/// Numeric ordering of CAS numbers ("50-00-0" before "7732-18-5").
fn cas_sort_key(cas: &str) -> (u64, String) {
    let numeric: String = cas.chars().filter(|c| c.is_ascii_digit()).collect();
    (numeric.parse().unwrap_or(u64::MAX), cas.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassificationBundle, HazardStatement};
    use crate::overrides::CustomOverride;
    use chrono::Utc;

    fn hazard(code: &str) -> HazardStatement {
        HazardStatement {
            code: code.into(),
            text: String::new(),
        }
    }

    fn records() -> Vec<ChemicalRecord> {
        vec![
            ChemicalRecord {
                cas_number: "7732-18-5".into(),
                name_en: Some("Water".into()),
                name_zh: Some("水".into()),
                found: true,
                ..Default::default()
            },
            ChemicalRecord {
                cas_number: "64-17-5".into(),
                name_en: Some("Ethanol".into()),
                name_zh: Some("乙醇".into()),
                found: true,
                ghs_pictograms: vec!["GHS02".into(), "GHS07".into()],
                hazard_statements: vec![hazard("H225"), hazard("H319")],
                signal_word: Some(SignalWord::Danger),
                other_classifications: vec![ClassificationBundle {
                    pictograms: vec!["GHS07".into()],
                    signal_word: Some(SignalWord::Warning),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ChemicalRecord {
                cas_number: "67-64-1".into(),
                name_en: Some("Acetone".into()),
                found: true,
                ghs_pictograms: vec!["GHS02".into()],
                hazard_statements: vec![hazard("H225"), hazard("H319"), hazard("H336")],
                signal_word: Some(SignalWord::Warning),
                ..Default::default()
            },
            ChemicalRecord {
                cas_number: "00-00-0".into(),
                found: false,
                ..Default::default()
            },
        ]
    }

    fn cas<'a>(rows: &'a [ResultRow<'_>]) -> Vec<&'a str> {
        rows.iter().map(|r| r.record.cas_number.as_str()).collect()
    }

    #[test]
    fn test_text_matches_names_and_cas() {
        let records = records();
        let query = ResultQuery {
            text: Some("乙醇".into()),
            ..Default::default()
        };
        assert_eq!(cas(&query.apply(&records, &OverrideMap::new())), vec!["64-17-5"]);

        let query = ResultQuery {
            text: Some("ACET".into()),
            ..Default::default()
        };
        assert_eq!(cas(&query.apply(&records, &OverrideMap::new())), vec!["67-64-1"]);
    }

    #[test]
    fn test_signal_filter_follows_override() {
        let records = records();
        let query = ResultQuery {
            signal_word: Some(SignalWord::Warning),
            ..Default::default()
        };
        assert_eq!(cas(&query.apply(&records, &OverrideMap::new())), vec!["67-64-1"]);

        let overrides = OverrideMap::from([(
            "64-17-5".to_string(),
            CustomOverride {
                selected_index: 1,
                note: String::new(),
                updated_at: Utc::now(),
            },
        )]);
        assert_eq!(cas(&query.apply(&records, &overrides)), vec!["64-17-5", "67-64-1"]);
    }

    #[test]
    fn test_sorting() {
        let records = records();
        let found = ResultQuery {
            found: Some(true),
            sort: SortKey::HazardCount,
            descending: true,
            ..Default::default()
        };
        assert_eq!(cas(&found.apply(&records, &OverrideMap::new())), vec!["67-64-1", "64-17-5", "7732-18-5"]);

        let by_cas = ResultQuery {
            sort: SortKey::Cas,
            ..Default::default()
        };
        assert_eq!(
            cas(&by_cas.apply(&records, &OverrideMap::new())),
            vec!["00-00-0", "64-17-5", "67-64-1", "7732-18-5"]
        );

        let severity = ResultQuery {
            found: Some(true),
            sort: SortKey::Severity,
            descending: true,
            ..Default::default()
        };
        assert_eq!(cas(&severity.apply(&records, &OverrideMap::new()))[0], "64-17-5");
    }

    #[test]
    fn test_descending_keeps_ties_in_input_order() {
        let mut records = records();
        records[0].signal_word = Some(SignalWord::Danger);
        records[0].cas_number = "50-00-0".into();
        let severity = ResultQuery {
            found: Some(true),
            sort: SortKey::Severity,
            descending: true,
            ..Default::default()
        };
        assert_eq!(
            cas(&severity.apply(&records, &OverrideMap::new())),
            vec!["50-00-0", "64-17-5", "67-64-1"]
        );

        let reversed = ResultQuery {
            descending: true,
            ..Default::default()
        };
        assert_eq!(
            cas(&reversed.apply(&records, &OverrideMap::new())),
            vec!["00-00-0", "67-64-1", "64-17-5", "50-00-0"]
        );
    }

    #[test]
    fn test_multiple_and_pictogram_filters() {
        let records = records();
        let multiple = ResultQuery {
            multiple_only: true,
            ..Default::default()
        };
        assert_eq!(cas(&multiple.apply(&records, &OverrideMap::new())), vec!["64-17-5"]);

        let flammable = ResultQuery {
            pictogram: Some("ghs02".into()),
            ..Default::default()
        };
        assert_eq!(cas(&flammable.apply(&records, &OverrideMap::new())), vec!["64-17-5", "67-64-1"]);
    }
}
