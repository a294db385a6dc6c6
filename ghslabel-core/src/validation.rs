//! Batch Input Validation - Rule/Policy Separation
//!
//! Rules produce structured violations per token.
//! Policy decides which tokens are accepted into the batch.

use serde::{Deserialize, Serialize};

pub const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub input: String,
    pub message: String,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchParse {
    pub accepted: Vec<String>,
    pub violations: Vec<ValidationViolation>,
}

impl BatchParse {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }
}

/// Validation rule trait - produces violations for a normalized token
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, cas: &str) -> Option<ValidationViolation>;
}

/// Trim and fold full-width digits/hyphens into ASCII.
pub fn normalize_cas(token: &str) -> String {
    token
        .trim()
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '－' | '—' | '–' => '-',
            _ => c,
        })
        .collect()
}

fn split_groups(cas: &str) -> Option<(&str, &str, &str)> {
    let mut parts = cas.split('-');
    let (a, b, c) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((a, b, c))
}

// --- Concrete Rules ---

pub struct FormatRule;

impl ValidationRule for FormatRule {
    fn name(&self) -> &'static str { "format" }

    fn validate(&self, cas: &str) -> Option<ValidationViolation> {
        let ok = split_groups(cas).is_some_and(|(a, b, c)| {
            (2..=7).contains(&a.len())
                && b.len() == 2
                && c.len() == 1
                && [a, b, c].iter().all(|g| g.chars().all(|ch| ch.is_ascii_digit()))
        });
        if ok {
            return None;
        }
        Some(ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            input: cas.to_string(),
            message: "Not a CAS registry number".to_string(),
            expected: Some("NNNNNNN-NN-N (2-7 digits, 2 digits, check digit)".to_string()),
        })
    }
}

pub struct ChecksumRule;

impl ChecksumRule {
    /// Sum of each digit times its position counted from the right, mod 10.
    pub fn check_digit(cas: &str) -> Option<u32> {
        let (a, b, _) = split_groups(cas)?;
        let digits: Vec<u32> = format!("{a}{b}").chars().map(|c| c.to_digit(10)).collect::<Option<_>>()?;
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, d)| (i as u32 + 1) * d)
            .sum();
        Some(sum % 10)
    }
}

impl ValidationRule for ChecksumRule {
    fn name(&self) -> &'static str { "checksum" }

    fn validate(&self, cas: &str) -> Option<ValidationViolation> {
        let expected = Self::check_digit(cas)?;
        let actual = split_groups(cas)?.2.chars().next()?.to_digit(10)?;
        if expected == actual {
            return None;
        }
        Some(ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            input: cas.to_string(),
            message: "CAS check digit mismatch".to_string(),
            expected: Some(format!("check digit {expected}")),
        })
    }
}

/// Validator orchestrates rules and applies the batch policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
    max_batch: usize,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(FormatRule), Box::new(ChecksumRule)],
            max_batch: MAX_BATCH,
        }
    }

    pub fn validate(&self, cas: &str) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        for rule in &self.rules {
            if let Some(v) = rule.validate(cas) {
                let blocking = v.severity == ViolationSeverity::Error;
                violations.push(v);
                if blocking {
                    break;
                }
            }
        }
        violations
    }

    /// Split free text (newlines, commas, semicolons, whitespace) into
    /// accepted CAS numbers. Duplicates are dropped, order kept.
    pub fn parse_batch(&self, input: &str) -> BatchParse {
        let mut result = BatchParse::default();

        let tokens = input
            .split(|c: char| c == ',' || c == ';' || c == '，' || c == '；' || c.is_whitespace())
            .map(normalize_cas)
            .filter(|t| !t.is_empty());

        for cas in tokens {
            let violations = self.validate(&cas);
            let rejected = violations.iter().any(|v| v.severity == ViolationSeverity::Error);
            result.violations.extend(violations);
            if rejected {
                continue;
            }

            if result.accepted.contains(&cas) {
                result.violations.push(ValidationViolation {
                    rule: "duplicate".to_string(),
                    severity: ViolationSeverity::Info,
                    input: cas,
                    message: "Duplicate entry ignored".to_string(),
                    expected: None,
                });
                continue;
            }

            if result.accepted.len() >= self.max_batch {
                result.violations.push(ValidationViolation {
                    rule: "batch_limit".to_string(),
                    severity: ViolationSeverity::Warning,
                    input: cas,
                    message: "Batch limit reached, entry dropped".to_string(),
                    expected: Some(format!("at most {} entries", self.max_batch)),
                });
                continue;
            }

            result.accepted.push(cas);
        }

        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
