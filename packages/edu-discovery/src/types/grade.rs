//! Grades and grade bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade used when the caller's grade cannot be read as a number.
pub const FALLBACK_GRADE: u8 = 8;

/// Coarse schooling stage used to pick trusted domains and exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeBand {
    #[serde(rename = "K-4")]
    Primary,
    #[serde(rename = "5-8")]
    Middle,
    #[serde(rename = "9-12")]
    High,
}

impl GradeBand {
    pub const ALL: [GradeBand; 3] = [GradeBand::Primary, GradeBand::Middle, GradeBand::High];

    /// Band for a numeric grade. Total over every integer.
    pub fn from_grade(grade: i64) -> Self {
        if grade <= 4 {
            GradeBand::Primary
        } else if grade <= 8 {
            GradeBand::Middle
        } else {
            GradeBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::Primary => "K-4",
            GradeBand::Middle => "5-8",
            GradeBand::High => "9-12",
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A grade as supplied by the caller.
///
/// Keeps the original text for display and, when it can be coerced,
/// the numeric grade. `"8"`, `"Grade 8"`, `"class 8"` and `"8th"` all
/// read as 8; `"K"` and `"kindergarten"` read as 0.
///
/// Serializes as a JSON number when the caller gave a plain integer and
/// as the original string otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GradeInput", into = "GradeInput")]
pub struct Grade {
    raw: String,
    number: Option<i64>,
}

impl Grade {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let number = coerce(&raw);
        Self { raw, number }
    }

    pub fn number(&self) -> Option<i64> {
        self.number
    }

    /// Band for this grade; unreadable grades land in the middle band.
    pub fn band(&self) -> GradeBand {
        GradeBand::from_grade(self.number.unwrap_or(FALLBACK_GRADE as i64))
    }

    /// Text used after "Grade" in search queries.
    pub fn label(&self) -> String {
        match self.number {
            Some(0) => "K".to_string(),
            Some(n) => n.to_string(),
            None => {
                let trimmed = self.raw.trim();
                strip_prefix_ci(trimmed, "grade")
                    .map(str::trim)
                    .unwrap_or(trimmed)
                    .to_string()
            }
        }
    }
}

impl From<i64> for Grade {
    fn from(n: i64) -> Self {
        Self {
            raw: n.to_string(),
            number: Some(n),
        }
    }
}

impl From<i32> for Grade {
    fn from(n: i32) -> Self {
        Self::from(n as i64)
    }
}

impl From<u8> for Grade {
    fn from(n: u8) -> Self {
        Self::from(n as i64)
    }
}

impl From<&str> for Grade {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Grade {
    fn from(s: String) -> Self {
        Self::parse(s)
    }
}

/// Wire form of a grade: an integer or coercible text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GradeInput {
    Number(i64),
    Text(String),
}

impl From<GradeInput> for Grade {
    fn from(input: GradeInput) -> Self {
        match input {
            GradeInput::Number(n) => Grade::from(n),
            GradeInput::Text(s) => Grade::parse(s),
        }
    }
}

impl From<Grade> for GradeInput {
    fn from(grade: Grade) -> Self {
        match grade.number {
            Some(n) if grade.raw == n.to_string() => GradeInput::Number(n),
            _ => GradeInput::Text(grade.raw),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade {}", self.label())
    }
}

fn coerce(raw: &str) -> Option<i64> {
    let lower = raw.trim().to_lowercase();
    if let Ok(n) = lower.parse::<i64>() {
        return Some(n);
    }

    let rest = ["grade", "class", "year"]
        .iter()
        .find_map(|p| lower.strip_prefix(p))
        .unwrap_or(&lower)
        .trim();

    if matches!(rest, "k" | "kg" | "kindergarten") {
        return Some(0);
    }

    let rest = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|s| rest.strip_suffix(s))
        .unwrap_or(rest);

    rest.parse::<i64>().ok()
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(GradeBand::from_grade(-3), GradeBand::Primary);
        assert_eq!(GradeBand::from_grade(0), GradeBand::Primary);
        assert_eq!(GradeBand::from_grade(4), GradeBand::Primary);
        assert_eq!(GradeBand::from_grade(5), GradeBand::Middle);
        assert_eq!(GradeBand::from_grade(8), GradeBand::Middle);
        assert_eq!(GradeBand::from_grade(9), GradeBand::High);
        assert_eq!(GradeBand::from_grade(12), GradeBand::High);
        assert_eq!(GradeBand::from_grade(40), GradeBand::High);
    }

    #[test]
    fn test_grade_coercion() {
        assert_eq!(Grade::parse("8").number(), Some(8));
        assert_eq!(Grade::parse(" Grade 11 ").number(), Some(11));
        assert_eq!(Grade::parse("class 3").number(), Some(3));
        assert_eq!(Grade::parse("7th").number(), Some(7));
        assert_eq!(Grade::parse("K").number(), Some(0));
        assert_eq!(Grade::parse("Kindergarten").number(), Some(0));
        assert_eq!(Grade::parse("sophomore").number(), None);
    }

    #[test]
    fn test_unparseable_grade_defaults_to_middle_band() {
        assert_eq!(Grade::parse("sophomore").band(), GradeBand::Middle);
        assert_eq!(Grade::parse("").band(), GradeBand::Middle);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Grade::from(8).to_string(), "Grade 8");
        assert_eq!(Grade::parse("Grade 8").to_string(), "Grade 8");
        assert_eq!(Grade::parse("K").to_string(), "Grade K");
        assert_eq!(Grade::parse("Grade Twelve").to_string(), "Grade Twelve");
    }

    #[test]
    fn test_grade_reads_number_or_text() {
        let grade: Grade = serde_json::from_str("8").unwrap();
        assert_eq!(grade, Grade::from(8));

        let grade: Grade = serde_json::from_str("\"Grade 8\"").unwrap();
        assert_eq!(grade.number(), Some(8));
        assert_eq!(grade.to_string(), "Grade 8");

        let grade: Grade = serde_json::from_str("\"sophomore\"").unwrap();
        assert_eq!(grade.number(), None);
        assert_eq!(grade.band(), GradeBand::Middle);

        assert!(serde_json::from_str::<Grade>("{\"raw\": \"8\"}").is_err());
    }

    #[test]
    fn test_grade_writes_caller_form() {
        assert_eq!(serde_json::to_value(Grade::from(8)).unwrap(), serde_json::json!(8));
        assert_eq!(
            serde_json::to_value(Grade::parse("Grade 8")).unwrap(),
            serde_json::json!("Grade 8")
        );

        let back: Grade = serde_json::from_value(serde_json::to_value(Grade::parse("K")).unwrap())
            .unwrap();
        assert_eq!(back, Grade::parse("K"));
    }

    #[test]
    fn test_band_serde_labels() {
        let json = serde_json::to_string(&GradeBand::Primary).unwrap();
        assert_eq!(json, "\"K-4\"");
        let band: GradeBand = serde_json::from_str("\"9-12\"").unwrap();
        assert_eq!(band, GradeBand::High);
    }
}
