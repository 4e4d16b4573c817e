//! Base-case checklist tree.
//!
//! # Responsibility
//! - Model leaf checks and AND/OR groups as one recursive sum type.
//! - Map the persisted `{item, check|group|any_of}` shape onto that type.
//!
//! # Invariants
//! - The tree is read-only to the verifier and to ledger mutations.
//! - Check types are kept as declared strings; unknown types are surfaced at
//!   evaluation time instead of rejecting the whole ledger on load.
//! - A `base_case` mapping with a `checklist` key is always a checklist. A
//!   malformed entry fails the load; it never degrades to an empty single check.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Check type string: run a command, pass on exit code 0.
pub const CHECK_COMMAND: &str = "command";
/// Check type string: run a command, pass on non-zero exit code.
pub const CHECK_NOT_COMMAND: &str = "not_command";
/// Check type string: pass when the path or glob matches something.
pub const CHECK_FILE: &str = "file";
/// Check type string: pass when the path or glob matches nothing.
pub const CHECK_NOT_FILE: &str = "not_file";
/// Check type string: requires external judgment, never executed locally.
pub const CHECK_QUALITY: &str = "quality";

const SUPPORTED_CHECK_KINDS: &[&str] = &[
    CHECK_COMMAND,
    CHECK_NOT_COMMAND,
    CHECK_FILE,
    CHECK_NOT_FILE,
    CHECK_QUALITY,
];

/// Returns supported check type strings.
pub fn supported_check_kinds() -> &'static [&'static str] {
    SUPPORTED_CHECK_KINDS
}

/// Parsed leaf check type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Command,
    NotCommand,
    File,
    NotFile,
    Quality,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => CHECK_COMMAND,
            Self::NotCommand => CHECK_NOT_COMMAND,
            Self::File => CHECK_FILE,
            Self::NotFile => CHECK_NOT_FILE,
            Self::Quality => CHECK_QUALITY,
        }
    }
}

/// Check type parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKindError {
    EmptyKind,
    UnsupportedKind(String),
}

impl Display for CheckKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKind => write!(f, "Check type is missing"),
            Self::UnsupportedKind(value) => write!(f, "Unknown check type: {value}"),
        }
    }
}

impl Error for CheckKindError {}

/// Parses one declared check type.
pub fn parse_check_kind(value: &str) -> Result<CheckKind, CheckKindError> {
    match value.trim() {
        "" => Err(CheckKindError::EmptyKind),
        CHECK_COMMAND => Ok(CheckKind::Command),
        CHECK_NOT_COMMAND => Ok(CheckKind::NotCommand),
        CHECK_FILE => Ok(CheckKind::File),
        CHECK_NOT_FILE => Ok(CheckKind::NotFile),
        CHECK_QUALITY => Ok(CheckKind::Quality),
        other => Err(CheckKindError::UnsupportedKind(other.to_string())),
    }
}

/// One mechanical or judgment-based check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(rename = "type")]
    pub check_type: String,
    /// Command line for command checks, path or glob for file checks.
    #[serde(default)]
    pub value: String,
    /// Quality checks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    /// Quality checks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<PassThreshold>,
}

/// Quality pass threshold: a numeric score or a free-form label such as `7/10`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PassThreshold {
    Score(f64),
    Label(String),
}

impl PassThreshold {
    /// Numeric-looking labels parse as scores.
    pub fn from_label(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.trim().parse::<f64>() {
            Ok(score) if score.is_finite() => Self::Score(score),
            _ => Self::Label(value),
        }
    }
}

impl Display for PassThreshold {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(score) => write!(f, "{score}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl From<f64> for PassThreshold {
    fn from(value: f64) -> Self {
        Self::Score(value)
    }
}

impl From<&str> for PassThreshold {
    fn from(value: &str) -> Self {
        Self::from_label(value)
    }
}

impl<'de> Deserialize<'de> for PassThreshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Score(f64),
            Label(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Score(score) => Ok(Self::Score(score)),
            Raw::Label(label) => Ok(Self::from_label(label)),
        }
    }
}

impl Check {
    pub fn new(kind: CheckKind, value: impl Into<String>) -> Self {
        Self {
            check_type: kind.as_str().to_string(),
            value: value.into(),
            criteria: None,
            pass_threshold: None,
        }
    }

    pub fn quality(
        criteria: impl Into<String>,
        pass_threshold: impl Into<PassThreshold>,
    ) -> Self {
        Self {
            check_type: CHECK_QUALITY.to_string(),
            value: String::new(),
            criteria: Some(criteria.into()),
            pass_threshold: Some(pass_threshold.into()),
        }
    }

    pub fn kind(&self) -> Result<CheckKind, CheckKindError> {
        parse_check_kind(&self.check_type)
    }
}

/// Recursive checklist node.
#[derive(Debug, Clone, PartialEq)]
pub enum ChecklistNode {
    Leaf(Check),
    /// AND group: every non-skipped child must pass.
    All(Vec<ChecklistItem>),
    /// OR group (`any_of`): at least one non-skipped child must pass.
    Any(Vec<ChecklistItem>),
    /// Item declares neither a check nor a group; always fails.
    Undefined,
}

/// Named checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChecklistItem", into = "RawChecklistItem")]
pub struct ChecklistItem {
    pub item: String,
    pub node: ChecklistNode,
}

impl ChecklistItem {
    pub fn leaf(item: impl Into<String>, check: Check) -> Self {
        Self {
            item: item.into(),
            node: ChecklistNode::Leaf(check),
        }
    }

    pub fn all(item: impl Into<String>, children: Vec<ChecklistItem>) -> Self {
        Self {
            item: item.into(),
            node: ChecklistNode::All(children),
        }
    }

    pub fn any(item: impl Into<String>, children: Vec<ChecklistItem>) -> Self {
        Self {
            item: item.into(),
            node: ChecklistNode::Any(children),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawChecklistItem {
    #[serde(default)]
    item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    check: Option<Check>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<Vec<ChecklistItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<ChecklistItem>>,
}

impl From<RawChecklistItem> for ChecklistItem {
    fn from(raw: RawChecklistItem) -> Self {
        let node = if let Some(children) = raw.group {
            ChecklistNode::All(children)
        } else if let Some(children) = raw.any_of {
            ChecklistNode::Any(children)
        } else if let Some(check) = raw.check {
            ChecklistNode::Leaf(check)
        } else {
            ChecklistNode::Undefined
        };
        Self {
            item: raw.item.unwrap_or_else(|| "Unknown".to_string()),
            node,
        }
    }
}

impl From<ChecklistItem> for RawChecklistItem {
    fn from(value: ChecklistItem) -> Self {
        let mut raw = RawChecklistItem {
            item: Some(value.item),
            ..RawChecklistItem::default()
        };
        match value.node {
            ChecklistNode::Leaf(check) => raw.check = Some(check),
            ChecklistNode::All(children) => raw.group = Some(children),
            ChecklistNode::Any(children) => raw.any_of = Some(children),
            ChecklistNode::Undefined => {}
        }
        raw
    }
}

/// Objective completion criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BaseCase {
    /// Hierarchical checklist.
    Checklist { checklist: Vec<ChecklistItem> },
    /// Legacy single check, evaluated as a one-leaf tree named `base_case`.
    Single(Check),
}

const CHECKLIST_KEY: &str = "checklist";

impl<'de> Deserialize<'de> for BaseCase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let checklist = value
            .as_mapping()
            .and_then(|mapping| mapping.get(CHECKLIST_KEY))
            .cloned();
        match checklist {
            Some(items) => serde_yaml::from_value(items)
                .map(|checklist| Self::Checklist { checklist })
                .map_err(|err| D::Error::custom(format!("invalid base_case checklist: {err}"))),
            None => serde_yaml::from_value(value)
                .map(Self::Single)
                .map_err(|err| D::Error::custom(format!("invalid base_case check: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_check_kind, supported_check_kinds, BaseCase, CheckKind, CheckKindError,
        ChecklistNode, PassThreshold,
    };

    #[test]
    fn parses_all_supported_check_kinds() {
        for value in supported_check_kinds() {
            let kind = parse_check_kind(value).expect("supported kind parses");
            assert_eq!(kind.as_str(), *value);
        }
        assert_eq!(parse_check_kind(" file "), Ok(CheckKind::File));
    }

    #[test]
    fn rejects_empty_and_unknown_check_kinds() {
        assert_eq!(parse_check_kind(""), Err(CheckKindError::EmptyKind));
        assert_eq!(
            parse_check_kind("http"),
            Err(CheckKindError::UnsupportedKind("http".to_string()))
        );
    }

    #[test]
    fn nested_checklist_deserializes_into_sum_type() {
        let yaml = r#"
checklist:
  - item: "Build passes"
    check:
      type: command
      value: "cargo build"
  - item: "Docs"
    any_of:
      - item: "README"
        check:
          type: file
          value: "README.md"
      - item: "Reviewed"
        check:
          type: quality
          criteria: "docs explain setup"
          pass_threshold: 7
  - item: "Dangling"
"#;
        let base_case: BaseCase = serde_yaml::from_str(yaml).expect("checklist parses");
        let BaseCase::Checklist { checklist } = base_case else {
            panic!("expected checklist variant");
        };
        assert_eq!(checklist.len(), 3);
        assert!(matches!(checklist[0].node, ChecklistNode::Leaf(_)));
        match &checklist[1].node {
            ChecklistNode::Any(children) => {
                assert_eq!(children.len(), 2);
                match &children[1].node {
                    ChecklistNode::Leaf(check) => {
                        assert_eq!(check.kind(), Ok(CheckKind::Quality));
                        assert_eq!(check.pass_threshold, Some(PassThreshold::Score(7.0)));
                    }
                    other => panic!("unexpected node: {other:?}"),
                }
            }
            other => panic!("unexpected node: {other:?}"),
        }
        assert_eq!(checklist[2].node, ChecklistNode::Undefined);
    }

    #[test]
    fn legacy_single_check_deserializes() {
        let yaml = "type: command\nvalue: \"make test\"\n";
        let base_case: BaseCase = serde_yaml::from_str(yaml).expect("legacy parses");
        match base_case {
            BaseCase::Single(check) => {
                assert_eq!(check.kind(), Ok(CheckKind::Command));
                assert_eq!(check.value, "make test");
            }
            other => panic!("unexpected base case: {other:?}"),
        }
    }

    #[test]
    fn label_threshold_keeps_checklist_shape() {
        let yaml = r#"
checklist:
  - item: "Build passes"
    check:
      type: command
      value: "cargo build"
  - item: "Prose"
    check:
      type: quality
      criteria: "reads well"
      pass_threshold: "7/10"
"#;
        let base_case: BaseCase = serde_yaml::from_str(yaml).expect("checklist parses");
        let BaseCase::Checklist { checklist } = base_case else {
            panic!("label threshold must not demote the checklist");
        };
        assert_eq!(checklist[0].item, "Build passes");
        match &checklist[1].node {
            ChecklistNode::Leaf(check) => assert_eq!(
                check.pass_threshold,
                Some(PassThreshold::Label("7/10".to_string()))
            ),
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn malformed_checklist_entry_is_rejected() {
        let missing_type = "checklist:\n  - item: \"Build\"\n    check:\n      value: \"make\"\n";
        let err = serde_yaml::from_str::<BaseCase>(missing_type).expect_err("missing type");
        assert!(err.to_string().contains("invalid base_case checklist"));

        let scalar_check = "checklist:\n  - item: \"Build\"\n    check: 5\n";
        assert!(serde_yaml::from_str::<BaseCase>(scalar_check).is_err());

        let empty_single = "value: \"make\"\n";
        assert!(serde_yaml::from_str::<BaseCase>(empty_single).is_err());
    }

    #[test]
    fn numeric_label_threshold_becomes_score() {
        assert_eq!(PassThreshold::from("0.5"), PassThreshold::Score(0.5));
        assert_eq!(PassThreshold::from("7/10").to_string(), "7/10");
        assert_eq!(PassThreshold::from(7.0).to_string(), "7");
    }
}
