use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_SKILL_VALUE: u8 = 5;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate skill column: {column}")]
    DuplicateColumn { column: String },
    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
    #[error("unknown skill id: {id}")]
    UnknownSkill { id: String },
    #[error("malformed csv: {0}")]
    MalformedCsv(String),
}

/// Opaque identifier for one skill dimension. Generated once on creation and
/// used as the key of every member/task skill mapping, so it must never be
/// regenerated for an existing definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub short_name: String,
    /// CSV header this skill was discovered under; unique within a schema and
    /// the join key for re-import.
    pub source_column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Soft reference to `LevelRule::level_name`; may dangle after renames.
    pub level_name: String,
    #[serde(default)]
    pub last_review_date: String,
    pub skills: BTreeMap<SkillId, u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn skill_value(&self, id: &SkillId) -> u8 {
        self.skills.get(id).copied().unwrap_or(0)
    }

    /// Direct edits clamp instead of rejecting; range checks happen at the
    /// import/form boundary.
    pub fn set_skill(&mut self, id: SkillId, value: u8) {
        self.skills.insert(id, value.min(MAX_SKILL_VALUE));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub story_points: f64,
    /// Soft reference to `Member::name`; empty means unassigned.
    #[serde(default)]
    pub assignee_name: String,
    pub complexity: BTreeMap<SkillId, u8>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_reviewer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn complexity_value(&self, id: &SkillId) -> u8 {
        self.complexity.get(id).copied().unwrap_or(0)
    }

    pub fn set_complexity(&mut self, id: SkillId, value: u8) {
        self.complexity.insert(id, value.min(MAX_SKILL_VALUE));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRule {
    pub level_id: i64,
    pub level_name: String,
    pub max_self_approved_complexity: f64,
    pub review_authority: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    SelfApproved,
    NeedsReview,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::SelfApproved => "self-approved",
            ReviewStatus::NeedsReview => "needs-review",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::SelfApproved => "SELF-APPROVED",
            ReviewStatus::NeedsReview => "NEEDS REVIEW",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "self-approved" | "self_approved" | "selfapproved" => Ok(ReviewStatus::SelfApproved),
            "needs-review" | "needs_review" | "needsreview" => Ok(ReviewStatus::NeedsReview),
            other => Err(format!("Unknown review status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerValidity {
    Valid,
    None,
}

impl ReviewerValidity {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewerValidity::Valid => "✅ Valid",
            ReviewerValidity::None => "—",
        }
    }
}

impl fmt::Display for ReviewerValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived per-task allocation data. Recomputed from current store state on
/// every read; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedTaskView {
    pub max_complexity: u8,
    pub skill_gaps: Vec<String>,
    pub suitability_score: i32,
    pub review_status: ReviewStatus,
    pub suggested_reviewer: Option<String>,
    pub review_focus: String,
    pub reviewer_validity: ReviewerValidity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based row number; the header is row 1, data starts at row 2.
    pub row: usize,
    pub column: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ImportResult<T> {
    /// True iff zero row errors. Callers decide whether to keep partial
    /// `records` when false.
    pub success: bool,
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
    pub discovered_skill_columns: Vec<String>,
}

impl<T> ImportResult<T> {
    pub fn new(records: Vec<T>, errors: Vec<RowError>, discovered: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            records,
            errors,
            discovered_skill_columns: discovered,
        }
    }
}
