pub mod columns;
mod reader;
mod skills;

pub use columns::{
    LEVEL_RULE_COLUMNS, MEMBER_FIXED_COLUMNS, TASK_COMPUTED_COLUMNS, TASK_FIXED_COLUMNS,
    TASK_REQUIRED_COLUMNS,
};
pub use skills::{accept_discovered_skills, derive_short_name, skill_definition_from_column};

use chrono::Utc;
use reader::{RowView, Sheet};
use tta_core::{
    ImportResult, LevelRule, Member, RowError, SchemaError, SkillId, SkillSchema, Task,
    MAX_SKILL_VALUE,
};
use uuid::Uuid;

/// Parses the level-rules file. The column set is fixed; there are no
/// dynamic columns and nothing to discover.
pub fn parse_level_rules(text: &str) -> Result<ImportResult<LevelRule>, SchemaError> {
    let sheet = Sheet::parse(text)?;
    sheet.require_columns(&LEVEL_RULE_COLUMNS)?;

    let mut errors: Vec<RowError> = Vec::new();
    let mut records: Vec<LevelRule> = Vec::new();

    for (row_no, row) in sheet.data_rows() {
        let Ok(level_id) = row.get("Level ID").parse::<i64>() else {
            errors.push(row_error(row_no, "Level ID", "Level ID must be an integer"));
            continue;
        };
        let level_name = row.get("Level Name");
        if level_name.is_empty() {
            errors.push(row_error(row_no, "Level Name", "Level Name must not be empty"));
            continue;
        }
        let Some(max_self) = non_negative_number(row.get("Max SP Self")) else {
            errors.push(row_error(
                row_no,
                "Max SP Self",
                "Max SP Self must be a non-negative number",
            ));
            continue;
        };
        let Some(review_authority) = non_negative_number(row.get("Review Authority")) else {
            errors.push(row_error(
                row_no,
                "Review Authority",
                "Review Authority must be a non-negative number",
            ));
            continue;
        };

        records.push(LevelRule {
            level_id,
            level_name: level_name.to_string(),
            max_self_approved_complexity: max_self,
            review_authority,
        });
    }

    Ok(ImportResult::new(records, errors, Vec::new()))
}

/// Parses the member-profile file against the current schema. Every header
/// outside the fixed set is a skill column; unknown ones are reported as
/// discovered and their cells are not imported.
pub fn parse_members(
    text: &str,
    schema: &SkillSchema,
) -> Result<ImportResult<Member>, SchemaError> {
    let sheet = Sheet::parse(text)?;
    sheet.require_columns(&MEMBER_FIXED_COLUMNS)?;

    let skill_columns = dynamic_columns(sheet.headers(), &MEMBER_FIXED_COLUMNS, &[]);
    let discovered = unknown_columns(&skill_columns, schema);

    let mut errors: Vec<RowError> = Vec::new();
    let mut records: Vec<Member> = Vec::new();

    for (row_no, row) in sheet.data_rows() {
        let name = row.get("Member Name");
        if name.is_empty() {
            errors.push(row_error(row_no, "Member Name", "Member Name must not be empty"));
            continue;
        }
        let level = row.get("Current Level");
        if level.is_empty() {
            errors.push(row_error(
                row_no,
                "Current Level",
                "Current Level must not be empty",
            ));
            continue;
        }

        let Some(skill_values) = read_skill_cells(&row, row_no, &skill_columns, schema, &mut errors)
        else {
            continue;
        };

        let now = Utc::now();
        records.push(Member {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            level_name: level.to_string(),
            last_review_date: row.get("Last Review Date").to_string(),
            skills: skill_values,
            created_at: now,
            updated_at: now,
        });
    }

    Ok(ImportResult::new(records, errors, discovered))
}

/// Parses the task-allocation file. Headers outside the fixed set that are
/// not reserved computed-output columns are complexity columns.
pub fn parse_tasks(text: &str, schema: &SkillSchema) -> Result<ImportResult<Task>, SchemaError> {
    let sheet = Sheet::parse(text)?;
    sheet.require_columns(&TASK_REQUIRED_COLUMNS)?;

    let complexity_columns =
        dynamic_columns(sheet.headers(), &TASK_FIXED_COLUMNS, &TASK_COMPUTED_COLUMNS);
    let discovered = unknown_columns(&complexity_columns, schema);

    let mut errors: Vec<RowError> = Vec::new();
    let mut records: Vec<Task> = Vec::new();

    for (row_no, row) in sheet.data_rows() {
        let name = row.get("Task/Feature");
        if name.is_empty() {
            errors.push(row_error(row_no, "Task/Feature", "Task/Feature must not be empty"));
            continue;
        }

        let Some(complexity) = read_skill_cells(&row, row_no, &complexity_columns, schema, &mut errors)
        else {
            continue;
        };

        let story_points = row
            .get("Final SP")
            .parse::<f64>()
            .ok()
            .filter(|sp| sp.is_finite())
            .unwrap_or(0.0)
            .max(0.0);

        let now = Utc::now();
        records.push(Task {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            link: row.get("Link").to_string(),
            story_points,
            assignee_name: row.get("Assignee").to_string(),
            complexity,
            completed: false,
            manual_reviewer: None,
            created_at: now,
            updated_at: now,
        });
    }

    Ok(ImportResult::new(records, errors, discovered))
}

/// Header-only scan used for the pre-import prompt: infers the record kind
/// from the fixed columns present and returns the headers the schema does not
/// know yet.
pub fn detect_skill_columns(text: &str, schema: &SkillSchema) -> Result<Vec<String>, SchemaError> {
    let sheet = Sheet::parse(text)?;
    let headers = sheet.headers();

    let is_member_file = MEMBER_FIXED_COLUMNS
        .iter()
        .all(|col| headers.iter().any(|h| h == col));
    let is_task_file = TASK_FIXED_COLUMNS
        .iter()
        .any(|col| headers.iter().any(|h| h == col));

    let skill_columns = if is_member_file {
        dynamic_columns(headers, &MEMBER_FIXED_COLUMNS, &[])
    } else if is_task_file {
        dynamic_columns(headers, &TASK_FIXED_COLUMNS, &TASK_COMPUTED_COLUMNS)
    } else {
        Vec::new()
    };
    Ok(unknown_columns(&skill_columns, schema))
}

fn row_error(row: usize, column: &str, message: &str) -> RowError {
    RowError {
        row,
        column: column.to_string(),
        message: message.to_string(),
    }
}

fn non_negative_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Headers that are neither fixed nor reserved, in file order, without
/// repeats.
fn dynamic_columns(headers: &[String], fixed: &[&str], reserved: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for header in headers {
        if header.is_empty()
            || fixed.iter().any(|c| c == header)
            || reserved.iter().any(|c| c == header)
            || out.iter().any(|c| c == header)
        {
            continue;
        }
        out.push(header.clone());
    }
    out
}

fn unknown_columns(skill_columns: &[String], schema: &SkillSchema) -> Vec<String> {
    skill_columns
        .iter()
        .filter(|col| schema.by_column(col).is_none())
        .cloned()
        .collect()
}

/// Reads every skill/complexity cell of one row. A present, non-empty cell
/// must be an integer in [1,5]; 0 is expressed by leaving the cell empty.
/// All bad cells of the row are reported, and any bad cell drops the whole
/// row (`None`). Cells under columns the schema cannot resolve are skipped.
fn read_skill_cells(
    row: &RowView<'_>,
    row_no: usize,
    skill_columns: &[String],
    schema: &SkillSchema,
    errors: &mut Vec<RowError>,
) -> Option<std::collections::BTreeMap<SkillId, u8>> {
    let mut values = std::collections::BTreeMap::new();
    let mut row_ok = true;

    for column in skill_columns {
        let raw = row.get(column);
        let value = if raw.is_empty() {
            0
        } else {
            match raw.parse::<i64>() {
                Ok(v) if (1..=i64::from(MAX_SKILL_VALUE)).contains(&v) => v as u8,
                _ => {
                    errors.push(RowError {
                        row: row_no,
                        column: column.clone(),
                        message: format!("skill value must be between 1 and 5, got: {raw}"),
                    });
                    row_ok = false;
                    continue;
                }
            }
        };
        if let Some(skill) = schema.by_column(column) {
            values.insert(skill.id.clone(), value);
        }
    }

    row_ok.then_some(values)
}
