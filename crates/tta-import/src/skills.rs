use chrono::Utc;
use regex::Regex;
use tta_core::{sync_members, sync_tasks, Member, SchemaError, SkillDefinition, SkillId, SkillSchema, Task};

/// Builds a registrable definition for a discovered CSV column. The column
/// text is kept verbatim as the re-import join key.
pub fn skill_definition_from_column(column: &str) -> SkillDefinition {
    let now = Utc::now();
    SkillDefinition {
        id: SkillId::generate(),
        name: column.to_string(),
        short_name: derive_short_name(column),
        source_column_name: column.to_string(),
        member_description: None,
        task_description: None,
        created_at: now,
        updated_at: now,
    }
}

/// Display label derived from a skill name: a trailing "skill" word is
/// dropped, names with slashes (like "UI/UX") stay verbatim, a single word
/// stays whole, multi-word names shrink to the first four letters of the
/// first word.
pub fn derive_short_name(name: &str) -> String {
    let trailing_skill = Regex::new(r"(?i)\s+skill\s*$").expect("valid regex");
    let cleaned = trailing_skill.replace(name.trim(), "").trim().to_string();

    if cleaned.contains('/') {
        return cleaned;
    }
    let mut words = cleaned.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(_)) => first.chars().take(4).collect(),
        (Some(first), None) => first.to_string(),
        (None, _) => cleaned,
    }
}

/// Schema reconciliation: registers one definition per accepted column, then
/// back-fills every member and task so the completeness invariant holds.
/// Columns already present in the schema are skipped, which makes accepting
/// the same discovery report twice harmless.
pub fn accept_discovered_skills(
    schema: &mut SkillSchema,
    members: &mut [Member],
    tasks: &mut [Task],
    columns: &[String],
) -> Result<Vec<SkillDefinition>, SchemaError> {
    let mut created = Vec::new();
    for column in columns {
        if schema.by_column(column).is_some() {
            continue;
        }
        let definition = skill_definition_from_column(column);
        schema.add(definition.clone())?;
        created.push(definition);
    }
    sync_members(members, schema);
    sync_tasks(tasks, schema);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_drops_trailing_skill_word() {
        assert_eq!(derive_short_name("Tech skill"), "Tech");
        assert_eq!(derive_short_name("Database Skill"), "Database");
    }

    #[test]
    fn short_name_keeps_slashed_names_verbatim() {
        assert_eq!(derive_short_name("UI/UX"), "UI/UX");
        assert_eq!(derive_short_name("UI/UX skill"), "UI/UX");
    }

    #[test]
    fn short_name_truncates_multi_word_names() {
        assert_eq!(derive_short_name("Requirement Elicitation"), "Requ");
        assert_eq!(derive_short_name("Go To Market"), "Go");
    }

    #[test]
    fn short_name_keeps_single_words_whole() {
        assert_eq!(derive_short_name("Database"), "Database");
    }

    #[test]
    fn accepting_discovered_columns_registers_and_backfills() {
        let mut schema = SkillSchema::new();
        let mut members: Vec<Member> = Vec::new();
        let mut tasks: Vec<Task> = Vec::new();

        let columns = vec!["Tech skill".to_string(), "UI/UX".to_string()];
        let created =
            accept_discovered_skills(&mut schema, &mut members, &mut tasks, &columns)
                .expect("reconcile");
        assert_eq!(created.len(), 2);
        assert!(schema.by_column("Tech skill").is_some());

        // Accepting the same report again creates nothing new.
        let created_again =
            accept_discovered_skills(&mut schema, &mut members, &mut tasks, &columns)
                .expect("reconcile again");
        assert!(created_again.is_empty());
        assert_eq!(schema.len(), 2);
    }
}
