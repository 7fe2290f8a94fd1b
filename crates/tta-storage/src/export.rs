use crate::AllocationStore;
use tta_core::{LevelRule, Member};

/// Level-rules file with the exact import column set.
pub fn export_level_rules_csv(store: &AllocationStore) -> String {
    let mut lines = vec![csv_line(&[
        "Level ID",
        "Level Name",
        "Max SP Self",
        "Review Authority",
    ])];
    for rule in store.level_rules() {
        lines.push(rule_line(rule));
    }
    lines.join("\n")
}

/// Member-profile file: fixed columns plus one column per schema skill,
/// headed by its source column name so a re-import resolves every column.
/// Zero-valued cells are written empty, matching the import convention that
/// absence means 0.
pub fn export_members_csv(store: &AllocationStore) -> String {
    let mut headers = vec![
        "Member Name".to_string(),
        "Current Level".to_string(),
        "Last Review Date".to_string(),
    ];
    headers.extend(
        store
            .schema()
            .iter()
            .map(|s| s.source_column_name.clone()),
    );

    let mut lines = vec![csv_line_owned(&headers)];
    for member in store.members() {
        lines.push(member_line(store, member));
    }
    lines.join("\n")
}

/// Task-allocation file: fixed columns, one column per schema skill, then the
/// reserved computed-output columns populated from the engine. Import ignores
/// the computed columns, so the round-trip stays lossless.
pub fn export_tasks_csv(store: &AllocationStore) -> String {
    let mut headers = vec![
        "Task/Feature".to_string(),
        "Link".to_string(),
        "Final SP".to_string(),
        "Assignee".to_string(),
    ];
    headers.extend(
        store
            .schema()
            .iter()
            .map(|s| s.source_column_name.clone()),
    );
    headers.extend(
        [
            "Max Complexity",
            "Skill gap check",
            "Suitability Score",
            "Status",
            "Reviewer",
            "Review Focus",
            "Reviewer matching",
        ]
        .map(String::from),
    );

    let mut lines = vec![csv_line_owned(&headers)];
    for (task, view) in store.task_views() {
        let mut fields = vec![
            task.name.clone(),
            task.link.clone(),
            number(task.story_points),
            task.assignee_name.clone(),
        ];
        fields.extend(store.schema().iter().map(|skill| {
            skill_cell(task.complexity_value(&skill.id))
        }));
        fields.push(view.max_complexity.to_string());
        fields.push(view.skill_gaps.join(", "));
        fields.push(view.suitability_score.to_string());
        fields.push(view.review_status.label().to_string());
        fields.push(view.suggested_reviewer.unwrap_or_default());
        fields.push(view.review_focus);
        fields.push(view.reviewer_validity.label().to_string());
        lines.push(csv_line_owned(&fields));
    }
    lines.join("\n")
}

fn rule_line(rule: &LevelRule) -> String {
    csv_line_owned(&[
        rule.level_id.to_string(),
        rule.level_name.clone(),
        number(rule.max_self_approved_complexity),
        number(rule.review_authority),
    ])
}

fn member_line(store: &AllocationStore, member: &Member) -> String {
    let mut fields = vec![
        member.name.clone(),
        member.level_name.clone(),
        member.last_review_date.clone(),
    ];
    fields.extend(
        store
            .schema()
            .iter()
            .map(|skill| skill_cell(member.skill_value(&skill.id))),
    );
    csv_line_owned(&fields)
}

fn skill_cell(value: u8) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

fn number(value: f64) -> String {
    value.to_string()
}

fn csv_line(fields: &[&str]) -> String {
    let owned: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
    csv_line_owned(&owned)
}

fn csv_line_owned(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| quote_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tta_core::{LevelRule, Member, SkillId, Task};
    use tta_import::{parse_members, parse_tasks, skill_definition_from_column};

    fn store_with_skills(columns: &[&str]) -> (AllocationStore, Vec<SkillId>) {
        let mut store = AllocationStore::new();
        let mut ids = Vec::new();
        for column in columns {
            store
                .add_skill(skill_definition_from_column(column))
                .expect("add skill");
            ids.push(store.schema().by_column(column).expect("skill").id.clone());
        }
        (store, ids)
    }

    #[test]
    fn level_rules_export_matches_import_columns() {
        let mut store = AllocationStore::new();
        store.set_level_rules(vec![LevelRule {
            level_id: 2,
            level_name: "Junior".to_string(),
            max_self_approved_complexity: 3.0,
            review_authority: 0.5,
        }]);
        let csv = export_level_rules_csv(&store);
        assert_eq!(
            csv,
            "Level ID,Level Name,Max SP Self,Review Authority\n2,Junior,3,0.5"
        );
    }

    #[test]
    fn member_export_reimports_losslessly() {
        let (mut store, ids) = store_with_skills(&["Tech skill", "UI/UX"]);
        let now = Utc::now();
        store.add_member(Member {
            id: "m1".to_string(),
            name: "Alice, the first".to_string(),
            level_name: "Senior".to_string(),
            last_review_date: "June 1, 2026".to_string(),
            skills: BTreeMap::from([(ids[0].clone(), 4), (ids[1].clone(), 0)]),
            created_at: now,
            updated_at: now,
        });

        let csv = export_members_csv(&store);
        let result = parse_members(&csv, store.schema()).expect("reimport");
        assert!(result.success);
        assert!(result.discovered_skill_columns.is_empty());

        let imported = &result.records[0];
        assert_eq!(imported.name, "Alice, the first");
        assert_eq!(imported.level_name, "Senior");
        assert_eq!(imported.skills, store.members()[0].skills);
    }

    #[test]
    fn task_export_reimports_losslessly_and_skips_computed_columns() {
        let (mut store, ids) = store_with_skills(&["Tech skill"]);
        store.set_level_rules(vec![LevelRule {
            level_id: 1,
            level_name: "Junior".to_string(),
            max_self_approved_complexity: 1.0,
            review_authority: 0.0,
        }]);
        let now = Utc::now();
        store.add_member(Member {
            id: "m1".to_string(),
            name: "Alice".to_string(),
            level_name: "Junior".to_string(),
            last_review_date: String::new(),
            skills: BTreeMap::from([(ids[0].clone(), 1)]),
            created_at: now,
            updated_at: now,
        });
        store.add_task(Task {
            id: "t1".to_string(),
            name: "Checkout flow".to_string(),
            link: "XCOR-18024".to_string(),
            story_points: 2.5,
            assignee_name: "Alice".to_string(),
            complexity: BTreeMap::from([(ids[0].clone(), 3)]),
            completed: false,
            manual_reviewer: None,
            created_at: now,
            updated_at: now,
        });

        let csv = export_tasks_csv(&store);
        let header = csv.lines().next().expect("header");
        assert!(header.contains("Max Complexity"));
        assert!(header.contains("Reviewer matching"));

        let result = parse_tasks(&csv, store.schema()).expect("reimport");
        assert!(result.success);
        assert!(result.discovered_skill_columns.is_empty());

        let imported = &result.records[0];
        assert_eq!(imported.complexity, store.tasks()[0].complexity);
        assert_eq!(imported.story_points, 2.5);
        assert_eq!(imported.assignee_name, "Alice");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
