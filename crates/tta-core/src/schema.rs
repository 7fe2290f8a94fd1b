use crate::records::{Member, SchemaError, SkillDefinition, SkillId, Task};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Ordered, authoritative set of skill definitions. Order is creation order
/// and drives gap/export ordering everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSchema {
    skills: Vec<SkillDefinition>,
}

impl SkillSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(skills: Vec<SkillDefinition>) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for skill in skills {
            schema.add(skill)?;
        }
        Ok(schema)
    }

    pub fn add(&mut self, skill: SkillDefinition) -> Result<(), SchemaError> {
        if self.by_column(&skill.source_column_name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                column: skill.source_column_name,
            });
        }
        self.skills.push(skill);
        Ok(())
    }

    /// Replaces the definition with the same id. Column uniqueness is
    /// re-checked against every other definition.
    pub fn update(&mut self, skill: SkillDefinition) -> Result<(), SchemaError> {
        let conflict = self
            .skills
            .iter()
            .any(|s| s.id != skill.id && s.source_column_name == skill.source_column_name);
        if conflict {
            return Err(SchemaError::DuplicateColumn {
                column: skill.source_column_name,
            });
        }
        match self.skills.iter_mut().find(|s| s.id == skill.id) {
            Some(slot) => {
                *slot = skill;
                Ok(())
            }
            None => Err(SchemaError::UnknownSkill {
                id: skill.id.to_string(),
            }),
        }
    }

    pub fn remove(&mut self, id: &SkillId) -> Option<SkillDefinition> {
        let index = self.skills.iter().position(|s| &s.id == id)?;
        Some(self.skills.remove(index))
    }

    pub fn get(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| &s.id == id)
    }

    pub fn by_column(&self, column: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.source_column_name == column)
    }

    pub fn by_short_name(&self, short_name: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.short_name == short_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Back-fills every member with a zero entry for each schema skill it lacks.
/// Idempotent: already-complete records keep their values untouched. Returns
/// the number of entries inserted.
pub fn sync_members(members: &mut [Member], schema: &SkillSchema) -> usize {
    let mut inserted = 0;
    for member in members.iter_mut() {
        let mut touched = false;
        for skill in schema.iter() {
            if !member.skills.contains_key(&skill.id) {
                member.skills.insert(skill.id.clone(), 0);
                inserted += 1;
                touched = true;
            }
        }
        if touched {
            member.updated_at = Utc::now();
        }
    }
    inserted
}

/// Same back-fill for task complexity mappings.
pub fn sync_tasks(tasks: &mut [Task], schema: &SkillSchema) -> usize {
    let mut inserted = 0;
    for task in tasks.iter_mut() {
        let mut touched = false;
        for skill in schema.iter() {
            if !task.complexity.contains_key(&skill.id) {
                task.complexity.insert(skill.id.clone(), 0);
                inserted += 1;
                touched = true;
            }
        }
        if touched {
            task.updated_at = Utc::now();
        }
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn skill(id: &str, column: &str) -> SkillDefinition {
        let now = Utc::now();
        SkillDefinition {
            id: SkillId::new(id),
            name: column.to_string(),
            short_name: column.to_string(),
            source_column_name: column.to_string(),
            member_description: None,
            task_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn member(name: &str, skills: &[(&str, u8)]) -> Member {
        let now = Utc::now();
        Member {
            id: format!("member-{name}"),
            name: name.to_string(),
            level_name: "Junior".to_string(),
            last_review_date: String::new(),
            skills: skills
                .iter()
                .map(|(id, v)| (SkillId::new(*id), *v))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn add_rejects_duplicate_source_column() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "Tech skill")).expect("first add");
        let err = schema.add(skill("s2", "Tech skill")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { column } if column == "Tech skill"));
    }

    #[test]
    fn update_rejects_column_collision_with_other_skill() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "Tech")).expect("add s1");
        schema.add(skill("s2", "Req")).expect("add s2");

        let mut renamed = skill("s2", "Tech");
        renamed.name = "Requirement".to_string();
        let err = schema.update(renamed).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));

        // Keeping its own column is not a collision.
        schema.update(skill("s2", "Req")).expect("self update");
    }

    #[test]
    fn remove_returns_definition_and_preserves_order() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "A")).expect("add");
        schema.add(skill("s2", "B")).expect("add");
        schema.add(skill("s3", "C")).expect("add");

        let removed = schema.remove(&SkillId::new("s2")).expect("removed");
        assert_eq!(removed.source_column_name, "B");
        let order: Vec<&str> = schema.iter().map(|s| s.source_column_name.as_str()).collect();
        assert_eq!(order, vec!["A", "C"]);
        assert!(schema.remove(&SkillId::new("s2")).is_none());
    }

    #[test]
    fn sync_members_backfills_missing_keys_with_zero() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "A")).expect("add");
        schema.add(skill("s2", "B")).expect("add");

        let mut members = vec![member("alice", &[("s1", 3)]), member("bob", &[])];
        let inserted = sync_members(&mut members, &schema);
        assert_eq!(inserted, 3);

        assert_eq!(members[0].skill_value(&SkillId::new("s1")), 3);
        assert_eq!(members[0].skill_value(&SkillId::new("s2")), 0);
        assert_eq!(members[1].skills.len(), 2);
    }

    #[test]
    fn sync_members_is_idempotent_on_mapped_values() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "A")).expect("add");
        schema.add(skill("s2", "B")).expect("add");

        let mut members = vec![member("alice", &[("s1", 4)])];
        sync_members(&mut members, &schema);
        let first: Vec<BTreeMap<SkillId, u8>> =
            members.iter().map(|m| m.skills.clone()).collect();

        let inserted = sync_members(&mut members, &schema);
        assert_eq!(inserted, 0);
        let second: Vec<BTreeMap<SkillId, u8>> =
            members.iter().map(|m| m.skills.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn sync_tasks_backfills_complexity() {
        let mut schema = SkillSchema::new();
        schema.add(skill("s1", "A")).expect("add");

        let now = Utc::now();
        let mut tasks = vec![Task {
            id: "t1".to_string(),
            name: "Checkout flow".to_string(),
            link: String::new(),
            story_points: 3.0,
            assignee_name: String::new(),
            complexity: BTreeMap::new(),
            completed: false,
            manual_reviewer: None,
            created_at: now,
            updated_at: now,
        }];
        assert_eq!(sync_tasks(&mut tasks, &schema), 1);
        assert_eq!(tasks[0].complexity_value(&SkillId::new("s1")), 0);
        assert_eq!(sync_tasks(&mut tasks, &schema), 0);
    }
}
