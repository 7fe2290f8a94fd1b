mod export;
mod snapshot;

pub use export::{export_level_rules_csv, export_members_csv, export_tasks_csv};
pub use snapshot::SnapshotFile;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tta_core::{
    sync_members, sync_tasks, ComputedTaskView, LevelRule, Member, SchemaError, SkillDefinition,
    SkillId, SkillSchema, Task,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot of {size} bytes exceeds storage quota of {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// In-process record store: the single mutable container behind the engine.
/// Single-threaded, last writer wins; every mutation goes through a named
/// operation so the schema-completeness invariant can be maintained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationStore {
    members: Vec<Member>,
    tasks: Vec<Task>,
    level_rules: Vec<LevelRule>,
    skills: SkillSchema,
}

impl AllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn level_rules(&self) -> &[LevelRule] {
        &self.level_rules
    }

    pub fn schema(&self) -> &SkillSchema {
        &self.skills
    }

    /// Replaces the member list, then back-fills so new records satisfy the
    /// schema-completeness invariant.
    pub fn set_members(&mut self, members: Vec<Member>) {
        self.members = members;
        sync_members(&mut self.members, &self.skills);
    }

    pub fn add_member(&mut self, mut member: Member) {
        sync_members(std::slice::from_mut(&mut member), &self.skills);
        self.members.push(member);
    }

    pub fn update_member(&mut self, member: Member) -> bool {
        match self.members.iter_mut().find(|m| m.id == member.id) {
            Some(slot) => {
                *slot = member;
                sync_members(&mut self.members, &self.skills);
                true
            }
            None => false,
        }
    }

    pub fn remove_member(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.members.len() != before
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        sync_tasks(&mut self.tasks, &self.skills);
    }

    pub fn add_task(&mut self, mut task: Task) {
        sync_tasks(std::slice::from_mut(&mut task), &self.skills);
        self.tasks.push(task);
    }

    pub fn update_task(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                sync_tasks(&mut self.tasks, &self.skills);
                true
            }
            None => false,
        }
    }

    pub fn remove_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn set_level_rules(&mut self, rules: Vec<LevelRule>) {
        self.level_rules = rules;
    }

    pub fn add_level_rule(&mut self, rule: LevelRule) {
        self.level_rules.push(rule);
    }

    pub fn update_level_rule(&mut self, rule: LevelRule) -> bool {
        match self
            .level_rules
            .iter_mut()
            .find(|r| r.level_id == rule.level_id)
        {
            Some(slot) => {
                *slot = rule;
                true
            }
            None => false,
        }
    }

    pub fn remove_level_rule(&mut self, level_id: i64) -> bool {
        let before = self.level_rules.len();
        self.level_rules.retain(|r| r.level_id != level_id);
        self.level_rules.len() != before
    }

    /// Registers a skill and immediately back-fills every record with a zero
    /// entry for it.
    pub fn add_skill(&mut self, skill: SkillDefinition) -> Result<(), SchemaError> {
        self.skills.add(skill)?;
        self.sync();
        Ok(())
    }

    pub fn update_skill(&mut self, skill: SkillDefinition) -> Result<(), SchemaError> {
        self.skills.update(skill)
    }

    /// Removes the dimension everywhere it is referenced: the definition and
    /// the corresponding key in every member and task. Records themselves are
    /// kept. Removing an unused or unknown skill is not an error.
    pub fn remove_skill(&mut self, id: &SkillId) -> Option<SkillDefinition> {
        let removed = self.skills.remove(id);
        for member in &mut self.members {
            member.skills.remove(id);
        }
        for task in &mut self.tasks {
            task.complexity.remove(id);
        }
        removed
    }

    /// Runs the completeness back-fill over all members and tasks. Returns
    /// the number of inserted entries; 0 means everything was already
    /// complete.
    pub fn sync(&mut self) -> usize {
        sync_members(&mut self.members, &self.skills) + sync_tasks(&mut self.tasks, &self.skills)
    }

    pub fn task_view(&self, task_id: &str) -> Option<ComputedTaskView> {
        let task = self.tasks.iter().find(|t| t.id == task_id)?;
        Some(tta_engine::compute_task_view(
            task,
            &self.members,
            &self.level_rules,
            &self.skills,
        ))
    }

    /// Derived data for every task, recomputed from current state.
    pub fn task_views(&self) -> Vec<(&Task, ComputedTaskView)> {
        self.tasks
            .iter()
            .map(|task| {
                (
                    task,
                    tta_engine::compute_task_view(
                        task,
                        &self.members,
                        &self.level_rules,
                        &self.skills,
                    ),
                )
            })
            .collect()
    }
}
