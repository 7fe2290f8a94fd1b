pub mod lookup;
pub mod records;
pub mod schema;

pub use lookup::{member_by_name, rule_for_level};
pub use records::{
    ComputedTaskView, ImportResult, LevelRule, Member, ReviewStatus, ReviewerValidity, RowError,
    SchemaError, SkillDefinition, SkillId, Task, MAX_SKILL_VALUE,
};
pub use schema::{sync_members, sync_tasks, SkillSchema};
