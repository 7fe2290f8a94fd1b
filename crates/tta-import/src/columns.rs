/// Column contract for the level-rules file. All four are required.
pub const LEVEL_RULE_COLUMNS: [&str; 4] =
    ["Level ID", "Level Name", "Max SP Self", "Review Authority"];

/// Required fixed columns of the member-profile file; every other header is a
/// skill column keyed by its literal text.
pub const MEMBER_FIXED_COLUMNS: [&str; 3] = ["Member Name", "Current Level", "Last Review Date"];

/// Fixed columns of the task-allocation file. Only the first two are
/// required; `Final SP` and `Assignee` default when absent.
pub const TASK_FIXED_COLUMNS: [&str; 4] = ["Task/Feature", "Link", "Final SP", "Assignee"];
pub const TASK_REQUIRED_COLUMNS: [&str; 2] = ["Task/Feature", "Link"];

/// Output columns a previously exported task file may carry. Never treated as
/// complexity columns, never imported.
pub const TASK_COMPUTED_COLUMNS: [&str; 7] = [
    "Max Complexity",
    "Skill gap check",
    "Suitability Score",
    "Status",
    "Reviewer",
    "Review Focus",
    "Reviewer matching",
];
