use tta_core::{
    member_by_name, rule_for_level, ComputedTaskView, LevelRule, Member, ReviewStatus,
    ReviewerValidity, SkillDefinition, SkillSchema, Task,
};

pub const GAP_TAG_PREFIX: &str = "⚠";

/// Outcome of the reviewer-selection step. `reviewer` is `None` both when the
/// task is self-approved (suggestion suppressed) and when nobody has enough
/// review authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerSuggestion {
    pub reviewer: Option<String>,
    pub focus: String,
    pub validity: ReviewerValidity,
}

impl ReviewerSuggestion {
    fn none() -> Self {
        Self {
            reviewer: None,
            focus: String::new(),
            validity: ReviewerValidity::None,
        }
    }
}

/// Maximum complexity value across all skill dimensions of a task; 0 when the
/// mapping is empty.
pub fn max_complexity(task: &Task) -> u8 {
    task.complexity.values().copied().max().unwrap_or(0)
}

/// One warning tag per schema skill where the task demands more than the
/// assignee has. Schema order. Empty when the assignee is unresolved.
pub fn skill_gaps(member: Option<&Member>, task: &Task, schema: &SkillSchema) -> Vec<String> {
    let Some(member) = member else {
        return Vec::new();
    };
    schema
        .iter()
        .filter(|skill| {
            let need = task.complexity_value(&skill.id);
            need > 0 && member.skill_value(&skill.id) < need
        })
        .map(|skill| format!("{GAP_TAG_PREFIX}{}", skill.short_name))
        .collect()
}

/// Sum of (member skill − task complexity) over every schema skill. Negative
/// means under-qualified. 0 when the assignee is unresolved.
pub fn suitability_score(member: Option<&Member>, task: &Task, schema: &SkillSchema) -> i32 {
    let Some(member) = member else {
        return 0;
    };
    schema
        .iter()
        .map(|skill| {
            i32::from(member.skill_value(&skill.id)) - i32::from(task.complexity_value(&skill.id))
        })
        .sum()
}

/// Self-approval check against the assignee's level rule. Unresolved assignee
/// or dangling level name degrades to `NeedsReview`, never an error.
pub fn review_status(
    member: Option<&Member>,
    max_complexity: u8,
    rules: &[LevelRule],
) -> ReviewStatus {
    let Some(member) = member else {
        return ReviewStatus::NeedsReview;
    };
    match rule_for_level(rules, &member.level_name) {
        Some(rule) if f64::from(max_complexity) <= rule.max_self_approved_complexity => {
            ReviewStatus::SelfApproved
        }
        _ => ReviewStatus::NeedsReview,
    }
}

/// Picks the reviewer best covering the assignee's gap skills among members
/// whose level has enough review authority for the task.
///
/// Self-approved tasks get no suggestion even when eligible reviewers exist.
/// Ties on gap coverage keep the first member in list order.
pub fn suggest_reviewer(
    members: &[Member],
    assignee: Option<&Member>,
    max_complexity: u8,
    gaps: &[String],
    schema: &SkillSchema,
    rules: &[LevelRule],
    status: ReviewStatus,
) -> ReviewerSuggestion {
    if status == ReviewStatus::SelfApproved {
        return ReviewerSuggestion::none();
    }
    let Some(assignee) = assignee else {
        return ReviewerSuggestion::none();
    };

    let eligible: Vec<&Member> = members
        .iter()
        .filter(|m| {
            m.id != assignee.id
                && rule_for_level(rules, &m.level_name)
                    .is_some_and(|rule| rule.review_authority >= f64::from(max_complexity))
        })
        .collect();
    if eligible.is_empty() {
        return ReviewerSuggestion::none();
    }

    let gap_skills = gap_skills_in_order(gaps, schema);

    let mut best = eligible[0];
    let mut best_score = gap_cover_score(best, &gap_skills);
    for candidate in &eligible[1..] {
        let score = gap_cover_score(candidate, &gap_skills);
        if score > best_score {
            best = *candidate;
            best_score = score;
        }
    }

    let focus = if gap_skills.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = gap_skills.iter().map(|s| s.short_name.as_str()).collect();
        format!("Focus: {}", names.join(", "))
    };

    ReviewerSuggestion {
        reviewer: Some(best.name.clone()),
        focus,
        validity: ReviewerValidity::Valid,
    }
}

/// Maps gap tags back to their skill definitions via short name, preserving
/// gap order and dropping duplicates and tags for skills no longer in the
/// schema.
fn gap_skills_in_order<'a>(gaps: &[String], schema: &'a SkillSchema) -> Vec<&'a SkillDefinition> {
    let mut resolved: Vec<&SkillDefinition> = Vec::new();
    for gap in gaps {
        let short_name = gap.strip_prefix(GAP_TAG_PREFIX).unwrap_or(gap);
        if let Some(skill) = schema.by_short_name(short_name) {
            if !resolved.iter().any(|s| s.id == skill.id) {
                resolved.push(skill);
            }
        }
    }
    resolved
}

fn gap_cover_score(member: &Member, gap_skills: &[&SkillDefinition]) -> u32 {
    gap_skills
        .iter()
        .map(|skill| u32::from(member.skill_value(&skill.id)))
        .sum()
}

/// Single per-task entry point: resolves the assignee and threads the
/// intermediate results through the four derivations.
pub fn compute_task_view(
    task: &Task,
    members: &[Member],
    rules: &[LevelRule],
    schema: &SkillSchema,
) -> ComputedTaskView {
    let assignee = member_by_name(members, &task.assignee_name);
    let max = max_complexity(task);
    let gaps = skill_gaps(assignee, task, schema);
    let score = suitability_score(assignee, task, schema);
    let status = review_status(assignee, max, rules);
    let suggestion = suggest_reviewer(members, assignee, max, &gaps, schema, rules, status);

    ComputedTaskView {
        max_complexity: max,
        skill_gaps: gaps,
        suitability_score: score,
        review_status: status,
        suggested_reviewer: suggestion.reviewer,
        review_focus: suggestion.focus,
        reviewer_validity: suggestion.validity,
    }
}
