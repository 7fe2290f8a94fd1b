use crate::records::{LevelRule, Member};

/// Resolves an assignee name against the member list. Names are soft
/// references: duplicates resolve to the first match, no match is `None`.
pub fn member_by_name<'a>(members: &'a [Member], name: &str) -> Option<&'a Member> {
    if name.is_empty() {
        return None;
    }
    members.iter().find(|m| m.name == name)
}

/// Resolves a member's level against the rule list, first match wins. A
/// dangling level name is not an error; callers degrade to the safe default.
pub fn rule_for_level<'a>(rules: &'a [LevelRule], level_name: &str) -> Option<&'a LevelRule> {
    rules.iter().find(|r| r.level_name == level_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn member(id: &str, name: &str) -> Member {
        let now = Utc::now();
        Member {
            id: id.to_string(),
            name: name.to_string(),
            level_name: "Junior".to_string(),
            last_review_date: String::new(),
            skills: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn rule(level_name: &str, level_id: i64) -> LevelRule {
        LevelRule {
            level_id,
            level_name: level_name.to_string(),
            max_self_approved_complexity: 3.0,
            review_authority: 0.0,
        }
    }

    #[test]
    fn duplicate_member_names_resolve_to_first_match() {
        let members = vec![member("m1", "Alice"), member("m2", "Alice")];
        let resolved = member_by_name(&members, "Alice").expect("resolved");
        assert_eq!(resolved.id, "m1");
    }

    #[test]
    fn empty_assignee_name_never_resolves() {
        let members = vec![member("m1", "")];
        assert!(member_by_name(&members, "").is_none());
    }

    #[test]
    fn duplicate_level_names_resolve_to_first_rule() {
        let rules = vec![rule("Junior", 1), rule("Junior", 2)];
        assert_eq!(rule_for_level(&rules, "Junior").expect("resolved").level_id, 1);
        assert!(rule_for_level(&rules, "Principal").is_none());
    }
}
