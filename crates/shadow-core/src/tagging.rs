//! Security-level and code-name tagging of chunk text.
//!
//! Both taggers are ordered rule tables; the first matching security rule
//! decides the level.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const DEFAULT_SECURITY_LEVEL: u8 = 1;

pub struct SecurityRule {
    pub level: u8,
    pub pattern: Regex,
}

fn rule(level: u8, pattern: &str) -> SecurityRule {
    SecurityRule { level, pattern: Regex::new(pattern).expect("valid security rule") }
}

/// Levels above 4 are capped to 4, the highest level the system knows about.
pub static SECURITY_RULES: LazyLock<Vec<SecurityRule>> = LazyLock::new(|| {
    vec![
        rule(4, r"(?i)level\s*[4-9]|clearance\s*[4-9]"),
        rule(3, r"(?i)level\s*3|clearance\s*3"),
        rule(2, r"(?i)level\s*2|clearance\s*2"),
        rule(1, r"(?i)level\s*1|clearance\s*1"),
    ]
});

static OPERATION_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:operation|project|protocol)\s+(\w+)").expect("valid operation pattern"));

pub fn security_level(text: &str) -> u8 {
    SECURITY_RULES.iter().find(|r| r.pattern.is_match(text)).map(|r| r.level).unwrap_or(DEFAULT_SECURITY_LEVEL)
}

/// Names following "operation", "project" or "protocol", in text order.
/// Exact repeats collapse; names differing only by case are kept apart.
pub fn operations(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    OPERATION_MENTION
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_priority_level_wins() {
        assert_eq!(security_level("This unit operates at level 2 but escalates to level 4 clearance when required."), 4);
        assert_eq!(security_level("clearance 3 and level 1"), 3);
    }

    #[test]
    fn each_rule_in_isolation() {
        assert_eq!(security_level("Level 1 staff only"), 1);
        assert_eq!(security_level("requires LEVEL 2"), 2);
        assert_eq!(security_level("clearance3"), 3);
        assert_eq!(security_level("Clearance 4"), 4);
        assert_eq!(security_level("nothing sensitive here"), DEFAULT_SECURITY_LEVEL);
    }

    #[test]
    fn ultra_high_levels_cap_at_four() {
        for n in 5..=9 {
            assert_eq!(security_level(&format!("briefing at level {}", n)), 4);
            assert_eq!(security_level(&format!("clearance {} personnel", n)), 4);
        }
    }

    #[test]
    fn collects_operation_names() {
        let ops = operations("Operation Phantom is linked to project Eclipse and PROTOCOL Zeta. operation Phantom again, OPERATION phantom.");
        assert_eq!(ops, vec!["Phantom", "Eclipse", "Zeta", "phantom"]);
        assert!(operations("no code names").is_empty());
    }
}
