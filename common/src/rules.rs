/// Splits a comma-separated list of rules, dropping empty ones.
///
pub fn parse_rules(rules: &str) -> Vec<String> {
    rules
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

/// Does the item match the rule? A rule may start and/or end with `*` as a wildcard.
///
pub fn rule_matches(item: &str, rule: &str) -> bool {
    match rule {
        "*" => true,
        r if r.len() > 1 && r.starts_with('*') && r.ends_with('*') => {
            item.contains(&r[1..r.len() - 1])
        }
        r if r.starts_with('*') => item.ends_with(&r[1..]),
        r if r.ends_with('*') => item.starts_with(&r[..r.len() - 1]),
        r => item == r,
    }
}

/// True if the item matches any of the rules, or if there are no rules at all.
///
pub fn any_rule_matches(item: &str, rules: &[String]) -> bool {
    rules.is_empty() || rules.iter().any(|rule| rule_matches(item, rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        assert_eq!(
            vec!["day*".to_string(), "*_09:45".to_string()],
            parse_rules("day*, *_09:45,,")
        );
        assert!(parse_rules("").is_empty());
    }

    #[test]
    fn test_rule_matches() {
        assert!(rule_matches("monday", "monday"));
        assert!(!rule_matches("monday", "tuesday"));
        assert!(rule_matches("2024-10-27_09:45", "2024-10*"));
        assert!(!rule_matches("before-2024", "2024*"));
        assert!(rule_matches("pre-upgrade", "*upgrade"));
        assert!(rule_matches("pre-upgrade-1", "*upgrade*"));
        assert!(!rule_matches("pre-update", "*upgrade*"));
        assert!(rule_matches("anything", "*"));
    }

    #[test]
    fn test_any_rule_matches() {
        let rules = parse_rules("monday,*-upgrade");
        assert!(any_rule_matches("monday", &rules));
        assert!(any_rule_matches("pre-upgrade", &rules));
        assert!(!any_rule_matches("tuesday", &rules));
        assert!(any_rule_matches("tuesday", &[]));
    }
}
