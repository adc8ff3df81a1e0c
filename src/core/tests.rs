#[cfg(test)]
mod tests_impl {
    use crate::core::generate::GeneratorMode;
    use crate::core::sources::{merge_all, parse_str};
    use crate::core::test_helpers::contents;

    const ICMP: &str = "filter:\n  INPUT:\n    - 10 allow ICMP: -p icmp -j ACCEPT\n";
    const SSH: &str =
        "filter:\n  INPUT:\n    - 5 allow SSH: -p tcp --dport 22 -j ACCEPT\n    - policy: DROP\n";

    #[test]
    fn test_two_source_full_render() {
        let merged = merge_all([parse_str("1", ICMP).unwrap(), parse_str("2", SSH).unwrap()]);
        assert_eq!(
            merged.generate(GeneratorMode::Iptables).unwrap(),
            "*filter\n\
             :INPUT DROP [0:0]\n\
             -A INPUT -p tcp --dport 22 -j ACCEPT\n\
             -A INPUT -p icmp -j ACCEPT\n\
             COMMIT\n"
        );
    }

    #[test]
    fn test_source_order_does_not_change_priority_order() {
        let merged = merge_all([parse_str("2", SSH).unwrap(), parse_str("1", ICMP).unwrap()]);
        assert_eq!(
            contents(&merged, "filter", "INPUT"),
            ["-p tcp --dport 22 -j ACCEPT", "-p icmp -j ACCEPT"]
        );
    }

    #[test]
    fn test_policy_later_source_wins() {
        let first = parse_str("1", "filter:\n  INPUT:\n    - policy: accept\n").unwrap();
        let second = parse_str("2", "filter:\n  INPUT:\n    - policy: DROP\n").unwrap();
        let out = merge_all([first, second]).to_iptables(true);
        assert!(out.contains(":INPUT DROP [0:0]"));
    }

    #[test]
    fn test_policy_survives_source_without_policy() {
        let first = parse_str("1", "filter:\n  INPUT:\n    - policy: reject\n").unwrap();
        let second = parse_str("2", "filter:\n  INPUT:\n    - 1: -j LOG\n").unwrap();
        let out = merge_all([first, second]).to_iptables(false);
        assert!(out.contains("-P INPUT REJECT\n"));
    }

    #[test]
    fn test_unmanaged_chain_never_renders_rules() {
        let first = parse_str("1", "filter:\n  docker: unmanaged\n").unwrap();
        let second = parse_str(
            "2",
            "filter:\n  docker:\n    - 1: -j ACCEPT\n    - policy: DROP\n",
        )
        .unwrap();
        let merged = merge_all([first, second]);

        let full = merged.to_iptables(true);
        assert!(full.contains(":docker - [0:0]\n"));
        assert!(!full.contains("-A docker"));

        let rules_only = merged.to_iptables(false);
        assert!(!rules_only.contains("docker"));

        assert_eq!(merged.to_iptables_chains(), "filter docker\n");
    }

    #[test]
    fn test_policy_ignored_on_custom_chain() {
        let rs = merge_all([parse_str(
            "1",
            "filter:\n  testchain:\n    - policy: DROP\n    - 1: -j RETURN\n  INPUT: []\n",
        )
        .unwrap()]);
        let out = rs.to_iptables(true);
        assert!(out.contains(":testchain - [0:0]\n"));
        assert!(out.contains(":INPUT ACCEPT [0:0]\n"));
        assert!(!out.contains("DROP"));
        assert!(!rs.to_iptables(false).contains("-P testchain"));
    }

    #[test]
    fn test_multiple_tables() {
        let rs = merge_all([parse_str(
            "1",
            "nat:\n  POSTROUTING:\n    - 10 masq: -o eth0 -j MASQUERADE\nfilter:\n  FORWARD:\n    - policy: drop\n",
        )
        .unwrap()]);
        assert_eq!(
            rs.to_iptables(true),
            "*filter\n\
             :FORWARD DROP [0:0]\n\
             COMMIT\n\
             *nat\n\
             :POSTROUTING ACCEPT [0:0]\n\
             -A POSTROUTING -o eth0 -j MASQUERADE\n\
             COMMIT\n"
        );
    }
}

#[cfg(test)]
mod property_tests {
    use crate::core::ruleset::{Chain, ManagedChain, Rule, Ruleset};
    use crate::core::test_helpers::contents;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_rules(tag: &'static str)(
            priorities in proptest::collection::vec(-3i64..3, 0..24)
        ) -> Vec<Rule> {
            priorities
                .into_iter()
                .enumerate()
                .map(|(i, p)| Rule::new(p, "", format!("{tag}{i}")))
                .collect()
        }
    }

    fn single_chain(rules: Vec<Rule>) -> Ruleset {
        let mut rs = Ruleset::new();
        rs.insert_chain(
            "filter",
            "INPUT",
            Chain::Managed(ManagedChain {
                policy: None,
                rules,
            }),
        );
        rs
    }

    fn priority_of(rules: &[Rule], content: &str) -> i64 {
        rules
            .iter()
            .find(|r| r.content == content)
            .map(|r| r.priority)
            .unwrap()
    }

    proptest! {
        #[test]
        fn test_sort_orders_by_priority_and_is_stable(rules in arb_rules("r")) {
            let mut rs = single_chain(rules.clone());
            rs.sort();
            let sorted = contents(&rs, "filter", "INPUT");

            prop_assert_eq!(sorted.len(), rules.len());
            for pair in sorted.windows(2) {
                let (a, b) = (priority_of(&rules, pair[0]), priority_of(&rules, pair[1]));
                prop_assert!(a <= b);
                if a == b {
                    // Contents carry their declaration index
                    let ia: usize = pair[0][1..].parse().unwrap();
                    let ib: usize = pair[1][1..].parse().unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }

        #[test]
        fn test_equal_priorities_keep_source_order(
            a in arb_rules("a"),
            b in arb_rules("b"),
        ) {
            let mut rs = single_chain(a.clone());
            rs.merge(single_chain(b.clone()));
            rs.sort();
            let sorted = contents(&rs, "filter", "INPUT");

            let all: Vec<Rule> = a.iter().chain(b.iter()).cloned().collect();
            for (i, x) in sorted.iter().enumerate() {
                for y in &sorted[i + 1..] {
                    if priority_of(&all, x) == priority_of(&all, y) {
                        prop_assert!(!(x.starts_with('b') && y.starts_with('a')));
                    }
                }
            }
        }

        #[test]
        fn test_rendering_never_panics(rules in arb_rules("-j X")) {
            let rs = single_chain(rules.clone());
            let out = rs.to_iptables(true);
            prop_assert!(out.starts_with("*filter\n:INPUT ACCEPT [0:0]\n"));
            prop_assert!(out.ends_with("COMMIT\n"));
            prop_assert_eq!(out.lines().filter(|l| l.starts_with("-A INPUT")).count(), rules.len());
        }
    }
}
