use crate::config::ObfuscationRule;
use crate::salt::Salt;
use crate::strategy::Strategy;
use std::collections::HashMap;
use tracing::debug;

/// A configured column of one table and the strategy applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub column: String,
    pub strategy: Strategy,
}

/// Lookup from table name to its column rules, plus the run salt.
///
/// Built once before the stream is read and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    salt: Salt,
    tables: HashMap<String, Vec<ColumnRule>>,
}

impl Registry {
    /// Register rules in order. A later rule for the same `(table, column)`
    /// replaces the earlier one in place.
    pub fn new(rules: &[ObfuscationRule], salt: Salt) -> Self {
        let mut tables: HashMap<String, Vec<ColumnRule>> = HashMap::new();
        for rule in rules {
            let columns = tables.entry(rule.target.table.clone()).or_default();
            match columns.iter_mut().find(|c| c.column == rule.target.column) {
                Some(existing) => {
                    debug!(
                        table = %rule.target.table,
                        column = %rule.target.column,
                        previous = %existing.strategy,
                        strategy = %rule.strategy,
                        "Rule overrides earlier rule"
                    );
                    existing.strategy = rule.strategy;
                }
                None => columns.push(ColumnRule {
                    column: rule.target.column.clone(),
                    strategy: rule.strategy,
                }),
            }
        }
        Self { salt, tables }
    }

    /// Rules for `table`, or `None` when the table is not targeted.
    pub fn rules_for(&self, table: &str) -> Option<&[ColumnRule]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn is_targeted(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn apply(&self, strategy: Strategy, value: &[u8]) -> Vec<u8> {
        strategy.apply(&self.salt, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt() -> Salt {
        Salt::from_bytes(b"registry".to_vec()).unwrap()
    }

    #[test]
    fn test_groups_rules_by_table() {
        let rules = vec![
            ObfuscationRule::new("auth_user", "email", Strategy::Email),
            ObfuscationRule::new("accounts_profile", "phone", Strategy::Digits),
            ObfuscationRule::new("auth_user", "password", Strategy::Bytes),
        ];
        let registry = Registry::new(&rules, salt());
        let auth = registry.rules_for("auth_user").unwrap();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[0].column, "email");
        assert_eq!(auth[1].column, "password");
        assert!(registry.is_targeted("accounts_profile"));
        assert!(!registry.is_targeted("Auth_User"));
        assert!(registry.rules_for("django_session").is_none());
    }

    #[test]
    fn test_last_rule_wins() {
        let rules = vec![
            ObfuscationRule::new("t", "c", Strategy::Email),
            ObfuscationRule::new("t", "d", Strategy::Inet),
            ObfuscationRule::new("t", "c", Strategy::Digits),
        ];
        let registry = Registry::new(&rules, salt());
        let t = registry.rules_for("t").unwrap();
        assert_eq!(
            t,
            &[
                ColumnRule {
                    column: "c".into(),
                    strategy: Strategy::Digits,
                },
                ColumnRule {
                    column: "d".into(),
                    strategy: Strategy::Inet,
                },
            ]
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new(&[], salt());
        assert!(registry.is_empty());
        assert!(!registry.is_targeted(""));
    }
}
