//! ABAC condition and rule evaluation.
//!
//! Conditions never fail: malformed data (a bad pattern, a non-array `in`
//! value, an operator outside the vocabulary) makes that one condition `false`.
//! Rule data is checked up front by [`RuleEngine::validate_conditions`] when
//! it is written through the admin surface.

use dashmap::DashMap;
use regex::RegexBuilder;
use serde_json::Value;
use std::sync::Arc;
use warden_config::EngineConfig;
use warden_storage::{
    ConditionOperator, LogicalOperator, PermissionCondition, PermissionRule, RuleEffect,
};

use crate::context::PermissionContext;
use crate::error::AuthzError;
use crate::path;

/// Compiled patterns kept per engine; cleared wholesale when full.
const PATTERN_CACHE_CAPACITY: usize = 1024;

/// Evaluates conditions and rules. Clones share one compiled-pattern cache.
#[derive(Clone, Debug)]
pub struct RuleEngine {
    regex_max_pattern_len: usize,
    regex_size_limit: usize,
    patterns: Arc<DashMap<String, Result<regex::Regex, String>>>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            regex_max_pattern_len: config.regex_max_pattern_len,
            regex_size_limit: config.regex_size_limit,
            patterns: Arc::new(DashMap::new()),
        }
    }

    pub fn evaluate_condition(
        &self,
        condition: &PermissionCondition,
        ctx: &PermissionContext,
    ) -> bool {
        self.evaluate_against(condition, &ctx.to_value())
    }

    /// Decision for one rule.
    ///
    /// Every condition is evaluated. Results fold left to right: the first seeds
    /// the running value, each later one joins with its own logical operator
    /// (`AND` when unset). An empty list seeds `false`, so an empty `allow`
    /// rule never grants and an empty `deny` rule yields `true`.
    pub fn evaluate_rule(&self, rule: &PermissionRule, ctx: &PermissionContext) -> bool {
        if !rule.active {
            return false;
        }

        let tree = ctx.to_value();
        let results: Vec<bool> = rule
            .conditions
            .iter()
            .map(|c| self.evaluate_against(c, &tree))
            .collect();

        let mut running = results.first().copied().unwrap_or(false);
        for (condition, result) in rule.conditions.iter().zip(&results).skip(1) {
            running = match condition.logical_operator.unwrap_or_default() {
                LogicalOperator::Or => running || *result,
                LogicalOperator::And => running && *result,
            };
        }

        let decision = match rule.effect {
            RuleEffect::Allow => running,
            RuleEffect::Deny => !running,
        };

        tracing::debug!(
            rule_id = %rule.id,
            effect = rule.effect.as_str(),
            conditions = rule.conditions.len(),
            decision,
            "Rule evaluated"
        );
        decision
    }

    /// Reject rule data that could only ever evaluate to `false`.
    pub fn validate_conditions(
        &self,
        conditions: &[PermissionCondition],
    ) -> Result<(), AuthzError> {
        for condition in conditions {
            if condition.field.is_empty() {
                return Err(AuthzError::InvalidInput(
                    "condition field must not be empty".to_string(),
                ));
            }
            match &condition.operator {
                ConditionOperator::Unknown(raw) => {
                    return Err(AuthzError::InvalidInput(format!(
                        "invalid condition operator: {}",
                        raw
                    )));
                }
                ConditionOperator::In | ConditionOperator::NotIn => {
                    if !condition.value.is_array() {
                        return Err(AuthzError::InvalidInput(format!(
                            "{} on {} needs an array value",
                            condition.operator, condition.field
                        )));
                    }
                }
                ConditionOperator::Regex => {
                    let pattern = condition.value.as_str().ok_or_else(|| {
                        AuthzError::InvalidInput(format!(
                            "regex on {} needs a string pattern",
                            condition.field
                        ))
                    })?;
                    self.compile(pattern)
                        .map_err(|e| AuthzError::InvalidInput(format!("bad pattern: {}", e)))?;
                }
                ConditionOperator::Greater | ConditionOperator::Less => {
                    if as_number(&condition.value).is_none() {
                        return Err(AuthzError::InvalidInput(format!(
                            "{} on {} needs a numeric value",
                            condition.operator, condition.field
                        )));
                    }
                }
                ConditionOperator::Equals
                | ConditionOperator::NotEquals
                | ConditionOperator::Contains
                | ConditionOperator::NotContains
                | ConditionOperator::Exists
                | ConditionOperator::NotExists => {}
            }
        }
        Ok(())
    }

    fn evaluate_against(&self, condition: &PermissionCondition, tree: &Value) -> bool {
        let actual = path::resolve(tree, &condition.field);
        let expected = &condition.value;

        match &condition.operator {
            ConditionOperator::Equals => actual.is_some_and(|v| loose_eq(v, expected)),
            ConditionOperator::NotEquals => !actual.is_some_and(|v| loose_eq(v, expected)),
            ConditionOperator::In => match expected.as_array() {
                Some(items) => actual.is_some_and(|v| items.iter().any(|i| loose_eq(v, i))),
                None => false,
            },
            ConditionOperator::NotIn => match expected.as_array() {
                Some(items) => !actual.is_some_and(|v| items.iter().any(|i| loose_eq(v, i))),
                None => false,
            },
            ConditionOperator::Contains => {
                actual.is_some_and(|v| stringify(v).contains(stringify(expected).as_str()))
            }
            ConditionOperator::NotContains => {
                !actual.is_some_and(|v| stringify(v).contains(stringify(expected).as_str()))
            }
            ConditionOperator::Greater => compare(actual, expected, |a, b| a > b),
            ConditionOperator::Less => compare(actual, expected, |a, b| a < b),
            ConditionOperator::Regex => match (actual, expected.as_str()) {
                (Some(v), Some(pattern)) => self.is_match(pattern, &stringify(v)),
                _ => false,
            },
            ConditionOperator::Exists => actual.is_some(),
            ConditionOperator::NotExists => actual.is_none(),
            ConditionOperator::Unknown(raw) => {
                tracing::debug!(operator = %raw, field = %condition.field, "Unknown operator");
                false
            }
        }
    }

    fn compile(&self, pattern: &str) -> Result<regex::Regex, String> {
        if let Some(cached) = self.patterns.get(pattern) {
            return cached.value().clone();
        }

        let compiled = if pattern.len() > self.regex_max_pattern_len {
            Err(format!(
                "pattern length {} exceeds {}",
                pattern.len(),
                self.regex_max_pattern_len
            ))
        } else {
            RegexBuilder::new(pattern)
                .size_limit(self.regex_size_limit)
                .build()
                .map_err(|e| e.to_string())
        };

        if self.patterns.len() >= PATTERN_CACHE_CAPACITY {
            self.patterns.clear();
        }
        self.patterns.insert(pattern.to_string(), compiled.clone());
        compiled
    }

    #[cfg(test)]
    fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }

    fn is_match(&self, pattern: &str, haystack: &str) -> bool {
        match self.compile(pattern) {
            Ok(re) => re.is_match(haystack),
            Err(e) => {
                tracing::warn!(error = %e, "Regex condition rejected");
                false
            }
        }
    }
}

/// JSON equality with numbers compared by value (`1` == `1.0`).
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn compare(actual: Option<&Value>, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(as_number), as_number(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}
