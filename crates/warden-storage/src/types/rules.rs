//! ABAC rule types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{RuleId, UserId};
use crate::ParseError;

/// Comparison applied to a resolved context value.
///
/// `Unknown` only comes out of deserializing foreign rule data; `FromStr`
/// rejects anything outside the vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Contains,
    NotContains,
    Greater,
    Less,
    Regex,
    Exists,
    NotExists,
    Unknown(String),
}

impl FromStr for ConditionOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(ConditionOperator::Equals),
            "not_equals" => Ok(ConditionOperator::NotEquals),
            "in" => Ok(ConditionOperator::In),
            "not_in" => Ok(ConditionOperator::NotIn),
            "contains" => Ok(ConditionOperator::Contains),
            "not_contains" => Ok(ConditionOperator::NotContains),
            "greater" => Ok(ConditionOperator::Greater),
            "less" => Ok(ConditionOperator::Less),
            "regex" => Ok(ConditionOperator::Regex),
            "exists" => Ok(ConditionOperator::Exists),
            "not_exists" => Ok(ConditionOperator::NotExists),
            _ => Err(ParseError::ConditionOperator(s.to_string())),
        }
    }
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "not_in",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "not_contains",
            ConditionOperator::Greater => "greater",
            ConditionOperator::Less => "less",
            ConditionOperator::Regex => "regex",
            ConditionOperator::Exists => "exists",
            ConditionOperator::NotExists => "not_exists",
            ConditionOperator::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConditionOperator::Unknown(_))
    }
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(ConditionOperator::Unknown(s))
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        op.as_str().to_string()
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a condition folds into the running result of the conditions before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl FromStr for LogicalOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            _ => Err(ParseError::LogicalOperator(s.to_string())),
        }
    }
}

/// Rule effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    Allow,
    Deny,
}

impl FromStr for RuleEffect {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(RuleEffect::Allow),
            "deny" => Ok(RuleEffect::Deny),
            _ => Err(ParseError::RuleEffect(s.to_string())),
        }
    }
}

impl RuleEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleEffect::Allow => "allow",
            RuleEffect::Deny => "deny",
        }
    }
}

/// One atomic ABAC condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCondition {
    /// Dot path into the evaluation context, e.g. `resource.attributes.companyId`.
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

impl PermissionCondition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            logical_operator: None,
        }
    }

    pub fn or(mut self) -> Self {
        self.logical_operator = Some(LogicalOperator::Or);
        self
    }

    pub fn and(mut self) -> Self {
        self.logical_operator = Some(LogicalOperator::And);
        self
    }
}

/// Rule record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resource_type: String,
    pub action: String,
    #[serde(default)]
    pub conditions: Vec<PermissionCondition>,
    pub effect: RuleEffect,
    #[serde(default)]
    pub priority: i32,
    pub active: bool,
    pub created_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource_type: String,
    pub action: String,
    #[serde(default)]
    pub conditions: Vec<PermissionCondition>,
    pub effect: RuleEffect,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update for a rule. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub conditions: Option<Vec<PermissionCondition>>,
    pub effect: Option<RuleEffect>,
    pub priority: Option<i32>,
    pub active: Option<bool>,
}

/// Filter for listing rules
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub resource_type: Option<String>,
    pub action: Option<String>,
    /// Only return rules with `active == true`
    pub active_only: bool,
}

impl RuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Check whether a rule passes this filter.
    pub fn matches(&self, rule: &PermissionRule) -> bool {
        if let Some(rt) = &self.resource_type {
            if &rule.resource_type != rt {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &rule.action != action {
                return false;
            }
        }
        !self.active_only || rule.active
    }
}
