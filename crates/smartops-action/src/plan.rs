//! Turns raw classifier tool calls into a validated plan.

use smartops_llm::ToolInvocation;

use crate::types::{Plan, ToolCall, ToolName};
use crate::validation::RuleValidator;

/// Normalizes classifier output and runs the rule validator over it.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    validator: RuleValidator,
}

impl PlanBuilder {
    pub fn new(validator: RuleValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &RuleValidator {
        &self.validator
    }

    /// Convert raw invocations into typed calls.
    ///
    /// An invocation is skipped, never fatal, when its arguments are not
    /// JSON, its tool name is unknown, or its parameters do not fit the
    /// tool's schema.
    pub fn normalize(&self, invocations: &[ToolInvocation]) -> Vec<ToolCall> {
        invocations
            .iter()
            .filter_map(|invocation| {
                let arguments: serde_json::Value = match serde_json::from_str(&invocation.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(tool = %invocation.name, error = %e, "Skipping tool call with unparseable arguments");
                        return None;
                    }
                };
                let tool: ToolName = match invocation.name.parse() {
                    Ok(t) => t,
                    Err(_) => {
                        tracing::warn!(tool = %invocation.name, "Skipping unknown tool");
                        return None;
                    }
                };
                match ToolCall::from_parts(tool, arguments) {
                    Ok(call) => Some(call),
                    Err(e) => {
                        tracing::warn!(tool = %tool, error = %e, "Skipping tool call with invalid parameters");
                        None
                    }
                }
            })
            .collect()
    }

    /// Normalize then validate.
    pub fn build(&self, invocations: &[ToolInvocation]) -> Plan {
        let calls = self.normalize(invocations);
        Plan {
            actions: self.validator.validate(calls),
        }
    }
}
