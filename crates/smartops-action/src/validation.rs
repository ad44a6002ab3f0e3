//! Business-rule validation of proposed actions.
//!
//! Two rule families:
//! - **Email**: recipient must contain `@` and `.`, and its domain must not
//!   be blocked. Violations accumulate.
//! - **Scheduling**: the action's timestamp must parse and fall inside the
//!   operational window.
//!
//! Tools with no rule family pass as valid.

use smartops_core::config::GuardrailConfig;
use smartops_core::types::OperationalWindow;

use crate::time::parse_schedule_time;
use crate::types::{ToolCall, ValidatedAction, Validation};

/// Applies the email and scheduling rules.
#[derive(Debug, Clone)]
pub struct RuleValidator {
    window: OperationalWindow,
    blocked_domains: Vec<String>,
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::from_config(&GuardrailConfig::default())
    }
}

impl RuleValidator {
    pub fn new(window: OperationalWindow, blocked_domains: Vec<String>) -> Self {
        Self {
            window,
            blocked_domains: blocked_domains
                .into_iter()
                .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &GuardrailConfig) -> Self {
        Self::new(config.window(), config.blocked_domains.clone())
    }

    pub fn window(&self) -> OperationalWindow {
        self.window
    }

    /// Validate each action in order.
    pub fn validate(&self, calls: Vec<ToolCall>) -> Vec<ValidatedAction> {
        calls
            .into_iter()
            .map(|call| {
                let validation = self.validate_call(&call);
                ValidatedAction { call, validation }
            })
            .collect()
    }

    /// Validate a single action.
    pub fn validate_call(&self, call: &ToolCall) -> Validation {
        let mut errors = Vec::new();
        self.collect_recipient_errors(call, &mut errors);
        if call.is_time_bound() {
            errors.extend(self.schedule_errors(call.schedule_time()));
        }
        Validation::from_errors(errors)
    }

    fn collect_recipient_errors(&self, call: &ToolCall, errors: &mut Vec<String>) {
        match call {
            ToolCall::SendEmail(p) => errors.extend(self.email_errors(&p.recipient)),
            ToolCall::ScheduleMeeting(p) => {
                for attendee in &p.attendees {
                    errors.extend(self.email_errors(attendee));
                }
            }
            ToolCall::ScheduleOperation(p) => self.collect_recipient_errors(&p.target, errors),
            ToolCall::NotifyTeam(_) | ToolCall::CancelOperation(_) => {}
        }
    }

    /// Email rule. A malformed and blocked address yields both errors.
    pub fn email_errors(&self, recipient: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if !recipient.contains('@') || !recipient.contains('.') {
            errors.push(format!("Invalid email format: {}", recipient));
        }
        if self.is_blocked(recipient) {
            errors.push("Recipient domain is in the blacklist.".to_string());
        }
        errors
    }

    /// Whether the recipient's domain, or a parent of it, is blocked. Without
    /// an `@` the whole string is treated as the domain.
    pub fn is_blocked(&self, recipient: &str) -> bool {
        let domain = recipient
            .rsplit_once('@')
            .map(|(_, d)| d)
            .unwrap_or(recipient)
            .trim()
            .to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }
        self.blocked_domains.iter().any(|blocked| {
            domain == *blocked
                || domain
                    .strip_suffix(blocked.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Scheduling rule over an optional raw timestamp.
    pub fn schedule_errors(&self, raw: Option<&str>) -> Vec<String> {
        let Some(raw) = raw else {
            return vec!["Missing start_time for scheduling.".to_string()];
        };
        match parse_schedule_time(raw) {
            None => vec![format!("Invalid timestamp format: {}", raw)],
            Some(time) if !self.window.contains(time.hour()) => {
                vec![self.window_violation(time.hour())]
            }
            Some(_) => Vec::new(),
        }
    }

    /// Message for an hour outside the operational window.
    pub fn window_violation(&self, hour: u32) -> String {
        format!(
            "Security Alert: {}:00 is outside operational hours ({}).",
            hour,
            self.window.label()
        )
    }
}
