//! Core types for the command pipeline.
//!
//! Classifier output is loosely typed JSON. It is converted into the closed
//! [`ToolCall`] enum at the normalization boundary; nothing past that point
//! handles open-ended parameter maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Tool names
// =============================================================================

/// The operations the classifier may propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    SendEmail,
    ScheduleMeeting,
    NotifyTeam,
    ScheduleOperation,
    CancelOperation,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SendEmail => "send_email",
            ToolName::ScheduleMeeting => "schedule_meeting",
            ToolName::NotifyTeam => "notify_team",
            ToolName::ScheduleOperation => "schedule_operation",
            ToolName::CancelOperation => "cancel_operation",
        }
    }

    /// Tools that perform a side effect through an executor. The other two
    /// act on the job table.
    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            ToolName::SendEmail | ToolName::ScheduleMeeting | ToolName::NotifyTeam
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send_email" => Ok(ToolName::SendEmail),
            "schedule_meeting" => Ok(ToolName::ScheduleMeeting),
            "notify_team" => Ok(ToolName::NotifyTeam),
            "schedule_operation" => Ok(ToolName::ScheduleOperation),
            "cancel_operation" => Ok(ToolName::CancelOperation),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

// =============================================================================
// Tool parameters
// =============================================================================

/// Parameters of `send_email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailParams {
    pub recipient: String,
    pub subject: String,
    pub content: String,
}

/// Parameters of `schedule_meeting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingParams {
    #[serde(alias = "subject")]
    pub title: String,
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Read when `start_time` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
    pub duration: u32,
}

impl Default for MeetingParams {
    fn default() -> Self {
        Self {
            title: String::new(),
            attendees: Vec::new(),
            start_time: None,
            execution_time: None,
            duration: 30,
        }
    }
}

/// Notification urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Parameters of `notify_team`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyParams {
    pub team_name: String,
    pub message: String,
    pub priority: Priority,
}

/// Parameters of `schedule_operation`: another tool call to run later.
///
/// On the wire the target is flattened into `operation_type` + `parameters`.
/// Only executable tools can be deferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScheduleOperation", into = "RawScheduleOperation")]
pub struct ScheduleOperationParams {
    pub target: Box<ToolCall>,
    pub start_time: Option<String>,
    pub execution_time: Option<String>,
    /// Caller-supplied job identity. Derived from the target when absent.
    pub job_id: Option<String>,
    pub replace_existing: bool,
}

#[derive(Serialize, Deserialize)]
struct RawScheduleOperation {
    operation_type: ToolName,
    #[serde(default)]
    parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
    #[serde(default = "default_true")]
    replace_existing: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawScheduleOperation> for ScheduleOperationParams {
    type Error = String;

    fn try_from(raw: RawScheduleOperation) -> Result<Self, Self::Error> {
        if !raw.operation_type.is_executable() {
            return Err(format!("{} cannot be scheduled", raw.operation_type));
        }
        let target = ToolCall::from_parts(raw.operation_type, raw.parameters)
            .map_err(|e| format!("invalid parameters for {}: {}", raw.operation_type, e))?;
        Ok(Self {
            target: Box::new(target),
            start_time: raw.start_time,
            execution_time: raw.execution_time,
            job_id: raw.job_id.filter(|id| !id.trim().is_empty()),
            replace_existing: raw.replace_existing,
        })
    }
}

impl From<ScheduleOperationParams> for RawScheduleOperation {
    fn from(params: ScheduleOperationParams) -> Self {
        Self {
            operation_type: params.target.tool(),
            parameters: params.target.parameters(),
            start_time: params.start_time,
            execution_time: params.execution_time,
            job_id: params.job_id,
            replace_existing: params.replace_existing,
        }
    }
}

impl ScheduleOperationParams {
    /// When the deferred operation should run: `start_time`, then
    /// `execution_time`, then the target's own `start_time`.
    pub fn due_time(&self) -> Option<&str> {
        first_time([
            self.start_time.as_deref(),
            self.execution_time.as_deref(),
            self.target.own_start_time(),
        ])
    }
}

/// The first candidate that is present and non-blank.
fn first_time<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
}

/// Parameters of `cancel_operation`. The operation type is matched as a
/// substring of job identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelOperationParams {
    pub operation_type: String,
}

// =============================================================================
// ToolCall
// =============================================================================

/// One typed tool invocation. Serialized as `{tool, parameters}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "parameters", rename_all = "snake_case")]
pub enum ToolCall {
    SendEmail(EmailParams),
    ScheduleMeeting(MeetingParams),
    NotifyTeam(NotifyParams),
    ScheduleOperation(ScheduleOperationParams),
    CancelOperation(CancelOperationParams),
}

/// Parameter fields that hold lists.
const LIST_FIELDS: &[&str] = &["attendees"];

/// Wrap scalar values of list-typed fields into one-element lists.
///
/// Applied recursively to a nested `parameters` object so that deferred
/// meetings get the same treatment.
pub fn coerce_list_fields(params: &mut Value) {
    let Some(map) = params.as_object_mut() else {
        return;
    };
    for field in LIST_FIELDS {
        if let Some(value) = map.get_mut(*field) {
            match value {
                Value::Array(_) | Value::Null => {}
                other => {
                    let scalar = other.take();
                    *other = Value::Array(vec![scalar]);
                }
            }
        }
    }
    if let Some(nested) = map.get_mut("parameters") {
        coerce_list_fields(nested);
    }
}

impl ToolCall {
    /// Build a typed call from a tool name and its raw parameter object.
    /// `null` parameters are read as an empty object.
    pub fn from_parts(tool: ToolName, mut parameters: Value) -> Result<Self, serde_json::Error> {
        if parameters.is_null() {
            parameters = Value::Object(Default::default());
        }
        coerce_list_fields(&mut parameters);
        serde_json::from_value(serde_json::json!({
            "tool": tool,
            "parameters": parameters,
        }))
    }

    pub fn tool(&self) -> ToolName {
        match self {
            ToolCall::SendEmail(_) => ToolName::SendEmail,
            ToolCall::ScheduleMeeting(_) => ToolName::ScheduleMeeting,
            ToolCall::NotifyTeam(_) => ToolName::NotifyTeam,
            ToolCall::ScheduleOperation(_) => ToolName::ScheduleOperation,
            ToolCall::CancelOperation(_) => ToolName::CancelOperation,
        }
    }

    /// The parameters as a JSON object.
    pub fn parameters(&self) -> Value {
        let encoded = match self {
            ToolCall::SendEmail(p) => serde_json::to_value(p),
            ToolCall::ScheduleMeeting(p) => serde_json::to_value(p),
            ToolCall::NotifyTeam(p) => serde_json::to_value(p),
            ToolCall::ScheduleOperation(p) => serde_json::to_value(p),
            ToolCall::CancelOperation(p) => serde_json::to_value(p),
        };
        encoded.unwrap_or_default()
    }

    /// The recipient-like field used to derive job identities.
    pub fn recipient_hint(&self) -> Option<&str> {
        let hint = match self {
            ToolCall::SendEmail(p) => Some(p.recipient.as_str()),
            ToolCall::NotifyTeam(p) => Some(p.team_name.as_str()),
            ToolCall::ScheduleMeeting(p) => p.attendees.first().map(String::as_str),
            ToolCall::ScheduleOperation(p) => p.target.recipient_hint(),
            ToolCall::CancelOperation(_) => None,
        };
        hint.map(str::trim).filter(|h| !h.is_empty())
    }

    /// The timestamp the scheduling rule applies to, first present of
    /// `start_time`, `execution_time` and the nested `parameters.start_time`.
    pub fn schedule_time(&self) -> Option<&str> {
        match self {
            ToolCall::ScheduleMeeting(p) => {
                first_time([p.start_time.as_deref(), p.execution_time.as_deref()])
            }
            ToolCall::ScheduleOperation(p) => p.due_time(),
            _ => None,
        }
    }

    /// The call's own top-level `start_time`, if it has one.
    fn own_start_time(&self) -> Option<&str> {
        match self {
            ToolCall::ScheduleMeeting(p) => p.start_time.as_deref(),
            _ => None,
        }
    }

    /// Whether the scheduling rule applies to this call.
    pub fn is_time_bound(&self) -> bool {
        matches!(
            self,
            ToolCall::ScheduleMeeting(_) | ToolCall::ScheduleOperation(_)
        )
    }
}

// =============================================================================
// Validation and plans
// =============================================================================

/// Verdict for one action. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Default for Validation {
    fn default() -> Self {
        Self::from_errors(Vec::new())
    }
}

impl Validation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// A tool call with its validation verdict. Serialized as
/// `{tool, parameters, validation}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValidatedAction", into = "RawValidatedAction")]
pub struct ValidatedAction {
    pub call: ToolCall,
    pub validation: Validation,
}

#[derive(Serialize, Deserialize)]
struct RawValidatedAction {
    tool: ToolName,
    parameters: Value,
    validation: Validation,
}

impl TryFrom<RawValidatedAction> for ValidatedAction {
    type Error = String;

    fn try_from(raw: RawValidatedAction) -> Result<Self, Self::Error> {
        let call = ToolCall::from_parts(raw.tool, raw.parameters).map_err(|e| e.to_string())?;
        Ok(Self {
            call,
            validation: Validation::from_errors(raw.validation.errors),
        })
    }
}

impl From<ValidatedAction> for RawValidatedAction {
    fn from(action: ValidatedAction) -> Self {
        Self {
            tool: action.call.tool(),
            parameters: action.call.parameters(),
            validation: action.validation,
        }
    }
}

impl ValidatedAction {
    pub fn is_valid(&self) -> bool {
        self.validation.valid
    }
}

/// Overall state of a plan. Plans are held for approval either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    PendingApproval,
    ValidationFailed,
}

/// Summary flag returned with a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Clear,
    Flagged,
}

/// Ordered validated actions derived from one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<ValidatedAction>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn all_valid(&self) -> bool {
        self.actions.iter().all(ValidatedAction::is_valid)
    }

    pub fn status(&self) -> PlanStatus {
        if self.all_valid() {
            PlanStatus::PendingApproval
        } else {
            PlanStatus::ValidationFailed
        }
    }

    pub fn validation_status(&self) -> ValidationStatus {
        if self.all_valid() {
            ValidationStatus::Clear
        } else {
            ValidationStatus::Flagged
        }
    }
}

/// How an analyzed command was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisIntent {
    PlanProposed,
    TextResponse,
    OutOfScope,
}

impl AnalysisIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisIntent::PlanProposed => "plan_proposed",
            AnalysisIntent::TextResponse => "text_response",
            AnalysisIntent::OutOfScope => "out_of_scope",
        }
    }
}

// =============================================================================
// Executor results
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Error,
}

/// What an executor reports. Expected failures come back as
/// `status: error` rather than as an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            output: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
