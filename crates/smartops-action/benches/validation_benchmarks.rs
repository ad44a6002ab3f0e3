//! Benchmarks for plan building and rule validation.
//!
//! Measures normalization plus validation of classifier output, the work done
//! on every analyzed command between the classifier call and the log write.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use smartops_action::{PlanBuilder, RuleValidator, ToolCall, ToolName};
use smartops_llm::ToolInvocation;

/// A mix of the tool calls a classifier typically returns.
fn generate_invocations(index: usize) -> Vec<ToolInvocation> {
    let hour = 6 + (index % 14);
    let recipient = match index % 4 {
        0 => format!("user{}@corp.com", index),
        1 => format!("user{}@spam.org", index),
        2 => format!("user{}", index),
        _ => format!("user{}@mail.temporary-mail.com", index),
    };
    vec![
        ToolInvocation {
            name: "send_email".to_string(),
            arguments: json!({"recipient": recipient, "subject": "Status", "content": "Weekly numbers attached."})
                .to_string(),
        },
        ToolInvocation {
            name: "schedule_meeting".to_string(),
            arguments: json!({
                "title": "Planning",
                "attendees": recipient,
                "start_time": format!("2026-03-02T{:02}:30:00", hour),
            })
            .to_string(),
        },
        ToolInvocation {
            name: "schedule_operation".to_string(),
            arguments: json!({
                "operation_type": "notify_team",
                "parameters": {"team_name": "DevOps", "message": "Deploy window"},
                "execution_time": format!("2026-03-02T{:02}:00:00Z", hour),
            })
            .to_string(),
        },
    ]
}

fn bench_plan_building(c: &mut Criterion) {
    let builder = PlanBuilder::default();
    let batches: Vec<Vec<ToolInvocation>> = (0..1000).map(generate_invocations).collect();

    let mut group = c.benchmark_group("plan_building");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("normalize_and_validate_3_actions", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let plan = builder.build(&batches[idx % batches.len()]);
            idx += 1;
            plan
        });
    });

    group.finish();
}

fn bench_rule_validation(c: &mut Criterion) {
    let validator = RuleValidator::default();
    let calls: Vec<ToolCall> = (0..1000)
        .map(|i| {
            ToolCall::from_parts(
                ToolName::ScheduleMeeting,
                json!({
                    "attendees": [format!("a{}@corp.com", i), format!("b{}@spam.org", i)],
                    "start_time": format!("2026-03-02T{:02}:00:00", i % 24),
                }),
            )
            .expect("benchmark input is well-formed")
        })
        .collect();

    let mut group = c.benchmark_group("rule_validation");
    group.sample_size(200);

    group.bench_function("meeting_two_attendees", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let verdict = validator.validate_call(&calls[idx % calls.len()]);
            idx += 1;
            verdict
        });
    });

    group.finish();
}

criterion_group!(benches, bench_plan_building, bench_rule_validation);
criterion_main!(benches);
