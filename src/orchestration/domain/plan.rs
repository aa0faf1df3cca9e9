//! Lenient reading of planner output.

use crate::gate::domain::GateSpec;
use serde_json::Value;
use tracing::warn;

/// One task proposed by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTask {
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Scheduling priority.
    pub priority: i32,
    /// Gates for the initial task version.
    pub gates: Vec<GateSpec>,
    /// Dependency labels.
    pub dependencies: Vec<String>,
}

/// Planner output reduced to the fields the pipeline acts on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanDocument {
    /// Proposed tasks in response order.
    pub tasks: Vec<PlannedTask>,
}

impl PlanDocument {
    /// Reads a plan from decoded JSON.
    ///
    /// Accepts `{"tasks": [...]}` or a bare array. Entries take their title
    /// from `title` or `name` and fall back to `Task <n>`; malformed gates are
    /// dropped with a warning.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let entries = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => map
                .get("tasks")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice),
            _ => &[],
        };
        let tasks = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| planned_task(index.saturating_add(1), entry))
            .collect();
        Self { tasks }
    }
}

fn planned_task(number: usize, entry: &Value) -> PlannedTask {
    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::trim);
    let title = text("title")
        .or_else(|| text("name"))
        .filter(|title| !title.is_empty())
        .map_or_else(|| format!("Task {number}"), str::to_owned);
    let description = text("description").unwrap_or_default().to_owned();
    let priority = entry
        .get("priority")
        .and_then(Value::as_i64)
        .map_or(0, |raw| {
            i32::try_from(raw).unwrap_or(if raw < 0 { i32::MIN } else { i32::MAX })
        });
    let gates = entry
        .get("gates")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|gate| match serde_json::from_value::<GateSpec>(gate.clone()) {
                    Ok(spec) => Some(spec),
                    Err(err) => {
                        warn!(task = %title, error = %err, "dropping malformed gate");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    let dependencies = entry
        .get("dependencies")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|dependency| match dependency {
                    Value::String(label) => Some(label.clone()),
                    Value::Number(numeric) => Some(numeric.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    PlannedTask {
        title,
        description,
        priority,
        gates,
        dependencies,
    }
}
