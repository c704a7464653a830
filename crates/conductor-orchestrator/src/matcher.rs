//! Capability matching: task name → required capability → first idle agent.

use crate::registry::AgentRegistry;
use crate::types::Agent;
use std::collections::BTreeMap;

/// Why a task could not be matched to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchFailure {
    /// The task name has no entry in the capability map.
    UnknownTask,
    /// The capability is known but no idle agent provides it.
    NoIdleAgent { capability: String },
}

impl std::fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchFailure::UnknownTask => write!(f, "task not in capability map"),
            MatchFailure::NoIdleAgent { capability } => {
                write!(f, "no idle agent with capability '{capability}'")
            }
        }
    }
}

/// First idle agent, in registration order, that has `capability`.
pub fn find_available_agent<'a>(registry: &'a AgentRegistry, capability: &str) -> Option<&'a Agent> {
    registry
        .iter()
        .find(|a| a.is_idle() && a.has_capability(capability))
}

/// Match a task name to an idle agent. Pure read.
pub fn match_task<'a>(
    task_name: &str,
    capability_map: &BTreeMap<String, String>,
    registry: &'a AgentRegistry,
) -> Result<&'a Agent, MatchFailure> {
    let capability = capability_map
        .get(task_name)
        .ok_or(MatchFailure::UnknownTask)?;

    find_available_agent(registry, capability).ok_or_else(|| MatchFailure::NoIdleAgent {
        capability: capability.clone(),
    })
}
