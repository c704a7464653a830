use crate::config::AgentConfig;
use crate::types::{Agent, AgentStatus};
use conductor_core::{ConductorError, ConductorResult};
use std::collections::HashMap;

/// Registry of agents, iterated in registration order.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the configured roster.
    pub fn from_config(roster: &[AgentConfig]) -> ConductorResult<Self> {
        let mut registry = Self::new();
        for entry in roster {
            registry.register(Agent::new(&entry.name, entry.capabilities.clone()))?;
        }
        Ok(registry)
    }

    /// Register an agent. Names must be unique.
    pub fn register(&mut self, agent: Agent) -> ConductorResult<()> {
        if self.index.contains_key(&agent.name) {
            return Err(ConductorError::Orchestrator(format!(
                "Agent '{}' is already registered",
                agent.name
            )));
        }
        self.index.insert(agent.name.clone(), self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    /// Agent registered as `name`.
    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.index.get(name).and_then(|&i| self.agents.get(i))
    }

    /// Mutable access to the agent registered as `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Agent> {
        let i = *self.index.get(name)?;
        self.agents.get_mut(i)
    }

    /// Agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in `status`.
    pub fn count(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }
}
