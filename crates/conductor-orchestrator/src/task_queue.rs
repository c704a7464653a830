use crate::types::{Task, TaskPriority, TaskStatus};
use chrono::Utc;
use uuid::Uuid;

/// An ordered task queue. Tasks are never removed, only mutated in place,
/// and iteration follows insertion order.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
}

impl TaskQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task to the back of the queue.
    pub fn add(&mut self, task: Task) -> Uuid {
        let id = task.id;
        self.tasks.push(task);
        id
    }

    /// Ids of every pending task, in queue order.
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.tasks
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.id)
            .collect()
    }

    /// Mark a task as assigned to `agent`.
    pub fn mark_assigned(&mut self, id: Uuid, agent: &str) -> bool {
        if let Some(task) = self.get_mut(id) {
            task.status = TaskStatus::Assigned;
            task.assigned_agent = Some(agent.to_string());
            true
        } else {
            false
        }
    }

    /// Mark a task as completed. The assigned agent is kept for reporting.
    pub fn mark_completed(&mut self, id: Uuid) -> bool {
        if let Some(task) = self.get_mut(id) {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            true
        } else {
            false
        }
    }

    /// Get a task by ID.
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// All tasks in queue order.
    pub fn all_tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether a task with this name and priority is already queued and not
    /// yet completed.
    pub fn contains_open(&self, name: &str, priority: TaskPriority) -> bool {
        self.tasks.iter().any(|t| {
            t.name == name && t.priority == priority && t.status != TaskStatus::Completed
        })
    }

    /// Count of tasks in the given status.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Count of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.count(TaskStatus::Pending)
    }

    /// Total number of tasks.
    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }
}
