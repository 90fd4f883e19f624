use crate::types::{Task, TaskId, TaskStatus};

/// Every change to the cached task list goes through [`TaskStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    ReplaceAll(Vec<Task>),
    SetStatus {
        task_id: TaskId,
        status: Option<TaskStatus>,
    },
}

/// The client's cached copy of one project's tasks.
#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    revision: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        store.apply(StoreWrite::ReplaceAll(tasks));
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn status_of(&self, task_id: TaskId) -> Option<Option<TaskStatus>> {
        self.get(task_id).map(|task| task.status)
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.get(task_id).is_some()
    }

    /// Bumped on every effective write; the UI uses it to skip redundant work.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies one write and returns whether anything changed.
    pub fn apply(&mut self, write: StoreWrite) -> bool {
        let changed = match write {
            StoreWrite::ReplaceAll(tasks) => {
                let changed = tasks != self.tasks;
                self.tasks = tasks;
                changed
            }
            StoreWrite::SetStatus { task_id, status } => {
                match self.tasks.iter_mut().find(|task| task.id == task_id) {
                    Some(task) if task.status != status => {
                        task.status = status;
                        true
                    }
                    _ => false,
                }
            }
        };

        if changed {
            self.revision += 1;
        }
        changed
    }
}
