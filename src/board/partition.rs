use serde::Serialize;

use crate::types::{Task, TaskStatus};

/// Tasks split by status, each bucket in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Columns<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> Columns<'a> {
    pub fn get(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &[&'a Task])> + '_ {
        TaskStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }
}

/// Stable three-way split. Tasks without a recognized status land in no column.
pub fn partition(tasks: &[Task]) -> Columns<'_> {
    let mut columns = Columns::default();
    for task in tasks {
        match task.status {
            Some(TaskStatus::Todo) => columns.todo.push(task),
            Some(TaskStatus::InProgress) => columns.in_progress.push(task),
            Some(TaskStatus::Done) => columns.done.push(task),
            None => {}
        }
    }
    columns
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardSummary {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub completion_rate: f64,
}

impl BoardSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let columns = partition(tasks);
        let total = tasks.len();
        let done = columns.done.len();
        let completion_rate = if total == 0 {
            0.0
        } else {
            (done as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Self {
            total,
            todo: columns.todo.len(),
            in_progress: columns.in_progress.len(),
            done,
            completion_rate,
        }
    }
}
