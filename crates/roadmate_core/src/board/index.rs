use crate::model::task::{TaskId, TaskItem, TaskStatus};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column that breaks the contiguity contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInvariantError {
    pub status: TaskStatus,
    /// Observed indices in ascending order.
    pub indices: Vec<u32>,
}

impl Display for BoardInvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "column `{}` is not contiguous: {:?}",
            self.status.as_str(),
            self.indices
        )
    }
}

impl Error for BoardInvariantError {}

/// Tasks of one column ordered by `sort_index`, ties broken by id.
pub fn column_of(tasks: &[TaskItem], status: TaskStatus) -> Vec<&TaskItem> {
    let mut column = tasks
        .iter()
        .filter(|task| task.status == status)
        .collect::<Vec<_>>();
    column.sort_by(|a, b| a.sort_index.cmp(&b.sort_index).then(a.id.cmp(&b.id)));
    column
}

/// Ids of one column in board order.
pub fn column_ids(tasks: &[TaskItem], status: TaskStatus) -> Vec<TaskId> {
    column_of(tasks, status)
        .into_iter()
        .map(|task| task.id)
        .collect()
}

pub fn column_len(tasks: &[TaskItem], status: TaskStatus) -> usize {
    tasks.iter().filter(|task| task.status == status).count()
}

/// Slot a task receives when appended to `status`.
pub fn append_slot(tasks: &[TaskItem], status: TaskStatus) -> u32 {
    column_len(tasks, status) as u32
}

/// Verifies every column holds exactly `0..n-1`.
pub fn check_contiguity(tasks: &[TaskItem]) -> Result<(), BoardInvariantError> {
    for status in TaskStatus::ALL {
        let indices = column_of(tasks, status)
            .into_iter()
            .map(|task| task.sort_index)
            .collect::<Vec<_>>();
        let contiguous = indices
            .iter()
            .enumerate()
            .all(|(position, index)| *index as usize == position);
        if !contiguous {
            return Err(BoardInvariantError { status, indices });
        }
    }
    Ok(())
}

/// Mutable board view over one project's task collection.
pub struct Board<'a> {
    tasks: &'a mut Vec<TaskItem>,
}

impl<'a> Board<'a> {
    pub fn new(tasks: &'a mut Vec<TaskItem>) -> Self {
        Self { tasks }
    }

    pub fn column(&self, status: TaskStatus) -> Vec<&TaskItem> {
        column_of(self.tasks.as_slice(), status)
    }

    /// Returns the slot the next task in `status` would receive.
    pub fn append_to_column(&self, status: TaskStatus) -> u32 {
        append_slot(self.tasks.as_slice(), status)
    }

    /// Appends `task` to the end of its status column.
    ///
    /// Returns the assigned slot, or `None` when the id is already present.
    pub fn insert(&mut self, mut task: TaskItem) -> Option<u32> {
        if self.position_of(task.id).is_some() {
            warn!(
                "event=board_insert module=board status=skip reason=duplicate_task task_id={}",
                task.id
            );
            return None;
        }
        task.clamp_difficulty();
        let slot = self.append_to_column(task.status);
        task.sort_index = slot;
        self.tasks.push(task);
        Some(slot)
    }

    /// Moves the task at column position `from` to position `to`.
    ///
    /// Positions are 0-based offsets into the ordered column; `to` is clamped
    /// to the last slot. Returns `false` when `from` is out of range.
    pub fn reorder_within_column(&mut self, status: TaskStatus, from: usize, to: usize) -> bool {
        let mut ids = column_ids(self.tasks.as_slice(), status);
        if from >= ids.len() {
            warn!(
                "event=board_reorder module=board status=skip reason=position_out_of_range column={} from={} len={}",
                status.as_str(),
                from,
                ids.len()
            );
            return false;
        }

        let moved = ids.remove(from);
        let target = to.min(ids.len());
        ids.insert(target, moved);
        self.renumber(status, &ids);
        debug!(
            "event=board_reorder module=board status=ok column={} from={} to={}",
            status.as_str(),
            from,
            target
        );
        true
    }

    /// Moves a task to the end of `to_status` and closes the gap it leaves.
    ///
    /// Returns `false` for unknown tasks and same-column moves.
    pub fn move_across_columns(&mut self, task_id: TaskId, to_status: TaskStatus) -> bool {
        let Some(position) = self.position_of(task_id) else {
            warn!(
                "event=board_move module=board status=skip reason=unknown_task task_id={}",
                task_id
            );
            return false;
        };
        let from_status = self.tasks[position].status;
        if from_status == to_status {
            return false;
        }

        let slot = self.append_to_column(to_status);
        let task = &mut self.tasks[position];
        task.status = to_status;
        task.sort_index = slot;
        self.normalize_column(from_status);
        debug!(
            "event=board_move module=board status=ok task_id={} from={} to={} slot={}",
            task_id,
            from_status.as_str(),
            to_status.as_str(),
            slot
        );
        true
    }

    /// Deletes a task and renumbers its former column.
    pub fn remove_from_column(&mut self, task_id: TaskId) -> Option<TaskItem> {
        let Some(position) = self.position_of(task_id) else {
            warn!(
                "event=board_remove module=board status=skip reason=unknown_task task_id={}",
                task_id
            );
            return None;
        };
        let removed = self.tasks.remove(position);
        self.normalize_column(removed.status);
        Some(removed)
    }

    /// Replaces a task's fields in place.
    ///
    /// A status change behaves like `move_across_columns`; otherwise the task
    /// keeps its slot.
    pub fn replace_task(&mut self, mut updated: TaskItem) -> bool {
        let Some(position) = self.position_of(updated.id) else {
            warn!(
                "event=board_replace module=board status=skip reason=unknown_task task_id={}",
                updated.id
            );
            return false;
        };
        let current = &self.tasks[position];
        let (previous_status, previous_slot) = (current.status, current.sort_index);
        let next_status = updated.status;

        updated.clamp_difficulty();
        updated.status = previous_status;
        updated.sort_index = previous_slot;
        self.tasks[position] = updated;

        if next_status != previous_status {
            let task_id = self.tasks[position].id;
            self.move_across_columns(task_id, next_status);
        }
        true
    }

    /// Renumbers one column to `0..n-1`, keeping its current order.
    pub fn normalize_column(&mut self, status: TaskStatus) {
        let ids = column_ids(self.tasks.as_slice(), status);
        self.renumber(status, &ids);
    }

    /// Renumbers every column.
    pub fn normalize_all(&mut self) {
        for status in TaskStatus::ALL {
            self.normalize_column(status);
        }
    }

    /// Keeps the first task for each id and drops later copies.
    ///
    /// Returns how many tasks were dropped.
    pub fn drop_duplicate_ids(&mut self) -> usize {
        let before = self.tasks.len();
        let mut seen = HashSet::new();
        self.tasks.retain(|task| seen.insert(task.id));
        let dropped = before - self.tasks.len();
        if dropped > 0 {
            warn!(
                "event=board_dedupe module=board status=skip reason=duplicate_task dropped={}",
                dropped
            );
        }
        dropped
    }

    fn position_of(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == task_id)
    }

    fn renumber(&mut self, status: TaskStatus, ordered_ids: &[TaskId]) {
        let slots = ordered_ids
            .iter()
            .enumerate()
            .map(|(slot, id)| (*id, slot as u32))
            .collect::<HashMap<_, _>>();
        for task in self.tasks.iter_mut().filter(|task| task.status == status) {
            if let Some(slot) = slots.get(&task.id) {
                task.sort_index = *slot;
            }
        }
    }
}
