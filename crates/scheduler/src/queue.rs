//! Ordered task index keyed by `(priority, insertion sequence)`.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::SchedulerError;
use crate::types::{Priority, Task, TaskId, TaskSnapshot, TaskState};

type OrderKey = (Priority, u64);

/// The scheduler's task collection.
///
/// `ordered` holds every tracked task exactly once in dispatch order; `index`
/// maps ids to their order key so state changes never rebuild the tree.
/// Tasks taken by a running pass live in `dispatched` until they finish or
/// are requeued.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    ordered: BTreeMap<OrderKey, Task>,
    index: HashMap<TaskId, OrderKey>,
    dispatched: HashSet<TaskId>,
    next_seq: u64,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a new runnable task.
    pub(crate) fn insert(
        &mut self,
        id: TaskId,
        duration: u32,
        priority: Priority,
    ) -> Result<(), SchedulerError> {
        if duration == 0 {
            return Err(SchedulerError::InvalidTaskParameter(format!(
                "task {id}: duration must be at least one time unit"
            )));
        }
        if self.index.contains_key(&id) || self.dispatched.contains(&id) {
            return Err(SchedulerError::DuplicateTaskId(id));
        }

        let key = (priority, self.next_seq);
        self.next_seq += 1;
        self.ordered.insert(
            key,
            Task {
                id,
                priority,
                duration,
                remaining: duration,
                state: TaskState::Runnable,
                seq: key.1,
            },
        );
        self.index.insert(id, key);
        Ok(())
    }

    pub(crate) fn pause(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        self.task_mut(id)?.state = TaskState::Paused;
        Ok(())
    }

    /// Resume a single task. Returns whether its state changed.
    pub(crate) fn resume(&mut self, id: TaskId) -> Result<bool, SchedulerError> {
        let task = self.task_mut(id)?;
        let was_paused = task.state == TaskState::Paused;
        task.state = TaskState::Runnable;
        Ok(was_paused)
    }

    /// Resume every paused task. Returns how many changed state.
    pub(crate) fn resume_all(&mut self) -> usize {
        let mut resumed = 0;
        for task in self.ordered.values_mut() {
            if task.state == TaskState::Paused {
                task.state = TaskState::Runnable;
                resumed += 1;
            }
        }
        resumed
    }

    pub(crate) fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.ordered.values().map(Task::snapshot).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn paused_count(&self) -> usize {
        self.ordered
            .values()
            .filter(|t| t.state == TaskState::Paused)
            .count()
    }

    /// Extract the runnable tasks in dispatch order, leaving paused ones in place.
    ///
    /// Extracted ids stay reserved until [`Self::finish`] or [`Self::requeue`].
    pub(crate) fn take_runnable(&mut self) -> Vec<Task> {
        let all = std::mem::take(&mut self.ordered);
        let (runnable, paused): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|(_, task)| task.state == TaskState::Runnable);
        self.ordered = paused.into_iter().collect();

        runnable
            .into_iter()
            .map(|(_, task)| {
                self.index.remove(&task.id);
                self.dispatched.insert(task.id);
                task
            })
            .collect()
    }

    /// Release a dispatched task that ran to completion.
    pub(crate) fn finish(&mut self, id: TaskId) {
        self.dispatched.remove(&id);
    }

    /// Return a dispatched task to the collection at its original position.
    pub(crate) fn requeue(&mut self, mut task: Task) {
        self.dispatched.remove(&task.id);
        task.state = TaskState::Runnable;
        let key = (task.priority, task.seq);
        self.index.insert(task.id, key);
        self.ordered.insert(key, task);
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, SchedulerError> {
        if self.dispatched.contains(&id) {
            return Err(SchedulerError::TaskDispatched(id));
        }
        let key = self.index.get(&id).ok_or(SchedulerError::TaskNotFound(id))?;
        self.ordered
            .get_mut(key)
            .ok_or(SchedulerError::TaskNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(queue: &TaskQueue) -> Vec<TaskId> {
        queue.snapshot().iter().map(|t| t.id).collect()
    }

    #[test]
    fn orders_by_ascending_priority_then_insertion() {
        let mut queue = TaskQueue::new();
        queue.insert(1, 2, 5).unwrap();
        queue.insert(2, 1, 1).unwrap();
        queue.insert(3, 1, 3).unwrap();
        queue.insert(4, 1, 1).unwrap();
        queue.insert(5, 1, -7).unwrap();

        assert_eq!(ids(&queue), vec![5, 2, 4, 3, 1]);
    }

    #[test]
    fn rejects_zero_duration_without_side_effects() {
        let mut queue = TaskQueue::new();
        let err = queue.insert(1, 0, 1).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTaskParameter(_)));
        assert_eq!(queue.len(), 0);

        // The id was never consumed.
        queue.insert(1, 1, 1).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut queue = TaskQueue::new();
        queue.insert(7, 3, 2).unwrap();
        assert_eq!(queue.insert(7, 1, 0), Err(SchedulerError::DuplicateTaskId(7)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.snapshot()[0].priority, 2);
    }

    #[test]
    fn pause_keeps_position_and_unknown_id_is_reported() {
        let mut queue = TaskQueue::new();
        queue.insert(1, 1, 1).unwrap();
        queue.insert(2, 1, 2).unwrap();

        queue.pause(1).unwrap();
        // Pausing twice is fine.
        queue.pause(1).unwrap();
        assert_eq!(ids(&queue), vec![1, 2]);
        assert_eq!(queue.snapshot()[0].state, TaskState::Paused);
        assert_eq!(queue.paused_count(), 1);

        assert_eq!(queue.pause(99), Err(SchedulerError::TaskNotFound(99)));
    }

    #[test]
    fn resume_all_and_resume_by_id() {
        let mut queue = TaskQueue::new();
        queue.insert(1, 1, 1).unwrap();
        queue.insert(2, 1, 2).unwrap();
        queue.insert(3, 1, 3).unwrap();
        queue.pause(1).unwrap();
        queue.pause(3).unwrap();

        assert!(queue.resume(3).unwrap());
        assert!(!queue.resume(3).unwrap());
        assert_eq!(queue.paused_count(), 1);

        assert_eq!(queue.resume_all(), 1);
        assert_eq!(queue.resume_all(), 0);
        assert_eq!(queue.resume(42), Err(SchedulerError::TaskNotFound(42)));
    }

    #[test]
    fn take_runnable_leaves_paused_and_reserves_ids() {
        let mut queue = TaskQueue::new();
        queue.insert(1, 2, 5).unwrap();
        queue.insert(2, 1, 1).unwrap();
        queue.insert(3, 1, 3).unwrap();
        queue.pause(1).unwrap();

        let taken: Vec<TaskId> = queue.take_runnable().iter().map(|t| t.id).collect();
        assert_eq!(taken, vec![2, 3]);
        assert_eq!(ids(&queue), vec![1]);

        // Dispatched ids can neither be reused nor paused.
        assert_eq!(queue.insert(2, 1, 0), Err(SchedulerError::DuplicateTaskId(2)));
        assert_eq!(queue.pause(3), Err(SchedulerError::TaskDispatched(3)));

        queue.finish(2);
        queue.insert(2, 1, 0).unwrap();
        assert_eq!(ids(&queue), vec![2, 1]);
    }

    #[test]
    fn requeue_restores_original_position() {
        let mut queue = TaskQueue::new();
        queue.insert(1, 3, 2).unwrap();
        queue.insert(2, 1, 2).unwrap();

        let mut taken = queue.take_runnable();
        queue.insert(3, 1, 2).unwrap();

        let mut first = taken.remove(0);
        first.remaining = 1;
        queue.requeue(first);

        assert_eq!(ids(&queue), vec![1, 3]);
        let snap = queue.snapshot();
        assert_eq!(snap[0].remaining, 1);
        assert_eq!(snap[0].duration, 3);
        assert_eq!(snap[0].state, TaskState::Runnable);

        // A requeued task is tracked again and accepts state changes.
        queue.pause(1).unwrap();
        assert_eq!(queue.snapshot()[0].state, TaskState::Paused);
        assert_eq!(queue.paused_count(), 1);
    }
}
