//! Integration tests for passes running on the background worker while the
//! caller keeps mutating the collection.

use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::time::Duration;

use microsched::{
    ChannelObserver, ProgressEvent, Scheduler, SchedulerConfig, SchedulerError, TaskState, Worker,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn observed(time_unit_ms: u64) -> (Scheduler, Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();
    let config = SchedulerConfig {
        time_unit_ms,
        worker_name: "test-worker".to_string(),
    };
    (Scheduler::from_config(&config).with_observer(ChannelObserver::new(tx)), rx)
}

/// Block until an event matching `pred` arrives.
fn wait_for(rx: &Receiver<ProgressEvent>, pred: impl Fn(&ProgressEvent) -> bool) {
    loop {
        let event = rx.recv_timeout(RECV_TIMEOUT).expect("progress event");
        if pred(&event) {
            return;
        }
    }
}

#[test]
fn tasks_added_during_a_pass_wait_for_the_next_one() {
    let (scheduler, rx) = observed(20);
    scheduler.add_task(1, 5, 10).unwrap();
    let worker = Worker::spawn(scheduler.clone()).expect("spawn worker");

    let pending = worker.run_ready().unwrap();
    wait_for(&rx, |e| matches!(e, ProgressEvent::TaskStarted { id: 1, .. }));

    // Higher priority than the running task, but the dispatch set is frozen.
    scheduler.add_task(2, 1, -100).unwrap();
    assert_eq!(scheduler.pause_task(1), Err(SchedulerError::TaskDispatched(1)));
    assert_eq!(scheduler.add_task(1, 1, 0), Err(SchedulerError::DuplicateTaskId(1)));

    let summary = pending.wait().unwrap();
    assert_eq!(summary.executed, vec![1]);
    let snap = scheduler.snapshot().unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].id, 2);

    let summary = worker.run_ready().unwrap().wait().unwrap();
    assert_eq!(summary.executed, vec![2]);
    assert!(scheduler.is_empty().unwrap());
    worker.shutdown().unwrap();
}

#[test]
fn pause_during_a_pass_applies_to_undispatched_tasks_only() {
    let (scheduler, rx) = observed(20);
    scheduler.add_task(1, 3, 0).unwrap();
    let worker = Worker::spawn(scheduler.clone()).unwrap();

    let pending = worker.run_ready().unwrap();
    wait_for(&rx, |e| matches!(e, ProgressEvent::TaskStarted { id: 1, .. }));
    scheduler.add_task(2, 1, 1).unwrap();
    scheduler.pause_task(2).unwrap();
    pending.wait().unwrap();

    let summary = worker.run_ready().unwrap().wait().unwrap();
    assert!(summary.executed.is_empty());
    assert_eq!(summary.paused, 1);
    assert_eq!(scheduler.snapshot().unwrap()[0].state, TaskState::Paused);
}

#[test]
fn cancel_interrupts_between_time_units() {
    let (scheduler, rx) = observed(10);
    scheduler.add_task(1, 200, 0).unwrap();
    scheduler.add_task(2, 1, 1).unwrap();
    let worker = Worker::spawn(scheduler.clone()).unwrap();

    let pending = worker.run_ready().unwrap();
    wait_for(&rx, |e| matches!(e, ProgressEvent::SlotCompleted { id: 1, .. }));
    worker.cancel();

    let summary = pending.wait().unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.requeued, vec![1, 2]);

    let snap = scheduler.snapshot().unwrap();
    assert_eq!(snap[0].id, 1);
    assert!(snap[0].remaining > 0 && snap[0].remaining < 200, "remaining = {}", snap[0].remaining);
    assert_eq!(snap[1].id, 2);
    assert_eq!(snap[1].remaining, 1);
}

#[test]
fn pending_run_reports_progress_without_blocking() {
    let (scheduler, _rx) = observed(20);
    scheduler.add_task(1, 10, 0).unwrap();
    let worker = Worker::spawn(scheduler).unwrap();

    let pending = worker.run_ready().unwrap();
    assert!(pending.try_result().is_none());
    assert!(pending.wait_timeout(Duration::from_millis(1)).is_none());

    let summary = pending
        .wait_timeout(RECV_TIMEOUT)
        .expect("pass finished")
        .unwrap();
    assert_eq!(summary.executed, vec![1]);
}

#[test]
fn shutdown_drains_queued_passes() {
    let (scheduler, _rx) = observed(1);
    scheduler.add_task(1, 2, 0).unwrap();
    let worker = Worker::spawn(scheduler.clone()).unwrap();

    let first = worker.run_ready().unwrap();
    let second = worker.run_ready().unwrap();
    worker.shutdown().unwrap();

    assert_eq!(first.wait().unwrap().executed, vec![1]);
    assert!(second.wait().unwrap().is_idle());
}

#[test]
fn worker_thread_uses_configured_name() {
    let (tx, rx) = mpsc::channel();
    let config = SchedulerConfig {
        time_unit_ms: 0,
        worker_name: "named-worker".to_string(),
    };
    let tx = Mutex::new(tx);
    let scheduler = Scheduler::from_config(&config).with_observer(move |_: &ProgressEvent| {
        let name = std::thread::current().name().map(str::to_string);
        let _ = tx.lock().unwrap().send(name);
    });
    let worker = Worker::spawn(scheduler).unwrap();
    worker.run_ready().unwrap().wait().unwrap();

    let name = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(name.as_deref(), Some("named-worker"));
}
