use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use eventron::{Executor, ExecutorError};
use futures::executor::ThreadPool;

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_before_init_is_rejected() {
    let executor: Executor<()> = Executor::new();
    let err = executor.submit(async {}).unwrap_err();
    assert!(matches!(err, ExecutorError::NotInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn run_before_init_is_rejected() {
    let executor: Executor<()> = Executor::new();
    let err = executor.run(async { 1 }).await.unwrap_err();
    assert!(matches!(err, ExecutorError::NotInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn init_twice_is_rejected() {
    let executor: Executor<()> = Executor::new();
    executor.init(None).unwrap();
    let err = executor.init(None).unwrap_err();
    assert!(matches!(err, ExecutorError::AlreadyInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn init_accepts_a_caller_provided_pool() {
    let executor: Executor<()> = Executor::new();
    let pool = ThreadPool::new().unwrap();
    executor.init(Some(pool)).unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let r = Arc::clone(&ran);
    executor
        .submit(async move {
            r.store(true, Ordering::SeqCst);
        })
        .unwrap();
    wait_for(|| ran.load(Ordering::SeqCst)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn run_returns_the_task_result() {
    let executor: Executor<()> = Executor::new();
    executor.init(None).unwrap();
    let value = executor.run(async { 40 + 2 }).await.unwrap();
    assert_eq!(value, 42);
}

#[tokio::test(flavor = "multi_thread")]
async fn submitted_task_leaves_the_live_set_when_done() {
    let executor: Executor<()> = Executor::new();
    executor.init(None).unwrap();

    let handle = executor
        .submit(eventron::timing::sleep(Duration::from_millis(100)))
        .unwrap();
    assert!(!handle.is_finished());

    wait_for(|| handle.is_finished()).await;
    // Only the queue drain loop remains in flight.
    assert_eq!(executor.launcher().live_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn live_set_reflects_in_flight_tasks() {
    let executor: Executor<()> = Executor::new();
    executor.init(None).unwrap();
    let baseline = executor.launcher().live_count();

    let h1 = executor
        .submit(eventron::timing::sleep(Duration::from_millis(200)))
        .unwrap();
    let h2 = executor
        .submit(eventron::timing::sleep(Duration::from_millis(200)))
        .unwrap();
    assert_eq!(executor.launcher().live_count(), baseline + 2);

    wait_for(|| h1.is_finished() && h2.is_finished()).await;
    assert_eq!(executor.launcher().live_count(), baseline);
}
