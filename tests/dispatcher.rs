use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use eventron::{Executor, ExecutorError, Listener, Topic};

type Log = Arc<Mutex<Vec<&'static str>>>;

// Registers the four listeners of the canonical routing scenario: one at the
// Default root, one under Message, one under Message/Test, and one under
// Message on the Private channel.
fn routing_setup() -> (Executor<i64>, Log) {
    let executor: Executor<i64> = Executor::new();
    executor.init(None).unwrap();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let l = Arc::clone(&log);
    executor.subscribe(
        Listener::with_topics(move |_topics, _data| {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push("root");
            }
        }),
        &[],
    );

    let l = Arc::clone(&log);
    executor.subscribe(
        Listener::with_topics(move |_topics, _data| {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push("message");
            }
        }),
        &["Message".into()],
    );

    let l = Arc::clone(&log);
    executor.on(&["Message".into(), "Test".into()], move |_data| {
        let l = Arc::clone(&l);
        async move {
            l.lock().unwrap().push("message_test");
        }
    });

    let l = Arc::clone(&log);
    executor.subscribe_on(
        Listener::no_args(move || {
            let l = Arc::clone(&l);
            async move {
                l.lock().unwrap().push("private_message");
            }
        }),
        &["Message".into()],
        "Private",
    );

    (executor, log)
}

async fn settled(log: &Log) -> Vec<&'static str> {
    tokio::time::sleep(Duration::from_millis(300)).await;
    let mut fired = log.lock().unwrap().clone();
    fired.sort_unstable();
    fired
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_off_path_reaches_only_root() {
    let (executor, log) = routing_setup();
    executor.publish(0, &["Other".into(), 1.into()]).unwrap();
    assert_eq!(settled(&log).await, vec!["root"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_prefix_reaches_root_and_first_level() {
    let (executor, log) = routing_setup();
    executor
        .publish(0, &["Message".into(), "StarBot".into()])
        .unwrap();
    assert_eq!(settled(&log).await, vec!["message", "root"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_full_path_reaches_every_ancestor() {
    let (executor, log) = routing_setup();
    executor
        .publish(0, &["Message".into(), "Test".into()])
        .unwrap();
    assert_eq!(settled(&log).await, vec!["message", "message_test", "root"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn channels_are_isolated() {
    let (executor, log) = routing_setup();
    executor
        .publish_on(0, &["Message".into()], "Private")
        .unwrap();
    assert_eq!(settled(&log).await, vec!["private_message"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn exact_match_fires_only_the_terminal_node() {
    let (executor, log) = routing_setup();
    executor
        .dispatch(0, &["Message".into(), "Test".into()], false, "Default")
        .unwrap();
    assert_eq!(settled(&log).await, vec!["message_test"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_channel_is_a_silent_no_op() {
    let (executor, log) = routing_setup();
    executor
        .publish_on(0, &["Message".into()], "Nowhere")
        .unwrap();
    assert!(settled(&log).await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn with_topics_listener_receives_full_path_and_payload() {
    let executor: Executor<i64> = Executor::new();
    executor.init(None).unwrap();
    let seen: Arc<Mutex<Option<(Vec<Topic>, i64)>>> = Arc::new(Mutex::new(None));

    let s = Arc::clone(&seen);
    executor.subscribe(
        Listener::with_topics(move |topics, data| {
            let s = Arc::clone(&s);
            async move {
                *s.lock().unwrap() = Some((topics.to_vec(), data));
            }
        }),
        &["Message".into()],
    );

    executor
        .publish(7, &["Message".into(), "Test".into()])
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let seen = seen.lock().unwrap().take().expect("listener never fired");
    assert_eq!(seen.0, vec![Topic::from("Message"), Topic::from("Test")]);
    assert_eq!(seen.1, 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn no_args_listener_fires_without_payload() {
    let executor: Executor<i64> = Executor::new();
    executor.init(None).unwrap();
    let fired = Arc::new(Mutex::new(0));

    let f = Arc::clone(&fired);
    executor.subscribe(
        Listener::no_args(move || {
            let f = Arc::clone(&f);
            async move {
                *f.lock().unwrap() += 1;
            }
        }),
        &["Ping".into()],
    );

    executor.publish(0, &["Ping".into()]).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*fired.lock().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn listener_order_tracks_surviving_insertions() {
    let executor: Executor<i64> = Executor::new();
    let a = executor.subscribe(Listener::no_args(|| async {}), &[]);
    let b = executor.subscribe(Listener::no_args(|| async {}), &[]);
    let c = executor.subscribe(Listener::no_args(|| async {}), &[]);

    assert!(executor.unsubscribe(&[], Some(b)));
    assert_eq!(executor.dispatcher().listeners(&[]), Some(vec![a, c]));

    // Removing the same registration twice reports the absence.
    assert!(!executor.unsubscribe(&[], Some(b)));
}

#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_without_id_discards_the_subtree() {
    let (executor, log) = routing_setup();

    assert!(executor.unsubscribe(&["Message".into()], None));
    assert!(executor.dispatcher().listeners(&["Message".into()]).is_none());

    executor
        .publish(0, &["Message".into(), "Test".into()])
        .unwrap();
    assert_eq!(settled(&log).await, vec!["root"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_on_missing_path_returns_false() {
    let executor: Executor<i64> = Executor::new();
    assert!(!executor.unsubscribe(&["Missing".into(), "Path".into()], None));
    assert!(!executor.unsubscribe_on(&["Message".into()], None, "Nowhere"));
    assert!(!executor.unsubscribe(&[], None));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_channel_is_idempotent() {
    let executor: Executor<i64> = Executor::new();
    executor.create_channel("Private");
    let id = executor.subscribe_on(Listener::no_args(|| async {}), &[], "Private");
    executor.create_channel("Private");
    assert_eq!(
        executor.dispatcher().listeners_on(&[], "Private"),
        Some(vec![id])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_with_match_before_init_is_rejected() {
    let executor: Executor<i64> = Executor::new();
    executor.subscribe(Listener::no_args(|| async {}), &[]);
    let err = executor.publish(0, &[]).unwrap_err();
    assert!(matches!(err, ExecutorError::NotInitialized));
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_without_match_before_init_is_fine() {
    // Nothing matched means nothing needs launching, so nothing fails.
    let executor: Executor<i64> = Executor::new();
    executor.subscribe(Listener::no_args(|| async {}), &["Deep".into()]);
    executor.publish(0, &["Quiet".into()]).unwrap();
}
