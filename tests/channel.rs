//! End-to-end behavior of the error channel with concurrent producers and a
//! consumer draining the outbound queue.

use std::{sync::Arc, time::Duration};

use errcatch::{Catcher, ErrorChannel, Format, Message, WaitError, caught};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
#[error("task {0} failed")]
struct TaskFailed(usize);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_are_all_recorded_and_forwarded() {
    let root = CancellationToken::new();
    let channel = Arc::new(ErrorChannel::new(&root, 16));

    let consumer = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            let mut seen = 0;
            while seen < 64 {
                if channel.outbound().recv().await.is_none() {
                    break;
                }
                seen += 1;
            }
            seen
        })
    };

    let producers: Vec<_> = (0..64)
        .map(|id| {
            let channel = Arc::clone(&channel);
            let root = root.clone();
            tokio::spawn(async move {
                let outcome: Result<(), TaskFailed> = Err(TaskFailed(id));
                channel.collect(&root, outcome).await;
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    assert_eq!(consumer.await.unwrap(), 64);
    assert_eq!(channel.len(), 64);

    channel.stop();
    let resolved = channel.wait(&root).await.unwrap().unwrap();
    assert_eq!(resolved.lines().count(), 64);
}

#[tokio::test]
async fn test_inbound_and_collect_share_one_record() {
    let root = CancellationToken::new();
    let channel = ErrorChannel::with_catcher(&root, 4, Catcher::new(Format::Plain));

    channel.inbound().send(caught!("pushed {}", 1)).await.unwrap();
    channel.collect(&root, Message::new("collected")).await;

    let mut forwarded = Vec::new();
    for _ in 0..2 {
        forwarded.push(channel.outbound().recv().await.unwrap().to_string());
    }
    forwarded.sort();
    assert_eq!(forwarded, ["collected", "pushed 1"]);
    assert_eq!(channel.len(), 2);
}

#[tokio::test]
async fn test_bounded_catcher_inside_channel() {
    let root = CancellationToken::new();
    let channel = ErrorChannel::with_catcher(&root, 8, Catcher::bounded(Format::Plain, 2));
    for id in 0..5 {
        channel.collect(&root, TaskFailed(id)).await;
    }
    assert_eq!(channel.len(), 2);
    assert_eq!(channel.resolve().unwrap().as_str(), "task 3 failed\ntask 4 failed");
}

#[tokio::test]
async fn test_wait_blocks_until_stopped() {
    let root = CancellationToken::new();
    let channel = Arc::new(ErrorChannel::new(&root, 4));
    channel.collect(&root, TaskFailed(1)).await;

    let pending = tokio::time::timeout(Duration::from_millis(20), channel.wait(&root)).await;
    assert!(pending.is_err());

    let stopper = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            channel.stop();
        })
    };
    let resolved = channel.wait(&root).await.unwrap();
    stopper.await.unwrap();
    assert!(resolved.unwrap().as_str().contains("task 1 failed"));
}

#[tokio::test]
async fn test_caller_cancellation_unblocks_wait() {
    let root = CancellationToken::new();
    let channel = ErrorChannel::new(&root, 4);
    let caller = CancellationToken::new();

    let canceller = {
        let caller = caller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            caller.cancel();
        })
    };
    assert_eq!(channel.wait(&caller).await, Err(WaitError::Cancelled));
    canceller.await.unwrap();
    assert!(!channel.is_stopped());
}

#[tokio::test]
async fn test_drop_stops_the_forwarder() {
    let root = CancellationToken::new();
    let channel = ErrorChannel::new(&root, 4);
    let inbound = channel.inbound();
    drop(channel);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(inbound.is_closed());
}

#[tokio::test]
async fn test_channel_flattens_into_parent_catcher() {
    let root = CancellationToken::new();
    let channel = ErrorChannel::new(&root, 4);
    channel.collect(&root, TaskFailed(1)).await;
    channel.collect(&root, TaskFailed(2)).await;

    let summary = Catcher::plain();
    summary.add(&channel);
    assert_eq!(summary.to_string(), "task 1 failed\ntask 2 failed");
}
