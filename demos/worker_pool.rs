// Worker pool with error collection
//
// A pool of tokio tasks processes a batch of jobs. Every failure is recorded
// in an ErrorChannel and forwarded to a monitor task as it happens; at the
// end the whole batch resolves into a single aggregate error.

use std::{sync::Arc, time::Duration};

use errcatch::{Catcher, ErrorChannel, Format, prelude::*};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
enum JobError {
    #[error("job {0}: checksum mismatch")]
    Checksum(u32),
    #[error("job {0}: upstream unavailable")]
    Unavailable(u32),
}

async fn run_job(id: u32) -> Result<u32, JobError> {
    tokio::time::sleep(Duration::from_millis(u64::from(id % 5))).await;
    match id % 7 {
        3 => Err(JobError::Checksum(id)),
        5 => Err(JobError::Unavailable(id)),
        _ => Ok(id * 2),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let root = CancellationToken::new();
    let channel = Arc::new(ErrorChannel::with_catcher(
        &root,
        8,
        Catcher::bounded(Format::Timestamp, 16),
    ));

    let monitor = {
        let channel = Arc::clone(&channel);
        let root = root.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = root.cancelled() => break,
                    error = channel.outbound().recv() => match error {
                        Some(error) => println!("monitor: {error}"),
                        None => break,
                    },
                }
            }
        })
    };

    let workers: Vec<_> = (0..40)
        .map(|id| {
            let channel = Arc::clone(&channel);
            let root = root.clone();
            tokio::spawn(async move {
                let outcome = run_job(id).await;
                channel.collect(&root, outcome).await;
            })
        })
        .collect();
    for worker in workers {
        if let Err(join_error) = worker.await {
            eprintln!("worker crashed: {join_error}");
        }
    }

    // Checks that are cheap enough to run inline go through a plain catcher
    // and are merged into the channel's record afterwards.
    let preflight = Catcher::plain();
    preflight.check(|| "8080".parse::<u16>());
    preflight.check(|| "http".parse::<u16>());
    errorf_when!(preflight, channel.len() > 10, "{} jobs failed", channel.len());
    channel.collect(&root, &preflight).await;

    channel.stop();
    match channel.wait(&root).await {
        Ok(Some(resolved)) => println!("batch failed:\n{resolved}"),
        Ok(None) => println!("batch succeeded"),
        Err(error) => eprintln!("gave up waiting: {error}"),
    }

    root.cancel();
    if let Err(join_error) = monitor.await {
        eprintln!("monitor crashed: {join_error}");
    }
}
