// SPDX-License-Identifier: Apache-2.0

use crate::init::BoxError;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::error;

pub type RelayTasks = JoinSet<Result<(), BoxError>>;

/// Wait for the first task to finish and return its result
pub async fn wait_for_any_task(tasks: &mut RelayTasks) -> Result<(), BoxError> {
    match tasks.join_next().await {
        None => Ok(()), // Empty set
        Some(res) => res?,
    }
}

pub async fn wait_for_tasks_with_timeout(
    tasks: &mut RelayTasks,
    timeout: Duration,
) -> Result<(), BoxError> {
    wait_for_tasks_with_deadline(tasks, Instant::now() + timeout).await
}

/// Drain every remaining task, keeping the last error seen
pub async fn wait_for_tasks_with_deadline(
    tasks: &mut RelayTasks,
    stop_at: Instant,
) -> Result<(), BoxError> {
    let mut result = Ok(());
    loop {
        match timeout_at(stop_at, tasks.join_next()).await {
            Err(_) => {
                tasks.abort_all();
                result = Err("timed out waiting for relay tasks to complete".into());
                break;
            }
            Ok(None) => break,
            Ok(Some(Ok(Ok(())))) => {}
            Ok(Some(Ok(Err(e)))) => result = Err(e),
            Ok(Some(Err(e))) => error!(error = ?e, "Failed to join with relay task"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn test_any_task_returns_first_error() {
        let mut tasks = RelayTasks::new();
        tasks.spawn(async {
            pending::<()>().await;
            Ok(())
        });
        tasks.spawn(async { Err("writer failed".into()) });

        let err = wait_for_any_task(&mut tasks).await.unwrap_err();
        assert_eq!(err.to_string(), "writer failed");
        tasks.abort_all();
    }

    #[tokio::test]
    async fn test_any_task_on_empty_set() {
        let mut tasks = RelayTasks::new();
        assert!(wait_for_any_task(&mut tasks).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_stuck_tasks() {
        let mut tasks = RelayTasks::new();
        tasks.spawn(async { Ok(()) });
        tasks.spawn(async {
            pending::<()>().await;
            Ok(())
        });

        let result = wait_for_tasks_with_timeout(&mut tasks, Duration::from_secs(1)).await;
        assert!(result.is_err());

        // The stuck task was aborted
        let joined = tasks.join_next().await.unwrap();
        assert!(joined.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_drain_reports_task_error() {
        let mut tasks = RelayTasks::new();
        tasks.spawn(async { Ok(()) });
        tasks.spawn(async { Err("rebuild failed".into()) });

        let err = wait_for_tasks_with_timeout(&mut tasks, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rebuild failed");
        assert!(tasks.is_empty());
    }
}
