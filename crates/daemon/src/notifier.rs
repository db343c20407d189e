// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notifications for terminal workflow states (§7 "user-visible
//! failure"). A workflow that completes or fails while its operator is away
//! from the terminal should still surface that without the operator polling
//! `agent.control` — this background task is how.

use weave_adapters::NotifyAdapter;
use weave_core::WorkflowState;
use weave_engine::event_bus::OutboundEvent;

/// Subscribe to `events` and fire a desktop notification whenever a workflow
/// reaches a terminal state. Runs until the subscriber lags past the
/// channel's capacity or every sender is dropped; a lagged subscriber just
/// resubscribes rather than exiting, since missing a notification is better
/// than silently stopping all future ones.
pub async fn run<N: NotifyAdapter>(
    mut events: tokio::sync::broadcast::Receiver<OutboundEvent>,
    notify: N,
) {
    loop {
        match events.recv().await {
            Ok(OutboundEvent::WorkflowUpdate { id, state }) if state.is_terminal() => {
                let (title, body) = match state {
                    WorkflowState::Completed => {
                        ("workflow completed".to_string(), format!("{id} finished successfully"))
                    }
                    WorkflowState::Failed => {
                        ("workflow failed".to_string(), format!("{id} did not complete"))
                    }
                    _ => continue,
                };
                if let Err(e) = notify.notify(&title, &body).await {
                    tracing::warn!(error = %e, "failed to deliver desktop notification");
                }
            }
            Ok(_) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notifier lagged behind the event bus");
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
