// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weave-core: shared data model for the orchestration runtime.
//!
//! Every type here is plain data plus the state-machine transition rules
//! from the spec (§3, §4); the subsystems that mutate this data
//! (`weave-engine`'s hub, workflow manager, ReACT loop, agent pool, and
//! scheduler) live one crate up so they can depend on I/O.

pub mod macros;

pub mod agent_config;
pub mod agent_instance;
pub mod ask;
pub mod checkpoint;
pub mod clock;
pub mod error;
pub mod id;
pub mod mailbox;
pub mod message;
pub mod module;
pub mod resource;
pub mod session;
pub mod task;
pub mod timer;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent_config::{AgentConfig, AgentConfigId, AgentTransport};
#[cfg(any(test, feature = "test-support"))]
pub use agent_instance::AgentInstanceBuilder;
pub use agent_instance::{AgentInstance, AgentInstanceId, AgentInstanceState};
pub use ask::{oldest_pending_ask_for_workflow, Ask, AskId, AskScope, RuntimeInstruction};
pub use checkpoint::{prune_oldest, Checkpoint, CheckpointId, TaskProgress, MAX_CHECKPOINTS_PER_SESSION};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{AgentPoolError, CoreError, ErrorEnvelope, ErrorKind, HubError, ReactError, SchedulerError, WorkflowError};
pub use id::{short, IdBuf, ID_MAX_LEN};
pub use mailbox::{MailboxEntry, MailboxEntryId, MailboxStatus};
#[cfg(any(test, feature = "test-support"))]
pub use message::MessageBuilder;
pub use message::{Attachment, Message, MessageId, MessageRole};
pub use module::{Module, ModuleId, ModuleKind};
pub use resource::{Resource, ResourceId};
#[cfg(any(test, feature = "test-support"))]
pub use session::SessionBuilder;
pub use session::{Session, SessionId, SessionStatus, SessionSummary, DEFAULT_LEDGER_FOCUS, MAX_MESSAGES};
#[cfg(any(test, feature = "test-support"))]
pub use task::TaskNodeBuilder;
pub use task::{TaskId, TaskNode, TaskResult, TaskState};
pub use timer::{aged_priority, exponential_backoff_ms, DeadlineSet};
#[cfg(any(test, feature = "test-support"))]
pub use workflow::WorkflowBuilder;
pub use workflow::{Workflow, WorkflowId, WorkflowState};
