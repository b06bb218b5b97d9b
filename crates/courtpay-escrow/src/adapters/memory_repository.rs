//! In-Memory Workflow Repository
//!
//! Process-memory implementation of the `WorkflowRepository` port,
//! sharded by booking ID. State lives only for the process lifetime;
//! durable deployments put a database behind the same trait.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Workflow, WorkflowStep};
use crate::ports::outbound::WorkflowRepository;

/// Concurrent map of booking ID to workflow.
#[derive(Default)]
pub struct InMemoryWorkflowRepository {
    workflows: DashMap<String, Workflow>,
}

impl InMemoryWorkflowRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn get(&self, booking_id: &str) -> Option<Workflow> {
        self.workflows.get(booking_id).map(|entry| entry.clone())
    }

    async fn put(&self, workflow: Workflow) {
        self.workflows.insert(workflow.booking_id.clone(), workflow);
    }

    async fn compare_and_swap(
        &self,
        booking_id: &str,
        expected_step: WorkflowStep,
        workflow: Workflow,
    ) -> bool {
        // The shard lock held by get_mut makes the compare and the
        // replace one atomic step.
        match self.workflows.get_mut(booking_id) {
            Some(mut entry) if entry.current_step == expected_step => {
                *entry = workflow;
                true
            }
            _ => false,
        }
    }

    async fn list(&self) -> Vec<Workflow> {
        self.workflows.iter().map(|entry| entry.clone()).collect()
    }

    async fn len(&self) -> usize {
        self.workflows.len()
    }
}
