//! Lock-guarded handle for using one [`TriageQueue`] from several threads.
//!
//! Mutations take the write lock and are serialised; `peek` and snapshots
//! take the read lock and may run side by side. A panic while a guard is held
//! poisons the lock; the handle recovers the inner queue (every mutation
//! either completes or leaves the heap untouched) and keeps serving instead
//! of propagating the panic to unrelated callers.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bevy::prelude::*;

use super::{Patient, QueueRow, TieBreakPolicy, TriageQueue};
use crate::classifier::{Classification, Questionnaire, RawAnswers};
use crate::error::EngineError;
use crate::params::SeverityParams;

/// Cloneable, thread-safe handle to a single queue instance.
#[derive(Debug, Clone, Default)]
pub struct SharedTriageQueue {
    inner: Arc<RwLock<TriageQueue>>,
}

impl SharedTriageQueue {
    pub fn new(queue: TriageQueue) -> Self {
        Self {
            inner: Arc::new(RwLock::new(queue)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TriageQueue> {
        self.inner.read().unwrap_or_else(|poisoned| {
            warn!("Triage queue lock was poisoned; recovering for read");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, TriageQueue> {
        self.inner.write().unwrap_or_else(|poisoned| {
            warn!("Triage queue lock was poisoned; recovering for write");
            PoisonError::into_inner(poisoned)
        })
    }

    pub fn insert(
        &self,
        id: impl Into<String>,
        classification: Classification,
        answers: Questionnaire,
    ) -> u64 {
        self.write().insert(id, classification, answers)
    }

    /// Classification happens before the write lock is taken, so invalid
    /// input never blocks readers.
    pub fn admit(
        &self,
        id: impl Into<String>,
        answers: &RawAnswers,
        params: &SeverityParams,
    ) -> Result<u64, EngineError> {
        let (questionnaire, classification) = crate::classifier::classify(answers, params)?;
        Ok(self.insert(id, classification, questionnaire))
    }

    pub fn extract_highest(&self) -> Option<Patient> {
        self.write().extract_highest()
    }

    /// Owned copy of the head, since the guard cannot outlive the call.
    pub fn peek(&self) -> Option<Patient> {
        self.read().peek().cloned()
    }

    pub fn snapshot_ordered(&self) -> Vec<Patient> {
        self.read().snapshot_ordered()
    }

    pub fn snapshot_rows(&self) -> Vec<QueueRow> {
        self.read().snapshot_rows()
    }

    pub fn policy(&self) -> TieBreakPolicy {
        self.read().policy()
    }

    pub fn set_policy(&self, policy: TieBreakPolicy) {
        self.write().set_policy(policy);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Run `f` with shared access, for composite reads that must see one
    /// consistent state.
    pub fn with_queue<R>(&self, f: impl FnOnce(&TriageQueue) -> R) -> R {
        f(&*self.read())
    }
}
