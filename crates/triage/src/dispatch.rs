//! Dispatch: hand the most urgent waiting patient to whoever asks next.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::queue::{Patient, TriageQueue};

/// Maximum number of dispatches retained in [`DispatchLog`].
const MAX_ENTRIES: usize = 64;

/// Ask for the next patient. Each event extracts at most one.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct DispatchNext;

#[derive(Event, Debug, Clone)]
pub struct PatientDispatched {
    pub patient: Patient,
}

/// A [`DispatchNext`] arrived while nobody was waiting.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct QueueEmpty;

/// Ring buffer of the last [`MAX_ENTRIES`] dispatched patients, oldest first.
#[derive(Resource, Debug, Clone, Default)]
pub struct DispatchLog {
    entries: VecDeque<Patient>,
}

impl DispatchLog {
    /// Record a dispatch, evicting the oldest entry when full.
    pub fn push(&mut self, patient: Patient) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(patient);
    }

    /// The last `n` dispatches (or fewer), oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &Patient> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn latest(&self) -> Option<&Patient> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn dispatch_patients(
    mut requests: EventReader<DispatchNext>,
    mut queue: ResMut<TriageQueue>,
    mut log: ResMut<DispatchLog>,
    mut dispatched: EventWriter<PatientDispatched>,
    mut empty: EventWriter<QueueEmpty>,
) {
    for _ in requests.read() {
        match queue.extract_highest() {
            Some(patient) => {
                debug!(
                    "Dispatching patient {} ({}, score {}); {} still waiting",
                    patient.id(),
                    patient.tier(),
                    patient.score(),
                    queue.len()
                );
                log.push(patient.clone());
                dispatched.send(PatientDispatched { patient });
            }
            None => {
                empty.send(QueueEmpty);
            }
        }
    }
}
