//! Patient intake: classify incoming questionnaires and queue them.

use bevy::prelude::*;

use crate::classifier::RawAnswers;
use crate::error::EngineError;
use crate::params::EngineParams;
use crate::queue::TriageQueue;

/// Request to classify and queue one patient.
#[derive(Event, Debug, Clone)]
pub struct AdmitPatient {
    pub id: String,
    pub answers: RawAnswers,
}

/// An [`AdmitPatient`] whose answers did not parse. The queue was not touched.
#[derive(Event, Debug, Clone)]
pub struct AdmissionRejected {
    pub id: String,
    pub error: EngineError,
}

pub fn admit_patients(
    mut requests: EventReader<AdmitPatient>,
    params: Res<EngineParams>,
    mut queue: ResMut<TriageQueue>,
    mut rejected: EventWriter<AdmissionRejected>,
) {
    for request in requests.read() {
        match queue.admit(request.id.clone(), &request.answers, &params.severity) {
            Ok(sequence) => {
                debug!("Admitted patient {} as #{sequence}", request.id);
            }
            Err(error) => {
                warn!("Rejected patient {}: {error}", request.id);
                rejected.send(AdmissionRejected {
                    id: request.id.clone(),
                    error,
                });
            }
        }
    }
}

/// Re-key the queue when the configured tie-break policy changes.
pub fn sync_tie_break_policy(params: Res<EngineParams>, mut queue: ResMut<TriageQueue>) {
    if !params.is_changed() {
        return;
    }
    let policy = params.severity.tie_break;
    if queue.policy() != policy {
        info!("Tie-break policy changed to {policy:?}; re-ordering {} waiting patients", queue.len());
        queue.set_policy(policy);
    }
}
