//! Per-run event journals, stored as a log artifact when the run completes.

use crate::events::domain::Event;
use crate::workflow::domain::{Run, RunId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Events collected for each open run.
#[derive(Debug, Clone, Default)]
pub(super) struct RunJournals(Arc<Mutex<HashMap<RunId, Vec<Event>>>>);

impl RunJournals {
    /// Starts collecting events for `run_id`.
    pub(super) fn open(&self, run_id: RunId) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id, Vec::new());
    }

    /// Appends `event` to the journal of its run, if that journal is open.
    pub(super) fn record(&self, event: &Event) {
        let Some(run_id) = event.run_id() else {
            return;
        };
        if let Some(entries) = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&run_id)
        {
            entries.push(event.clone());
        }
    }

    /// Closes the journal of `run_id` and returns its events in order.
    pub(super) fn close(&self, run_id: RunId) -> Vec<Event> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&run_id)
            .unwrap_or_default()
    }
}

/// Stored form of a run log: the completed run and everything it emitted.
#[derive(Debug, Serialize)]
pub(super) struct RunLog<'a> {
    pub(super) run: &'a Run,
    pub(super) events: Vec<Event>,
}

impl RunLog<'_> {
    /// Artifact name for a run log of `run`'s phase.
    pub(super) fn file_name(run: &Run) -> String {
        format!("{}-run-log.json", run.phase().as_str())
    }
}
