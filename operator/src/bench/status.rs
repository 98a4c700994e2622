use crate::bench::spec::{ApacheBench, ApacheBenchStatus, Phase};

impl Phase {
    /// Complete and Failed are never left for Pending, Running or Unknown.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }

    /// Phase reached when moving from `self` towards `next`.
    ///
    /// Complete is final. Failed may only be followed by Complete, which happens when a
    /// benchmark eventually succeeds after its configuration was fixed.
    pub fn advance(self, next: Phase) -> Phase {
        match (self, next) {
            (Phase::Complete, _) => Phase::Complete,
            (Phase::Failed, Phase::Complete) => Phase::Complete,
            (Phase::Failed, _) => Phase::Failed,
            (_, next) => next,
        }
    }
}

impl ApacheBenchStatus {
    /// Append an error message unless an identical message is already recorded.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if !self.errors.contains(&msg) {
            self.errors.push(msg);
        }
    }

    /// New status recording the configuration errors and moving to Failed.
    pub fn failed<I>(&self, messages: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut status = self.clone();
        for msg in messages {
            status.push_error(msg);
        }
        status.phase = self.phase.advance(Phase::Failed);
        status
    }

    /// New status holding the collected results and moving to Complete.
    pub fn completed(&self, results: Vec<String>) -> Self {
        Self {
            phase: self.phase.advance(Phase::Complete),
            errors: self.errors.clone(),
            results,
        }
    }
}

impl ApacheBench {
    /// The recorded status, or the status of a freshly created resource.
    pub fn observed_status(&self) -> ApacheBenchStatus {
        self.status.clone().unwrap_or_default()
    }

    /// The recorded phase, Pending when no status has been written yet.
    pub fn phase(&self) -> Phase {
        self.status
            .as_ref()
            .map(|status| status.phase)
            .unwrap_or_default()
    }
}
