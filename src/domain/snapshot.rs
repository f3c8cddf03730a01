// ============================================================
// Layer 3 — Parameter Snapshot
// ============================================================
// An immutable capture of a model's parameters, tagged with
// the epoch it was taken at and the validation accuracy that
// caused it. The parameters sit behind an Arc, so cloning a
// snapshot never copies weights.

use std::sync::Arc;

/// Immutable, cheaply clonable capture of model parameters.
#[derive(Debug)]
pub struct ParameterSnapshot<P> {
    epoch:    Option<usize>,
    accuracy: f64,
    params:   Arc<P>,
}

impl<P> ParameterSnapshot<P> {
    /// Snapshot of the parameters before any training happened
    pub fn initial(params: P) -> Self {
        Self { epoch: None, accuracy: 0.0, params: Arc::new(params) }
    }

    /// Snapshot taken after validating `epoch` at `accuracy`
    pub fn capture(epoch: usize, accuracy: f64, params: P) -> Self {
        Self { epoch: Some(epoch), accuracy, params: Arc::new(params) }
    }

    /// Epoch the snapshot belongs to; `None` means the initial parameters
    pub fn epoch(&self) -> Option<usize> {
        self.epoch
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn is_initial(&self) -> bool {
        self.epoch.is_none()
    }
}

// Manual impl: P itself does not need to be Clone.
impl<P> Clone for ParameterSnapshot<P> {
    fn clone(&self) -> Self {
        Self {
            epoch:    self.epoch,
            accuracy: self.accuracy,
            params:   Arc::clone(&self.params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot_has_no_epoch() {
        let s = ParameterSnapshot::initial(vec![1.0f32, 2.0]);
        assert!(s.is_initial());
        assert_eq!(s.accuracy(), 0.0);
        assert_eq!(s.params(), &vec![1.0, 2.0]);
    }

    #[test]
    fn test_clone_shares_parameters() {
        let s = ParameterSnapshot::capture(4, 0.8, vec![0u8; 1024]);
        let c = s.clone();
        assert!(std::ptr::eq(s.params(), c.params()));
        assert_eq!(c.epoch(), Some(4));
        assert_eq!(c.accuracy(), 0.8);
    }
}
