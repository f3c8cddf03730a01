// ============================================================
// Layer 3 — Model Mode and Epoch Phase
// ============================================================

use std::fmt;

/// Whether a model runs its stochastic layers (dropout,
/// batch-norm statistics) in training or inference behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Training,
    Evaluation,
}

/// One of the two sub-passes of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Train,
    Validation,
}

impl Phase {
    /// Phases in the order every epoch runs them
    pub const ORDER: [Phase; 2] = [Phase::Train, Phase::Validation];

    /// The mode the model must be in while this phase runs
    pub fn mode(self) -> Mode {
        match self {
            Phase::Train      => Mode::Training,
            Phase::Validation => Mode::Evaluation,
        }
    }

    /// Short name used in log lines and the metrics CSV
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Train      => "train",
            Phase::Validation => "val",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_train_then_validation() {
        assert_eq!(Phase::ORDER, [Phase::Train, Phase::Validation]);
    }

    #[test]
    fn test_phase_maps_to_mode() {
        assert_eq!(Phase::Train.mode(), Mode::Training);
        assert_eq!(Phase::Validation.mode(), Mode::Evaluation);
        assert_eq!(Phase::Validation.to_string(), "val");
    }
}
