// ============================================================
// Layer 5 — Learning-Rate Schedules
// ============================================================
// Stepped once per epoch by the training loop. A step size of
// zero keeps the learning rate constant.

use crate::domain::traits::LrSchedule;

/// Multiplies the learning rate by `gamma` every `step_size` epochs.
///
/// lr_t = lr_initial × gamma^(floor(t / step_size))
#[derive(Debug, Clone)]
pub struct StepLr {
    lr_initial: f64,
    step_size:  usize,
    gamma:      f64,
    epoch:      usize,
}

impl StepLr {
    pub fn new(lr_initial: f64, step_size: usize, gamma: f64) -> Self {
        Self { lr_initial, step_size, gamma, epoch: 0 }
    }
}

impl LrSchedule for StepLr {
    fn lr(&self) -> f64 {
        // step_size 0 disables decay
        if self.step_size == 0 {
            return self.lr_initial;
        }
        let decays = (self.epoch / self.step_size) as i32;
        self.lr_initial * self.gamma.powi(decays)
    }

    fn step(&mut self) {
        self.epoch += 1;
    }
}
