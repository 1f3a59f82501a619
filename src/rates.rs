/// Per-day transition rates.
///
/// `native_beta` is the transmission rate the run started with. Threshold restrictions reset
/// `beta` to it before scaling, so tiers never compound.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RateParameters {
    /// Transmission: how often a susceptible-infectious contact results in a new infection.
    pub beta: f64,
    /// Recovery: infectious people move to removed.
    pub alpha: f64,
    /// Incubation: exposed people become infectious. SEIRD only.
    pub sigma: f64,
    /// Fatality: infectious people die. SEIRD only.
    pub omega: f64,
    native_beta: f64,
}

impl RateParameters {
    #[must_use]
    pub fn new(beta: f64, alpha: f64, sigma: f64, omega: f64) -> Self {
        RateParameters {
            beta,
            alpha,
            sigma,
            omega,
            native_beta: beta,
        }
    }

    #[must_use]
    pub fn native_beta(&self) -> f64 {
        self.native_beta
    }

    pub fn reset_beta(&mut self) {
        self.beta = self.native_beta;
    }

    /// `beta / alpha`. Infinite when nobody recovers.
    #[must_use]
    pub fn basic_reproduction_number(&self) -> f64 {
        if self.alpha == 0.0 {
            f64::INFINITY
        } else {
            self.beta / self.alpha
        }
    }

    pub fn set_basic_reproduction_number(&mut self, r0: f64) {
        self.beta = self.alpha * r0;
    }
}
