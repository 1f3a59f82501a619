/// Running totals and peaks collected over a whole run.
///
/// Peaks compare rounded values with a strict `>`, so a later day that only ties the current
/// peak does not replace it. Days are 1-indexed; a day of `0` means no peak has been recorded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStatistics {
    pub sum_infected: f64,
    pub sum_recovered: f64,
    pub max_infected: f64,
    pub day_of_max_infected: usize,
    pub max_increment: f64,
    pub day_of_max_increment: usize,
}

impl RunStatistics {
    #[must_use]
    pub fn new(initially_infected: f64) -> Self {
        RunStatistics {
            sum_infected: initially_infected,
            ..RunStatistics::default()
        }
    }

    /// Updates the peaks with the infectious count and its change since the previous day, as
    /// observed at the start of simulated day `day` (0-indexed).
    pub fn record(&mut self, day: usize, infected: f64, increment: f64) {
        let infected = infected.round();
        if infected > self.max_infected {
            self.max_infected = infected;
            self.day_of_max_infected = day + 1;
        }

        let increment = increment.round();
        if increment > self.max_increment {
            self.max_increment = increment;
            self.day_of_max_increment = day + 1;
        }
    }

    pub fn record_infections(&mut self, count: f64) {
        self.sum_infected += count;
    }

    pub fn record_recoveries(&mut self, count: f64) {
        self.sum_recovered += count;
    }

    /// `sum_infected` as a percentage of `population`.
    #[must_use]
    pub fn attack_rate(&self, population: f64) -> f64 {
        self.sum_infected / population * 100.0
    }

    #[must_use]
    pub fn recovered_share(&self, population: f64) -> f64 {
        self.sum_recovered / population * 100.0
    }
}
