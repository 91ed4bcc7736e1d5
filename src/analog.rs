//! Analog channel monitoring and edge triggered thresholds.

/// Converts a voltage at the battery into ADC counts.
///
/// `adc_ref = (voltage / divider_factor) * (full_scale / reference_voltage)`,
/// truncated like the original calibration tables.
pub fn adc_reference(voltage: f32, divider_factor: f32, full_scale: f32, reference_voltage: f32) -> u16 {
    ((voltage / divider_factor) * (full_scale / reference_voltage)) as u16
}

/// Circular buffer running average.
pub struct MovingAverage<const N: usize> {
    samples: [u16; N],
    next: usize,
    filled: usize,
    sum: u32,
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            samples: [0; N],
            next: 0,
            filled: 0,
            sum: 0,
        }
    }

    /// Adds a sample and returns the average over the samples seen so far.
    pub fn push(&mut self, sample: u16) -> u16 {
        if self.filled == N {
            self.sum -= u32::from(self.samples[self.next]);
        } else {
            self.filled += 1;
        }
        self.samples[self.next] = sample;
        self.sum += u32::from(sample);
        self.next = (self.next + 1) % N;
        (self.sum / self.filled as u32) as u16
    }
}

/// Analog channel sampled once per tick, optionally smoothed.
pub struct AnalogMonitor<const N: usize> {
    average: Option<MovingAverage<N>>,
    value: u16,
}

impl<const N: usize> AnalogMonitor<N> {
    pub const fn raw() -> Self {
        Self {
            average: None,
            value: 0,
        }
    }

    pub const fn averaged() -> Self {
        Self {
            average: Some(MovingAverage::new()),
            value: 0,
        }
    }

    pub fn sample(&mut self, raw: u16) {
        self.value = match self.average.as_mut() {
            Some(average) => average.push(raw),
            None => raw,
        };
    }

    /// Value cached by the last [`AnalogMonitor::sample`].
    pub fn value(&self) -> u16 {
        self.value
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub fn holds(self, value: u16, reference: u16) -> bool {
        match self {
            Comparison::Equal => value == reference,
            Comparison::NotEqual => value != reference,
            Comparison::Less => value < reference,
            Comparison::LessOrEqual => value <= reference,
            Comparison::Greater => value > reference,
            Comparison::GreaterOrEqual => value >= reference,
        }
    }
}

/// Fires on the transition into the condition, not while it keeps holding.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdEvent {
    comparison: Comparison,
    reference: u16,
    holding: bool,
}

impl ThresholdEvent {
    pub fn new(comparison: Comparison, reference: u16) -> Self {
        Self {
            comparison,
            reference,
            holding: false,
        }
    }

    pub fn check(&mut self, value: u16) -> bool {
        let holds = self.comparison.holds(value, self.reference);
        let crossed = holds && !self.holding;
        self.holding = holds;
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::battery;

    #[test]
    fn reference_counts_match_calibration() {
        let high = adc_reference(
            battery::HIGH_VOLTAGE,
            battery::DIVIDER_FACTOR,
            battery::FULL_SCALE,
            battery::REFERENCE_VOLTAGE,
        );
        // (4.0 / 2.0) * (4095 / 3.3) = 2481.8
        assert_eq!(high, 2481);
        assert_eq!(adc_reference(2.0, 2.0, 4096.0, 4.0), 1024);
        assert_eq!(adc_reference(0.0, 2.0, 4095.0, 3.3), 0);
    }

    #[test]
    fn average_over_partial_and_full_window() {
        let mut average = MovingAverage::<4>::new();
        assert_eq!(average.push(100), 100);
        assert_eq!(average.push(200), 150);
        assert_eq!(average.push(300), 200);
        assert_eq!(average.push(400), 250);
        // 100 drops out
        assert_eq!(average.push(500), 350);
    }

    #[test]
    fn monitor_caches_sample() {
        let mut raw = AnalogMonitor::<4>::raw();
        raw.sample(17);
        assert_eq!(raw.value(), 17);
        let mut smooth = AnalogMonitor::<2>::averaged();
        smooth.sample(10);
        smooth.sample(20);
        assert_eq!(smooth.value(), 15);
    }

    #[test]
    fn comparisons() {
        assert!(Comparison::Equal.holds(3, 3));
        assert!(Comparison::NotEqual.holds(2, 3));
        assert!(Comparison::Less.holds(2, 3));
        assert!(!Comparison::Less.holds(3, 3));
        assert!(Comparison::LessOrEqual.holds(3, 3));
        assert!(Comparison::Greater.holds(4, 3));
        assert!(Comparison::GreaterOrEqual.holds(3, 3));
        assert!(!Comparison::GreaterOrEqual.holds(2, 3));
    }

    #[test]
    fn threshold_fires_once_per_crossing() {
        let mut event = ThresholdEvent::new(Comparison::GreaterOrEqual, 100);
        let fired: std::vec::Vec<bool> = [90, 99, 100, 120, 101, 80, 100, 100]
            .iter()
            .map(|v| event.check(*v))
            .collect();
        assert_eq!(fired, [false, false, true, false, false, false, true, false]);
    }
}
