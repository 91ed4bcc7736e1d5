use crate::hal::time::Hertz;
use rfid_jukebox::Duration;
use rtic::cyccnt;

/// Converts poll loop durations into CYCCNT cycles.
pub struct CyclesComputer {
    frequency: Hertz,
}

impl CyclesComputer {
    pub fn new(frequency: Hertz) -> Self {
        CyclesComputer { frequency }
    }

    pub fn to_cycles(&self, duration: Duration) -> cyccnt::Duration {
        use rtic::cyccnt::U32Ext;
        (duration.to_millis() * (self.frequency.0 / 1_000)).cycles()
    }
}
