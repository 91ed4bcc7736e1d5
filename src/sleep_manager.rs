use cortex_m::peripheral::SCB;
use log::info;

/// Puts the core to deep sleep once the box has powered itself down.
pub struct SleepManager {
    scb: SCB,
}

impl SleepManager {
    pub fn new(scb: SCB) -> Self {
        Self { scb }
    }

    /// Only a reset leaves this state.
    pub fn power_off(&mut self) {
        info!("Entering deep sleep");
        self.scb.set_sleepdeep();
        cortex_m::asm::dsb();
        cortex_m::asm::wfi();
    }
}
