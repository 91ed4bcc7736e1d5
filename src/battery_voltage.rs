use cortex_m::asm;
use stm32l4xx_hal::gpio::{gpiob, Analog, Floating, Input, MODER, PUPDR};
use stm32l4xx_hal::pac::{self, ADC};
use stm32l4xx_hal::rcc::Clocks;

/// ADC1 input wired to PB0.
const BATTERY_CHANNEL: u8 = 15;
/// Longest sample time, the divider is high impedance.
const SAMPLE_TIME: u8 = 0b111;
const REGULATOR_STARTUP_US: u32 = 10;

/// Battery voltage behind the resistor divider on PB0.
///
/// The converter is calibrated once and set up for a single 12 bit
/// conversion of the battery channel; each [`read`](Self::read) enables it,
/// converts and disables it again.
pub struct BatteryReader {
    _input: gpiob::PB0<Analog>,
    adc: ADC,
}

impl BatteryReader {
    pub fn new(
        pb0: gpiob::PB0<Input<Floating>>,
        adc: ADC,
        moder: &mut MODER<'B'>,
        pupdr: &mut PUPDR<'B'>,
        clocks: &Clocks,
    ) -> Self {
        let input = pb0.into_analog(moder, pupdr);
        unsafe { (*pac::RCC::ptr()).ahb2enr.modify(|_, w| w.adcen().set_bit()) };

        adc.cr.write(|w| w.deeppwd().clear_bit().advregen().set_bit());
        asm::delay(REGULATOR_STARTUP_US * (clocks.sysclk().0 / 1_000_000));
        adc.cr.modify(|_, w| w.adcaldif().clear_bit().adcal().set_bit());
        while adc.cr.read().adcal().bit_is_set() {}

        // single conversion, right aligned, 12 bit, no dma
        adc.cfgr.write(|w| unsafe { w.res().bits(0b00) }.cont().clear_bit().align().clear_bit().dmaen().clear_bit());
        adc.smpr2.write(|w| unsafe { w.smp15().bits(SAMPLE_TIME) });
        adc.sqr1.write(|w| unsafe { w.sq1().bits(BATTERY_CHANNEL).l().bits(0) });

        BatteryReader { _input: input, adc }
    }

    /// Raw reading, 0..=4095.
    pub fn read(&mut self) -> u16 {
        self.adc.isr.write(|w| w.adrdy().set_bit());
        self.adc.cr.modify(|_, w| w.aden().set_bit());
        while self.adc.isr.read().adrdy().bit_is_clear() {}

        self.adc.isr.write(|w| w.eoc().set_bit());
        self.adc.cr.modify(|_, w| w.adstart().set_bit());
        while self.adc.isr.read().eoc().bit_is_clear() {}
        let raw = self.adc.dr.read().bits() as u16;

        self.adc.cr.modify(|_, w| w.addis().set_bit());
        while self.adc.cr.read().aden().bit_is_set() {}
        raw
    }

    /// Deep power-down until the next reset.
    pub fn sleep(&mut self) {
        self.adc.cr.modify(|_, w| w.advregen().clear_bit());
        self.adc.cr.modify(|_, w| w.deeppwd().set_bit());
    }
}
