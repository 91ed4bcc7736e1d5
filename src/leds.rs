use hal::gpio::{gpioe, Output, PushPull};
use hal::hal::digital::v2::OutputPin;
use rfid_jukebox::peripherals::StatusIndicator;
use stm32l4xx_hal as hal;

/// Green status light and red battery warning.
pub struct StatusLeds {
    led_red: gpioe::PE9<Output<PushPull>>,
    led_green: gpioe::PE11<Output<PushPull>>,
    green_on: bool,
}

impl StatusLeds {
    pub fn new(mut gpioe: gpioe::Parts) -> Self {
        let mut leds = Self {
            led_red: gpioe.pe9.into_push_pull_output(&mut gpioe.moder, &mut gpioe.otyper),
            led_green: gpioe.pe11.into_push_pull_output(&mut gpioe.moder, &mut gpioe.otyper),
            green_on: false,
        };
        leds.led_red.set_low().ok();
        leds.set(true);
        leds
    }
}

impl StatusIndicator for StatusLeds {
    fn set(&mut self, on: bool) {
        self.green_on = on;
        if on {
            self.led_green.set_high().ok();
        } else {
            self.led_green.set_low().ok();
        }
    }

    fn toggle(&mut self) {
        self.set(!self.green_on);
    }

    fn battery_low(&mut self, low: bool) {
        if low {
            self.led_red.set_high().ok();
        } else {
            self.led_red.set_low().ok();
        }
    }
}
