use crate::hal::gpio::{gpiob, Floating, Input, PullUp, MODER, PUPDR};
use crate::hal::hal::digital::v2::InputPin;
use rfid_jukebox::button::{ButtonId, ButtonLevels};

/// Front panel buttons. Pressed buttons pull their line low.
pub struct Buttons {
    next: gpiob::PB2<Input<PullUp>>,
    previous: gpiob::PB12<Input<PullUp>>,
    play: gpiob::PB10<Input<PullUp>>,
}

impl Buttons {
    pub fn new(
        previous: gpiob::PB12<Input<Floating>>,
        play: gpiob::PB10<Input<Floating>>,
        next: gpiob::PB2<Input<Floating>>,
        moder: &mut MODER<'B'>,
        pupdr: &mut PUPDR<'B'>,
    ) -> Self {
        Buttons {
            next: next.into_pull_up_input(moder, pupdr),
            previous: previous.into_pull_up_input(moder, pupdr),
            play: play.into_pull_up_input(moder, pupdr),
        }
    }

    pub fn levels(&self) -> ButtonLevels {
        let mut levels = ButtonLevels::NONE;
        levels.set(ButtonId::Play, self.play.is_low().unwrap_or(false));
        levels.set(ButtonId::Next, self.next.is_low().unwrap_or(false));
        levels.set(ButtonId::Previous, self.previous.is_low().unwrap_or(false));
        levels
    }
}
