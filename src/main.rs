#![no_std]
#![no_main]

extern crate panic_itm;

mod battery_voltage;
mod buttons;
mod cycles_computer;
mod dfplayer;
mod leds;
mod nvm_adapter;
mod rfid_reader;
mod sleep_manager;

use crate::hal::prelude::*;
use crate::hal::serial::{self, Serial};
use crate::hal::spi::Spi;
use crate::hal::{gpio, pac};
use battery_voltage::BatteryReader;
use buttons::Buttons;
use cortex_m::peripheral::DWT;
use cortex_m_log::destination::Itm;
use cortex_m_log::log::Logger;
use cortex_m_log::printer::itm::InterruptSync;
use cycles_computer::CyclesComputer;
use dfplayer::DfPlayer;
use leds::StatusLeds;
use log::{error, info};
use mfrc522::Mfrc522;
use nvm_adapter::FlashStore;
use rfid_jukebox::app::{App, AppConfig, Sample, TickOutcome};
use rfid_jukebox::config::{timing, ButtonLayout, BOOT};
use rfid_jukebox::Instant;
use rfid_reader::CardReader;
use rtic::app;
use sleep_manager::SleepManager;
use stm32l4xx_hal as hal;

type SpiPins = (
    gpio::gpioa::PA5<gpio::Alternate<gpio::PushPull, 5>>,
    gpio::gpioa::PA6<gpio::Alternate<gpio::PushPull, 5>>,
    gpio::gpioa::PA7<gpio::Alternate<gpio::PushPull, 5>>,
);
type CardSpi = Spi<pac::SPI1, SpiPins>;
type Reader = CardReader<CardSpi, gpio::gpioa::PA4<gpio::Output<gpio::PushPull>>, gpio::gpiob::PB1<gpio::Output<gpio::PushPull>>>;
type Player = DfPlayer<serial::Tx<pac::USART1>, serial::Rx<pac::USART1>, gpio::gpioa::PA8<gpio::Input<gpio::PullUp>>>;
type Jukebox = App<Player, Reader, FlashStore, StatusLeds>;

const SYSCLK_MHZ: u32 = 80;
const DFPLAYER_BAUD: u32 = 9_600;
const DEBUG_BAUD: u32 = 115_200;

#[app(device = stm32l4xx_hal::stm32, monotonic = rtic::cyccnt::CYCCNT, peripherals = true)]
const APP: () = {
    struct Resources {
        app: Jukebox,
        buttons: Buttons,
        battery: BatteryReader,
        debug_rx: serial::Rx<pac::USART2>,
        sleep: SleepManager,
        cycles: CyclesComputer,
        millis: Instant,
    }

    #[init(schedule = [poll])]
    fn init(mut cx: init::Context) -> init::LateResources {
        static mut LOGGER: Option<Logger<InterruptSync>> = None;
        let logger = LOGGER.get_or_insert(Logger {
            inner: InterruptSync::new(Itm::new(cx.core.ITM)),
            level: log::LevelFilter::Info,
        });
        cortex_m_log::log::init(logger).ok();
        info!("Init");

        cx.core.DCB.enable_trace();
        cx.core.DWT.enable_cycle_counter();

        let dp = cx.device;
        let mut flash = dp.FLASH.constrain();
        let mut rcc = dp.RCC.constrain();
        let mut pwr = dp.PWR.constrain(&mut rcc.apb1r1);
        let clocks = rcc
            .cfgr
            .sysclk(SYSCLK_MHZ.MHz())
            .pclk1(SYSCLK_MHZ.MHz())
            .pclk2(SYSCLK_MHZ.MHz())
            .freeze(&mut flash.acr, &mut pwr);

        let mut gpioa = dp.GPIOA.split(&mut rcc.ahb2);
        let mut gpiob = dp.GPIOB.split(&mut rcc.ahb2);
        let gpioe = dp.GPIOE.split(&mut rcc.ahb2);
        let indicator = StatusLeds::new(gpioe);

        let buttons = Buttons::new(gpiob.pb12, gpiob.pb10, gpiob.pb2, &mut gpiob.moder, &mut gpiob.pupdr);
        let mut battery = BatteryReader::new(gpiob.pb0, dp.ADC, &mut gpiob.moder, &mut gpiob.pupdr, &clocks);

        info!("Setup card reader");
        let sck = gpioa.pa5.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let miso = gpioa.pa6.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let mosi = gpioa.pa7.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let spi = Spi::spi1(dp.SPI1, (sck, miso, mosi), mfrc522::MODE, 1.MHz(), clocks, &mut rcc.apb2);
        let nss = gpioa.pa4.into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);
        let mut reset = gpiob.pb1.into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);
        reset.set_high().ok();
        let mfrc522 = match Mfrc522::new(spi, nss) {
            Ok(device) => device,
            Err(e) => panic!("Card reader init failed: {:?}", e),
        };
        let reader = CardReader::new(mfrc522, reset);

        info!("Setup DFPlayer");
        let tx = gpioa.pa9.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrh);
        let rx = gpioa.pa10.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrh);
        let busy = gpioa.pa8.into_pull_up_input(&mut gpioa.moder, &mut gpioa.pupdr);
        let (player_tx, player_rx) = Serial::usart1(
            dp.USART1,
            (tx, rx),
            serial::Config::default().baudrate(DFPLAYER_BAUD.bps()),
            clocks,
            &mut rcc.apb2,
        )
        .split();
        let player = DfPlayer::new(player_tx, player_rx, busy);

        let debug_tx = gpioa.pa2.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let debug_rx = gpioa.pa3.into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
        let (_, debug_rx) = Serial::usart2(
            dp.USART2,
            (debug_tx, debug_rx),
            serial::Config::default().baudrate(DEBUG_BAUD.bps()),
            clocks,
            &mut rcc.apb1r1,
        )
        .split();

        let store = FlashStore::new(flash.keyr, flash.sr, flash.cr);
        let seed = (u64::from(battery.read()) << 32) | u64::from(DWT::cycle_count());
        let config = AppConfig {
            layout: ButtonLayout::Compact,
            debug_serial: true,
            seed,
        };
        let app = App::new(player, reader, store, indicator, config, BOOT);

        let cycles = CyclesComputer::new(clocks.sysclk());
        if cx.schedule.poll(cx.start + cycles.to_cycles(timing::POLL_PERIOD)).is_err() {
            error!("Could not schedule poll");
        }
        info!("Init done");

        init::LateResources {
            app,
            buttons,
            battery,
            debug_rx,
            sleep: SleepManager::new(cx.core.SCB),
            cycles,
            millis: BOOT,
        }
    }

    #[task(resources = [app, buttons, battery, debug_rx, sleep, cycles, millis], schedule = [poll])]
    fn poll(cx: poll::Context) {
        let resources = cx.resources;
        *resources.millis += timing::POLL_PERIOD;
        let sample = Sample {
            buttons: resources.buttons.levels(),
            battery: resources.battery.read(),
            serial: resources.debug_rx.read().ok(),
        };
        match resources.app.tick(*resources.millis, sample) {
            TickOutcome::Running => {
                let next = cx.scheduled + resources.cycles.to_cycles(timing::POLL_PERIOD);
                if cx.schedule.poll(next).is_err() {
                    error!("Could not reschedule poll");
                }
            }
            TickOutcome::PoweredDown => {
                resources.battery.sleep();
                resources.sleep.power_off();
            }
        }
    }

    extern "C" {
        fn COMP();
    }
};
