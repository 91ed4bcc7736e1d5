use crate::hal::hal as embedded_hal;
use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, info};
use mfrc522::{Mfrc522, Uid};
use rfid_jukebox::peripherals::{Block, CardTransport, TransportError};

/// Data block of sector 1.
const DATA_BLOCK: u8 = 4;
/// Factory default key A.
const KEY: [u8; 6] = [0xff; 6];

/// MFRC522 on SPI. The NRSTPD line hard powers the chip down.
pub struct CardReader<SPI, NSS, RST> {
    device: Mfrc522<SPI, NSS>,
    reset: RST,
    uid: Option<Uid>,
}

impl<E, SPI, NSS, RST> CardReader<SPI, NSS, RST>
where
    E: core::fmt::Debug,
    SPI: spi::Transfer<u8, Error = E> + spi::Write<u8, Error = E>,
    NSS: OutputPin,
    RST: OutputPin,
{
    pub fn new(device: Mfrc522<SPI, NSS>, reset: RST) -> Self {
        Self {
            device,
            reset,
            uid: None,
        }
    }

    fn with_authenticated<T>(
        &mut self,
        op: impl FnOnce(&mut Mfrc522<SPI, NSS>) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let uid = self.uid.as_ref().ok_or(TransportError::NoCard)?;
        self.device
            .mf_authenticate(uid, DATA_BLOCK, &KEY)
            .map_err(|e| {
                debug!("Authentication failed: {:?}", e);
                TransportError::Authentication
            })?;
        let result = op(&mut self.device);
        self.device.stop_crypto1().ok();
        result
    }
}

impl<E, SPI, NSS, RST> CardTransport for CardReader<SPI, NSS, RST>
where
    E: core::fmt::Debug,
    SPI: spi::Transfer<u8, Error = E> + spi::Write<u8, Error = E>,
    NSS: OutputPin,
    RST: OutputPin,
{
    fn card_present(&mut self) -> bool {
        // a card staying on the reader answers the second request only after a retry
        self.uid = self
            .device
            .reqa()
            .or_else(|_| self.device.reqa())
            .ok()
            .and_then(|atqa| self.device.select(&atqa).ok());
        self.uid.is_some()
    }

    fn read_block(&mut self) -> Result<Block, TransportError> {
        self.with_authenticated(|device| device.mf_read(DATA_BLOCK).map_err(|_| TransportError::Read))
    }

    fn write_block(&mut self, block: &Block) -> Result<(), TransportError> {
        self.with_authenticated(|device| device.mf_write(DATA_BLOCK, *block).map_err(|_| TransportError::Write))
    }

    fn power_down(&mut self) {
        info!("Card reader off");
        self.uid = None;
        self.reset.set_low().ok();
    }
}
