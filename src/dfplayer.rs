//! Serial MP3 decoder module (DFPlayer Mini protocol).
//!
//! Frames are `7E FF 06 cmd feedback hi lo chk_hi chk_lo EF`, the checksum
//! being the two's complement of the sum of bytes 1 to 6. Replies and
//! notifications use the same framing.

use crate::hal::hal as embedded_hal;
use embedded_hal::digital::v2::InputPin;
use embedded_hal::serial::{Read, Write};
use heapless::Deque;
use log::{debug, warn};
use rfid_jukebox::peripherals::{DecoderModule, Equalizer, Notification};

const START: u8 = 0x7e;
const VERSION: u8 = 0xff;
const LENGTH: u8 = 0x06;
const END: u8 = 0xef;
const FRAME_SIZE: usize = 10;

const CMD_INCREASE_VOLUME: u8 = 0x04;
const CMD_DECREASE_VOLUME: u8 = 0x05;
const CMD_SET_VOLUME: u8 = 0x06;
const CMD_SET_EQUALIZER: u8 = 0x07;
const CMD_RESUME: u8 = 0x0d;
const CMD_PAUSE: u8 = 0x0e;
const CMD_PLAY_FOLDER_TRACK: u8 = 0x0f;
const CMD_PLAY_MP3_FOLDER_TRACK: u8 = 0x12;
const CMD_STOP: u8 = 0x16;
const CMD_QUERY_FOLDER_TRACKS: u8 = 0x4e;

const REPLY_SD_TRACK_FINISHED: u8 = 0x3d;
const REPLY_ERROR: u8 = 0x40;

/// Reads polled while waiting for a query reply.
const QUERY_ATTEMPTS: u32 = 200_000;

fn frame(command: u8, argument: u16) -> [u8; FRAME_SIZE] {
    let [hi, lo] = argument.to_be_bytes();
    let mut frame = [START, VERSION, LENGTH, command, 0x00, hi, lo, 0, 0, END];
    let sum = frame[1..7].iter().fold(0u16, |sum, byte| sum.wrapping_add(u16::from(*byte)));
    let [chk_hi, chk_lo] = 0u16.wrapping_sub(sum).to_be_bytes();
    frame[7] = chk_hi;
    frame[8] = chk_lo;
    frame
}

/// Collects incoming bytes into frames.
struct FrameReader {
    buffer: [u8; FRAME_SIZE],
    len: usize,
}

impl FrameReader {
    const fn new() -> Self {
        Self {
            buffer: [0; FRAME_SIZE],
            len: 0,
        }
    }

    /// Returns `(command, argument)` once a complete frame has arrived.
    fn push(&mut self, byte: u8) -> Option<(u8, u16)> {
        if self.len == 0 && byte != START {
            return None;
        }
        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len < FRAME_SIZE {
            return None;
        }
        self.len = 0;
        if self.buffer[9] != END {
            warn!("Dropping malformed frame {}", rfid_jukebox::hex::Hex(&self.buffer));
            return None;
        }
        Some((self.buffer[3], u16::from_be_bytes([self.buffer[5], self.buffer[6]])))
    }
}

pub struct DfPlayer<TX, RX, BUSY> {
    tx: TX,
    rx: RX,
    busy: BUSY,
    reader: FrameReader,
    notifications: Deque<Notification, 4>,
}

impl<TX, RX, BUSY> DfPlayer<TX, RX, BUSY>
where
    TX: Write<u8>,
    RX: Read<u8>,
    BUSY: InputPin,
{
    pub fn new(tx: TX, rx: RX, busy: BUSY) -> Self {
        Self {
            tx,
            rx,
            busy,
            reader: FrameReader::new(),
            notifications: Deque::new(),
        }
    }

    fn send(&mut self, command: u8, argument: u16) {
        debug!("DFPlayer cmd {:x} arg {}", command, argument);
        for byte in frame(command, argument).iter() {
            if nb::block!(self.tx.write(*byte)).is_err() {
                warn!("DFPlayer write failed");
                return;
            }
        }
        nb::block!(self.tx.flush()).ok();
    }

    /// Handles one received frame. Returns it when it is not a notification.
    fn dispatch(&mut self, command: u8, argument: u16) -> Option<(u8, u16)> {
        let notification = match command {
            REPLY_SD_TRACK_FINISHED => Notification::TrackFinished(argument),
            REPLY_ERROR => Notification::Error(argument as u8),
            _ => return Some((command, argument)),
        };
        if self.notifications.push_back(notification).is_err() {
            warn!("Dropping notification {:?}", notification);
        }
        None
    }

    fn receive(&mut self) -> Option<(u8, u16)> {
        let byte = self.rx.read().ok()?;
        let (command, argument) = self.reader.push(byte)?;
        self.dispatch(command, argument)
    }

    fn query(&mut self, command: u8, argument: u16) -> Option<u16> {
        self.send(command, argument);
        for _ in 0..QUERY_ATTEMPTS {
            if let Some((reply, value)) = self.receive() {
                if reply == command {
                    return Some(value);
                }
            }
        }
        warn!("No reply to DFPlayer query {:x}", command);
        None
    }
}

impl<TX, RX, BUSY> DecoderModule for DfPlayer<TX, RX, BUSY>
where
    TX: Write<u8>,
    RX: Read<u8>,
    BUSY: InputPin,
{
    fn play_folder_track(&mut self, folder: u8, track: u8) {
        self.send(CMD_PLAY_FOLDER_TRACK, u16::from_be_bytes([folder, track]));
    }

    fn pause(&mut self) {
        self.send(CMD_PAUSE, 0);
    }

    fn resume(&mut self) {
        self.send(CMD_RESUME, 0);
    }

    fn stop(&mut self) {
        self.send(CMD_STOP, 0);
    }

    fn set_volume(&mut self, volume: u8) {
        self.send(CMD_SET_VOLUME, volume.into());
    }

    fn increase_volume(&mut self) {
        self.send(CMD_INCREASE_VOLUME, 0);
    }

    fn decrease_volume(&mut self) {
        self.send(CMD_DECREASE_VOLUME, 0);
    }

    fn set_equalizer(&mut self, equalizer: Equalizer) {
        self.send(CMD_SET_EQUALIZER, equalizer as u16);
    }

    fn folder_track_count(&mut self, folder: u8) -> u16 {
        self.query(CMD_QUERY_FOLDER_TRACKS, folder.into()).unwrap_or(0)
    }

    fn play_announcement(&mut self, track: u16) {
        self.send(CMD_PLAY_MP3_FOLDER_TRACK, track);
    }

    /// The busy line is pulled low while a track plays.
    fn is_playing(&mut self) -> bool {
        self.busy.is_low().unwrap_or(false)
    }

    fn poll_notification(&mut self) -> Option<Notification> {
        while let Ok(byte) = self.rx.read() {
            if let Some((command, argument)) = self.reader.push(byte) {
                if let Some((command, _)) = self.dispatch(command, argument) {
                    debug!("Ignoring DFPlayer reply {:x}", command);
                }
            }
        }
        self.notifications.pop_front()
    }
}
