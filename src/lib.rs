#![cfg_attr(not(test), no_std)]

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use log::debug;

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod bus;
pub use bus::BlockBus;

pub mod frame;
pub use frame::{Opcode, RequestFrame, ResponseFrame};

use frame::{decode_response, encode_wire_request};

/// Firmware version reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u8,
    pub minor: u8,
}

/// Fine finger position, one 16-bit value per axis.
///
/// A zero sample is also what a corrupted reply decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSample {
    pub x: u16,
    pub y: u16,
}

/// Coarse touch state: the index of the pad being touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchState {
    pub pad: u8,
}

/// Outcome of a configuration write, as judged by the integrity of the device's echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWrite {
    /// The echo arrived intact.
    Accepted,
    /// The echo was malformed or failed its checksum.
    Failed,
}

impl ConfigWrite {
    /// Whether the echo validated.
    pub fn is_accepted(self) -> bool {
        self == ConfigWrite::Accepted
    }
}

/// Which query the polling loop issues while the interrupt line is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollQuery {
    Position,
    Touch,
}

/// A sample produced by one polling iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    Position(PositionSample),
    Touch(TouchState),
}

/// Represents a touchIt touch sensor.
///
/// The driver owns the bus for its whole lifetime and every transaction borrows the
/// driver mutably, so at most one request/reply exchange is in flight at a time.
///
/// # Type Parameters
///
/// * `Bus`: The bus used to reach the device. Any `embedded_hal_async::i2c::I2c`
///   master qualifies through the blanket `BlockBus` implementation.
/// * `Delay`: Provides the settle delay between a write and its read.
pub struct TouchIt<Bus, Delay> {
    bus: Bus,
    delay: Delay,
    config: Config,
}

impl<B, D> TouchIt<B, D>
where
    B: BlockBus,
    D: DelayNs,
{
    /// Creates a new `TouchIt` instance.
    ///
    /// # Arguments
    ///
    /// * `bus`: The bus the device is attached to.
    /// * `delay`: The delay provider used for the settle delay.
    /// * `config`: The initial configuration, including the device address.
    pub fn new(bus: B, delay: D, config: Config) -> Self {
        Self { bus, delay, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The address transactions are currently sent to.
    pub fn address(&self) -> DeviceAddress {
        self.config.address
    }

    /// Points the driver at a device that already answers at `address`.
    ///
    /// No command is sent.
    pub fn set_target_address(&mut self, address: DeviceAddress) {
        self.config.address = address;
    }

    /// Releases the bus and the delay provider.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Runs the start-up sequence: read the firmware version, then select the
    /// events that assert the interrupt line.
    pub async fn init(
        &mut self,
        flags: ConfigFlags,
    ) -> Result<(Option<VersionInfo>, ConfigWrite), Error<B::Error>> {
        let version = self.get_version().await?;
        match version {
            Some(v) => debug!("touchIt firmware version {}.{}", v.major, v.minor),
            None => debug!("touchIt firmware version unavailable"),
        }

        let outcome = self.set_config(flags).await?;
        debug!("touchIt init sequence complete, config {:?}", outcome);
        Ok((version, outcome))
    }

    /// Retrieves the firmware version of the device.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VersionInfo))` when the reply is a valid frame.
    /// * `Ok(None)` when the reply is malformed; it is discarded.
    /// * `Err(Error::Bus)` if the bus failed.
    pub async fn get_version(&mut self) -> Result<Option<VersionInfo>, Error<B::Error>> {
        match self.transact(Opcode::GetVersion, &[]).await {
            Ok(frame) => {
                let version = VersionInfo {
                    major: frame.payload[0],
                    minor: frame.payload[1],
                };
                debug!("Firmware version: {}.{}", version.major, version.minor);
                Ok(Some(version))
            }
            Err(Error::Frame(e)) => {
                log::warn!("Discarding version reply: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Selects which events assert the interrupt line.
    ///
    /// The device does not accept or reject a configuration; it only echoes it back.
    /// The write is reported as failed whenever that echo is not a valid frame.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigWrite::Accepted)` if the echo validated.
    /// * `Ok(ConfigWrite::Failed)` if the echo was malformed.
    /// * `Err(Error::Bus)` if the bus failed.
    pub async fn set_config(&mut self, flags: ConfigFlags) -> Result<ConfigWrite, Error<B::Error>> {
        debug!("Setting interrupt config to {:#04X}", flags.bits());
        match self.transact(Opcode::SetConfig, &[flags.bits()]).await {
            Ok(_) => {
                debug!("Config write OK");
                Ok(ConfigWrite::Accepted)
            }
            Err(Error::Frame(e)) => {
                log::warn!("Config write failed: {}", e);
                Ok(ConfigWrite::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Changes the bus address of the device.
    ///
    /// The command is sent to the current address. The device never confirms the
    /// change, so once the write succeeds the driver targets `new_address` from then on.
    ///
    /// # Returns
    ///
    /// * `Ok(())` once the command was written.
    /// * `Err(Error::InvalidArgument)` if `new_address` is outside `1..=127`. Nothing is sent.
    /// * `Err(Error::Bus)` if the write failed.
    pub async fn set_address(&mut self, new_address: u8) -> Result<(), Error<B::Error>> {
        let new_address = DeviceAddress::new(new_address).map_err(|e| {
            log::error!("Address {:#04X} out of range (1-127)", new_address);
            e
        })?;

        debug!(
            "Changing address from {:#04X} to {:#04X}",
            self.config.address.get(),
            new_address.get()
        );
        self.send(Opcode::SetAddress, &[new_address.get()]).await?;
        self.config.address = new_address;
        Ok(())
    }

    /// Reads the fine finger position.
    ///
    /// A malformed reply yields a zero sample rather than an error.
    pub async fn get_position(&mut self) -> Result<PositionSample, Error<B::Error>> {
        match self.transact(Opcode::GetPosition, &[]).await {
            Ok(frame) => {
                let p = &frame.payload;
                let sample = PositionSample {
                    x: u16::from_be_bytes([p[0], p[1]]),
                    y: u16::from_be_bytes([p[2], p[3]]),
                };
                debug!("Position x: {} y: {}", sample.x, sample.y);
                Ok(sample)
            }
            Err(Error::Frame(e)) => {
                log::warn!("Zero-filling position after bad reply: {}", e);
                Ok(PositionSample::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Reads the coarse touch state.
    ///
    /// A malformed reply yields pad zero rather than an error.
    pub async fn get_touch(&mut self) -> Result<TouchState, Error<B::Error>> {
        match self.transact(Opcode::GetTouch, &[]).await {
            Ok(frame) => {
                let state = TouchState {
                    pad: frame.payload[0],
                };
                debug!("Touch pad: {}", state.pad);
                Ok(state)
            }
            Err(Error::Frame(e)) => {
                log::warn!("Zero-filling touch state after bad reply: {}", e);
                Ok(TouchState::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs one polling iteration.
    ///
    /// The interrupt line is active low. While it is high nothing is sent and
    /// `Ok(None)` is returned.
    pub async fn poll_once<P>(
        &mut self,
        pin: &mut P,
        query: PollQuery,
    ) -> Result<Option<PollEvent>, Error<B::Error>>
    where
        P: InputPin,
    {
        let active = pin.is_low().map_err(|e| {
            log::error!("Failed to read interrupt line: {:?}", e);
            Error::InterruptLine
        })?;
        if !active {
            return Ok(None);
        }

        let event = match query {
            PollQuery::Position => PollEvent::Position(self.get_position().await?),
            PollQuery::Touch => PollEvent::Touch(self.get_touch().await?),
        };
        Ok(Some(event))
    }

    /// Polls the interrupt line forever, handing each sample or failure to `sink`.
    ///
    /// There is no debouncing: the query is repeated on every iteration for as long as
    /// the line stays low. Only a failure to read the line ends the loop, and that
    /// error is returned.
    pub async fn run<P, F>(&mut self, pin: &mut P, query: PollQuery, mut sink: F) -> Error<B::Error>
    where
        P: InputPin,
        F: FnMut(Result<PollEvent, Error<B::Error>>),
    {
        debug!("Polling interrupt line for {:?}", query);
        loop {
            match self.poll_once(pin, query).await {
                Ok(Some(event)) => sink(Ok(event)),
                Ok(None) => {}
                Err(Error::InterruptLine) => return Error::InterruptLine,
                Err(e) => sink(Err(e)),
            }
        }
    }

    // Writes one request and waits out the settle delay when the command needs it.
    async fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), Error<B::Error>> {
        let (register, block) = encode_wire_request(opcode, payload)?;
        let address = self.config.address.get();

        debug!(
            "Executing {:?} at {:#04X}: {:02X} {:02X?}",
            opcode, address, register, &block[..]
        );
        self.bus
            .write_block(address, register, &block)
            .await
            .map_err(Error::Bus)?;

        if self.settles(opcode) {
            self.delay.delay_ms(self.config.settle_delay_ms).await;
        }
        Ok(())
    }

    // One full exchange: write, settle, read the fixed-length reply, validate it.
    async fn transact(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<ResponseFrame, Error<B::Error>> {
        let expected = opcode.response_len().ok_or(Error::InvalidArgument)?;
        self.send(opcode, payload).await?;

        let mut buffer = [0u8; MAX_RESPONSE_LEN];
        let reply = buffer
            .get_mut(..FRAME_OVERHEAD + expected)
            .ok_or(Error::Frame(FrameError::PayloadTooLarge))?;
        let address = self.config.address.get();
        self.bus
            .read_block(address, READ_REGISTER, reply)
            .await
            .map_err(Error::Bus)?;

        debug!("Reply to {:?}: {:02X?}", opcode, reply);
        Ok(decode_response(reply, expected)?)
    }

    fn settles(&self, opcode: Opcode) -> bool {
        opcode.settles()
            || (self.config.settle_on_poll
                && matches!(opcode, Opcode::GetPosition | Opcode::GetTouch))
    }
}
