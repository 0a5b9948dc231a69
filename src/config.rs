use core::ops::{BitOr, BitOrAssign};

use crate::constants::{DEFAULT_ADDRESS, MAX_ADDRESS, MIN_ADDRESS, SETTLE_DELAY_MS};
use crate::error::InvalidArgument;

/// Represents the 7-bit bus address of the touchIt device.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Creates a new `DeviceAddress`.
    ///
    /// # Arguments
    ///
    /// * `address` - The 7-bit address, in `1..=127`.
    ///
    /// # Returns
    ///
    /// * `Ok(DeviceAddress)` if the address is in range.
    /// * `Err(InvalidArgument)` otherwise.
    pub fn new(address: u8) -> Result<DeviceAddress, InvalidArgument> {
        if (MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
            Ok(DeviceAddress(address))
        } else {
            Err(InvalidArgument)
        }
    }

    /// Returns the raw 7-bit address.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for DeviceAddress {
    /// Returns the factory address, `0x70`.
    fn default() -> DeviceAddress {
        DeviceAddress(DEFAULT_ADDRESS)
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = InvalidArgument;

    fn try_from(address: u8) -> Result<Self, Self::Error> {
        DeviceAddress::new(address)
    }
}

impl From<DeviceAddress> for u8 {
    fn from(address: DeviceAddress) -> Self {
        address.0
    }
}

/// Selects which events assert the interrupt line.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct ConfigFlags(u8);

impl ConfigFlags {
    /// Movement along the X axis.
    pub const X_MOVE: ConfigFlags = ConfigFlags(0x01);
    /// Movement along the Y axis.
    pub const Y_MOVE: ConfigFlags = ConfigFlags(0x02);
    /// Movement between touch pads.
    pub const T_MOVE: ConfigFlags = ConfigFlags(0x04);
    /// A tap.
    pub const TAP: ConfigFlags = ConfigFlags(0x08);

    /// Fine X/Y tracking, for use with position queries.
    pub const POSITION: ConfigFlags = ConfigFlags(0x01 | 0x02);
    /// Coarse pad tracking, for use with touch queries.
    pub const TOUCH: ConfigFlags = ConfigFlags::T_MOVE;

    const ALL: u8 = 0x0F;

    /// No events assert the interrupt line.
    pub const fn empty() -> ConfigFlags {
        ConfigFlags(0)
    }

    /// Builds flags from raw bits, dropping any the device does not define.
    pub const fn from_bits_truncate(bits: u8) -> ConfigFlags {
        ConfigFlags(bits & Self::ALL)
    }

    /// The raw flags byte sent with the set config command.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: ConfigFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ConfigFlags {
    type Output = ConfigFlags;

    fn bitor(self, rhs: ConfigFlags) -> ConfigFlags {
        ConfigFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConfigFlags {
    fn bitor_assign(&mut self, rhs: ConfigFlags) {
        self.0 |= rhs.0;
    }
}

/// Configuration settings for the touchIt driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Config {
    /// The address the device currently answers at.
    pub address: DeviceAddress,
    /// Wait between a write and the following read, in milliseconds.
    pub settle_delay_ms: u32,
    /// Whether position and touch queries also wait before reading.
    pub settle_on_poll: bool,
}

impl Config {
    /// Creates a new `Config` instance.
    ///
    /// # Arguments
    ///
    /// * `address` - The `DeviceAddress` of the device.
    /// * `settle_delay_ms` - The settle delay in milliseconds.
    ///
    /// # Returns
    ///
    /// A new `Config` with the settle delay skipped on the polling path.
    pub fn new(address: DeviceAddress, settle_delay_ms: u32) -> Config {
        Config {
            address,
            settle_delay_ms,
            settle_on_poll: false,
        }
    }

    /// Sets the device address for the configuration.
    pub fn address(mut self, address: DeviceAddress) -> Self {
        self.address = address;
        self
    }

    /// Sets the settle delay for the configuration.
    pub fn settle_delay_ms(mut self, settle_delay_ms: u32) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }

    /// Enables or disables the settle delay before position and touch reads.
    pub fn settle_on_poll(mut self, settle_on_poll: bool) -> Self {
        self.settle_on_poll = settle_on_poll;
        self
    }
}

/// Provides default configuration values for the touchIt device.
impl Default for Config {
    /// Returns the default configuration.
    ///
    /// The default configuration targets address `0x70` with a 600 ms settle delay,
    /// skipped on the polling path.
    fn default() -> Config {
        Config::new(DeviceAddress::default(), SETTLE_DELAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_range() {
        assert_eq!(DeviceAddress::new(0), Err(InvalidArgument));
        assert_eq!(DeviceAddress::new(128), Err(InvalidArgument));
        assert_eq!(DeviceAddress::new(1).map(DeviceAddress::get), Ok(1));
        assert_eq!(DeviceAddress::new(127).map(DeviceAddress::get), Ok(127));
        assert_eq!(DeviceAddress::default().get(), 0x70);
    }

    #[test]
    fn flags_combine() {
        let flags = ConfigFlags::X_MOVE | ConfigFlags::Y_MOVE;
        assert_eq!(flags, ConfigFlags::POSITION);
        assert_eq!(flags.bits(), 0x03);
        assert!(flags.contains(ConfigFlags::X_MOVE));
        assert!(!flags.contains(ConfigFlags::TAP));

        let mut flags = ConfigFlags::empty();
        assert!(flags.is_empty());
        flags |= ConfigFlags::TAP;
        assert_eq!(flags.bits(), 0x08);
        assert_eq!(ConfigFlags::from_bits_truncate(0xFF).bits(), 0x0F);
    }

    #[test]
    fn config_builder() {
        let config = Config::default();
        assert_eq!(config.address.get(), 0x70);
        assert_eq!(config.settle_delay_ms, 600);
        assert!(!config.settle_on_poll);

        let config = config
            .address(DeviceAddress::new(0x72).unwrap())
            .settle_delay_ms(0)
            .settle_on_poll(true);
        assert_eq!(config.address.get(), 0x72);
        assert_eq!(config.settle_delay_ms, 0);
        assert!(config.settle_on_poll);
    }
}
