//! Block transport used to exchange frames with the device.

use embedded_hal_async::i2c::{I2c, Operation, SevenBitAddress};

/// A bus able to write and read register-addressed blocks.
///
/// The touchIt firmware has no real registers: the register slot of a write carries
/// the request marker, and reads always select register zero.
#[allow(async_fn_in_trait)]
pub trait BlockBus {
    /// Error type of the underlying transport.
    type Error: core::fmt::Debug;

    /// Write `register` followed by `bytes` to the device at `address`.
    async fn write_block(
        &mut self,
        address: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), Self::Error>;

    /// Select `register`, then fill `buf` from the device at `address`.
    async fn read_block(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<I> BlockBus for I
where
    I: I2c<SevenBitAddress>,
{
    type Error = I::Error;

    // Adjacent write operations go out as one write, with no restart in between.
    async fn write_block(
        &mut self,
        address: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), Self::Error> {
        let register = [register];
        self.transaction(
            address,
            &mut [Operation::Write(&register), Operation::Write(bytes)],
        )
        .await
    }

    async fn read_block(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.write_read(address, &[register], buf).await
    }
}
