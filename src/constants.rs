// REQUEST_MARKER is the byte that opens every frame sent to the device. On the wire it
// travels in the transport's register-select slot rather than inside the data block.
pub const REQUEST_MARKER: u8 = b'#';

// RESPONSE_MARKER is the byte that opens every reply frame received from the device.
pub const RESPONSE_MARKER: u8 = b'$';

// DEFAULT_ADDRESS is the 7-bit bus address the device ships with.
pub const DEFAULT_ADDRESS: u8 = 0x70;

// MIN_ADDRESS and MAX_ADDRESS bound the addresses accepted by the set address command.
pub const MIN_ADDRESS: u8 = 1;
pub const MAX_ADDRESS: u8 = 127;

// SETTLE_DELAY_MS is how long the firmware needs after a write before its reply can be read.
pub const SETTLE_DELAY_MS: u32 = 600;

// FRAME_OVERHEAD is marker + opcode + length + checksum.
pub const FRAME_OVERHEAD: usize = 4;

// MAX_REQUEST_PAYLOAD is the largest payload any command carries.
pub const MAX_REQUEST_PAYLOAD: usize = 1;

// MAX_RESPONSE_PAYLOAD bounds the payload buffer of a decoded reply.
pub const MAX_RESPONSE_PAYLOAD: usize = 8;

// MAX_RESPONSE_LEN is the longest reply frame that can be read in one transaction.
pub const MAX_RESPONSE_LEN: usize = FRAME_OVERHEAD + MAX_RESPONSE_PAYLOAD;

// READ_REGISTER is the register byte sent ahead of every reply read. The device has no
// sub-addressing, so it is always zero.
pub const READ_REGISTER: u8 = 0x00;

// MAX_REQUEST_LEN is the longest request frame, marker included.
pub const MAX_REQUEST_LEN: usize = FRAME_OVERHEAD + MAX_REQUEST_PAYLOAD;

// MAX_BLOCK_LEN is the longest request data block once the marker moves to the register slot.
pub const MAX_BLOCK_LEN: usize = MAX_REQUEST_LEN - 1;
