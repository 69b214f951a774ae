//! Bus addresses and GPIO assignments for the GasWatch board.
//!
//! Every driver references this module rather than hard-coding addresses or
//! pin numbers.

// ---------------------------------------------------------------------------
// Sensor bus (I²C, 100 kHz)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_BAUDRATE_HZ: u32 = 100_000;

/// Multi-gas board, NH3 cell. Address set by the board's DIP switches.
pub const NH3_I2C_ADDR: u8 = 0x75;
/// Multi-gas board, CO cell.
pub const CO_I2C_ADDR: u8 = 0x76;
/// Multi-gas board, O2 cell.
pub const O2_I2C_ADDR: u8 = 0x77;

// ---------------------------------------------------------------------------
// Alert outputs (active HIGH)
// ---------------------------------------------------------------------------

/// Green "all clear" LED.
pub const OK_LED_GPIO: i32 = 4;
/// Red per-gas LEDs.
pub const NH3_LED_GPIO: i32 = 5;
pub const CO_LED_GPIO: i32 = 6;
pub const O2_LED_GPIO: i32 = 7;
/// Active buzzer.
pub const BUZZER_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Acknowledge button
// ---------------------------------------------------------------------------

/// Momentary switch to GND, internal pull-up. LOW = pressed.
pub const ACK_BUTTON_GPIO: i32 = 16;
