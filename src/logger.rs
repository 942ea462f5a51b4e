use crate::vga_buffer::{Color, ColorCode, WRITER};
use core::fmt;

/// Step-by-step boot progress, mirrored to both the VGA console and the
/// serial port so a headless (serial-only) run sees the same markers a
/// person watching the screen would.
pub struct LOGGER;

impl LOGGER {
    pub fn failed(args: fmt::Arguments) {
        Self::tag("FAILED", Color::LightRed, args);
    }

    pub fn warn(args: fmt::Arguments) {
        Self::tag(" WARN ", Color::Yellow, args);
    }

    pub fn ok(args: fmt::Arguments) {
        Self::tag("  OK  ", Color::LightGreen, args);
    }

    fn tag(tag: &str, color: Color, args: fmt::Arguments) {
        use core::fmt::Write;

        {
            let mut writer = WRITER.lock();
            let default = ColorCode::new(Color::White, Color::Black);
            writer.write_str("[").unwrap();
            writer.set_color(ColorCode::new(color, Color::Black));
            writer.write_str(tag).unwrap();
            writer.set_color(default);
            writer.write_str("] ").unwrap();
            writer.write_fmt(args).unwrap();
            writer.write_str("\n").unwrap();
        }

        crate::serial_println!("[{}] {}", tag, args);
    }
}

#[macro_export]
macro_rules! log {
    ( $method:ident, $($arg:tt)* ) => {{
        use $crate::logger::LOGGER;
        LOGGER::$method(format_args!($($arg)*));
    }};
}
