#[macro_export]
macro_rules! println {
    ( $fmt:expr, $($arg:tt)* ) => {{ $crate::print!(concat!($fmt, "\n"), $($arg)*) }};
    ( $fmt:expr ) => {{ $crate::print!(concat!($fmt, "\n")) }};
    () => {{ $crate::print!("\n") }};
}

#[macro_export]
macro_rules! print {
    ( $fmt:expr, $($arg:tt)* ) => {{
        use core::fmt::Write;
        $crate::vga_buffer::WRITER.lock().write_fmt(format_args!($fmt, $($arg)*)).unwrap();
    }};

    ( $fmt:expr ) => {{
        use core::fmt::Write;
        $crate::vga_buffer::WRITER.lock().write_fmt(format_args!($fmt)).unwrap();
    }};
}
