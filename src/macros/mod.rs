pub mod print;
pub mod serial;

#[macro_export]
macro_rules! assert_called_once {
    // with args
    ( $fmt:expr, $($arg:tt)* ) => {{
        use core::sync::atomic::{AtomicBool, Ordering};
        static CALLED: AtomicBool = AtomicBool::new(false);

        if CALLED.swap(true, Ordering::SeqCst) {
            panic!($fmt, $($arg)*);
        }
    }};

    // without args
    ( $fmt:expr ) => {{
        assert_called_once!(concat!($fmt, "{}"), "");
    }};
}

/// Runs `$body` with interrupts disabled, restoring the previous flag
/// state (rather than unconditionally re-enabling) on the way out.
///
/// Every shared global this kernel touches from both task context and
/// an IRQ handler is written only from inside this macro.
#[macro_export]
macro_rules! without_interrupts {
    ( $body:expr ) => {{
        let were_enabled = $crate::interrupts::interrupts_enabled();
        if were_enabled {
            $crate::interrupts::disable_interrupts();
        }

        let result = $body;

        if were_enabled {
            $crate::interrupts::enable_interrupts();
        }

        result
    }};
}
