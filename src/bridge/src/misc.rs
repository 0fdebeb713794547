use log::error;
use std::panic;
use std::sync::Once;

/// Route Rust panics into logcat; unwinding stops at the JNI boundary.
pub fn inject_panic_handler() {
    static INSTALLED: Once = Once::new();

    INSTALLED.call_once(|| {
        let original = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            error!("panic in hook body: {info}");
            original(info);
        }))
    });
}
