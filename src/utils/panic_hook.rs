use leptos::logging::log;
use std::panic;

/// Sets up a custom panic hook that provides more context for Leptos
/// owner disposal panics in the hydrated client.
pub fn set_custom_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        // Call the original hook first
        original_hook(panic_info);

        // Extract panic message
        let message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic".to_string()
        };

        if message.contains("OwnerDisposed") {
            log!("[PANIC] Leptos owner disposal detected. This usually happens when:");
            log!("[PANIC] 1. A component has been unmounted but something is still calling into it");
            log!("[PANIC] 2. An effect or signal update is running after the component is gone");
        }
    }));
}

/// Call from the hydrate entry point.
pub fn init() {
    set_custom_panic_hook();
}
