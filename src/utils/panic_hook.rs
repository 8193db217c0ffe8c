use std::any::Any;
use std::panic;

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

/// Sets up a panic hook that routes unhandled failures into the log before
/// the default hook prints them.
pub fn set_custom_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let message = panic_message(panic_info.payload());
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        tracing::error!(%location, "[PANIC] {message}");

        original_hook(panic_info);
    }));
}

/// Call in main.rs once logging is up.
pub fn init() {
    set_custom_panic_hook();
    tracing::debug!("[PANIC_HOOK] Custom panic hook set up successfully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("db gone"));
        assert_eq!(panic_message(owned.as_ref()), "db gone");

        let borrowed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(borrowed.as_ref()), "static str");

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }
}
