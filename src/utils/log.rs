// src/utils/log.rs

//! Console report helpers with server-style formatting.
//!
//! Output is gated on the `log` facade so `--verbose`/`RUST_LOG` filtering
//! applies to reports as well as to regular log records.

use chrono::Local;

fn enabled() -> bool {
    ::log::log_enabled!(::log::Level::Info)
}

/// Log a header
pub fn header(title: &str) {
    if enabled() {
        println!();
        println!("{}", "═".repeat(60));
        println!("  {}", title);
        println!("{}", "═".repeat(60));
    }
}

/// Log a success message
pub fn success(message: &str) {
    if enabled() {
        println!(
            "[{}] [INFO] ✓ {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
    }
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    if enabled() {
        println!("    {}", message);
    }
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled() {
        println!();
        println!("[{}] [SUMMARY] {}", Local::now().format("%H:%M:%S"), title);
        for (key, value) in items {
            println!("    {}: {}", key, value);
        }
    }
}
