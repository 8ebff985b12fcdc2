//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `weekpark_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("weekpark_core ping={}", weekpark_core::ping());
    println!("weekpark_core version={}", weekpark_core::core_version());
}
