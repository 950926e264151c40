fn main() {
    // ESP-IDF link arguments are only needed for the firmware build.
    // Host-side `cargo test` runs without the espidf feature.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
