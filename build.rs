fn main() {
    // No-op on host targets; emits the ESP-IDF link/env plumbing when the
    // espidf toolchain environment is present.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
