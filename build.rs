fn main() {
    // ESP-IDF environment propagation is only needed for flash builds;
    // host builds (tests, simulation) compile without the toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
