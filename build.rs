fn main() {
    // Only the firmware image needs the ESP-IDF sysenv; host builds skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
