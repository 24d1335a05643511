fn main() {
    // Host-target builds (unit/integration tests) need no ESP-IDF sysenv.
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.contains("espidf") {
        embuild::espidf::sysenv::output();
    }
}
