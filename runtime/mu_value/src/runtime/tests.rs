use pretty_assertions::assert_eq;

use super::*;

#[test]
fn new_applies_config_and_preloads() {
    let Ok(rt) = Runtime::new(MemConfig::with_limit(1 << 20)) else {
        panic!("runtime failed to start");
    };
    assert_eq!(rt.config(), MemConfig::with_limit(1 << 20));
    assert_eq!(mu_mem::current_config(), rt.config());

    // Descriptors are cached, so reporting works with no memory left
    mu_mem::configure(MemConfig::with_limit(0));
    assert!(Error::ReadOnly.descriptor().is_ok());
    mu_mem::configure(MemConfig::default());
}

#[test]
fn start_fails_without_memory_for_descriptors() {
    let started = std::thread::spawn(|| {
        Runtime::new(MemConfig::with_limit(0)).map(|rt| rt.config())
    })
    .join()
    .ok();
    assert_eq!(started, Some(Err(Error::OutOfMemory)));
}

#[test]
fn stats_track_descriptor_storage() {
    let Ok(rt) = Runtime::new(MemConfig::default()) else {
        panic!("runtime failed to start");
    };
    let stats = rt.stats();
    assert!(stats.live_bytes > 0);
    assert_eq!(stats.allocations - stats.deallocations, 4);
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
