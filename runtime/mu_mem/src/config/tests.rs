use pretty_assertions::assert_eq;

use super::*;

#[test]
fn default_has_no_limit() {
    assert_eq!(MemConfig::default().limit, None);
    assert_eq!(current_config(), MemConfig::default());
}

#[test]
fn configure_is_thread_local() {
    configure(MemConfig::with_limit(1024));
    assert_eq!(current_config().limit, Some(1024));

    let other = std::thread::spawn(current_config).join();
    assert_eq!(other.ok(), Some(MemConfig::default()));
}

#[test]
fn configure_can_lift_limit() {
    configure(MemConfig::with_limit(1));
    configure(MemConfig::default());
    assert_eq!(limit(), None);
}
