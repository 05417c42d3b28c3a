use dlq_logging::{poll_cycle, set_poll_cycle};

#[test]
fn poll_cycle_defaults_to_zero() {
    assert_eq!(poll_cycle(), 0);
}

#[test]
fn poll_cycle_is_per_thread() {
    set_poll_cycle(42);
    assert_eq!(poll_cycle(), 42);

    let other = std::thread::spawn(poll_cycle).join().unwrap();
    assert_eq!(other, 0);
    assert_eq!(poll_cycle(), 42);
}

#[test]
fn test_initializer_can_be_called_twice() {
    dlq_logging::initialize_for_tests();
    dlq_logging::initialize_for_tests();
    dlq_logging::dlq_debug!("still alive after {} inits", 2);
}
