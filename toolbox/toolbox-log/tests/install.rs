use log::LevelFilter;
use toolbox_log::HostLogger;
use toolbox_port::host::{interrupts_disable, interrupts_restore};

#[test]
fn installs_once_and_carries_port_logs() {
    assert!(HostLogger::new(LevelFilter::Trace).init().is_ok());
    assert_eq!(log::max_level(), LevelFilter::Trace);

    // a second logger is refused
    assert!(HostLogger::new(LevelFilter::Info).init().is_err());

    // port transitions now go through the installed logger
    let status = interrupts_disable();
    interrupts_restore(status);
}
