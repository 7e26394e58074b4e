use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use muxadc_hardware::error::HwError;
use muxadc_hardware::util::wait_while_busy;

#[test]
fn wait_while_busy_success_path() {
    let busy = Arc::new(AtomicBool::new(true));
    let busy_bg = busy.clone();
    // Conversion finishes after a short delay
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        busy_bg.store(false, Ordering::Relaxed);
    });

    let res = wait_while_busy(
        || busy.load(Ordering::Relaxed),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}

#[test]
fn wait_while_busy_timeout_path() {
    let busy = Arc::new(AtomicBool::new(true));

    let err = wait_while_busy(
        || busy.load(Ordering::Relaxed),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::Timeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}
