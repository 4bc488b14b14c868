mod common;

use common::{monitor_for, setup_test_fixture};
use fixity_lib::index::scanner::ProgressCallback;
use fixity_lib::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_adds_lose_no_updates() {
    let fx = setup_test_fixture().unwrap();
    let paths: Vec<_> = (0..8)
        .map(|i| fx.write(&format!("host{}.conf", i), format!("node {}", i).as_bytes()))
        .collect();

    thread::scope(|s| {
        for path in &paths {
            let monitor = fx.second_monitor();
            s.spawn(move || monitor.add(path, Algorithm::Sha256).unwrap());
        }
    });

    let store = fx.monitor.load().unwrap();
    assert_eq!(store.len(), paths.len());
    for path in &paths {
        assert_eq!(store.get(path).unwrap().status, Status::New);
    }
}

#[test]
fn test_scans_racing_with_adds() {
    let fx = setup_test_fixture().unwrap();
    let initial: Vec<_> = (0..4)
        .map(|i| fx.write(&format!("base{}", i), b"base"))
        .collect();
    for path in &initial {
        fx.monitor.add(path, Algorithm::Md5).unwrap();
    }

    thread::scope(|s| {
        let scanner = fx.second_monitor();
        let root = fx.path("");
        s.spawn(move || {
            for _ in 0..5 {
                scanner.scan(&root, &ScanOptions::default(), None).unwrap();
            }
        });

        for i in 0..4 {
            let adder = fx.second_monitor();
            let path = fx.write(&format!("late{}", i), b"late");
            s.spawn(move || adder.add(&path, Algorithm::Md5).unwrap());
        }
    });

    let store = fx.monitor.load().unwrap();
    assert_eq!(store.len(), 8);
    for path in &initial {
        assert_eq!(store.get(path).unwrap().status, Status::Unchanged);
    }
}

#[test]
fn test_lock_timeout_reports_busy() {
    let fx = setup_test_fixture().unwrap();
    let path = fx.write("passwd", b"root:x:0:0");
    let impatient = fx
        .second_monitor()
        .lock_timeout(Duration::from_millis(100));

    let held = fx.monitor.snapshot().lock(Duration::from_secs(1)).unwrap();
    let err = impatient.add(&path, Algorithm::Sha256).unwrap_err();
    assert!(matches!(err, FixityError::StoreBusy { .. }));
    assert!(err.is_retryable());

    // Readers are never blocked by the writer lock.
    assert_eq!(impatient.report().unwrap().counts.total, 0);

    drop(held);
    impatient.add(&path, Algorithm::Sha256).unwrap();
    assert_eq!(fx.monitor.load().unwrap().len(), 1);
}

#[test]
fn test_blocked_writer_waits_for_release() {
    let fx = setup_test_fixture().unwrap();
    let path = fx.write("group", b"wheel:x:10:");
    let waiting = monitor_for(&fx.store_path);

    let held = fx.monitor.snapshot().lock(Duration::from_secs(1)).unwrap();
    thread::scope(|s| {
        let handle = s.spawn(|| waiting.add(&path, Algorithm::Sha1));
        thread::sleep(Duration::from_millis(150));
        drop(held);
        handle.join().unwrap().unwrap();
    });

    assert!(fx.monitor.load().unwrap().contains(&path));
}

#[test]
fn test_cancelled_scan_commits_partial_results() {
    let fx = setup_test_fixture().unwrap();
    let paths: Vec<_> = (0..6)
        .map(|i| fx.write(&format!("f{}", i), format!("{}", i).as_bytes()))
        .collect();
    for path in &paths {
        fx.monitor.add(path, Algorithm::Sha256).unwrap();
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let options = ScanOptions {
        cancel: Some(cancel.clone()),
        ..Default::default()
    };
    let on_verdict: ProgressCallback<'_> = &|_| cancel.store(true, Ordering::SeqCst);

    let outcome = fx
        .monitor
        .clone()
        .workers(1)
        .scan(&fx.path(""), &options, Some(on_verdict))
        .unwrap();

    assert!(outcome.cancelled());
    assert_eq!(outcome.evaluations.len(), 1);
    assert_eq!(outcome.skipped, paths.len() - 1);

    let checked = &outcome.evaluations[0].verdict.path;
    let store = fx.monitor.load().unwrap();
    assert_eq!(store.len(), paths.len());
    for record in store.all() {
        let expected = if &record.path == checked {
            Status::Unchanged
        } else {
            Status::New
        };
        assert_eq!(record.status, expected);
    }
}

#[test]
fn test_cancelled_refresh_is_an_error() {
    let fx = setup_test_fixture().unwrap();
    let path = fx.write("motd", b"welcome");
    fx.monitor.add(&path, Algorithm::Sha256).unwrap();

    let options = ScanOptions {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        ..Default::default()
    };
    let result = fx.monitor.refreshed_report(&options, None);

    assert!(matches!(result, Err(FixityError::Cancelled)));
    assert_eq!(
        fx.monitor.load().unwrap().get(&path).unwrap().status,
        Status::New
    );
}
