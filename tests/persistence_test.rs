#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: the payment for ORD-1 settles.
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        csv1,
        "op, order, customer, amount, currency, method, provider, reference, default"
    )
    .unwrap();
    writeln!(csv1, "payment, ORD-1, cust-1, 100.00, USD, card, , ,").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("payrail"));
    cmd1.arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("payment,ORD-1"));
    assert!(stdout1.contains("succeeded,true"));

    // 2. Second run against the same database: the duplicate-charge defense
    // sees the recovered payment.
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        csv2,
        "op, order, customer, amount, currency, method, provider, reference, default"
    )
    .unwrap();
    writeln!(csv2, "payment, ORD-1, cust-1, 100.00, USD, card, , ,").unwrap();
    writeln!(csv2, "refund, , , 40.00, USD, , , ORD-1,").unwrap();

    let mut cmd2 = Command::new(cargo_bin!("payrail"));
    cmd2.arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("Payment already exists for this order"));
    // The refund still finds the payment captured in the first run.
    assert!(stdout2.contains("refund,ORD-1"));
    assert!(stdout2.contains("succeeded,true"));
}
