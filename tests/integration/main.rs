// Integration tests

mod common;
mod reconciliation_test;
mod restore_purchase_test;
