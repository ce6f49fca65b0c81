#[path = "../common/mod.rs"]
mod common;

mod digest_tests;
mod ledger_tests;
mod workflow_tests;
