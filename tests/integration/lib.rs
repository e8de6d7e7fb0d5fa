#![cfg(test)]

mod receipt_lifecycle_tests;
