//! Property-based tests for column reconciliation and row materialization

mod reconciliation;
