//! Property-based tests for the pattern compiler, the matcher and the planner.
//!
//! These tests use proptest to generate random key chains and verify that the
//! core invariants hold for all of them.
