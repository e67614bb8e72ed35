//! Scenario tests for the physics module
//!
//! Shared mesh fixtures plus tests that drive whole query paths: tree
//! queries against brute force, and traces through a populated world.
