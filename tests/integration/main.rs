//! Host-run integration tests for the full tick pipeline.
//!
//! These drive the startup sequence, the coordinator and the LED
//! controller through [`gatekeeper::hal::MockHal`] exactly the way the
//! firmware main loop does: one `update` per virtual millisecond.

mod support;

mod boot_tests;
mod gesture_tests;
mod mode_tests;
