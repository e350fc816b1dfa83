//! Integration test harness.

mod link_tests;
mod mock_hw;
mod service_tests;
