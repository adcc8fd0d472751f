//! Integration test suite; requires a running server and seeded database

mod api_tests;
