//! Integration tests for precache

mod cli_tests;
mod lifecycle;
mod support;
