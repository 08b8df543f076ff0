//! Test support shared across modules
