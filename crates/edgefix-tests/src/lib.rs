//! Integration test crate for edgefix.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives schedules through the filters and checks whole clips.

#[cfg(test)]
mod crop_zones;

#[cfg(test)]
mod schedules;

#[cfg(test)]
mod services;
