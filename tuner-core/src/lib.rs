#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Shared logic for the radio tuner controller feature set.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library and exposing abstractions the other crates adopt.

pub mod arbiter;
pub mod command;
pub mod config;
pub mod controller;
pub mod events;
pub mod input;
pub mod status;
pub mod tuner;
