// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application services for passthrough tools: a keyed config service over a
//! pluggable store and the saved passthrough style preferences.
//! Independent of the passthrough subsystem crates.

pub mod config;
pub mod config_port;
pub mod prefs;
