// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passthrough scenario harness.
//!
//! Replays JSON scenarios (per-frame blend modes, injected runtime failures,
//! runtime events and geometry node operations) against a
//! [`PassthroughSession`](passthrough_core::PassthroughSession) backed by the
//! headless mocks, checks per-frame expectations and records a trace that can
//! be compared with a golden file.

pub mod cli;
pub mod prefs;
pub mod scenario;
