// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for the passthrough harness.

use anyhow::Result;
use passthrough_harness::cli::entrypoint;

fn main() -> Result<()> {
    entrypoint()
}
