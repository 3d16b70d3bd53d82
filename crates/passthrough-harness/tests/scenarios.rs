// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scenario suite: every manifest entry runs and meets its expectations.

use anyhow::{Context, Result};
use passthrough_app_core::prefs::PassthroughPrefs;
use passthrough_harness::scenario::{
    run_scenario, run_scenario_with_prefs, ExpectedLayer, Scenario, Trace,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct ManifestEntry {
    path: String,
    #[allow(dead_code)]
    tags: Vec<String>,
    #[allow(dead_code)]
    desc: String,
}

fn scenario_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/scenarios")
}

fn load(name: &str) -> Scenario {
    Scenario::load(&scenario_dir().join(name)).unwrap()
}

#[test]
fn manifest_scenarios_pass() -> Result<()> {
    let dir = scenario_dir();
    let f = File::open(dir.join("MANIFEST.json")).context("failed to open manifest")?;
    let entries: Vec<ManifestEntry> = serde_json::from_reader(BufReader::new(f))?;
    assert!(!entries.is_empty());

    for entry in entries {
        let scenario = Scenario::load(&dir.join(&entry.path))?;
        let trace = run_scenario(&scenario).with_context(|| entry.path.clone())?;
        assert_eq!(trace.frames.len(), scenario.frames.len(), "{}", entry.path);
    }
    Ok(())
}

#[test]
fn runs_are_deterministic() {
    let scenario = load("projected_geometry.json");
    let first = run_scenario(&scenario).unwrap();
    let second = run_scenario(&scenario).unwrap();
    second.compare(&first).unwrap();
}

#[test]
fn trace_survives_golden_serialization() {
    let trace = run_scenario(&load("state_events.json")).unwrap();
    let json = serde_json::to_string_pretty(&trace).unwrap();
    let golden: Trace = serde_json::from_str(&json).unwrap();
    trace.compare(&golden).unwrap();
    assert_eq!(golden, trace);
}

#[test]
fn reconstruction_start_calls_in_order() {
    let trace = run_scenario(&load("alpha_blend.json")).unwrap();
    assert_eq!(trace.setup_calls, vec!["xrCreatePassthroughFB"]);
    assert!(trace.frames[0].calls.is_empty());
    assert_eq!(
        trace.frames[1].calls,
        vec![
            "xrPassthroughStartFB",
            "xrCreatePassthroughLayerFB",
            "xrPassthroughLayerSetStyleFB",
        ]
    );
    assert!(trace.frames[2].calls.is_empty());
    assert_eq!(
        trace.frames[3].calls,
        vec!["xrDestroyPassthroughLayerFB", "xrPassthroughPauseFB"]
    );
    assert_eq!(trace.teardown_calls, vec!["xrDestroyPassthroughFB"]);
}

#[test]
fn unsupported_host_makes_no_runtime_calls() {
    let trace = run_scenario(&load("unsupported.json")).unwrap();
    assert!(trace.setup_calls.is_empty());
    assert!(trace.frames.iter().all(|f| f.calls.is_empty()));
    assert!(trace.teardown_calls.is_empty());
}

#[test]
fn geometry_frames_create_and_destroy_instances() {
    let trace = run_scenario(&load("projected_geometry.json")).unwrap();
    let first = &trace.frames[0].calls;
    assert!(first.contains(&"xrCreateTriangleMeshFB".to_owned()));
    assert!(first.contains(&"xrCreateGeometryInstanceFB".to_owned()));
    assert!(trace.frames[2]
        .calls
        .contains(&"xrGeometryInstanceSetTransformFB".to_owned()));
    assert!(trace.frames[3]
        .calls
        .contains(&"xrDestroyGeometryInstanceFB".to_owned()));
    assert_eq!(trace.frames.last().unwrap().current_layer, ExpectedLayer::None);
}

#[test]
fn override_prefs_replace_scenario_prefs() {
    let scenario = load("style_prefs.json");
    let bad = PassthroughPrefs {
        brightness_contrast_saturation: Some(passthrough_app_core::prefs::BcsPreset {
            brightness: 0.0,
            contrast: -1.0,
            saturation: 1.0,
        }),
        ..PassthroughPrefs::default()
    };
    assert!(run_scenario_with_prefs(&scenario, Some(&bad)).is_err());
    assert!(run_scenario_with_prefs(&scenario, Some(&PassthroughPrefs::default())).is_ok());
}

#[test]
fn unknown_node_is_reported() {
    let scenario = Scenario::from_json(
        r#"{
            "name": "ghost",
            "frames": [ { "nodes": [ { "op": "enter_tree", "node": "ghost" } ] } ]
        }"#,
    )
    .unwrap();
    let err = run_scenario(&scenario).unwrap_err();
    assert!(format!("{err:#}").contains("ghost"));
}
