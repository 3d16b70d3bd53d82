// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `FsConfigStore` against a temporary directory.

use passthrough_app_core::config::{ConfigError, ConfigService, ConfigStore};
use passthrough_app_core::prefs::{PassthroughPrefs, PREFS_KEY};
use passthrough_config_fs::FsConfigStore;

#[test]
fn missing_key_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::with_base(dir.path()).unwrap();
    assert!(matches!(store.load_raw("nope"), Err(ConfigError::NotFound)));
}

#[test]
fn blobs_are_json_files_named_by_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::with_base(dir.path().join("nested")).unwrap();
    let svc = ConfigService::new(store);
    let prefs = PassthroughPrefs {
        texture_opacity_factor: 0.4,
        ..PassthroughPrefs::default()
    };
    svc.save(PREFS_KEY, &prefs).unwrap();

    let path = dir.path().join("nested").join("passthrough_prefs.json");
    assert!(path.is_file());
    let loaded: Option<PassthroughPrefs> = svc.load(PREFS_KEY).unwrap();
    assert_eq!(loaded, Some(prefs));
}
