// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preferences persisted through the config service.

use passthrough_app_core::config::{ConfigService, ConfigStore, MemoryConfigStore};
use passthrough_app_core::prefs::{BcsPreset, PassthroughPrefs, PREFS_KEY};

#[test]
fn prefs_survive_a_save_and_load() {
    let svc = ConfigService::new(MemoryConfigStore::new());
    let prefs = PassthroughPrefs {
        texture_opacity_factor: 0.75,
        edge_color: [1.0, 1.0, 1.0, 0.5],
        brightness_contrast_saturation: Some(BcsPreset {
            brightness: -5.0,
            contrast: 1.2,
            saturation: 0.0,
        }),
    };
    svc.save(PREFS_KEY, &prefs).unwrap();

    let loaded: PassthroughPrefs = svc.load(PREFS_KEY).unwrap().unwrap();
    assert_eq!(loaded, prefs);

    let raw = String::from_utf8(svc.store().load_raw(PREFS_KEY).unwrap()).unwrap();
    assert!(raw.contains("\n"), "stored pretty-printed");
}
