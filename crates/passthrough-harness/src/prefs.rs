// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved preferences: loading through the config port and applying them to a
//! session.

use anyhow::{Context, Result};
use passthrough_app_core::config::{ConfigService, ConfigStore};
use passthrough_app_core::config_port::ConfigPort;
use passthrough_app_core::prefs::{PassthroughPrefs, PREFS_KEY};
use passthrough_core::PassthroughSession;
use passthrough_port::{PassthroughRuntime, XrHost};
use tracing::{debug, warn};

/// [`ConfigPort`] over a [`ConfigService`]; errors are logged, not returned.
#[derive(Debug)]
pub struct StoredPrefs<S> {
    service: ConfigService<S>,
}

impl<S> StoredPrefs<S> {
    /// Wrap a config service.
    pub fn new(service: ConfigService<S>) -> Self {
        Self { service }
    }
}

impl<S: ConfigStore> ConfigPort for StoredPrefs<S> {
    fn load_prefs(&self) -> Option<PassthroughPrefs> {
        match self.service.load(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(%err, "failed to load passthrough prefs");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &PassthroughPrefs) {
        if let Err(err) = self.service.save(PREFS_KEY, prefs) {
            warn!(%err, "failed to save passthrough prefs");
        }
    }
}

/// Load saved prefs, persisting the defaults the first time.
pub fn load_or_init(port: &impl ConfigPort) -> PassthroughPrefs {
    if let Some(prefs) = port.load_prefs() {
        return prefs;
    }
    debug!("no saved passthrough prefs, writing defaults");
    let prefs = PassthroughPrefs::default();
    port.save_prefs(&prefs);
    prefs
}

/// Push saved prefs into a session through its style setters.
pub fn apply_prefs<R, H>(
    session: &mut PassthroughSession<R, H>,
    prefs: &PassthroughPrefs,
) -> Result<()>
where
    R: PassthroughRuntime,
    H: XrHost,
{
    session.set_texture_opacity_factor(prefs.texture_opacity_factor);
    session.set_edge_color(prefs.edge_color);
    if let Some(bcs) = prefs.brightness_contrast_saturation {
        session
            .set_brightness_contrast_saturation(bcs.brightness, bcs.contrast, bcs.saturation)
            .context("invalid brightness/contrast/saturation preset")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use passthrough_app_core::config::MemoryConfigStore;
    use passthrough_app_core::prefs::BcsPreset;
    use passthrough_mock::{MockHost, MockRuntime};
    use passthrough_port::PassthroughFilter;

    #[test]
    fn defaults_are_written_once() {
        let port = StoredPrefs::new(ConfigService::new(MemoryConfigStore::new()));
        assert_eq!(load_or_init(&port), PassthroughPrefs::default());
        assert_eq!(port.load_prefs(), Some(PassthroughPrefs::default()));

        let custom = PassthroughPrefs {
            texture_opacity_factor: 0.3,
            ..PassthroughPrefs::default()
        };
        port.save_prefs(&custom);
        assert_eq!(load_or_init(&port), custom);
    }

    #[test]
    fn corrupt_prefs_load_as_none() {
        let store = MemoryConfigStore::new();
        store.save_raw(PREFS_KEY, b"[1, 2").unwrap();
        let port = StoredPrefs::new(ConfigService::new(store));
        assert_eq!(port.load_prefs(), None);
    }

    #[test]
    fn prefs_reach_the_session_style() {
        let mut session = PassthroughSession::new(MockRuntime::new(), MockHost::new());
        let prefs = PassthroughPrefs {
            texture_opacity_factor: 0.6,
            edge_color: [0.0, 0.0, 1.0, 1.0],
            brightness_contrast_saturation: Some(BcsPreset {
                brightness: 12.0,
                contrast: 1.1,
                saturation: 0.9,
            }),
        };
        apply_prefs(&mut session, &prefs).unwrap();
        assert_eq!(session.texture_opacity_factor(), 0.6);
        assert_eq!(session.edge_color(), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(
            session.passthrough_filter(),
            PassthroughFilter::BrightnessContrastSaturation
        );
    }

    #[test]
    fn invalid_preset_is_reported() {
        let mut session = PassthroughSession::new(MockRuntime::new(), MockHost::new());
        let prefs = PassthroughPrefs {
            brightness_contrast_saturation: Some(BcsPreset {
                brightness: 500.0,
                ..BcsPreset::default()
            }),
            ..PassthroughPrefs::default()
        };
        assert!(apply_prefs(&mut session, &prefs).is_err());
        assert_eq!(session.passthrough_filter(), PassthroughFilter::Disabled);
    }
}
