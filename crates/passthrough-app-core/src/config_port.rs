// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config port shared by passthrough tools.

use crate::prefs::PassthroughPrefs;

/// Config-facing port for loading and saving passthrough preferences.
pub trait ConfigPort {
    /// Load preferences (`None` if missing or unreadable).
    fn load_prefs(&self) -> Option<PassthroughPrefs>;
    /// Persist preferences (best-effort; impls may log errors internally).
    fn save_prefs(&self, prefs: &PassthroughPrefs);
}
