pub(crate) const DEFAULT_AUTOSAVE_MS: u32 = 600;
const MIN_AUTOSAVE_MS: u32 = 50;
const MAX_AUTOSAVE_MS: u32 = 10_000;

/// Where pages are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum Backend {
    #[default]
    Local,
    Remote,
}

/// What the editor does with unsent edits when the edited page switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum IdentitySwitch {
    /// Reset to the new page; a pending autosave for the old page is dropped.
    #[default]
    Discard,
    /// Dispatch the pending autosave for the old page, then reset.
    Flush,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub backend: Backend,
    pub api_url: String,
    pub anon_key: String,
    pub autosave_ms: u32,
    pub identity_switch: IdentitySwitch,
    pub log_level: log::LevelFilter,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            api_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            autosave_ms: DEFAULT_AUTOSAVE_MS,
            identity_switch: IdentitySwitch::Discard,
            log_level: log::LevelFilter::Info,
        }
    }
}

impl EnvConfig {
    /// Read `window.ENV`, falling back to defaults for anything missing.
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        let Some(env) = env else {
            return Self::default();
        };

        Self::from_lookup(|key| {
            js_sys::Reflect::get(&env, &key.into())
                .ok()
                .and_then(|v| v.as_string().or_else(|| v.as_f64().map(|n| n.to_string())))
        })
    }

    /// Build a config from a key lookup. Unknown or malformed values keep their default.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(backend) = get("BACKEND") {
            match backend.trim().to_ascii_lowercase().as_str() {
                "remote" | "supabase" => cfg.backend = Backend::Remote,
                "local" => cfg.backend = Backend::Local,
                _ => {}
            }
        }

        // SUPABASE_URL first, then the generic API_URL.
        if let Some(url) = get("SUPABASE_URL").or_else(|| get("API_URL")) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                cfg.api_url = url.to_string();
            }
        }

        if let Some(key) = get("SUPABASE_ANON_KEY").or_else(|| get("ANON_KEY")) {
            cfg.anon_key = key.trim().to_string();
        }

        if let Some(ms) = get("AUTOSAVE_MS").and_then(|v| v.trim().parse::<f64>().ok()) {
            if ms.is_finite() && ms >= 0.0 {
                cfg.autosave_ms = (ms as u32).clamp(MIN_AUTOSAVE_MS, MAX_AUTOSAVE_MS);
            }
        }

        if let Some(policy) = get("IDENTITY_SWITCH") {
            match policy.trim().to_ascii_lowercase().as_str() {
                "flush" => cfg.identity_switch = IdentitySwitch::Flush,
                "discard" => cfg.identity_switch = IdentitySwitch::Discard,
                _ => {}
            }
        }

        if let Some(level) = get("LOG_LEVEL").and_then(|v| v.trim().parse().ok()) {
            cfg.log_level = level;
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = EnvConfig::from_lookup(|_| None);
        assert_eq!(cfg, EnvConfig::default());
        assert_eq!(cfg.autosave_ms, 600);
        assert_eq!(cfg.backend, Backend::Local);
    }

    #[test]
    fn test_remote_backend_with_trailing_slash_url() {
        let cfg = EnvConfig::from_lookup(lookup(&[
            ("BACKEND", "Supabase"),
            ("SUPABASE_URL", "https://x.supabase.co/"),
            ("SUPABASE_ANON_KEY", " anon "),
        ]));
        assert_eq!(cfg.backend, Backend::Remote);
        assert_eq!(cfg.api_url, "https://x.supabase.co");
        assert_eq!(cfg.anon_key, "anon");
    }

    #[test]
    fn test_api_url_fallback() {
        let cfg = EnvConfig::from_lookup(lookup(&[("API_URL", "http://db.local")]));
        assert_eq!(cfg.api_url, "http://db.local");
    }

    #[test]
    fn test_autosave_ms_is_clamped() {
        let low = EnvConfig::from_lookup(lookup(&[("AUTOSAVE_MS", "1")]));
        assert_eq!(low.autosave_ms, 50);
        let high = EnvConfig::from_lookup(lookup(&[("AUTOSAVE_MS", "99999")]));
        assert_eq!(high.autosave_ms, 10_000);
        let ok = EnvConfig::from_lookup(lookup(&[("AUTOSAVE_MS", "350")]));
        assert_eq!(ok.autosave_ms, 350);
        let junk = EnvConfig::from_lookup(lookup(&[("AUTOSAVE_MS", "soon")]));
        assert_eq!(junk.autosave_ms, 600);
    }

    #[test]
    fn test_identity_switch_and_log_level() {
        let cfg = EnvConfig::from_lookup(lookup(&[
            ("IDENTITY_SWITCH", "FLUSH"),
            ("LOG_LEVEL", "debug"),
        ]));
        assert_eq!(cfg.identity_switch, IdentitySwitch::Flush);
        assert_eq!(cfg.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_backend_keeps_default() {
        let cfg = EnvConfig::from_lookup(lookup(&[("BACKEND", "ftp")]));
        assert_eq!(cfg.backend, Backend::Local);
    }
}
