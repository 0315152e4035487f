use crate::models::{Mode, Page, SavedState, Session};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const STATE_KEY: &str = "virtual-poem-book-v1";
pub(crate) const SESSION_KEY: &str = "virtual-poem-book-session";

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("local storage is unavailable")]
    Unavailable,

    #[error("failed to write `{key}` to local storage")]
    Write { key: String },

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StorageError::Unavailable)
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage().ok()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    local_storage()?
        .set_item(key, &json)
        .map_err(|_| StorageError::Write {
            key: key.to_string(),
        })
}

pub(crate) fn remove_from_storage(key: &str) {
    if let Ok(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

/// Decode the saved book state.
///
/// Anything unreadable counts as "nothing saved". `mode` and `pages` are decoded
/// independently so one bad field does not discard the other.
pub(crate) fn decode_state(raw: Option<&str>) -> SavedState {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return SavedState::default();
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        log::warn!("ignoring malformed saved state");
        return SavedState::default();
    };

    if !value.is_object() {
        return SavedState::default();
    }

    SavedState {
        mode: value
            .get("mode")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        pages: value
            .get("pages")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
    }
}

/// Overlay the given fields on a previously saved state.
pub(crate) fn merge_state(
    prev: SavedState,
    pages: Option<Vec<Page>>,
    mode: Option<Mode>,
) -> SavedState {
    SavedState {
        mode: mode.or(prev.mode),
        pages: pages.or(prev.pages),
    }
}

pub(crate) fn load_state() -> SavedState {
    let raw = local_storage()
        .ok()
        .and_then(|s| s.get_item(STATE_KEY).ok().flatten());
    decode_state(raw.as_deref())
}

pub(crate) fn save_pages(pages: &[Page]) -> Result<(), StorageError> {
    let next = merge_state(load_state(), Some(pages.to_vec()), None);
    save_json_to_storage(STATE_KEY, &next)
}

pub(crate) fn save_mode(mode: Mode) -> Result<(), StorageError> {
    let next = merge_state(load_state(), None, Some(mode));
    save_json_to_storage(STATE_KEY, &next)
}

pub(crate) fn load_session() -> Option<Session> {
    load_json_from_storage::<Session>(SESSION_KEY)
}

pub(crate) fn save_session(session: &Session) -> Result<(), StorageError> {
    save_json_to_storage(SESSION_KEY, session)
}

pub(crate) fn clear_session() {
    remove_from_storage(SESSION_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, title: &str, body: &str) -> Page {
        Page {
            number,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_decode_absent_or_malformed_is_empty() {
        assert_eq!(decode_state(None), SavedState::default());
        assert_eq!(decode_state(Some("")), SavedState::default());
        assert_eq!(decode_state(Some("{not json")), SavedState::default());
        assert_eq!(decode_state(Some("[1,2]")), SavedState::default());
    }

    #[test]
    fn test_decode_keeps_valid_field_when_other_is_bad() {
        let s = decode_state(Some(r#"{"mode":"write","pages":"oops"}"#));
        assert_eq!(s.mode, Some(Mode::Write));
        assert!(s.pages.is_none());

        let s = decode_state(Some(r#"{"mode":"admin","pages":[]}"#));
        assert!(s.mode.is_none());
        assert_eq!(s.pages, Some(vec![]));
    }

    #[test]
    fn test_pages_roundtrip_through_saved_payload() {
        let legacy = r#"{"pages":[{"id":"1","title":"A","body":"x"},{"id":"2","title":"B","body":"y"}]}"#;
        let loaded = decode_state(Some(legacy));
        let pages = loaded.pages.clone().expect("pages should load");
        assert_eq!(pages, vec![page(1, "A", "x"), page(2, "B", "y")]);

        let saved = merge_state(loaded, Some(pages.clone()), None);
        let json = serde_json::to_string(&saved).expect("should encode");
        let reloaded = decode_state(Some(&json));
        assert_eq!(reloaded.pages, Some(pages));
    }

    #[test]
    fn test_merge_overwrites_only_given_fields() {
        let prev = SavedState {
            mode: Some(Mode::Read),
            pages: Some(vec![page(1, "A", "x")]),
        };

        let with_mode = merge_state(prev.clone(), None, Some(Mode::Write));
        assert_eq!(with_mode.mode, Some(Mode::Write));
        assert_eq!(with_mode.pages, prev.pages);

        let with_pages = merge_state(prev, Some(vec![]), None);
        assert_eq!(with_pages.mode, Some(Mode::Read));
        assert_eq!(with_pages.pages, Some(vec![]));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::SessionUser;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_local_storage_pages_and_mode_roundtrip() {
        remove_from_storage(STATE_KEY);
        assert_eq!(load_state(), SavedState::default());

        let pages = vec![
            Page {
                number: 1,
                title: "A".to_string(),
                body: "x".to_string(),
            },
            Page {
                number: 2,
                title: "B".to_string(),
                body: "y".to_string(),
            },
        ];
        save_pages(&pages).expect("save pages");
        save_mode(Mode::Write).expect("save mode");

        let s = load_state();
        assert_eq!(s.pages, Some(pages));
        assert_eq!(s.mode, Some(Mode::Write));
        remove_from_storage(STATE_KEY);
    }

    #[wasm_bindgen_test]
    fn test_session_roundtrip() {
        clear_session();
        assert!(load_session().is_none());

        let session = Session {
            access_token: "t1".to_string(),
            refresh_token: None,
            user: SessionUser {
                id: "u1".to_string(),
                email: None,
            },
        };
        save_session(&session).expect("save session");
        assert_eq!(load_session(), Some(session));

        clear_session();
        assert!(load_session().is_none());
    }
}
