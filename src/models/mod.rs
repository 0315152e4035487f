use serde::{Deserialize, Deserializer, Serialize};

/// A single poem page.
///
/// `number` is the page's identity and its 1-based position in the book.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Page {
    #[serde(rename = "page_number", alias = "id", deserialize_with = "de_page_number")]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Page {
    pub fn blank(number: u32) -> Self {
        Self {
            number,
            title: String::new(),
            body: String::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        title_or_untitled(&self.title)
    }
}

pub(crate) fn title_or_untitled(title: &str) -> &str {
    if title.trim().is_empty() {
        "Untitled Poem"
    } else {
        title
    }
}

// Older local payloads stored the identity as a string id ("3").
fn de_page_number<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
    }
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Mode {
    Read,
    Write,
}

impl Mode {
    pub fn is_write(self) -> bool {
        self == Mode::Write
    }
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Role {
    #[default]
    Reader,
    Writer,
}

impl Role {
    pub fn mode(self) -> Mode {
        match self {
            Role::Reader => Mode::Read,
            Role::Writer => Mode::Write,
        }
    }
}

/// Row of the `profiles` table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Profile {
    pub id: String,
    #[serde(default)]
    pub role: Role,
}

/// Local-storage payload. Both fields are optional so partial writes merge.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SavedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Page>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Auth session returned by the hosted auth service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}
