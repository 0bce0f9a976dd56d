use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::iter;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

/// Interaction languages the client ships a complete text bundle for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    En,
    Ar,
    Pl,
}

impl Locale {
    /// Fallback used when the environment names a language we do not ship.
    pub const DEFAULT: Locale = Locale::En;

    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Ar => "العربية",
            Locale::Pl => "Polski",
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Locale::Ar)
    }

    /// Parses the primary subtag of a BCP 47 / POSIX style tag such as
    /// `pl-PL`, `ar_EG.UTF-8` or `en`.
    pub fn from_language_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default();
        Locale::from_str(primary).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale `{0}`")]
pub struct UnknownLocale(pub String);

/// The user's locale choice: follow the environment, or pin one language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LocaleSelection {
    #[default]
    Auto,
    Pinned(Locale),
}

impl LocaleSelection {
    pub const AUTO_CODE: &'static str = "auto";
    // Older preference files stored the auto choice under this name.
    const LEGACY_AUTO_CODE: &'static str = "all";

    /// Every selectable value in selector order: `auto` first.
    pub fn choices() -> impl Iterator<Item = LocaleSelection> {
        iter::once(LocaleSelection::Auto).chain(Locale::iter().map(LocaleSelection::Pinned))
    }

    pub fn label(self) -> &'static str {
        match self {
            LocaleSelection::Auto => "All Languages (Auto)",
            LocaleSelection::Pinned(locale) => locale.display_name(),
        }
    }
}

impl fmt::Display for LocaleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocaleSelection::Auto => f.write_str(Self::AUTO_CODE),
            LocaleSelection::Pinned(locale) => f.write_str(locale.code()),
        }
    }
}

impl FromStr for LocaleSelection {
    type Err = UnknownLocale;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(Self::AUTO_CODE)
            || value.eq_ignore_ascii_case(Self::LEGACY_AUTO_CODE)
        {
            return Ok(LocaleSelection::Auto);
        }
        Locale::from_str(value)
            .map(LocaleSelection::Pinned)
            .map_err(|_| UnknownLocale(value.to_string()))
    }
}

impl Serialize for LocaleSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocaleSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
