//! Locale resolution and the per-locale text bundles.
//!
//! Bundles are plain structs, so a locale that lacks a string does not
//! compile.

use neurodoc_protocol::Locale;
use neurodoc_protocol::LocaleSelection;

#[derive(Debug, PartialEq, Eq)]
pub struct TextBundle {
    pub response: &'static str,
    pub placeholder: &'static str,
    pub search: &'static str,
    pub clear: &'static str,
    pub copy: &'static str,
    pub history: &'static str,
    pub clear_history: &'static str,
    pub empty_query: &'static str,
    pub no_results: &'static str,
    pub connection_error: &'static str,
    pub uploaded_file: &'static str,
    pub theme_light: &'static str,
    pub theme_dark: &'static str,
}

static EN: TextBundle = TextBundle {
    response: "Response",
    placeholder: "Ask something...",
    search: "Search",
    clear: "Clear",
    copy: "Copy",
    history: "History",
    clear_history: "Clear History",
    empty_query: "⚠️ Please enter a query before searching",
    no_results: "❌ No results found",
    connection_error: "❌ Could not reach the search service",
    uploaded_file: "📄 Uploaded File",
    theme_light: "Light",
    theme_dark: "Dark",
};

static AR: TextBundle = TextBundle {
    response: "الإجابة",
    placeholder: "اسأل شيئًا...",
    search: "بحث",
    clear: "مسح",
    copy: "نسخ",
    history: "السجل",
    clear_history: "مسح السجل",
    empty_query: "⚠️ الرجاء كتابة استعلام قبل البحث",
    no_results: "❌ لا توجد نتائج",
    connection_error: "❌ حدث خطأ أثناء الاتصال بالخادم",
    uploaded_file: "📄 الملف المرفوع",
    theme_light: "فاتح",
    theme_dark: "داكن",
};

static PL: TextBundle = TextBundle {
    response: "Odpowiedź",
    placeholder: "Zadaj pytanie...",
    search: "Szukaj",
    clear: "Wyczyść",
    copy: "Kopiuj",
    history: "Historia",
    clear_history: "Wyczyść historię",
    empty_query: "⚠️ Wprowadź zapytanie przed wyszukiwaniem",
    no_results: "❌ Brak wyników",
    connection_error: "❌ Błąd połączenia z usługą wyszukiwania",
    uploaded_file: "📄 Przesłany plik",
    theme_light: "Jasny",
    theme_dark: "Ciemny",
};

pub fn bundle(locale: Locale) -> &'static TextBundle {
    match locale {
        Locale::En => &EN,
        Locale::Ar => &AR,
        Locale::Pl => &PL,
    }
}

/// Pinned selections win; `auto` follows the environment's primary language
/// subtag and falls back to [`Locale::DEFAULT`].
pub fn resolve(selected: LocaleSelection, environment_locale: &str) -> Locale {
    match selected {
        LocaleSelection::Pinned(locale) => locale,
        LocaleSelection::Auto => {
            Locale::from_language_tag(environment_locale).unwrap_or(Locale::DEFAULT)
        }
    }
}

/// The platform locale, e.g. `pl-PL`. Empty when the platform reports none.
pub fn environment_locale() -> String {
    sys_locale::get_locale().unwrap_or_default()
}

/// The user's selection together with the environment it resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleState {
    selection: LocaleSelection,
    environment: String,
}

impl LocaleState {
    pub fn new(selection: LocaleSelection, environment: impl Into<String>) -> Self {
        Self {
            selection,
            environment: environment.into(),
        }
    }

    pub fn selection(&self) -> LocaleSelection {
        self.selection
    }

    pub fn active(&self) -> Locale {
        resolve(self.selection, &self.environment)
    }

    pub fn texts(&self) -> &'static TextBundle {
        bundle(self.active())
    }

    /// Returns whether the selection changed and therefore needs persisting.
    pub fn select(&mut self, selection: LocaleSelection) -> bool {
        if self.selection == selection {
            return false;
        }
        self.selection = selection;
        true
    }
}
