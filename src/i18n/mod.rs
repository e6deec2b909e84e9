//! Internationalization (i18n) support
//!
//! Interface strings ship for `en` and `pt`; YAML files in the site's
//! `languages/` directory add languages or override single keys.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("languages/en.yml")),
    ("pt", include_str!("languages/pt.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in languages
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            match serde_yaml::from_str(source) {
                Ok(data) => {
                    translations.insert(lang.to_string(), data);
                }
                Err(e) => tracing::error!("Built-in language {} is invalid: {}", lang, e),
            }
        }

        Self {
            language: normalize(language),
            translations,
        }
    }

    /// Load language files from a directory, merging over what is loaded
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(normalize)
                .unwrap_or_else(|| "en".to_string());

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    self.translations.entry(lang).or_default().extend(data);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key
    /// Key can be nested like "menu.home"
    pub fn get(&self, key: &str) -> String {
        self.get_for_lang(&self.language, key)
    }

    /// Get a translation for a specific language
    pub fn get_for_lang(&self, lang: &str, key: &str) -> String {
        for candidate in [lang, base_language(lang), "en"] {
            if let Some(value) = self
                .translations
                .get(candidate)
                .and_then(|data| get_nested_value(data, key))
            {
                return yaml_value_to_string(value);
            }
        }

        // Return key as fallback
        key.to_string()
    }

    /// Get all translations for the current language as a flat HashMap
    /// This flattens nested keys using dot notation (e.g., "menu.home")
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();

        // Most specific language wins
        for candidate in [self.language.as_str(), base_language(&self.language), "en"] {
            if let Some(data) = self.translations.get(candidate) {
                let mut flat = HashMap::new();
                flatten_translations(data, "", &mut flat);
                for (k, v) in flat {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

/// `pt_BR` -> `pt-br`
fn normalize(lang: &str) -> String {
    lang.trim().to_ascii_lowercase().replace('_', "-")
}

/// `pt-br` -> `pt`
fn base_language(lang: &str) -> &str {
    lang.split('-').next().unwrap_or(lang)
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    current
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

/// Flatten translations into a HashMap with dot-notation keys
fn flatten_translations(
    data: &HashMap<String, serde_yaml::Value>,
    prefix: &str,
    result: &mut HashMap<String, String>,
) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                let nested: HashMap<String, serde_yaml::Value> = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            serde_yaml::Value::Sequence(_) | serde_yaml::Value::Tagged(_) => {}
            other => {
                result.insert(full_key, yaml_value_to_string(other));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_languages() {
        assert_eq!(I18n::new("pt").get("load_more"), "Carregar mais posts");
        assert_eq!(I18n::new("pt").get("loading"), "Carregando...");
        assert_eq!(I18n::new("en").get("load_more"), "Load more posts");
    }

    #[test]
    fn test_regional_and_unknown_languages_fall_back() {
        assert_eq!(I18n::new("pt_BR").get("loading"), "Carregando...");
        assert_eq!(I18n::new("xx").get("loading"), "Loading...");
        assert_eq!(I18n::new("en").get("unknown"), "unknown");
    }

    #[test]
    fn test_override_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt.yml"),
            "load_more: Mais posts\nmenu:\n  home: Casa\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yml"), ": : :").unwrap();

        let mut i18n = I18n::new("pt");
        i18n.load_languages(dir.path()).unwrap();

        assert_eq!(i18n.get("load_more"), "Mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.get("menu.home"), "Casa");

        let all = i18n.get_all_translations();
        assert_eq!(all.get("menu.home"), Some(&"Casa".to_string()));
        assert_eq!(all.get("retry"), Some(&"Tentar novamente".to_string()));
    }
}
