//! Site configuration: stylesheet location, color tokens and escaping.
//!
//! Config files are YAML. They are converted to JSON and checked against
//! [`BUILTIN_SCHEMA`] (or a caller-supplied schema) before any value is read.

use crate::html::RenderOptions;
use crate::{MansiteError, Result};
use jsonschema::validator_for;
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::{Yaml, YamlLoader, yaml::Hash};

pub const BUILTIN_SCHEMA: &str = include_str!("../data/config_schema.yml");

/// Settings read from a config file or the command line. Unset values fall
/// back to the [`RenderOptions`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteConfig {
    pub stylesheet: Option<PathBuf>,
    pub background: Option<String>,
    pub text: Option<String>,
    pub accent: Option<String>,
    pub escape_text: Option<bool>,
}

impl SiteConfig {
    /// Resolves the settings into render options, reading the stylesheet
    /// file when one is configured.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let mut options = RenderOptions::default();
        if let Some(path) = &self.stylesheet {
            options.stylesheet = read_file(path)?;
        }
        if let Some(background) = &self.background {
            options.background = background.clone();
        }
        if let Some(text) = &self.text {
            options.text = text.clone();
        }
        if let Some(accent) = &self.accent {
            options.accent = accent.clone();
        }
        if let Some(escape_text) = self.escape_text {
            options.escape_text = escape_text;
        }
        Ok(options)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let yaml = read_file(path)?;
    parse_config(&yaml, BUILTIN_SCHEMA, path.parent())
}

pub fn load_config_with_schema<P: AsRef<Path>, S: AsRef<Path>>(
    path: P,
    schema_path: S,
) -> Result<SiteConfig> {
    let path = path.as_ref();
    let yaml = read_file(path)?;
    let schema_source = fs::read_to_string(schema_path.as_ref())
        .map_err(|err| MansiteError::Schema(err.to_string()))?;
    parse_config(&yaml, &schema_source, path.parent())
}

/// Parses config text against the built-in schema. A relative stylesheet
/// path is resolved against `base_dir` when given.
pub fn load_config_str(yaml: &str, base_dir: Option<&Path>) -> Result<SiteConfig> {
    parse_config(yaml, BUILTIN_SCHEMA, base_dir)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| MansiteError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn parse_config(yaml: &str, schema_source: &str, base_dir: Option<&Path>) -> Result<SiteConfig> {
    let docs =
        YamlLoader::load_from_str(yaml).map_err(|err| MansiteError::Yaml(err.to_string()))?;
    // An empty file is an empty config.
    let Some(document) = docs.first() else {
        return Ok(SiteConfig::default());
    };
    validate_config(document, schema_source)?;

    let config = ensure_mapping(document, "config root")?;
    let stylesheet = map_get_string(config, "stylesheet")?.map(|path| {
        let path = PathBuf::from(path);
        match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    });
    let escape_text = match config.get(&Yaml::String("escape_text".to_string())) {
        None | Some(Yaml::Null) => None,
        Some(Yaml::Boolean(value)) => Some(*value),
        Some(other) => {
            return Err(MansiteError::Yaml(format!(
                "expected bool for key 'escape_text', found {}",
                yaml_type_name(other)
            )));
        }
    };

    let mut site = SiteConfig {
        stylesheet,
        escape_text,
        ..SiteConfig::default()
    };
    if let Some(colors) = config.get(&Yaml::String("colors".to_string())) {
        let colors = ensure_mapping(colors, "colors")?;
        site.background = map_get_token(colors, "background")?;
        site.text = map_get_token(colors, "text")?;
        site.accent = map_get_token(colors, "accent")?;
    }
    Ok(site)
}

fn validate_config(document: &Yaml, schema_source: &str) -> Result<()> {
    let schema_docs = YamlLoader::load_from_str(schema_source)
        .map_err(|err| MansiteError::Schema(err.to_string()))?;
    let schema_yaml = schema_docs
        .first()
        .ok_or_else(|| MansiteError::Schema("empty schema document".to_string()))?;
    let schema_json = yaml_to_json(schema_yaml);
    let instance_json = yaml_to_json(document);
    let validator =
        validator_for(&schema_json).map_err(|err| MansiteError::Schema(err.to_string()))?;
    if let Err(error) = validator.validate(&instance_json) {
        return Err(MansiteError::Schema(error.to_string()));
    }
    Ok(())
}

fn ensure_mapping<'a>(value: &'a Yaml, context: &str) -> Result<&'a Hash> {
    value
        .as_hash()
        .ok_or_else(|| MansiteError::Yaml(format!("expected mapping for {context}")))
}

fn map_get_string(map: &Hash, key: &str) -> Result<Option<String>> {
    match map.get(&Yaml::String(key.to_string())) {
        None | Some(Yaml::Null) => Ok(None),
        Some(Yaml::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(MansiteError::Yaml(format!(
            "expected string for key '{key}', found {}",
            yaml_type_name(other)
        ))),
    }
}

/// Color tokens may be written as numbers or strings; both become text.
fn map_get_token(map: &Hash, key: &str) -> Result<Option<String>> {
    match map.get(&Yaml::String(key.to_string())) {
        None | Some(Yaml::Null) => Ok(None),
        Some(Yaml::String(value)) | Some(Yaml::Real(value)) => Ok(Some(value.clone())),
        Some(Yaml::Integer(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(MansiteError::Yaml(format!(
            "expected string or number for color '{key}', found {}",
            yaml_type_name(other)
        ))),
    }
}

fn yaml_value_to_string(value: &Yaml) -> String {
    match value {
        Yaml::Null => "null".to_string(),
        Yaml::Boolean(value) => value.to_string(),
        Yaml::Integer(value) => value.to_string(),
        Yaml::Real(value) | Yaml::String(value) => value.clone(),
        Yaml::Array(values) => {
            let items = values.iter().map(yaml_value_to_string).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Yaml::Hash(map) => {
            let pairs = map
                .iter()
                .map(|(key, value)| {
                    format!("{}: {}", yaml_value_to_string(key), yaml_value_to_string(value))
                })
                .collect::<Vec<_>>();
            format!("{{{}}}", pairs.join(", "))
        }
        Yaml::Alias(alias) => format!("*{alias}"),
        Yaml::BadValue => "!!badvalue".to_string(),
    }
}

fn yaml_type_name(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Boolean(_) => "bool",
        Yaml::Integer(_) => "int",
        Yaml::Real(_) => "float",
        Yaml::String(_) => "string",
        Yaml::Array(_) => "sequence",
        Yaml::Hash(_) => "mapping",
        Yaml::Alias(_) => "alias",
        Yaml::BadValue => "bad",
    }
}

fn yaml_to_json(value: &Yaml) -> JsonValue {
    match value {
        Yaml::Null => JsonValue::Null,
        Yaml::Boolean(value) => JsonValue::Bool(*value),
        Yaml::Integer(value) => JsonValue::Number(JsonNumber::from(*value)),
        Yaml::Real(value) => value
            .parse::<f64>()
            .ok()
            .and_then(JsonNumber::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(value.clone())),
        Yaml::String(value) => JsonValue::String(value.clone()),
        Yaml::Array(values) => JsonValue::Array(values.iter().map(yaml_to_json).collect()),
        Yaml::Hash(map) => {
            let mut out = JsonMap::new();
            for (key, value) in map.iter() {
                let key = match key {
                    Yaml::String(value) => value.clone(),
                    _ => yaml_value_to_string(key),
                };
                out.insert(key, yaml_to_json(value));
            }
            JsonValue::Object(out)
        }
        Yaml::Alias(alias) => JsonValue::String(format!("*{alias}")),
        Yaml::BadValue => JsonValue::String("!!badvalue".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_tokens_become_text() {
        let config = load_config_str(
            "colors:\n  background: 220\n  text: \"15\"\n  accent: 32.5\n",
            None,
        )
        .expect("load config");
        assert_eq!(config.background.as_deref(), Some("220"));
        assert_eq!(config.text.as_deref(), Some("15"));
        assert_eq!(config.accent.as_deref(), Some("32.5"));
    }

    #[test]
    fn relative_stylesheet_resolves_against_base_dir() {
        let config = load_config_str("stylesheet: theme.css\n", Some(Path::new("/site")))
            .expect("load config");
        assert_eq!(config.stylesheet, Some(PathBuf::from("/site/theme.css")));

        let config = load_config_str("stylesheet: /abs/theme.css\n", Some(Path::new("/site")))
            .expect("load config");
        assert_eq!(config.stylesheet, Some(PathBuf::from("/abs/theme.css")));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_str("", None).expect("load config");
        assert_eq!(config, SiteConfig::default());
        let options = config.render_options().expect("render options");
        assert_eq!(options, RenderOptions::default());
    }

    #[test]
    fn unknown_keys_fail_schema() {
        let err = load_config_str("theme: dark\n", None).expect_err("expected error");
        assert!(matches!(err, MansiteError::Schema(_)));
    }

    #[test]
    fn non_mapping_root_fails_schema() {
        let err = load_config_str("[]", None).expect_err("expected error");
        assert!(matches!(err, MansiteError::Schema(_)));
    }

    #[test]
    fn boolean_token_fails_schema() {
        let err = load_config_str("colors:\n  accent: true\n", None).expect_err("expected error");
        assert!(matches!(err, MansiteError::Schema(_)));
    }

    #[test]
    fn broken_yaml_is_reported() {
        let err = load_config_str("colors: [\n", None).expect_err("expected error");
        assert!(matches!(err, MansiteError::Yaml(_)));
    }

    #[test]
    fn missing_stylesheet_is_io_error() {
        let config = SiteConfig {
            stylesheet: Some(PathBuf::from("/nonexistent/mansite/theme.css")),
            ..SiteConfig::default()
        };
        let err = config.render_options().expect_err("expected error");
        match err {
            MansiteError::Io { path, .. } => assert!(path.ends_with("theme.css")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_to_render_options() {
        let config = SiteConfig {
            accent: Some("120".to_string()),
            escape_text: Some(true),
            ..SiteConfig::default()
        };
        let options = config.render_options().expect("render options");
        assert_eq!(options.accent, "120");
        assert_eq!(options.background, crate::html::DEFAULT_BACKGROUND);
        assert!(options.escape_text);
    }

    #[test]
    fn map_get_token_rejects_sequences() {
        let mut map = Hash::new();
        map.insert(Yaml::String("text".to_string()), Yaml::Array(vec![]));
        let err = map_get_token(&map, "text").expect_err("expected error");
        match err {
            MansiteError::Yaml(msg) => assert!(msg.contains("string or number")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn yaml_to_json_keeps_shapes() {
        let docs = YamlLoader::load_from_str("a: 1\nb: [x, 2.5]\nc: null\n").expect("yaml");
        let json = yaml_to_json(&docs[0]);
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"][0], "x");
        assert_eq!(json["b"][1], 2.5);
        assert!(json["c"].is_null());
    }
}
