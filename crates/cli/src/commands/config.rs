use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use combo_core::combo::Objective;
use combo_core::config::{objective_env_key, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    for objective in Objective::ALL {
        let key_path = format!("objectives.{objective}");
        let env_key = objective_env_key(objective);
        lines.push(render_line(
            &key_path,
            &config.objectives.get(objective).to_string(),
            source(&key_path, &[env_key.as_str()]),
        ));
    }

    lines.push(render_line(
        "retention.mode",
        config.retention.mode.as_str(),
        source("retention.mode", &["COMBO_RETENTION_MODE"]),
    ));
    let seed = config.retention.seed.map(|seed| seed.to_string());
    lines.push(render_line(
        "retention.seed",
        seed.as_deref().unwrap_or("<unset>"),
        source("retention.seed", &["COMBO_RETENTION_SEED"]),
    ));

    lines.push(render_line(
        "limits.max_basket_entities",
        &config.limits.max_basket_entities.to_string(),
        source("limits.max_basket_entities", &["COMBO_MAX_BASKET_ENTITIES"]),
    ));
    lines.push(render_line(
        "output.top_n",
        &config.output.top_n.to_string(),
        source("output.top_n", &["COMBO_OUTPUT_TOP_N"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["COMBO_LOGGING_LEVEL", "COMBO_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["COMBO_LOGGING_FORMAT", "COMBO_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("combo.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/combo.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| is_set(key)) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// Blank values are ignored by the loader, so they do not count as a source.
fn is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, render_line};

    #[test]
    fn nested_key_paths_resolve_against_toml() {
        let doc: toml::Value = "[retention]\nmode = \"random\"\n".parse().unwrap();

        assert!(contains_path(&doc, "retention.mode"));
        assert!(!contains_path(&doc, "retention.seed"));
        assert!(!contains_path(&doc, "objectives.lift"));
    }

    #[test]
    fn lines_carry_value_and_source() {
        assert_eq!(
            render_line("output.top_n", "10", "default".to_string()),
            "- output.top_n = 10 (source: default)"
        );
    }
}
