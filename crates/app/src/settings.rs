use chartlab_core::config::AppConfig;
use config::{Config, ConfigError, Environment, File};

/// 环境变量前缀，例如 `CHARTLAB__SCORING__MODE=reference`。
pub const ENV_PREFIX: &str = "CHARTLAB";

/// # Summary
/// 分层加载应用配置。
///
/// # Logic
/// 1. 以内置默认值为底。
/// 2. 叠加可选的配置文件 (不存在时忽略)。
/// 3. 叠加 `CHARTLAB__` 前缀的环境变量，`__` 分隔层级。
///
/// # Arguments
/// * `file`: 配置文件路径，不含扩展名时按支持的格式依次查找。
///
/// # Returns
/// 合并后的配置；格式错误返回 `ConfigError`。
pub fn load(file: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("session.exercise.enabled_tools")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartlab_core::annotation::entity::ToolKind;
    use chartlab_core::config::ScoringMode;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.drawing.history_depth, 20);
        assert_eq!(config.scoring.mode, ScoringMode::Http);
        assert_eq!(config.session.exercise.enabled_tools.len(), ToolKind::ALL.len());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chartlab.toml");
        std::fs::write(
            &path,
            r#"
[scoring]
mode = "reference"

[drawing]
line_hit_tolerance_px = 12.0

[session.exercise]
exercise_type = "fibonacci_retracement"
enabled_tools = ["fibonacci"]
"#,
        )
        .unwrap();
        let config = load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.scoring.mode, ScoringMode::Reference);
        assert_eq!(config.drawing.line_hit_tolerance_px, 12.0);
        assert_eq!(config.drawing.box_edge_tolerance_px, 5.0);
        assert_eq!(config.session.exercise.enabled_tools, vec![ToolKind::Fibonacci]);
        assert_eq!(config.session.chart_number, 1);
    }
}
