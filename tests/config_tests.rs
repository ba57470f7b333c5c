//! 配置功能测试

use std::time::Duration;
use stellar_tales::infrastructure::config::{parse_config, Config};

#[test]
fn test_config_defaults() {
    // 测试配置默认值
    let config = Config::default();

    assert_eq!(config.http_proxy, None);
    assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
    assert_eq!(config.cache.cleanup_interval(), Duration::from_secs(600));
    assert_eq!(config.nasa.lookback_days, 7);
    assert_eq!(config.swpc.base_url, "https://services.swpc.noaa.gov");
    assert_eq!(config.service_worker.origin, "http://localhost:5173");
    assert_eq!(config.service_worker.app_max_age(), Duration::from_secs(86_400));
    assert_eq!(
        config.service_worker.static_max_age(),
        Duration::from_secs(7 * 86_400)
    );
    assert_eq!(config.service_worker.shell_assets.len(), 5);
}

#[test]
fn test_logging_defaults() {
    // 测试日志默认值
    let config = Config::default();

    assert!(config.logging.enable);
    assert_eq!(config.logging.level, "WARN");
    assert_eq!(config.logging.path, None);
}

#[test]
fn test_config_toml_format() {
    // 测试 TOML 配置格式
    let toml_content = r#"
http_proxy = "http://127.0.0.1:8080"

[swpc]
base_url = "http://127.0.0.1:9000"

[service_worker]
version = "v6"
shell_assets = ["/", "/index.html"]

[logging]
enable = true
path = "/tmp/test.log"
level = "DEBUG"
"#;

    let config = parse_config(toml_content).unwrap();
    assert_eq!(config.http_proxy.as_deref(), Some("http://127.0.0.1:8080"));
    assert_eq!(config.swpc.base_url, "http://127.0.0.1:9000");
    assert_eq!(config.service_worker.version, "v6");
    assert_eq!(config.service_worker.shell_assets, vec!["/", "/index.html"]);
    // 未写出的字段保持默认
    assert_eq!(config.service_worker.origin, "http://localhost:5173");
    assert_eq!(config.cache.default_ttl_secs, 300);
    assert_eq!(config.logging.path.as_deref(), Some("/tmp/test.log"));
}

#[test]
fn test_generated_sample_parses_back() {
    // 生成的示例配置可以被重新解析
    let sample = toml::to_string_pretty(&Config::default()).unwrap();
    let config = parse_config(&sample).unwrap();

    assert_eq!(config.service_worker.version, "v5");
    assert_eq!(config.cache.default_ttl_secs, 300);
}
