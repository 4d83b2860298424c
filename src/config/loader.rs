//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BrokerConfig;
use crate::config::ConfigError;

/// Load configuration from a TOML file.
///
/// Syntax errors are fatal here; semantic validation of cluster settings
/// happens when the typed cluster configs are built during startup.
pub fn load_config(path: &Path) -> Result<BrokerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BrokerConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_config_from_file() {
        let mut file = tempfile_path("broker-ok");
        writeln!(
            file.1,
            "[listener]\nbind_address = \"127.0.0.1:0\"\n\n[clusters.data]\nurl = \"http://es:9200\"\n"
        )
        .unwrap();

        let config = load_config(&file.0).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:0");
        assert_eq!(config.clusters.data.url, "http://es:9200");
        let _ = std::fs::remove_file(&file.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile_path("broker-bad");
        writeln!(file.1, "this is not toml [").unwrap();

        let err = load_config(&file.0).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let _ = std::fs::remove_file(&file.0);
    }

    fn tempfile_path(tag: &str) -> (std::path::PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!(
            "search-broker-{tag}-{}.toml",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
