/// Configuration management
use crate::error::{NotifyError, Result};
use crate::event::EventKind;
use crate::fallback::FallbackMode;
use crate::request::DEFAULT_APP_NAME;
use crate::service::client::DEFAULT_CALL_TIMEOUT;
use crate::service::ServiceEndpoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name sent with every notification
    pub app_name: String,

    /// Bus name, object path and interface of the notification service
    pub endpoint: ServiceEndpoint,

    /// Upper bound for a single bus call
    pub call_timeout: Duration,

    /// Directory holding `<address>.png` avatars
    pub avatar_dir: Option<PathBuf>,

    /// Image used when a contact has no avatar
    pub default_avatar: Option<PathBuf>,

    /// Event kinds that are never shown
    pub muted: Vec<EventKind>,

    /// Local popup used when the service does not deliver
    pub fallback: FallbackMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            endpoint: ServiceEndpoint::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            avatar_dir: None,
            default_avatar: None,
            muted: Vec::new(),
            fallback: FallbackMode::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let config = serde_json::from_slice(&raw)?;
        Ok(config)
    }

    /// Create config from command line arguments.
    ///
    /// Consumes the configuration flags and returns the remaining arguments
    /// (including `args[0]`) untouched, in order.
    pub fn from_args(args: &[String]) -> Result<(Self, Vec<String>)> {
        let mut config = Self::default();
        let mut rest = Vec::new();

        // --config first so flags on the command line override the file
        if let Some(pos) = args.iter().position(|a| a == "--config") {
            let path = args.get(pos + 1).ok_or_else(|| {
                NotifyError::Config("--config requires a path argument".to_string())
            })?;
            config = Self::load(Path::new(path))?;
        }

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 2;
                }
                "--app-name" => {
                    let name = flag_value(args, i, "--app-name")?;
                    config.app_name = name.to_string();
                    i += 2;
                }
                "--timeout-ms" => {
                    let ms = flag_value(args, i, "--timeout-ms")?;
                    config.call_timeout = parse_timeout(ms)?;
                    i += 2;
                }
                "--avatar-dir" => {
                    let path = flag_value(args, i, "--avatar-dir")?;
                    config.avatar_dir = Some(PathBuf::from(path));
                    i += 2;
                }
                "--default-avatar" => {
                    let path = flag_value(args, i, "--default-avatar")?;
                    config.default_avatar = Some(PathBuf::from(path));
                    i += 2;
                }
                "--mute" => {
                    let kind = flag_value(args, i, "--mute")?;
                    let kind = kind.parse::<EventKind>().map_err(NotifyError::Config)?;
                    if !config.muted.contains(&kind) {
                        config.muted.push(kind);
                    }
                    i += 2;
                }
                "--silent-fallback" => {
                    config.fallback = FallbackMode::Silent;
                    i += 1;
                }
                other => {
                    rest.push(other.to_string());
                    i += 1;
                }
            }
        }

        // Env overrides
        if let Ok(name) = std::env::var("FDNOTIFY_APP_NAME") {
            if !name.is_empty() {
                config.app_name = name;
            }
        }
        if let Some(timeout) = std::env::var("FDNOTIFY_TIMEOUT_MS")
            .ok()
            .and_then(|s| parse_timeout(&s).ok())
        {
            config.call_timeout = timeout;
        }
        if let Ok(dir) = std::env::var("FDNOTIFY_AVATAR_DIR") {
            config.avatar_dir = Some(PathBuf::from(dir));
        }

        Ok((config, rest))
    }
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| NotifyError::Config(format!("{} requires an argument", flag)))
}

fn parse_timeout(ms: &str) -> Result<Duration> {
    let ms = ms
        .parse::<u64>()
        .map_err(|_| NotifyError::Config(format!("invalid timeout '{}'", ms)))?;
    if ms == 0 {
        return Err(NotifyError::Config("timeout must be positive".to_string()));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.app_name, "Psi");
        assert_eq!(c.endpoint.service, "org.freedesktop.Notifications");
        assert_eq!(c.endpoint.path, "/org/freedesktop/Notifications");
        assert!(c.muted.is_empty());
        assert_eq!(c.fallback, FallbackMode::Console);
    }

    #[test]
    fn test_flags_are_consumed() {
        let (c, rest) = Config::from_args(&args(&[
            "fdnotify",
            "chat",
            "--app-name",
            "Tester",
            "a@b",
            "--mute",
            "offline",
            "--silent-fallback",
            "--body",
            "hi",
        ]))
        .unwrap();

        assert_eq!(c.app_name, "Tester");
        assert_eq!(c.muted, vec![EventKind::PresenceOffline]);
        assert_eq!(c.fallback, FallbackMode::Silent);
        assert_eq!(rest, args(&["fdnotify", "chat", "a@b", "--body", "hi"]));
    }

    #[test]
    fn test_bad_values() {
        assert!(Config::from_args(&args(&["x", "--timeout-ms", "soon"])).is_err());
        assert!(Config::from_args(&args(&["x", "--timeout-ms", "0"])).is_err());
        assert!(Config::from_args(&args(&["x", "--mute", "everything"])).is_err());
        assert!(Config::from_args(&args(&["x", "--app-name"])).is_err());
    }

    #[test]
    fn test_load_json_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.json");
        std::fs::write(&path, r#"{"app_name":"FromFile","muted":["file"]}"#).unwrap();

        let (c, _) = Config::from_args(&args(&[
            "x",
            "--config",
            path.to_str().unwrap(),
            "--mute",
            "chat",
        ]))
        .unwrap();
        assert_eq!(c.muted, vec![EventKind::File, EventKind::Chat]);
        assert_eq!(c.endpoint, ServiceEndpoint::default());
    }
}
