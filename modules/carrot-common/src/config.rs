use std::path::PathBuf;

use crate::error::CarrotError;

pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Application configuration loaded from environment variables (and `.env`).
/// Safety tables live in an optional JSON file named by `CARROT_SAFETY_POLICY`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // AI / LLM
    pub deepseek_api_key: Option<String>,
    pub deepseek_base_url: String,

    // Planner
    pub planner_model: String,
    pub planner_temperature: f32,
    pub planner_max_tokens: u32,

    // Vetter
    pub vetter_model: String,
    pub vetter_temperature: f32,
    pub vetter_max_tokens: u32,

    // Safety
    pub safety_policy_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deepseek_api_key: None,
            deepseek_base_url: DEFAULT_DEEPSEEK_BASE_URL.to_string(),
            planner_model: DEFAULT_MODEL.to_string(),
            planner_temperature: 0.4,
            planner_max_tokens: 4096,
            vetter_model: DEFAULT_MODEL.to_string(),
            vetter_temperature: 0.1,
            vetter_max_tokens: 2048,
            safety_policy_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, CarrotError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank values take defaults;
    /// values that are set but unparseable are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CarrotError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            deepseek_api_key: get("DEEPSEEK_API_KEY"),
            deepseek_base_url: get("DEEPSEEK_BASE_URL").unwrap_or(defaults.deepseek_base_url),
            planner_model: get("PLANNER_MODEL").unwrap_or(defaults.planner_model),
            planner_temperature: parse_or(
                &get,
                "PLANNER_TEMPERATURE",
                defaults.planner_temperature,
            )?,
            planner_max_tokens: parse_or(&get, "PLANNER_MAX_TOKENS", defaults.planner_max_tokens)?,
            vetter_model: get("VETTER_MODEL").unwrap_or(defaults.vetter_model),
            vetter_temperature: parse_or(&get, "VETTER_TEMPERATURE", defaults.vetter_temperature)?,
            vetter_max_tokens: parse_or(&get, "VETTER_MAX_TOKENS", defaults.vetter_max_tokens)?,
            safety_policy_path: get("CARROT_SAFETY_POLICY").map(PathBuf::from),
        };

        Ok(config)
    }

    pub fn log_redacted(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let head: String = v.chars().take(5).collect();
                    format!("{head}...({} chars)", v.chars().count())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  DEEPSEEK_API_KEY: {}", preview_opt(&self.deepseek_api_key));
        tracing::info!("  DEEPSEEK_BASE_URL: {}", self.deepseek_base_url);
        tracing::info!("  PLANNER_MODEL: {}", self.planner_model);
        tracing::info!("  VETTER_MODEL: {}", self.vetter_model);
        tracing::info!(
            "  CARROT_SAFETY_POLICY: {}",
            self.safety_policy_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string())
        );
    }
}

fn parse_or<T: std::str::FromStr>(
    get: impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CarrotError> {
    match get(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| CarrotError::Config(format!("{key} must be a number, got {v:?}"))),
    }
}
