use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use tracing::warn;

use crate::TfaError;

// ─── Platform helpers ─────────────────────────────────────────────────────────

/// Returns the user's home directory from `$HOME`, with a `.` fallback.
fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user-level config file path.
/// Respects `$XDG_CONFIG_HOME`; falls back to `~/.config`.
pub fn user_config_path() -> PathBuf {
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_home.join("tfavail/config.toml")
}

/// Project-level config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".tfavail.toml";

// ─── Public config types ──────────────────────────────────────────────────────

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct TfaConfig {
    pub model: ModelConfig,
    pub output: OutputConfig,
    pub app: AppConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub region: String,    // default: ap-northeast-1
    pub model_id: String,  // default: Claude 3.5 Sonnet on Bedrock
    pub max_tokens: u32,   // default: 4096
    pub temperature: f32,  // default: 0.2
    pub timeout_secs: u64, // default: 120
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf, // default: ./output
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub language: Language, // default: ja
    pub debug: bool,        // default: false
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub color: bool,          // default: true (still subject to NO_COLOR / TTY)
    pub width: Option<usize>, // default: detect from $COLUMNS
}

/// Language of prompts and report labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn parse(s: &str) -> Result<Language, TfaError> {
        match s.trim().to_lowercase().as_str() {
            "ja" | "japanese" => Ok(Language::Ja),
            "en" | "english" => Ok(Language::En),
            other => Err(TfaError::Config(format!(
                "Unknown language '{}': expected ja or en",
                other
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CLI-provided values that override any config layer. Applied last.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub region: Option<String>,
    pub model_id: Option<String>,
    pub language: Option<Language>,
    pub output_dir: Option<PathBuf>,
    pub no_color: bool,
    pub debug: bool,
}

// ─── Default implementations ──────────────────────────────────────────────────

pub const DEFAULT_REGION: &str = "ap-northeast-1";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            region: DEFAULT_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("output"),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            color: true,
            width: None,
        }
    }
}

// ─── Config loading ───────────────────────────────────────────────────────────

impl TfaConfig {
    /// Load config with full layered resolution:
    /// built-in defaults → user config → project config → env vars
    ///
    /// CLI overrides are applied separately via `apply_overrides()`.
    pub fn load() -> Result<Self, TfaError> {
        let mut config = TfaConfig::default();

        // Layer 2: user config (~/.config/tfavail/config.toml)
        let user_path = user_config_path();
        if user_path.exists() {
            let toml_config = load_toml_file(&user_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        // Layer 3: project config (.tfavail.toml in cwd)
        let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            let toml_config = load_toml_file(&project_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        // Layer 4: environment variables
        apply_env_vars(&mut config, |key| env::var(key).ok());

        Ok(config)
    }

    /// Apply CLI-flag overrides (highest priority, called after `load()`).
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(region) = &overrides.region {
            self.model.region = region.clone();
        }
        if let Some(model_id) = &overrides.model_id {
            self.model.model_id = model_id.clone();
        }
        if let Some(language) = overrides.language {
            self.app.language = language;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output.directory = dir.clone();
        }
        if overrides.no_color {
            self.console.color = false;
        }
        if overrides.debug {
            self.app.debug = true;
        }
    }

    /// Where a report file named on the command line is written. Absolute
    /// paths are kept; anything else lands in the output directory under its
    /// file name.
    pub fn resolve_output_path(&self, requested: &Path) -> PathBuf {
        if requested.is_absolute() {
            return requested.to_path_buf();
        }
        match requested.file_name() {
            Some(name) => self.output.directory.join(name),
            None => self.output.directory.join(requested),
        }
    }
}

// ─── TOML deserialization structs ─────────────────────────────────────────────
// These mirror the config file format. All fields are optional so that a
// partial config file merges cleanly on top of the defaults.

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    model: TomlModelConfig,
    #[serde(default)]
    output: TomlOutputConfig,
    #[serde(default)]
    app: TomlAppConfig,
    #[serde(default)]
    console: TomlConsoleConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlModelConfig {
    region: Option<String>,
    model_id: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlOutputConfig {
    directory: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlAppConfig {
    language: Option<String>,
    debug: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConsoleConfig {
    color: Option<bool>,
    width: Option<usize>,
}

// ─── TOML loading and merging ─────────────────────────────────────────────────

fn load_toml_file(path: &Path) -> Result<TomlConfig, TfaError> {
    let content = fs::read_to_string(path).map_err(|e| {
        TfaError::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| TfaError::Config(format!("Malformed config file {}: {}", path.display(), e)))
}

fn merge_toml(config: &mut TfaConfig, toml: TomlConfig) -> Result<(), TfaError> {
    let m = &toml.model;
    if let Some(v) = &m.region {
        config.model.region = v.clone();
    }
    if let Some(v) = &m.model_id {
        config.model.model_id = v.clone();
    }
    if let Some(v) = m.max_tokens {
        if v == 0 {
            return Err(TfaError::Config("max_tokens must be positive".to_string()));
        }
        config.model.max_tokens = v;
    }
    if let Some(v) = m.temperature {
        config.model.temperature = parse_temperature(v)?;
    }
    if let Some(v) = m.timeout_secs {
        if v == 0 {
            return Err(TfaError::Config("timeout_secs must be positive".to_string()));
        }
        config.model.timeout_secs = v;
    }

    if let Some(v) = &toml.output.directory {
        if !v.is_empty() {
            config.output.directory = tilde_expand(v);
        }
    }

    let a = &toml.app;
    if let Some(v) = &a.language {
        config.app.language = Language::parse(v)?;
    }
    if let Some(v) = a.debug {
        config.app.debug = v;
    }

    let c = &toml.console;
    if let Some(v) = c.color {
        config.console.color = v;
    }
    if let Some(v) = c.width {
        config.console.width = Some(v);
    }

    Ok(())
}

// ─── Environment variable overrides ──────────────────────────────────────────

/// Applies environment overrides read through `lookup`. Values that do not
/// parse are skipped with a warning; they never abort the run.
fn apply_env_vars(config: &mut TfaConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("AWS_REGION").filter(|v| !v.trim().is_empty()) {
        config.model.region = v;
    }
    if let Some(v) = lookup("TFAVAIL_MODEL_ID").filter(|v| !v.trim().is_empty()) {
        config.model.model_id = v;
    }
    if let Some(v) = lookup("TFAVAIL_OUTPUT_DIR").filter(|v| !v.trim().is_empty()) {
        config.output.directory = tilde_expand(&v);
    }
    if let Some(v) = lookup("TFAVAIL_LANGUAGE") {
        match Language::parse(&v) {
            Ok(language) => config.app.language = language,
            Err(_) => warn!(value = %v, "ignoring invalid TFAVAIL_LANGUAGE"),
        }
    }
    if let Some(v) = lookup("TFAVAIL_DEBUG") {
        match parse_bool(&v) {
            Some(debug) => config.app.debug = debug,
            None => warn!(value = %v, "ignoring invalid TFAVAIL_DEBUG"),
        }
    }
    if let Some(v) = lookup("TFAVAIL_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.model.timeout_secs = secs,
            _ => warn!(value = %v, "ignoring invalid TFAVAIL_TIMEOUT_SECS"),
        }
    }
}

// ─── Helper functions ─────────────────────────────────────────────────────────

/// Expands a leading `~` to the user's home directory.
pub fn tilde_expand(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_temperature(v: f32) -> Result<f32, TfaError> {
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(TfaError::Config(format!(
            "temperature {} is out of range: expected 0.0 to 1.0",
            v
        )))
    }
}

// ─── tfavail init ─────────────────────────────────────────────────────────────

/// Generate a well-commented default `config.toml` as a String.
/// Every field is present but commented out, giving users a starting point.
pub fn generate_default_config() -> String {
    r#"# tfavail configuration file
# All fields are optional. Uncomment and modify as needed.
# Values shown are the built-in defaults.

[model]
# region = "ap-northeast-1"                                  # Bedrock region (env: AWS_REGION)
# model_id = "anthropic.claude-3-5-sonnet-20240620-v1:0"     # env: TFAVAIL_MODEL_ID
# max_tokens = 4096                                          # Upper bound on the answer length
# temperature = 0.2                                          # 0.0 to 1.0
# timeout_secs = 120                                         # env: TFAVAIL_TIMEOUT_SECS

[output]
# directory = "output"      # Relative report paths are written here (env: TFAVAIL_OUTPUT_DIR)

[app]
# language = "ja"           # Prompt and report language: ja | en (env: TFAVAIL_LANGUAGE)
# debug = false             # Verbose diagnostics on stderr (env: TFAVAIL_DEBUG)

[console]
# color = true              # Colored terminal output (NO_COLOR always wins)
# width = 100               # Wrap width; defaults to $COLUMNS or 100
"#
    .to_string()
}

/// Write the default config file to `~/.config/tfavail/config.toml`.
///
/// Returns the path written. Errors if the file already exists and `force` is false.
pub fn write_default_config(force: bool) -> Result<PathBuf, TfaError> {
    write_default_config_to(&user_config_path(), force)
}

fn write_default_config_to(path: &Path, force: bool) -> Result<PathBuf, TfaError> {
    if path.exists() && !force {
        return Err(TfaError::Config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TfaError::Config(format!(
                "Cannot create config directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    fs::write(path, generate_default_config()).map_err(|e| {
        TfaError::Config(format!(
            "Cannot write config file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(path.to_path_buf())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
