// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for ctrf-reporter.
//!
//! Configuration is layered, from lowest to highest priority:
//!
//! 1. the default config shipped with this crate ([`CtrfConfig::DEFAULT_CONFIG`]),
//! 2. a repository config file (by default `.config/ctrf.toml`),
//! 3. environment variables prefixed with `CTRF_`, using `__` to separate sections
//!    (e.g. `CTRF_REPORT__PATH`, `CTRF_ENVIRONMENT__BUILD_NUMBER`),
//! 4. explicit overrides, such as those passed in by a test harness adapter.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

/// Overall configuration for ctrf-reporter.
///
/// The engine reads configuration only through this type; it never looks at the process
/// environment or the filesystem for configuration itself.
#[derive(Clone, Debug)]
pub struct CtrfConfig {
    report_path: Utf8PathBuf,
    inner: CtrfConfigImpl,
}

impl CtrfConfig {
    /// The default location of the config within a root directory: `.config/ctrf.toml`.
    pub const CONFIG_PATH: &'static str = ".config/ctrf.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Environment configuration uses this prefix, plus a _.
    pub const ENVIRONMENT_PREFIX: &'static str = "CTRF";

    /// Separates sections from keys in environment variable names.
    pub const ENVIRONMENT_SEPARATOR: &'static str = "__";

    /// Returns the default config.
    ///
    /// The report path is left relative, so it resolves against the current directory.
    pub fn default_config() -> Self {
        let config = Self::make_default_config()
            .build()
            .expect("default config is always valid");

        let inner: CtrfConfigImpl = config
            .try_deserialize()
            .expect("default config is always valid");
        Self {
            report_path: inner.report.path.clone(),
            inner,
        }
    }

    /// Reads the config from the given file, or if not specified from `.config/ctrf.toml` in
    /// `root`, then applies `CTRF_` environment variables from the current process and finally
    /// `overrides`.
    ///
    /// A relative report path is resolved against `root`.
    pub fn from_sources<'a>(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigParseError> {
        Self::read_from_sources(root.into(), config_file, std::env::vars(), overrides)
    }

    /// Like [`from_sources`](Self::from_sources), but reads environment variables from `env`
    /// instead of the current process.
    pub fn from_sources_with_env<'a>(
        root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        env: impl IntoIterator<Item = (String, String)>,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigParseError> {
        Self::read_from_sources(root.into(), config_file, env, overrides)
    }

    /// Applies `overrides` on top of the default config, without reading any file or environment
    /// variable.
    ///
    /// Keys use the same dotted form as the config file, e.g. `report.max-message-length`.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigParseError> {
        let builder = Self::apply_overrides(Self::make_default_config(), overrides)
            .map_err(|kind| ConfigParseError::new("<overrides>", kind))?;
        let inner = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new("<overrides>", kind))?;
        Ok(Self {
            report_path: inner.report.path.clone(),
            inner,
        })
    }

    /// Returns the path the report is written to and merged from.
    pub fn report_path(&self) -> &Utf8Path {
        &self.report_path
    }

    /// Returns the maximum number of characters stored in a test's `message`.
    pub fn max_message_length(&self) -> usize {
        self.inner.report.max_message_length
    }

    /// Returns true if the startup duration should be added to the summary.
    pub fn calculate_startup_duration(&self) -> bool {
        self.inner.report.calculate_startup_duration
    }

    /// Returns the name of the test tool.
    pub fn tool_name(&self) -> &str {
        &self.inner.tool.name
    }

    /// Returns the version of the test tool, if configured.
    pub fn tool_version(&self) -> Option<&str> {
        self.inner.tool.version.as_deref()
    }

    /// Returns the environment metadata.
    pub fn environment(&self) -> &EnvironmentConfig {
        &self.inner.environment
    }

    // ---
    // Helper methods
    // ---

    fn read_from_sources<'a>(
        root: Utf8PathBuf,
        file: Option<&Utf8Path>,
        env: impl IntoIterator<Item = (String, String)>,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigParseError> {
        // First, get the default config.
        let builder = Self::make_default_config();

        // Next, merge in the config from the given file.
        let (config_file, source) = match file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        let builder = builder.add_source(source);

        // Environment variables come next.
        let builder = builder.add_source(
            Environment::with_prefix(Self::ENVIRONMENT_PREFIX)
                .prefix_separator("_")
                .separator(Self::ENVIRONMENT_SEPARATOR)
                .source(Some(normalize_env_keys(env))),
        );

        // Explicit overrides win over everything else.
        let builder = Self::apply_overrides(builder, overrides)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        let inner = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        Ok(Self {
            report_path: root.join(&inner.report.path),
            inner,
        })
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn apply_overrides<'a>(
        mut builder: ConfigBuilder<DefaultState>,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigParseErrorKind> {
        for (key, value) in overrides {
            builder = builder
                .set_override(key, value)
                .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;
        }
        Ok(builder)
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<CtrfConfigImpl, ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        serde_path_to_error::deserialize(config)
            .map_err(|error| ConfigParseErrorKind::DeserializeError(Box::new(error)))
    }
}

/// Rewrites `CTRF_` variable names so that they map onto the kebab-case keys used by the config
/// file.
///
/// `CTRF_REPORT__MAX_MESSAGE_LENGTH` becomes `CTRF_REPORT__MAX-MESSAGE-LENGTH`, which the
/// environment source then turns into `report.max-message-length`. Other variables are dropped.
fn normalize_env_keys(
    env: impl IntoIterator<Item = (String, String)>,
) -> config::Map<String, String> {
    let prefix = format!("{}_", CtrfConfig::ENVIRONMENT_PREFIX);
    env.into_iter()
        .filter_map(|(key, value)| {
            let rest = key.to_ascii_uppercase().strip_prefix(&prefix)?.to_owned();
            let sections: Vec<_> = rest
                .split(CtrfConfig::ENVIRONMENT_SEPARATOR)
                .map(|section| section.replace('_', "-"))
                .collect();
            Some((
                format!("{prefix}{}", sections.join(CtrfConfig::ENVIRONMENT_SEPARATOR)),
                value,
            ))
        })
        .collect()
}

/// Metadata about the environment a run happens in, copied into the report's `environment`
/// object.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentConfig {
    /// A name for the report.
    #[serde(default)]
    pub report_name: Option<String>,
    /// The name of the application under test.
    #[serde(default)]
    pub app_name: Option<String>,
    /// The version of the application under test.
    #[serde(default)]
    pub app_version: Option<String>,
    /// The name of the build.
    #[serde(default)]
    pub build_name: Option<String>,
    /// The build number.
    #[serde(default)]
    pub build_number: Option<String>,
    /// A link to the build.
    #[serde(default)]
    pub build_url: Option<String>,
    /// The name of the source repository.
    #[serde(default)]
    pub repository_name: Option<String>,
    /// A link to the source repository.
    #[serde(default)]
    pub repository_url: Option<String>,
    /// The commit that was tested.
    #[serde(default)]
    pub commit: Option<String>,
    /// The branch that was tested.
    #[serde(default)]
    pub branch_name: Option<String>,
    /// The operating system platform.
    #[serde(default)]
    pub os_platform: Option<String>,
    /// The operating system release.
    #[serde(default)]
    pub os_release: Option<String>,
    /// The operating system version.
    #[serde(default)]
    pub os_version: Option<String>,
    /// The environment the tests ran against, e.g. "staging".
    #[serde(default)]
    pub test_environment: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CtrfConfigImpl {
    report: ReportConfigImpl,
    tool: ToolConfigImpl,
    #[serde(default)]
    environment: EnvironmentConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportConfigImpl {
    path: Utf8PathBuf,
    max_message_length: usize,
    calculate_startup_duration: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ToolConfigImpl {
    name: String,
    #[serde(default)]
    version: Option<String>,
}
