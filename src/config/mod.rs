//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::SocketAddr,
    num::NonZeroU32,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use syntect::highlighting::ThemeSet;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    BuildArgs, CleanArgs, CliArgs, Command, InspectArgs, LoggingOverrides, OutputOverride,
    SceneArgs, ServeArgs, ServeOverrides, TaskSelector,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "stipple";
const DEFAULT_SITE_TITLE: &str = "stipple";
const DEFAULT_SITE_URL: &str = "http://localhost:8080";
const DEFAULT_SITE_LANGUAGE: &str = "en";
const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_ASSETS_DIR: &str = "assets";
const DEFAULT_OUTPUT_DIR: &str = "dist";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 10;
const DEFAULT_WATCH_INTERVAL_MS: u64 = 500;
pub(crate) const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.light";
const DEFAULT_SCENE_WIDTH: u32 = 640;
const DEFAULT_SCENE_HEIGHT: u32 = 480;
const DEFAULT_SCENE_FRAMES: u32 = 1;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteSettings,
    pub paths: PathSettings,
    pub server: ServerSettings,
    pub watch: WatchSettings,
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub scene: SceneSettings,
}

/// Site-wide metadata exposed to layouts, feeds and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub title: String,
    /// Absolute base URL without a trailing slash.
    pub url: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub cname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    pub content: PathBuf,
    pub assets: PathBuf,
    pub output: PathBuf,
    pub extra_fonts: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    /// Serve HTTPS with this certificate when set.
    pub tls: Option<TlsSettings>,
}

/// PEM-encoded certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub enabled: bool,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub syntax_theme: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSettings {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
    pub frames: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("STIPPLE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Build(args)) => raw.apply_build_overrides(args),
        Some(Command::Clean(args)) => raw.apply_output_override(&args.output),
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Scene(args)) => raw.apply_scene_overrides(args),
        Some(Command::Inspect(_)) => {}
        None => raw.apply_build_overrides(&BuildArgs::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    site: RawSiteSettings,
    paths: RawPathSettings,
    server: RawServerSettings,
    watch: RawWatchSettings,
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    scene: RawSceneSettings,
}

impl RawSettings {
    fn apply_build_overrides(&mut self, args: &BuildArgs) {
        self.apply_output_override(&args.output);
        self.apply_logging_overrides(&args.logging);
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.port {
            self.server.port = Some(port);
        }
        if let Some(cert) = overrides.tls_cert.as_ref() {
            self.server.tls.cert = Some(cert.clone());
        }
        if let Some(key) = overrides.tls_key.as_ref() {
            self.server.tls.key = Some(key.clone());
        }
        if let Some(watch) = overrides.watch {
            self.watch.enabled = Some(watch);
        }
        self.apply_output_override(&overrides.output);
        self.apply_logging_overrides(&overrides.logging);
    }

    fn apply_scene_overrides(&mut self, args: &SceneArgs) {
        if let Some(width) = args.width {
            self.scene.width = Some(width);
        }
        if let Some(height) = args.height {
            self.scene.height = Some(height);
        }
        if let Some(frames) = args.frames {
            self.scene.frames = Some(frames);
        }
    }

    fn apply_output_override(&mut self, overrides: &OutputOverride) {
        if let Some(output) = overrides.output.as_ref() {
            self.paths.output = Some(output.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            site,
            paths,
            server,
            watch,
            logging,
            render,
            scene,
        } = raw;

        Ok(Self {
            site: build_site_settings(site)?,
            paths: build_path_settings(paths)?,
            server: build_server_settings(server)?,
            watch: build_watch_settings(watch)?,
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render)?,
            scene: build_scene_settings(scene)?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        // Every default is valid, so this cannot fail.
        match Settings::from_raw(RawSettings::default()) {
            Ok(settings) => settings,
            Err(err) => unreachable!("default settings are invalid: {err}"),
        }
    }
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let url = site.url.unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|err| LoadError::invalid("site.url", format!("failed to parse: {err}")))?;
    if parsed.cannot_be_a_base() {
        return Err(LoadError::invalid("site.url", "must be an absolute URL"));
    }

    let cname = site.cname.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Ok(SiteSettings {
        title: site.title.unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        url: trimmed.to_string(),
        description: site.description.unwrap_or_default(),
        author: site.author.unwrap_or_default(),
        language: site
            .language
            .unwrap_or_else(|| DEFAULT_SITE_LANGUAGE.to_string()),
        cname,
    })
}

fn build_path_settings(paths: RawPathSettings) -> Result<PathSettings, LoadError> {
    let content = non_empty_path(paths.content, DEFAULT_CONTENT_DIR, "paths.content")?;
    let assets = non_empty_path(paths.assets, DEFAULT_ASSETS_DIR, "paths.assets")?;
    let output = non_empty_path(paths.output, DEFAULT_OUTPUT_DIR, "paths.output")?;

    let extra_fonts = match paths.extra_fonts {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "paths.extra_fonts",
                "path must not be empty",
            ));
        }
        other => other,
    };

    Ok(PathSettings {
        content,
        assets,
        output,
        extra_fonts,
    })
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let tls = match (server.tls.cert, server.tls.key) {
        (None, None) => None,
        (Some(cert), Some(key)) if !cert.as_os_str().is_empty() && !key.as_os_str().is_empty() => {
            Some(TlsSettings { cert, key })
        }
        (Some(_), Some(_)) => {
            return Err(LoadError::invalid(
                "server.tls",
                "certificate and key paths must not be empty",
            ));
        }
        _ => {
            return Err(LoadError::invalid(
                "server.tls",
                "`cert` and `key` must be given together",
            ));
        }
    };

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        tls,
    })
}

fn build_watch_settings(watch: RawWatchSettings) -> Result<WatchSettings, LoadError> {
    let interval_ms = watch.interval_ms.unwrap_or(DEFAULT_WATCH_INTERVAL_MS);
    if interval_ms == 0 {
        return Err(LoadError::invalid(
            "watch.interval_ms",
            "must be greater than zero",
        ));
    }

    Ok(WatchSettings {
        enabled: watch.enabled.unwrap_or(false),
        interval: Duration::from_millis(interval_ms),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let syntax_theme = render
        .syntax_theme
        .unwrap_or_else(|| DEFAULT_SYNTAX_THEME.to_string());

    let themes = ThemeSet::load_defaults();
    if !themes.themes.contains_key(&syntax_theme) {
        let known = themes.themes.keys().cloned().collect::<Vec<_>>().join(", ");
        return Err(LoadError::invalid(
            "render.syntax_theme",
            format!("unknown theme `{syntax_theme}` (known: {known})"),
        ));
    }

    Ok(RenderSettings { syntax_theme })
}

fn build_scene_settings(scene: RawSceneSettings) -> Result<SceneSettings, LoadError> {
    Ok(SceneSettings {
        width: non_zero_u32(
            scene.width.unwrap_or(DEFAULT_SCENE_WIDTH).into(),
            "scene.width",
        )?,
        height: non_zero_u32(
            scene.height.unwrap_or(DEFAULT_SCENE_HEIGHT).into(),
            "scene.height",
        )?,
        frames: non_zero_u32(
            scene.frames.unwrap_or(DEFAULT_SCENE_FRAMES).into(),
            "scene.frames",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    author: Option<String>,
    language: Option<String>,
    cname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPathSettings {
    content: Option<PathBuf>,
    assets: Option<PathBuf>,
    output: Option<PathBuf>,
    extra_fonts: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    tls: RawTlsSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTlsSettings {
    cert: Option<PathBuf>,
    key: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWatchSettings {
    enabled: Option<bool>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    syntax_theme: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSceneSettings {
    width: Option<u32>,
    height: Option<u32>,
    frames: Option<u32>,
}

fn non_empty_path(
    value: Option<PathBuf>,
    default: &str,
    key: &'static str,
) -> Result<PathBuf, LoadError> {
    let path = value.unwrap_or_else(|| PathBuf::from(default));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(key, "path must not be empty"));
    }
    Ok(path)
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
