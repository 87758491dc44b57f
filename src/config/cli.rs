use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the stipple binary.
#[derive(Debug, Parser)]
#[command(
    name = "stipple",
    version,
    about = "Static blog generator with a dithered scene renderer"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STIPPLE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the site into the output directory.
    Build(BuildArgs),
    /// Remove the output directory.
    Clean(CleanArgs),
    /// Serve the output directory, optionally rebuilding on change.
    Serve(Box<ServeArgs>),
    /// Render a glTF model through the dither pipeline into a PNG.
    Scene(SceneArgs),
    /// Print a structural summary of a glTF model.
    Inspect(InspectArgs),
}

/// Build steps selectable with `--only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskSelector {
    /// Posts, pages and feeds.
    Content,
    Posts,
    Pages,
    Feeds,
    Styles,
    Scripts,
    Fonts,
    Misc,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BuildArgs {
    /// Restrict the build to these tasks; prerequisites are added automatically.
    #[arg(long = "only", value_enum, value_delimiter = ',', value_name = "TASK")]
    pub only: Vec<TaskSelector>,

    #[command(flatten)]
    pub output: OutputOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub output: OutputOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct OutputOverride {
    /// Override the output directory.
    #[arg(long = "output", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Override the listener port.
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// PEM certificate chain; serves HTTPS together with `--tls-key`.
    #[arg(long = "tls-cert", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key for `--tls-cert`.
    #[arg(long = "tls-key", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub tls_key: Option<PathBuf>,

    /// Rebuild when content or assets change.
    #[arg(
        long = "watch",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub watch: Option<bool>,

    #[command(flatten)]
    pub output: OutputOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct SceneArgs {
    /// Model to render (`.glb` or `.gltf`).
    #[arg(value_name = "MODEL", value_hint = ValueHint::FilePath)]
    pub model: PathBuf,

    /// PNG file to write.
    #[arg(long = "out", value_name = "PNG", value_hint = ValueHint::FilePath)]
    pub out: PathBuf,

    /// Override the frame width in pixels.
    #[arg(long = "width", value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Override the frame height in pixels.
    #[arg(long = "height", value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Number of animation steps to advance before the written frame.
    #[arg(long = "frames", value_name = "COUNT")]
    pub frames: Option<u32>,

    /// Swap the light and dark inks.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dark: bool,

    /// Horizontal page scroll offset applied to the camera.
    #[arg(long = "scroll-x", value_name = "PIXELS", default_value_t = 0.0)]
    pub scroll_x: f32,

    /// Vertical page scroll offset applied to the camera.
    #[arg(long = "scroll-y", value_name = "PIXELS", default_value_t = 0.0)]
    pub scroll_y: f32,
}

#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    /// Models to inspect (`.glb` or `.gltf`). A model named twice is parsed once.
    #[arg(value_name = "MODEL", value_hint = ValueHint::FilePath, required = true, num_args = 1..)]
    pub models: Vec<PathBuf>,
}
