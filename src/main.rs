use std::{process, sync::Arc};

use glam::Vec2;
use stipple::{
    application::{
        build::{SiteBuilder, plan_selectors},
        error::AppError,
        watch::{Watcher, watch_roots},
    },
    config::{self, BuildArgs, Command, InspectArgs, SceneArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
    scene::{RenderOptions, SceneLibrary, render_frames},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or_else(|| Command::Build(BuildArgs::default()));

    telemetry::init(&settings.logging)?;
    let settings = Arc::new(settings);

    match command {
        Command::Build(args) => run_build(settings, args).await,
        Command::Clean(_) => run_clean(settings),
        Command::Serve(_) => run_serve(settings).await,
        Command::Scene(args) => run_scene(&settings, &SceneLibrary::new(), args),
        Command::Inspect(args) => run_inspect(&SceneLibrary::new(), args),
    }
}

async fn run_build(settings: Arc<Settings>, args: BuildArgs) -> Result<(), AppError> {
    let tasks = plan_selectors(&args.only);
    let builder = SiteBuilder::new(settings);
    let report = tokio::task::spawn_blocking(move || builder.run(&tasks))
        .await
        .map_err(|err| InfraError::task(err.to_string()))??;

    if report.failures > 0 {
        info!(
            target = "stipple::build",
            failures = report.failures,
            "Build completed with skipped items"
        );
    }
    Ok(())
}

fn run_clean(settings: Arc<Settings>) -> Result<(), AppError> {
    SiteBuilder::new(settings).clean()?;
    Ok(())
}

async fn run_serve(settings: Arc<Settings>) -> Result<(), AppError> {
    let builder = SiteBuilder::new(Arc::clone(&settings));
    let initial = builder.clone();
    tokio::task::spawn_blocking(move || initial.run(&plan_selectors(&[])))
        .await
        .map_err(|err| InfraError::task(err.to_string()))??;

    let watcher = settings.watch.enabled.then(|| {
        let roots = watch_roots(&settings.paths.content, &settings.paths.assets);
        let watcher = Watcher::new(builder.clone(), roots, settings.watch.interval);
        tokio::spawn(watcher.run())
    });

    let state = HttpState::new(builder.output().root());
    http::serve(&settings.server, state, watcher).await?;
    Ok(())
}

fn run_scene(settings: &Settings, library: &SceneLibrary, args: SceneArgs) -> Result<(), AppError> {
    let scene = library.get_or_load(&args.model)?;

    let options = RenderOptions {
        width: settings.scene.width.get(),
        height: settings.scene.height.get(),
        frames: settings.scene.frames.get(),
        dark: args.dark,
        scroll: Vec2::new(args.scroll_x, args.scroll_y),
        ..RenderOptions::default()
    };
    let image = render_frames(&scene, &options)?;
    image.save_with_format(&args.out, image::ImageFormat::Png)?;

    info!(
        target = "stipple::scene",
        model = %args.model.display(),
        out = %args.out.display(),
        width = options.width,
        height = options.height,
        frames = options.frames,
        "Scene rendered"
    );
    Ok(())
}

fn run_inspect(library: &SceneLibrary, args: InspectArgs) -> Result<(), AppError> {
    let summaries = library.summaries(&args.models)?;
    let encoded = match summaries.as_slice() {
        [(_, only)] => serde_json::to_string_pretty(only),
        all => serde_json::to_string_pretty(all),
    }
    .map_err(|err| AppError::unexpected(format!("failed to encode summary: {err}")))?;
    println!("{encoded}");
    Ok(())
}

