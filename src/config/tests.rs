use super::*;

#[test]
fn defaults_resolve() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.site.title, "stipple");
    assert_eq!(settings.site.url, "http://localhost:8080");
    assert_eq!(settings.paths.output, PathBuf::from("dist"));
    assert_eq!(settings.server.addr.port(), 8080);
    assert_eq!(settings.watch.interval, Duration::from_millis(500));
    assert_eq!(settings.render.syntax_theme, DEFAULT_SYNTAX_THEME);
    assert_eq!(settings.scene.width.get(), 640);
    assert!(!settings.watch.enabled);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        port: Some(4321),
        watch: Some(true),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            log_json: None,
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(settings.watch.enabled);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let args = BuildArgs {
        logging: LoggingOverrides {
            log_level: None,
            log_json: Some(true),
        },
        ..Default::default()
    };

    raw.apply_build_overrides(&args);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn site_url_loses_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.site.url = Some("https://example.com/blog/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.url, "https://example.com/blog");
}

#[test]
fn relative_site_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.url = Some("/blog".to_string());
    let err = Settings::from_raw(raw).expect_err("relative url");
    assert!(matches!(err, LoadError::Invalid { key: "site.url", .. }));
}

#[test]
fn unknown_syntax_theme_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.syntax_theme = Some("no-such-theme".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown theme");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.syntax_theme",
            ..
        }
    ));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.watch.interval_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.scene.frames = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn empty_paths_are_rejected() {
    let mut raw = RawSettings::default();
    raw.paths.output = Some(PathBuf::new());
    let err = Settings::from_raw(raw).expect_err("empty output");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "paths.output",
            ..
        }
    ));
}

#[test]
fn default_to_build_command() {
    let args = CliArgs::parse_from(["stipple"]);
    let command = args
        .command
        .unwrap_or(Command::Build(BuildArgs::default()));
    assert!(matches!(command, Command::Build(_)));
}

#[test]
fn parse_build_arguments() {
    let args = CliArgs::parse_from([
        "stipple",
        "build",
        "--only",
        "pages,styles",
        "--output",
        "/tmp/site",
    ]);

    match args.command.expect("build command") {
        Command::Build(build) => {
            assert_eq!(build.only, vec![TaskSelector::Pages, TaskSelector::Styles]);
            assert_eq!(
                build.output.output.as_deref(),
                Some(std::path::Path::new("/tmp/site"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_watch_flag() {
    let args = CliArgs::parse_from(["stipple", "serve", "--watch", "--port", "9000"]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.watch, Some(true));
            assert_eq!(serve.overrides.port, Some(9000));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_scene_arguments() {
    let args = CliArgs::parse_from([
        "stipple",
        "scene",
        "models/duck.glb",
        "--out",
        "frame.png",
        "--width",
        "320",
        "--dark",
        "--scroll-y",
        "120",
    ]);

    match args.command.expect("scene command") {
        Command::Scene(scene) => {
            assert_eq!(scene.model, PathBuf::from("models/duck.glb"));
            assert_eq!(scene.out, PathBuf::from("frame.png"));
            assert_eq!(scene.width, Some(320));
            assert!(scene.dark);
            assert_eq!(scene.scroll_y, 120.0);
            assert_eq!(scene.scroll_x, 0.0);

            let mut raw = RawSettings::default();
            raw.apply_scene_overrides(&scene);
            let settings = Settings::from_raw(raw).expect("valid settings");
            assert_eq!(settings.scene.width.get(), 320);
            assert_eq!(settings.scene.height.get(), 480);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn tls_paths_load_from_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("stipple.toml");
    std::fs::write(
        &config_path,
        "[server]\nport = 8443\n\n[server.tls]\ncert = \"certs/dev.pem\"\nkey = \"certs/dev-key.pem\"\n",
    )
    .expect("write config");

    let cli = CliArgs::parse_from([
        "stipple",
        "--config-file",
        config_path.to_str().expect("utf-8 path"),
        "serve",
    ]);
    let settings = load(&cli).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 8443);
    assert_eq!(
        settings.server.tls,
        Some(TlsSettings {
            cert: PathBuf::from("certs/dev.pem"),
            key: PathBuf::from("certs/dev-key.pem"),
        })
    );
}

#[test]
fn tls_flags_override_and_default_to_plain_http() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.server.tls, None);

    let args = CliArgs::parse_from([
        "stipple",
        "serve",
        "--tls-cert",
        "cert.pem",
        "--tls-key",
        "key.pem",
    ]);
    let Some(Command::Serve(serve)) = args.command else {
        panic!("wrong command parsed");
    };
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&serve.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    let tls = settings.server.tls.expect("tls configured");
    assert_eq!(tls.cert, PathBuf::from("cert.pem"));
    assert_eq!(tls.key, PathBuf::from("key.pem"));
}

#[test]
fn tls_needs_both_certificate_and_key() {
    let mut raw = RawSettings::default();
    raw.server.tls.cert = Some(PathBuf::from("cert.pem"));
    let err = Settings::from_raw(raw).expect_err("key missing");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.tls",
            ..
        }
    ));
}
