use clap::{App, ArgMatches};
use env_logger::Env;

use shader::source::{self, ShaderStageKind};
use shader::ProgramBuilder;

use crate::graphics::opengl::OffscreenGl;

use super::config::CheckConfig;
use super::error::CliError;

/// Hands `f` the app described in `cli.yaml`. The app borrows the loaded YAML, so it can't
/// outlive this call.
pub fn with_cli_app<T, F>(f: F) -> T
    where F: FnOnce(App) -> T
{
    let yaml = load_yaml!("cli.yaml");
    f(App::from_yaml(yaml))
}

pub fn cli_main() -> i32 {
    with_cli_app(|app| run(&app.get_matches()))
}

fn run(matches: &ArgMatches) -> i32 {
    init_logging(matches.occurrences_of("verbose"));

    let result = match matches.subcommand() {
        ("split", Some(m)) => split(m),
        ("check", Some(m)) => check(m),
        (other, _) => Err(CliError::Config(format!("unknown command \"{}\"", other))),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// `RUST_LOG` wins if it's set; otherwise each `-v` turns the default filter up a notch.
fn init_logging(verbosity: u64) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default)).init();
}

fn split(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches.value_of("FILE")
        .ok_or_else(|| CliError::Config("no shader file given".to_owned()))?;

    let document = source::parse(path)?;

    let dropped = document.source(ShaderStageKind::Unknown).lines().count();
    if dropped > 0 {
        warn!("{} line(s) before the first #shader tag in {} were ignored", dropped, path);
    }

    match matches.value_of("stage") {
        Some(stage) => {
            let stage: ShaderStageKind = stage.parse().map_err(CliError::Config)?;
            print!("{}", document.source(stage));
        }
        None => print!("{}", document.to_tagged_string()),
    }

    Ok(())
}

fn check(matches: &ArgMatches) -> Result<(), CliError> {
    let config = CheckConfig::from_matches(matches)?;
    let document = source::parse(&config.path)?;

    let offscreen = OffscreenGl::create(&config)?;
    let gl = offscreen.load()?;

    info!("OpenGL {}, GLSL {}",
          gl.version().unwrap_or_else(|| "(unknown)".to_owned()),
          gl.shading_language_version().unwrap_or_else(|| "(unknown)".to_owned()));

    let builder = ProgramBuilder::new(&gl).validate(config.validate);
    let program = builder.build(&document)?;

    println!("{}: {} (program #{})", config.path.display(), builder.state(), program.id());

    Ok(())
}
