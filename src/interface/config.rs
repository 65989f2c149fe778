use std::path::PathBuf;

use clap::ArgMatches;
use glutin::GlProfile;

use super::error::CliError;

/// What `check` was asked to do.
#[derive(Debug)]
pub struct CheckConfig {
    pub path: PathBuf,
    /// OpenGL version to request, as (major, minor)
    pub version: (u8, u8),
    pub profile: GlProfile,
    pub validate: bool,
}

impl CheckConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, CliError> {
        let path = matches.value_of("FILE")
            .map(PathBuf::from)
            .ok_or_else(|| CliError::Config("no shader file given".to_owned()))?;

        let version = parse_version(matches.value_of("gl-version").unwrap_or("3.3"))?;

        let profile = match matches.value_of("profile").unwrap_or("core") {
            "core" => GlProfile::Core,
            "compat" => GlProfile::Compatibility,
            other => return Err(CliError::Config(format!("unknown OpenGL profile \"{}\"", other))),
        };

        Ok(Self {
            path,
            version,
            profile,
            validate: !matches.is_present("no-validate"),
        })
    }
}

/// Parses a `MAJOR.MINOR` version like `3.3` or `4.6`.
pub fn parse_version(s: &str) -> Result<(u8, u8), CliError> {
    let bad = || CliError::Config(format!("\"{}\" is not an OpenGL version (expected MAJOR.MINOR)", s));

    let mut parts = s.trim().splitn(2, '.');
    let major = parts.next().and_then(|n| n.parse::<u8>().ok()).ok_or_else(bad)?;
    let minor = parts.next().and_then(|n| n.parse::<u8>().ok()).ok_or_else(bad)?;

    if major == 0 {
        return Err(bad());
    }

    Ok((major, minor))
}
