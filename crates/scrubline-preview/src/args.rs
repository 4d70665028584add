//! Command line parsing

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

pub const USAGE: &str = "\
usage: scrubline-preview <input> [options]

options:
  -o, --output <png>     output image (default: <input stem>.png)
      --width <px>       overview width (default: 800)
      --height <px>      overview height (default: 80)
      --disk             use disk streaming instead of the full cache
      --progress <0..1>  playback progress to draw
      --marker <px>      draw a marker at this column
      --config <yaml>    overview config (default: <config dir>/scrubline/overview.yaml)
  -h, --help             print this help";

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub disk_streaming: bool,
    pub progress: f64,
    pub marker: Option<usize>,
    pub config: Option<PathBuf>,
}

/// Outcome of parsing: either arguments to run with, or a help request
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(PreviewArgs),
    Help,
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("{} needs a value", flag))
}

fn number<T: std::str::FromStr, I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value(args, flag)?;
    raw.parse::<T>()
        .with_context(|| format!("invalid value '{}' for {}", raw, flag))
}

/// Parse arguments (without the program name)
pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Command> {
    let mut args = args.into_iter();
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut width = 800usize;
    let mut height = 80usize;
    let mut disk_streaming = false;
    let mut progress = 0.0f64;
    let mut marker: Option<usize> = None;
    let mut config: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-o" | "--output" => output = Some(value(&mut args, &arg)?.into()),
            "--width" => width = number(&mut args, &arg)?,
            "--height" => height = number(&mut args, &arg)?,
            "--disk" => disk_streaming = true,
            "--progress" => progress = number(&mut args, &arg)?,
            "--marker" => marker = Some(number(&mut args, &arg)?),
            "--config" => config = Some(value(&mut args, &arg)?.into()),
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            _ if input.is_none() => input = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }

    let input = input.ok_or_else(|| anyhow!("missing input file"))?;
    if width == 0 || height == 0 {
        bail!("width and height must be positive");
    }
    let output = output.unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default();
        PathBuf::from(stem).with_extension("png")
    });

    Ok(Command::Run(PreviewArgs {
        input,
        output,
        width,
        height,
        disk_streaming,
        progress,
        marker,
        config,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<PreviewArgs> {
        match parse(args.iter().map(|s| s.to_string()))? {
            Command::Run(args) => Ok(args),
            Command::Help => bail!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults() {
        let args = run(&["/music/take.flac"]).unwrap();
        assert_eq!(args.input, PathBuf::from("/music/take.flac"));
        assert_eq!(args.output, PathBuf::from("take.png"));
        assert_eq!((args.width, args.height), (800, 80));
        assert!(!args.disk_streaming);
        assert_eq!(args.marker, None);
    }

    #[test]
    fn test_all_options() {
        let args = run(&[
            "in.wav", "--width", "300", "--height", "40", "--disk", "--progress", "0.25",
            "--marker", "120", "-o", "out.png", "--config", "c.yaml",
        ])
        .unwrap();
        assert_eq!((args.width, args.height), (300, 40));
        assert!(args.disk_streaming);
        assert_eq!(args.progress, 0.25);
        assert_eq!(args.marker, Some(120));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.config, Some(PathBuf::from("c.yaml")));
    }

    #[test]
    fn test_errors() {
        assert!(run(&[]).is_err());
        assert!(run(&["in.wav", "--width"]).is_err());
        assert!(run(&["in.wav", "--width", "wide"]).is_err());
        assert!(run(&["in.wav", "--height", "0"]).is_err());
        assert!(run(&["in.wav", "--bogus"]).is_err());
        assert!(run(&["a.wav", "b.wav"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(vec!["--help".to_string()]).unwrap(), Command::Help);
    }
}
