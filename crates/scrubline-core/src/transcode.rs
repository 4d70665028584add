//! External ffmpeg conversion
//!
//! Files the readers cannot handle natively (or that should be downmixed
//! before display) are converted to 8-bit PCM WAV by an ffmpeg subprocess.
//! The resulting path is then opened like any other WAV file.
//!
//! ```text
//! ffmpeg -y -i <input> [-af pan=mono|c0=.5*c0+.5*c1] -acodec pcm_u8 <output_dir>/<stem>.wav
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::config::TranscodeConfig;

/// Downmix filter averaging left and right into one channel
const MONO_FILTER: &str = "pan=mono|c0=.5*c0+.5*c1";

/// Errors from the conversion step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscodeError {
    #[error("No ffmpeg path configured")]
    NotConfigured,

    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: PathBuf, reason: String },

    #[error("ffmpeg exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("ffmpeg reported success but {0:?} was not written")]
    MissingOutput(PathBuf),
}

/// Whether `path` has to go through ffmpeg before it can be opened
///
/// Conversion only happens when an ffmpeg path is configured, and then for
/// every non-WAV file, or for every file if mono conversion is requested.
pub fn needs_transcode(path: &Path, config: &TranscodeConfig) -> bool {
    if config.ffmpeg_path.is_none() {
        return false;
    }
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    !is_wav || config.convert_to_mono
}

/// Where the converted copy of `input` is written
pub fn output_path_for(input: &Path, config: &TranscodeConfig) -> PathBuf {
    let dir = config
        .output_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "converted".into());
    name.push(".wav");
    dir.join(name)
}

/// Argument list passed to ffmpeg
fn ffmpeg_args(input: &Path, output: &Path, convert_to_mono: bool) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = vec!["-y".into(), "-i".into(), input.into()];
    if convert_to_mono {
        args.push("-af".into());
        args.push(MONO_FILTER.into());
    }
    args.push("-acodec".into());
    args.push("pcm_u8".into());
    args.push(output.into());
    args
}

/// Convert `input` with ffmpeg and return the path of the WAV file
///
/// Blocks until the subprocess exits.
pub fn transcode_to_wav(input: &Path, config: &TranscodeConfig) -> Result<PathBuf, TranscodeError> {
    let program = config
        .ffmpeg_path
        .as_ref()
        .ok_or(TranscodeError::NotConfigured)?;
    let output_path = output_path_for(input, config);

    if output_path == input {
        // ffmpeg cannot overwrite its own input
        return Err(TranscodeError::Failed {
            code: None,
            stderr: format!("output path {:?} is the input file", output_path),
        });
    }

    log::info!(
        "transcode_to_wav: {:?} -> {:?} (mono: {})",
        input,
        output_path,
        config.convert_to_mono
    );
    let start_time = std::time::Instant::now();

    let output = Command::new(program)
        .args(ffmpeg_args(input, &output_path, config.convert_to_mono))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| TranscodeError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // ffmpeg prints its banner first; the cause is at the end
        let tail: String = stderr
            .lines()
            .rev()
            .take(5)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("\n");
        log::error!("transcode_to_wav: ffmpeg failed for {:?}: {}", input, tail);
        return Err(TranscodeError::Failed {
            code: output.status.code(),
            stderr: tail,
        });
    }

    if !output_path.exists() {
        return Err(TranscodeError::MissingOutput(output_path));
    }

    log::info!("transcode_to_wav: done in {:?}", start_time.elapsed());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(mono: bool) -> TranscodeConfig {
        TranscodeConfig {
            ffmpeg_path: Some(PathBuf::from("/usr/bin/ffmpeg")),
            convert_to_mono: mono,
            output_dir: Some(PathBuf::from("/tmp/scrubline")),
        }
    }

    #[test]
    fn test_needs_transcode_requires_ffmpeg() {
        let config = TranscodeConfig::default();
        assert!(!needs_transcode(Path::new("song.mp3"), &config));
        assert!(!needs_transcode(Path::new("song.wav"), &config));
    }

    #[test]
    fn test_needs_transcode_by_suffix_and_mono() {
        assert!(needs_transcode(Path::new("song.mp3"), &configured(false)));
        assert!(!needs_transcode(Path::new("song.wav"), &configured(false)));
        assert!(!needs_transcode(Path::new("song.WAV"), &configured(false)));
        assert!(
            needs_transcode(Path::new("song.wav"), &configured(true)),
            "mono downmix applies to WAV input too"
        );
    }

    #[test]
    fn test_output_path_uses_stem() {
        let path = output_path_for(Path::new("/music/set one.flac"), &configured(true));
        assert_eq!(path, PathBuf::from("/tmp/scrubline/set one.wav"));
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = ffmpeg_args(Path::new("in.mp3"), Path::new("out.wav"), true);
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-y", "-i", "in.mp3", "-af", MONO_FILTER, "-acodec", "pcm_u8", "out.wav"]
        );

        let args = ffmpeg_args(Path::new("in.mp3"), Path::new("out.wav"), false);
        assert!(!args.iter().any(|a| a == "-af"));
    }

    #[test]
    fn test_not_configured() {
        let err = transcode_to_wav(Path::new("in.mp3"), &TranscodeConfig::default()).unwrap_err();
        assert!(matches!(err, TranscodeError::NotConfigured));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = TranscodeConfig {
            ffmpeg_path: Some(dir.path().join("no-such-ffmpeg")),
            convert_to_mono: true,
            output_dir: Some(dir.path().to_path_buf()),
        };
        let err = transcode_to_wav(Path::new("in.mp3"), &config).unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        let config = TranscodeConfig {
            ffmpeg_path: Some(PathBuf::from("/bin/false")),
            convert_to_mono: false,
            output_dir: Some(dir.path().to_path_buf()),
        };
        let err = transcode_to_wav(Path::new("in.mp3"), &config).unwrap_err();
        assert!(matches!(err, TranscodeError::Failed { code: Some(1), .. }));
        assert!(!dir.path().join("in.wav").exists());
    }
}
