//! Conversion engine boundary.
//!
//! The orchestration layer never performs the voice conversion itself; it
//! hands a [`ConversionRequest`] and a set of filesystem locations to a
//! [`ConversionEngine`] and folds the outcome into the task record.  The
//! production implementation is [`CommandEngine`], which shells out to an
//! external converter executable.  Tests substitute in-process fakes.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::types::{ConversionRequest, EngineError};

/// Filesystem locations handed to the engine for one task.
///
/// All three live inside the task's working directory; only
/// [`output_file`](Self::output_file) survives a successful conversion as the
/// deliverable.
#[derive(Debug, Clone)]
pub struct ConversionPaths {
    /// Per-task scratch directory.  The engine may create intermediates here.
    pub work_dir: PathBuf,
    /// Where the raw text-to-speech take is written before conversion.
    pub tts_file: PathBuf,
    /// Where the final converted artifact must be written.
    pub output_file: PathBuf,
}

/// Successful engine outcome: a human-readable message plus the artifact path.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub message: String,
    pub output_file: PathBuf,
}

/// Opaque call boundary to the external conversion computation.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Run one conversion to completion.  Blocks the calling worker only.
    async fn convert(
        &self,
        request: &ConversionRequest,
        paths: &ConversionPaths,
    ) -> Result<ConversionOutput, EngineError>;
}

/// Engine adapter that invokes an external converter executable.
///
/// The request bundle is mapped onto CLI flags; a non-zero exit status or a
/// missing artifact becomes an [`EngineError`].  The executable name comes
/// from configuration so deployments can point at whatever converter build
/// they ship.
pub struct CommandEngine {
    program: PathBuf,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(request: &ConversionRequest, paths: &ConversionPaths) -> Vec<String> {
        let mut args = vec![
            "tts".to_owned(),
            "--text".to_owned(),
            request.text.clone(),
            "--voice".to_owned(),
            request.voice.clone(),
            "--rate".to_owned(),
            request.rate.to_string(),
            "--pitch".to_owned(),
            request.pitch.to_string(),
            "--filter-radius".to_owned(),
            request.filter_radius.to_string(),
            "--index-rate".to_owned(),
            request.index_rate.to_string(),
            "--volume-envelope".to_owned(),
            request.volume_envelope.to_string(),
            "--protect".to_owned(),
            request.protect.to_string(),
            "--hop-length".to_owned(),
            request.hop_length.to_string(),
            "--f0-method".to_owned(),
            request.f0_method.clone(),
            "--model".to_owned(),
            request.model_path.clone(),
            "--index".to_owned(),
            request.index_path.clone(),
            "--embedder".to_owned(),
            request.embedder_model.clone(),
            "--format".to_owned(),
            request.export_format.clone(),
        ];
        if request.split_audio {
            args.push("--split-audio".to_owned());
        }
        if request.autotune {
            args.push("--autotune".to_owned());
            args.push("--autotune-strength".to_owned());
            args.push(request.autotune_strength.to_string());
        }
        if request.clean_audio {
            args.push("--clean".to_owned());
            args.push("--clean-strength".to_owned());
            args.push(request.clean_strength.to_string());
        }
        args.push("--tts-output".to_owned());
        args.push(paths.tts_file.to_string_lossy().into_owned());
        args.push("--output".to_owned());
        args.push(paths.output_file.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl ConversionEngine for CommandEngine {
    async fn convert(
        &self,
        request: &ConversionRequest,
        paths: &ConversionPaths,
    ) -> Result<ConversionOutput, EngineError> {
        let args = Self::build_args(request, paths);
        debug!(program = %self.program.display(), "launching converter");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| EngineError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let message = if stderr.is_empty() {
                format!("converter exited with {}", output.status)
            } else {
                stderr
            };
            return Err(EngineError::Conversion(message));
        }

        if !tokio::fs::try_exists(&paths.output_file).await.unwrap_or(false) {
            return Err(EngineError::MissingOutput(
                paths.output_file.display().to_string(),
            ));
        }

        Ok(ConversionOutput {
            message: format!("converted audio written to {}", paths.output_file.display()),
            output_file: paths.output_file.clone(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::ConversionRequest;

    fn paths() -> ConversionPaths {
        ConversionPaths {
            work_dir: "/work/tts-x".into(),
            tts_file: "/work/tts-x/tts-take.wav".into(),
            output_file: "/work/tts-x/x.wav".into(),
        }
    }

    #[test]
    fn args_carry_request_parameters() {
        let mut request = ConversionRequest::for_text("bonjour");
        request.pitch = -2;
        let args = CommandEngine::build_args(&request, &paths());
        let find = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .map(|i| args[i + 1].clone())
        };
        assert_eq!(find("--text").as_deref(), Some("bonjour"));
        assert_eq!(find("--pitch").as_deref(), Some("-2"));
        assert_eq!(find("--format").as_deref(), Some("wav"));
        assert_eq!(find("--output").as_deref(), Some("/work/tts-x/x.wav"));
    }

    #[test]
    fn optional_flags_only_when_enabled() {
        let mut request = ConversionRequest::for_text("x");
        request.clean_audio = false;
        request.split_audio = false;
        request.autotune = false;
        let args = CommandEngine::build_args(&request, &paths());
        assert!(!args.iter().any(|a| a == "--clean"));
        assert!(!args.iter().any(|a| a == "--split-audio"));
        assert!(!args.iter().any(|a| a == "--autotune"));

        request.autotune = true;
        let args = CommandEngine::build_args(&request, &paths());
        assert!(args.iter().any(|a| a == "--autotune-strength"));
    }
}
