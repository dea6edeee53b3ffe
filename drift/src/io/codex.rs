//! [`Generator`] backend that spawns `codex exec`.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, instrument, warn};

use crate::io::config::GenerationConfig;
use crate::io::generator::{GenerationRequest, Generator, ModelTier};
use crate::io::process::{ProcessOutput, run_with_timeout};

/// Runs each generation as one non-interactive `codex exec` session.
///
/// Every call gets its own numbered directory under `log_dir` holding the
/// prompt, the last message written by codex and a bounded process log.
pub struct CodexGenerator {
    config: GenerationConfig,
    log_dir: PathBuf,
    program: String,
    calls: Cell<u32>,
}

impl CodexGenerator {
    pub fn new(config: GenerationConfig, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            log_dir: log_dir.into(),
            program: "codex".to_string(),
            calls: Cell::new(0),
        }
    }

    /// Override the executable (a wrapper script or an absolute path).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn next_call_dir(&self) -> PathBuf {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        self.log_dir.join(format!("call-{call:04}"))
    }

    fn command(&self, tier: ModelTier, output_path: &Path) -> Command {
        let effort = match tier {
            ModelTier::Fast => "low",
            ModelTier::Reasoning => "high",
        };
        let mut cmd = Command::new(&self.program);
        cmd.arg("exec")
            .arg("--model")
            .arg(self.config.model_for(tier))
            .arg("-c")
            .arg(format!("model_reasoning_effort={effort}"))
            .arg("--sandbox")
            .arg("read-only")
            // Generation happens outside any repository checkout.
            .arg("--skip-git-repo-check")
            .arg("--output-last-message")
            .arg(output_path)
            .arg("-");
        cmd
    }
}

impl Generator for CodexGenerator {
    #[instrument(skip_all, fields(tier = ?request.tier, timeout_secs = self.config.timeout_secs))]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let call_dir = self.next_call_dir();
        fs::create_dir_all(&call_dir)
            .with_context(|| format!("create call dir {}", call_dir.display()))?;
        if request.temperature != self.config.temperature {
            // codex exec has no sampling flag; the model default applies.
            debug!(temperature = request.temperature, "temperature not forwarded to codex");
        }

        let prompt = combined_prompt(request);
        let prompt_path = call_dir.join("prompt.md");
        fs::write(&prompt_path, &prompt)
            .with_context(|| format!("write prompt {}", prompt_path.display()))?;

        let output_path = call_dir.join("last_message.md");
        info!(
            model = self.config.model_for(request.tier),
            call_dir = %call_dir.display(),
            "starting codex exec"
        );
        let output = run_with_timeout(
            self.command(request.tier, &output_path),
            Some(prompt.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )
        .context("run codex exec")?;
        write_call_log(&call_dir.join("process.log"), &output)?;

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "codex exec timed out");
            bail!("codex exec timed out after {:?}", self.config.timeout());
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "codex exec failed");
            bail!("codex exec failed with status {:?}", output.status.code());
        }

        let text = read_last_message(&output_path)?;
        debug!(bytes = text.len(), "codex exec completed");
        Ok(text)
    }
}

/// Single stdin prompt: codex exec takes no separate system channel.
fn combined_prompt(request: &GenerationRequest) -> String {
    format!(
        "{}\n\n---\n\n{}\n",
        request.system.trim_end(),
        request.user.trim_end()
    )
}

fn read_last_message(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(anyhow!("missing codex output {}", path.display()));
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("read codex output {}", path.display()))?;
    if text.trim().is_empty() {
        bail!("codex returned an empty message ({})", path.display());
    }
    Ok(text)
}

fn write_call_log(path: &Path, output: &ProcessOutput) -> Result<()> {
    fs::write(path, output.transcript())
        .with_context(|| format!("write codex log {}", path.display()))
}
