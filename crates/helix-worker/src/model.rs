//! Sequence model backed by an external predictor process.
//!
//! The computation itself lives in a separate executable baked into the
//! worker image. This adapter feeds it the staged payload on stdin, passes
//! the model parameters as flags, and treats stdout as the prediction.

use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use helix_flow::{Error, ModelParams, Result, SequenceModel};

/// Runs a predictor executable per prediction.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    leading_args: Vec<String>,
}

impl CommandModel {
    /// Creates a model adapter around the given executable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Inserts fixed arguments ahead of the model parameters.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }
}

fn predictor_args(params: &ModelParams) -> Vec<String> {
    let mut args = vec![
        "--model_path".to_string(),
        params.model_path.clone(),
        "--beam_width".to_string(),
        params.beam_width.to_string(),
    ];
    if params.use_gpu {
        args.push("--gpu".to_string());
    }
    args
}

#[async_trait]
impl SequenceModel for CommandModel {
    async fn predict(&self, input: &[u8], params: &ModelParams) -> Result<Bytes> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.leading_args)
            .args(predictor_args(params))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::computation(format!("failed to spawn {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::computation("predictor stdin unavailable"))?;
        // Feed concurrently so a large payload cannot deadlock against a
        // predictor that streams output as it reads.
        let payload = input.to_vec();
        let feeder = tokio::spawn(async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::computation(format!("predictor did not finish: {e}")))?;

        // Exit status first: a predictor that died without draining stdin
        // should be reported as a failed prediction, not a broken pipe.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::computation(format!(
                "predictor exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        match feeder.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(Error::computation(format!("failed to feed predictor: {e}")));
            }
            Err(e) => return Err(Error::computation(format!("feeder task failed: {e}"))),
        }

        Ok(Bytes::from(output.stdout))
    }
}
