//! `helix-worker` binary entrypoint.
//!
//! Runs inside an executor job. The dispatcher built the argument vector;
//! this binary parses it, fetches the staged input, runs the predictor, and
//! writes the output. Exit status is the job outcome: the executor marks the
//! job FAILED on any nonzero exit.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod model;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use helix_core::{LogFormat, ObjectId, ObjectStoreBackend, PipelinePaths, init_logging};
use helix_flow::{ExecutionWorker, ModelParams};

use crate::model::CommandModel;

/// Executes one sequence-prediction job against object storage.
#[derive(Debug, Parser)]
#[command(name = "helix-worker", version)]
struct Cli {
    /// Bucket holding the pipeline namespaces.
    bucket: String,

    /// Identifier of the staged input object.
    object_id: ObjectId,

    /// Input namespace prefix.
    #[arg(default_value = "input/")]
    input_prefix: String,

    /// Output namespace prefix.
    #[arg(default_value = "output/")]
    output_prefix: String,

    /// Model reference handed to the predictor.
    #[arg(long = "model_path", default_value = "/models/human.pt")]
    model_path: String,

    /// Beam-search width.
    #[arg(long = "beam_width", default_value_t = 100)]
    beam_width: u32,

    /// Request GPU execution.
    #[arg(long = "gpu")]
    gpu: bool,

    /// Predictor executable baked into the worker image.
    #[arg(long, default_value = "helix-predict")]
    predictor: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::Json);

    // The status namespace is unused here; the worker only reads its input
    // and writes its output.
    let paths = PipelinePaths::new(&cli.input_prefix, &cli.output_prefix, "status/")?;
    let storage = Arc::new(ObjectStoreBackend::from_bucket(&cli.bucket)?);
    let model = Arc::new(CommandModel::new(&cli.predictor));
    let worker = ExecutionWorker::new(storage, paths, model);

    let params = ModelParams {
        model_path: cli.model_path,
        beam_width: cli.beam_width,
        use_gpu: cli.gpu,
    };

    tracing::info!(
        object_id = %cli.object_id,
        bucket = %cli.bucket,
        model_path = %params.model_path,
        beam_width = params.beam_width,
        use_gpu = params.use_gpu,
        "starting prediction job"
    );

    let output_key = worker.run(cli.object_id, &params).await?;
    tracing::info!(output_key = %output_key, "prediction complete");
    Ok(())
}
