//! Run a snippet of Python in the sandbox from the command line.
//!
//! Usage: `sandbox_exec <code> [package...]`
//!
//! With no arguments, runs a short self-test: a plain calculation and a
//! snippet that needs numpy.

use std::sync::Arc;

use anyhow::Context;

use chatgate::sandbox::{DockerRuntime, ExecutionRequest, ExecutionResult, SandboxExecutor};
use chatgate::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("sandbox_exec", None).map_err(|e| anyhow::anyhow!(e))?;

    let runtime = DockerRuntime::connect().context("failed to connect to Docker")?;
    runtime.ping().await.context("Docker daemon is not responding")?;
    let executor = SandboxExecutor::new(Arc::new(runtime));

    let mut args = std::env::args().skip(1);
    let requests = match args.next() {
        Some(code) => vec![ExecutionRequest::new(code).packages(args)],
        None => vec![
            ExecutionRequest::new("print('Hello from Docker!'); print(2 + 2)"),
            ExecutionRequest::new(
                "import numpy as np; arr = np.array([1, 2, 3]); print(f'Array: {arr}'); print(f'Sum: {arr.sum()}')",
            )
            .packages(["numpy"]),
        ],
    };

    let mut failed = false;
    for request in requests {
        println!("Running: {}", request.code);
        let result = executor.execute(request).await;
        report(&result);
        failed |= !result.is_success();
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn report(result: &ExecutionResult) {
    println!("Output: {}", result.output);
    println!("Error: {}", result.error);
    println!("Exit code: {}", result.exit_code);
    println!();
}
