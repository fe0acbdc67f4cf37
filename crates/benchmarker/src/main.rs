use clap::Parser;

#[tokio::main]
async fn main() {
    let args = benchmarker::arguments::Arguments::parse();
    observe::tracing::initialize(
        &observe::Config::default().with_env_filter(&args.log_filter),
    );
    tracing::info!("running benchmarker with validated arguments:\n{}", args);
    if let Err(err) = benchmarker::main(args).await {
        tracing::error!(?err, "benchmark run failed");
        std::process::exit(1);
    }
}
