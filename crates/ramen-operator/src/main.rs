use clap::Parser;
use ramen_operator::{
    cli::{Command, RunArguments},
    client::Client,
    controller,
    crd::{DRCluster, DRClusterConfig, DRPolicy},
    shared::CustomResourceExt,
};
use ramen_telemetry::tracing::Tracing;

const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Command::<RunArguments>::parse() {
        Command::Crd => {
            DRCluster::print_yaml_schema(OPERATOR_VERSION)?;
            DRClusterConfig::print_yaml_schema(OPERATOR_VERSION)?;
            DRPolicy::print_yaml_schema(OPERATOR_VERSION)?;
        }
        Command::Run(args) => run(args).await?,
    }

    Ok(())
}

async fn run(args: RunArguments) -> Result<(), Box<dyn std::error::Error>> {
    let telemetry = &args.common.telemetry;
    let _tracing_guard = Tracing::builder()
        .service_name("ramen-hub")
        .with_console_output(telemetry.console_log_settings("RAMEN_HUB_LOG"))
        .with_otlp_log_exporter(telemetry.otlp_log_settings("RAMEN_HUB_OTLP_LOG"))
        .with_otlp_trace_exporter(telemetry.otlp_trace_settings("RAMEN_HUB_OTLP_TRACE"))
        .build()
        .init()?;

    let kube_client = kube::Client::try_default().await?;
    let client = Client::new(kube_client);

    tracing::info!(
        operator.namespace = args.operator_environment.operator_namespace,
        "Starting ramen-hub"
    );

    controller::run(client, args.operator_environment.operator_namespace).await;

    Ok(())
}
