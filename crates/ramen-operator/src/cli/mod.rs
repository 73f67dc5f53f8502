//! Contains various types for composing the CLI interface for the hub operator and other
//! applications running in a Kubernetes cluster.

use clap::{Args, Parser};
use ramen_telemetry::tracing::TelemetryOptions;

use crate::namespace::WatchNamespace;

mod environment;

pub use environment::*;

/// A common set of commands used by the hub operator.
///
/// This enum is generic over the arguments available to the [`Command::Run`] subcommand. By
/// default, [`RunArguments`] is used, but a custom type can be used.
///
/// ```rust
/// use ramen_operator::cli::Command;
/// use clap::Parser;
///
/// #[derive(Parser)]
/// struct Run {
///     #[arg(long)]
///     name: String,
/// }
///
/// let _ = Command::<Run>::parse_from(["ramen-hub", "run", "--name", "foo"]);
/// ```
///
/// If the binary needs operator-specific commands then [`Command`] can be flattened into its own
/// command enum.
///
/// ```rust
/// use ramen_operator::cli::Command;
/// use clap::Parser;
///
/// #[derive(Parser)]
/// enum CustomCommand {
///     /// Print hello world message
///     Hello,
///
///     #[clap(flatten)]
///     Framework(Command)
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Parser)]
pub enum Command<Run: Args = RunArguments> {
    /// Print CRD objects.
    Crd,

    /// Run the operator.
    Run(Run),
}

/// Default CLI arguments that the hub operator takes when running.
///
/// ### Embed into an extended argument set
///
/// ```rust
/// use ramen_operator::cli::RunArguments;
/// use clap::Parser;
///
/// #[derive(clap::Parser, Debug, PartialEq, Eq)]
/// struct Run {
///     #[clap(long)]
///     name: String,
///
///     #[clap(flatten)]
///     common: RunArguments,
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Parser)]
#[command(long_about = "")]
pub struct RunArguments {
    /// Provides a specific namespace to watch (instead of watching all namespaces)
    #[arg(long, env, default_value = "")]
    pub watch_namespace: WatchNamespace,

    // IMPORTANT: All (flattened) sub structs should be placed at the end to ensure the help
    // headings are correct.
    #[command(flatten)]
    pub common: CommonOptions,

    #[command(flatten)]
    pub operator_environment: OperatorEnvironmentOptions,
}

/// A set of CLI arguments shared across the hub binaries.
#[derive(Debug, PartialEq, Eq, Args)]
pub struct CommonOptions {
    #[command(flatten)]
    pub telemetry: TelemetryOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;

        RunArguments::command().print_long_help().unwrap();
        RunArguments::command().debug_assert()
    }
}
