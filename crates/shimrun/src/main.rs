use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shimcall::display::format_import;
use shimcall::display::format_module_exports;
use shimcall::resolve_imports;
use shimcall::ContextBuilder;
use shimcall::Fallback;
use shimcall::Support;
use shimcall::UnsupportedPolicy;
use shimrun::Runner;

/// Runs a `wasi_snapshot_preview1` core module.
#[derive(Parser, Debug)]
#[command(name = "shimrun", version)]
struct Cli {
    /// Export to call once the module is instantiated.
    #[arg(long, value_name = "NAME", default_value = "_start")]
    invoke: String,

    /// Add an environment variable visible to the guest.
    #[arg(long = "env", value_name = "NAME=VAL", value_parser = parse_env_var)]
    env: Vec<(String, String)>,

    /// Pass the host environment through to the guest.
    #[arg(long)]
    inherit_env: bool,

    /// What unsupported preview1 calls do: nosys, success or trap.
    #[arg(long, value_name = "POLICY", default_value_t = UnsupportedPolicy::Nosys)]
    unsupported: UnsupportedPolicy,

    /// Instantiate even if some imports are unknown; calling one traps.
    #[arg(long)]
    allow_unresolved: bool,

    /// Print imports, how they resolve, and exports, then exit.
    #[arg(long)]
    list: bool,

    /// Module to run, as `.wasm` or `.wat`.
    module: PathBuf,

    /// Arguments passed to the guest after the module path.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn parse_env_var(s: &str) -> anyhow::Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("must be of the form `key=value`");
    };
    Ok((key.to_owned(), value.to_owned()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn list(runner: &Runner, cli: &Cli) -> anyhow::Result<()> {
    let module = runner.load(&cli.module)?;
    let resolution = resolve_imports(&module, runner.registry());

    println!("imports:");
    for import in resolution.imports() {
        let status = match import.binding.map(|s| s.support) {
            Some(Support::Implemented) => "ok",
            Some(Support::Unsupported) => "unsupported",
            None => "unresolved",
        };
        println!("  {} [{}]", format_import(&import.descriptor), status);
    }
    println!("exports:");
    for line in format_module_exports(&module).lines() {
        println!("  {}", line);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let fallback = if cli.allow_unresolved {
        Fallback::TrapOnCall
    } else {
        Fallback::Reject
    };
    let runner = Runner::new()?.fallback(fallback);
    if cli.list {
        return list(&runner, &cli);
    }

    let mut builder = ContextBuilder::new()
        .arg(cli.module.display().to_string())
        .args(cli.args)
        .unsupported_policy(cli.unsupported);
    if cli.inherit_env {
        builder = builder.inherit_env();
    }
    let ctx = builder.envs(cli.env).build();

    let module = runner.load(&cli.module)?;
    let mut session = runner
        .instantiate(&module, ctx)
        .with_context(|| format!("failed to instantiate {}", cli.module.display()))?;
    let outcome = session.invoke(&cli.invoke);
    info!("{}", session.ctx().diagnostics());
    outcome?;
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
