use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use ukps_domains::config::cli::Command;
use ukps_domains::utils::error::ErrorSeverity;
use ukps_domains::utils::{logger, validation::Validate};
use ukps_domains::{
    format_registry_file, CliConfig, FormatOutcome, LocalStorage, LookupOptions, UkpsDomains,
    UkpsError,
};

const NOT_FOUND: u8 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let result = match &cli.command {
        Command::Format { path, check } => return format_registry(path, *check).await,
        Command::CheckDomain { domain } => run_check(&cli, domain, false).await,
        Command::CheckEmail { email } => run_check(&cli, email, true).await,
        Command::Lookup { input, no_enrich } => run_lookup(&cli, input, *no_enrich).await,
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            Ok(ExitCode::from(exit_code_for(&e)))
        }
    }
}

fn exit_code_for(error: &UkpsError) -> u8 {
    match error.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 3,
        ErrorSeverity::Critical => 4,
    }
}

async fn connect(cli: &CliConfig) -> Result<UkpsDomains, UkpsError> {
    let config = cli.loader_config()?;
    config.validate()?;

    let domains = UkpsDomains::connect(config).await?;
    if let Some(source) = domains.data_source() {
        tracing::info!("📁 Registry loaded from {}", source);
    }
    Ok(domains)
}

async fn run_check(cli: &CliConfig, input: &str, is_email: bool) -> Result<ExitCode, UkpsError> {
    let domains = connect(cli).await?;

    let known = if is_email {
        domains.is_known_email(input)?
    } else {
        domains.is_known_domain(input)?
    };

    if known {
        println!("✅ {} is a UK public sector {}", input, if is_email { "email" } else { "domain" });
        Ok(ExitCode::SUCCESS)
    } else {
        println!("❌ {} is not in the registry", input);
        Ok(ExitCode::from(NOT_FOUND))
    }
}

async fn run_lookup(cli: &CliConfig, input: &str, no_enrich: bool) -> Result<ExitCode, UkpsError> {
    let domains = connect(cli).await?;
    let options = LookupOptions {
        enrich: !no_enrich,
        ..domains.default_options()
    };

    let found = if input.contains('@') {
        domains.resolve_email_with(input, options)?
    } else {
        domains.resolve_with(input, options)?
    };

    match found {
        Some(found) => {
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("null");
            Ok(ExitCode::from(NOT_FOUND))
        }
    }
}

async fn format_registry(path: &Path, check: bool) -> anyhow::Result<ExitCode> {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let storage = LocalStorage::new(path.parent().unwrap_or(Path::new("")));

    let outcome = format_registry_file(&storage, file, check)
        .await
        .with_context(|| format!("failed to format {}", storage.base_path().join(file).display()))?;

    match outcome {
        FormatOutcome::Unchanged => {
            println!("No changes needed: file already formatted.");
            Ok(ExitCode::SUCCESS)
        }
        FormatOutcome::NeedsFormatting => {
            println!("{} needs formatting.", path.display());
            Ok(ExitCode::from(NOT_FOUND))
        }
        FormatOutcome::Formatted => {
            println!("Formatted and saved: changes detected.");
            Ok(ExitCode::SUCCESS)
        }
    }
}
