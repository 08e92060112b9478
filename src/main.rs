use anyhow::{Context, Result};
use banking_toolkit::{
    config::Config,
    graphql::{CacheConfig, ConsoleNavigator, ErrorHandler, GraphqlClient, Operation},
    license::{crawl, DenyList},
    logger::init_logger,
    model::LicenseReport,
    output::{print_check_banner, print_check_outcome, print_report, write_markdown, OutputFormat},
    workspace::{PackageManager, Yarn},
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const DENIED_LICENSE: u8 = 1;
}

#[derive(Parser)]
#[command(name = "banking-toolkit")]
#[command(
    author,
    version,
    about = "License compliance and partner GraphQL tooling for the banking front-end"
)]
struct Cli {
    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the licenses of the workspace's direct dependencies
    Licenses {
        /// Fail if a dependency uses a denied license
        #[arg(long)]
        check: bool,

        /// Write the markdown license report
        #[arg(long)]
        report: bool,

        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Report file (defaults to LICENSE_REPORT.md in the root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Listing format when neither --check nor --report is given (table, json, markdown)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Run a GraphQL operation against the partner API
    Query {
        /// File containing the GraphQL document
        #[arg(short, long)]
        file: PathBuf,

        /// Variables, as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Use the unauthenticated endpoint
        #[arg(long)]
        unauthenticated: bool,

        /// Follow the relay connection at this dot-separated path (e.g. account.transactions)
        #[arg(long)]
        all_pages: Option<String>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Licenses {
            check,
            report,
            root,
            output,
            format,
        } => {
            let root = match root {
                Some(root) => root,
                None => std::env::current_dir().context("Failed to read current directory")?,
            };
            let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
            let run = LicenseRun {
                check,
                report,
                output,
                format,
            };
            run_licenses(&Yarn, &config, &root, run).await
        }
        Commands::Query {
            file,
            variables,
            unauthenticated,
            all_pages,
        } => run_query(&config, &file, variables, unauthenticated, all_pages).await,
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Flags of the `licenses` subcommand.
struct LicenseRun {
    check: bool,
    report: bool,
    output: Option<PathBuf>,
    format: OutputFormat,
}

/// Checks before reporting: a denied license exits before the report is written.
async fn run_licenses(
    manager: &dyn PackageManager,
    config: &Config,
    root: &Path,
    run: LicenseRun,
) -> Result<u8> {
    let LicenseRun {
        check,
        report,
        output,
        format,
    } = run;
    let interactive = format == OutputFormat::Table || check || report;
    let collected = collect_licenses(manager, root, config, interactive).await?;

    if check {
        let deny = DenyList::new(&config.licenses.deny_list)?;
        let violations = deny.check(&collected.entries);

        print_check_banner();
        print_check_outcome(&violations);
        if !violations.is_empty() {
            return Ok(exit_codes::DENIED_LICENSE);
        }
    }

    if report {
        let path = output.unwrap_or_else(|| root.join(&config.licenses.report_file));
        write_markdown(&collected, &path)?;
        info!(path = %path.display(), entries = collected.entries.len(), "Wrote license report");
    }

    if !check && !report {
        print_report(&collected, format)?;
    }

    Ok(exit_codes::SUCCESS)
}

async fn collect_licenses(
    manager: &dyn PackageManager,
    root: &Path,
    config: &Config,
    interactive: bool,
) -> Result<LicenseReport> {
    let progress = if interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Reading licenses with {}...", manager.name()));
        Some(pb)
    } else {
        None
    };

    let result = crawl(manager, root, &config.licenses).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(result?)
}

async fn run_query(
    config: &Config,
    file: &Path,
    variables: Option<String>,
    unauthenticated: bool,
    all_pages: Option<String>,
) -> Result<u8> {
    let document = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut operation = Operation::parse(document);
    if let Some(variables) = variables {
        let variables: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&variables).context("Variables must be a JSON object")?;
        operation = operation.with_variables(variables);
    }

    let graphql = &config.graphql;
    let project = graphql.project();
    let handler = Arc::new(ErrorHandler::new(
        &graphql.base_url,
        project.as_ref(),
        Arc::new(ConsoleNavigator),
    ));

    let client = if unauthenticated {
        GraphqlClient::unauthenticated(graphql, handler)?
    } else {
        let mut idless = graphql.idless_objects.clone();
        if let Some(path) = &graphql.idless_objects_file {
            idless.extend(CacheConfig::load_idless_objects(path)?);
        }
        GraphqlClient::partner(graphql, handler, CacheConfig::partner(idless))?
    };
    info!(url = client.url(), operation = operation.name(), "Running operation");

    let data = match all_pages {
        Some(path) => {
            let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
            client.query_all_pages(&operation, &segments).await?
        }
        None => client.fetch(&operation).await?,
    };

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(exit_codes::SUCCESS)
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'banking-toolkit config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use banking_toolkit::model::{LicenseEntry, LicenseTable};
    use tempfile::TempDir;

    struct FakeManager {
        table: LicenseTable,
    }

    #[async_trait]
    impl PackageManager for FakeManager {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn workspace_locations(
            &self,
            _root: &Path,
        ) -> banking_toolkit::error::Result<Vec<String>> {
            Ok(vec!["app".to_string()])
        }

        async fn license_table(&self, _root: &Path) -> banking_toolkit::error::Result<LicenseTable> {
            Ok(self.table.clone())
        }
    }

    fn workspace(entries: Vec<LicenseEntry>) -> (TempDir, FakeManager) {
        let tmp = TempDir::new().unwrap();
        let app = tmp.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(
            app.join("package.json"),
            r#"{ "dependencies": { "react": "18", "ghostscript-js": "2" } }"#,
        )
        .unwrap();

        let manager = FakeManager {
            table: LicenseTable::new(entries),
        };
        (tmp, manager)
    }

    fn flags(check: bool, report: bool, format: OutputFormat) -> LicenseRun {
        LicenseRun {
            check,
            report,
            output: None,
            format,
        }
    }

    #[tokio::test]
    async fn test_denied_license_fails_before_report() {
        let (root, manager) = workspace(vec![
            LicenseEntry::new("react", "18.3.1", "MIT"),
            LicenseEntry::new("ghostscript-js", "2.0.0", "AGPL-3.0"),
        ]);

        let code = run_licenses(
            &manager,
            &Config::default(),
            root.path(),
            flags(true, true, OutputFormat::Table),
        )
        .await
        .unwrap();

        assert_eq!(code, exit_codes::DENIED_LICENSE);
        assert!(!root.path().join("LICENSE_REPORT.md").exists());
    }

    #[tokio::test]
    async fn test_clean_check_writes_report() {
        let (root, manager) = workspace(vec![
            LicenseEntry::new("react", "18.3.1", "MIT"),
            LicenseEntry::new("ghostscript-js", "2.0.0", "Apache-2.0"),
        ]);

        let code = run_licenses(
            &manager,
            &Config::default(),
            root.path(),
            flags(true, true, OutputFormat::Table),
        )
        .await
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        let report = std::fs::read_to_string(root.path().join("LICENSE_REPORT.md")).unwrap();
        assert!(report.starts_with("# License report\n"));
        assert!(report.contains("react | 18.3.1 | MIT"));
        assert!(report.contains("ghostscript-js | 2.0.0 | Apache-2.0"));
    }

    #[tokio::test]
    async fn test_listing_writes_nothing() {
        let (root, manager) = workspace(vec![LicenseEntry::new("ghostscript-js", "2.0.0", "AGPL-3.0")]);

        let code = run_licenses(
            &manager,
            &Config::default(),
            root.path(),
            flags(false, false, OutputFormat::Json),
        )
        .await
        .unwrap();

        assert_eq!(code, exit_codes::SUCCESS);
        assert!(!root.path().join("LICENSE_REPORT.md").exists());
    }
}
