//! transplant - install translation files into a game's private data folder.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transplant_documents::{
    DocumentAccess, GrantStore, JsonGrantStore, LocalDocumentProvider, NormalizedMatch, TreeUri,
    accept_picked_tree,
};
use transplant_helper::{HelperConnection, LocalBinder};
use transplant_install::InstallDispatcher;
use transplant_paths::{PathResolver, PathStyle, display_form};
use transplant_probe::{CapabilityProbe, SystemPlatform};
use transplant_progress::{ProgressAggregator, progress_channel};
use transplant_shell::{RootShell, TokioRunner};
use transplant_types::GrantedType;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "transplant")]
#[command(about = "Install translation files into a game's data folder", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/transplant/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target package, overrides `package_name` from the config
    #[arg(short, long, global = true)]
    package: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which installation mechanisms are usable
    Probe,
    /// Install a downloaded translation file
    Install {
        /// Local file to install
        file: PathBuf,
        /// File name inside the translations folder (defaults to FILE's name)
        #[arg(short, long)]
        name: Option<String>,
        /// Mechanism to use (defaults to the best available one)
        #[arg(short, long)]
        mechanism: Option<GrantedType>,
    },
    /// Remember a document tree granted for the package
    Grant {
        /// Tree URI returned by the folder picker
        uri: String,
    },
    /// Forget the stored document tree
    Revoke,
}

/// Collaborators shared by every command.
struct Services {
    package: String,
    paths: PathResolver,
    helper: Arc<HelperConnection>,
    shell: Arc<RootShell>,
    store: Arc<JsonGrantStore>,
    documents: DocumentAccess,
}

impl Services {
    fn new(config: &CliConfig, package: String) -> anyhow::Result<Self> {
        let paths = PathResolver::new(&config.storage_root);
        let store_path = config.grant_store_path()?;
        let store = Arc::new(
            JsonGrantStore::new(store_path.clone())
                .with_context(|| format!("loading grants from {}", store_path.display()))?,
        );

        // No OS document service here: stored trees are backed by the
        // package's data directory when it exists.
        let provider = Arc::new(LocalDocumentProvider::new());
        if let Some(tree) = store.tree(&package) {
            let data = paths.data_directory(&package, PathStyle::Canonical);
            if data.is_dir() {
                provider.grant(&tree, &data, true, true);
            }
        }
        let documents = DocumentAccess::new(provider, store.clone(), Arc::new(NormalizedMatch));

        Ok(Self {
            package,
            paths,
            helper: Arc::new(HelperConnection::new(Arc::new(LocalBinder))),
            shell: Arc::new(RootShell::new(&config.shell_binary, Arc::new(TokioRunner))),
            store,
            documents,
        })
    }

    async fn probe(&self, config: &CliConfig) -> CapabilityProbe {
        let platform = SystemPlatform::detect(&config.storage_root, config.fallback_sdk).await;
        CapabilityProbe::new(&self.package, self.paths.clone(), Arc::new(platform))
            .with_helper(self.helper.clone())
            .with_shell(self.shell.clone())
            .with_documents(self.documents.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,transplant=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    let package = cli
        .package
        .clone()
        .unwrap_or_else(|| config.package_name.clone());
    if package.is_empty() {
        bail!("no target package: pass --package or set package_name in the config");
    }
    let services = Services::new(&config, package)?;

    match cli.command {
        Command::Probe => probe(&services, &config).await,
        Command::Install {
            file,
            name,
            mechanism,
        } => install(&services, &config, &file, name, mechanism).await,
        Command::Grant { uri } => grant(&services, &uri),
        Command::Revoke => {
            services.store.clear(&services.package)?;
            println!("Forgot the folder grant for {}", services.package);
            Ok(())
        }
    }
}

async fn probe(services: &Services, config: &CliConfig) -> anyhow::Result<()> {
    let probe = services.probe(config).await;
    for cap in probe.probe().await {
        match cap.reason {
            None => println!("  [x] {}", cap.mechanism),
            Some(reason) => println!("  [ ] {}: {reason}", cap.mechanism),
        }
    }
    Ok(())
}

async fn install(
    services: &Services,
    config: &CliConfig,
    file: &Path,
    name: Option<String>,
    mechanism: Option<GrantedType>,
) -> anyhow::Result<()> {
    let name = match name {
        Some(n) => n,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("FILE has no file name, pass --name")?,
    };
    let mechanism = match mechanism.or(config.preferred_mechanism) {
        Some(m) => m,
        None => services
            .probe(config)
            .await
            .best()
            .await
            .context("no installation mechanism is available, see `transplant probe`")?,
    };
    info!(mechanism = %mechanism, file = %file.display(), "installing");

    let dispatcher = InstallDispatcher::new(
        &services.package,
        services.paths.clone(),
        config.install_options(),
    )
    .with_helper(services.helper.clone())
    .with_shell(services.shell.clone())
    .with_documents(services.documents.clone());

    let (tx, rx) = progress_channel(config.progress_capacity.max(1));
    let mut aggregator = ProgressAggregator::new(rx, Some(config.progress_window()));
    let mut batches = aggregator.batches();
    let stop = CancellationToken::new();
    let aggregator = tokio::spawn(aggregator.run(stop.clone()));
    let printer = tokio::spawn(async move {
        while let Some(batch) = batches.recv().await {
            println!("{batch}");
        }
    });

    let result = {
        let run = dispatcher.install_package(file, &name, mechanism, &tx);
        tokio::pin!(run);
        loop {
            tokio::select! {
                r = &mut run => break r,
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupt received, cancelling installation");
                    dispatcher.cancel();
                }
            }
        }
    };

    drop(tx);
    if result.as_ref().is_err_and(|e| e.is_cancelled()) {
        stop.cancel();
    }
    let _ = aggregator.await;
    let _ = printer.await;

    match result {
        Ok(()) => {
            let target = services.paths.target_for(&services.package, mechanism);
            println!("Installed {} via {mechanism}", display_form(&target.join(&name)));
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("Installation cancelled");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("installing {name} via {mechanism}")),
    }
}

fn grant(services: &Services, uri: &str) -> anyhow::Result<()> {
    let picked = TreeUri::new(uri);
    let accepted = accept_picked_tree(
        services.store.as_ref(),
        &NormalizedMatch,
        &services.package,
        &picked,
    )?;
    if !accepted {
        bail!(
            "{picked} is not the data folder of {}, expected {}",
            services.package,
            TreeUri::for_package(&services.package)
        );
    }
    println!("Stored folder grant for {}", services.package);
    Ok(())
}
