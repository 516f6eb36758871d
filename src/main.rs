use alloy::primitives::{Address, TxHash, U256};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use dapp_sync::blockchain::ChainClient;
use dapp_sync::config::{load_config, DappConfig};
use dapp_sync::contracts::{ContractSet, FungibleAssetView};
use dapp_sync::indexer::AddressTracker;
use dapp_sync::ledger::DepositLedger;
use dapp_sync::lifecycle::signals;
use dapp_sync::observability::{logging, metrics};
use dapp_sync::sync::{format_amount, parse_amount, SyncSettings, Synchronizer, WriteOutcome};
use dapp_sync::wallet::{LocalWallet, WalletProvider};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "dapp-sync")]
#[command(about = "Wallet session and staking position client for the launchpad DApp", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the session and a fresh snapshot
    Status,
    /// Keep polling and print every snapshot change until Ctrl-C
    Watch,
    /// Request account access from the wallet
    Connect,
    /// Mint 100 stake tokens (token owner only)
    Mint,
    /// Mint NFTs
    MintNft {
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Stake tokens; approves the staking contract first when needed
    Stake {
        #[arg(long)]
        amount: String,
    },
    /// Unstake tokens
    Unstake {
        #[arg(long)]
        amount: String,
    },
    /// Stake one NFT; approves the staking contract first when needed
    StakeNft {
        #[arg(long)]
        id: String,
    },
    /// Unstake one NFT
    UnstakeNft {
        #[arg(long)]
        id: String,
    },
    /// Claim pending rewards
    Claim,
    /// Look up the holdings of any address through the indexer
    Track { address: String },
    /// Record a simulated deposit of stake tokens
    Deposit {
        #[arg(long)]
        amount: String,
    },
    /// Withdraw from the simulated deposit
    Withdraw {
        #[arg(long)]
        amount: String,
    },
    /// Check RPC reachability and the wallet's gas balance
    CheckNetwork,
    /// Report the status of a transaction and its sender's queue
    CheckTx { hash: String },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DappConfig::default(),
    };

    logging::init(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = ChainClient::new(config.network.clone()).await?;

    match cli.command {
        Commands::Track { address } => {
            let tracker = AddressTracker::new(
                &config.indexer,
                &config.indexer.api_key(),
                Arc::new(client),
            )?;
            print_json(&tracker.track(&address).await?)
        }
        Commands::CheckTx { hash } => {
            let tx_hash: TxHash = hash.trim().parse()?;
            print_json(&dapp_sync::diagnostics::check_transaction(&client, tx_hash).await?)
        }
        Commands::CheckNetwork => {
            let wallet = load_wallet(&config, &client).ok_or("no wallet key configured")?;
            print_json(&dapp_sync::diagnostics::check_network(&client, wallet.address()).await?)
        }
        Commands::Deposit { amount } => ledger_command(&config, &client, amount, true).await,
        Commands::Withdraw { amount } => ledger_command(&config, &client, amount, false).await,
        command => session_command(&config, client, command).await,
    }
}

fn load_wallet(config: &DappConfig, client: &ChainClient) -> Option<Arc<LocalWallet>> {
    match LocalWallet::from_env(
        &config.wallet.private_key_env,
        client.clone(),
        config.wallet.auto_connect,
    ) {
        Ok(wallet) => Some(Arc::new(wallet)),
        Err(e) => {
            tracing::warn!(error = %e, "No signing wallet available");
            None
        }
    }
}

async fn session_command(
    config: &DappConfig,
    client: ChainClient,
    command: Commands,
) -> CliResult<()> {
    let wallet = load_wallet(config, &client);
    let provider = match &wallet {
        Some(wallet) => wallet.signing_provider(),
        None => client.provider().clone(),
    };
    let contracts = ContractSet::connect(provider, &config.contracts)?;
    let sync = Synchronizer::new(
        wallet.map(|w| w as Arc<dyn WalletProvider>),
        contracts,
        SyncSettings::from_config(config),
    );

    sync.initialize().await;

    let result = match command {
        Commands::Status => print_status(&sync),
        Commands::Watch => watch(&sync).await,
        Commands::Connect => {
            sync.connect().await?;
            print_status(&sync)
        }
        command => {
            if !sync.session().is_connected() {
                sync.connect().await?;
            }
            let outcome = run_action(&sync, command).await?;
            print_json(&json!({
                "result": outcome,
                "message": sync.message(),
                "snapshot": sync.snapshot().report(),
            }))
        }
    };

    sync.teardown();
    result
}

async fn run_action(sync: &Synchronizer, command: Commands) -> CliResult<WriteOutcome> {
    let outcome = match command {
        Commands::Mint => sync.mint_tokens().await?,
        Commands::MintNft { quantity } => sync.mint_nft(quantity).await?,
        Commands::Stake { amount } => sync.stake_tokens(&amount).await?,
        Commands::Unstake { amount } => sync.unstake_tokens(&amount).await?,
        Commands::StakeNft { id } => sync.stake_nft(parse_token_id(&id)?).await?,
        Commands::UnstakeNft { id } => sync.unstake_nft(parse_token_id(&id)?).await?,
        Commands::Claim => sync.claim_rewards().await?,
        _ => return Err("not a write action".into()),
    };
    Ok(outcome)
}

fn parse_token_id(id: &str) -> CliResult<U256> {
    Ok(id.trim().trim_start_matches('#').parse()?)
}

async fn watch(sync: &Synchronizer) -> CliResult<()> {
    let mut revisions = sync.subscribe_revisions();
    print_status(sync)?;

    let stop = signals::ctrl_c();
    tokio::pin!(stop);
    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                print_status(sync)?;
            }
            _ = &mut stop => {
                tracing::info!("Interrupted; tearing the session down");
                break;
            }
        }
    }
    Ok(())
}

fn print_status(sync: &Synchronizer) -> CliResult<()> {
    print_json(&json!({
        "session": sync.session(),
        "state": sync.state(),
        "message": sync.message(),
        "snapshot": sync.snapshot().report(),
    }))
}

async fn ledger_command(
    config: &DappConfig,
    client: &ChainClient,
    amount: String,
    deposit: bool,
) -> CliResult<()> {
    let wallet = load_wallet(config, client).ok_or("no wallet key configured")?;
    let account: Address = wallet.address();
    let contracts = ContractSet::connect(client.provider().clone(), &config.contracts)?;
    let decimals = contracts.stake_token.decimals().await?;
    let amount = parse_amount(&amount, decimals)?;

    let ledger = match &config.ledger.path {
        Some(path) => DepositLedger::open(path)?,
        None => DepositLedger::new(None),
    };

    let total = if deposit {
        let balance = contracts.stake_token.balance_of(account).await?;
        ledger.deposit(account, amount, balance)?
    } else {
        ledger.withdraw(account, amount)?
    };

    print_json(&json!({
        "account": account,
        "deposited": format_amount(total, decimals),
    }))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
