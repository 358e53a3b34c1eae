//! Cr3dential CLI binary
use clap::{arg, ArgAction, Command};
use cr3dential_cli::api::Cr3dentialCli;
use cr3dential_core::config::CoreConfig;
use cr3dential_core::issuer::IssuerProfile;
use cr3dential_core::ledger::Network;
use cr3dential_xrpl::config::xrpl_config;
use cr3dential_xrpl::RpcSigner;
use serde_json::to_string_pretty;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("Cr3dential CLI")
        .about(format!(
            "Cr3dential CLI v{}\n\nVerifiable credentials anchored to XRPL DIDs.",
            env!("CARGO_PKG_VERSION")
        ))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(arg!(-n --network <NETWORK> "mainnet, testnet or devnet").required(false))
        .subcommand(
            Command::new("did")
                .about("DID functionality: resolve, claim, anchor.")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("resolve")
                        .about("Resolves a DID.")
                        .arg(arg!(-v - -verbose).action(ArgAction::SetTrue))
                        .arg(arg!(-d --did <DID>).required(true)),
                )
                .subcommand(
                    Command::new("claim")
                        .about("Publishes and anchors an issuer DID document for the account of CR3DENTIAL_ISSUER_SEED.")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--sector <SECTOR>).required(true))
                        .arg(arg!(--website <WEBSITE>).required(true))
                        .arg(arg!(--profile_type <PROFILE_TYPE>).required(false)),
                )
                .subcommand(
                    Command::new("anchor")
                        .about("Points the DID record of the account of CR3DENTIAL_ISSUER_SEED at a DID document URI.")
                        .arg(arg!(-u --uri <URI>).required(true)),
                ),
        )
        .subcommand(
            Command::new("offer")
                .about("Credential offers.")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("build")
                        .about("Builds an offer of a catalog credential for a holder.")
                        .arg(arg!(-t --type_key <TYPE_KEY>).required(true))
                        .arg(arg!(-d --did <DID>).required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Ledger accounts: balance, fund.")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("balance")
                        .about("Lists the balances of an account.")
                        .arg(arg!(-a --account <ACCOUNT>).required(true)),
                )
                .subcommand(Command::new("fund").about("Funds a new wallet from the faucet.")),
        )
        .subcommand(
            Command::new("credential")
                .about("Locally cached credentials.")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("list")
                        .about("Lists the cached credentials of a holder.")
                        .arg(arg!(-d --did <DID>).required(true)),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let matches = cli().get_matches();
    let core = CoreConfig::from_env()?;
    let xrpl = xrpl_config();
    let network = match matches.get_one::<String>("network") {
        Some(network) if network.parse::<Network>()? != core.network => {
            core.network_config_for(network.parse()?)
        }
        _ => xrpl.network_config(core.network_config()),
    };
    let api = Cr3dentialCli::from_config(&core, xrpl, network)?;

    match matches.subcommand() {
        Some(("did", sub_matches)) => match sub_matches.subcommand() {
            Some(("resolve", sub_matches)) => {
                let did = sub_matches
                    .get_one::<String>("did")
                    .ok_or("missing --did")?;
                let verbose = matches!(sub_matches.get_one::<bool>("verbose"), Some(true));
                let resolution = api.resolve(did).await?;
                if verbose {
                    match &resolution.uri {
                        Some(uri) => println!("Resolved from: {uri}"),
                        None => println!("No DID record, default document:"),
                    }
                }
                println!("{}", to_string_pretty(&resolution.document)?);
            }
            Some(("claim", sub_matches)) => {
                let field = |name: &str| -> Result<String, String> {
                    sub_matches
                        .get_one::<String>(name)
                        .cloned()
                        .ok_or(format!("missing --{name}"))
                };
                let profile = IssuerProfile {
                    type_: sub_matches
                        .get_one::<String>("profile_type")
                        .cloned()
                        .unwrap_or_else(|| "Organization".to_string()),
                    name: field("name")?,
                    sector: field("sector")?,
                    website: field("website")?,
                };
                let signer = RpcSigner::from_env(api.network()).await?;
                let claim = api.claim_did(Arc::new(signer), &profile).await?;
                println!("{}", to_string_pretty(&claim)?);
            }
            Some(("anchor", sub_matches)) => {
                let uri = sub_matches
                    .get_one::<String>("uri")
                    .ok_or("missing --uri")?;
                let signer = RpcSigner::from_env(api.network()).await?;
                let receipt = api.anchor_document(Arc::new(signer), uri).await?;
                println!("{}", to_string_pretty(&receipt)?);
            }
            _ => panic!("Unrecognised DID subcommand."),
        },
        Some(("offer", sub_matches)) => match sub_matches.subcommand() {
            Some(("build", sub_matches)) => {
                let type_key = sub_matches
                    .get_one::<String>("type_key")
                    .ok_or("missing --type_key")?;
                let did = sub_matches
                    .get_one::<String>("did")
                    .ok_or("missing --did")?;
                println!("{}", to_string_pretty(&api.build_offer(type_key, did)?)?);
            }
            _ => panic!("Unrecognised offer subcommand."),
        },
        Some(("account", sub_matches)) => match sub_matches.subcommand() {
            Some(("balance", sub_matches)) => {
                let account = sub_matches
                    .get_one::<String>("account")
                    .ok_or("missing --account")?;
                for balance in api.balances(account).await? {
                    println!("{} {}", balance.value, balance.currency);
                }
            }
            Some(("fund", _)) => {
                println!("{}", to_string_pretty(&api.fund_wallet().await?)?);
            }
            _ => panic!("Unrecognised account subcommand."),
        },
        Some(("credential", sub_matches)) => match sub_matches.subcommand() {
            Some(("list", sub_matches)) => {
                let did = sub_matches
                    .get_one::<String>("did")
                    .ok_or("missing --did")?;
                for stored in api.credentials(did)? {
                    println!(
                        "{} [{}] {}",
                        stored.credential.type_key().unwrap_or("unknown"),
                        stored.status,
                        stored.storage.uri
                    );
                }
            }
            _ => panic!("Unrecognised credential subcommand."),
        },
        _ => panic!("Unrecognised subcommand."),
    }
    Ok(())
}
