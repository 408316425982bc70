use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use tally_core::{
    PartnerDraft, PartnerUpdate, PaymentDraft, PaymentKind, ProposalDraft, ProposalUpdate,
};
use tally_ledger::{LedgerStore, SqliteStore};
use tally_service::{CatalogService, PartnerService, ProposalService};

use crate::{output, telemetry};

#[derive(Parser)]
#[command(name = "tally", version, about = "Proposal and commission tracking")]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database path, overriding the configured one.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Emit JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage partners.
    Partner {
        #[command(subcommand)]
        action: PartnerAction,
    },
    /// Manage the service-type catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage proposals.
    Proposal {
        #[command(subcommand)]
        action: ProposalAction,
    },
    /// Record and remove payments against a proposal's ledgers.
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
    },
    /// Portfolio-wide KPIs.
    Summary,
}

#[derive(Subcommand)]
pub enum PartnerAction {
    Add {
        name: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    List,
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CatalogAction {
    Add { name: String },
    Remove { id: i64 },
    List,
}

#[derive(Subcommand)]
pub enum ProposalAction {
    Add {
        #[arg(long)]
        partner: i64,
        #[arg(long)]
        client: String,
        #[arg(long)]
        service_type: i64,
        #[arg(long)]
        signed_on: NaiveDate,
        #[arg(long)]
        total: Decimal,
        #[arg(long)]
        percent: Decimal,
    },
    List,
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        partner: Option<i64>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        service_type: Option<i64>,
        #[arg(long)]
        signed_on: Option<NaiveDate>,
        #[arg(long)]
        total: Option<Decimal>,
        #[arg(long)]
        percent: Option<Decimal>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Append an entry to one of a proposal's ledgers.
    Add {
        proposal: i64,
        // Negative amounts must reach domain validation to be rejected
        // there, not swallowed as a flag parse error.
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(long)]
        kind: PaymentKind,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove an entry; the paid total is re-derived from what remains.
    Delete {
        id: i64,
        #[arg(long)]
        kind: PaymentKind,
    },
    List {
        proposal: i64,
        #[arg(long)]
        kind: PaymentKind,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = tally_config::load(cli.config.as_deref())?;
    telemetry::init(&settings.logging.filter);
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| settings.database.path.clone());
    debug!(path = %db_path.display(), "opening store");
    let store: Arc<dyn LedgerStore> = Arc::new(SqliteStore::new(db_path)?);
    dispatch(cli, store)
}

fn dispatch(cli: Cli, store: Arc<dyn LedgerStore>) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Partner { action } => {
            let partners = PartnerService::new(store);
            match action {
                PartnerAction::Add {
                    name,
                    company,
                    email,
                    phone,
                } => {
                    let partner = partners.create(&PartnerDraft {
                        name,
                        company,
                        email,
                        phone,
                    })?;
                    emit(&partner, json, output::render_partner)
                }
                PartnerAction::List => {
                    let all = partners.list()?;
                    if json {
                        return output::print_json(&all);
                    }
                    for partner in &all {
                        println!("{}", output::render_partner(partner));
                    }
                    Ok(())
                }
                PartnerAction::Show { id } => {
                    emit(&partners.get(id)?, json, output::render_partner)
                }
                PartnerAction::Update {
                    id,
                    name,
                    company,
                    email,
                    phone,
                } => {
                    let partner = partners.update(
                        id,
                        &PartnerUpdate {
                            name,
                            company,
                            email,
                            phone,
                        },
                    )?;
                    emit(&partner, json, output::render_partner)
                }
                PartnerAction::Delete { id } => {
                    partners.delete(id)?;
                    println!("partner {id} deleted");
                    Ok(())
                }
            }
        }
        Command::Catalog { action } => {
            let catalog = CatalogService::new(store);
            let types = match action {
                CatalogAction::Add { name } => catalog.add(&name)?,
                CatalogAction::Remove { id } => catalog.remove(id)?,
                CatalogAction::List => catalog.list()?,
            };
            if json {
                output::print_json(&types)
            } else {
                println!("{}", output::render_service_types(&types));
                Ok(())
            }
        }
        Command::Proposal { action } => {
            let proposals = ProposalService::new(store);
            match action {
                ProposalAction::Add {
                    partner,
                    client,
                    service_type,
                    signed_on,
                    total,
                    percent,
                } => {
                    let proposal = proposals.create(&ProposalDraft {
                        partner_id: partner,
                        client,
                        service_type_id: service_type,
                        signed_on,
                        total_value: total,
                        commission_percent: percent,
                    })?;
                    emit(&proposal, json, output::render_proposal)
                }
                ProposalAction::List => {
                    let views = proposals.list()?;
                    if json {
                        return output::print_json(&views);
                    }
                    for view in &views {
                        println!("{}", output::render_view(view));
                    }
                    Ok(())
                }
                ProposalAction::Show { id } => {
                    emit(&proposals.get(id)?, json, output::render_detail)
                }
                ProposalAction::Update {
                    id,
                    partner,
                    client,
                    service_type,
                    signed_on,
                    total,
                    percent,
                } => {
                    let proposal = proposals.update(
                        id,
                        &ProposalUpdate {
                            partner_id: partner,
                            client,
                            service_type_id: service_type,
                            signed_on,
                            total_value: total,
                            commission_percent: percent,
                        },
                    )?;
                    emit(&proposal, json, output::render_proposal)
                }
                ProposalAction::Delete { id } => {
                    proposals.delete(id)?;
                    println!("proposal {id} deleted");
                    Ok(())
                }
            }
        }
        Command::Payment { action } => {
            let proposals = ProposalService::new(store);
            match action {
                PaymentAction::Add {
                    proposal,
                    amount,
                    kind,
                    date,
                    note,
                } => {
                    let mut draft = PaymentDraft::new(proposal, kind, amount, date);
                    if let Some(note) = note {
                        draft = draft.with_note(note);
                    }
                    let entry = proposals.add_payment(&draft)?;
                    emit(&entry, json, output::render_payment)
                }
                PaymentAction::Delete { id, kind } => {
                    proposals.delete_payment(id, kind)?;
                    println!("{kind} payment {id} deleted");
                    Ok(())
                }
                PaymentAction::List { proposal, kind } => {
                    let entries = proposals.list_payments(proposal, kind)?;
                    if json {
                        return output::print_json(&entries);
                    }
                    for entry in &entries {
                        println!("{}", output::render_payment(entry));
                    }
                    Ok(())
                }
            }
        }
        Command::Summary => {
            let proposals = ProposalService::new(store);
            let summary = proposals.summary()?;
            if json {
                output::print_json(&summary)
            } else {
                println!("{}", output::render_summary(&summary));
                Ok(())
            }
        }
    }
}

fn emit<T: serde::Serialize>(value: &T, json: bool, render: impl Fn(&T) -> String) -> Result<()> {
    if json {
        output::print_json(value)
    } else {
        println!("{}", render(value));
        Ok(())
    }
}
