//! Plain-text rendering for command output. Money is rounded to two decimal
//! places for display only; nothing rendered here is ever written back.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::{Partner, PaymentEntry, Proposal, ServiceType};
use tally_service::{PortfolioSummary, ProposalDetail, ProposalView};

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn money(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

pub fn render_partner(partner: &Partner) -> String {
    let company = partner.company.as_deref().unwrap_or("-");
    format!("#{} {} ({company})", partner.id, partner.name)
}

pub fn render_service_types(types: &[ServiceType]) -> String {
    if types.is_empty() {
        return "catalog is empty".to_string();
    }
    types
        .iter()
        .map(|t| format!("#{} {}", t.id, t.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_proposal(proposal: &Proposal) -> String {
    format!(
        "#{} {} | total {} | commission {}% | paid {} | commission paid {}",
        proposal.id,
        proposal.client,
        money(proposal.total_value),
        proposal.commission_percent,
        money(proposal.amount_paid),
        money(proposal.commission_paid),
    )
}

pub fn render_view(view: &ProposalView) -> String {
    format!(
        "{} | open {} | open commission {} | {}",
        render_proposal(&view.proposal),
        money(view.figures.open_balance),
        money(view.figures.open_commission),
        view.status,
    )
}

pub fn render_detail(detail: &ProposalDetail) -> String {
    let mut lines = vec![render_view(&ProposalView {
        proposal: detail.proposal.clone(),
        figures: detail.figures,
        status: detail.status,
    })];
    lines.push(format!(
        "commission: total {} | paid {}%",
        money(detail.figures.total_commission),
        detail.figures.percent_commission_paid.round_dp(2),
    ));
    lines.push(format!("client payments ({}):", detail.client_payments.len()));
    lines.extend(detail.client_payments.iter().map(render_payment));
    lines.push(format!(
        "commission payments ({}):",
        detail.commission_payments.len()
    ));
    lines.extend(detail.commission_payments.iter().map(render_payment));
    lines.join("\n")
}

pub fn render_payment(entry: &PaymentEntry) -> String {
    let note = entry.note.as_deref().unwrap_or("");
    format!(
        "  #{} {} {} on {} {}",
        entry.id,
        entry.kind,
        money(entry.amount),
        entry.paid_on,
        note
    )
    .trim_end()
    .to_string()
}

pub fn render_summary(summary: &PortfolioSummary) -> String {
    let mut lines = vec![
        format!("proposals: {}", summary.proposals),
        format!("contracted: {}", money(summary.total_contracted)),
        format!("received: {}", money(summary.total_received)),
        format!("outstanding: {}", money(summary.total_outstanding)),
        format!("commission: {}", money(summary.total_commission)),
        format!("commission paid: {}", money(summary.commission_paid)),
        format!(
            "commission outstanding: {}",
            money(summary.commission_outstanding)
        ),
    ];
    for (partner_id, partner) in &summary.partners {
        lines.push(format!(
            "  partner #{partner_id}: {} proposal(s), commission {} (paid {}, open {})",
            partner.proposals,
            money(partner.total_commission),
            money(partner.commission_paid),
            money(partner.commission_outstanding),
        ));
    }
    lines.join("\n")
}
