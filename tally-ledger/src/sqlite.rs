use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use tally_core::{
    sum_entries, Partner, PartnerDraft, PartnerUpdate, PaymentDraft, PaymentEntry, PaymentKind,
    Proposal, ProposalDraft, ProposalUpdate, ServiceType, TallyError, TallyResult,
};

use crate::LedgerStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS partners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    company TEXT,
    email TEXT,
    phone TEXT
);
CREATE TABLE IF NOT EXISTS service_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS proposals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    partner_id INTEGER NOT NULL REFERENCES partners(id),
    client TEXT NOT NULL,
    service_type_id INTEGER NOT NULL REFERENCES service_types(id),
    signed_on TEXT NOT NULL,
    total_value TEXT NOT NULL,
    commission_percent TEXT NOT NULL,
    amount_paid TEXT NOT NULL,
    commission_paid TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    proposal_id INTEGER NOT NULL REFERENCES proposals(id),
    kind TEXT NOT NULL,
    amount TEXT NOT NULL,
    paid_on TEXT NOT NULL,
    note TEXT
);
CREATE INDEX IF NOT EXISTS payments_idx_proposal_kind
    ON payments(proposal_id, kind, paid_on);
"#;

/// SQLite-backed store. Amounts are persisted as TEXT and re-parsed through
/// `Decimal` so no money value ever passes through a binary float.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> TallyResult<Self> {
        let store = Self { path: path.into() };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> TallyResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(())
    }

    fn connect(&self) -> TallyResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|err| TallyError::Storage(err.to_string()))?;
            }
        }
        let conn = Connection::open(&self.path).map_err(storage)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(storage)?;
        Ok(conn)
    }
}

impl LedgerStore for SqliteStore {
    fn create_proposal(&self, draft: &ProposalDraft) -> TallyResult<Proposal> {
        draft.validate()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        ensure_row(&tx, "partners", "partner", draft.partner_id)?;
        ensure_row(&tx, "service_types", "service type", draft.service_type_id)?;
        tx.execute(
            "INSERT INTO proposals (
                partner_id, client, service_type_id, signed_on,
                total_value, commission_percent, amount_paid, commission_paid, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, '0', '0', ?7)",
            params![
                draft.partner_id,
                draft.client,
                draft.service_type_id,
                draft.signed_on.to_string(),
                draft.total_value.to_string(),
                draft.commission_percent.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(storage)?;
        let id = tx.last_insert_rowid();
        let proposal = read_proposal(&tx, id)?;
        tx.commit().map_err(storage)?;
        debug!(proposal_id = id, client = %proposal.client, "proposal created");
        Ok(proposal)
    }

    fn proposal(&self, id: i64) -> TallyResult<Proposal> {
        let conn = self.connect()?;
        read_proposal(&conn, id)
    }

    fn list_proposals(&self) -> TallyResult<Vec<Proposal>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, partner_id, client, service_type_id, signed_on,
                        total_value, commission_percent, amount_paid, commission_paid, created_at
                 FROM proposals ORDER BY id ASC",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map([], ProposalRow::from_row)
            .map_err(storage)?;
        let mut proposals = Vec::new();
        for row in rows {
            proposals.push(row.map_err(storage)?.into_proposal()?);
        }
        Ok(proposals)
    }

    fn update_proposal(&self, id: i64, update: &ProposalUpdate) -> TallyResult<Proposal> {
        update.validate()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        let current = read_proposal(&tx, id)?;
        let partner_id = update.partner_id.unwrap_or(current.partner_id);
        let service_type_id = update.service_type_id.unwrap_or(current.service_type_id);
        if partner_id != current.partner_id {
            ensure_row(&tx, "partners", "partner", partner_id)?;
        }
        if service_type_id != current.service_type_id {
            ensure_row(&tx, "service_types", "service type", service_type_id)?;
        }
        let client = update.client.clone().unwrap_or(current.client);
        let signed_on = update.signed_on.unwrap_or(current.signed_on);
        let total_value = update.total_value.unwrap_or(current.total_value);
        let commission_percent = update
            .commission_percent
            .unwrap_or(current.commission_percent);
        // Paid totals are ledger-controlled and deliberately absent here.
        tx.execute(
            "UPDATE proposals SET partner_id = ?1, client = ?2, service_type_id = ?3,
                    signed_on = ?4, total_value = ?5, commission_percent = ?6
             WHERE id = ?7",
            params![
                partner_id,
                client,
                service_type_id,
                signed_on.to_string(),
                total_value.to_string(),
                commission_percent.to_string(),
                id,
            ],
        )
        .map_err(storage)?;
        let updated = read_proposal(&tx, id)?;
        tx.commit().map_err(storage)?;
        Ok(updated)
    }

    fn delete_proposal(&self, id: i64) -> TallyResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        ensure_row(&tx, "proposals", "proposal", id)?;
        tx.execute("DELETE FROM payments WHERE proposal_id = ?1", params![id])
            .map_err(storage)?;
        tx.execute("DELETE FROM proposals WHERE id = ?1", params![id])
            .map_err(storage)?;
        tx.commit().map_err(storage)?;
        debug!(proposal_id = id, "proposal deleted with both ledgers");
        Ok(())
    }

    fn insert_payment(&self, draft: &PaymentDraft) -> TallyResult<PaymentEntry> {
        draft.validate()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        let proposal = read_proposal(&tx, draft.proposal_id)?;
        verify_ledger(&tx, &proposal, draft.kind)?;
        tx.execute(
            "INSERT INTO payments (proposal_id, kind, amount, paid_on, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.proposal_id,
                draft.kind.as_str(),
                draft.amount.to_string(),
                draft.paid_on.to_string(),
                draft.note,
            ],
        )
        .map_err(storage)?;
        let entry_id = tx.last_insert_rowid();
        // Re-sum from rows inside this transaction, never from stale state.
        let total = sum_entries(&read_payments(&tx, draft.proposal_id, draft.kind)?);
        write_paid_total(&tx, draft.proposal_id, draft.kind, total)?;
        tx.commit().map_err(storage)?;
        debug!(
            proposal_id = draft.proposal_id,
            entry_id,
            kind = %draft.kind,
            amount = %draft.amount,
            new_total = %total,
            "payment recorded"
        );
        Ok(PaymentEntry {
            id: entry_id,
            proposal_id: draft.proposal_id,
            kind: draft.kind,
            amount: draft.amount,
            paid_on: draft.paid_on,
            note: draft.note.clone(),
        })
    }

    fn delete_payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        let entry = read_payment(&tx, entry_id, kind)?;
        let proposal = read_proposal(&tx, entry.proposal_id)?;
        verify_ledger(&tx, &proposal, kind)?;
        tx.execute(
            "DELETE FROM payments WHERE id = ?1 AND kind = ?2",
            params![entry_id, kind.as_str()],
        )
        .map_err(storage)?;
        let total = sum_entries(&read_payments(&tx, entry.proposal_id, kind)?);
        write_paid_total(&tx, entry.proposal_id, kind, total)?;
        tx.commit().map_err(storage)?;
        debug!(
            proposal_id = entry.proposal_id,
            entry_id,
            kind = %kind,
            new_total = %total,
            "payment removed"
        );
        Ok(())
    }

    fn payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<PaymentEntry> {
        let conn = self.connect()?;
        read_payment(&conn, entry_id, kind)
    }

    fn payments(&self, proposal_id: i64, kind: PaymentKind) -> TallyResult<Vec<PaymentEntry>> {
        let conn = self.connect()?;
        ensure_row(&conn, "proposals", "proposal", proposal_id)?;
        read_payments(&conn, proposal_id, kind)
    }

    fn create_partner(&self, draft: &PartnerDraft) -> TallyResult<Partner> {
        draft.validate()?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO partners (name, company, email, phone) VALUES (?1, ?2, ?3, ?4)",
            params![draft.name, draft.company, draft.email, draft.phone],
        )
        .map_err(storage)?;
        let id = conn.last_insert_rowid();
        Ok(Partner {
            id,
            name: draft.name.clone(),
            company: draft.company.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
        })
    }

    fn partner(&self, id: i64) -> TallyResult<Partner> {
        let conn = self.connect()?;
        read_partner(&conn, id)
    }

    fn list_partners(&self) -> TallyResult<Vec<Partner>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, name, company, email, phone FROM partners ORDER BY id ASC")
            .map_err(storage)?;
        let rows = stmt.query_map([], partner_from_row).map_err(storage)?;
        let mut partners = Vec::new();
        for row in rows {
            partners.push(row.map_err(storage)?);
        }
        Ok(partners)
    }

    fn update_partner(&self, id: i64, update: &PartnerUpdate) -> TallyResult<Partner> {
        update.validate()?;
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        let current = read_partner(&tx, id)?;
        let merged = Partner {
            id,
            name: update.name.clone().unwrap_or(current.name),
            company: update.company.clone().or(current.company),
            email: update.email.clone().or(current.email),
            phone: update.phone.clone().or(current.phone),
        };
        tx.execute(
            "UPDATE partners SET name = ?1, company = ?2, email = ?3, phone = ?4 WHERE id = ?5",
            params![merged.name, merged.company, merged.email, merged.phone, id],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)?;
        Ok(merged)
    }

    fn delete_partner(&self, id: i64) -> TallyResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        ensure_row(&tx, "partners", "partner", id)?;
        let referenced = count_rows(
            &tx,
            "SELECT COUNT(*) FROM proposals WHERE partner_id = ?1",
            id,
        )?;
        if referenced > 0 {
            return Err(TallyError::invalid(format!(
                "partner {id} still has {referenced} proposal(s)"
            )));
        }
        tx.execute("DELETE FROM partners WHERE id = ?1", params![id])
            .map_err(storage)?;
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn add_service_type(&self, name: &str) -> TallyResult<ServiceType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::invalid("service type name must not be empty"));
        }
        let conn = self.connect()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM service_types WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)?;
        if existing.is_some() {
            return Err(TallyError::invalid(format!(
                "service type '{name}' already exists"
            )));
        }
        conn.execute("INSERT INTO service_types (name) VALUES (?1)", params![name])
            .map_err(storage)?;
        Ok(ServiceType {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn remove_service_type(&self, id: i64) -> TallyResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().map_err(storage)?;
        ensure_row(&tx, "service_types", "service type", id)?;
        let referenced = count_rows(
            &tx,
            "SELECT COUNT(*) FROM proposals WHERE service_type_id = ?1",
            id,
        )?;
        if referenced > 0 {
            return Err(TallyError::invalid(format!(
                "service type {id} still has {referenced} proposal(s)"
            )));
        }
        tx.execute("DELETE FROM service_types WHERE id = ?1", params![id])
            .map_err(storage)?;
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn service_types(&self) -> TallyResult<Vec<ServiceType>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM service_types ORDER BY id ASC")
            .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ServiceType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(storage)?;
        let mut types = Vec::new();
        for row in rows {
            types.push(row.map_err(storage)?);
        }
        Ok(types)
    }
}

fn storage(err: rusqlite::Error) -> TallyError {
    TallyError::Storage(err.to_string())
}

fn paid_column(kind: PaymentKind) -> &'static str {
    match kind {
        PaymentKind::Client => "amount_paid",
        PaymentKind::Commission => "commission_paid",
    }
}

fn stored_total(proposal: &Proposal, kind: PaymentKind) -> Decimal {
    match kind {
        PaymentKind::Client => proposal.amount_paid,
        PaymentKind::Commission => proposal.commission_paid,
    }
}

/// Cross-checks the stored paid total against the pre-mutation ledger sum.
/// A mismatch means some earlier write bypassed the store; the mutation is
/// refused rather than overwriting with an unreconciled value.
fn verify_ledger(conn: &Connection, proposal: &Proposal, kind: PaymentKind) -> TallyResult<()> {
    let ledger_sum = sum_entries(&read_payments(conn, proposal.id, kind)?);
    let stored = stored_total(proposal, kind);
    if ledger_sum != stored {
        warn!(
            proposal_id = proposal.id,
            kind = %kind,
            %stored,
            %ledger_sum,
            "stored paid total does not match ledger"
        );
        return Err(TallyError::Consistency(format!(
            "proposal {} {} total is {} but its ledger sums to {}",
            proposal.id, kind, stored, ledger_sum
        )));
    }
    Ok(())
}

fn write_paid_total(
    conn: &Connection,
    proposal_id: i64,
    kind: PaymentKind,
    total: Decimal,
) -> TallyResult<()> {
    let sql = format!(
        "UPDATE proposals SET {} = ?1 WHERE id = ?2",
        paid_column(kind)
    );
    conn.execute(&sql, params![total.to_string(), proposal_id])
        .map_err(storage)?;
    Ok(())
}

fn ensure_row(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> TallyResult<()> {
    let sql = format!("SELECT id FROM {table} WHERE id = ?1");
    let found: Option<i64> = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional()
        .map_err(storage)?;
    match found {
        Some(_) => Ok(()),
        None => Err(TallyError::not_found(entity, id)),
    }
}

fn count_rows(conn: &Connection, sql: &str, id: i64) -> TallyResult<i64> {
    conn.query_row(sql, params![id], |row| row.get(0))
        .map_err(storage)
}

struct ProposalRow {
    id: i64,
    partner_id: i64,
    client: String,
    service_type_id: i64,
    signed_on: String,
    total_value: String,
    commission_percent: String,
    amount_paid: String,
    commission_paid: String,
    created_at: String,
}

impl ProposalRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            partner_id: row.get(1)?,
            client: row.get(2)?,
            service_type_id: row.get(3)?,
            signed_on: row.get(4)?,
            total_value: row.get(5)?,
            commission_percent: row.get(6)?,
            amount_paid: row.get(7)?,
            commission_paid: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_proposal(self) -> TallyResult<Proposal> {
        Ok(Proposal {
            id: self.id,
            partner_id: self.partner_id,
            client: self.client,
            service_type_id: self.service_type_id,
            signed_on: parse_date(&self.signed_on)?,
            total_value: parse_decimal(&self.total_value)?,
            commission_percent: parse_decimal(&self.commission_percent)?,
            amount_paid: parse_decimal(&self.amount_paid)?,
            commission_paid: parse_decimal(&self.commission_paid)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn read_proposal(conn: &Connection, id: i64) -> TallyResult<Proposal> {
    let row = conn
        .query_row(
            "SELECT id, partner_id, client, service_type_id, signed_on,
                    total_value, commission_percent, amount_paid, commission_paid, created_at
             FROM proposals WHERE id = ?1",
            params![id],
            ProposalRow::from_row,
        )
        .optional()
        .map_err(storage)?;
    match row {
        Some(row) => row.into_proposal(),
        None => Err(TallyError::not_found("proposal", id)),
    }
}

struct PaymentRow {
    id: i64,
    proposal_id: i64,
    kind: String,
    amount: String,
    paid_on: String,
    note: Option<String>,
}

impl PaymentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            proposal_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            paid_on: row.get(4)?,
            note: row.get(5)?,
        })
    }

    fn into_entry(self) -> TallyResult<PaymentEntry> {
        Ok(PaymentEntry {
            id: self.id,
            proposal_id: self.proposal_id,
            kind: PaymentKind::from_str(&self.kind).map_err(TallyError::Storage)?,
            amount: parse_decimal(&self.amount)?,
            paid_on: parse_date(&self.paid_on)?,
            note: self.note,
        })
    }
}

fn read_payment(conn: &Connection, entry_id: i64, kind: PaymentKind) -> TallyResult<PaymentEntry> {
    let row = conn
        .query_row(
            "SELECT id, proposal_id, kind, amount, paid_on, note
             FROM payments WHERE id = ?1 AND kind = ?2",
            params![entry_id, kind.as_str()],
            PaymentRow::from_row,
        )
        .optional()
        .map_err(storage)?;
    match row {
        Some(row) => row.into_entry(),
        None => Err(TallyError::not_found("payment", entry_id)),
    }
}

fn read_payments(
    conn: &Connection,
    proposal_id: i64,
    kind: PaymentKind,
) -> TallyResult<Vec<PaymentEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, proposal_id, kind, amount, paid_on, note
             FROM payments WHERE proposal_id = ?1 AND kind = ?2
             ORDER BY paid_on ASC, id ASC",
        )
        .map_err(storage)?;
    let rows = stmt
        .query_map(params![proposal_id, kind.as_str()], PaymentRow::from_row)
        .map_err(storage)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(storage)?.into_entry()?);
    }
    Ok(entries)
}

fn read_partner(conn: &Connection, id: i64) -> TallyResult<Partner> {
    conn.query_row(
        "SELECT id, name, company, email, phone FROM partners WHERE id = ?1",
        params![id],
        partner_from_row,
    )
    .optional()
    .map_err(storage)?
    .ok_or(TallyError::NotFound {
        entity: "partner",
        id,
    })
}

fn partner_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Partner> {
    Ok(Partner {
        id: row.get(0)?,
        name: row.get(1)?,
        company: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

fn parse_decimal(raw: &str) -> TallyResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|err| TallyError::Storage(format!("invalid decimal {raw}: {err}")))
}

fn parse_date(raw: &str) -> TallyResult<NaiveDate> {
    raw.parse::<NaiveDate>()
        .map_err(|err| TallyError::Storage(format!("invalid date {raw}: {err}")))
}

fn parse_timestamp(raw: &str) -> TallyResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| TallyError::Storage(format!("invalid timestamp {raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn seeded_store(path: &std::path::Path) -> (SqliteStore, Proposal) {
        let store = SqliteStore::new(path).unwrap();
        let partner = store.create_partner(&PartnerDraft::new("Ana Souza")).unwrap();
        let service = store.add_service_type("consulting").unwrap();
        let proposal = store
            .create_proposal(&ProposalDraft {
                partner_id: partner.id,
                client: "Acme Ltda".into(),
                service_type_id: service.id,
                signed_on: date("2024-02-10"),
                total_value: dec!(24500),
                commission_percent: dec!(10),
            })
            .unwrap();
        (store, proposal)
    }

    #[test]
    fn payment_insert_updates_paid_total_atomically() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        assert_eq!(proposal.amount_paid, Decimal::ZERO);

        let first = store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(100),
                date("2024-03-01"),
            ))
            .unwrap();
        store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(50),
                date("2024-03-15"),
            ))
            .unwrap();

        let entries = store.payments(proposal.id, PaymentKind::Client).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(sum_entries(&entries), dec!(150));
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, dec!(150));

        store.delete_payment(first.id, PaymentKind::Client).unwrap();
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, dec!(50));
    }

    #[test]
    fn ledgers_are_independent() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Commission,
                dec!(1225),
                date("2024-04-01"),
            ))
            .unwrap();
        let refreshed = store.proposal(proposal.id).unwrap();
        assert_eq!(refreshed.commission_paid, dec!(1225));
        assert_eq!(refreshed.amount_paid, Decimal::ZERO);
    }

    #[test]
    fn listing_orders_by_date_then_id() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        for (amount, day) in [(dec!(30), "2024-03-20"), (dec!(10), "2024-03-01")] {
            store
                .insert_payment(&PaymentDraft::new(
                    proposal.id,
                    PaymentKind::Client,
                    amount,
                    date(day),
                ))
                .unwrap();
        }
        // Same date as the second entry; insertion order breaks the tie.
        store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(20),
                date("2024-03-01"),
            ))
            .unwrap();
        let entries = store.payments(proposal.id, PaymentKind::Client).unwrap();
        let amounts: Vec<_> = entries.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(10), dec!(20), dec!(30)]);
    }

    #[test]
    fn wrong_kind_delete_is_not_found() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        let entry = store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(100),
                date("2024-03-01"),
            ))
            .unwrap();
        let err = store
            .delete_payment(entry.id, PaymentKind::Commission)
            .unwrap_err();
        assert!(matches!(err, TallyError::NotFound { .. }));
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, dec!(100));
    }

    #[test]
    fn proposal_delete_cascades_into_both_ledgers() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("tally.db");
        let (store, proposal) = seeded_store(&db);
        for kind in [PaymentKind::Client, PaymentKind::Commission] {
            store
                .insert_payment(&PaymentDraft::new(
                    proposal.id,
                    kind,
                    dec!(10),
                    date("2024-03-01"),
                ))
                .unwrap();
        }
        store.delete_proposal(proposal.id).unwrap();
        assert!(matches!(
            store.proposal(proposal.id),
            Err(TallyError::NotFound { .. })
        ));
        let conn = Connection::open(&db).unwrap();
        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM payments WHERE proposal_id = ?1",
                params![proposal.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn tampered_paid_total_refuses_further_writes() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("tally.db");
        let (store, proposal) = seeded_store(&db);
        // Bypass the store, the way a buggy migration or manual edit would.
        let conn = Connection::open(&db).unwrap();
        conn.execute(
            "UPDATE proposals SET amount_paid = '999' WHERE id = ?1",
            params![proposal.id],
        )
        .unwrap();
        let err = store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(10),
                date("2024-03-01"),
            ))
            .unwrap_err();
        assert!(matches!(err, TallyError::Consistency(_)));
        assert!(store.payments(proposal.id, PaymentKind::Client).unwrap().is_empty());
    }

    #[test]
    fn update_never_touches_paid_totals() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(500),
                date("2024-03-01"),
            ))
            .unwrap();
        let updated = store
            .update_proposal(
                proposal.id,
                &ProposalUpdate {
                    total_value: Some(dec!(30000)),
                    ..ProposalUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.total_value, dec!(30000));
        assert_eq!(updated.amount_paid, dec!(500));
    }

    #[test]
    fn referenced_partner_and_service_type_cannot_be_removed() {
        let dir = tempdir().unwrap();
        let (store, proposal) = seeded_store(&dir.path().join("tally.db"));
        assert!(matches!(
            store.delete_partner(proposal.partner_id),
            Err(TallyError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.remove_service_type(proposal.service_type_id),
            Err(TallyError::InvalidArgument(_))
        ));
        store.delete_proposal(proposal.id).unwrap();
        store.delete_partner(proposal.partner_id).unwrap();
        store.remove_service_type(proposal.service_type_id).unwrap();
    }

    #[test]
    fn duplicate_service_type_is_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("tally.db")).unwrap();
        store.add_service_type("audit").unwrap();
        assert!(matches!(
            store.add_service_type("audit"),
            Err(TallyError::InvalidArgument(_))
        ));
        assert_eq!(store.service_types().unwrap().len(), 1);
    }
}
