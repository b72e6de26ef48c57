//! Njangi Export - spreadsheet generation.
//!
//! Pure functions over already-fetched slices; no network access. Each
//! builder returns the bytes of an `.xlsx` workbook ready for download,
//! and [`export_filename`] names the file with an entity prefix and
//! today's date.

use chrono::NaiveDate;
use njangi_model::{
    format_xaf, Contribution, ContributionStatus, Credit, CreditStatus, Member, MemberStatus,
    Penalty, PenaltyStatus, Transaction, TransactionKind,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook construction error
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// `{prefix}_{YYYY-MM-DD}.xlsx`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Filename stamped with today's date.
pub fn export_filename_today(prefix: &str) -> String {
    export_filename(prefix, chrono::Local::now().date_naive())
}

fn sheet_with_headers<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    headers: &[&str],
) -> Result<&'a mut Worksheet> {
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name)?;
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    Ok(worksheet)
}

/// Member list export.
pub fn members_workbook(members: &[Member]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = sheet_with_headers(
        &mut workbook,
        "Membres",
        &["Nom", "Prénom", "Email", "Téléphone", "Adresse", "Statut", "Date d'inscription"],
    )?;

    for (i, member) in members.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &member.last_name)?;
        worksheet.write_string(row, 1, &member.first_name)?;
        worksheet.write_string(row, 2, &member.email)?;
        worksheet.write_string(row, 3, &member.phone)?;
        worksheet.write_string(row, 4, member.address.as_deref().unwrap_or(""))?;
        worksheet.write_string(row, 5, member_status_label(member.status))?;
        worksheet.write_string(row, 6, member.joined_date.format("%Y-%m-%d").to_string())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Per-session contribution export.
pub fn contributions_workbook(contributions: &[Contribution]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = sheet_with_headers(
        &mut workbook,
        "Cotisations",
        &["Membre", "Séance", "Montant", "Montant attendu", "Date de paiement", "Statut"],
    )?;

    for (i, contribution) in contributions.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &contribution.member_id)?;
        worksheet.write_string(row, 1, &contribution.session_id)?;
        worksheet.write_number(row, 2, contribution.amount as f64)?;
        worksheet.write_number(row, 3, contribution.expected_amount as f64)?;
        worksheet.write_string(row, 4, contribution.payment_date.format("%Y-%m-%d").to_string())?;
        worksheet.write_string(row, 5, contribution_status_label(contribution.status))?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Penalty export, with paid and remaining columns.
pub fn penalties_workbook(penalties: &[Penalty]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = sheet_with_headers(
        &mut workbook,
        "Pénalités",
        &["Membre", "Raison", "Montant", "Montant payé", "Reste à payer", "Date", "Statut"],
    )?;

    for (i, penalty) in penalties.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &penalty.member_id)?;
        worksheet.write_string(row, 1, &penalty.reason)?;
        worksheet.write_number(row, 2, penalty.amount as f64)?;
        worksheet.write_number(row, 3, penalty.amount_paid as f64)?;
        worksheet.write_number(row, 4, penalty.remaining() as f64)?;
        worksheet.write_string(row, 5, penalty.date.format("%Y-%m-%d").to_string())?;
        worksheet.write_string(row, 6, penalty_status_label(penalty.status))?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Credit export.
pub fn credits_workbook(credits: &[Credit]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = sheet_with_headers(
        &mut workbook,
        "Crédits",
        &["Membre", "Montant", "Taux (%)", "Total à rembourser", "Remboursé", "Solde", "Échéance", "Statut"],
    )?;

    for (i, credit) in credits.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &credit.member_id)?;
        worksheet.write_number(row, 1, credit.principal as f64)?;
        worksheet.write_number(row, 2, credit.interest_rate)?;
        worksheet.write_number(row, 3, credit.repayment_total() as f64)?;
        worksheet.write_number(row, 4, credit.amount_repaid as f64)?;
        worksheet.write_number(row, 5, credit.remaining as f64)?;
        worksheet.write_string(row, 6, credit.due_date.format("%Y-%m-%d").to_string())?;
        worksheet.write_string(row, 7, credit_status_label(credit.status))?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Ledger export.
pub fn transactions_workbook(entries: &[Transaction]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = sheet_with_headers(
        &mut workbook,
        "Transactions",
        &["Tontine", "Type", "Montant", "Description"],
    )?;

    for (i, entry) in entries.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &entry.tontine_id)?;
        worksheet.write_string(row, 1, transaction_kind_label(entry.kind))?;
        worksheet.write_string(row, 2, format_xaf(entry.amount))?;
        worksheet.write_string(row, 3, &entry.description)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn member_status_label(status: MemberStatus) -> &'static str {
    match status {
        MemberStatus::Active => "Actif",
        MemberStatus::Inactive => "Inactif",
        MemberStatus::Suspended => "Suspendu",
    }
}

fn contribution_status_label(status: ContributionStatus) -> &'static str {
    match status {
        ContributionStatus::Pending => "En attente",
        ContributionStatus::Partial => "Partielle",
        ContributionStatus::Complete => "Complète",
        ContributionStatus::Late => "En retard",
    }
}

fn penalty_status_label(status: PenaltyStatus) -> &'static str {
    match status {
        PenaltyStatus::Unpaid => "Non payée",
        PenaltyStatus::PartiallyPaid => "Partiellement payée",
        PenaltyStatus::Paid => "Payée",
        PenaltyStatus::Cancelled => "Annulée",
    }
}

fn credit_status_label(status: CreditStatus) -> &'static str {
    match status {
        CreditStatus::Pending => "En attente",
        CreditStatus::Approved => "Approuvé",
        CreditStatus::Disbursed => "Décaissé",
        CreditStatus::Repaying => "En cours",
        CreditStatus::Completed => "Remboursé",
        CreditStatus::Defaulted => "En retard",
    }
}

fn transaction_kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Contribution => "Cotisation",
        TransactionKind::CreditGranted => "Crédit accordé",
        TransactionKind::CreditRepayment => "Remboursement de crédit",
        TransactionKind::Penalty => "Pénalité",
        TransactionKind::TourDistribution => "Distribution de tour",
        TransactionKind::ProjectExpense => "Dépense de projet",
        TransactionKind::InitialFunding => "Fonds initial",
        TransactionKind::Adjustment => "Ajustement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use njangi_model::PenaltyKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn filename_carries_prefix_and_date() {
        assert_eq!(
            export_filename("membres", date(2026, 8, 6)),
            "membres_2026-08-06.xlsx"
        );
        assert!(export_filename_today("penalites").starts_with("penalites_"));
    }

    #[test]
    fn members_workbook_is_a_zip() {
        let member = Member::new(
            "Jean",
            "Dupont",
            "jean@example.com",
            "+237 6 77 88 99 00",
            date(2024, 1, 10),
        );
        let bytes = members_workbook(&[member]).unwrap();
        // xlsx files are zip archives.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_slices_still_produce_workbooks() {
        assert!(!penalties_workbook(&[]).unwrap().is_empty());
        assert!(!transactions_workbook(&[]).unwrap().is_empty());
    }

    #[test]
    fn penalties_workbook_accepts_partial_payments() {
        let mut penalty = Penalty::new("1", 10_000, "Absence", PenaltyKind::Absence, date(2024, 2, 5));
        penalty.amount_paid = 4_000;
        let bytes = penalties_workbook(&[penalty]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
