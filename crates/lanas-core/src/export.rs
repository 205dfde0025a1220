//! CSV export of stored leads for spreadsheet tools.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::lead::{Choice, Lead};

/// Byte-order mark so spreadsheet tools pick UTF-8.
pub const BOM: char = '\u{feff}';

const HEADERS: [&str; 16] = [
    "Data",
    "Nome",
    "E-mail",
    "Telefone",
    "Profissão",
    "Especialidade",
    "Renda Mensal",
    "Possui Dívidas",
    "Patrimônio Total",
    "Investimentos",
    "Desafios Financeiros",
    "Objetivo Principal",
    "Nível de Urgência",
    "Preferência de Contato",
    "Disponibilidade",
    "Comentários",
];

/// Offset of Brasília time from UTC, in hours. Brazil has had no DST since 2019.
const BRASILIA_OFFSET_HOURS: i64 = -3;

/// Render `leads` as CSV, in the order given.
///
/// The header row is bare, every data cell is double-quoted with embedded
/// quotes doubled, and multi-valued answers are joined with `"; "`.
#[must_use]
pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&HEADERS.join(","));
    for lead in leads {
        out.push('\n');
        let row = row(lead);
        let cells: Vec<String> = row.iter().map(|c| quote(c)).collect();
        out.push_str(&cells.join(","));
    }
    out
}

/// Download name for an export made on `date`.
#[must_use]
pub fn export_filename(date: NaiveDate) -> String {
    format!("leads_{}.csv", date.format("%Y-%m-%d"))
}

fn row(lead: &Lead) -> [String; 16] {
    let r = &lead.record;
    [
        format_date(lead.created_at),
        r.name.clone(),
        r.email.clone(),
        r.phone.clone(),
        r.profession.as_str().to_owned(),
        r.specialty.clone(),
        r.monthly_income.clone(),
        r.has_debts.clone(),
        r.total_assets.clone(),
        join(r.investments.as_deref()),
        join(r.financial_challenges.as_deref()),
        r.main_objective.clone(),
        r.urgency_level.clone(),
        r.contact_preference.clone(),
        r.availability.clone(),
        r.additional_comments.clone().unwrap_or_default(),
    ]
}

fn format_date(at: DateTime<Utc>) -> String {
    let local = at.naive_utc() + TimeDelta::hours(BRASILIA_OFFSET_HOURS);
    local.format("%d/%m/%Y %H:%M").to_string()
}

fn join(choices: Option<&[Choice]>) -> String {
    choices
        .unwrap_or_default()
        .iter()
        .map(Choice::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::lead::tests::sample_record;

    fn lead_at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Lead {
        let mut lead = Lead::new(sample_record());
        lead.created_at = Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap();
        lead
    }

    #[test]
    fn empty_export_is_bom_and_header() {
        let csv = leads_to_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.ends_with("Disponibilidade,Comentários"));
    }

    #[test]
    fn row_cells_are_quoted_and_joined() {
        let mut lead = lead_at(2024, 3, 5, 15, 7);
        lead.record.main_objective = r#"Comprar "à vista""#.into();
        lead.record.additional_comments = Some("Ligar, após 18h".into());

        let csv = leads_to_csv(&[lead]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""05/03/2024 12:07","Ana Souza","ana@example.com""#));
        assert!(row.contains(r#""acoes; Gold bars""#));
        assert!(row.contains(r#""Comprar ""à vista""""#));
        assert!(row.ends_with(r#""Ligar, após 18h""#));
    }

    #[test]
    fn absent_values_are_empty_cells() {
        let lead = lead_at(2024, 1, 1, 12, 0);
        let csv = leads_to_csv(&[lead]);
        let row = csv.lines().nth(1).unwrap();
        // financial_challenges is None in the sample, comments too.
        assert!(row.contains(r#""Aposentar aos 55","urgente""#));
        assert!(row.contains(r#""300k_1m","acoes; Gold bars","","#));
        assert!(row.ends_with(r#""Noites","""#));
    }

    #[test]
    fn date_crosses_midnight_into_previous_day() {
        let lead = lead_at(2024, 1, 1, 1, 30);
        let csv = leads_to_csv(&[lead]);
        assert!(csv.lines().nth(1).unwrap().starts_with(r#""31/12/2023 22:30""#));
    }

    #[test]
    fn filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(export_filename(date), "leads_2024-07-09.csv");
    }
}
