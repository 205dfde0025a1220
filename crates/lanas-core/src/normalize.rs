//! Raw form answers to a [`NewLead`].
//!
//! Text is trimmed, the `other` sentinel is swapped for its paired free text,
//! empty selections and empty optional text become `None`. The normalizer
//! re-checks the invariants it relies on instead of trusting the validator.

use crate::catalog::OTHER;
use crate::error::{FieldIssue, ValidationError};
use crate::form::{FieldId, FieldKind, FormFields};
use crate::lead::{Choice, NewLead};
use crate::steps::{CHALLENGES_CAP, is_valid_email};

/// Build the persistence record from a draft.
///
/// # Errors
///
/// Returns [`ValidationError::Field`] for the first field that breaks a
/// record invariant: missing required text, unknown code, `other` without
/// free text, or more than three challenges.
pub fn normalize(fields: &FormFields) -> Result<NewLead, ValidationError> {
    let email = required_text(fields, FieldId::Email)?;
    if !is_valid_email(&email) {
        return Err(ValidationError::Field(FieldIssue::InvalidEmail {
            field: FieldId::Email,
        }));
    }

    let challenges = multi(fields, FieldId::FinancialChallenges)?;
    if let Some(list) = &challenges {
        if list.len() > CHALLENGES_CAP {
            return Err(ValidationError::Field(FieldIssue::TooManySelections {
                field: FieldId::FinancialChallenges,
                max: CHALLENGES_CAP,
                actual: list.len(),
            }));
        }
    }

    Ok(NewLead {
        name: required_text(fields, FieldId::Name)?,
        email,
        phone: required_text(fields, FieldId::Phone)?,
        profession: single(fields, FieldId::Profession)?,
        specialty: required_text(fields, FieldId::Specialty)?,
        monthly_income: code(fields, FieldId::MonthlyIncome)?,
        has_debts: code(fields, FieldId::HasDebts)?,
        total_assets: code(fields, FieldId::TotalAssets)?,
        investments: multi(fields, FieldId::Investments)?,
        financial_challenges: challenges,
        main_objective: required_text(fields, FieldId::MainObjective)?,
        additional_comments: optional_text(fields, FieldId::AdditionalComments),
        urgency_level: code(fields, FieldId::UrgencyLevel)?,
        contact_preference: code(fields, FieldId::ContactPreference)?,
        availability: required_text(fields, FieldId::Availability)?,
    })
}

fn missing(field: FieldId) -> ValidationError {
    ValidationError::Field(FieldIssue::Missing { field })
}

fn required_text(fields: &FormFields, field: FieldId) -> Result<String, ValidationError> {
    optional_text(fields, field).ok_or_else(|| missing(field))
}

fn optional_text(fields: &FormFields, field: FieldId) -> Option<String> {
    let value = fields.text(field).trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Resolve one code, replacing `other` with its free text.
fn resolve(fields: &FormFields, field: FieldId, code: &str) -> Result<Choice, ValidationError> {
    let category = match field.kind() {
        FieldKind::Choice(c) | FieldKind::MultiChoice(c) => c,
        FieldKind::Text | FieldKind::Email => return Err(missing(field)),
    };
    if !category.contains(code) {
        return Err(ValidationError::Field(FieldIssue::UnknownCode {
            field,
            code: code.to_owned(),
        }));
    }
    if code != OTHER {
        return Ok(Choice::Fixed(code.to_owned()));
    }
    let text_field = field.other_text().ok_or_else(|| missing(field))?;
    optional_text(fields, text_field)
        .map(Choice::Other)
        .ok_or(ValidationError::Field(FieldIssue::OtherTextMissing {
            field,
            text_field,
        }))
}

fn single(fields: &FormFields, field: FieldId) -> Result<Choice, ValidationError> {
    let code = fields.text(field).trim();
    if code.is_empty() {
        return Err(missing(field));
    }
    resolve(fields, field, code)
}

/// A plain code for categories without `other`.
fn code(fields: &FormFields, field: FieldId) -> Result<String, ValidationError> {
    single(fields, field).map(|c| c.as_str().to_owned())
}

fn multi(fields: &FormFields, field: FieldId) -> Result<Option<Vec<Choice>>, ValidationError> {
    let codes = fields.selection(field);
    if codes.is_empty() {
        return Ok(None);
    }
    codes
        .iter()
        .map(|c| resolve(fields, field, c))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::steps::tests::complete_fields;

    #[test]
    fn complete_draft_normalizes_field_for_field() {
        let lead = normalize(&complete_fields()).unwrap();
        assert_eq!(lead.name, "Ana Souza");
        assert_eq!(lead.profession, Choice::Fixed("medico".into()));
        assert_eq!(lead.monthly_income, "20k_50k");
        assert_eq!(
            lead.investments,
            Some(vec![
                Choice::Fixed("renda_fixa".into()),
                Choice::Fixed("acoes".into())
            ])
        );
        assert_eq!(lead.additional_comments, None);
    }

    #[test]
    fn other_investment_becomes_free_text() {
        let mut fields = complete_fields();
        fields
            .set_selection(FieldId::Investments, vec![OTHER.into()])
            .unwrap();
        fields.set_text(FieldId::InvestmentsOther, "Gold bars").unwrap();

        let lead = normalize(&fields).unwrap();
        let investments = lead.investments.unwrap();
        assert_eq!(investments, vec![Choice::Other("Gold bars".into())]);
        assert_eq!(
            investments.iter().map(Choice::as_str).collect::<Vec<_>>(),
            ["Gold bars"]
        );
    }

    #[test]
    fn other_without_text_is_rejected() {
        let mut fields = complete_fields();
        fields.set_text(FieldId::Profession, OTHER).unwrap();
        assert_eq!(
            normalize(&fields),
            Err(ValidationError::Field(FieldIssue::OtherTextMissing {
                field: FieldId::Profession,
                text_field: FieldId::ProfessionOther,
            }))
        );
    }

    #[test]
    fn empty_challenges_normalize_to_absent() {
        let mut fields = complete_fields();
        fields
            .set_selection(FieldId::FinancialChallenges, Vec::new())
            .unwrap();
        assert_eq!(normalize(&fields).unwrap().financial_challenges, None);
    }

    #[test]
    fn blank_optional_comment_is_absent_and_text_is_trimmed() {
        let mut fields = complete_fields();
        fields.set_text(FieldId::AdditionalComments, "   ").unwrap();
        fields.set_text(FieldId::Name, "  Ana Souza ").unwrap();
        let lead = normalize(&fields).unwrap();
        assert_eq!(lead.additional_comments, None);
        assert_eq!(lead.name, "Ana Souza");

        fields.set_text(FieldId::AdditionalComments, " Ligar após 18h ").unwrap();
        assert_eq!(
            normalize(&fields).unwrap().additional_comments.as_deref(),
            Some("Ligar após 18h")
        );
    }

    #[test]
    fn four_challenges_are_rejected() {
        let mut fields = complete_fields();
        fields
            .set_selection(
                FieldId::FinancialChallenges,
                vec![
                    "impostos".into(),
                    "investir".into(),
                    "protecao".into(),
                    "sucessao".into(),
                ],
            )
            .unwrap();
        assert!(matches!(
            normalize(&fields),
            Err(ValidationError::Field(FieldIssue::TooManySelections { .. }))
        ));
    }

    #[test]
    fn sentinel_never_reaches_the_record() {
        let mut fields = complete_fields();
        fields
            .set_selection(
                FieldId::FinancialChallenges,
                vec!["impostos".into(), OTHER.into()],
            )
            .unwrap();
        fields
            .set_text(FieldId::FinancialChallengesOther, "Herança")
            .unwrap();
        let lead = normalize(&fields).unwrap();
        let stored: Vec<_> = lead
            .financial_challenges
            .unwrap()
            .iter()
            .map(|c| c.as_str().to_owned())
            .collect();
        assert_eq!(stored, ["impostos", "Herança"]);
    }
}
