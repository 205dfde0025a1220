//! The durable lead record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Category;

/// A catalog-backed answer once the `other` sentinel has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Choice {
    /// One of the category's catalog codes.
    Fixed(String),
    /// Free text typed by the lead in place of `other`.
    Other(String),
}

impl Choice {
    /// The stored value: a code or the free text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fixed(s) | Self::Other(s) => s,
        }
    }

    /// Whether this is free text.
    #[must_use]
    pub fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }

    /// Human label within `category`; free text is returned unchanged.
    #[must_use]
    pub fn label(&self, category: Category) -> &str {
        match self {
            Self::Fixed(code) => category.label(code),
            Self::Other(text) => text,
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized submission that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profession: Choice,
    pub specialty: String,
    pub monthly_income: String,
    pub has_debts: String,
    pub total_assets: String,
    pub investments: Option<Vec<Choice>>,
    pub financial_challenges: Option<Vec<Choice>>,
    pub main_objective: String,
    pub additional_comments: Option<String>,
    pub urgency_level: String,
    pub contact_preference: String,
    pub availability: String,
}

/// A stored lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: NewLead,
}

impl Lead {
    /// Assign identity to a new record.
    #[must_use]
    pub fn new(record: NewLead) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            record,
        }
    }
}

/// A lead with catalog labels resolved, for the admin detail view.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledLead<'a> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub profession: &'a str,
    pub specialty: &'a str,
    pub monthly_income: &'a str,
    pub has_debts: &'a str,
    pub total_assets: &'a str,
    pub investments: Vec<&'a str>,
    pub financial_challenges: Vec<&'a str>,
    pub main_objective: &'a str,
    pub additional_comments: Option<&'a str>,
    pub urgency_level: &'a str,
    pub contact_preference: &'a str,
    pub availability: &'a str,
}

fn labels(choices: Option<&[Choice]>, category: Category) -> Vec<&str> {
    choices
        .unwrap_or_default()
        .iter()
        .map(|c| c.label(category))
        .collect()
}

impl Lead {
    /// Resolve every code to its catalog label.
    #[must_use]
    pub fn labeled(&self) -> LabeledLead<'_> {
        let r = &self.record;
        LabeledLead {
            id: self.id,
            created_at: self.created_at,
            name: &r.name,
            email: &r.email,
            phone: &r.phone,
            profession: r.profession.label(Category::Profession),
            specialty: &r.specialty,
            monthly_income: Category::MonthlyIncome.label(&r.monthly_income),
            has_debts: Category::HasDebts.label(&r.has_debts),
            total_assets: Category::TotalAssets.label(&r.total_assets),
            investments: labels(r.investments.as_deref(), Category::Investments),
            financial_challenges: labels(
                r.financial_challenges.as_deref(),
                Category::FinancialChallenges,
            ),
            main_objective: &r.main_objective,
            additional_comments: r.additional_comments.as_deref(),
            urgency_level: Category::UrgencyLevel.label(&r.urgency_level),
            contact_preference: Category::ContactPreference.label(&r.contact_preference),
            availability: &r.availability,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_record() -> NewLead {
        NewLead {
            name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            phone: "(11) 91234-5678".into(),
            profession: Choice::Fixed("medico".into()),
            specialty: "Cardiologia".into(),
            monthly_income: "20k_50k".into(),
            has_debts: "nao".into(),
            total_assets: "300k_1m".into(),
            investments: Some(vec![
                Choice::Fixed("acoes".into()),
                Choice::Other("Gold bars".into()),
            ]),
            financial_challenges: None,
            main_objective: "Aposentar aos 55".into(),
            additional_comments: None,
            urgency_level: "urgente".into(),
            contact_preference: "whatsapp".into(),
            availability: "Noites".into(),
        }
    }

    #[test]
    fn absent_optionals_serialize_as_null() {
        let lead = Lead::new(sample_record());
        let json = serde_json::to_value(&lead).unwrap();
        assert!(json["additional_comments"].is_null());
        assert!(json["financial_challenges"].is_null());
        assert_eq!(json["name"], "Ana Souza");
        assert_eq!(json["investments"][1]["kind"], "other");
    }

    #[test]
    fn stored_json_decodes_back() {
        let lead = Lead::new(sample_record());
        let bytes = serde_json::to_vec(&lead).unwrap();
        let decoded: Lead = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, lead);
    }

    #[test]
    fn labeled_view_resolves_codes_and_keeps_free_text() {
        let lead = Lead::new(sample_record());
        let view = lead.labeled();
        assert_eq!(view.profession, "Médico(a)");
        assert_eq!(view.monthly_income, "R$ 20.001 a R$ 50.000");
        assert_eq!(view.investments, vec!["Ações", "Gold bars"]);
        assert!(view.financial_challenges.is_empty());
        assert_eq!(view.contact_preference, "WhatsApp");
    }
}
