//! Multi-step form state machine.
//!
//! A [`FormState`] owns the draft answers of one form session and the current
//! step. Forward moves are gated by the step validator; backward moves never
//! are. The state machine accepts any mutation that fits a field's kind;
//! selection caps and catalog membership are judged by the validator so the
//! UI can keep re-evaluating validity after every change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::error::{FormError, ValidationError};
use crate::steps::StepPlan;

/// Identifier of every question the intake form asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Name,
    Email,
    Phone,
    Profession,
    ProfessionOther,
    Specialty,
    MonthlyIncome,
    HasDebts,
    TotalAssets,
    Investments,
    InvestmentsOther,
    FinancialChallenges,
    FinancialChallengesOther,
    MainObjective,
    UrgencyLevel,
    ContactPreference,
    Availability,
    AdditionalComments,
}

/// What kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Free text that must be an email address.
    Email,
    /// One code from a catalog category (radio).
    Choice(Category),
    /// A set of codes from a catalog category (checkboxes).
    MultiChoice(Category),
}

impl FieldKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Text | Self::Email => "text",
            Self::Choice(_) => "single-choice",
            Self::MultiChoice(_) => "multi-choice",
        }
    }

    /// Whether the field holds a single string value.
    #[must_use]
    pub const fn is_single_valued(self) -> bool {
        !matches!(self, Self::MultiChoice(_))
    }
}

impl FieldId {
    /// Every field, in form order.
    pub const ALL: [Self; 18] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Profession,
        Self::ProfessionOther,
        Self::Specialty,
        Self::MonthlyIncome,
        Self::HasDebts,
        Self::TotalAssets,
        Self::Investments,
        Self::InvestmentsOther,
        Self::FinancialChallenges,
        Self::FinancialChallengesOther,
        Self::MainObjective,
        Self::UrgencyLevel,
        Self::ContactPreference,
        Self::Availability,
        Self::AdditionalComments,
    ];

    /// The kind of value this field holds.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Email => FieldKind::Email,
            Self::Profession => FieldKind::Choice(Category::Profession),
            Self::MonthlyIncome => FieldKind::Choice(Category::MonthlyIncome),
            Self::HasDebts => FieldKind::Choice(Category::HasDebts),
            Self::TotalAssets => FieldKind::Choice(Category::TotalAssets),
            Self::UrgencyLevel => FieldKind::Choice(Category::UrgencyLevel),
            Self::ContactPreference => FieldKind::Choice(Category::ContactPreference),
            Self::Investments => FieldKind::MultiChoice(Category::Investments),
            Self::FinancialChallenges => FieldKind::MultiChoice(Category::FinancialChallenges),
            Self::Name
            | Self::Phone
            | Self::ProfessionOther
            | Self::Specialty
            | Self::InvestmentsOther
            | Self::FinancialChallengesOther
            | Self::MainObjective
            | Self::Availability
            | Self::AdditionalComments => FieldKind::Text,
        }
    }

    /// The free-text field that replaces the `other` sentinel of this field.
    #[must_use]
    pub const fn other_text(self) -> Option<Self> {
        match self {
            Self::Profession => Some(Self::ProfessionOther),
            Self::Investments => Some(Self::InvestmentsOther),
            Self::FinancialChallenges => Some(Self::FinancialChallengesOther),
            _ => None,
        }
    }

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Profession => "profession",
            Self::ProfessionOther => "profession_other",
            Self::Specialty => "specialty",
            Self::MonthlyIncome => "monthly_income",
            Self::HasDebts => "has_debts",
            Self::TotalAssets => "total_assets",
            Self::Investments => "investments",
            Self::InvestmentsOther => "investments_other",
            Self::FinancialChallenges => "financial_challenges",
            Self::FinancialChallengesOther => "financial_challenges_other",
            Self::MainObjective => "main_objective",
            Self::UrgencyLevel => "urgency_level",
            Self::ContactPreference => "contact_preference",
            Self::Availability => "availability",
            Self::AdditionalComments => "additional_comments",
        }
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldId {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FormError::UnknownField { name: s.to_owned() })
    }
}

/// A raw answer as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Selection(Vec<String>),
}

/// The draft answers of one form.
///
/// Unset fields read as empty. Multi-select values keep selection order and
/// never hold the same code twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormFields {
    values: BTreeMap<FieldId, FieldValue>,
}

impl FormFields {
    /// An empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of a single-valued field, `""` when unset.
    #[must_use]
    pub fn text(&self, field: FieldId) -> &str {
        match self.values.get(&field) {
            Some(FieldValue::Text(t)) => t,
            _ => "",
        }
    }

    /// Selected codes of a multi-select field, empty when unset.
    #[must_use]
    pub fn selection(&self, field: FieldId) -> &[String] {
        match self.values.get(&field) {
            Some(FieldValue::Selection(codes)) => codes,
            _ => &[],
        }
    }

    /// Replace the value of a single-valued field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for multi-select fields.
    pub fn set_text(&mut self, field: FieldId, value: impl Into<String>) -> Result<(), FormError> {
        let kind = field.kind();
        if !kind.is_single_valued() {
            return Err(FormError::WrongKind {
                field,
                expected: "text",
                actual: kind.describe(),
            });
        }
        self.values.insert(field, FieldValue::Text(value.into()));
        Ok(())
    }

    /// Replace the whole selection of a multi-select field.
    ///
    /// Duplicate codes are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for single-valued fields.
    pub fn set_selection(&mut self, field: FieldId, codes: Vec<String>) -> Result<(), FormError> {
        Self::ensure_multi(field)?;
        let mut unique: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        self.values.insert(field, FieldValue::Selection(unique));
        Ok(())
    }

    /// Add or remove one code of a multi-select field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for single-valued fields.
    pub fn toggle(&mut self, field: FieldId, code: &str, included: bool) -> Result<(), FormError> {
        Self::ensure_multi(field)?;
        let entry = self
            .values
            .entry(field)
            .or_insert_with(|| FieldValue::Selection(Vec::new()));
        if let FieldValue::Selection(codes) = entry {
            let present = codes.iter().any(|c| c == code);
            if included && !present {
                codes.push(code.to_owned());
            } else if !included && present {
                codes.retain(|c| c != code);
            }
        }
        Ok(())
    }

    /// Set a field from a raw client value, checking it fits the field's kind.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] when a list is sent for a text field
    /// or a string for a multi-select field.
    pub fn set(&mut self, field: FieldId, value: FieldValue) -> Result<(), FormError> {
        match value {
            FieldValue::Text(text) => self.set_text(field, text),
            FieldValue::Selection(codes) => self.set_selection(field, codes),
        }
    }

    /// Build a draft from a full map of client values.
    ///
    /// # Errors
    ///
    /// Returns the first [`FormError::WrongKind`] encountered.
    pub fn from_values(values: BTreeMap<FieldId, FieldValue>) -> Result<Self, FormError> {
        let mut fields = Self::new();
        for (field, value) in values {
            fields.set(field, value)?;
        }
        Ok(fields)
    }

    fn ensure_multi(field: FieldId) -> Result<(), FormError> {
        let kind = field.kind();
        if kind.is_single_valued() {
            return Err(FormError::WrongKind {
                field,
                expected: "multi-choice",
                actual: kind.describe(),
            });
        }
        Ok(())
    }
}

/// Result of a successful [`FormState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// Moved forward one step.
    Moved { from: usize, to: usize },
    /// The last step is valid; the caller should submit.
    ReadyToSubmit,
}

/// The state of one multi-step form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    plan: StepPlan,
    fields: FormFields,
    step: usize,
}

impl FormState {
    /// A fresh form on step 1 of the given plan.
    #[must_use]
    pub fn new(plan: StepPlan) -> Self {
        Self {
            plan,
            fields: FormFields::new(),
            step: 1,
        }
    }

    /// A fresh lead-intake form.
    #[must_use]
    pub fn lead_intake() -> Self {
        Self::new(StepPlan::lead_intake())
    }

    /// Current step, 1-based.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of steps in the plan.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.plan.len()
    }

    /// Whether the form is on its final step.
    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.step == self.plan.len()
    }

    /// The step plan driving this form.
    #[must_use]
    pub fn plan(&self) -> StepPlan {
        self.plan
    }

    /// Current answers.
    #[must_use]
    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Whether the current step would let [`advance`](Self::advance) through.
    #[must_use]
    pub fn is_current_step_valid(&self) -> bool {
        self.plan.is_step_valid(self.step, &self.fields)
    }

    /// Replace a single-valued field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for multi-select fields.
    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) -> Result<(), FormError> {
        self.fields.set_text(field, value)
    }

    /// Replace the whole selection of a multi-select field.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for single-valued fields.
    pub fn set_selection(&mut self, field: FieldId, codes: Vec<String>) -> Result<(), FormError> {
        self.fields.set_selection(field, codes)
    }

    /// Add or remove a code of a multi-select field. Caps are not enforced here.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::WrongKind`] for single-valued fields.
    pub fn toggle_multi_value(
        &mut self,
        field: FieldId,
        code: &str,
        included: bool,
    ) -> Result<(), FormError> {
        self.fields.toggle(field, code, included)
    }

    /// Move to the next step if the current one validates.
    ///
    /// On the final step a valid form yields [`Transition::ReadyToSubmit`]
    /// and the step does not change.
    ///
    /// # Errors
    ///
    /// Returns the current step's [`ValidationError`]; the step is unchanged.
    pub fn advance(&mut self) -> Result<Transition, ValidationError> {
        self.plan.validate(self.step, &self.fields)?;
        if self.is_last_step() {
            return Ok(Transition::ReadyToSubmit);
        }
        let from = self.step;
        self.step += 1;
        Ok(Transition::Moved { from, to: self.step })
    }

    /// Move back one step, never below step 1. Answers are kept.
    pub fn retreat(&mut self) -> usize {
        self.step = self.step.saturating_sub(1).max(1);
        self.step
    }

    /// Discard all answers and return to step 1.
    pub fn reset(&mut self) {
        self.fields = FormFields::new();
        self.step = 1;
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::lead_intake()
    }
}
