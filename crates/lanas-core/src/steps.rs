//! Step plan and step validator.
//!
//! The plan is an ordered table of step descriptors. Each descriptor lists the
//! fields shown on that step together with their rules, so validation is a
//! pure function of `(step, fields)` and can be re-run after every mutation.

use serde::Serialize;

use crate::catalog::OTHER;
use crate::error::{FieldIssue, ValidationError};
use crate::form::{FieldId, FieldKind, FormFields};

/// Maximum number of financial challenges a lead may pick.
pub const CHALLENGES_CAP: usize = 3;

/// How one field is checked on its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub field: FieldId,
    pub required: bool,
    /// Ceiling for multi-select fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

impl FieldRule {
    const fn required(field: FieldId) -> Self {
        Self {
            field,
            required: true,
            max_selections: None,
        }
    }

    const fn optional(field: FieldId) -> Self {
        Self {
            field,
            required: false,
            max_selections: None,
        }
    }

    const fn capped(field: FieldId, max: usize) -> Self {
        Self {
            field,
            required: true,
            max_selections: Some(max),
        }
    }
}

/// One page of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub title: &'static str,
    pub fields: &'static [FieldRule],
}

const LEAD_INTAKE: &[Step] = &[
    Step {
        title: "Contato e profissão",
        fields: &[
            FieldRule::required(FieldId::Name),
            FieldRule::required(FieldId::Email),
            FieldRule::required(FieldId::Phone),
            FieldRule::required(FieldId::Profession),
            FieldRule::required(FieldId::Specialty),
        ],
    },
    Step {
        title: "Situação financeira",
        fields: &[
            FieldRule::required(FieldId::MonthlyIncome),
            FieldRule::required(FieldId::HasDebts),
            FieldRule::required(FieldId::TotalAssets),
            FieldRule::required(FieldId::Investments),
        ],
    },
    Step {
        title: "Desafios e objetivos",
        fields: &[
            FieldRule::capped(FieldId::FinancialChallenges, CHALLENGES_CAP),
            FieldRule::required(FieldId::MainObjective),
        ],
    },
    Step {
        title: "Preferências de contato",
        fields: &[
            FieldRule::required(FieldId::UrgencyLevel),
            FieldRule::required(FieldId::ContactPreference),
            FieldRule::required(FieldId::Availability),
            FieldRule::optional(FieldId::AdditionalComments),
        ],
    },
];

/// An ordered sequence of steps; step numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepPlan {
    steps: &'static [Step],
}

impl StepPlan {
    /// A plan over a custom step table. An empty table is treated as one
    /// step with no fields.
    #[must_use]
    pub const fn new(steps: &'static [Step]) -> Self {
        const EMPTY: &[Step] = &[Step {
            title: "",
            fields: &[],
        }];
        if steps.is_empty() {
            Self { steps: EMPTY }
        } else {
            Self { steps }
        }
    }

    /// The four-step lead-intake plan.
    #[must_use]
    pub const fn lead_intake() -> Self {
        Self::new(LEAD_INTAKE)
    }

    /// Number of steps.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a plan has at least one step.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Descriptor of step `n` (1-based).
    #[must_use]
    pub fn step(&self, n: usize) -> Option<&'static Step> {
        n.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// All steps in order.
    #[must_use]
    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    /// Validate one step.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Step`] listing every failing field, or
    /// [`ValidationError::NoSuchStep`] when `step` is out of range.
    pub fn validate(&self, step: usize, fields: &FormFields) -> Result<(), ValidationError> {
        let descriptor = self.step(step).ok_or(ValidationError::NoSuchStep {
            step,
            count: self.len(),
        })?;
        let issues = validate_step(descriptor, fields);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Step { step, issues })
        }
    }

    /// Whether step `step` validates.
    #[must_use]
    pub fn is_step_valid(&self, step: usize, fields: &FormFields) -> bool {
        self.validate(step, fields).is_ok()
    }

    /// Validate every step, reporting the first one that fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's [`ValidationError`].
    pub fn validate_all(&self, fields: &FormFields) -> Result<(), ValidationError> {
        (1..=self.len()).try_for_each(|step| self.validate(step, fields))
    }
}

impl Default for StepPlan {
    fn default() -> Self {
        Self::lead_intake()
    }
}

/// Check every field rule of a step and collect the issues.
#[must_use]
pub fn validate_step(step: &Step, fields: &FormFields) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    for rule in step.fields {
        check_rule(rule, fields, &mut issues);
    }
    issues
}

fn check_rule(rule: &FieldRule, fields: &FormFields, issues: &mut Vec<FieldIssue>) {
    let field = rule.field;
    match field.kind() {
        FieldKind::Text => {
            if rule.required && fields.text(field).trim().is_empty() {
                issues.push(FieldIssue::Missing { field });
            }
        }
        FieldKind::Email => {
            let value = fields.text(field).trim();
            if value.is_empty() {
                if rule.required {
                    issues.push(FieldIssue::Missing { field });
                }
            } else if !is_valid_email(value) {
                issues.push(FieldIssue::InvalidEmail { field });
            }
        }
        FieldKind::Choice(category) => {
            let code = fields.text(field).trim();
            if code.is_empty() {
                if rule.required {
                    issues.push(FieldIssue::Missing { field });
                }
            } else if !category.contains(code) {
                issues.push(FieldIssue::UnknownCode {
                    field,
                    code: code.to_owned(),
                });
            } else if code == OTHER {
                check_other_text(field, fields, issues);
            }
        }
        FieldKind::MultiChoice(category) => {
            let codes = fields.selection(field);
            if codes.is_empty() {
                if rule.required {
                    issues.push(FieldIssue::Missing { field });
                }
                return;
            }
            for code in codes.iter().filter(|c| !category.contains(c)) {
                issues.push(FieldIssue::UnknownCode {
                    field,
                    code: code.clone(),
                });
            }
            if let Some(max) = rule.max_selections.filter(|&max| codes.len() > max) {
                issues.push(FieldIssue::TooManySelections {
                    field,
                    max,
                    actual: codes.len(),
                });
            }
            if codes.iter().any(|c| c == OTHER) {
                check_other_text(field, fields, issues);
            }
        }
    }
}

fn check_other_text(field: FieldId, fields: &FormFields, issues: &mut Vec<FieldIssue>) {
    let Some(text_field) = field.other_text() else {
        return;
    };
    if fields.text(text_field).trim().is_empty() {
        issues.push(FieldIssue::OtherTextMissing { field, text_field });
    }
}

/// Loose syntactic check: one `@`, a non-empty local part, a dotted domain
/// and no whitespace.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
