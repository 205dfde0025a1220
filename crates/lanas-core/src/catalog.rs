//! Field catalog: the fixed options offered by each choice question.
//!
//! Codes are the stable identifiers written to storage and checked by the
//! step validator. Labels are presentation text (Brazilian Portuguese, as
//! shown on the landing page) and never take part in validation.
//!
//! Categories whose entries include [`OTHER`] pair the choice with a sibling
//! free-text field that becomes required once `other` is selected.

use serde::{Deserialize, Serialize};

/// Reserved code meaning "none of the fixed options; see the free text".
pub const OTHER: &str = "other";

/// One selectable option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Machine value stored with the lead.
    pub code: &'static str,
    /// Human label.
    pub label: &'static str,
}

const fn entry(code: &'static str, label: &'static str) -> CatalogEntry {
    CatalogEntry { code, label }
}

const PROFESSION: &[CatalogEntry] = &[
    entry("empresario", "Empresário(a)"),
    entry("medico", "Médico(a)"),
    entry(OTHER, "Outra"),
];

const MONTHLY_INCOME: &[CatalogEntry] = &[
    entry("ate_10k", "Até R$10.000"),
    entry("10k_20k", "R$ 10.001 a R$ 20.000"),
    entry("20k_50k", "R$ 20.001 a R$ 50.000"),
    entry("50k_100k", "R$ 50.001 a R$ 100.000"),
    entry("acima_100k", "Acima de R$ 100.000"),
];

const HAS_DEBTS: &[CatalogEntry] = &[
    entry("alto_custo", "Sim, de alto custo (juros altos)"),
    entry("baixo_custo", "Sim, de baixo custo (juros baixos)"),
    entry("nao", "Não"),
];

const TOTAL_ASSETS: &[CatalogEntry] = &[
    entry("ate_300k", "Até R$ 300.000"),
    entry("300k_1m", "R$ 301.000 a R$ 1.000.000"),
    entry("1m_2m", "R$ 1.000.001 a R$ 2.000.000"),
    entry("2m_5m", "R$ 2.000.001 a R$ 5.000.000"),
    entry("acima_5m", "Acima de R$ 5.000.000"),
    entry("nao_tenho", "Não tenho"),
];

const INVESTMENTS: &[CatalogEntry] = &[
    entry("poupanca", "Poupança"),
    entry("renda_fixa", "Renda Fixa (CDB, LCI, LCA, Tesouro Direto)"),
    entry("acoes", "Ações"),
    entry("fundos", "Fundos de Investimentos"),
    entry("previdencia", "Previdência Privada"),
    entry("cripto", "Criptomoedas"),
    entry("imoveis", "Imóveis (para investimento)"),
    entry("nao_possuo", "Não possuo investimentos"),
    entry(OTHER, "Outros"),
];

const FINANCIAL_CHALLENGES: &[CatalogEntry] = &[
    entry("impostos", "Pagar muitos impostos"),
    entry("organizacao", "Dificuldade em organizar finanças"),
    entry("investir", "Não saber onde/como investir"),
    entry("protecao", "Proteção do patrimônio"),
    entry("aposentadoria", "Falta de plano para aposentadoria"),
    entry("sucessao", "Preocupação com sucessão"),
    entry("renda_passiva", "Gerar mais renda passiva"),
    entry(OTHER, "Outro"),
];

const URGENCY_LEVEL: &[CatalogEntry] = &[
    entry("muito_urgente", "Muito urgente"),
    entry("urgente", "Urgente"),
    entry("moderado", "Moderado"),
];

const CONTACT_PREFERENCE: &[CatalogEntry] = &[
    entry("whatsapp", "WhatsApp"),
    entry("email", "E-mail"),
    entry("ligacao", "Ligação telefônica"),
];

/// A question whose answer is drawn from a fixed option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Profession,
    MonthlyIncome,
    HasDebts,
    TotalAssets,
    Investments,
    FinancialChallenges,
    UrgencyLevel,
    ContactPreference,
}

impl Category {
    /// Every category, in form order.
    pub const ALL: [Self; 8] = [
        Self::Profession,
        Self::MonthlyIncome,
        Self::HasDebts,
        Self::TotalAssets,
        Self::Investments,
        Self::FinancialChallenges,
        Self::UrgencyLevel,
        Self::ContactPreference,
    ];

    /// Ordered options for this category.
    #[must_use]
    pub const fn entries(self) -> &'static [CatalogEntry] {
        match self {
            Self::Profession => PROFESSION,
            Self::MonthlyIncome => MONTHLY_INCOME,
            Self::HasDebts => HAS_DEBTS,
            Self::TotalAssets => TOTAL_ASSETS,
            Self::Investments => INVESTMENTS,
            Self::FinancialChallenges => FINANCIAL_CHALLENGES,
            Self::UrgencyLevel => URGENCY_LEVEL,
            Self::ContactPreference => CONTACT_PREFERENCE,
        }
    }

    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profession => "profession",
            Self::MonthlyIncome => "monthly_income",
            Self::HasDebts => "has_debts",
            Self::TotalAssets => "total_assets",
            Self::Investments => "investments",
            Self::FinancialChallenges => "financial_challenges",
            Self::UrgencyLevel => "urgency_level",
            Self::ContactPreference => "contact_preference",
        }
    }

    /// Whether the options include the [`OTHER`] sentinel.
    #[must_use]
    pub fn allows_other(self) -> bool {
        self.contains(OTHER)
    }

    /// Whether `code` is one of this category's codes.
    #[must_use]
    pub fn contains(self, code: &str) -> bool {
        self.entries().iter().any(|e| e.code == code)
    }

    /// Label for a stored value.
    ///
    /// Free text that replaced `other` is not a code and is returned as-is.
    #[must_use]
    pub fn label<'a>(self, value: &'a str) -> &'a str {
        self.entries()
            .iter()
            .find(|e| e.code == value)
            .map_or(value, |e| e.label)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable view of one category, for `GET /v1/catalog`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOptions {
    pub category: Category,
    pub allows_other: bool,
    pub options: &'static [CatalogEntry],
}

/// The whole catalog in form order.
#[must_use]
pub fn all_options() -> Vec<CategoryOptions> {
    Category::ALL
        .iter()
        .map(|&category| CategoryOptions {
            category,
            allows_other: category.allows_other(),
            options: category.entries(),
        })
        .collect()
}
