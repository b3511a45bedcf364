//! Sender label normalization.
//!
//! The message log stores free-text sender labels written by several
//! integrations (Portuguese and English variants). Normalization maps
//! them into a closed role set before reconstruction; anything outside
//! the alias table is dropped and never influences a metric.

use serde::{Deserialize, Serialize};

/// Normalized role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The end customer writing in via WhatsApp
    Customer,
    /// An automated (AI) reply
    Automated,
    /// A human attendant
    Human,
    /// Label outside the alias table; excluded from all metrics
    Unrecognized,
}

impl Sender {
    /// Normalize a raw label into a [`Sender`].
    ///
    /// Trims and lower-cases before matching; the alias set is fixed.
    /// Empty or missing labels are `Unrecognized`.
    pub fn normalize(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Sender::Unrecognized;
        };
        match label.trim().to_lowercase().as_str() {
            "customer" | "cliente" => Sender::Customer,
            "ia" | "ai" => Sender::Automated,
            "humano" | "usuario" | "atendente" | "agent" | "human" => Sender::Human,
            _ => Sender::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Customer => "customer",
            Sender::Automated => "automated",
            Sender::Human => "human",
            Sender::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_aliases() {
        assert_eq!(Sender::normalize(Some("cliente")), Sender::Customer);
        assert_eq!(Sender::normalize(Some("customer")), Sender::Customer);
    }

    #[test]
    fn test_automated_aliases() {
        assert_eq!(Sender::normalize(Some("ia")), Sender::Automated);
        assert_eq!(Sender::normalize(Some("ai")), Sender::Automated);
    }

    #[test]
    fn test_human_aliases() {
        for label in ["humano", "usuario", "atendente", "agent", "human"] {
            assert_eq!(Sender::normalize(Some(label)), Sender::Human, "{label}");
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(Sender::normalize(Some("  Cliente ")), Sender::Customer);
        assert_eq!(Sender::normalize(Some("IA")), Sender::Automated);
        assert_eq!(Sender::normalize(Some("ATENDENTE")), Sender::Human);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(Sender::normalize(None), Sender::Unrecognized);
        assert_eq!(Sender::normalize(Some("")), Sender::Unrecognized);
        assert_eq!(Sender::normalize(Some("   ")), Sender::Unrecognized);
        assert_eq!(Sender::normalize(Some("bot")), Sender::Unrecognized);
        assert_eq!(Sender::normalize(Some("sistema")), Sender::Unrecognized);
    }
}
