//! Error taxonomy for backend operations.
//!
//! Backend failures carry a machine-readable category distinguished from
//! generic failures. `user_message` translates a category into a
//! localized, user-facing message without leaking internal identifiers;
//! unmapped categories fall back to the raw backend message.

use thiserror::Error;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the backend boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Uniqueness constraint violation
    #[error("uniqueness violation: {message}")]
    Unique { message: String },

    /// Foreign key violation
    #[error("foreign key violation: {message}")]
    ForeignKey { message: String },

    /// Check constraint violation (negative amount, invalid range, ...)
    #[error("check constraint violation: {message}")]
    Check { message: String },

    /// Required field missing
    #[error("required field missing: {message}")]
    RequiredField { message: String },

    /// Permission denied
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Record not found
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Rejected client-side before any network call
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Transport failure (connection, timeout)
    #[error("network error: {message}")]
    Network { message: String },

    /// Payload decoding failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local IO failure (draft persistence)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything the taxonomy does not cover
    #[error("backend error: {message}")]
    Other { message: String },
}

impl Error {
    pub fn unique(message: impl Into<String>) -> Self {
        Error::Unique { message: message.into() }
    }

    pub fn foreign_key(message: impl Into<String>) -> Self {
        Error::ForeignKey { message: message.into() }
    }

    pub fn check(message: impl Into<String>) -> Self {
        Error::Check { message: message.into() }
    }

    pub fn required_field(message: impl Into<String>) -> Self {
        Error::RequiredField { message: message.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Error::PermissionDenied { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound { message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation { message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::Network { message: message.into() }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Error::Other { message: message.into() }
    }

    /// Map a Postgres/PostgREST error code onto the taxonomy.
    pub fn from_backend_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "23505" => Error::Unique { message },
            "23503" => Error::ForeignKey { message },
            "23514" => Error::Check { message },
            "23502" => Error::RequiredField { message },
            "42501" => Error::PermissionDenied { message },
            "PGRST116" => Error::NotFound { message },
            _ => Error::Other { message },
        }
    }

    /// Localized, user-facing message. Categories map to fixed titles;
    /// validation errors are already user-facing and pass through;
    /// everything else falls back to the raw message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unique { .. } => "Cette valeur existe déjà.".to_string(),
            Error::ForeignKey { .. } => {
                "Référence invalide : l'enregistrement lié est introuvable.".to_string()
            }
            Error::Check { .. } => "Valeur refusée par une règle de validation.".to_string(),
            Error::RequiredField { .. } => "Un champ obligatoire est manquant.".to_string(),
            Error::PermissionDenied { .. } => {
                "Vous n'avez pas les droits nécessaires pour cette action.".to_string()
            }
            Error::NotFound { .. } => "Enregistrement introuvable.".to_string(),
            Error::Validation { message } => message.clone(),
            Error::Network { .. } => "Erreur réseau. Vérifiez votre connexion.".to_string(),
            Error::Serialization(e) => format!("Réponse du serveur illisible : {e}"),
            Error::Io(e) => format!("Erreur locale : {e}"),
            Error::Other { message } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network { message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_codes_map_to_categories() {
        assert!(matches!(Error::from_backend_code("23505", "dup"), Error::Unique { .. }));
        assert!(matches!(Error::from_backend_code("23503", "fk"), Error::ForeignKey { .. }));
        assert!(matches!(Error::from_backend_code("23514", "chk"), Error::Check { .. }));
        assert!(matches!(Error::from_backend_code("23502", "null"), Error::RequiredField { .. }));
        assert!(matches!(Error::from_backend_code("42501", "rls"), Error::PermissionDenied { .. }));
        assert!(matches!(Error::from_backend_code("PGRST116", "0 rows"), Error::NotFound { .. }));
        assert!(matches!(Error::from_backend_code("XX000", "boom"), Error::Other { .. }));
    }

    #[test]
    fn user_messages_hide_internals() {
        let err = Error::unique("duplicate key value violates unique constraint \"seance_numero_key\"");
        assert_eq!(err.user_message(), "Cette valeur existe déjà.");
        assert!(!err.user_message().contains("seance_numero_key"));
    }

    #[test]
    fn validation_messages_pass_through() {
        let err = Error::validation("Le montant doit être supérieur à 0.");
        assert_eq!(err.user_message(), "Le montant doit être supérieur à 0.");
    }
}
