//! Shared configuration helpers and message template defaults.

use crate::error::ConfigError;

/// Subject line used when `OUTREACH_SUBJECT` is not set.
///
/// `{clinic_name}` is replaced with the recipient's clinic name.
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "Candidatura para puesto en {clinic_name}";

/// Body used when `OUTREACH_BODY` is not set.
pub const DEFAULT_BODY_TEMPLATE: &str = "Hola, equipo de {clinic_name}:\n\n\
Les escribo para presentar mi candidatura por si cuentan con alguna vacante \
en su clínica. Adjunto mi CV con el detalle de mi formación y experiencia.\n\n\
Quedo a su disposición para cualquier consulta.\n\n\
Un cordial saludo\n";

/// Reads a required environment variable, failing with the variable name.
pub fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Reads an optional environment variable, falling back to `default`.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────
