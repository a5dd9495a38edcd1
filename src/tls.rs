use axum_server::tls_rustls::RustlsConfig;
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::TlsConfig;
use crate::error::{AppError, Result};

/// Decodes one piece of base64-encoded PEM material.
pub fn decode_pem(name: &str, value: Option<&str>) -> Result<Vec<u8>> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} is not set", name)))?;

    let pem = STANDARD
        .decode(value)
        .map_err(|e| AppError::Tls(format!("{} is not valid base64: {}", name, e)))?;

    if !pem.starts_with(b"-----BEGIN") {
        return Err(AppError::Tls(format!("{} does not decode to PEM data", name)));
    }

    Ok(pem)
}

pub async fn rustls_config(tls: &TlsConfig) -> Result<RustlsConfig> {
    let cert = decode_pem("TLS_CERT", tls.cert.as_deref())?;
    let key = decode_pem("TLS_KEY", tls.key.as_deref())?;

    RustlsConfig::from_pem(cert, key)
        .await
        .map_err(|e| AppError::Tls(format!("failed to load certificate and key: {}", e)))
}
