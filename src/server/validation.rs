use std::collections::HashSet;

use crate::auth::MIN_PASSWORD_LEN;
use crate::server::response::ApiError;
use crate::types::{DEFAULT_SLOT_TYPE, Slot};

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

fn validate_text(value: &str, label: &str, max_len: usize) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} é obrigatório."));
    }
    if value.chars().count() > max_len {
        return Err(format!("{label} não pode ter mais de {max_len} caracteres."));
    }
    Ok(value.to_string())
}

/// Trims and checks a required name field.
pub fn validate_name(value: &str, label: &str) -> Result<String, ApiError> {
    validate_text(value, label, MAX_NAME_LEN).map_err(ApiError::bad_request)
}

/// Trims an optional text field; blank becomes `None`.
#[must_use]
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalises an email address to lower case.
pub fn validate_email(value: &str) -> Result<String, ApiError> {
    let email = value.trim().to_lowercase();
    let invalid = || ApiError::bad_request("Informe um e-mail válido.");

    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(email)
}

pub fn validate_password(password: &str, confirm: Option<&str>) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "A senha deve ter pelo menos {MIN_PASSWORD_LEN} caracteres."
        )));
    }
    if confirm.is_some_and(|c| c != password) {
        return Err(ApiError::bad_request("As senhas não coincidem."));
    }
    Ok(())
}

/// Trims slot names, drops empty ones and rejects duplicates.
pub fn normalize_slots(slots: Vec<Slot>) -> Result<Vec<Slot>, ApiError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(slots.len());

    for slot in slots {
        let name = slot.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(ApiError::bad_request(format!(
                "O horário \"{name}\" está repetido neste turno."
            )));
        }
        let slot_type = match slot.slot_type.trim() {
            "" => DEFAULT_SLOT_TYPE.to_string(),
            t => t.to_string(),
        };
        normalized.push(Slot { name, slot_type });
    }

    Ok(normalized)
}

/// Checks an uploaded image and returns its lower-case extension.
pub fn validate_image_upload(filename: &str, size: usize) -> Result<String, ApiError> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::bad_request(
            "Formato de imagem não permitido. Use png, jpg, jpeg, gif ou webp.",
        ));
    }
    if size == 0 {
        return Err(ApiError::bad_request("Arquivo vazio."));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(ApiError::payload_too_large(
            "A imagem excede o tamanho máximo de 5 MB.",
        ));
    }
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, slot_type: &str) -> Slot {
        Slot {
            name: name.to_string(),
            slot_type: slot_type.to_string(),
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Laboratório ", "Nome").unwrap(), "Laboratório");
        assert!(validate_name("   ", "Nome").is_err());
        assert!(validate_name(&"a".repeat(121), "Nome").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Ana@Escola.COM ").unwrap(),
            "ana@escola.com"
        );
        for bad in ["", "ana", "ana@", "@escola.com", "ana@escola", "ana@.com", "a b@x.com", "a@b@c.com"] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456", None).is_ok());
        assert!(validate_password("12345", None).is_err());
        assert!(validate_password("123456", Some("123456")).is_ok());
        assert!(validate_password("123456", Some("654321")).is_err());
    }

    #[test]
    fn test_normalize_slots() {
        let slots = normalize_slots(vec![
            slot(" 07:00 ", "aula"),
            slot("", "aula"),
            slot("Intervalo", "intervalo"),
            slot("08:00", ""),
        ])
        .unwrap();

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].name, "07:00");
        assert_eq!(slots[2].slot_type, "aula");

        assert!(normalize_slots(vec![slot("07:00", "aula"), slot("07:00 ", "aula")]).is_err());
    }

    #[test]
    fn test_validate_image_upload() {
        assert_eq!(validate_image_upload("foto.PNG", 10).unwrap(), "png");
        assert!(validate_image_upload("foto.svg", 10).is_err());
        assert!(validate_image_upload("foto", 10).is_err());
        assert!(validate_image_upload("foto.jpg", 0).is_err());

        let err = validate_image_upload("foto.jpg", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }
}
