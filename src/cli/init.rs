use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{MIN_PASSWORD_LEN, hash_password};
use crate::config::Integrations;
use crate::store::{SqliteStore, Store};
use crate::types::{AccountState, Escola, EscolaStatus, Papel, Plano, TenantId, Usuario};

pub const DEFAULT_ESCOLA_NOME: &str = "Minha Primeira Escola";
const SUPERADMIN_NOME: &str = "Administrador Geral";
const SUPERADMIN_MATRICULA: &str = "SUPERADMIN";

/// Name, duration in months and price in cents of the plans seeded on init.
const DEFAULT_PLANOS: [(&str, i64, i64); 3] = [
    ("Mensal", 1, 4990),
    ("Semestral", 6, 26940),
    ("Anual", 12, 47880),
];

pub struct SuperadminSeed {
    pub email: String,
    /// Only needed when the account does not exist yet.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// Creates whatever part of the initial data set is missing.
///
/// Returns one line per item, in seeding order.
pub fn seed(store: &dyn Store, superadmin: &SuperadminSeed) -> anyhow::Result<Vec<(String, SeedOutcome)>> {
    let mut report = Vec::new();
    let now = Utc::now();

    let email = superadmin.email.trim().to_lowercase();
    let admin = match store.get_usuario_by_email(&email)? {
        Some(mut usuario) => {
            if !usuario.is_superadmin {
                usuario.is_superadmin = true;
                store.update_usuario(&usuario)?;
            }
            report.push((format!("super admin {email}"), SeedOutcome::AlreadyPresent));
            usuario
        }
        None => {
            let Some(password) = superadmin.password.as_deref() else {
                bail!("A password is required to create the super admin {email}");
            };
            if password.chars().count() < MIN_PASSWORD_LEN {
                bail!("The super admin password must have at least {MIN_PASSWORD_LEN} characters");
            }
            let usuario = Usuario {
                id: Uuid::new_v4().to_string(),
                nome: SUPERADMIN_NOME.to_string(),
                nome_curto: None,
                email: email.clone(),
                account_state: AccountState::Active {
                    password_hash: hash_password(password)?,
                },
                is_superadmin: true,
                email_confirmado: true,
                foto_perfil: None,
                created_at: now,
                updated_at: now,
            };
            store.create_usuario(&usuario)?;
            report.push((format!("super admin {email}"), SeedOutcome::Created));
            usuario
        }
    };

    let escola = match store.get_escola_by_nome(DEFAULT_ESCOLA_NOME)? {
        Some(escola) => {
            report.push((format!("school '{DEFAULT_ESCOLA_NOME}'"), SeedOutcome::AlreadyPresent));
            escola
        }
        None => {
            let escola = Escola {
                id: Uuid::new_v4().to_string(),
                nome: DEFAULT_ESCOLA_NOME.to_string(),
                status: EscolaStatus::Ativo,
                cep: None,
                logradouro: None,
                numero: None,
                complemento: None,
                bairro: None,
                cidade: None,
                uf: None,
                logo_url: None,
                created_at: now,
            };
            store.create_escola(&escola)?;
            report.push((format!("school '{DEFAULT_ESCOLA_NOME}'"), SeedOutcome::Created));
            escola
        }
    };

    let tenant = TenantId::from_escola(&escola);
    if store.get_membership(&tenant, &admin.id)?.is_some() {
        report.push(("super admin membership".to_string(), SeedOutcome::AlreadyPresent));
    } else {
        store.add_membership(&tenant, &admin.id, Papel::Admin, Some(SUPERADMIN_MATRICULA))?;
        report.push(("super admin membership".to_string(), SeedOutcome::Created));
    }

    for (nome, duracao_meses, preco) in DEFAULT_PLANOS {
        if store.get_plano_by_nome(nome)?.is_some() {
            report.push((format!("plan '{nome}'"), SeedOutcome::AlreadyPresent));
            continue;
        }
        store.create_plano(&Plano {
            id: Uuid::new_v4().to_string(),
            nome: nome.to_string(),
            preco,
            duracao_meses,
            stripe_price_id: None,
        })?;
        report.push((format!("plan '{nome}'"), SeedOutcome::Created));
    }

    Ok(report)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn superadmin_email(non_interactive: bool) -> anyhow::Result<String> {
    if let Some(email) = env_value("SUPERADMIN_EMAIL") {
        return Ok(email);
    }
    if non_interactive {
        bail!("SUPERADMIN_EMAIL must be set when running with --non-interactive");
    }

    let email = inquire::Text::new("Super admin e-mail:")
        .with_validator(|input: &str| {
            if input.contains('@') && !input.trim().is_empty() {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Ok(inquire::validator::Validation::Invalid(
                    "Enter a valid e-mail address".into(),
                ))
            }
        })
        .prompt()?;
    Ok(email)
}

fn superadmin_password(non_interactive: bool) -> anyhow::Result<String> {
    if let Some(password) = env_value("SUPERADMIN_PASSWORD") {
        return Ok(password);
    }
    if non_interactive {
        bail!("SUPERADMIN_PASSWORD must be set when running with --non-interactive");
    }

    let password = inquire::Password::new("Super admin password:")
        .with_validator(|input: &str| {
            if input.chars().count() >= MIN_PASSWORD_LEN {
                Ok(inquire::validator::Validation::Valid)
            } else {
                Ok(inquire::validator::Validation::Invalid(
                    format!("Use at least {MIN_PASSWORD_LEN} characters").into(),
                ))
            }
        })
        .prompt()?;
    Ok(password)
}

pub fn run_init(
    data_dir: String,
    non_interactive: bool,
    integrations: &Integrations,
) -> anyhow::Result<()> {
    let data_path = PathBuf::from(data_dir);
    fs::create_dir_all(&data_path)?;

    let db_path = integrations.database_path(&data_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::new(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    store.initialize()?;

    for dir in ["uploads/perfil", "uploads/logos", "backups"] {
        fs::create_dir_all(data_path.join(dir))?;
    }

    let email = superadmin_email(non_interactive)?;
    let password = match store.get_usuario_by_email(&email.trim().to_lowercase())? {
        Some(_) => None,
        None => Some(superadmin_password(non_interactive)?),
    };

    let report = seed(&store, &SuperadminSeed { email, password })?;

    println!();
    for (item, outcome) in &report {
        match outcome {
            SeedOutcome::Created => println!("  created {item}"),
            SeedOutcome::AlreadyPresent => println!("  {item} already exists"),
        }
    }
    println!();
    println!("Database initialized at: {}", db_path.display());
    println!();

    tracing::info!(path = %db_path.display(), "database initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn credentials() -> SuperadminSeed {
        SuperadminSeed {
            email: "Root@Example.com".into(),
            password: Some("segredo123".into()),
        }
    }

    #[test]
    fn test_seed_creates_everything_once() {
        let (_temp, store) = store();

        let first = seed(&store, &credentials()).unwrap();
        assert_eq!(first.len(), 6);
        assert!(first.iter().all(|(_, o)| *o == SeedOutcome::Created));

        let second = seed(&store, &credentials()).unwrap();
        assert!(second.iter().all(|(_, o)| *o == SeedOutcome::AlreadyPresent));

        let admin = store.get_usuario_by_email("root@example.com").unwrap().unwrap();
        assert!(admin.is_superadmin);
        assert!(admin.email_confirmado);

        let escola = store.get_escola_by_nome(DEFAULT_ESCOLA_NOME).unwrap().unwrap();
        let membership = store
            .get_membership(&TenantId::from_escola(&escola), &admin.id)
            .unwrap()
            .unwrap();
        assert_eq!(membership.papel, Papel::Admin);
        assert_eq!(membership.matricula.as_deref(), Some("SUPERADMIN"));

        let mut duracoes: Vec<i64> = store
            .list_planos()
            .unwrap()
            .iter()
            .map(|p| p.duracao_meses)
            .collect();
        duracoes.sort_unstable();
        assert_eq!(duracoes, vec![1, 6, 12]);
    }

    #[test]
    fn test_seed_requires_password_for_new_admin() {
        let (_temp, store) = store();
        let result = seed(
            &store,
            &SuperadminSeed {
                email: "root@example.com".into(),
                password: None,
            },
        );
        assert!(result.is_err());
        assert!(!store.has_superadmin().unwrap());
    }
}
