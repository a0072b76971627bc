use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::backup::Progress;
use rusqlite::types::Type;
use rusqlite::{Connection, DatabaseName, ErrorCode, OptionalExtension, Row, ffi, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn invalid_column(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| invalid_column(idx, format!("invalid date '{raw}': {e}")))
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?))
}

fn optional_datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .map(|s| parse_datetime(&s)))
}

fn enum_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| invalid_column(idx, format!("unexpected value '{raw}'")))
}

enum Violation {
    Unique,
    ForeignKey,
    Other,
}

fn violation(e: &rusqlite::Error) -> Option<Violation> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            let code = err.extended_code;
            if code == ffi::SQLITE_CONSTRAINT_UNIQUE || code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
                Some(Violation::Unique)
            } else if code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                Some(Violation::ForeignKey)
            } else {
                Some(Violation::Other)
            }
        }
        _ => None,
    }
}

/// Maps a unique violation to `on_unique` and a foreign key violation to `NotFound`.
fn map_write_error(e: rusqlite::Error, on_unique: Error) -> Error {
    match violation(&e) {
        Some(Violation::Unique) => on_unique,
        Some(Violation::ForeignKey) => Error::NotFound,
        Some(Violation::Other) | None => Error::from(e),
    }
}

const ESCOLA_COLUMNS: &str = "id, nome, status, cep, logradouro, numero, complemento, bairro, cidade, uf, logo_url, created_at";

fn row_to_escola(row: &Row<'_>) -> rusqlite::Result<Escola> {
    Ok(Escola {
        id: row.get(0)?,
        nome: row.get(1)?,
        status: enum_column(row, 2, EscolaStatus::parse)?,
        cep: row.get(3)?,
        logradouro: row.get(4)?,
        numero: row.get(5)?,
        complemento: row.get(6)?,
        bairro: row.get(7)?,
        cidade: row.get(8)?,
        uf: row.get(9)?,
        logo_url: row.get(10)?,
        created_at: datetime_column(row, 11)?,
    })
}

const USUARIO_COLUMNS: &str = "u.id, u.nome, u.nome_curto, u.email, u.account_state, u.password_hash, u.social_provider, u.is_superadmin, u.email_confirmado, u.foto_perfil, u.created_at, u.updated_at";

fn row_to_usuario(row: &Row<'_>) -> rusqlite::Result<Usuario> {
    let kind: String = row.get(4)?;
    let account_state = AccountState::from_columns(&kind, row.get(5)?, row.get(6)?)
        .ok_or_else(|| invalid_column(4, format!("inconsistent account state '{kind}'")))?;

    Ok(Usuario {
        id: row.get(0)?,
        nome: row.get(1)?,
        nome_curto: row.get(2)?,
        email: row.get(3)?,
        account_state,
        is_superadmin: row.get(7)?,
        email_confirmado: row.get(8)?,
        foto_perfil: row.get(9)?,
        created_at: datetime_column(row, 10)?,
        updated_at: datetime_column(row, 11)?,
    })
}

const RESOURCE_COLUMNS: &str = "r.id, r.escola_id, r.name, r.description, r.icon, r.sort_order, r.min_agendamento_dias, r.created_at";

fn row_to_resource(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        escola_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        icon: row.get(4)?,
        sort_order: row.get(5)?,
        min_agendamento_dias: row.get(6)?,
        created_at: datetime_column(row, 7)?,
    })
}

const TEMPLATE_COLUMNS: &str = "t.id, t.resource_id, t.shift, t.slots";

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<ScheduleTemplate> {
    let raw: String = row.get(3)?;
    let slots: Vec<Slot> = serde_json::from_str(&raw)
        .map_err(|e| invalid_column(3, format!("invalid slot list: {e}")))?;

    Ok(ScheduleTemplate {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        shift: enum_column(row, 2, Shift::parse)?,
        slots,
    })
}

const BOOKING_COLUMNS: &str = "b.id, b.escola_id, b.resource_id, b.usuario_id, b.teacher_name, b.date, b.shift, b.slot_name, b.status, b.created_at";

fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        escola_id: row.get(1)?,
        resource_id: row.get(2)?,
        usuario_id: row.get(3)?,
        teacher_name: row.get(4)?,
        date: date_column(row, 5)?,
        shift: enum_column(row, 6, Shift::parse)?,
        slot_name: row.get(7)?,
        status: enum_column(row, 8, BookingStatus::parse)?,
        created_at: datetime_column(row, 9)?,
    })
}

const PLANO_COLUMNS: &str = "id, nome, preco, duracao_meses, stripe_price_id";

fn row_to_plano(row: &Row<'_>) -> rusqlite::Result<Plano> {
    Ok(Plano {
        id: row.get(0)?,
        nome: row.get(1)?,
        preco: row.get(2)?,
        duracao_meses: row.get(3)?,
        stripe_price_id: row.get(4)?,
    })
}

const ASSINATURA_COLUMNS: &str = "id, escola_id, plano_id, data_inicio, data_fim, status";

fn row_to_assinatura(row: &Row<'_>) -> rusqlite::Result<Assinatura> {
    Ok(Assinatura {
        id: row.get(0)?,
        escola_id: row.get(1)?,
        plano_id: row.get(2)?,
        data_inicio: date_column(row, 3)?,
        data_fim: date_column(row, 4)?,
        status: enum_column(row, 5, AssinaturaStatus::parse)?,
    })
}

const DISCIPLINA_COLUMNS: &str = "d.id, d.escola_id, d.nome";

fn row_to_disciplina(row: &Row<'_>) -> rusqlite::Result<Disciplina> {
    Ok(Disciplina {
        id: row.get(0)?,
        escola_id: row.get(1)?,
        nome: row.get(2)?,
    })
}

const SESSION_COLUMNS: &str =
    "id, token_hash, token_lookup, usuario_id, escola_id, created_at, expires_at, last_used_at";

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        usuario_id: row.get(3)?,
        escola_id: row.get(4)?,
        created_at: datetime_column(row, 5)?,
        expires_at: datetime_column(row, 6)?,
        last_used_at: optional_datetime_column(row, 7)?,
    })
}

type Rows<T> = rusqlite::Result<Vec<T>>;

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Escola operations

    fn create_escola(&self, escola: &Escola) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO escolas (id, nome, status, cep, logradouro, numero, complemento, bairro, cidade, uf, logo_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    escola.id,
                    escola.nome,
                    escola.status.as_str(),
                    escola.cep,
                    escola.logradouro,
                    escola.numero,
                    escola.complemento,
                    escola.bairro,
                    escola.cidade,
                    escola.uf,
                    escola.logo_url,
                    format_datetime(&escola.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_escola(&self, id: &str) -> Result<Option<Escola>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ESCOLA_COLUMNS} FROM escolas WHERE id = ?1"),
            params![id],
            row_to_escola,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_escola_by_nome(&self, nome: &str) -> Result<Option<Escola>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ESCOLA_COLUMNS} FROM escolas WHERE nome = ?1"),
            params![nome],
            row_to_escola,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_escolas(&self, cursor: &str, limit: i32) -> Result<Vec<Escola>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ESCOLA_COLUMNS} FROM escolas WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], row_to_escola)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_escola(&self, escola: &Escola) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE escolas SET nome = ?1, status = ?2, cep = ?3, logradouro = ?4, numero = ?5,
                 complemento = ?6, bairro = ?7, cidade = ?8, uf = ?9, logo_url = ?10
                 WHERE id = ?11",
                params![
                    escola.nome,
                    escola.status.as_str(),
                    escola.cep,
                    escola.logradouro,
                    escola.numero,
                    escola.complemento,
                    escola.bairro,
                    escola.cidade,
                    escola.uf,
                    escola.logo_url,
                    escola.id,
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_escola(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM escolas WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Usuario operations

    fn create_usuario(&self, usuario: &Usuario) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO usuarios (id, nome, nome_curto, email, account_state, password_hash, social_provider,
                 is_superadmin, email_confirmado, foto_perfil, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    usuario.id,
                    usuario.nome,
                    usuario.nome_curto,
                    usuario.email,
                    usuario.account_state.kind(),
                    usuario.account_state.password_hash(),
                    usuario.account_state.social_provider(),
                    usuario.is_superadmin,
                    usuario.email_confirmado,
                    usuario.foto_perfil,
                    format_datetime(&usuario.created_at),
                    format_datetime(&usuario.updated_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::EmailTaken))?;
        Ok(())
    }

    fn get_usuario(&self, id: &str) -> Result<Option<Usuario>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USUARIO_COLUMNS} FROM usuarios u WHERE u.id = ?1"),
            params![id],
            row_to_usuario,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_usuario_by_email(&self, email: &str) -> Result<Option<Usuario>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USUARIO_COLUMNS} FROM usuarios u WHERE u.email = ?1 COLLATE NOCASE"),
            params![email],
            row_to_usuario,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_usuario(&self, usuario: &Usuario) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE usuarios SET nome = ?1, nome_curto = ?2, email = ?3, account_state = ?4,
                 password_hash = ?5, social_provider = ?6, is_superadmin = ?7, email_confirmado = ?8,
                 foto_perfil = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    usuario.nome,
                    usuario.nome_curto,
                    usuario.email,
                    usuario.account_state.kind(),
                    usuario.account_state.password_hash(),
                    usuario.account_state.social_provider(),
                    usuario.is_superadmin,
                    usuario.email_confirmado,
                    usuario.foto_perfil,
                    format_datetime(&Utc::now()),
                    usuario.id,
                ],
            )
            .map_err(|e| map_write_error(e, Error::EmailTaken))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_usuario(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM usuarios WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_superadmin(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM usuarios WHERE is_superadmin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Membership operations

    fn add_membership(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        papel: Papel,
        matricula: Option<&str>,
    ) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO usuario_escola (usuario_id, escola_id, papel, matricula) VALUES (?1, ?2, ?3, ?4)",
                params![usuario_id, tenant.as_str(), papel.as_str(), matricula],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_membership(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
    ) -> Result<Option<UsuarioEscola>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT usuario_id, escola_id, papel, matricula FROM usuario_escola
             WHERE usuario_id = ?1 AND escola_id = ?2",
            params![usuario_id, tenant.as_str()],
            |row| {
                Ok(UsuarioEscola {
                    usuario_id: row.get(0)?,
                    escola_id: row.get(1)?,
                    papel: enum_column(row, 2, Papel::parse)?,
                    matricula: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_membros(&self, tenant: &TenantId) -> Result<Vec<Membro>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USUARIO_COLUMNS}, m.papel, m.matricula
             FROM usuario_escola m
             JOIN usuarios u ON u.id = m.usuario_id
             WHERE m.escola_id = ?1
             ORDER BY u.nome"
        ))?;

        let rows = stmt.query_map(params![tenant.as_str()], |row| {
            Ok(Membro {
                usuario: row_to_usuario(row)?,
                papel: enum_column(row, 12, Papel::parse)?,
                matricula: row.get(13)?,
            })
        })?;

        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_membership(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        papel: Papel,
        matricula: Option<&str>,
    ) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE usuario_escola SET papel = ?1, matricula = ?2 WHERE usuario_id = ?3 AND escola_id = ?4",
            params![papel.as_str(), matricula, usuario_id, tenant.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn remove_membership(&self, tenant: &TenantId, usuario_id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM bookings WHERE escola_id = ?1 AND usuario_id = ?2",
            params![tenant.as_str(), usuario_id],
        )?;
        tx.execute(
            "DELETE FROM usuario_disciplinas WHERE usuario_id = ?1
             AND disciplina_id IN (SELECT id FROM disciplinas WHERE escola_id = ?2)",
            params![usuario_id, tenant.as_str()],
        )?;
        let rows = tx.execute(
            "DELETE FROM usuario_escola WHERE usuario_id = ?1 AND escola_id = ?2",
            params![usuario_id, tenant.as_str()],
        )?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn list_usuario_memberships(&self, usuario_id: &str) -> Result<Vec<MembershipWithEscola>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT m.usuario_id, m.escola_id, m.papel, m.matricula, e.nome, e.status
             FROM usuario_escola m
             JOIN escolas e ON e.id = m.escola_id
             WHERE m.usuario_id = ?1
             ORDER BY e.nome",
        )?;

        let rows = stmt.query_map(params![usuario_id], |row| {
            Ok(MembershipWithEscola {
                membership: UsuarioEscola {
                    usuario_id: row.get(0)?,
                    escola_id: row.get(1)?,
                    papel: enum_column(row, 2, Papel::parse)?,
                    matricula: row.get(3)?,
                },
                escola_nome: row.get(4)?,
                escola_status: enum_column(row, 5, EscolaStatus::parse)?,
            })
        })?;

        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn count_usuario_memberships(&self, usuario_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM usuario_escola WHERE usuario_id = ?1",
            params![usuario_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Resource operations

    fn create_resource(&self, tenant: &TenantId, resource: &Resource) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO resources (id, escola_id, name, description, icon, sort_order, min_agendamento_dias, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    resource.id,
                    tenant.as_str(),
                    resource.name,
                    resource.description,
                    resource.icon,
                    resource.sort_order,
                    resource.min_agendamento_dias,
                    format_datetime(&resource.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_resource(&self, tenant: &TenantId, id: &str) -> Result<Option<Resource>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.id = ?1 AND r.escola_id = ?2"),
            params![id, tenant.as_str()],
            row_to_resource,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_resources(&self, tenant: &TenantId) -> Result<Vec<Resource>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.escola_id = ?1 ORDER BY r.sort_order, r.name"
        ))?;

        let rows = stmt.query_map(params![tenant.as_str()], row_to_resource)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_resource(&self, tenant: &TenantId, resource: &Resource) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE resources SET name = ?1, description = ?2, icon = ?3, sort_order = ?4, min_agendamento_dias = ?5
             WHERE id = ?6 AND escola_id = ?7",
            params![
                resource.name,
                resource.description,
                resource.icon,
                resource.sort_order,
                resource.min_agendamento_dias,
                resource.id,
                tenant.as_str(),
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_resource(&self, tenant: &TenantId, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM resources WHERE id = ?1 AND escola_id = ?2",
            params![id, tenant.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn reorder_resources(&self, tenant: &TenantId, ids: &[String]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE resources SET sort_order = ?1 WHERE id = ?2 AND escola_id = ?3",
            )?;
            for (position, id) in ids.iter().enumerate() {
                updated += stmt.execute(params![position as i64, id, tenant.as_str()])?;
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    fn copy_resource(
        &self,
        tenant: &TenantId,
        source_id: &str,
        new_name: &str,
        new_icon: Option<&str>,
    ) -> Result<Resource> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let source = tx
            .query_row(
                &format!("SELECT {RESOURCE_COLUMNS} FROM resources r WHERE r.id = ?1 AND r.escola_id = ?2"),
                params![source_id, tenant.as_str()],
                row_to_resource,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        let copy = Resource {
            id: uuid::Uuid::new_v4().to_string(),
            escola_id: tenant.as_str().to_string(),
            name: new_name.to_string(),
            description: source.description.clone(),
            icon: new_icon.unwrap_or(&source.icon).to_string(),
            sort_order: source.sort_order + 1,
            min_agendamento_dias: source.min_agendamento_dias,
            created_at: Utc::now(),
        };

        tx.execute(
            "INSERT INTO resources (id, escola_id, name, description, icon, sort_order, min_agendamento_dias, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                copy.id,
                copy.escola_id,
                copy.name,
                copy.description,
                copy.icon,
                copy.sort_order,
                copy.min_agendamento_dias,
                format_datetime(&copy.created_at),
            ],
        )?;

        let templates = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM schedule_templates t WHERE t.resource_id = ?1 AND t.escola_id = ?2"
            ))?;
            let rows = stmt.query_map(params![source.id, tenant.as_str()], row_to_template)?;
            rows.collect::<Rows<_>>()?
        };

        for template in &templates {
            tx.execute(
                "INSERT INTO schedule_templates (id, escola_id, resource_id, shift, slots)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    tenant.as_str(),
                    copy.id,
                    template.shift.as_str(),
                    serde_json::to_string(&template.slots)?,
                ],
            )?;
        }

        tx.commit()?;
        Ok(copy)
    }

    // Schedule template operations

    fn upsert_schedule(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        shift: Shift,
        slots: &[Slot],
    ) -> Result<ScheduleTemplate> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM resources WHERE id = ?1 AND escola_id = ?2)",
            params![resource_id, tenant.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::NotFound);
        }

        tx.execute(
            "INSERT INTO schedule_templates (id, escola_id, resource_id, shift, slots)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(resource_id, shift) DO UPDATE SET slots = excluded.slots",
            params![
                uuid::Uuid::new_v4().to_string(),
                tenant.as_str(),
                resource_id,
                shift.as_str(),
                serde_json::to_string(slots)?,
            ],
        )?;

        let template = tx.query_row(
            &format!(
                "SELECT {TEMPLATE_COLUMNS} FROM schedule_templates t WHERE t.resource_id = ?1 AND t.shift = ?2"
            ),
            params![resource_id, shift.as_str()],
            row_to_template,
        )?;

        tx.commit()?;
        Ok(template)
    }

    fn get_schedule(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        shift: Shift,
    ) -> Result<Option<ScheduleTemplate>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {TEMPLATE_COLUMNS} FROM schedule_templates t
                 WHERE t.resource_id = ?1 AND t.shift = ?2 AND t.escola_id = ?3"
            ),
            params![resource_id, shift.as_str(), tenant.as_str()],
            row_to_template,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_schedules(
        &self,
        tenant: &TenantId,
        resource_id: &str,
    ) -> Result<Vec<ScheduleTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM schedule_templates t
             WHERE t.resource_id = ?1 AND t.escola_id = ?2 ORDER BY t.shift"
        ))?;

        let rows = stmt.query_map(params![resource_id, tenant.as_str()], row_to_template)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn list_tenant_schedules(&self, tenant: &TenantId) -> Result<Vec<ScheduleTemplate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM schedule_templates t
             WHERE t.escola_id = ?1 ORDER BY t.resource_id, t.shift"
        ))?;

        let rows = stmt.query_map(params![tenant.as_str()], row_to_template)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn delete_schedule(&self, tenant: &TenantId, resource_id: &str, shift: Shift) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM schedule_templates WHERE resource_id = ?1 AND shift = ?2 AND escola_id = ?3",
            params![resource_id, shift.as_str(), tenant.as_str()],
        )?;
        Ok(rows > 0)
    }

    // Booking operations

    fn create_booking(&self, tenant: &TenantId, booking: &NewBooking) -> Result<Booking> {
        let created = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            escola_id: tenant.as_str().to_string(),
            resource_id: booking.resource_id.clone(),
            usuario_id: booking.usuario_id.clone(),
            teacher_name: booking.teacher_name.clone(),
            date: booking.date,
            shift: booking.shift,
            slot_name: booking.slot_name.clone(),
            status: booking.status,
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO bookings (id, escola_id, resource_id, usuario_id, teacher_name, date, shift, slot_name, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    created.id,
                    created.escola_id,
                    created.resource_id,
                    created.usuario_id,
                    created.teacher_name,
                    format_date(created.date),
                    created.shift.as_str(),
                    created.slot_name,
                    created.status.as_str(),
                    format_datetime(&created.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::SlotTaken))?;

        Ok(created)
    }

    fn get_booking(&self, tenant: &TenantId, id: &str) -> Result<Option<Booking>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1 AND b.escola_id = ?2"),
            params![id, tenant.as_str()],
            row_to_booking,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_booking(&self, tenant: &TenantId, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM bookings WHERE id = ?1 AND escola_id = ?2",
            params![id, tenant.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn list_bookings_for_day(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.escola_id = ?1 AND b.resource_id = ?2 AND b.date = ?3
             ORDER BY b.shift, b.slot_name"
        ))?;

        let rows = stmt.query_map(
            params![tenant.as_str(), resource_id, format_date(date)],
            row_to_booking,
        )?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn list_bookings_between(
        &self,
        tenant: &TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.escola_id = ?1 AND b.date BETWEEN ?2 AND ?3
             ORDER BY b.date, b.shift, b.slot_name"
        ))?;

        let rows = stmt.query_map(
            params![tenant.as_str(), format_date(start), format_date(end)],
            row_to_booking,
        )?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn list_usuario_bookings(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        from: Option<NaiveDate>,
    ) -> Result<Vec<BookingWithResource>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS}, r.name, r.icon
             FROM bookings b
             JOIN resources r ON r.id = b.resource_id AND r.escola_id = b.escola_id
             WHERE b.escola_id = ?1 AND b.usuario_id = ?2 AND (?3 IS NULL OR b.date >= ?3)
             ORDER BY b.date, b.shift, b.slot_name"
        ))?;

        let rows = stmt.query_map(
            params![tenant.as_str(), usuario_id, from.map(format_date)],
            |row| {
                Ok(BookingWithResource {
                    booking: row_to_booking(row)?,
                    resource_name: row.get(10)?,
                    resource_icon: row.get(11)?,
                })
            },
        )?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn booking_report(
        &self,
        tenant: &TenantId,
        resource_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReportRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT teacher_name, COUNT(*) AS total FROM bookings
             WHERE escola_id = ?1 AND resource_id = ?2 AND date BETWEEN ?3 AND ?4 AND status = 'booked'
             GROUP BY teacher_name
             ORDER BY total DESC, teacher_name",
        )?;

        let rows = stmt.query_map(
            params![
                tenant.as_str(),
                resource_id,
                format_date(start),
                format_date(end)
            ],
            |row| {
                Ok(ReportRow {
                    teacher_name: row.get(0)?,
                    count: row.get(1)?,
                })
            },
        )?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    // Disciplina operations

    fn create_disciplina(&self, tenant: &TenantId, disciplina: &Disciplina) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO disciplinas (id, escola_id, nome) VALUES (?1, ?2, ?3)",
                params![disciplina.id, tenant.as_str(), disciplina.nome],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_disciplina(&self, tenant: &TenantId, id: &str) -> Result<Option<Disciplina>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {DISCIPLINA_COLUMNS} FROM disciplinas d WHERE d.id = ?1 AND d.escola_id = ?2"),
            params![id, tenant.as_str()],
            row_to_disciplina,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_disciplinas(&self, tenant: &TenantId) -> Result<Vec<Disciplina>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DISCIPLINA_COLUMNS} FROM disciplinas d WHERE d.escola_id = ?1 ORDER BY d.nome"
        ))?;

        let rows = stmt.query_map(params![tenant.as_str()], row_to_disciplina)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_disciplina(&self, tenant: &TenantId, disciplina: &Disciplina) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE disciplinas SET nome = ?1 WHERE id = ?2 AND escola_id = ?3",
                params![disciplina.nome, disciplina.id, tenant.as_str()],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_disciplina(&self, tenant: &TenantId, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM disciplinas WHERE id = ?1 AND escola_id = ?2",
            params![id, tenant.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn set_membro_disciplinas(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
        disciplina_ids: &[String],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for id in disciplina_ids {
            let owned: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM disciplinas WHERE id = ?1 AND escola_id = ?2)",
                params![id, tenant.as_str()],
                |row| row.get(0),
            )?;
            if !owned {
                return Err(Error::NotFound);
            }
        }

        tx.execute(
            "DELETE FROM usuario_disciplinas WHERE usuario_id = ?1
             AND disciplina_id IN (SELECT id FROM disciplinas WHERE escola_id = ?2)",
            params![usuario_id, tenant.as_str()],
        )?;

        for id in disciplina_ids {
            tx.execute(
                "INSERT OR IGNORE INTO usuario_disciplinas (usuario_id, disciplina_id) VALUES (?1, ?2)",
                params![usuario_id, id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_membro_disciplinas(
        &self,
        tenant: &TenantId,
        usuario_id: &str,
    ) -> Result<Vec<Disciplina>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DISCIPLINA_COLUMNS} FROM disciplinas d
             JOIN usuario_disciplinas ud ON ud.disciplina_id = d.id
             WHERE ud.usuario_id = ?1 AND d.escola_id = ?2
             ORDER BY d.nome"
        ))?;

        let rows = stmt.query_map(params![usuario_id, tenant.as_str()], row_to_disciplina)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    // Plano operations

    fn create_plano(&self, plano: &Plano) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO planos (id, nome, preco, duracao_meses, stripe_price_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    plano.id,
                    plano.nome,
                    plano.preco,
                    plano.duracao_meses,
                    plano.stripe_price_id,
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_plano(&self, id: &str) -> Result<Option<Plano>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PLANO_COLUMNS} FROM planos WHERE id = ?1"),
            params![id],
            row_to_plano,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_plano_by_nome(&self, nome: &str) -> Result<Option<Plano>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PLANO_COLUMNS} FROM planos WHERE nome = ?1"),
            params![nome],
            row_to_plano,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_planos(&self) -> Result<Vec<Plano>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PLANO_COLUMNS} FROM planos ORDER BY duracao_meses, nome"
        ))?;

        let rows = stmt.query_map([], row_to_plano)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_plano(&self, plano: &Plano) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE planos SET nome = ?1, preco = ?2, duracao_meses = ?3, stripe_price_id = ?4 WHERE id = ?5",
                params![
                    plano.nome,
                    plano.preco,
                    plano.duracao_meses,
                    plano.stripe_price_id,
                    plano.id,
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_plano(&self, id: &str) -> Result<bool> {
        let conn = self.conn();
        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assinaturas WHERE plano_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(Error::Conflict(
                "Este plano está em uso por assinaturas e não pode ser excluído.".to_string(),
            ));
        }

        let rows = conn.execute("DELETE FROM planos WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Assinatura operations

    fn create_assinatura(&self, assinatura: &Assinatura) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO assinaturas (id, escola_id, plano_id, data_inicio, data_fim, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    assinatura.id,
                    assinatura.escola_id,
                    assinatura.plano_id,
                    format_date(assinatura.data_inicio),
                    format_date(assinatura.data_fim),
                    assinatura.status.as_str(),
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_assinatura(&self, id: &str) -> Result<Option<Assinatura>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ASSINATURA_COLUMNS} FROM assinaturas WHERE id = ?1"),
            params![id],
            row_to_assinatura,
        )
        .optional()
        .map_err(Error::from)
    }

    fn current_assinatura(&self, tenant: &TenantId) -> Result<Option<Assinatura>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {ASSINATURA_COLUMNS} FROM assinaturas
                 WHERE escola_id = ?1 AND status != 'cancelada'
                 ORDER BY data_fim DESC LIMIT 1"
            ),
            params![tenant.as_str()],
            row_to_assinatura,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_assinaturas(&self, tenant: &TenantId) -> Result<Vec<Assinatura>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSINATURA_COLUMNS} FROM assinaturas WHERE escola_id = ?1 ORDER BY data_fim DESC"
        ))?;

        let rows = stmt.query_map(params![tenant.as_str()], row_to_assinatura)?;
        rows.collect::<Rows<_>>().map_err(Error::from)
    }

    fn update_assinatura(&self, assinatura: &Assinatura) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE assinaturas SET plano_id = ?1, data_inicio = ?2, data_fim = ?3, status = ?4 WHERE id = ?5",
                params![
                    assinatura.plano_id,
                    format_date(assinatura.data_inicio),
                    format_date(assinatura.data_fim),
                    assinatura.status.as_str(),
                    assinatura.id,
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn expire_overdue_assinaturas(&self, today: NaiveDate) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE assinaturas SET status = 'vencida' WHERE status = 'ativa' AND data_fim < ?1",
            params![format_date(today)],
        )?;
        Ok(rows)
    }

    fn record_checkout_session(&self, session_id: &str, tenant: &TenantId) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT OR IGNORE INTO checkout_sessions (session_id, escola_id, processed_at) VALUES (?1, ?2, ?3)",
            params![session_id, tenant.as_str(), format_datetime(&Utc::now())],
        )?;
        Ok(rows > 0)
    }

    fn forget_checkout_session(&self, session_id: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM checkout_sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(())
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sessions (id, token_hash, token_lookup, usuario_id, escola_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id,
                    session.token_hash,
                    session.token_lookup,
                    session.usuario_id,
                    session.escola_id,
                    format_datetime(&session.created_at),
                    format_datetime(&session.expires_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::TokenLookupCollision))?;
        Ok(())
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_lookup = ?1"),
            params![lookup],
            row_to_session,
        )
        .optional()
        .map_err(Error::from)
    }

    fn set_session_escola(&self, id: &str, escola_id: Option<&str>) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE sessions SET escola_id = ?1 WHERE id = ?2",
                params![escola_id, id],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn touch_session(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_usuario_sessions(&self, usuario_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE usuario_id = ?1",
            params![usuario_id],
        )?;
        Ok(rows)
    }

    // Email token operations

    fn create_email_token(&self, token: &EmailToken) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO email_tokens (id, token_hash, token_lookup, usuario_id, purpose, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    token.id,
                    token.token_hash,
                    token.token_lookup,
                    token.usuario_id,
                    token.purpose.as_str(),
                    format_datetime(&token.created_at),
                    format_datetime(&token.expires_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::TokenLookupCollision))?;
        Ok(())
    }

    fn get_email_token_by_lookup(&self, lookup: &str) -> Result<Option<EmailToken>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, usuario_id, purpose, created_at, expires_at, used_at
             FROM email_tokens WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(EmailToken {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    usuario_id: row.get(3)?,
                    purpose: enum_column(row, 4, EmailTokenPurpose::parse)?,
                    created_at: datetime_column(row, 5)?,
                    expires_at: datetime_column(row, 6)?,
                    used_at: optional_datetime_column(row, 7)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn mark_email_token_used(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE email_tokens SET used_at = ?1 WHERE id = ?2 AND used_at IS NULL",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(rows > 0)
    }

    // OAuth state operations

    fn create_oauth_state(&self, state: &OAuthState) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO oauth_states (state, provider, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    state.state,
                    state.provider,
                    format_datetime(&state.created_at),
                    format_datetime(&state.expires_at),
                ],
            )
            .map_err(|e| map_write_error(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn take_oauth_state(&self, state: &str) -> Result<Option<OAuthState>> {
        let conn = self.conn();
        conn.query_row(
            "DELETE FROM oauth_states WHERE state = ?1 RETURNING state, provider, created_at, expires_at",
            params![state],
            |row| {
                Ok(OAuthState {
                    state: row.get(0)?,
                    provider: row.get(1)?,
                    created_at: datetime_column(row, 2)?,
                    expires_at: datetime_column(row, 3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Snapshots

    fn backup_to(&self, path: &Path) -> Result<()> {
        self.conn().backup(DatabaseName::Main, path, None)?;
        Ok(())
    }

    fn restore_from(&self, path: &Path) -> Result<()> {
        let mut conn = self.conn();
        conn.restore(DatabaseName::Main, path, None::<fn(Progress)>)?;
        // Snapshots taken before a schema change lack the newer tables.
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}
