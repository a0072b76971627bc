use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use tracing::info;

use crate::auth::RequireSuperadmin;
use crate::backup::{create_backup, list_backups, schedule_restore, secure_filename};
use crate::billing::apply_renewal;
use crate::error::Error;
use crate::scheduling::today;
use crate::server::AppState;
use crate::server::dto::{
    CreateEscolaRequest, CreatePlanoRequest, GrantPlanoRequest, MessageResponse,
    PaginationParams, SuperUpdateEscolaRequest, UpdatePlanoRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::{optional_text, validate_name};
use crate::types::{Escola, EscolaStatus, Plano, TenantId};

const DUPLICATE_ESCOLA: &str = "Já existe uma escola com este nome.";
const DUPLICATE_PLANO: &str = "Já existe um plano com este nome.";

pub fn superadmin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/escolas", get(list_escolas).post(create_escola))
        .route("/escolas/{id}", patch(update_escola).delete(delete_escola))
        .route(
            "/escolas/{id}/assinaturas",
            get(list_assinaturas).post(grant_plano),
        )
        .route("/planos", get(list_planos).post(create_plano))
        .route("/planos/{id}", patch(update_plano).delete(delete_plano))
        .route("/backups", get(backups))
        .route("/backup", post(backup))
        .route("/restore", post(restore))
}

fn load_escola(state: &AppState, id: &str) -> Result<Escola, ApiError> {
    state
        .store
        .get_escola(id)
        .api_err("Falha ao carregar a escola.")?
        .or_not_found("Escola não encontrada.")
}

fn load_plano(state: &AppState, id: &str) -> Result<Plano, ApiError> {
    state
        .store
        .get_plano(id)
        .api_err("Falha ao carregar o plano.")?
        .or_not_found("Plano não encontrado.")
}

fn validate_plano_values(preco: i64, duracao_meses: i64) -> Result<(), ApiError> {
    if preco < 0 {
        return Err(ApiError::bad_request("O preço não pode ser negativo."));
    }
    if duracao_meses < 1 {
        return Err(ApiError::bad_request(
            "A duração deve ser de pelo menos 1 mês.",
        ));
    }
    Ok(())
}

fn duplicate_as(message: &'static str) -> impl Fn(Error) -> ApiError {
    move |e| match e {
        Error::AlreadyExists => ApiError::conflict(message),
        other => other.into(),
    }
}

// Escolas

/// GET /superadmin/escolas
pub async fn list_escolas(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let escolas = state
        .store
        .list_escolas(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Falha ao listar as escolas.")?;

    let (escolas, next_cursor, has_more) =
        paginate(escolas, DEFAULT_PAGE_SIZE as usize, |e| e.id.clone());

    Ok(Json(PaginatedResponse::new(escolas, next_cursor, has_more)))
}

/// POST /superadmin/escolas
pub async fn create_escola(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEscolaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut escola = Escola {
        id: uuid::Uuid::new_v4().to_string(),
        nome: validate_name(&req.nome, "O nome da escola")?,
        status: EscolaStatus::Ativo,
        cep: None,
        logradouro: None,
        numero: None,
        complemento: None,
        bairro: None,
        cidade: None,
        uf: None,
        logo_url: None,
        created_at: Utc::now(),
    };
    escola.set_endereco(req.endereco);

    state
        .store
        .create_escola(&escola)
        .map_err(duplicate_as(DUPLICATE_ESCOLA))?;

    info!(escola_id = %escola.id, "school created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(escola))))
}

/// PATCH /superadmin/escolas/{id}
pub async fn update_escola(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SuperUpdateEscolaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut escola = load_escola(&state, &id)?;

    if let Some(nome) = req.nome {
        escola.nome = validate_name(&nome, "O nome da escola")?;
    }
    if let Some(status) = req.status {
        escola.status = status;
    }

    state
        .store
        .update_escola(&escola)
        .map_err(duplicate_as(DUPLICATE_ESCOLA))?;

    info!(escola_id = %escola.id, status = escola.status.as_str(), "school updated");
    Ok(Json(ApiResponse::success(escola)))
}

/// DELETE /superadmin/escolas/{id} - Cascades to everything the school owns
pub async fn delete_escola(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_escola(&id)
        .api_err("Falha ao remover a escola.")?;

    if !deleted {
        return Err(ApiError::not_found("Escola não encontrada."));
    }

    info!(escola_id = %id, "school deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /superadmin/escolas/{id}/assinaturas
pub async fn list_assinaturas(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let escola = load_escola(&state, &id)?;
    let assinaturas = state
        .store
        .list_assinaturas(&TenantId::from_escola(&escola))
        .api_err("Falha ao listar as assinaturas.")?;

    Ok(Json(ApiResponse::success(assinaturas)))
}

/// POST /superadmin/escolas/{id}/assinaturas - Grant or renew a plan manually
pub async fn grant_plano(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<GrantPlanoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let escola = load_escola(&state, &id)?;
    let plano = load_plano(&state, &req.plano_id)?;

    let assinatura = apply_renewal(
        state.store.as_ref(),
        &TenantId::from_escola(&escola),
        &plano,
        today(),
    )
    .api_err("Falha ao renovar a assinatura.")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(assinatura))))
}

// Planos

/// GET /superadmin/planos
pub async fn list_planos(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let planos = state
        .store
        .list_planos()
        .api_err("Falha ao listar os planos.")?;

    Ok(Json(ApiResponse::success(planos)))
}

/// POST /superadmin/planos
pub async fn create_plano(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlanoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_plano_values(req.preco, req.duracao_meses)?;

    let plano = Plano {
        id: uuid::Uuid::new_v4().to_string(),
        nome: validate_name(&req.nome, "O nome do plano")?,
        preco: req.preco,
        duracao_meses: req.duracao_meses,
        stripe_price_id: optional_text(req.stripe_price_id),
    };

    state
        .store
        .create_plano(&plano)
        .map_err(duplicate_as(DUPLICATE_PLANO))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(plano))))
}

/// PATCH /superadmin/planos/{id}
pub async fn update_plano(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlanoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut plano = load_plano(&state, &id)?;

    if let Some(nome) = req.nome {
        plano.nome = validate_name(&nome, "O nome do plano")?;
    }
    if let Some(preco) = req.preco {
        plano.preco = preco;
    }
    if let Some(duracao_meses) = req.duracao_meses {
        plano.duracao_meses = duracao_meses;
    }
    if req.stripe_price_id.is_some() {
        plano.stripe_price_id = optional_text(req.stripe_price_id);
    }
    validate_plano_values(plano.preco, plano.duracao_meses)?;

    state
        .store
        .update_plano(&plano)
        .map_err(duplicate_as(DUPLICATE_PLANO))?;

    Ok(Json(ApiResponse::success(plano)))
}

/// DELETE /superadmin/planos/{id} - Refused while a subscription uses it
pub async fn delete_plano(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete_plano(&id)? {
        return Err(ApiError::not_found("Plano não encontrado."));
    }

    Ok(StatusCode::NO_CONTENT)
}

// Backups

/// GET /superadmin/backups
pub async fn backups(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let files = list_backups(&state.backups_dir()).api_err("Falha ao listar os backups.")?;
    Ok(Json(ApiResponse::success(files)))
}

/// POST /superadmin/backup - Snapshot the database and download it
pub async fn backup(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let dir = state.backups_dir();
    let path = tokio::task::spawn_blocking(move || create_backup(store.as_ref(), &dir))
        .await
        .map_err(|_| ApiError::internal("Falha ao gerar o backup."))?
        .api_err("Falha ao gerar o backup.")?;

    let content = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::internal("Falha ao ler o backup."))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        content,
    ))
}

/// POST /superadmin/restore - multipart field `backup_file`
///
/// The restore runs in the background; the response only acknowledges the upload.
pub async fn restore(
    admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Falha ao ler o envio: {e}")))?
    {
        if field.name() != Some("backup_file") {
            continue;
        }

        let filename = secure_filename(field.file_name().unwrap_or_default());
        if filename.is_empty() {
            return Err(ApiError::bad_request("Nome de arquivo inválido."));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Falha ao ler o arquivo: {e}")))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("O arquivo de backup está vazio."));
        }

        let dir = state.backups_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|_| ApiError::internal("Falha ao salvar o arquivo."))?;
        let path = dir.join(format!("restore_{}_{filename}", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &data)
            .await
            .map_err(|_| ApiError::internal("Falha ao salvar o arquivo."))?;

        info!(usuario_id = %admin.usuario.id, path = %path.display(), "restore requested");
        drop(schedule_restore(state.store.clone(), path));

        return Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(MessageResponse::new(
                "Restauração iniciada. O banco de dados será restaurado em segundo plano.",
            ))),
        ));
    }

    Err(ApiError::bad_request("Nenhum arquivo enviado."))
}
