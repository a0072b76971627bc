pub const SCHEMA: &str = r#"
-- Schools are the tenants
CREATE TABLE IF NOT EXISTS escolas (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'ativo' CHECK (status IN ('ativo', 'inativo')),
    cep TEXT,
    logradouro TEXT,
    numero TEXT,
    complemento TEXT,
    bairro TEXT,
    cidade TEXT,
    uf TEXT,
    logo_url TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- People; credentials depend on account_state
CREATE TABLE IF NOT EXISTS usuarios (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL,
    nome_curto TEXT,
    email TEXT NOT NULL UNIQUE,
    account_state TEXT NOT NULL DEFAULT 'invited'
        CHECK (account_state IN ('invited', 'active', 'social_only')),
    password_hash TEXT,         -- set only when account_state = 'active'
    social_provider TEXT,       -- set only when account_state = 'social_only'
    is_superadmin INTEGER NOT NULL DEFAULT 0,
    email_confirmado INTEGER NOT NULL DEFAULT 0,
    foto_perfil TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Membership of a user in a school, carrying the per-school role
CREATE TABLE IF NOT EXISTS usuario_escola (
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    escola_id TEXT NOT NULL REFERENCES escolas(id) ON DELETE CASCADE,
    papel TEXT NOT NULL CHECK (papel IN ('admin', 'professor')),
    matricula TEXT,
    PRIMARY KEY (usuario_id, escola_id)
);

-- Bookable rooms and equipment
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL REFERENCES escolas(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    icon TEXT NOT NULL DEFAULT 'bi-box',
    sort_order INTEGER NOT NULL DEFAULT 0,
    min_agendamento_dias INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),

    -- Target of the composite keys below
    UNIQUE (id, escola_id)
);

-- One slot list per resource and shift
CREATE TABLE IF NOT EXISTS schedule_templates (
    id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    shift TEXT NOT NULL CHECK (shift IN ('matutino', 'vespertino')),
    slots TEXT NOT NULL DEFAULT '[]',   -- JSON array of {name, type}

    UNIQUE (resource_id, shift),
    FOREIGN KEY (resource_id, escola_id) REFERENCES resources(id, escola_id) ON DELETE CASCADE
);

-- Reservations and closures
CREATE TABLE IF NOT EXISTS bookings (
    id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    teacher_name TEXT NOT NULL,
    date TEXT NOT NULL,                 -- YYYY-MM-DD
    shift TEXT NOT NULL CHECK (shift IN ('matutino', 'vespertino')),
    slot_name TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('booked', 'closed')),
    created_at TEXT DEFAULT (datetime('now')),

    FOREIGN KEY (resource_id, escola_id) REFERENCES resources(id, escola_id) ON DELETE CASCADE
);

-- Subjects taught in a school
CREATE TABLE IF NOT EXISTS disciplinas (
    id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL REFERENCES escolas(id) ON DELETE CASCADE,
    nome TEXT NOT NULL,

    UNIQUE (escola_id, nome)
);

CREATE TABLE IF NOT EXISTS usuario_disciplinas (
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    disciplina_id TEXT NOT NULL REFERENCES disciplinas(id) ON DELETE CASCADE,
    PRIMARY KEY (usuario_id, disciplina_id)
);

-- Global plan catalog
CREATE TABLE IF NOT EXISTS planos (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL UNIQUE,
    preco INTEGER NOT NULL DEFAULT 0,   -- cents
    duracao_meses INTEGER NOT NULL,
    stripe_price_id TEXT
);

CREATE TABLE IF NOT EXISTS assinaturas (
    id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL REFERENCES escolas(id) ON DELETE CASCADE,
    plano_id TEXT NOT NULL REFERENCES planos(id),
    data_inicio TEXT NOT NULL,
    data_fim TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ativa' CHECK (status IN ('ativa', 'vencida', 'cancelada'))
);

-- Login sessions; the selected school travels with the session
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,           -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,         -- lookup segment of the token
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    escola_id TEXT REFERENCES escolas(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL,
    last_used_at TEXT
);

-- Single-use links sent by mail
CREATE TABLE IF NOT EXISTS email_tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL,
    usuario_id TEXT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE,
    purpose TEXT NOT NULL CHECK (purpose IN ('confirm_email', 'reset_password', 'invite')),
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL,
    used_at TEXT
);

CREATE TABLE IF NOT EXISTS oauth_states (
    state TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT NOT NULL
);

-- Stripe checkout sessions already credited, so retried webhooks renew once
CREATE TABLE IF NOT EXISTS checkout_sessions (
    session_id TEXT PRIMARY KEY,
    escola_id TEXT NOT NULL REFERENCES escolas(id) ON DELETE CASCADE,
    processed_at TEXT NOT NULL
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_slot
    ON bookings(escola_id, resource_id, date, shift, slot_name);
CREATE INDEX IF NOT EXISTS idx_bookings_usuario ON bookings(escola_id, usuario_id, date);
CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(escola_id, date);
CREATE INDEX IF NOT EXISTS idx_resources_escola ON resources(escola_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_usuario_escola_escola ON usuario_escola(escola_id);
CREATE INDEX IF NOT EXISTS idx_assinaturas_escola ON assinaturas(escola_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_usuario ON sessions(usuario_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_email_tokens_lookup ON email_tokens(token_lookup);
"#;
