use super::EmailMessage;
use crate::types::Usuario;

pub const CONFIRM_PATH: &str = "confirmar-email";
pub const INVITE_PATH: &str = "aceitar-convite";
pub const RESET_PATH: &str = "redefinir-senha";

#[must_use]
pub fn link(base_url: &str, path: &str, token: &str) -> String {
    format!(
        "{}/{}?token={}",
        base_url.trim_end_matches('/'),
        path,
        urlencoding::encode(token)
    )
}

#[must_use]
pub fn confirmation_email(base_url: &str, usuario: &Usuario, token: &str) -> EmailMessage {
    EmailMessage {
        to: usuario.email.clone(),
        subject: "Confirme seu e-mail - Agenda Escolar".to_string(),
        body: format!(
            "Olá, {}!\n\n\
             Obrigado por se cadastrar na Agenda Escolar.\n\
             Para ativar sua conta, confirme seu e-mail acessando o link abaixo:\n\n\
             {}\n\n\
             O link expira em 48 horas.",
            usuario.display_name(),
            link(base_url, CONFIRM_PATH, token)
        ),
    }
}

#[must_use]
pub fn invitation_email(
    base_url: &str,
    usuario: &Usuario,
    escola_nome: &str,
    token: &str,
) -> EmailMessage {
    EmailMessage {
        to: usuario.email.clone(),
        subject: format!("Convite para {escola_nome} - Agenda Escolar"),
        body: format!(
            "Olá, {}!\n\n\
             Você foi convidado(a) para participar da escola {} na Agenda Escolar.\n\
             Defina sua senha e ative sua conta pelo link abaixo:\n\n\
             {}\n\n\
             O convite expira em 7 dias.",
            usuario.display_name(),
            escola_nome,
            link(base_url, INVITE_PATH, token)
        ),
    }
}

#[must_use]
pub fn password_reset_email(base_url: &str, usuario: &Usuario, token: &str) -> EmailMessage {
    EmailMessage {
        to: usuario.email.clone(),
        subject: "Redefinição de Senha - Agenda Escolar".to_string(),
        body: format!(
            "Olá, {}!\n\n\
             Recebemos um pedido para redefinir a sua senha.\n\
             Para criar uma nova senha, acesse o link abaixo:\n\n\
             {}\n\n\
             O link expira em 1 hora. Se você não fez este pedido, ignore este e-mail.",
            usuario.display_name(),
            link(base_url, RESET_PATH, token)
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::mail::extract_token;
    use crate::types::AccountState;

    fn usuario() -> Usuario {
        Usuario {
            id: "u1".to_string(),
            nome: "Maria da Silva".to_string(),
            nome_curto: Some("Maria".to_string()),
            email: "maria@example.com".to_string(),
            account_state: AccountState::Invited,
            is_superadmin: false,
            email_confirmado: false,
            foto_perfil: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_link_trims_base_and_encodes() {
        assert_eq!(
            link("http://localhost:8080/", RESET_PATH, "a b"),
            "http://localhost:8080/redefinir-senha?token=a%20b"
        );
    }

    #[test]
    fn test_messages_carry_token_links() {
        let u = usuario();
        let confirm = confirmation_email("http://x", &u, "agl_aaaa_bbbb");
        assert_eq!(confirm.to, "maria@example.com");
        assert!(confirm.body.contains("http://x/confirmar-email?token=agl_aaaa_bbbb"));
        assert!(confirm.body.starts_with("Olá, Maria!"));

        let invite = invitation_email("http://x", &u, "Escola Modelo", "agl_cccc_dddd");
        assert!(invite.subject.contains("Escola Modelo"));
        assert_eq!(extract_token(&invite.body).as_deref(), Some("agl_cccc_dddd"));

        let reset = password_reset_email("http://x", &u, "agl_eeee_ffff");
        assert!(reset.body.contains("/redefinir-senha?token="));
    }
}
