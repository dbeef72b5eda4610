//! Send emails to user for important updates.
//!
//! Delivery is simulated: messages are printed to stdout. The verification
//! template is localized per user language; deactivation and deletion
//! notices are Spanish-only, matching the behavior of the service this
//! replaces.

use crate::config::Mail;

/// Email templates list.
#[derive(Debug)]
pub enum Template<'a> {
    /// Verification link sent right after registration.
    Verification { token: &'a str, language: &'a str },
    /// Account deactivation confirmation link.
    Deactivation { token: &'a str },
    /// 6-digit account deletion code.
    DeletionCode { code: &'a str },
}

struct VerificationStrings {
    subject: &'static str,
    greeting: &'static str,
    thanks: &'static str,
    click_link: &'static str,
    link_expires: &'static str,
    ignore_if_wrong: &'static str,
}

/// Pick verification strings for a language code. Unknown codes fall back
/// to Spanish, the instance default.
fn verification_strings(language: &str) -> VerificationStrings {
    match language {
        "en" => VerificationStrings {
            subject: "Verify your EuskalIA account",
            greeting: "Hello {username},",
            thanks: "Thank you for signing up to EuskalIA.",
            click_link: "Please click the following link to verify your account:",
            link_expires: "This link will expire in 24 hours.",
            ignore_if_wrong: "If you did not create this account, you can ignore this message.",
        },
        "eu" => VerificationStrings {
            subject: "Egiaztatu zure EuskalIA kontua",
            greeting: "Kaixo {username},",
            thanks: "Eskerrik asko EuskalIA-n izena emateagatik.",
            click_link: "Mesedez, egin klik esteka honetan zure kontua egiaztatzeko:",
            link_expires: "Esteka honek 24 ordu barru iraungiko du.",
            ignore_if_wrong: "Ez baduzu kontu hau sortu, mezu hau alde batera utz dezakezu.",
        },
        "pl" => VerificationStrings {
            subject: "Zweryfikuj swoje konto EuskalIA",
            greeting: "Cześć {username},",
            thanks: "Dziękujemy za rejestrację w EuskalIA.",
            click_link: "Kliknij poniższy link, aby zweryfikować swoje konto:",
            link_expires: "Ten link wygaśnie za 24 godziny.",
            ignore_if_wrong: "Jeśli to nie Ty, zignoruj tę wiadomość.",
        },
        "fr" => VerificationStrings {
            subject: "Vérifiez votre compte EuskalIA",
            greeting: "Bonjour {username},",
            thanks: "Merci de vous être inscrit sur EuskalIA.",
            click_link: "Veuillez cliquer sur le lien suivant pour vérifier votre compte :",
            link_expires: "Ce lien expirera dans 24 heures.",
            ignore_if_wrong: "Si vous n'avez pas créé ce compte, ignorez ce message.",
        },
        _ => VerificationStrings {
            subject: "Verifica tu cuenta de EuskalIA",
            greeting: "Hola {username},",
            thanks: "Gracias por registrarte en EuskalIA.",
            click_link: "Por favor, haz clic en el siguiente enlace para verificar tu cuenta:",
            link_expires: "Este enlace expirará en 24 horas.",
            ignore_if_wrong: "Si no has creado esta cuenta, puedes ignorar este mensaje.",
        },
    }
}

/// Console mail dispatcher.
#[derive(Debug, Clone)]
pub struct Mailer {
    mock: bool,
    base_url: String,
}

impl Default for Mailer {
    fn default() -> Self {
        Self {
            mock: true,
            base_url: String::default(),
        }
    }
}

impl Mailer {
    /// Create a new [`Mailer`].
    pub fn new(config: &Mail, base_url: &str) -> Self {
        if !config.mock {
            // SMTP delivery is not wired up; everything goes to stdout.
            tracing::warn!("real mail delivery unavailable, using mock");
        }

        Self {
            mock: true,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Render and "send" an email for a specific user.
    pub fn send(&self, to: &str, username: &str, template: Template) {
        let (subject, body) = match template {
            Template::Verification { token, language } => {
                let strings = verification_strings(language);
                let link = format!(
                    "{}/api/users/verify-email?token={token}",
                    self.base_url
                );
                (
                    strings.subject.to_owned(),
                    vec![
                        strings.greeting.replace("{username}", username),
                        String::default(),
                        strings.thanks.to_owned(),
                        strings.click_link.to_owned(),
                        String::default(),
                        link,
                        String::default(),
                        strings.link_expires.to_owned(),
                        String::default(),
                        strings.ignore_if_wrong.to_owned(),
                    ],
                )
            },
            Template::Deactivation { token } => {
                let link = format!(
                    "{}/api/users/confirm-deactivation?token={token}",
                    self.base_url
                );
                (
                    "Confirma la desactivación de tu cuenta".to_owned(),
                    vec![
                        format!("Hola {username},"),
                        String::default(),
                        "Haz clic en el siguiente enlace para desactivar tu cuenta:".to_owned(),
                        link,
                        String::default(),
                        "Este enlace expirará en 24 horas.".to_owned(),
                    ],
                )
            },
            Template::DeletionCode { code } => (
                "Confirm Account Deletion".to_owned(),
                vec![format!("Your verification code is: {code}")],
            ),
        };

        tracing::debug!(%to, %subject, "dispatching email");

        if self.mock {
            println!("**************************************************");
            println!("[EMAIL SIMULATION] To: {to}");
            println!("[EMAIL SIMULATION] Subject: {subject}");
            for line in body {
                println!("[EMAIL SIMULATION] {line}");
            }
            println!("**************************************************");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_strings_per_language() {
        assert_eq!(
            verification_strings("eu").subject,
            "Egiaztatu zure EuskalIA kontua"
        );
        assert_eq!(
            verification_strings("en").subject,
            "Verify your EuskalIA account"
        );
        // Unknown languages fall back to Spanish.
        assert_eq!(
            verification_strings("de").subject,
            "Verifica tu cuenta de EuskalIA"
        );
    }

    #[test]
    fn test_send_does_not_panic() {
        let mailer = Mailer {
            mock: true,
            base_url: "http://localhost:5235".to_owned(),
        };
        mailer.send(
            "test@euskalia.eus",
            "testuser",
            Template::Verification {
                token: "token123",
                language: "eu",
            },
        );
        mailer.send(
            "test@euskalia.eus",
            "testuser",
            Template::DeletionCode { code: "123456" },
        );
    }
}
