//! Optional login through the mobile login form.
//!
//! Logging in is best effort. The scraper works without it, so a failed
//! login is reported as a warning and `Ok(false)`, not as an error. Success
//! is judged by the presence of the `c_user` session cookie afterwards.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

use crate::error::ScrapeError;
use crate::facebook::FacebookScraper;
use crate::http::HttpClient;

const SESSION_COOKIE: &str = "c_user";

static LOGIN_FORM: Lazy<Selector> = Lazy::new(|| Selector::parse("#login_form").unwrap());
static HIDDEN_INPUTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[type="hidden"]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: String,
    /// Hidden inputs (CSRF tokens and the like) to send back unchanged.
    pub hidden_fields: Vec<(String, String)>,
}

/// Locate the login form and its hidden inputs.
pub fn parse_login_form(html: &str) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form = document.select(&LOGIN_FORM).next()?;
    let action = form.value().attr("action")?.to_string();

    let hidden_fields = form
        .select(&HIDDEN_INPUTS)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(LoginForm {
        action,
        hidden_fields,
    })
}

impl<C: HttpClient> FacebookScraper<C> {
    /// Log the session in. Returns whether a session cookie was obtained.
    ///
    /// An unreachable login page or a failed form post is a warning and
    /// `Ok(false)`. Only an unusable form action is an error.
    #[instrument(level = "info", skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, ScrapeError> {
        let base = &self.config().base_url;
        let page = match self.client().get(base).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                warn!(status = page.status, "Login page unavailable; continuing without login");
                return Ok(false);
            }
            Err(e) => {
                warn!(error = %e, "Login page unavailable; continuing without login");
                return Ok(false);
            }
        };

        let Some(form) = parse_login_form(&page.text) else {
            warn!("Login form not found; continuing without login");
            return Ok(false);
        };

        let action = base.join(&form.action)?;
        let mut fields = form.hidden_fields;
        fields.push(("email".to_string(), email.to_string()));
        fields.push(("pass".to_string(), password.to_string()));
        if let Err(e) = self.client().post_form(&action, &fields).await {
            warn!(error = %e, "Login form post failed; continuing without login");
            return Ok(false);
        }

        if self.client().has_cookie(base, SESSION_COOKIE) {
            info!("Logged in");
            Ok(true)
        } else {
            warn!("Login unsuccessful; continuing without session cookie");
            Ok(false)
        }
    }
}
