//! Refresh-cookie policy. The raw refresh token travels only here: an
//! http-only cookie scoped to the refresh endpoint, never in a response body
//! the page can read back.

pub const REFRESH_COOKIE: &str = "refresh_token";
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth/refresh";

#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Adds `Secure` and switches SameSite to `None` (cross-site frontends).
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieConfig {
    pub fn set(&self, raw_token: &str) -> String {
        format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly{}",
            REFRESH_COOKIE,
            raw_token,
            REFRESH_COOKIE_PATH,
            self.max_age_secs,
            self.same_site_attrs(),
        )
    }

    pub fn clear(&self) -> String {
        format!(
            "{}=; Path={}; Max-Age=0; HttpOnly{}",
            REFRESH_COOKIE,
            REFRESH_COOKIE_PATH,
            self.same_site_attrs(),
        )
    }

    fn same_site_attrs(&self) -> &'static str {
        if self.secure {
            "; SameSite=None; Secure"
        } else {
            "; SameSite=Lax"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_is_scoped_and_http_only() {
        let cfg = CookieConfig {
            secure: false,
            max_age_secs: 2_592_000,
        };
        let header = cfg.set("raw-token");
        assert!(header.starts_with("refresh_token=raw-token"));
        assert!(header.contains("Path=/api/v1/auth/refresh"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn secure_config_uses_samesite_none() {
        let cfg = CookieConfig {
            secure: true,
            max_age_secs: 60,
        };
        assert!(cfg.set("t").contains("SameSite=None; Secure"));
        assert!(cfg.clear().contains("Max-Age=0"));
    }
}
