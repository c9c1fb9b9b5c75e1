pub mod domain;
pub mod report;
pub mod storage;

pub mod config {
    use crate::report::Pricing;
    use subtle::ConstantTimeEq;

    // Demo fallback credentials, kept for parity with the original dashboard.
    const DEFAULT_ADMIN_USERNAME: &str = "admin";
    const DEFAULT_ADMIN_PASSWORD: &str = "password123";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub admin_username: String,
        pub admin_password: String,
        pub sentry_dsn: Option<String>,
        pub seed_demo_data: bool,
        pub pricing: Pricing,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Pricing::default();
            Ok(Self {
                admin_username: std::env::var("ADMIN_USERNAME")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.to_string()),
                admin_password: std::env::var("ADMIN_PASSWORD")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                seed_demo_data: env_flag("SEED_DEMO_DATA", true),
                pricing: Pricing {
                    egg_unit_price: env_f64("EGG_UNIT_PRICE", defaults.egg_unit_price),
                    feed_cost_per_kg: env_f64("FEED_COST_PER_KG", defaults.feed_cost_per_kg),
                },
            })
        }

        /// Constant-time credential check. Both comparisons always run so timing
        /// does not reveal which field mismatched.
        pub fn verify_login(&self, username: &str, password: &str) -> bool {
            let user_ok = username.as_bytes().ct_eq(self.admin_username.as_bytes());
            let pass_ok = password.as_bytes().ct_eq(self.admin_password.as_bytes());
            bool::from(user_ok & pass_ok)
        }
    }

    fn env_f64(key: &str, default: f64) -> f64 {
        std::env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn env_flag(key: &str, default: bool) -> bool {
        match std::env::var(key) {
            Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"),
            Err(_) => default,
        }
    }

}
