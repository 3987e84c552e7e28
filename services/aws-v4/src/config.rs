use crate::constants::*;
use gatesign_core::utils::{parse_bool_flag, Redact};
use gatesign_core::Context;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// Backend used by the credential cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackend {
    /// A single field of the shared key-value store configured on the context.
    SharedStore,
    /// A JSON file on the local file system.
    #[default]
    LocalFile,
}

/// Config for credential resolution and signing.
///
/// Every field follows the same rule: a value set on the struct wins, otherwise
/// [`Config::from_env`] fills it from the environment.
#[derive(Clone)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,

    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    pub region: Option<String>,
    /// `use_regional_sts_endpoint` will be enabled by:
    ///
    /// - this field if it's `true`
    /// - env value: [`AWS_STS_REGIONAL_ENDPOINTS`] set to `regional`
    pub use_regional_sts_endpoint: bool,
    /// `sts_endpoint` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`STS_ENDPOINT`]
    pub sts_endpoint: Option<String>,

    /// `role_arn` value will be load from:
    ///
    /// - this field if it's `is_some`.
    /// - env value: [`AWS_ROLE_ARN`]
    pub role_arn: Option<String>,
    /// `role_session_name` value will be load from:
    ///
    /// - this field if it's `is_some`.
    /// - env value: [`AWS_ROLE_SESSION_NAME`]
    /// - env value: [`HOSTNAME`]
    /// - default to `gatesign`.
    pub role_session_name: Option<String>,
    /// `web_identity_token_file` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_WEB_IDENTITY_TOKEN_FILE`]
    pub web_identity_token_file: Option<String>,

    /// `container_credentials_relative_uri` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_CONTAINER_CREDENTIALS_RELATIVE_URI`]
    pub container_credentials_relative_uri: Option<String>,
    /// `ec2_metadata_endpoint` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_EC2_METADATA_SERVICE_ENDPOINT`]
    /// - default to `http://169.254.169.254`
    pub ec2_metadata_endpoint: Option<String>,

    /// `cache_backend` will be set to [`CacheBackend::SharedStore`] by:
    ///
    /// - env value: [`CACHE_INSTANCE_CREDENTIALS_ENABLED`] set to a true-like value
    ///
    /// Otherwise the field is kept.
    pub cache_backend: CacheBackend,
    /// `credentials_temp_file` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_CREDENTIALS_TEMP_FILE`]
    pub credentials_temp_file: Option<String>,
    /// `tmp_dir` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`TMPDIR`]
    /// - default to `/tmp`
    pub tmp_dir: Option<String>,
    /// Cached credentials expiring within this window are fetched again.
    ///
    /// Default to 4.5 minutes. `None` reuses cached credentials regardless of
    /// their expiration.
    pub refresh_window: Option<Duration>,

    /// `debug` will be enabled by:
    ///
    /// - this field if it's `true`
    /// - env value: [`GATESIGN_DEBUG`] set to a true-like value
    ///
    /// When enabled, canonical requests and strings to sign are logged at debug level.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: None,
            use_regional_sts_endpoint: false,
            sts_endpoint: None,
            role_arn: None,
            role_session_name: None,
            web_identity_token_file: None,
            container_credentials_relative_uri: None,
            ec2_metadata_endpoint: None,
            cache_backend: CacheBackend::default(),
            credentials_temp_file: None,
            tmp_dir: None,
            refresh_window: Some(Duration::from_secs(270)),
            debug: false,
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("region", &self.region)
            .field("use_regional_sts_endpoint", &self.use_regional_sts_endpoint)
            .field("sts_endpoint", &self.sts_endpoint)
            .field("role_arn", &self.role_arn)
            .field("role_session_name", &self.role_session_name)
            .field("web_identity_token_file", &self.web_identity_token_file)
            .field(
                "container_credentials_relative_uri",
                &self.container_credentials_relative_uri,
            )
            .field("ec2_metadata_endpoint", &self.ec2_metadata_endpoint)
            .field("cache_backend", &self.cache_backend)
            .field("credentials_temp_file", &self.credentials_temp_file)
            .field("tmp_dir", &self.tmp_dir)
            .field("refresh_window", &self.refresh_window)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        let fill = |field: &mut Option<String>, key: &str| {
            if field.is_none() {
                *field = envs.get(key).filter(|v| !v.is_empty()).cloned();
            }
        };

        fill(&mut self.access_key_id, AWS_ACCESS_KEY_ID);
        fill(&mut self.secret_access_key, AWS_SECRET_ACCESS_KEY);
        fill(&mut self.region, AWS_REGION);
        fill(&mut self.sts_endpoint, STS_ENDPOINT);
        fill(&mut self.role_arn, AWS_ROLE_ARN);
        fill(&mut self.role_session_name, AWS_ROLE_SESSION_NAME);
        fill(&mut self.role_session_name, HOSTNAME);
        fill(&mut self.web_identity_token_file, AWS_WEB_IDENTITY_TOKEN_FILE);
        fill(
            &mut self.container_credentials_relative_uri,
            AWS_CONTAINER_CREDENTIALS_RELATIVE_URI,
        );
        fill(&mut self.ec2_metadata_endpoint, AWS_EC2_METADATA_SERVICE_ENDPOINT);
        fill(&mut self.credentials_temp_file, AWS_CREDENTIALS_TEMP_FILE);
        fill(&mut self.tmp_dir, TMPDIR);

        if let Some(v) = envs.get(AWS_STS_REGIONAL_ENDPOINTS) {
            self.use_regional_sts_endpoint |= v.eq_ignore_ascii_case("regional");
        }
        if envs
            .get(CACHE_INSTANCE_CREDENTIALS_ENABLED)
            .is_some_and(|v| parse_bool_flag(v))
        {
            self.cache_backend = CacheBackend::SharedStore;
        }
        if let Some(v) = envs.get(GATESIGN_DEBUG) {
            self.debug |= parse_bool_flag(v);
        }

        self
    }

    /// Both halves of the static credential are configured.
    ///
    /// Static credentials never expire and are never cached.
    pub fn has_static_credentials(&self) -> bool {
        matches!(
            (&self.access_key_id, &self.secret_access_key),
            (Some(ak), Some(sk)) if !ak.is_empty() && !sk.is_empty()
        )
    }

    /// Path of the local credential cache file.
    pub fn credentials_file_path(&self) -> String {
        if let Some(path) = &self.credentials_temp_file {
            return path.clone();
        }

        let dir = self.tmp_dir.as_deref().unwrap_or(DEFAULT_TMP_DIR);
        format!(
            "{}/{DEFAULT_CREDENTIALS_FILE_NAME}",
            dir.trim_end_matches('/')
        )
    }

    /// Session name sent with `AssumeRoleWithWebIdentity`.
    pub fn role_session_name(&self) -> &str {
        self.role_session_name
            .as_deref()
            .unwrap_or(DEFAULT_ROLE_SESSION_NAME)
    }
}
