use crate::constants::SHARED_STORE_SIGNING_KEY_PREFIX;
use crate::sign_request::{build_signing_key_hash, split_cached_values};
use crate::Credential;
use gatesign_core::hash::{hex_decode, hex_encode};
use gatesign_core::Context;
use log::{debug, warn};

/// Reuse derived signing keys across requests through the context's key-value store.
///
/// Entries are stored as `<eightDigitDate>:<hex signing key>` under
/// `signing_key_hash:<access_key_id>:<region>:<service>`. An entry from another
/// day or one that can't be parsed is a miss and gets replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningKeyCache;

impl SigningKeyCache {
    fn store_key(&self, access_key_id: &str, region: &str, service: &str) -> String {
        format!("{SHARED_STORE_SIGNING_KEY_PREFIX}:{access_key_id}:{region}:{service}")
    }

    /// Load the signing key of `eight_digit_date` if one is cached.
    pub fn load(
        &self,
        ctx: &Context,
        access_key_id: &str,
        eight_digit_date: &str,
        region: &str,
        service: &str,
    ) -> Option<Vec<u8>> {
        let key = self.store_key(access_key_id, region, service);
        let cached = ctx.store_get(&key)?;

        let Some((date, blob)) = split_cached_values(&cached) else {
            debug!("signing key entry {key} is malformed, ignoring");
            return None;
        };
        if date != eight_digit_date {
            debug!("signing key entry {key} is from {date}, ignoring");
            return None;
        }

        match hex_decode(blob) {
            Some(signing_key) if signing_key.len() == 32 => Some(signing_key),
            _ => {
                debug!("signing key entry {key} is not a valid key, ignoring");
                None
            }
        }
    }

    /// Store the signing key of `eight_digit_date`.
    ///
    /// Store failures only cost a later derivation, so they are logged and dropped.
    pub fn store(
        &self,
        ctx: &Context,
        access_key_id: &str,
        eight_digit_date: &str,
        region: &str,
        service: &str,
        signing_key: &[u8],
    ) {
        let key = self.store_key(access_key_id, region, service);
        let value = format!("{eight_digit_date}:{}", hex_encode(signing_key));

        if let Err(err) = ctx.store_set(&key, value) {
            warn!("failed to store signing key entry {key}: {err}");
        }
    }

    /// Load the signing key or derive and store a fresh one.
    pub fn get_or_derive(
        &self,
        ctx: &Context,
        cred: &Credential,
        eight_digit_date: &str,
        region: &str,
        service: &str,
    ) -> Vec<u8> {
        if let Some(signing_key) =
            self.load(ctx, &cred.access_key_id, eight_digit_date, region, service)
        {
            return signing_key;
        }

        let signing_key =
            build_signing_key_hash(&cred.secret_access_key, eight_digit_date, service, region);
        self.store(
            ctx,
            &cred.access_key_id,
            eight_digit_date,
            region,
            service,
            &signing_key,
        );
        signing_key
    }
}
