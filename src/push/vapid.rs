use base64::{URL_SAFE_NO_PAD, decode_config, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config::ConfigError;
use crate::types::push::VapidConfig;

pub const PRIVATE_KEY_VAR: &str = "VAPID_KEY_PRIVATE";
pub const PUBLIC_KEY_VAR: &str = "VAPID_KEY_PUBLIC";
pub const SUBJECT_VAR: &str = "VAPID_SUBJECT";

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

/// Builds the sender credentials from raw configuration values. Every value
/// is required and the public key must be the one derived from the private
/// key.
pub fn resolve_vapid_config(
    private_key: Option<&str>,
    public_key: Option<&str>,
    subject: Option<&str>,
) -> Result<VapidConfig, ConfigError> {
    let private_key = non_empty(private_key);
    let public_key = non_empty(public_key);
    let subject = non_empty(subject);

    let missing: Vec<&str> = [
        (PRIVATE_KEY_VAR, private_key.is_none()),
        (PUBLIC_KEY_VAR, public_key.is_none()),
        (SUBJECT_VAR, subject.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    match (private_key, public_key, subject) {
        (Some(private_key), Some(public_key), Some(subject)) => {
            let vapid = VapidConfig {
                private_key: private_key.to_string(),
                public_key: public_key.to_string(),
                subject: subject.to_string(),
            };
            validate_key_pair(&vapid)?;
            Ok(vapid)
        }
        _ => Err(ConfigError::Missing(missing.join(", "))),
    }
}

pub fn validate_key_pair(vapid: &VapidConfig) -> Result<(), ConfigError> {
    let derived =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&vapid.private_key, URL_SAFE_NO_PAD)
            .map_err(|err| ConfigError::InvalidPrivateKey(err.to_string()))?
            .get_public_key();
    let configured = decode_config(&vapid.public_key, URL_SAFE_NO_PAD)
        .map_err(|err| ConfigError::InvalidPublicKey(err.to_string()))?;

    if derived != configured {
        return Err(ConfigError::KeyMismatch);
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    let public_key = encode_config(public_key, URL_SAFE_NO_PAD);

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PRIVATE_KEY: &str = "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE";
    const PUBLIC_KEY: &str =
        "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U";

    #[test]
    fn generate_vapid_credentials_with_rng__should_return_expected_fixture() {
        // Given
        let seed = [7u8; 32];
        let mut rng = StdRng::from_seed(seed);

        // When
        let credentials =
            generate_vapid_credentials_with_rng(&mut rng).expect("credentials should generate");

        // Then
        assert_eq!(credentials.private_key, PRIVATE_KEY);
        assert_eq!(credentials.public_key, PUBLIC_KEY);
    }

    #[test]
    fn resolve_vapid_config__should_accept_matching_key_pair() {
        // When
        let vapid = resolve_vapid_config(
            Some(PRIVATE_KEY),
            Some(PUBLIC_KEY),
            Some(" mailto:test@test.com "),
        )
        .expect("resolve vapid config");

        // Then
        assert_eq!(vapid.private_key, PRIVATE_KEY);
        assert_eq!(vapid.public_key, PUBLIC_KEY);
        assert_eq!(vapid.subject, "mailto:test@test.com");
    }

    #[test]
    fn resolve_vapid_config__should_name_every_missing_value() {
        // When
        let err = resolve_vapid_config(Some(PRIVATE_KEY), None, Some("  "))
            .expect_err("config should be rejected");

        // Then
        match err {
            ConfigError::Missing(names) => {
                assert_eq!(names, "VAPID_KEY_PUBLIC, VAPID_SUBJECT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_vapid_config__should_reject_mismatched_keys() {
        // Given
        let mut rng = StdRng::from_seed([9u8; 32]);
        let other = generate_vapid_credentials_with_rng(&mut rng).expect("credentials");

        // When
        let err = resolve_vapid_config(
            Some(PRIVATE_KEY),
            Some(&other.public_key),
            Some("mailto:test@test.com"),
        )
        .expect_err("mismatch should be rejected");

        // Then
        assert!(matches!(err, ConfigError::KeyMismatch));
    }

    #[test]
    fn resolve_vapid_config__should_reject_garbage_private_key() {
        let err = resolve_vapid_config(
            Some("not-a-key"),
            Some(PUBLIC_KEY),
            Some("mailto:test@test.com"),
        )
        .expect_err("garbage key should be rejected");

        assert!(matches!(err, ConfigError::InvalidPrivateKey(_)));
    }
}
