use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::RtcError;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "006";
const TOKEN_TTL_SECONDS: u32 = 24 * 3600;
const PRIVILEGE_JOIN_CHANNEL: u16 = 1;

/// Issues call-join tokens in the Agora AccessToken "006" layout. The
/// signature is HMAC-SHA256 keyed by the app certificate over
/// appId+channel+uid+message; the packed message carries a salt, an
/// expiry instant and the join-channel privilege.
pub struct RtcTokenService {
    app_id: String,
    app_certificate: String,
}

impl RtcTokenService {
    pub fn new(config: &AppConfig) -> Result<Self, RtcError> {
        if !config.is_rtc_configured() {
            return Err(RtcError::NotConfigured);
        }

        Ok(Self {
            app_id: config.agora_app_id.clone(),
            app_certificate: config.agora_app_certificate.clone(),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Sign a join token for `channel`. A missing uid gets a random one
    /// below 1,000,000, matching what the browser SDK expects.
    pub fn issue(&self, channel: &str, uid: Option<u32>) -> Result<(String, u32), RtcError> {
        let mut rng = rand::thread_rng();
        let uid = uid.unwrap_or_else(|| rng.gen_range(0..1_000_000));
        let salt: u32 = rng.gen();
        let expire_ts = Utc::now().timestamp() as u32 + TOKEN_TTL_SECONDS;

        let token = self.build_token(channel, uid, salt, expire_ts)?;
        debug!("Issued call token for channel {} (uid {})", channel, uid);
        Ok((token, uid))
    }

    fn build_token(
        &self,
        channel: &str,
        uid: u32,
        salt: u32,
        expire_ts: u32,
    ) -> Result<String, RtcError> {
        // The legacy builders treat uid 0 as the wildcard empty account.
        let uid_str = if uid == 0 {
            String::new()
        } else {
            uid.to_string()
        };

        let mut message = Vec::new();
        put_u32(&mut message, salt);
        put_u32(&mut message, expire_ts);
        put_privileges(&mut message, &[(PRIVILEGE_JOIN_CHANNEL, expire_ts)]);

        let mut to_sign = Vec::new();
        to_sign.extend_from_slice(self.app_id.as_bytes());
        to_sign.extend_from_slice(channel.as_bytes());
        to_sign.extend_from_slice(uid_str.as_bytes());
        to_sign.extend_from_slice(&message);

        let mut mac = HmacSha256::new_from_slice(self.app_certificate.as_bytes())
            .map_err(|_| RtcError::Signing("Failed to create HMAC".to_string()))?;
        mac.update(&to_sign);
        let signature = mac.finalize().into_bytes();

        let mut content = Vec::new();
        put_bytes(&mut content, &signature);
        put_u32(&mut content, crc32(channel.as_bytes()));
        put_u32(&mut content, crc32(uid_str.as_bytes()));
        put_bytes(&mut content, &message);

        Ok(format!(
            "{}{}{}",
            TOKEN_VERSION,
            self.app_id,
            STANDARD.encode(content)
        ))
    }
}

// Wire packing is little-endian throughout, byte slices length-prefixed
// with a u16.

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_u16(buf, bytes.len() as u16);
    buf.extend_from_slice(bytes);
}

fn put_privileges(buf: &mut Vec<u8>, privileges: &[(u16, u32)]) {
    put_u16(buf, privileges.len() as u16);
    for (key, value) in privileges {
        put_u16(buf, *key);
        put_u32(buf, *value);
    }
}

/// CRC-32 (IEEE, reflected) over `data`.
fn crc32(data: &[u8]) -> u32 {
    let mut crc = u32::MAX;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::TestConfig;

    fn service() -> RtcTokenService {
        RtcTokenService::new(&TestConfig::default().to_app_config()).unwrap()
    }

    #[test]
    fn unconfigured_credentials_are_rejected() {
        let mut config = TestConfig::default().to_app_config();
        config.agora_app_certificate = String::new();

        let result = RtcTokenService::new(&config);
        assert_matches!(result.err(), Some(RtcError::NotConfigured));
    }

    #[test]
    fn crc32_matches_known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn token_carries_version_and_app_id() {
        let service = service();
        let token = service.build_token("consult-room", 42, 1, 2_000_000_000).unwrap();

        let prefix = format!("006{}", service.app_id());
        assert!(token.starts_with(&prefix));
        assert!(STANDARD.decode(&token[prefix.len()..]).is_ok());
    }

    #[test]
    fn content_layout_round_trips() {
        let service = service();
        let salt = 0xDEAD_BEEF;
        let expire = 1_900_000_000;
        let token = service.build_token("consult-room", 42, salt, expire).unwrap();

        let prefix_len = 3 + service.app_id().len();
        let content = STANDARD.decode(&token[prefix_len..]).unwrap();

        // signature: u16 length then 32 HMAC-SHA256 bytes
        let sig_len = u16::from_le_bytes([content[0], content[1]]) as usize;
        assert_eq!(sig_len, 32);

        let mut offset = 2 + sig_len;
        let crc_channel = u32::from_le_bytes(content[offset..offset + 4].try_into().unwrap());
        assert_eq!(crc_channel, crc32(b"consult-room"));
        offset += 4;
        let crc_uid = u32::from_le_bytes(content[offset..offset + 4].try_into().unwrap());
        assert_eq!(crc_uid, crc32(b"42"));
        offset += 4;

        let msg_len = u16::from_le_bytes([content[offset], content[offset + 1]]) as usize;
        offset += 2;
        let message = &content[offset..offset + msg_len];
        assert_eq!(offset + msg_len, content.len());

        assert_eq!(u32::from_le_bytes(message[0..4].try_into().unwrap()), salt);
        assert_eq!(u32::from_le_bytes(message[4..8].try_into().unwrap()), expire);
        // one privilege entry: join-channel expiring with the token
        assert_eq!(u16::from_le_bytes([message[8], message[9]]), 1);
        assert_eq!(u16::from_le_bytes([message[10], message[11]]), PRIVILEGE_JOIN_CHANNEL);
        assert_eq!(u32::from_le_bytes(message[12..16].try_into().unwrap()), expire);
    }

    #[test]
    fn same_inputs_same_token() {
        let service = service();
        let first = service.build_token("room", 7, 99, 1_900_000_000).unwrap();
        let second = service.build_token("room", 7, 99, 1_900_000_000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn issue_defaults_uid_below_one_million() {
        let service = service();
        let (token, uid) = service.issue("room", None).unwrap();
        assert!(uid < 1_000_000);
        assert!(token.starts_with("006"));

        let (_, explicit) = service.issue("room", Some(31337)).unwrap();
        assert_eq!(explicit, 31337);
    }
}
