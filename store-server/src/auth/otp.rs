//! 一次性验证码 (OTP)
//!
//! 登录二步验证：密码校验通过后签发 6 位数字验证码，邮件送达，
//! 5 分钟内有效，验证成功即作废（单次使用）。
//!
//! 存储为进程内 DashMap，键为邮箱。过期条目在下次签发时惰性清理。

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

use crate::utils::AppError;

/// 验证码有效期 (分钟)
pub const OTP_TTL_MINUTES: i64 = 5;

/// OTP 错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("No one-time passcode pending for this email")]
    NoPending,

    #[error("Invalid one-time passcode")]
    Mismatch,

    #[error("One-time passcode has expired")]
    Expired,

    #[error("Failed to generate one-time passcode")]
    GenerationFailed,
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::NoPending => AppError::Validation(err.to_string()),
            OtpError::Mismatch => AppError::Invalid(err.to_string()),
            OtpError::Expired => AppError::Invalid(err.to_string()),
            OtpError::GenerationFailed => AppError::Internal(err.to_string()),
        }
    }
}

/// 待验证的验证码记录
#[derive(Debug, Clone)]
struct OtpRecord {
    code: String,
    expires_at: DateTime<Utc>,
}

/// OTP 存储
///
/// 每个邮箱同时只保留一条记录，重复签发覆盖旧码。
#[derive(Debug)]
pub struct OtpStore {
    codes: DashMap<String, OtpRecord>,
    rng: SystemRandom,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpStore {
    pub fn new() -> Self {
        Self {
            codes: DashMap::new(),
            rng: SystemRandom::new(),
        }
    }

    /// 签发验证码并登记待验证状态
    ///
    /// 返回明文验证码，调用方负责送达（邮件）。
    pub fn issue(&self, email: &str) -> Result<String, OtpError> {
        self.sweep_expired();

        let code = self.generate_code()?;
        self.codes.insert(
            email.to_string(),
            OtpRecord {
                code: code.clone(),
                expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
            },
        );
        Ok(code)
    }

    /// 校验验证码
    ///
    /// 成功即移除记录（单次使用）；码不匹配时记录保留，允许在有效期内重试。
    pub fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        let (key, record) = self.codes.remove(email).ok_or(OtpError::NoPending)?;

        if Utc::now() >= record.expires_at {
            return Err(OtpError::Expired);
        }

        if record.code != code {
            // 放回记录，允许重试
            self.codes.insert(key, record);
            return Err(OtpError::Mismatch);
        }

        Ok(())
    }

    /// 清理已过期的记录
    fn sweep_expired(&self) {
        let now = Utc::now();
        self.codes.retain(|_, record| record.expires_at > now);
    }

    fn generate_code(&self) -> Result<String, OtpError> {
        let mut bytes = [0u8; 4];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| OtpError::GenerationFailed)?;
        let value = u32::from_le_bytes(bytes) % 1_000_000;
        Ok(format!("{:06}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_is_six_digits() {
        let store = OtpStore::new();
        let code = store.issue("ana@example.com").unwrap();

        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn verify_succeeds_once_then_no_pending() {
        let store = OtpStore::new();
        let code = store.issue("ana@example.com").unwrap();

        assert_eq!(store.verify("ana@example.com", &code), Ok(()));
        assert_eq!(
            store.verify("ana@example.com", &code),
            Err(OtpError::NoPending)
        );
    }

    #[test]
    fn wrong_code_keeps_record_for_retry() {
        let store = OtpStore::new();
        let code = store.issue("ana@example.com").unwrap();

        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert_eq!(
            store.verify("ana@example.com", wrong),
            Err(OtpError::Mismatch)
        );
        // 正确码仍然可用
        assert_eq!(store.verify("ana@example.com", &code), Ok(()));
    }

    #[test]
    fn verify_without_issue_reports_no_pending() {
        let store = OtpStore::new();
        assert_eq!(
            store.verify("ghost@example.com", "123456"),
            Err(OtpError::NoPending)
        );
    }

    #[test]
    fn expired_code_is_rejected() {
        let store = OtpStore::new();
        store.codes.insert(
            "ana@example.com".to_string(),
            OtpRecord {
                code: "123456".to_string(),
                expires_at: Utc::now() - Duration::seconds(1),
            },
        );

        assert_eq!(
            store.verify("ana@example.com", "123456"),
            Err(OtpError::Expired)
        );
    }

    #[test]
    fn code_one_second_before_expiry_still_works() {
        let store = OtpStore::new();
        store.codes.insert(
            "ana@example.com".to_string(),
            OtpRecord {
                code: "123456".to_string(),
                expires_at: Utc::now() + Duration::seconds(1),
            },
        );

        assert_eq!(store.verify("ana@example.com", "123456"), Ok(()));
    }

    #[test]
    fn reissue_overwrites_previous_code() {
        let store = OtpStore::new();
        let first = store.issue("ana@example.com").unwrap();
        let second = store.issue("ana@example.com").unwrap();

        if first != second {
            assert_eq!(
                store.verify("ana@example.com", &first),
                Err(OtpError::Mismatch)
            );
        }
        assert_eq!(store.verify("ana@example.com", &second), Ok(()));
    }

    #[test]
    fn sweep_drops_expired_entries() {
        let store = OtpStore::new();
        store.codes.insert(
            "old@example.com".to_string(),
            OtpRecord {
                code: "111111".to_string(),
                expires_at: Utc::now() - Duration::minutes(10),
            },
        );

        store.issue("new@example.com").unwrap();
        assert!(!store.codes.contains_key("old@example.com"));
    }
}
