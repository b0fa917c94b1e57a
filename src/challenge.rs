use openssl::sha::sha256;
use thiserror::Error;

use crate::{
    base64::Base64,
    jwk::{Jwk, JwkError},
};

/// 定義與 key authorization 計算相關的錯誤類型。
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("JWK error: {0}")]
    Jwk(#[from] JwkError),
    #[error("Invalid token: {0:?}")]
    InvalidToken(String),
}

type Result<T> = std::result::Result<T, ChallengeError>;

/// 計算挑戰 token 的 key authorization：`token + "." + thumbprint(jwk)`。
///
/// thumbprint 為標準形式 JWK JSON（鍵排序、無空白）之 SHA-256 摘要的 base64url 編碼。
pub fn key_authorization(token: &str, jwk: &Jwk) -> Result<String> {
    Ok(KeyAuthorization::new(token, jwk)?.into_string())
}

/// 表示一個挑戰的 key authorization（RFC 8555 §8.1）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAuthorization {
    token: String,
    value: String,
}

impl KeyAuthorization {
    /// 根據伺服器發出的 token 與帳戶 JWK 計算 key authorization。
    ///
    /// # 返回值
    /// token 含有 base64url 字母表以外的字元時回傳 [`ChallengeError::InvalidToken`]。
    pub fn new(token: &str, jwk: &Jwk) -> Result<Self> {
        if token.is_empty()
            || !token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ChallengeError::InvalidToken(token.to_string()));
        }

        let thumbprint = jwk.thumbprint()?;
        Ok(Self {
            token: token.to_string(),
            value: format!("{}.{}", token, thumbprint),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// HTTP-01 挑戰檔案應放置的路徑，內容為 [`Self::as_str`]。
    pub fn http_path(&self) -> String {
        format!("/.well-known/acme-challenge/{}", self.token)
    }

    /// DNS-01 挑戰的 `_acme-challenge` TXT 記錄值：key authorization 的 SHA-256 摘要之 base64url 編碼。
    pub fn dns_txt_value(&self) -> String {
        Base64::new(sha256(self.value.as_bytes())).base64_url()
    }
}

impl std::fmt::Display for KeyAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}
