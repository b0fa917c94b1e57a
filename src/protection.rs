use serde::Serialize;
use thiserror::Error;

use crate::{
    base64::Base64,
    config::SignatureAlgorithm,
    jwk::{Jwk, JwkError},
    key_pair::KeyPair,
};

/// 定義保護頭建立過程中可能產生的錯誤類型。
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// JSON 序列化錯誤
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("JWK error: {0}")]
    Jwk(#[from] JwkError),
}

type Result<T> = std::result::Result<T, ProtectionError>;

/// 用於識別簽章金鑰的方式：新帳戶請求嵌入 JWK，其餘請求使用帳戶 URL。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyId {
    Jwk(Jwk),
    Kid(String),
}

/// ACME 請求的 JWS 保護頭（RFC 8555 §6.2）。
///
/// `jwk` 與 `kid` 恰有一個存在。序列化時欄位順序固定，因此相同輸入總是產生相同的位元組。
#[derive(Debug, Clone, Serialize)]
pub struct ProtectedHeader {
    /// 簽章演算法
    alg: SignatureAlgorithm,
    /// 嵌入的 JSON Web Key
    #[serde(skip_serializing_if = "Option::is_none")]
    jwk: Option<Jwk>,
    /// 帳戶 URL
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
    /// 用於防止重放攻擊的隨機數
    nonce: String,
    /// 請求目標 URL
    url: String,
}

impl ProtectedHeader {
    /// 建立一個新的保護頭。
    pub fn new(
        alg: SignatureAlgorithm,
        key_id: KeyId,
        nonce: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let (jwk, kid) = match key_id {
            KeyId::Jwk(jwk) => (Some(jwk), None),
            KeyId::Kid(kid) => (None, Some(kid)),
        };

        Self {
            alg,
            jwk,
            kid,
            nonce: nonce.into(),
            url: url.into(),
        }
    }

    /// 以金鑰對的 JWK 建立保護頭，供 newAccount 等尚無帳戶 URL 的請求使用。
    pub fn with_jwk(
        key_pair: &KeyPair,
        nonce: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self> {
        let jwk = Jwk::new(key_pair)?;
        Ok(Self::new(
            SignatureAlgorithm::default(),
            KeyId::Jwk(jwk),
            nonce,
            url,
        ))
    }

    /// 以帳戶 URL 建立保護頭。
    pub fn with_kid(
        account_url: impl Into<String>,
        nonce: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::new(
            SignatureAlgorithm::default(),
            KeyId::Kid(account_url.into()),
            nonce,
            url,
        )
    }

    pub fn alg(&self) -> SignatureAlgorithm {
        self.alg
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 將保護頭序列化為緊湊 JSON 後以 base64url 編碼。
    pub fn to_base64(&self) -> Result<Base64> {
        Ok(Base64::new(serde_json::to_vec(self)?))
    }
}

impl std::fmt::Display for ProtectedHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        serde_json::to_string(self)
            .map_err(|_| std::fmt::Error)
            .and_then(|s| write!(f, "{}", s))
    }
}
