use openssl::{
    bn::BigNum,
    error::ErrorStack,
    pkey::{Id, PKey, PKeyRef, Public},
    rsa::Rsa,
    sha::sha256,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    base64::{Base64, DecodeError},
    canonical::canonical_json,
    key_pair::KeyPair,
};

/// JWK 相關操作的錯誤類型。
#[derive(Debug, Error)]
pub enum JwkError {
    /// 金鑰不是 RSA 公鑰或參數無法讀取。
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// JWK 成員不是合法的 base64url。
    #[error("Invalid member encoding: {0}")]
    Decode(#[from] DecodeError),
    /// 序列化錯誤。
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, JwkError>;

/// JSON Web Key（RFC 7517），目前僅支援 RSA。
///
/// 序列化結果恰好包含 `kty`、`n`、`e` 三個成員。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum Jwk {
    #[serde(rename = "RSA")]
    Rsa(RsaJwk),
}

/// RSA 公鑰參數，皆為無前導零的大端序整數之 base64url 編碼。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaJwk {
    n: String,
    e: String,
}

impl RsaJwk {
    fn from_public_key(public_key: &PKeyRef<Public>) -> Result<Self> {
        if public_key.id() != Id::RSA {
            return Err(JwkError::InvalidKey(format!(
                "expected RSA key, found {:?}",
                public_key.id()
            )));
        }
        let rsa = public_key
            .rsa()
            .map_err(|e| JwkError::InvalidKey(e.to_string()))?;

        // BigNum::to_vec 已是最短的大端序表示。
        Ok(Self {
            n: Base64::new(rsa.n().to_vec()).base64_url(),
            e: Base64::new(rsa.e().to_vec()).base64_url(),
        })
    }

    pub fn n(&self) -> &str {
        &self.n
    }

    pub fn e(&self) -> &str {
        &self.e
    }
}

/// 將金鑰對的公鑰轉換為 JWK。
pub fn to_jwk(key_pair: &KeyPair) -> Result<Jwk> {
    Jwk::new(key_pair)
}

impl Jwk {
    /// 根據金鑰對建立 JWK。
    pub fn new(key_pair: &KeyPair) -> Result<Self> {
        Self::from_public_key(key_pair.public_key())
    }

    /// 根據 OpenSSL 公鑰建立 JWK。
    ///
    /// # Errors
    ///
    /// 非 RSA 金鑰回傳 [`JwkError::InvalidKey`]。
    pub fn from_public_key(public_key: &PKeyRef<Public>) -> Result<Self> {
        Ok(Jwk::Rsa(RsaJwk::from_public_key(public_key)?))
    }

    /// 解碼 `n` 成員，回傳模數的大端序位元組。
    pub fn modulus(&self) -> Result<Vec<u8>> {
        match self {
            Jwk::Rsa(jwk) => Ok(Base64::from_url(&jwk.n)?.decode()?),
        }
    }

    /// 解碼 `e` 成員，回傳公開指數的大端序位元組。
    pub fn exponent(&self) -> Result<Vec<u8>> {
        match self {
            Jwk::Rsa(jwk) => Ok(Base64::from_url(&jwk.e)?.decode()?),
        }
    }

    /// 由 JWK 重建 OpenSSL 公鑰。
    pub fn to_public_key(&self) -> Result<PKey<Public>> {
        let n = self.modulus()?;
        let e = self.exponent()?;
        let rebuild = || -> std::result::Result<PKey<Public>, ErrorStack> {
            let rsa = Rsa::from_public_components(BigNum::from_slice(&n)?, BigNum::from_slice(&e)?)?;
            PKey::from_rsa(rsa)
        };
        rebuild().map_err(|e| JwkError::InvalidKey(e.to_string()))
    }

    /// 將 JWK 序列化為緊湊 JSON，成員順序為 `kty`、`n`、`e`。
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 從 JSON 字串解析 JWK。
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 產生計算 thumbprint 用的標準形式：鍵依字典序排序、無空白。
    pub fn to_canonical_json(&self) -> Result<String> {
        let bytes = canonical_json(self)?;
        String::from_utf8(bytes).map_err(|e| JwkError::InvalidKey(e.to_string()))
    }

    /// 計算 RFC 7638 thumbprint：標準形式 JSON 的 SHA-256 摘要，再以 base64url 編碼。
    pub fn thumbprint(&self) -> Result<String> {
        let canonical = canonical_json(self)?;
        Ok(Base64::new(sha256(&canonical)).base64_url())
    }
}
