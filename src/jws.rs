//! 此模組提供 JSON Web Signature (JWS) 的建立、序列化與驗證。
//!
//! 輸出採用 ACME 使用的 flattened JSON 形式：
//! `{"protected": ..., "payload": ..., "signature": ...}`，三個欄位皆為無填充的 base64url。

use std::result;

use openssl::pkey::{PKeyRef, Public};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    base64::{Base64, DecodeError},
    key_pair::KeyPair,
    payload::{Payload, PayloadError},
    signature::{OpensslProvider, SignatureError, SignatureProvider},
};

/// 表示與 JWS 相關的錯誤。
#[derive(Error, Debug)]
pub enum JwsError {
    /// 私鑰無法產生簽章。
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] DecodeError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

type Result<T> = result::Result<T, JwsError>;

/// 一個已簽章的 JWS 物件。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Jws {
    /// 保護頭的 base64url 編碼。
    #[serde(rename = "protected")]
    header: String,
    /// 載荷的 base64url 編碼；POST-as-GET 請求時為空字串。
    payload: String,
    /// 簽章的 base64url 編碼。
    signature: String,
}

/// 以預設的 OpenSSL RS256 提供者建立 JWS，並回傳序列化後的 UTF-8 JSON 位元組。
///
/// # 參數
///
/// - `protected_header`: 任何可序列化為 JSON 物件的保護頭。
/// - `payload`: 請求載荷，[`Payload::Empty`] 表示 POST-as-GET。
/// - `key_pair`: 帳戶金鑰對。
///
/// # Errors
///
/// 金鑰無法簽章時回傳 [`JwsError::Signature`]。
pub fn sign<H: Serialize + ?Sized>(
    protected_header: &H,
    payload: &Payload,
    key_pair: &KeyPair,
) -> Result<Vec<u8>> {
    Jws::sign(protected_header, payload, key_pair, &OpensslProvider::default())?.to_bytes()
}

impl Jws {
    /// 序列化保護頭與載荷、組合簽章輸入並簽章。
    ///
    /// 簽章輸入為 `base64url(protected) + "." + base64url(payload)`；
    /// 載荷為 [`Payload::Empty`] 時，點號後不接任何內容。
    pub fn sign<H: Serialize + ?Sized>(
        protected_header: &H,
        payload: &Payload,
        key_pair: &KeyPair,
        provider: &dyn SignatureProvider,
    ) -> Result<Self> {
        let header = Base64::new(serde_json::to_vec(protected_header)?).base64_url();
        let payload = payload.encode()?;
        let signing_input = format!("{}.{}", header, payload);

        let signature = provider.sign(signing_input.as_bytes(), key_pair)?;
        debug!(
            alg = %provider.algorithm(),
            post_as_get = payload.is_empty(),
            "signed JWS"
        );

        Ok(Jws {
            header,
            payload,
            signature: Base64::new(signature).base64_url(),
        })
    }

    /// 由已編碼的三個部分直接組成 JWS，不做任何驗證。
    pub fn from_parts(
        header_b64: impl Into<String>,
        payload_b64: impl Into<String>,
        signature_b64: impl Into<String>,
    ) -> Self {
        Jws {
            header: header_b64.into(),
            payload: payload_b64.into(),
            signature: signature_b64.into(),
        }
    }

    pub fn protected(&self) -> &str {
        &self.header
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// 重新組出簽章輸入 `protected.payload`。
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    /// 以公鑰驗證簽章。
    pub fn verify(
        &self,
        public_key: &PKeyRef<Public>,
        provider: &dyn SignatureProvider,
    ) -> Result<bool> {
        let signature = Base64::from_url(&self.signature)?.decode()?;
        Ok(provider.verify(self.signing_input().as_bytes(), &signature, public_key)?)
    }

    /// 將 JWS 序列化為 JSON 字串。
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 將 JWS 序列化為 UTF-8 JSON 位元組，可直接作為 HTTP 請求內容。
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }
}
