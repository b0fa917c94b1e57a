//! 密碼學參數設定。
//!
//! 所有運算所使用的金鑰長度、公開指數與簽章演算法都集中在 [`CryptoConfig`]，
//! 並以不可變的值顯式傳入各項操作，而非散落在模組內的全域常數。

use openssl::{hash::MessageDigest, rsa::Padding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設定驗證失敗時的錯誤類型。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RSA key size too small: {0} bits")]
    KeyTooSmall(u32),
    #[error("Invalid RSA public exponent: {0}")]
    InvalidExponent(u32),
}

/// JWS `alg` 參數所對應的簽章演算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 搭配 SHA-256。
    #[default]
    #[serde(rename = "RS256")]
    Rs256,
}

impl SignatureAlgorithm {
    /// 回傳 JWS `alg` 欄位使用的名稱。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
        }
    }

    /// 簽章時使用的訊息摘要。
    pub fn digest(&self) -> MessageDigest {
        match self {
            Self::Rs256 => MessageDigest::sha256(),
        }
    }

    /// 簽章時使用的 RSA 填充方式。
    pub fn padding(&self) -> Padding {
        match self {
            Self::Rs256 => Padding::PKCS1,
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 金鑰產生與簽章所需的參數集合。
///
/// 預設值為 RSA-2048、公開指數 65537、`RS256`。以 builder 風格的方法產生修改後的副本：
///
/// ```
/// # use acme_crypto::config::CryptoConfig;
/// let config = CryptoConfig::default().key_bits(4096);
/// assert_eq!(config.bits(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    key_bits: u32,
    public_exponent: u32,
    algorithm: SignatureAlgorithm,
}

impl CryptoConfig {
    /// 預設的 RSA 金鑰長度。
    pub const DEFAULT_KEY_BITS: u32 = 2048;
    /// 預設的 RSA 公開指數（F4）。
    pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;
    /// 可接受的最小金鑰長度。
    pub const MIN_KEY_BITS: u32 = 2048;

    /// 建立使用預設值的設定。
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定 RSA 金鑰長度。
    pub fn key_bits(mut self, key_bits: u32) -> Self {
        self.key_bits = key_bits;
        self
    }

    /// 設定 RSA 公開指數。
    pub fn public_exponent(mut self, exponent: u32) -> Self {
        self.public_exponent = exponent;
        self
    }

    /// 設定簽章演算法。
    pub fn algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn bits(&self) -> u32 {
        self.key_bits
    }

    pub fn exponent(&self) -> u32 {
        self.public_exponent
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// 檢查參數是否安全可用。
    ///
    /// # Errors
    ///
    /// 金鑰長度低於 [`Self::MIN_KEY_BITS`] 時回傳 [`ConfigError::KeyTooSmall`]；
    /// 公開指數為偶數或小於 3 時回傳 [`ConfigError::InvalidExponent`]。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_bits < Self::MIN_KEY_BITS {
            return Err(ConfigError::KeyTooSmall(self.key_bits));
        }
        if self.public_exponent < 3 || self.public_exponent % 2 == 0 {
            return Err(ConfigError::InvalidExponent(self.public_exponent));
        }
        Ok(())
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key_bits: Self::DEFAULT_KEY_BITS,
            public_exponent: Self::DEFAULT_PUBLIC_EXPONENT,
            algorithm: SignatureAlgorithm::default(),
        }
    }
}
