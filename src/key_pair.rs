use openssl::{
    bn::BigNum,
    error::ErrorStack,
    pkey::{Id, PKey, Private, Public},
    rsa::Rsa,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{ConfigError, CryptoConfig},
    storage::{Storage, StorageError},
};

/// 金鑰相關操作的錯誤列舉。
#[derive(Debug, Error)]
pub enum KeyError {
    /// 亂數來源無法完成金鑰產生，不會自動重試。
    #[error("Key generation failed, random source unavailable: {0}")]
    Entropy(#[source] ErrorStack),
    /// 金鑰資料格式錯誤或非 RSA 金鑰。
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("OpenSSL error: {0}")]
    OpenSSL(#[from] ErrorStack),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

type Result<T> = std::result::Result<T, KeyError>;

/// RSA 非對稱金鑰對。
///
/// 私鑰由呼叫端（帳戶或訂單）獨佔持有，只有在 [`KeyPair::private_key_to_pem`]
/// 被明確呼叫時才會序列化；公鑰則從私鑰派生。
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub(crate) pri_key: PKey<Private>,
    pub(crate) pub_key: PKey<Public>,
}

/// 以預設設定（RSA-2048、e = 65537）產生一組新的金鑰對。
///
/// # Errors
///
/// 亂數來源失效時回傳 [`KeyError::Entropy`]。
pub fn generate_key_pair() -> Result<KeyPair> {
    KeyPair::generate(&CryptoConfig::default())
}

impl KeyPair {
    /// 依照設定產生新的 RSA 金鑰對。
    ///
    /// # 參數
    ///
    /// - `config`: 指定金鑰長度與公開指數，會先經過 [`CryptoConfig::validate`] 檢查。
    ///
    /// # 回傳
    ///
    /// 成功回傳新的 `KeyPair`；產生失敗回傳 [`KeyError::Entropy`]。
    pub fn generate(config: &CryptoConfig) -> Result<Self> {
        config.validate()?;

        let exponent = BigNum::from_u32(config.exponent())?;
        let rsa = Rsa::generate_with_e(config.bits(), &exponent).map_err(KeyError::Entropy)?;
        debug!(bits = config.bits(), "generated RSA key pair");

        Self::from_private_key(PKey::from_rsa(rsa)?)
    }

    /// 以既有私鑰建立金鑰對，非 RSA 金鑰會被拒絕。
    pub fn from_private_key(pri_key: PKey<Private>) -> Result<Self> {
        let pub_key = Self::derive_public_key(&pri_key)?;
        Ok(Self { pri_key, pub_key })
    }

    /// 根據 PEM 格式（PKCS#1 或 PKCS#8）的私鑰資料建立金鑰對。
    pub fn from_pem(pri_key_pem: &[u8]) -> Result<Self> {
        let pri_key = PKey::private_key_from_pem(pri_key_pem)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Self::from_private_key(pri_key)
    }

    /// 從存儲讀取 PEM 私鑰並建立金鑰對。
    pub fn load(storage: &dyn Storage, key: &str) -> Result<Self> {
        let pem = storage.read_file(key)?;
        Self::from_pem(&pem)
    }

    /// 將私鑰以 PKCS#8 PEM 格式寫入存儲。
    pub fn save(&self, storage: &dyn Storage, key: &str) -> Result<()> {
        storage.write_file(key, &self.private_key_to_pem()?)?;
        debug!(key, "stored private key");
        Ok(())
    }

    /// 讀取既有金鑰，若不存在則依設定產生並寫入。
    pub fn load_or_generate(
        storage: &dyn Storage,
        key: &str,
        config: &CryptoConfig,
    ) -> Result<Self> {
        match Self::load(storage, key) {
            Ok(key_pair) => Ok(key_pair),
            Err(KeyError::Storage(StorageError::NotFound(_))) => {
                let key_pair = Self::generate(config)?;
                key_pair.save(storage, key)?;
                Ok(key_pair)
            }
            Err(e) => Err(e),
        }
    }

    fn derive_public_key(pri_key: &PKey<Private>) -> Result<PKey<Public>> {
        match pri_key.id() {
            Id::RSA => {
                let rsa = pri_key.rsa()?;
                let pub_rsa =
                    Rsa::from_public_components(rsa.n().to_owned()?, rsa.e().to_owned()?)?;
                Ok(PKey::from_rsa(pub_rsa)?)
            }
            other => Err(KeyError::InvalidKey(format!(
                "unsupported key type {:?}",
                other
            ))),
        }
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.pri_key
    }

    pub fn public_key(&self) -> &PKey<Public> {
        &self.pub_key
    }

    /// PKCS#8 PEM 格式的私鑰。
    pub fn private_key_to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.pri_key.private_key_to_pem_pkcs8()?)
    }

    /// SubjectPublicKeyInfo PEM 格式的公鑰。
    pub fn public_key_to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.pub_key.public_key_to_pem()?)
    }

    /// 模數的位元長度。
    pub fn bits(&self) -> u32 {
        self.pub_key.bits()
    }

    /// 公開指數的大端序位元組表示（無前導零）。
    pub fn public_exponent(&self) -> Result<Vec<u8>> {
        Ok(self.pub_key.rsa()?.e().to_vec())
    }

    /// 模數的大端序位元組表示（無前導零）。
    pub fn modulus(&self) -> Result<Vec<u8>> {
        Ok(self.pub_key.rsa()?.n().to_vec())
    }
}
