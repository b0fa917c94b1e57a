//! 簽章能力的抽象。
//!
//! JWS 與 CSR 模組只透過 [`SignatureProvider`] 要求簽章或驗證，
//! 實際的密碼學後端（預設為 OpenSSL）可以在不修改上層邏輯的情況下替換。

use openssl::{
    error::ErrorStack,
    pkey::{Id, PKeyRef, Private, Public},
    sign::{Signer, Verifier},
    x509::X509ReqBuilder,
};
use thiserror::Error;
use tracing::trace;

use crate::{
    config::{CryptoConfig, SignatureAlgorithm},
    key_pair::KeyPair,
};

/// 簽章操作可能遇到的錯誤類型。
#[derive(Debug, Error)]
pub enum SignatureError {
    /// 簽章過程失敗。
    #[error("Signing error: {0}")]
    Signing(#[source] ErrorStack),
    /// 驗證過程本身失敗（而非簽章不符）。
    #[error("Verification error: {0}")]
    Verification(#[source] ErrorStack),
    /// 金鑰類型與簽章演算法不相符。
    #[error("Key type {key:?} cannot be used with {alg}")]
    InvalidKey { key: Id, alg: SignatureAlgorithm },
}

type Result<T> = std::result::Result<T, SignatureError>;

/// 簽章與驗證的提供者介面。
pub trait SignatureProvider: Send + Sync {
    /// 此提供者所實作的 JWS 演算法。
    fn algorithm(&self) -> SignatureAlgorithm;

    /// 以金鑰對中的私鑰對資料簽章，回傳原始簽章位元組。
    fn sign(&self, data: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>>;

    /// 以公鑰驗證簽章，簽章不符時回傳 `Ok(false)`。
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &PKeyRef<Public>) -> Result<bool>;

    /// 對 X.509 憑證請求進行自簽。
    fn sign_request(&self, builder: &mut X509ReqBuilder, key_pair: &KeyPair) -> Result<()>;
}

/// 以 OpenSSL 實作的簽章提供者。
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslProvider {
    config: CryptoConfig,
}

impl OpensslProvider {
    pub fn new(config: CryptoConfig) -> Self {
        Self { config }
    }

    fn check_key<T>(&self, key: &PKeyRef<T>) -> Result<()> {
        let alg = self.config.signature_algorithm();
        match (alg, key.id()) {
            (SignatureAlgorithm::Rs256, Id::RSA) => Ok(()),
            (alg, key) => Err(SignatureError::InvalidKey { key, alg }),
        }
    }

    fn signer<'a>(&self, key: &'a PKeyRef<Private>) -> Result<Signer<'a>> {
        self.check_key(key)?;
        let alg = self.config.signature_algorithm();
        let mut signer = Signer::new(alg.digest(), key).map_err(SignatureError::Signing)?;
        signer
            .set_rsa_padding(alg.padding())
            .map_err(SignatureError::Signing)?;
        Ok(signer)
    }
}

impl SignatureProvider for OpensslProvider {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.config.signature_algorithm()
    }

    fn sign(&self, data: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>> {
        let mut signer = self.signer(key_pair.private_key())?;
        signer.update(data).map_err(SignatureError::Signing)?;
        let signature = signer.sign_to_vec().map_err(SignatureError::Signing)?;
        trace!(alg = %self.algorithm(), len = data.len(), "signed data");
        Ok(signature)
    }

    fn verify(&self, data: &[u8], signature: &[u8], public_key: &PKeyRef<Public>) -> Result<bool> {
        self.check_key(public_key)?;
        let alg = self.config.signature_algorithm();
        let mut verifier =
            Verifier::new(alg.digest(), public_key).map_err(SignatureError::Verification)?;
        verifier
            .set_rsa_padding(alg.padding())
            .map_err(SignatureError::Verification)?;
        verifier
            .update(data)
            .map_err(SignatureError::Verification)?;
        // OpenSSL 對格式錯誤的簽章可能回傳錯誤而非 false，兩者都視為不符。
        Ok(verifier.verify(signature).unwrap_or(false))
    }

    fn sign_request(&self, builder: &mut X509ReqBuilder, key_pair: &KeyPair) -> Result<()> {
        self.check_key(key_pair.private_key())?;
        builder
            .sign(key_pair.private_key(), self.config.signature_algorithm().digest())
            .map_err(SignatureError::Signing)
    }
}

/// 以預設設定（RS256）對資料簽章。
pub fn create_signature(data: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>> {
    OpensslProvider::default().sign(data, key_pair)
}
