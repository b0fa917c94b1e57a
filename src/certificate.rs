use openssl::{nid::Nid, x509::X509};
use thiserror::Error;

use crate::storage::{Storage, StorageError};

/// 證書相關操作可能出現的錯誤類型
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(#[from] openssl::error::ErrorStack),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

type Result<T> = std::result::Result<T, CertificateError>;

/// CA 簽發的 X.509 證書，僅在存儲邊界做 PEM 與 DER 之間的轉換。
#[derive(Debug, Clone)]
pub struct Certificate {
    cert: X509,
}

/// 將 PEM 格式的證書轉為 DER 位元組。
pub fn pem_to_der(pem: &[u8]) -> Result<Vec<u8>> {
    Certificate::from_pem(pem)?.to_der()
}

impl Certificate {
    /// 解析 PEM 格式的證書；若內容為證書鏈，只取第一張。
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Ok(Self {
            cert: X509::from_pem(pem)?,
        })
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            cert: X509::from_der(der)?,
        })
    }

    pub fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.cert.to_pem()?)
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.cert.to_der()?)
    }

    pub fn x509(&self) -> &X509 {
        &self.cert
    }

    /// 主體的 Common Name。
    pub fn common_name(&self) -> Option<String> {
        self.cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|cn| cn.to_string())
    }

    /// Subject Alternative Name 中的 DNS 名稱，依證書內順序。
    pub fn dns_names(&self) -> Vec<String> {
        self.cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 以 PEM 格式寫入存儲。
    pub fn save(&self, storage: &dyn Storage, key: &str) -> Result<()> {
        storage.write_file(key, &self.to_pem()?)?;
        Ok(())
    }

    pub fn load(storage: &dyn Storage, key: &str) -> Result<Self> {
        Self::from_pem(&storage.read_file(key)?)
    }
}
