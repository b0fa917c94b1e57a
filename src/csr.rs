use std::result;

use openssl::{
    error::ErrorStack,
    nid::Nid,
    stack::Stack,
    x509::{extension::SubjectAlternativeName, X509NameBuilder, X509Req},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    base64::Base64,
    key_pair::KeyPair,
    signature::{OpensslProvider, SignatureError, SignatureProvider},
};

/// 用於描述建立 CSR（證書簽名請求）過程中可能發生的錯誤。
#[derive(Debug, Error)]
pub enum CsrError {
    #[error("No domains given")]
    NoDomains,
    #[error("Invalid domain name: {0:?}")]
    InvalidDomain(String),
    #[error("Failed to build certificate request: {0}")]
    CertificateRequest(#[from] ErrorStack),
    #[error("Failed to sign certificate request: {0}")]
    Signing(#[from] SignatureError),
}

/// 為簡化錯誤處理定義 Result 類型
type Result<T> = result::Result<T, CsrError>;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// CSR 建構器。
///
/// 第一個加入的域名成為主體的 Common Name，全部域名依加入順序寫入非關鍵的
/// Subject Alternative Name 擴展（可與 CN 重複）。
///
/// # 範例
///
/// ```no_run
/// # use acme_crypto::{csr::Csr, key_pair::generate_key_pair, signature::OpensslProvider};
/// let key_pair = generate_key_pair()?;
/// let req = Csr::new()
///     .push("example.com")
///     .push("www.example.com")
///     .build(&key_pair, &OpensslProvider::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Csr {
    domains: Vec<String>,
}

/// 為指定域名建立以 `key_pair` 自簽的 CSR，回傳 DER 的 base64url 編碼。
///
/// # Errors
///
/// - 域名清單為空時回傳 [`CsrError::NoDomains`]。
/// - 域名語法不合法時回傳 [`CsrError::InvalidDomain`]。
/// - OpenSSL 建構或簽署失敗時回傳 [`CsrError::CertificateRequest`] 或 [`CsrError::Signing`]。
pub fn build_csr<S: AsRef<str>>(domains: &[S], key_pair: &KeyPair) -> Result<String> {
    let csr = domains
        .iter()
        .fold(Csr::new(), |csr, domain| csr.push(domain.as_ref()));
    Ok(Base64::new(csr.to_der(key_pair, &OpensslProvider::default())?).base64_url())
}

impl Csr {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增一個 DNS 名稱。
    pub fn push(mut self, dns_name: impl Into<String>) -> Self {
        self.domains.push(dns_name.into());
        self
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// 根據目前的域名清單建構並簽署 X509 證書簽名請求。
    ///
    /// # 參數
    ///
    /// * `key_pair` - 申請者的金鑰對，公鑰寫入請求，私鑰用於自簽。
    /// * `provider` - 簽章提供者。
    pub fn build(&self, key_pair: &KeyPair, provider: &dyn SignatureProvider) -> Result<X509Req> {
        let common_name = self.domains.first().ok_or(CsrError::NoDomains)?;
        for domain in &self.domains {
            validate_domain(domain)?;
        }

        let mut req_builder = X509Req::builder()?;
        req_builder.set_version(0)?;

        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
        req_builder.set_subject_name(&name.build())?;

        let mut san_builder = SubjectAlternativeName::new();
        for entry in &self.domains {
            san_builder.dns(entry);
        }
        let san_extension = san_builder.build(&req_builder.x509v3_context(None))?;

        let mut stack = Stack::new()?;
        stack.push(san_extension)?;
        req_builder.add_extensions(&stack)?;

        req_builder.set_pubkey(key_pair.private_key())?;
        provider.sign_request(&mut req_builder, key_pair)?;

        debug!(
            common_name = %common_name,
            san_count = self.domains.len(),
            "built certificate request"
        );
        Ok(req_builder.build())
    }

    /// 建構並簽署請求後輸出 DER 編碼。
    pub fn to_der(&self, key_pair: &KeyPair, provider: &dyn SignatureProvider) -> Result<Vec<u8>> {
        Ok(self.build(key_pair, provider)?.to_der()?)
    }
}

/// 檢查 DNS 名稱語法：總長 1 到 253 位元組，每個 label 1 到 63 個英數字或連字號，
/// 且不得以連字號開頭或結尾；允許最左側為 `*` 萬用字元。
pub fn validate_domain(domain: &str) -> Result<()> {
    let invalid = || CsrError::InvalidDomain(domain.to_string());

    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return Err(invalid());
    }

    let rest = domain.strip_prefix("*.").unwrap_or(domain);
    for label in rest.split('.') {
        let valid = !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(invalid());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_pair::generate_key_pair;
    use der::{Decode, Encode};
    use x509_cert::{
        ext::{
            pkix::{name::GeneralName, SubjectAltName},
            Extension,
        },
        request::CertReq,
    };

    const EXTENSION_REQUEST_OID: &str = "1.2.840.113549.1.9.14";
    const SUBJECT_ALT_NAME_OID: &str = "2.5.29.17";
    const SHA256_WITH_RSA_OID: &str = "1.2.840.113549.1.1.11";

    fn decode_request(der: &[u8]) -> (Vec<String>, bool, String) {
        let req = CertReq::from_der(der).unwrap();
        let attribute = req
            .info
            .attributes
            .iter()
            .find(|attr| attr.oid.to_string() == EXTENSION_REQUEST_OID)
            .expect("extension request attribute");
        let value = attribute.values.iter().next().unwrap();
        let extensions = Vec::<Extension>::from_der(&value.to_der().unwrap()).unwrap();

        let san = extensions
            .iter()
            .find(|ext| ext.extn_id.to_string() == SUBJECT_ALT_NAME_OID)
            .expect("subject alternative name extension");
        let names = SubjectAltName::from_der(san.extn_value.as_bytes()).unwrap();
        let dns_names = names
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => dns.to_string(),
                other => panic!("unexpected general name {:?}", other),
            })
            .collect();

        (dns_names, san.critical, req.algorithm.oid.to_string())
    }

    fn common_name(req: &X509Req) -> String {
        req.subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap()
            .data()
            .as_utf8()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_build_csr() -> Result<()> {
        let key_pair = generate_key_pair().unwrap();
        let encoded = build_csr(&["example.com", "www.example.com"], &key_pair)?;
        assert!(!encoded.contains('='));

        let der = Base64::from_url(&encoded).unwrap().decode().unwrap();
        let req = X509Req::from_der(&der)?;
        assert_eq!(common_name(&req), "example.com");
        assert!(req.verify(key_pair.public_key())?);
        assert!(req.public_key()?.public_eq(key_pair.public_key()));

        let (dns_names, critical, algorithm) = decode_request(&der);
        assert_eq!(dns_names, vec!["example.com", "www.example.com"]);
        assert!(!critical);
        assert_eq!(algorithm, SHA256_WITH_RSA_OID);
        Ok(())
    }

    #[test]
    fn test_san_preserves_order_and_duplicates() -> Result<()> {
        let key_pair = generate_key_pair().unwrap();
        let der = Csr::new()
            .push("b.example.com")
            .push("a.example.com")
            .push("b.example.com")
            .to_der(&key_pair, &OpensslProvider::default())?;

        let (dns_names, _, _) = decode_request(&der);
        assert_eq!(
            dns_names,
            vec!["b.example.com", "a.example.com", "b.example.com"]
        );
        Ok(())
    }

    #[test]
    fn test_wildcard_domain() -> Result<()> {
        let key_pair = generate_key_pair().unwrap();
        let der = Csr::new()
            .push("*.example.com")
            .to_der(&key_pair, &OpensslProvider::default())?;
        let (dns_names, _, _) = decode_request(&der);
        assert_eq!(dns_names, vec!["*.example.com"]);
        Ok(())
    }

    #[test]
    fn test_empty_domains() {
        let key_pair = generate_key_pair().unwrap();
        let empty: [&str; 0] = [];
        assert!(matches!(
            build_csr(&empty, &key_pair),
            Err(CsrError::NoDomains)
        ));
    }

    #[test]
    fn test_invalid_domains() {
        let key_pair = generate_key_pair().unwrap();
        for domain in [
            "",
            "-example.com",
            "example-.com",
            "exa mple.com",
            "example..com",
            "example.com.",
            "a.*.example.com",
            "ex_ample.com",
        ] {
            assert!(
                matches!(
                    build_csr(&["example.com", domain], &key_pair),
                    Err(CsrError::InvalidDomain(ref d)) if d == domain
                ),
                "domain {:?} should be rejected",
                domain
            );
        }

        let long_label = format!("{}.com", "a".repeat(64));
        assert!(validate_domain(&long_label).is_err());
        let too_long = vec!["a".repeat(63); 4].join(".");
        assert_eq!(too_long.len(), 255);
        assert!(validate_domain(&too_long).is_err());
    }

    #[test]
    fn test_common_name_length_limit() {
        // CN 的 ASN.1 上限為 64 字元，較長但合法的 DNS 名稱會在 OpenSSL 層失敗。
        let key_pair = generate_key_pair().unwrap();
        let domain = format!("{}.example.com", "a".repeat(60));
        assert!(validate_domain(&domain).is_ok());
        assert!(matches!(
            build_csr(&[domain], &key_pair),
            Err(CsrError::CertificateRequest(_))
        ));
    }
}
