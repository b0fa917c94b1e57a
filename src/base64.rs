use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// Base64url 解碼過程中可能發生的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// 輸入不是合法的無填充 base64url 字串。
    #[error("Invalid base64url input: {0}")]
    Invalid(#[from] base64::DecodeError),
}

/// ACME 協議所使用的 base64url（無填充）編碼結果。
///
/// JWS、JWK、CSR 與 thumbprint 一律使用此格式（RFC 7515 §2），
/// 因此本結構只保存 URL 安全、無 `=` 的字串。
///
/// # 示例
///
/// ```
/// # use acme_crypto::base64::Base64;
/// let b64 = Base64::new("Hello, World!");
/// assert_eq!(b64.base64_url(), "SGVsbG8sIFdvcmxkIQ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64 {
    encoded: String,
}

impl Base64 {
    /// 對任意位元組資料進行 base64url 編碼。
    pub fn new<T: AsRef<[u8]>>(input: T) -> Self {
        Self {
            encoded: URL_SAFE_NO_PAD.encode(input.as_ref()),
        }
    }

    /// 從已編碼的 base64url 字串建立實例，並驗證其可被解碼。
    ///
    /// # 錯誤
    ///
    /// 字串含有非 URL 安全字元、帶有填充或長度不合法時回傳 [`DecodeError`]。
    pub fn from_url(url_encoded: &str) -> Result<Self, DecodeError> {
        URL_SAFE_NO_PAD.decode(url_encoded)?;
        Ok(Self {
            encoded: url_encoded.to_string(),
        })
    }

    /// 將內容解碼回原始位元組。
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        Ok(URL_SAFE_NO_PAD.decode(&self.encoded)?)
    }

    /// 取得 base64url 字串的複本。
    pub fn base64_url(&self) -> String {
        self.encoded.clone()
    }

    /// 取得 base64url 字串的參考。
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// 是否為空字串編碼（即原始資料長度為零）。
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }
}

impl std::fmt::Display for Base64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_encoding() {
        let base64 = Base64::new("Hello, World!");
        assert_eq!(base64.as_str(), "SGVsbG8sIFdvcmxkIQ");
    }

    #[test]
    fn test_url_safe_alphabet() {
        let base64 = Base64::new(b"\xFB\xFF\xBF");
        assert_eq!(base64.as_str(), "-_-_");

        let base64 = Base64::new(b"\xFF\x00\xFF");
        assert_eq!(base64.as_str(), "_wD_");
    }

    #[test]
    fn test_no_padding() {
        assert_eq!(Base64::new("a").as_str(), "YQ");
        assert_eq!(Base64::new("ab").as_str(), "YWI");
        assert_eq!(Base64::new("abc").as_str(), "YWJj");
    }

    #[test]
    fn test_empty_input() {
        let base64 = Base64::new(b"");
        assert!(base64.is_empty());
        assert_eq!(base64.decode().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_from_url() {
        let base64 = Base64::from_url("SGVsbG8sIFdvcmxkIQ").unwrap();
        assert_eq!(base64.decode().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_rejects_standard_alphabet_and_padding() {
        assert!(Base64::from_url("SGVsbG8sIFdvcmxkIQ==").is_err());
        assert!(Base64::from_url("/wD/").is_err());
        assert!(Base64::from_url("SGVsbG8$").is_err());
    }
}
