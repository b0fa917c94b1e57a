use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::base64::Base64;

/// 載荷建立或驗證時的錯誤。
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid payload: {0}")]
    Invalid(&'static str),
}

type Result<T> = std::result::Result<T, PayloadError>;

/// JWS 的載荷。
///
/// `Empty` 代表 POST-as-GET 請求：簽章輸入與輸出中的 payload 皆為空字串，
/// 而不是空字串的 base64url 編碼。
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
}

impl Payload {
    /// 將任意可序列化的值轉為 JSON 載荷。
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// 回傳簽章輸入中使用的編碼字串；`Empty` 時為空字串。
    pub fn encode(&self) -> Result<String> {
        match self {
            Payload::Empty => Ok(String::new()),
            Payload::Json(value) => Ok(Base64::new(serde_json::to_vec(value)?).base64_url()),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// ACME 請求載荷必須實作的功能。
pub trait PayloadT: Serialize {
    /// 驗證載荷資料是否符合協議要求。
    fn validate(&self) -> Result<()>;

    /// 驗證後轉為 [`Payload`]。
    fn to_payload(&self) -> Result<Payload> {
        self.validate()?;
        Payload::json(self)
    }
}

/// 建立新帳號所需的載荷。
#[derive(Debug, Serialize, Deserialize)]
pub struct NewAccountPayload {
    contact: Vec<String>,
    #[serde(rename = "termsOfServiceAgreed")]
    terms_of_service_agreed: bool,
}

impl NewAccountPayload {
    /// 傳入的 `email` 會自動補足 `mailto:` 前綴，若已包含則不重複補充。
    pub fn new(email: &str) -> Self {
        let contact = if email.starts_with("mailto:") {
            vec![email.to_string()]
        } else {
            vec![format!("mailto:{}", email)]
        };

        NewAccountPayload {
            contact,
            terms_of_service_agreed: true,
        }
    }
}

impl PayloadT for NewAccountPayload {
    fn validate(&self) -> Result<()> {
        if self.contact.iter().any(|c| c == "mailto:") {
            return Err(PayloadError::Invalid("Contact information is required"));
        }
        if !self.terms_of_service_agreed {
            return Err(PayloadError::Invalid("Terms of service must be agreed"));
        }
        Ok(())
    }
}

/// 訂單識別項。
#[derive(Debug, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: String,
}

/// 建立新訂單的載荷，每個域名對應一個 `dns` 識別項。
#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrderPayload {
    pub identifiers: Vec<Identifier>,
}

impl NewOrderPayload {
    pub fn new<S: AsRef<str>>(domains: &[S]) -> Self {
        let identifiers = domains
            .iter()
            .map(|domain| Identifier {
                type_: "dns".to_string(),
                value: domain.as_ref().to_string(),
            })
            .collect();

        NewOrderPayload { identifiers }
    }
}

impl PayloadT for NewOrderPayload {
    fn validate(&self) -> Result<()> {
        if self.identifiers.is_empty() {
            return Err(PayloadError::Invalid("At least one identifier is required"));
        }
        if self.identifiers.iter().any(|i| i.value.is_empty()) {
            return Err(PayloadError::Invalid("Identifier value cannot be empty"));
        }
        Ok(())
    }
}

/// 回應挑戰時的載荷，內容為空物件 `{}`。
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ChallengeValidationPayload {}

impl ChallengeValidationPayload {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayloadT for ChallengeValidationPayload {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// 最終化訂單的載荷，攜帶 base64url 編碼的 DER CSR。
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeOrderPayload {
    csr: String,
}

impl FinalizeOrderPayload {
    pub fn new(csr_b64url: impl Into<String>) -> Self {
        FinalizeOrderPayload {
            csr: csr_b64url.into(),
        }
    }
}

impl PayloadT for FinalizeOrderPayload {
    fn validate(&self) -> Result<()> {
        if self.csr.is_empty() {
            return Err(PayloadError::Invalid("CSR cannot be empty"));
        }
        if Base64::from_url(&self.csr).is_err() {
            return Err(PayloadError::Invalid("CSR must be base64url without padding"));
        }
        Ok(())
    }
}
