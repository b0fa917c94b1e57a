//! # ACME 密碼學核心
//!
//! 本庫提供 ACME 客戶端（例如向 Let's Encrypt 申請證書）所需的密碼學基礎元件，
//! 所有輸出皆為 CA 會嚴格驗證的位元組精確編碼：
//!
//! - **key_pair**: 產生 RSA-2048（e = 65537）金鑰對，以及 PEM 匯入匯出。
//! - **jwk**: 由 RSA 公鑰產生 JWK（RFC 7517）與 thumbprint（RFC 7638）。
//! - **jws**: 以帳戶私鑰簽署 ACME 請求，輸出 flattened JSON 形式的 JWS（RFC 7515）。
//! - **csr**: 為一組域名建立自簽的 PKCS#10 CSR（RFC 2986），輸出 DER 的 base64url。
//! - **challenge**: 計算挑戰的 key authorization（RFC 8555 §8.1）。
//!
//! 演算法參數集中於 [`config::CryptoConfig`]，實際的簽章後端則透過
//! [`signature::SignatureProvider`] 注入，預設為 OpenSSL。
//!
//! HTTP 傳輸、挑戰流程編排與命令列介面不在本庫範圍內；
//! PEM 檔案的讀寫只發生在 [`storage::Storage`] 邊界。
//!
//! ## 示例
//!
//! ```no_run
//! use acme_crypto::{
//!     challenge::key_authorization,
//!     csr::build_csr,
//!     jwk::to_jwk,
//!     jws::sign,
//!     key_pair::generate_key_pair,
//!     payload::{FinalizeOrderPayload, Payload, PayloadT},
//!     protection::ProtectedHeader,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. 帳戶金鑰與 JWK
//!     let account_key = generate_key_pair()?;
//!     let jwk = to_jwk(&account_key)?;
//!
//!     // 2. 挑戰的 key authorization
//!     let key_auth = key_authorization("token-from-server", &jwk)?;
//!     println!("{}", key_auth);
//!
//!     // 3. 以證書金鑰建立 CSR，並包裝成 finalize 請求
//!     let cert_key = generate_key_pair()?;
//!     let csr = build_csr(&["example.com", "www.example.com"], &cert_key)?;
//!     let payload = FinalizeOrderPayload::new(csr).to_payload()?;
//!
//!     let header = ProtectedHeader::with_kid(
//!         "https://acme.example/acct/1",
//!         "nonce",
//!         "https://acme.example/order/1/finalize",
//!     );
//!     let body = sign(&header, &payload, &account_key)?;
//!
//!     // 4. POST-as-GET 請求使用空載荷
//!     let _poll = sign(&header, &Payload::Empty, &account_key)?;
//!     # let _ = body;
//!     Ok(())
//! }
//! ```

pub mod base64;
pub mod canonical;
pub mod certificate;
pub mod challenge;
pub mod config;
pub mod csr;
pub mod jwk;
pub mod jws;
pub mod key_pair;
pub mod payload;
pub mod protection;
pub mod signature;
pub mod storage;
