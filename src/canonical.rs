// RFC 8785 canonical JSON, used for JWK thumbprints (RFC 7638).

use serde::Serialize;

/// 將可序列化的值轉為 RFC 8785（JCS）標準形式的 UTF-8 位元組。
///
/// 物件的鍵依字典序排序，分隔符為 `,` 與 `:`，不含任何空白。
/// 對僅含 ASCII 字串成員的 JWK 而言，結果等同於排序鍵並使用最小分隔符的緊湊 JSON。
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let canonical = serde_jcs::to_string(value)?;
    Ok(canonical.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_independence() {
        let value1: serde_json::Value =
            serde_json::from_str(r#"{"n": "abc", "kty": "RSA", "e": "AQAB"}"#).unwrap();
        let value2: serde_json::Value =
            serde_json::from_str(r#"{"e":"AQAB","n":"abc","kty":"RSA"}"#).unwrap();

        let bytes1 = canonical_json(&value1).unwrap();
        let bytes2 = canonical_json(&value2).unwrap();
        assert_eq!(bytes1, bytes2);
        assert_eq!(bytes1, br#"{"e":"AQAB","kty":"RSA","n":"abc"}"#);
    }

    #[test]
    fn test_struct_fields_sorted() {
        #[derive(Serialize)]
        struct Header {
            url: &'static str,
            alg: &'static str,
        }

        let bytes = canonical_json(&Header {
            url: "https://example.com",
            alg: "RS256",
        })
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"alg":"RS256","url":"https://example.com"}"#
        );
    }
}
