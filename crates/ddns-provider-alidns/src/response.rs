//! Response decoding for the DNS RPC API
//!
//! Every action answers with a JSON object. A `Code` field means the call
//! failed, whatever the HTTP status; its absence means success.

use ddns_core::{DnsRecord, Error, Result};
use serde::Deserialize;

/// Error body returned by any failing action
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

/// `DescribeDomainRecords` success body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    pub domain_records: DomainRecords,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecords {
    #[serde(rename = "Record", default)]
    pub record: Vec<RecordEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RecordEntry {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Type")]
    pub record_type: String,
}

impl From<RecordEntry> for DnsRecord {
    fn from(entry: RecordEntry) -> Self {
        DnsRecord {
            record_id: entry.record_id,
            rr: entry.rr,
            value: entry.value,
            record_type: entry.record_type,
        }
    }
}

/// Mutation success body (`UpdateDomainRecord`, `AddDomainRecord`)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordMutationResponse {
    pub record_id: String,
}

/// One page of described records
#[derive(Debug)]
pub struct DescribedRecords {
    pub records: Vec<DnsRecord>,
    /// Records the domain holds in total, which may exceed one page
    pub total_count: u64,
}

impl DescribedRecords {
    /// Whether the domain holds records this page did not return
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.records.len() as u64
    }
}

/// Turn a raw HTTP answer into a JSON value, or the matching error.
///
/// - body with `Code` → `Error::Provider`
/// - body that is not JSON, or non-2xx without `Code` → `Error::Transport`
pub fn check_body(status: u16, body: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return Err(Error::transport(format!(
                "HTTP {} with undecodable body: {}",
                status, e
            )));
        }
    };

    if let Ok(ErrorBody {
        code: Some(code),
        message,
    }) = serde_json::from_value::<ErrorBody>(value.clone())
    {
        let message = message.unwrap_or_else(|| "no message".to_string());
        return Err(Error::provider(code, message));
    }

    if !(200..300).contains(&status) {
        return Err(Error::transport(format!("HTTP {} without error code", status)));
    }

    Ok(value)
}

/// Decode a `DescribeDomainRecords` body into records
pub fn parse_describe(value: serde_json::Value) -> Result<DescribedRecords> {
    let response: DescribeDomainRecordsResponse = serde_json::from_value(value)
        .map_err(|e| Error::transport(format!("Unexpected describe response: {}", e)))?;

    let records: Vec<DnsRecord> = response
        .domain_records
        .record
        .into_iter()
        .map(DnsRecord::from)
        .collect();
    let total_count = response.total_count.unwrap_or(records.len() as u64);

    Ok(DescribedRecords {
        records,
        total_count,
    })
}

/// Decode an update/add body, returning the affected record id
pub fn parse_mutation(value: serde_json::Value) -> Result<String> {
    let response: RecordMutationResponse = serde_json::from_value(value)
        .map_err(|e| Error::transport(format!("Unexpected mutation response: {}", e)))?;
    Ok(response.record_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE_BODY: &str = r#"{
        "TotalCount": 2,
        "PageSize": 500,
        "RequestId": "536E9CAD-DB30-4647-AC87-AA5CC38C5382",
        "DomainRecords": {
            "Record": [
                {"RR": "www", "Status": "ENABLE", "Value": "5.6.7.8", "RecordId": "9999985",
                 "Type": "A", "DomainName": "example.com", "TTL": 600, "Locked": false},
                {"RR": "@", "Status": "ENABLE", "Value": "1.2.3.4", "RecordId": "9999986",
                 "Type": "A", "DomainName": "example.com", "TTL": 600, "Locked": false}
            ]
        },
        "PageNumber": 1
    }"#;

    #[test]
    fn test_describe_body_parsed() {
        let value = check_body(200, DESCRIBE_BODY).unwrap();
        let described = parse_describe(value).unwrap();
        assert_eq!(described.total_count, 2);
        assert!(!described.is_truncated());

        let records = described.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record_id, "9999986");
        assert_eq!(records[1].rr, "@");
        assert_eq!(records[1].value, "1.2.3.4");
        assert!(records[1].is_a_record());
    }

    #[test]
    fn test_empty_describe_yields_no_records() {
        let body = r#"{"TotalCount":0,"DomainRecords":{"Record":[]},"RequestId":"x"}"#;
        let described = parse_describe(check_body(200, body).unwrap()).unwrap();
        assert!(described.records.is_empty());
        assert!(!described.is_truncated());
    }

    #[test]
    fn test_total_count_beyond_page_is_truncated() {
        let body = r#"{"TotalCount":501,"DomainRecords":{"Record":[
            {"RR":"@","Value":"1.2.3.4","RecordId":"1","Type":"A"}]}}"#;
        let described = parse_describe(check_body(200, body).unwrap()).unwrap();
        assert_eq!(described.total_count, 501);
        assert!(described.is_truncated());
    }

    #[test]
    fn test_missing_total_count_defaults_to_page_length() {
        let body = r#"{"DomainRecords":{"Record":[
            {"RR":"@","Value":"1.2.3.4","RecordId":"1","Type":"A"}]}}"#;
        let described = parse_describe(check_body(200, body).unwrap()).unwrap();
        assert_eq!(described.total_count, 1);
    }

    #[test]
    fn test_code_field_is_provider_error() {
        let body = r#"{"RequestId":"x","HostId":"alidns.aliyuncs.com",
            "Code":"InvalidAccessKeyId.NotFound","Message":"Specified access key is not found."}"#;

        match check_body(404, body) {
            Err(Error::Provider { code, message }) => {
                assert_eq!(code, "InvalidAccessKeyId.NotFound");
                assert_eq!(message, "Specified access key is not found.");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_code_field_wins_over_success_status() {
        let body = r#"{"Code":"DomainRecordDuplicate","Message":"The DNS record already exists."}"#;
        assert!(matches!(check_body(200, body), Err(Error::Provider { .. })));
    }

    #[test]
    fn test_non_json_body_is_transport_error() {
        let result = check_body(502, "<html>Bad Gateway</html>");
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_error_status_without_code_is_transport_error() {
        let result = check_body(500, r#"{"RequestId":"x"}"#);
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_mutation_body_parsed() {
        let body = r#"{"RequestId":"536E9CAD","RecordId":"9999985"}"#;
        assert_eq!(parse_mutation(check_body(200, body).unwrap()).unwrap(), "9999985");
    }

    #[test]
    fn test_malformed_describe_is_transport_error() {
        let value = check_body(200, r#"{"RequestId":"x"}"#).unwrap();
        assert!(matches!(parse_describe(value), Err(Error::Transport(_))));
    }
}
