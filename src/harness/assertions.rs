//! Assertions over relayed packets and their acknowledgements

use serde_json::Value;
use tracing::debug;

use super::ack::{decode, AckEnvelope, DecodedAck};
use super::error::HarnessError;
use crate::models::{AckRecord, RelayOutcome, Side};

/// Check that `expected_count` packets went out from `from` and that every
/// acknowledgement written by the other side has the expected polarity
pub fn expect_relayed(
    outcome: &RelayOutcome,
    from: Side,
    expected_count: usize,
    expected_success: bool,
) -> Result<(), HarnessError> {
    let packets = outcome.packets_from(from);
    if packets != expected_count {
        return Err(HarnessError::assertion(format!(
            "Expected {expected_count} packets from {from}, got {packets}"
        )));
    }

    let acks = outcome.acks_from(from.opposite());
    if acks.len() != expected_count {
        return Err(HarnessError::assertion(format!(
            "Expected {} acks from {}, got {}",
            expected_count,
            from.opposite(),
            acks.len()
        )));
    }

    if expected_success {
        assert_ack_success(acks)?;
    } else {
        assert_ack_errors(acks)?;
    }

    debug!(
        "{} packet(s) from {} acknowledged with {}",
        expected_count,
        from,
        if expected_success { "result" } else { "error" }
    );
    Ok(())
}

/// Every ack must carry `result`
pub fn assert_ack_success(acks: &[AckRecord]) -> Result<(), HarnessError> {
    for (index, ack) in acks.iter().enumerate() {
        if let AckEnvelope::Error(message) = AckEnvelope::parse(ack.as_bytes())? {
            return Err(HarnessError::assertion(format!(
                "Ack {index} (sequence {}) is an error, expected success: {message}",
                ack.sequence
            )));
        }
    }
    Ok(())
}

/// Every ack must carry `error`
pub fn assert_ack_errors(acks: &[AckRecord]) -> Result<(), HarnessError> {
    for (index, ack) in acks.iter().enumerate() {
        if AckEnvelope::parse(ack.as_bytes())?.is_result() {
            return Err(HarnessError::assertion(format!(
                "Ack {index} (sequence {}) is a success, expected an error",
                ack.sequence
            )));
        }
    }
    Ok(())
}

/// Decoded `result` payload of a success ack
pub fn parse_ack_success(ack: &AckRecord) -> Result<Value, HarnessError> {
    match decode(ack)? {
        DecodedAck::Result(payload) => Ok(payload),
        DecodedAck::Error(message) => Err(HarnessError::assertion(format!(
            "Ack (sequence {}) is an error, expected success: {message}",
            ack.sequence
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ack::{encode_error, encode_result};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn ack(sequence: u64, bytes: Vec<u8>) -> AckRecord {
        AckRecord {
            acknowledgement: bytes,
            sequence,
            src_channel: "channel-0".to_string(),
            dest_channel: "channel-1".to_string(),
        }
    }

    fn one_success_from_a() -> RelayOutcome {
        RelayOutcome {
            packets_from_a: 1,
            acks_from_b: vec![ack(1, encode_result(&json!({"count": 1})))],
            ..Default::default()
        }
    }

    #[test]
    fn test_one_successful_packet() {
        let outcome = one_success_from_a();
        assert_ok!(expect_relayed(&outcome, Side::A, 1, true));

        let err = assert_err!(expect_relayed(&outcome, Side::A, 1, false));
        assert_eq!(
            err.to_string(),
            "Assertion failed: Ack 0 (sequence 1) is a success, expected an error"
        );
    }

    #[test]
    fn test_count_mismatch() {
        let outcome = one_success_from_a();

        let err = expect_relayed(&outcome, Side::A, 2, true).unwrap_err();
        assert!(err.to_string().contains("Expected 2 packets from A, got 1"));

        let err = expect_relayed(&outcome, Side::B, 1, true).unwrap_err();
        assert!(err.to_string().contains("Expected 1 packets from B, got 0"));

        let missing_ack = RelayOutcome {
            packets_from_a: 1,
            ..Default::default()
        };
        let err = expect_relayed(&missing_ack, Side::A, 1, true).unwrap_err();
        assert!(err.to_string().contains("Expected 1 acks from B, got 0"));
    }

    #[test]
    fn test_any_error_ack_fails_success() {
        let outcome = RelayOutcome {
            packets_from_b: 3,
            acks_from_a: vec![
                ack(4, encode_result(&json!({}))),
                ack(5, encode_error("out of gas")),
                ack(6, encode_result(&json!({}))),
            ],
            ..Default::default()
        };

        let err = expect_relayed(&outcome, Side::B, 3, true).unwrap_err();
        assert!(matches!(err, HarnessError::Assertion(_)));
        assert!(err.to_string().contains("Ack 1 (sequence 5)"));
        assert!(err.to_string().contains("out of gas"));
    }

    #[test]
    fn test_error_acks() {
        let acks = vec![ack(1, encode_error("invalid packet")), ack(2, encode_error("nope"))];
        assert_ok!(assert_ack_errors(&acks));
        assert_err!(assert_ack_success(&acks));
    }

    #[test]
    fn test_non_json_result_still_counts_as_success() {
        // ICS-20 style: base64 of a non-JSON byte
        let acks = vec![ack(1, br#"{"result":"AQ=="}"#.to_vec())];
        assert_ok!(assert_ack_success(&acks));
    }

    #[test]
    fn test_malformed_ack_is_a_decode_error() {
        let acks = vec![ack(1, b"not json".to_vec())];
        let err = assert_ack_success(&acks).unwrap_err();
        assert!(matches!(err, HarnessError::Decode { level: 0, .. }));
    }

    #[test]
    fn test_parse_ack_success() {
        let payload = parse_ack_success(&ack(1, encode_result(&json!({"count": 7})))).unwrap();
        assert_eq!(payload, json!({"count": 7}));

        let err = parse_ack_success(&ack(2, encode_error("boom"))).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_success_ack_carrying_error_field_stays_success() {
        let payload = json!({"error": "insufficient funds"});
        let acks = vec![ack(3, encode_result(&payload))];

        assert_ok!(assert_ack_success(&acks));
        assert_err!(assert_ack_errors(&acks));
        assert_eq!(assert_ok!(parse_ack_success(&acks[0])), payload);
    }

    #[test]
    fn test_empty_relay() {
        assert_ok!(expect_relayed(&RelayOutcome::default(), Side::A, 0, true));
        assert_ok!(expect_relayed(&RelayOutcome::default(), Side::A, 0, false));
    }
}
