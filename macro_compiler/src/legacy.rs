use std::{fs, path::Path};

use base64::{engine::general_purpose, Engine as _};
use macro_schema::{
    CompiledMacro, Frame, LegacyFrame, LegacyPacket, Packet, SequenceError, PACKET_LEN,
};
use tracing::debug;

use crate::CompileError;

/// Loads a pre-DSL recording (`[{TimestampMs, Packet}, ...]`) as-is.
///
/// No terminal frame is synthesized; the records are validated and passed through.
pub fn load_legacy_str(json: &str) -> Result<CompiledMacro, CompileError> {
    let records: Vec<LegacyFrame> = serde_json::from_str(json).map_err(|e| {
        CompileError::new("E4001", format!("invalid legacy macro json: {e}"), e.line())
    })?;

    let frames = records
        .iter()
        .enumerate()
        .map(|(i, r)| decode_packet(&r.packet, i).map(|p| Frame::new(r.timestamp_ms, p)))
        .collect::<Result<Vec<_>, CompileError>>()?;

    debug!(frames = frames.len(), "loaded legacy macro");
    CompiledMacro::new(frames).map_err(|e| match e {
        SequenceError::Empty => CompileError::new("E3001", "legacy macro has no frames", 0),
        e @ SequenceError::OutOfOrder { .. } => {
            CompileError::new("E4001", format!("invalid legacy macro: {e}"), 0)
        }
    })
}

pub fn load_legacy_file(path: impl AsRef<Path>) -> Result<CompiledMacro, CompileError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| {
        CompileError::new("E2001", format!("failed to read legacy macro: {e}"), 0)
            .with_file(path.display().to_string())
    })?;
    load_legacy_str(&json).map_err(|e| e.in_file(path.display().to_string()))
}

fn decode_packet(packet: &LegacyPacket, index: usize) -> Result<Packet, CompileError> {
    let bytes = match packet {
        LegacyPacket::Bytes(bytes) => bytes.clone(),
        LegacyPacket::Base64(s) => general_purpose::STANDARD.decode(s.trim()).map_err(|e| {
            CompileError::new(
                "E4001",
                format!("frame {index}: invalid base64 packet: {e}"),
                0,
            )
            .with_context(s.clone())
        })?,
    };
    let bytes: [u8; PACKET_LEN] = bytes.as_slice().try_into().map_err(|_| {
        CompileError::new(
            "E4001",
            format!(
                "frame {index}: packet must be {PACKET_LEN} bytes, got {}",
                bytes.len()
            ),
            0,
        )
    })?;
    Ok(Packet::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompileErrorKind;

    #[test]
    fn loads_byte_arrays_and_base64_unchanged() {
        let json = r#"[
            {"TimestampMs": 0, "Packet": [0, 4, 8, 128, 128, 128, 128, 0]},
            {"TimestampMs": 120, "Packet": "AAAIgICAgAA="}
        ]"#;
        let m = load_legacy_str(json).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.frames()[0].packet.buttons(), 1 << 2);
        assert_eq!(m.frames()[1], Frame::neutral(120));
        assert_eq!(m.total_duration_ms(), 120);
    }

    #[test]
    fn last_frame_is_not_forced_to_neutral() {
        let json = r#"[{"TimestampMs": 5, "Packet": [0, 2, 8, 128, 128, 128, 128, 0]}]"#;
        let m = load_legacy_str(json).unwrap();
        assert_eq!(m.len(), 1);
        assert!(!m.last().packet.is_neutral());
    }

    #[test]
    fn rejects_malformed_records() {
        for json in [
            "{}",
            r#"[{"TimestampMs": -1, "Packet": [0,0,8,128,128,128,128,0]}]"#,
            r#"[{"TimestampMs": 0, "Packet": [0,0,8]}]"#,
            r#"[{"TimestampMs": 0, "Packet": [0,0,8,128,128,128,128,0,0]}]"#,
            r#"[{"TimestampMs": 0, "Packet": [0,0,8,128,128,128,128,256]}]"#,
            r#"[{"TimestampMs": 0, "Packet": "not base64!"}]"#,
            r#"[{"TimestampMs": 0, "Packet": "AAAI"}]"#,
            r#"[{"TimestampMs": 0}]"#,
        ] {
            let err = load_legacy_str(json).unwrap_err();
            assert_eq!(err.kind, CompileErrorKind::InvalidLegacyFormat, "{json}");
            assert_eq!(err.code, "E4001");
        }
    }

    #[test]
    fn rejects_timestamps_going_backwards() {
        let json = r#"[
            {"TimestampMs": 50, "Packet": "AAAIgICAgAA="},
            {"TimestampMs": 10, "Packet": "AAAIgICAgAA="}
        ]"#;
        let err = load_legacy_str(json).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidLegacyFormat);
    }

    #[test]
    fn empty_list_is_empty_macro() {
        let err = load_legacy_str("[]").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::EmptyMacro);
    }
}
