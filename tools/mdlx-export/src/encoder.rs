//! Packet encoder collaborator
//!
//! The microcode-level encoding of one packet is done by an external tool.
//! [`PacketEncoder`] is the seam the pipeline calls through; the shipped
//! [`CommandEncoder`] hands each finalized packet to a configured command
//! via a scoped scratch directory and reads the encoded payload back.

use std::path::Path;
use std::process::Command;

use mdlx_common::QUADWORD;

use crate::error::ExportError;
use crate::packet::FinalizedPacket;

/// Byte offset within an encoded payload where the encoder records the
/// coprocessor-memory slot (in quadwords) at which per-bone matrix uploads
/// begin.
pub const PAYLOAD_MATRIX_OFFSET_FIELD: usize = 0x24;

/// Result of encoding one packet.
#[derive(Debug, Clone)]
pub struct EncodedPacket {
    /// Opaque coprocessor payload, a whole number of quadwords.
    pub payload: Vec<u8>,
    /// Quadword slot where the packet's matrix uploads land.
    pub matrix_offset: u32,
}

/// Turns one finalized packet into its coprocessor payload.
///
/// Invocation is per-packet, blocking and synchronous; any failure is fatal
/// for the run.
pub trait PacketEncoder {
    fn encode(&self, packet: &FinalizedPacket) -> Result<EncodedPacket, ExportError>;
}

/// Encoder adapter running an external command.
///
/// The packet is written as interleaved `v`/`vt`/`vb`/`f` records to a
/// scratch file, the command is invoked on it, and the payload is read from
/// the sibling file with the configured extension. The scratch directory is
/// removed on every exit path.
pub struct CommandEncoder {
    program: String,
    args: Vec<String>,
    payload_extension: String,
}

impl CommandEncoder {
    /// `command` may carry leading arguments ("encoder --fast"); the packet
    /// file path is appended as the final argument.
    pub fn new(command: &str, payload_extension: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
            payload_extension: payload_extension.to_owned(),
        }
    }
}

impl PacketEncoder for CommandEncoder {
    fn encode(&self, packet: &FinalizedPacket) -> Result<EncodedPacket, ExportError> {
        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join("packet.obj");
        let output_path = input_path.with_extension(&self.payload_extension);

        std::fs::write(&input_path, packet_text(packet))?;
        run_encoder(&self.program, &self.args, &input_path)?;

        let payload = std::fs::read(&output_path).map_err(|e| {
            ExportError::Encoder(format!(
                "{} produced no readable output at {:?}: {e}",
                self.program, output_path
            ))
        })?;
        parse_payload(payload)
    }
}

fn run_encoder(program: &str, args: &[String], input: &Path) -> Result<(), ExportError> {
    let status = Command::new(program)
        .args(args)
        .arg(input)
        .status()
        .map_err(|e| ExportError::Encoder(format!("failed to run {program}: {e}")))?;
    if !status.success() {
        return Err(ExportError::Encoder(format!("{program} exited with {status}")));
    }
    Ok(())
}

/// Interleaved packet description the encoder consumes: per vertex a `v`
/// position and `vt` UV record, then one `vb` per-bone vertex count per
/// bone, then 1-based `f` triangles.
fn packet_text(packet: &FinalizedPacket) -> String {
    let mut text = String::new();
    for (position, uv) in packet.positions.iter().zip(&packet.uvs) {
        text.push_str(&format!(
            "v {:.6} {:.6} {:.6}\n",
            position[0], position[1], position[2]
        ));
        text.push_str(&format!("vt {:.6} {:.6}\n", uv[0], uv[1]));
    }
    for count in &packet.bone_vertex_counts {
        text.push_str(&format!("vb {count}\n"));
    }
    for triangle in &packet.triangles {
        text.push_str(&format!("f {} {} {}\n", triangle[0], triangle[1], triangle[2]));
    }
    text
}

/// Validate an encoder payload and pull out the matrix-upload slot.
fn parse_payload(payload: Vec<u8>) -> Result<EncodedPacket, ExportError> {
    if payload.len() < PAYLOAD_MATRIX_OFFSET_FIELD + 4 {
        return Err(ExportError::Encoder(format!(
            "payload of {} bytes is too short to carry a header",
            payload.len()
        )));
    }
    if payload.len() % QUADWORD != 0 {
        return Err(ExportError::Encoder(format!(
            "payload of {} bytes is not a whole number of quadwords",
            payload.len()
        )));
    }
    let field = PAYLOAD_MATRIX_OFFSET_FIELD;
    let matrix_offset = u32::from_le_bytes([
        payload[field],
        payload[field + 1],
        payload[field + 2],
        payload[field + 3],
    ]);
    Ok(EncodedPacket {
        payload,
        matrix_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> FinalizedPacket {
        FinalizedPacket {
            vertex_order: vec![2, 0, 1],
            positions: vec![[1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.5]],
            uvs: vec![[0.5, 0.5], [0.0, 0.0], [1.0, 0.0]],
            bones: vec![0],
            bone_vertex_counts: vec![3],
            triangles: vec![[2, 3, 1]],
        }
    }

    #[test]
    fn test_packet_text_layout() {
        let text = packet_text(&sample_packet());
        let expected = "v 1.000000 1.000000 0.000000\n\
                        vt 0.500000 0.500000\n\
                        v 0.000000 0.000000 0.000000\n\
                        vt 0.000000 0.000000\n\
                        v 1.000000 0.000000 0.500000\n\
                        vt 1.000000 0.000000\n\
                        vb 3\n\
                        f 2 3 1\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_parse_payload_reads_matrix_offset() {
        let mut payload = vec![0u8; 0x40];
        payload[PAYLOAD_MATRIX_OFFSET_FIELD..PAYLOAD_MATRIX_OFFSET_FIELD + 4]
            .copy_from_slice(&0x18u32.to_le_bytes());
        let encoded = parse_payload(payload).unwrap();
        assert_eq!(encoded.matrix_offset, 0x18);
        assert_eq!(encoded.payload.len(), 0x40);
    }

    #[test]
    fn test_parse_payload_rejects_short_output() {
        assert!(matches!(
            parse_payload(vec![0u8; 0x20]),
            Err(ExportError::Encoder(_))
        ));
    }

    #[test]
    fn test_parse_payload_rejects_unaligned_output() {
        assert!(matches!(
            parse_payload(vec![0u8; 0x45]),
            Err(ExportError::Encoder(_))
        ));
    }

    #[test]
    fn test_missing_encoder_command_fails() {
        let encoder = CommandEncoder::new("definitely-not-a-real-encoder", "kh2v");
        let err = encoder.encode(&sample_packet()).unwrap_err();
        assert!(matches!(err, ExportError::Encoder(_)));
    }
}
