//! A streaming writer for a single run of P-DATA-TF PDVs.
//!
//! [`PDataWriter`] lets a caller push raw bytes without first knowing how
//! many P-DATA-TF PDUs they will span: every write accumulates into an
//! internal buffer, which is flushed to the underlying stream in chunks no
//! larger than the negotiated maximum PDU length allows. The final chunk
//! is flushed (and marked as the last fragment) when the writer is
//! dropped or [`finish`](PDataWriter::finish) is called explicitly.
//!
//! This is the low-level building block DIMSE message exchange is built
//! on top of; `dimse::send_message` drives its own framing directly
//! against `Pdu::PData` so that a command PDV and a data PDV can share a
//! single PDU, but a caller exchanging a raw PDV stream outside of DIMSE
//! reaches for this type via [`ClientAssociation::send_pdata`] or
//! [`ServerAssociation::send_pdata`].
//!
//! [`ClientAssociation::send_pdata`]: crate::association::client::ClientAssociation::send_pdata
//! [`ServerAssociation::send_pdata`]: crate::association::server::ServerAssociation::send_pdata

use std::io::Write;

use crate::pdu::PDataValueType;

/// Bytes of framing overhead around a single PDV's payload within a
/// P-DATA-TF PDU: the PDV's own 4-byte length field, plus the
/// presentation-context-id and message-control-header bytes.
const PDV_HEADER_LEN: u32 = 4 + 2;

/// A writer that splits an outgoing byte stream into one or more
/// P-DATA-TF PDUs, each carrying a single PDV of the configured value
/// type.
#[must_use]
pub struct PDataWriter<W: Write> {
    stream: W,
    presentation_context_id: u8,
    value_type: PDataValueType,
    max_chunk_len: u32,
    pending: Vec<u8>,
}

impl<W> PDataWriter<W>
where
    W: Write,
{
    /// Construct a writer that sends Data-type PDVs over
    /// `presentation_context_id`, chunked to fit `max_pdu_length`.
    pub(crate) fn new(stream: W, presentation_context_id: u8, max_pdu_length: u32) -> Self {
        Self::with_value_type(stream, presentation_context_id, max_pdu_length, PDataValueType::Data)
    }

    /// Construct a writer for the given PDV value type (Command or Data).
    pub(crate) fn with_value_type(
        stream: W,
        presentation_context_id: u8,
        max_pdu_length: u32,
        value_type: PDataValueType,
    ) -> Self {
        PDataWriter {
            stream,
            presentation_context_id,
            value_type,
            max_chunk_len: max_chunk_len(max_pdu_length),
            pending: Vec::with_capacity(max_chunk_len(max_pdu_length) as usize),
        }
    }

    fn write_pdu_header(&mut self, chunk_len: u32, is_last: bool) -> std::io::Result<()> {
        let mut control_header = 0u8;
        if let PDataValueType::Command = self.value_type {
            control_header |= 0x01;
        }
        if is_last {
            control_header |= 0x02;
        }

        let pdv_len = chunk_len + 2; // + presentation-context-id + control-header
        let pdu_len = pdv_len + 4; // + the PDV length field itself

        let mut header = [0u8; 12];
        header[0] = 0x04; // PDU type: P-DATA-TF
        header[1] = 0x00; // reserved
        header[2..6].copy_from_slice(&pdu_len.to_be_bytes());
        header[6..10].copy_from_slice(&pdv_len.to_be_bytes());
        header[10] = self.presentation_context_id;
        header[11] = control_header;

        self.stream.write_all(&header)
    }

    /// Flush every chunk that no longer fits under `max_chunk_len`,
    /// leaving at most one partial chunk buffered.
    fn flush_full_chunks(&mut self) -> std::io::Result<()> {
        let max_chunk_len = self.max_chunk_len as usize;
        while self.pending.len() > max_chunk_len {
            self.write_pdu_header(self.max_chunk_len, false)?;
            self.stream.write_all(&self.pending[..max_chunk_len])?;
            self.pending.drain(..max_chunk_len);
        }
        Ok(())
    }

    /// Flush whatever remains as the final fragment of this PDV stream.
    pub fn finish(&mut self) -> std::io::Result<()> {
        self.flush_full_chunks()?;
        self.write_pdu_header(self.pending.len() as u32, true)?;
        self.stream.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }
}

impl<W> Write for PDataWriter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.flush_full_chunks()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<W> Drop for PDataWriter<W>
where
    W: Write,
{
    fn drop(&mut self) {
        // best-effort: a caller that wants to observe write failures
        // should call `finish` explicitly before the writer is dropped.
        let _ = self.finish();
    }
}

/// The largest PDV payload that still fits a P-DATA-TF PDU bounded by
/// `max_pdu_length`, which is always at least 1 so degenerate
/// negotiated lengths still make progress one byte at a time.
fn max_chunk_len(max_pdu_length: u32) -> u32 {
    max_pdu_length.saturating_sub(PDV_HEADER_LEN).max(1)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::pdu::PDataValueType;
    use crate::pdu::Pdu;
    use crate::pdu::{read_pdu, reader::MINIMUM_PDU_SIZE};

    use super::PDataWriter;

    #[test]
    fn single_chunk_round_trips() {
        let presentation_context_id = 12;
        let payload: Vec<u8> = (0..64).collect();

        let mut buf = Vec::new();
        {
            let mut writer = PDataWriter::new(&mut buf, presentation_context_id, MINIMUM_PDU_SIZE);
            writer.write_all(&payload).unwrap();
            writer.finish().unwrap();
        }

        let mut cursor = &buf[..];
        let pdu = read_pdu(&mut cursor, MINIMUM_PDU_SIZE, true).unwrap();
        match pdu {
            Pdu::PData { data } => {
                let value = &data[0];
                assert_eq!(value.value_type, PDataValueType::Data);
                assert_eq!(value.presentation_context_id, presentation_context_id);
                assert_eq!(value.data, payload);
            }
            other => panic!("expected a single P-DATA-TF PDU, got {:?}", other),
        }
        assert_eq!(cursor.len(), 0);
    }

    #[test]
    fn oversized_payload_splits_across_two_pdus() {
        let presentation_context_id = 32;
        let payload: Vec<u8> = (0..6000).map(|x| x as u8).collect();

        let mut buf = Vec::new();
        {
            let mut writer = PDataWriter::new(&mut buf, presentation_context_id, MINIMUM_PDU_SIZE);
            writer.write_all(&payload).unwrap();
            writer.finish().unwrap();
        }

        let mut cursor = &buf[..];
        let first = read_pdu(&mut cursor, MINIMUM_PDU_SIZE, true).unwrap();
        let second = read_pdu(&mut cursor, MINIMUM_PDU_SIZE, true).unwrap();

        match (first, second) {
            (Pdu::PData { data: d1 }, Pdu::PData { data: d2 }) => {
                let (v1, v2) = (&d1[0], &d2[0]);
                assert_eq!(v1.value_type, PDataValueType::Data);
                assert_eq!(v2.value_type, PDataValueType::Data);
                assert_eq!(v1.presentation_context_id, presentation_context_id);
                assert_eq!(v2.presentation_context_id, presentation_context_id);

                let mut reassembled = v1.data.clone();
                reassembled.extend(&v2.data);
                assert_eq!(reassembled, payload);
            }
            other => panic!("expected two P-DATA-TF PDUs, got {:?}", other),
        }
        assert_eq!(cursor.len(), 0);
    }

    #[test]
    fn command_pdvs_carry_the_command_control_bit() {
        let mut buf = Vec::new();
        {
            let mut writer = PDataWriter::with_value_type(&mut buf, 1, MINIMUM_PDU_SIZE, PDataValueType::Command);
            writer.write_all(&[1, 2, 3]).unwrap();
            writer.finish().unwrap();
        }

        let mut cursor = &buf[..];
        match read_pdu(&mut cursor, MINIMUM_PDU_SIZE, true).unwrap() {
            Pdu::PData { data } => assert_eq!(data[0].value_type, PDataValueType::Command),
            other => panic!("expected a P-DATA-TF PDU, got {:?}", other),
        }
    }
}
