//! DNS protocol decoding.
//!
//! This module turns a raw wire-format buffer into a [`Message`]. Decoding is
//! a pure function of the input bytes: nothing is shared between calls and
//! every failure is a typed error, never a panic.

use log::trace;

use crate::codes::{OpCode, QClass, QType, RCode};
use crate::encode::encode_message;
use crate::errors::{DecodeError, MessageDecodeError, Section};
use crate::message::{Header, Message, Question, ResourceRecord, HEADER_LEN};
use crate::name::decode_name;
use crate::utils::{read_i32, read_slice, read_u16};

// Byte 2 of the header.
const FLAG_QR: u8 = 0x80;
const OPCODE_SHIFT: u8 = 3;
const OPCODE_MASK: u8 = 0x0F;
const FLAG_AA: u8 = 0x04;
const FLAG_TC: u8 = 0x02;
const FLAG_RD: u8 = 0x01;

// Byte 3 of the header.
const FLAG_RA: u8 = 0x80;
const FLAG_Z: u8 = 0x40;
const FLAG_AD: u8 = 0x20;
const FLAG_CD: u8 = 0x10;
const RCODE_MASK: u8 = 0x0F;

/// Smallest possible question: root name plus QTYPE and QCLASS.
const MIN_QUESTION_LEN: usize = 5;
/// Smallest possible record: root name plus the 10 fixed bytes.
const MIN_RECORD_LEN: usize = 11;

/// Decode the fixed 12-byte header.
///
/// # Arguments
/// * `buf` - The message; only the first 12 bytes are read.
///
/// # Returns
/// The header, `Truncated` if fewer than 12 bytes are available, or
/// `UnknownCode` if OPCODE or RCODE has no registry entry.
pub fn decode_header(buf: &[u8]) -> Result<Header, DecodeError> {
    trace!("Decoding header");
    let bytes = read_slice(buf, 0, HEADER_LEN)?;
    let (b2, b3) = (bytes[2], bytes[3]);

    let opcode = OpCode::by_code(u16::from((b2 >> OPCODE_SHIFT) & OPCODE_MASK))?;
    let rcode = RCode::by_code(u16::from(b3 & RCODE_MASK))?;

    Ok(Header {
        id: u16::from_be_bytes([bytes[0], bytes[1]]),
        qr: b2 & FLAG_QR != 0,
        opcode,
        aa: b2 & FLAG_AA != 0,
        tc: b2 & FLAG_TC != 0,
        rd: b2 & FLAG_RD != 0,
        ra: b3 & FLAG_RA != 0,
        z: b3 & FLAG_Z != 0,
        ad: b3 & FLAG_AD != 0,
        cd: b3 & FLAG_CD != 0,
        rcode,
        qd_count: u16::from_be_bytes([bytes[4], bytes[5]]),
        an_count: u16::from_be_bytes([bytes[6], bytes[7]]),
        ns_count: u16::from_be_bytes([bytes[8], bytes[9]]),
        ar_count: u16::from_be_bytes([bytes[10], bytes[11]]),
    })
}

/// Decode a single question at `offset`.
pub fn decode_question(buf: &[u8], offset: usize) -> Result<(Question, usize), DecodeError> {
    let (name, pos) = decode_name(buf, offset)?;
    let qtype = QType::by_code(read_u16(buf, pos)?)?;
    let qclass = QClass::by_code(read_u16(buf, pos + 2)?)?;
    Ok((Question::new(name, qtype, qclass), pos + 4))
}

/// Decode `count` questions starting at `offset`.
///
/// # Arguments
/// * `buf` - The whole message, so compression pointers can be followed.
/// * `offset` - Start of the question section.
/// * `count` - QDCOUNT from the header.
///
/// # Returns
/// Every question plus the offset just past the section. Nothing is returned
/// on failure.
pub fn decode_questions(
    buf: &[u8],
    offset: usize,
    count: u16,
) -> Result<(Vec<Question>, usize), DecodeError> {
    trace!("Decoding {} question(s) at offset {}", count, offset);
    let mut questions = Vec::with_capacity(usize::from(count).min(buf.len() / MIN_QUESTION_LEN));
    let mut pos = offset;
    for _ in 0..count {
        let (question, next) = decode_question(buf, pos)?;
        questions.push(question);
        pos = next;
    }
    Ok((questions, pos))
}

/// Decode a single resource record at `offset`.
///
/// RDATA is copied verbatim; RDLENGTH past the end of the buffer is `Truncated`.
pub fn decode_record(buf: &[u8], offset: usize) -> Result<(ResourceRecord, usize), DecodeError> {
    let (name, pos) = decode_name(buf, offset)?;
    let rtype = QType::by_code(read_u16(buf, pos)?)?;
    let class = QClass::by_code(read_u16(buf, pos + 2)?)?;
    let ttl = read_i32(buf, pos + 4)?;
    let rdlength = usize::from(read_u16(buf, pos + 8)?);
    let rdata = read_slice(buf, pos + 10, rdlength)?.to_vec();

    Ok((
        ResourceRecord::new(name, rtype, class, ttl, rdata),
        pos + 10 + rdlength,
    ))
}

/// Decode `count` resource records starting at `offset`.
///
/// Used for the answer, authority and additional sections alike.
pub fn decode_records(
    buf: &[u8],
    offset: usize,
    count: u16,
) -> Result<(Vec<ResourceRecord>, usize), DecodeError> {
    trace!("Decoding {} record(s) at offset {}", count, offset);
    let mut records = Vec::with_capacity(usize::from(count).min(buf.len() / MIN_RECORD_LEN));
    let mut pos = offset;
    for _ in 0..count {
        let (record, next) = decode_record(buf, pos)?;
        records.push(record);
        pos = next;
    }
    Ok((records, pos))
}

/// Decode a complete DNS message.
///
/// Sections are read strictly in order, each starting where the previous one
/// ended. The first failure aborts the whole decode and is tagged with the
/// section it happened in. Bytes after the additional section are ignored.
///
/// # Arguments
/// * `buf` - The DNS message exactly as received.
///
/// # Returns
/// A `Result` containing the decoded message or the failing section's error.
pub fn decode(buf: &[u8]) -> Result<Message, MessageDecodeError> {
    let header = decode_header(buf).map_err(|e| MessageDecodeError::new(Section::Header, e))?;

    let (questions, pos) = decode_questions(buf, HEADER_LEN, header.qd_count)
        .map_err(|e| MessageDecodeError::new(Section::Question, e))?;
    let (answers, pos) = decode_records(buf, pos, header.an_count)
        .map_err(|e| MessageDecodeError::new(Section::Answer, e))?;
    let (authority, pos) = decode_records(buf, pos, header.ns_count)
        .map_err(|e| MessageDecodeError::new(Section::Authority, e))?;
    let (additional, pos) = decode_records(buf, pos, header.ar_count)
        .map_err(|e| MessageDecodeError::new(Section::Additional, e))?;

    if pos < buf.len() {
        trace!("Ignoring {} trailing byte(s)", buf.len() - pos);
    }

    Ok(Message {
        header,
        questions,
        answers,
        authority,
        additional,
    })
}

/// Build an error response for a query.
///
/// The response echoes the query's ID, OPCODE, RD and CD bits and, when it
/// can be decoded, the question section. All record sections are empty.
///
/// # Arguments
/// * `query` - The DNS query packet.
/// * `rcode` - Response code to report; only the low four bits fit the header.
///
/// # Returns
/// `None` if the query has no readable header.
pub fn build_error_response(query: &[u8], rcode: RCode) -> Option<Vec<u8>> {
    let header = decode_header(query).ok()?;
    let questions = decode_questions(query, HEADER_LEN, header.qd_count)
        .map(|(questions, _)| questions)
        .unwrap_or_default();

    let response = Message {
        header: Header {
            id: header.id,
            qr: true,
            opcode: header.opcode,
            rd: header.rd,
            ra: true,
            cd: header.cd,
            rcode,
            ..Header::default()
        },
        questions,
        ..Message::default()
    };
    encode_message(&response).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::Assignment;

    const QUERY_HEADER: [u8; 12] = [
        0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn www_google_question() -> Vec<u8> {
        let mut buf = b"\x03www\x06google\x03com\x00".to_vec();
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        buf
    }

    #[test]
    fn test_decode_query_header() {
        let header = decode_header(&QUERY_HEADER).unwrap();
        assert_eq!(header.id, 1);
        assert!(!header.qr);
        assert_eq!(header.opcode, OpCode::QUERY);
        assert!(header.rd);
        assert!(!header.aa && !header.tc && !header.ra && !header.z && !header.ad && !header.cd);
        assert_eq!(header.rcode, RCode::NO_ERROR);
        assert_eq!(header.qd_count, 1);
        assert_eq!((header.an_count, header.ns_count, header.ar_count), (0, 0, 0));
    }

    #[test]
    fn test_decode_header_flags() {
        // QR, OPCODE=Update, AA, TC, RD | RA, Z, AD, CD, RCODE=NXDomain
        let buf = [
            0xbe, 0xef, 0x80 | (5 << 3) | 0x07, 0xf3, 0, 2, 0, 3, 0, 4, 0, 5,
        ];
        let header = decode_header(&buf).unwrap();
        assert_eq!(header.id, 0xbeef);
        assert!(header.qr && header.aa && header.tc && header.rd);
        assert!(header.ra && header.z && header.ad && header.cd);
        assert_eq!(header.opcode, OpCode::UPDATE);
        assert_eq!(header.rcode, RCode::NX_DOMAIN);
        assert_eq!(
            (header.qd_count, header.an_count, header.ns_count, header.ar_count),
            (2, 3, 4, 5)
        );
    }

    #[test]
    fn test_reserved_opcode_decodes_as_placeholder() {
        let mut buf = QUERY_HEADER;
        buf[2] = 3 << 3;
        let header = decode_header(&buf).unwrap();
        assert_eq!(header.opcode.assignment(), Assignment::AvailableForAssignment);
        assert_eq!(header.opcode.code(), 3);
    }

    #[test]
    fn test_short_header_is_truncated() {
        for len in 0..HEADER_LEN {
            assert!(matches!(
                decode_header(&QUERY_HEADER[..len]),
                Err(DecodeError::Truncated { offset: 0, needed: 12, .. })
            ));
        }
    }

    #[test]
    fn test_decode_single_question() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(&www_google_question());

        let (questions, next) = decode_questions(&buf, HEADER_LEN, 1).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].name.to_string(), "www.google.com");
        assert_eq!(questions[0].qtype, QType::A);
        assert_eq!(questions[0].qclass, QClass::IN);
        assert_eq!(next, HEADER_LEN + 16 + 4);
    }

    #[test]
    fn test_zero_questions_consume_nothing() {
        let (questions, next) = decode_questions(&QUERY_HEADER, HEADER_LEN, 0).unwrap();
        assert!(questions.is_empty());
        assert_eq!(next, HEADER_LEN);
    }

    #[test]
    fn test_compressed_second_question() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(&www_google_question());
        let second = buf.len();
        buf.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x1c, 0x00, 0x01]);

        let (questions, next) = decode_questions(&buf, HEADER_LEN, 2).unwrap();
        assert_eq!(questions[1].name, questions[0].name);
        assert_eq!(questions[1].qtype, QType::AAAA);
        assert_eq!(next, second + 6);
    }

    #[test]
    fn test_question_missing_class_is_truncated() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(b"\x03www\x00\x00\x01");
        assert!(matches!(
            decode_questions(&buf, HEADER_LEN, 1),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_question_count_beyond_data_is_truncated() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(&www_google_question());
        assert!(matches!(
            decode_questions(&buf, HEADER_LEN, 2),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_question_with_unknown_type() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(b"\x00\x00\x00\x00\x01");
        assert!(matches!(
            decode_questions(&buf, HEADER_LEN, 1),
            Err(DecodeError::UnknownCode(crate::errors::UnknownCode { kind: "QType", code: 0 }))
        ));
    }

    #[test]
    fn test_decode_record() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(&www_google_question());
        let start = buf.len();
        buf.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
        buf.extend_from_slice(&300i32.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x04, 142, 250, 0, 1]);

        let (records, next) = decode_records(&buf, start, 1).unwrap();
        let record = &records[0];
        assert_eq!(record.name.to_string(), "www.google.com");
        assert_eq!(record.rtype, QType::A);
        assert_eq!(record.class, QClass::IN);
        assert_eq!(record.ttl, 300);
        assert_eq!(record.rdata, vec![142, 250, 0, 1]);
        assert_eq!(next, start + 2 + 10 + 4);
        assert_eq!(next, buf.len());
    }

    #[test]
    fn test_negative_ttl_is_preserved() {
        let mut buf = vec![0x00, 0x00, 0x10, 0x00, 0x01];
        buf.extend_from_slice(&(-1i32).to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x00]);
        let (record, next) = decode_record(&buf, 0).unwrap();
        assert_eq!(record.ttl, -1);
        assert_eq!(record.rtype, QType::TXT);
        assert!(record.rdata.is_empty());
        assert_eq!(next, buf.len());
    }

    #[test]
    fn test_rdlength_past_end_is_truncated() {
        let mut buf = vec![0x00, 0x00, 0x01, 0x00, 0x01, 0, 0, 0, 60, 0x00, 0x10];
        buf.extend_from_slice(&[1, 2, 3]);
        assert_eq!(
            decode_records(&buf, 0, 1),
            Err(DecodeError::Truncated {
                offset: 11,
                needed: 16,
                available: 3
            })
        );
    }

    #[test]
    fn test_records_advance_per_record() {
        let mut buf = Vec::new();
        for (ttl, octet) in [(10i32, 1u8), (20, 2)] {
            buf.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01]);
            buf.extend_from_slice(&ttl.to_be_bytes());
            buf.extend_from_slice(&[0x00, 0x04, 10, 0, 0, octet]);
        }
        let (records, next) = decode_records(&buf, 0, 2).unwrap();
        assert_eq!(records[0].ttl, 10);
        assert_eq!(records[1].ttl, 20);
        assert_eq!(records[1].rdata, vec![10, 0, 0, 2]);
        assert_eq!(next, buf.len());
    }

    #[test]
    fn test_decode_tags_failing_section() {
        let mut buf = QUERY_HEADER.to_vec();
        buf[7] = 1; // ANCOUNT = 1 with no answer present
        buf.extend_from_slice(&www_google_question());

        let err = decode(&buf).unwrap_err();
        assert_eq!(err.section, Section::Answer);
        assert!(matches!(err.source, DecodeError::Truncated { .. }));

        let err = decode(&buf[..5]).unwrap_err();
        assert_eq!(err.section, Section::Header);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut buf = QUERY_HEADER.to_vec();
        buf.extend_from_slice(&www_google_question());
        buf.extend_from_slice(&[0u8; 32]);
        let message = decode(&buf).unwrap();
        assert_eq!(message.questions.len(), 1);
    }

    #[test]
    fn test_build_error_response() {
        let mut query = QUERY_HEADER.to_vec();
        query.extend_from_slice(&www_google_question());

        let response = build_error_response(&query, RCode::FORMAT_ERROR).unwrap();
        let message = decode(&response).unwrap();
        assert_eq!(message.header.id, 1);
        assert!(message.header.qr);
        assert!(message.header.rd);
        assert_eq!(message.header.rcode, RCode::FORMAT_ERROR);
        assert_eq!(message.questions.len(), 1);
        assert!(message.answers.is_empty());

        assert!(build_error_response(&query[..4], RCode::FORMAT_ERROR).is_none());
    }

    #[test]
    fn test_error_response_drops_undecodable_question() {
        let mut query = QUERY_HEADER.to_vec();
        query.extend_from_slice(&[0xc0, 0x0c]);
        let response = build_error_response(&query, RCode::FORMAT_ERROR).unwrap();
        let message = decode(&response).unwrap();
        assert_eq!(message.header.qd_count, 0);
        assert!(message.questions.is_empty());
    }
}
