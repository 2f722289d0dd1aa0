//! DNS message encoding.
//!
//! Names are written uncompressed. Section counts in the header are taken
//! from the section lengths, not from the counts stored in `Header`, so an
//! encoded message always describes exactly what follows it.

use crate::errors::{EncodeError, Section};
use crate::message::{Header, Message, Question, ResourceRecord};

fn section_count(section: Section, len: usize) -> Result<u16, EncodeError> {
    u16::try_from(len).map_err(|_| EncodeError::TooManyEntries {
        section,
        count: len,
    })
}

fn header_nibble(kind: &'static str, code: u16) -> Result<u8, EncodeError> {
    match u8::try_from(code) {
        Ok(value) if value <= 0x0F => Ok(value),
        _ => Err(EncodeError::CodeOutOfRange { kind, code }),
    }
}

/// Write the 12-byte header with the given section counts.
///
/// OPCODE and RCODE must fit four bits. Extended RCODEs are carried in an
/// OPT record and cannot be written here.
pub fn encode_header(
    header: &Header,
    counts: [u16; 4],
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let opcode = header_nibble("OpCode", header.opcode.code())?;
    let rcode = header_nibble("RCode", header.rcode.code())?;

    let mut b2 = opcode << 3;
    if header.qr {
        b2 |= 0x80;
    }
    if header.aa {
        b2 |= 0x04;
    }
    if header.tc {
        b2 |= 0x02;
    }
    if header.rd {
        b2 |= 0x01;
    }

    let mut b3 = rcode;
    if header.ra {
        b3 |= 0x80;
    }
    if header.z {
        b3 |= 0x40;
    }
    if header.ad {
        b3 |= 0x20;
    }
    if header.cd {
        b3 |= 0x10;
    }

    out.extend_from_slice(&header.id.to_be_bytes());
    out.push(b2);
    out.push(b3);
    for count in counts {
        out.extend_from_slice(&count.to_be_bytes());
    }
    Ok(())
}

pub fn encode_question(question: &Question, out: &mut Vec<u8>) {
    question.name.encode_into(out);
    out.extend_from_slice(&question.qtype.code().to_be_bytes());
    out.extend_from_slice(&question.qclass.code().to_be_bytes());
}

pub fn encode_record(record: &ResourceRecord, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let rdlength = u16::try_from(record.rdata.len()).map_err(|_| EncodeError::RdataTooLong {
        len: record.rdata.len(),
    })?;
    record.name.encode_into(out);
    out.extend_from_slice(&record.rtype.code().to_be_bytes());
    out.extend_from_slice(&record.class.code().to_be_bytes());
    out.extend_from_slice(&record.ttl.to_be_bytes());
    out.extend_from_slice(&rdlength.to_be_bytes());
    out.extend_from_slice(&record.rdata);
    Ok(())
}

/// Encode a complete message.
///
/// # Arguments
/// * `message` - The message to serialise.
///
/// # Returns
/// The wire bytes, or an error if a section or RDATA exceeds its 16-bit length.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, EncodeError> {
    let counts = [
        section_count(Section::Question, message.questions.len())?,
        section_count(Section::Answer, message.answers.len())?,
        section_count(Section::Authority, message.authority.len())?,
        section_count(Section::Additional, message.additional.len())?,
    ];

    let mut out = Vec::with_capacity(512);
    encode_header(&message.header, counts, &mut out)?;
    for question in &message.questions {
        encode_question(question, &mut out);
    }
    for record in message
        .answers
        .iter()
        .chain(&message.authority)
        .chain(&message.additional)
    {
        encode_record(record, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{OpCode, QClass, QType, RCode};
    use crate::name::Name;

    #[test]
    fn test_encode_query_header() {
        let header = Header {
            id: 1,
            rd: true,
            ..Header::default()
        };
        let mut out = Vec::new();
        encode_header(&header, [1, 0, 0, 0], &mut out).unwrap();
        assert_eq!(out, [0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_header_bits() {
        let header = Header {
            id: 0xabcd,
            qr: true,
            opcode: OpCode::NOTIFY,
            aa: true,
            ra: true,
            ad: true,
            rcode: RCode::REFUSED,
            ..Header::default()
        };
        let mut out = Vec::new();
        encode_header(&header, [0, 0, 0, 0], &mut out).unwrap();
        assert_eq!(out[2], 0x80 | (4 << 3) | 0x04);
        assert_eq!(out[3], 0x80 | 0x20 | 5);
    }

    #[test]
    fn test_counts_follow_sections() {
        let message = Message {
            header: Header {
                qd_count: 9,
                ..Header::default()
            },
            questions: vec![Question::new(Name::root(), QType::NS, QClass::IN)],
            ..Message::default()
        };
        let out = encode_message(&message).unwrap();
        assert_eq!(&out[4..6], &[0, 1]);
        assert_eq!(&out[12..], &[0, 0, 2, 0, 1]);
    }

    #[test]
    fn test_oversized_rdata_is_rejected() {
        let record = ResourceRecord::new(Name::root(), QType::TXT, QClass::IN, 0, vec![0; 65536]);
        let mut out = Vec::new();
        assert_eq!(
            encode_record(&record, &mut out),
            Err(EncodeError::RdataTooLong { len: 65536 })
        );
    }

    #[test]
    fn test_extended_rcode_is_rejected() {
        let message = Message {
            header: Header {
                qr: true,
                rcode: RCode::BAD_OPT_VERSION,
                ..Header::default()
            },
            ..Message::default()
        };
        assert_eq!(
            encode_message(&message),
            Err(EncodeError::CodeOutOfRange {
                kind: "RCode",
                code: 16
            })
        );
    }

    #[test]
    fn test_header_nibbles_at_the_edge() {
        let mut header = Header {
            rcode: RCode::by_code(15).unwrap(),
            opcode: OpCode::by_code(15).unwrap(),
            ..Header::default()
        };
        let mut out = Vec::new();
        encode_header(&header, [0; 4], &mut out).unwrap();
        assert_eq!(out[2], 15 << 3);
        assert_eq!(out[3], 15);

        header.rcode = RCode::by_code(4000).unwrap();
        assert!(matches!(
            encode_header(&header, [0; 4], &mut Vec::new()),
            Err(EncodeError::CodeOutOfRange { kind: "RCode", code: 4000 })
        ));
    }
}
