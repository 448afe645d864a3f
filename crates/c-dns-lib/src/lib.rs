#[cfg(test)]
pub(crate) mod test_utils;

mod buf;
mod dns_header;
mod error;
mod question;
mod resource_record;

pub use buf::{ByteBuf, EncodeToBuf, FromBuf, MAX_QNAME_JUMPS, MAX_QNAME_LENGTH};
pub use dns_header::{DnsHeader, QueryOpcode, ResponseCode, DNS_HEADER_SIZE};
pub use error::{Result, WireError};
pub use question::{QueryType, Question};
pub use resource_record::{ResourceData, ResourceRecord};

use std::borrow::Cow;

pub const IN_CLASS: u16 = 1;
/// RFC1035
pub const MAX_STANDARD_DNS_MSG_SIZE: usize = 512;
/// Largest message that fits behind a TCP length prefix
pub const MAX_TCP_DNS_MSG_SIZE: usize = u16::MAX as usize;

#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct DnsPacket<'a> {
    pub header: DnsHeader,
    pub questions: Vec<Question<'a>>,
    pub answers: Vec<ResourceRecord<'a>>,
    pub authorities: Vec<ResourceRecord<'a>>,
    pub additionals: Vec<ResourceRecord<'a>>,
}

impl<'a> DnsPacket<'a> {
    pub fn new() -> Self {
        DnsPacket::default()
    }

    /// Builds a recursive query with a single IN question
    pub fn new_query(id: u16, qname: impl Into<Cow<'a, str>>, query_type: QueryType) -> Self {
        let mut packet = DnsPacket::new();
        packet.header.id = id;
        packet.header.recursion_desired = true;
        packet.questions.push(Question::new(qname, query_type, None));
        packet.header.question_count = 1;
        packet
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<DnsPacket<'static>> {
        DnsPacket::from_buf(&mut ByteBuf::new(bytes))
    }

    /// Encodes the packet into a buffer of at most `capacity` bytes
    pub fn to_bytes(&self, capacity: usize) -> Result<Vec<u8>> {
        let mut buf = ByteBuf::new_empty(capacity);
        self.encode_to_buf(&mut buf)?;
        Ok(buf.into_written())
    }

    /// Sets the header counts to the current section lengths
    pub fn update_counts(&mut self) {
        self.header.question_count = self.questions.len() as u16;
        self.header.answer_rr_count = self.answers.len() as u16;
        self.header.authority_rr_count = self.authorities.len() as u16;
        self.header.additional_rr_count = self.additionals.len() as u16;
    }

    /// Copy of this packet with only the header and questions, flagged as truncated
    pub fn truncated(&self) -> DnsPacket<'a> {
        let mut packet = DnsPacket {
            header: self.header.clone(),
            questions: self.questions.clone(),
            ..Default::default()
        };
        packet.header.truncation = true;
        packet.update_counts();
        packet
    }

    pub fn into_owned(self) -> DnsPacket<'static> {
        DnsPacket {
            header: self.header,
            questions: self.questions.into_iter().map(Question::into_owned).collect(),
            answers: self.answers.into_iter().map(ResourceRecord::into_owned).collect(),
            authorities: self.authorities.into_iter().map(ResourceRecord::into_owned).collect(),
            additionals: self.additionals.into_iter().map(ResourceRecord::into_owned).collect(),
        }
    }
}

impl FromBuf for DnsPacket<'static> {
    fn from_buf(buf: &mut ByteBuf<'_>) -> Result<DnsPacket<'static>> {
        let header = DnsHeader::from_buf(buf)?;

        // Counts come from the wire, so don't let them drive allocations
        let mut questions = Vec::with_capacity(header.question_count.min(16) as usize);
        for _ in 0..header.question_count {
            questions.push(Question::from_buf(buf)?);
        }

        let mut answers = Vec::with_capacity(header.answer_rr_count.min(16) as usize);
        for _ in 0..header.answer_rr_count {
            answers.push(ResourceRecord::from_buf(buf)?);
        }

        let mut authorities = Vec::with_capacity(header.authority_rr_count.min(16) as usize);
        for _ in 0..header.authority_rr_count {
            authorities.push(ResourceRecord::from_buf(buf)?);
        }

        let mut additionals = Vec::with_capacity(header.additional_rr_count.min(16) as usize);
        for _ in 0..header.additional_rr_count {
            additionals.push(ResourceRecord::from_buf(buf)?);
        }

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }
}

impl<'a> EncodeToBuf for DnsPacket<'a> {
    fn encode_to_buf(&self, buf: &mut ByteBuf) -> Result<()> {
        // Counts on the wire always follow the sections, whatever the header says
        let mut header = self.header.clone();
        header.question_count = self.questions.len() as u16;
        header.answer_rr_count = self.answers.len() as u16;
        header.authority_rr_count = self.authorities.len() as u16;
        header.additional_rr_count = self.additionals.len() as u16;
        header.encode_to_buf(buf)?;

        for question in self.questions.iter() {
            question.encode_to_buf(buf)?;
        }
        for answer in self.answers.iter() {
            answer.encode_to_buf(buf)?;
        }
        for authority in self.authorities.iter() {
            authority.encode_to_buf(buf)?;
        }
        for additional in self.additionals.iter() {
            additional.encode_to_buf(buf)?;
        }

        Ok(())
    }
}
